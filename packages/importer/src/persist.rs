//! Bulk persistence of the region forest.
//!
//! Each top-level subtree is flattened into a pre-ordered batch carrying
//! level, materialized path code and full name, then handed to the store as
//! one unit. Subtrees are committed in document order; the first failure stops
//! the run and leaves every earlier subtree committed.

use thiserror::Error;

use crate::config::{code_segment, max_siblings, CODE_SEPARATOR, FULL_NAME_SEPARATOR};
use crate::error::{ImporterError, Result};
use crate::types::{NewRegion, NodeId, RegionForest, RegionId, RegionRecord};

/// Tree-capable storage that assigns identities to regions.
pub trait RegionStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Insert one subtree as a single unit.
    ///
    /// `rows` are in pre-order: every row's `parent` index points at an
    /// earlier row, and only the first row has no parent. Returns the assigned
    /// identities aligned with `rows`. On error nothing from the batch is
    /// visible.
    fn insert_subtree(
        &mut self,
        rows: &[NewRegion],
    ) -> std::result::Result<Vec<RegionId>, Self::Error>;

    /// Read every committed region.
    fn load_all(&self) -> std::result::Result<Vec<RegionRecord>, Self::Error>;
}

/// A batch that is not a single pre-ordered subtree.
#[derive(Debug, Error)]
pub enum BatchError {
    /// A row referenced a parent that does not precede it in the batch.
    #[error("row {row} references parent {parent}, which does not precede it")]
    InvalidParent { row: usize, parent: usize },

    /// A non-first row had no parent, or the first row had one.
    #[error("batch root must be the first row and the only row without a parent (row {row})")]
    InvalidRoot { row: usize },
}

/// Check that `rows` satisfies the [`RegionStore::insert_subtree`] contract.
///
/// Stores call this before touching storage so a malformed batch leaves
/// nothing behind.
pub fn validate_batch(rows: &[NewRegion]) -> std::result::Result<(), BatchError> {
    for (row, region) in rows.iter().enumerate() {
        match (row, region.parent) {
            (0, None) => {}
            (0, Some(_)) | (_, None) => return Err(BatchError::InvalidRoot { row }),
            (_, Some(parent)) if parent >= row => {
                return Err(BatchError::InvalidParent { row, parent })
            }
            _ => {}
        }
    }
    Ok(())
}

/// In-process store with sequential identities starting at 1.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<RegionRecord>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RegionStore for MemoryStore {
    type Error = BatchError;

    fn insert_subtree(
        &mut self,
        rows: &[NewRegion],
    ) -> std::result::Result<Vec<RegionId>, Self::Error> {
        validate_batch(rows)?;

        let first_id = self.records.len() as RegionId + 1;
        let ids: Vec<RegionId> = (0..rows.len() as RegionId).map(|i| first_id + i).collect();

        self.records.extend(rows.iter().zip(&ids).map(|(row, &id)| RegionRecord {
            id,
            parent_id: row.parent.map(|p| ids[p]),
            name: row.name.clone(),
            division_code: row.division_code.clone(),
            full_name: row.full_name.clone(),
            code: row.code.clone(),
            level: row.level,
        }));

        Ok(ids)
    }

    fn load_all(&self) -> std::result::Result<Vec<RegionRecord>, Self::Error> {
        Ok(self.records.clone())
    }
}

/// A top-level subtree that was committed to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedSubtree {
    /// 1-based position among the top-level subtrees.
    pub position: usize,
    pub name: String,
    pub root_id: RegionId,
    pub node_count: usize,
}

/// Flatten one top-level subtree into a pre-ordered store batch.
///
/// `position` is the 1-based index of the subtree among its top-level
/// siblings and becomes the first path segment. Every other segment is the
/// node's 1-based position among its siblings, so path codes follow document
/// order rather than the scraped division codes.
pub fn prepare_subtree(
    forest: &RegionForest,
    root: NodeId,
    position: usize,
) -> Result<Vec<NewRegion>> {
    let mut rows: Vec<NewRegion> = Vec::new();
    let mut pending = vec![(root, None::<usize>, position)];

    while let Some((id, parent, position)) = pending.pop() {
        let node = forest.node(id);
        let segment = code_segment(position).ok_or_else(|| ImporterError::SiblingOverflow {
            parent: parent.map_or_else(|| "(top level)".to_string(), |p| rows[p].name.clone()),
            count: position,
            limit: max_siblings(),
        })?;

        let (code, full_name, level) = match parent {
            None => (segment, node.name.clone(), 0),
            Some(p) => {
                let parent_row = &rows[p];
                (
                    format!("{}{CODE_SEPARATOR}{segment}", parent_row.code),
                    format!("{}{FULL_NAME_SEPARATOR}{}", parent_row.full_name, node.name),
                    parent_row.level + 1,
                )
            }
        };

        rows.push(NewRegion {
            name: node.name.clone(),
            division_code: node.division_code.clone(),
            full_name,
            code,
            level,
            parent,
        });

        let row = rows.len() - 1;
        pending.extend(
            node.children
                .iter()
                .enumerate()
                .rev()
                .map(|(index, &child)| (child, Some(row), index + 1)),
        );
    }

    Ok(rows)
}

/// Commit every top-level subtree, one store call per subtree.
///
/// Stops at the first failure; subtrees committed before it stay committed
/// and the remaining ones are not attempted.
pub fn persist_forest<S: RegionStore>(
    forest: &RegionForest,
    store: &mut S,
) -> Result<Vec<CommittedSubtree>> {
    let mut committed = Vec::with_capacity(forest.roots().len());

    for (index, &root) in forest.roots().iter().enumerate() {
        let position = index + 1;
        let name = forest.node(root).name.clone();
        let rows = prepare_subtree(forest, root, position)?;

        let ids = store.insert_subtree(&rows).map_err(|e| {
            tracing::error!(
                position,
                name = %name,
                committed = committed.len(),
                error = %e,
                "Subtree commit failed, aborting import"
            );
            ImporterError::SubtreeCommit {
                position,
                name: name.clone(),
                committed: committed.len(),
                source: Box::new(e),
            }
        })?;

        let root_id = match ids.first() {
            Some(&root_id) if ids.len() == rows.len() => root_id,
            _ => {
                tracing::error!(
                    position,
                    name = %name,
                    expected = rows.len(),
                    returned = ids.len(),
                    "Store returned the wrong number of identities"
                );
                return Err(ImporterError::IdentityMismatch {
                    position,
                    name,
                    expected: rows.len(),
                    returned: ids.len(),
                });
            }
        };

        tracing::info!(position, name = %name, nodes = rows.len(), "Subtree committed");

        committed.push(CommittedSubtree {
            position,
            name,
            root_id,
            node_count: rows.len(),
        });
    }

    Ok(committed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::types::RawEntry;
    use pretty_assertions::assert_eq;

    fn hebei_forest() -> RegionForest {
        build(vec![
            RawEntry::new("北京市", "110000"),
            RawEntry::new("东城区", "110101"),
            RawEntry::new("河北省", "130000"),
            RawEntry::new("石家庄市", "130100"),
            RawEntry::new("长安区", "130102"),
            RawEntry::new("桥西区", "130104"),
            RawEntry::new("保定市", "130600"),
            RawEntry::new("竞秀区", "130602"),
        ])
    }

    #[test]
    fn test_prepare_subtree_codes_and_levels() {
        let forest = hebei_forest();
        let rows = prepare_subtree(&forest, forest.roots()[1], 2).unwrap();

        let summary: Vec<(&str, &str, i32, Option<usize>)> = rows
            .iter()
            .map(|r| (r.name.as_str(), r.code.as_str(), r.level, r.parent))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("河北省", "0002", 0, None),
                ("石家庄市", "0002.0001", 1, Some(0)),
                ("长安区", "0002.0001.0001", 2, Some(1)),
                ("桥西区", "0002.0001.0002", 2, Some(1)),
                ("保定市", "0002.0002", 1, Some(0)),
                ("竞秀区", "0002.0002.0001", 2, Some(4)),
            ]
        );
    }

    #[test]
    fn test_prepare_subtree_full_names() {
        let forest = hebei_forest();
        let rows = prepare_subtree(&forest, forest.roots()[1], 2).unwrap();

        assert_eq!(rows[0].full_name, "河北省");
        assert_eq!(rows[2].full_name, "河北省-石家庄市-长安区");
        assert_eq!(rows[5].full_name, "河北省-保定市-竞秀区");
    }

    #[test]
    fn test_prepare_subtree_level_and_prefix_invariants() {
        let forest = hebei_forest();
        let rows = prepare_subtree(&forest, forest.roots()[1], 2).unwrap();

        for row in rows.iter().skip(1) {
            let parent = &rows[row.parent.unwrap()];
            assert_eq!(row.level, parent.level + 1);
            assert!(row.code.starts_with(&format!("{}{CODE_SEPARATOR}", parent.code)));
        }
    }

    #[test]
    fn test_prepare_subtree_position_overflow() {
        let forest = hebei_forest();
        let result = prepare_subtree(&forest, forest.roots()[0], 10_000);
        assert!(matches!(result, Err(ImporterError::SiblingOverflow { .. })));
    }

    #[test]
    fn test_persist_forest_memory_store() {
        let forest = hebei_forest();
        let mut store = MemoryStore::new();

        let committed = persist_forest(&forest, &mut store).unwrap();

        assert_eq!(committed.len(), 2);
        assert_eq!(committed[0].name, "北京市");
        assert_eq!(committed[0].root_id, 1);
        assert_eq!(committed[0].node_count, 2);
        assert_eq!(committed[1].root_id, 3);
        assert_eq!(committed[1].node_count, 6);
        assert_eq!(store.len(), 8);

        let records = store.load_all().unwrap();
        let chang_an = records.iter().find(|r| r.name == "长安区").unwrap();
        let sjz = records.iter().find(|r| r.name == "石家庄市").unwrap();
        assert_eq!(chang_an.parent_id, Some(sjz.id));
        assert_eq!(sjz.parent_id, Some(3));
        assert_eq!(records[0].parent_id, None);
    }

    #[test]
    fn test_memory_store_rejects_bad_batch() {
        let mut store = MemoryStore::new();
        let row = |parent| NewRegion {
            name: "x".to_string(),
            division_code: "110000".to_string(),
            full_name: "x".to_string(),
            code: "0001".to_string(),
            level: 0,
            parent,
        };

        let err = store.insert_subtree(&[row(None), row(Some(1))]).unwrap_err();
        assert!(matches!(err, BatchError::InvalidParent { row: 1, parent: 1 }));

        let err = store.insert_subtree(&[row(None), row(None)]).unwrap_err();
        assert!(matches!(err, BatchError::InvalidRoot { row: 1 }));

        assert!(store.is_empty());
    }

    #[test]
    fn test_validate_batch() {
        let row = |parent| NewRegion {
            name: "x".to_string(),
            division_code: "110000".to_string(),
            full_name: "x".to_string(),
            code: "0001".to_string(),
            level: 0,
            parent,
        };

        assert!(validate_batch(&[]).is_ok());
        assert!(validate_batch(&[row(None), row(Some(0)), row(Some(1)), row(Some(0))]).is_ok());
        assert!(matches!(
            validate_batch(&[row(None), row(Some(2)), row(Some(0))]),
            Err(BatchError::InvalidParent { row: 1, parent: 2 })
        ));
        assert!(matches!(
            validate_batch(&[row(Some(0))]),
            Err(BatchError::InvalidRoot { row: 0 })
        ));
    }

    /// Store that drops the last identity of every batch.
    struct ShortStore(MemoryStore);

    impl RegionStore for ShortStore {
        type Error = BatchError;

        fn insert_subtree(
            &mut self,
            rows: &[NewRegion],
        ) -> std::result::Result<Vec<RegionId>, Self::Error> {
            let mut ids = self.0.insert_subtree(rows)?;
            ids.pop();
            Ok(ids)
        }

        fn load_all(&self) -> std::result::Result<Vec<RegionRecord>, Self::Error> {
            self.0.load_all()
        }
    }

    #[test]
    fn test_persist_forest_rejects_missing_identities() {
        let forest = hebei_forest();
        let mut store = ShortStore(MemoryStore::new());

        let err = persist_forest(&forest, &mut store).unwrap_err();
        assert!(matches!(
            err,
            ImporterError::IdentityMismatch {
                position: 1,
                expected: 2,
                returned: 1,
                ..
            }
        ));
    }
}
