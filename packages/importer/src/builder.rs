//! Hierarchy reconstruction from a flat, document-ordered listing.
//!
//! The listing is a depth-first walk of the division tree with the nesting
//! removed. The builder keeps the path from the (implicit) country root to the
//! most recently attached node as an explicit ancestor stack. Tiers on the
//! stack strictly increase from bottom to top, so an incoming entry of tier
//! `T` pops every open node of tier `T` or deeper, attaches under whatever
//! remains on top, and is pushed itself.
//!
//! An empty stack stands for the country root. Nodes attached there become
//! top-level subtrees; the root itself is never materialized.

use crate::classify::classify;
use crate::config::is_well_formed_code;
use crate::types::{BuildWarning, NodeId, RawEntry, RegionForest, Tier};

/// Incremental tree builder with an explicit ancestor stack.
#[derive(Debug, Default)]
pub struct HierarchyBuilder {
    forest: RegionForest,
    ancestors: Vec<(NodeId, Tier)>,
    position: usize,
}

impl HierarchyBuilder {
    /// Create a builder positioned at the country root.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the next entry in document order.
    pub fn push(&mut self, entry: RawEntry) -> NodeId {
        self.position += 1;

        if !is_well_formed_code(&entry.division_code) {
            tracing::warn!(
                position = self.position,
                name = %entry.name,
                division_code = %entry.division_code,
                "Malformed division code, classifying by fallback rule"
            );
            self.forest.warnings.push(BuildWarning::MalformedCode {
                position: self.position,
                name: entry.name.clone(),
                division_code: entry.division_code.clone(),
            });
        }

        let tier = classify(&entry.division_code);
        let parent = self.ascend(tier);

        if parent.is_none() && tier != Tier::Province {
            tracing::warn!(
                position = self.position,
                name = %entry.name,
                division_code = %entry.division_code,
                tier = %tier,
                "No enclosing province, attaching at top level"
            );
            self.forest.warnings.push(BuildWarning::Orphan {
                position: self.position,
                name: entry.name.clone(),
                division_code: entry.division_code.clone(),
                tier,
            });
        }

        let id = self.forest.attach(entry, tier, parent);
        self.ancestors.push((id, tier));
        id
    }

    /// Pop ancestors that cannot contain a node of `tier`.
    ///
    /// Returns the parent for the new node, or `None` when the ascent reached
    /// the country root.
    fn ascend(&mut self, tier: Tier) -> Option<NodeId> {
        while let Some(&(_, open)) = self.ancestors.last() {
            if open < tier {
                break;
            }
            self.ancestors.pop();
        }
        self.ancestors.last().map(|&(id, _)| id)
    }

    /// Current depth of the ancestor stack (0 at the country root).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    /// Finish building and return the forest.
    #[must_use]
    pub fn finish(self) -> RegionForest {
        tracing::debug!(
            nodes = self.forest.len(),
            subtrees = self.forest.roots().len(),
            warnings = self.forest.warnings().len(),
            "Hierarchy built"
        );
        self.forest
    }
}

/// Build the region forest from entries in document order.
pub fn build(entries: impl IntoIterator<Item = RawEntry>) -> RegionForest {
    let mut builder = HierarchyBuilder::new();
    for entry in entries {
        builder.push(entry);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entries(pairs: &[(&str, &str)]) -> Vec<RawEntry> {
        pairs
            .iter()
            .map(|(name, code)| RawEntry::new(*name, *code))
            .collect()
    }

    fn names(forest: &RegionForest, ids: &[NodeId]) -> Vec<String> {
        ids.iter().map(|&id| forest.node(id).name.clone()).collect()
    }

    fn find(forest: &RegionForest, name: &str) -> NodeId {
        forest
            .roots()
            .iter()
            .flat_map(|&root| forest.preorder(root))
            .find(|&id| forest.node(id).name == name)
            .unwrap_or_else(|| panic!("{name} not in forest"))
    }

    #[test]
    fn test_county_directly_under_province() {
        let forest = build(entries(&[("北京市", "110000"), ("东城区", "110101")]));

        assert_eq!(names(&forest, forest.roots()), vec!["北京市"]);
        let beijing = forest.roots()[0];
        assert_eq!(names(&forest, &forest.node(beijing).children), vec!["东城区"]);
        assert_eq!(forest.node(find(&forest, "东城区")).parent, Some(beijing));
        assert!(forest.warnings().is_empty());
    }

    #[test]
    fn test_city_after_county_climbs_to_province() {
        let forest = build(entries(&[
            ("河北省", "130000"),
            ("石家庄市", "130100"),
            ("长安区", "130102"),
            ("保定市", "130600"),
        ]));

        let hebei = find(&forest, "河北省");
        assert_eq!(
            names(&forest, &forest.node(hebei).children),
            vec!["石家庄市", "保定市"]
        );
        let sjz = find(&forest, "石家庄市");
        assert_eq!(names(&forest, &forest.node(sjz).children), vec!["长安区"]);
        assert!(forest.node(find(&forest, "长安区")).children.is_empty());
    }

    #[test]
    fn test_sibling_provinces() {
        let forest = build(entries(&[
            ("北京市", "110000"),
            ("东城区", "110101"),
            ("天津市", "120000"),
            ("河北省", "130000"),
            ("石家庄市", "130100"),
            ("长安区", "130102"),
            ("山西省", "140000"),
        ]));

        assert_eq!(
            names(&forest, forest.roots()),
            vec!["北京市", "天津市", "河北省", "山西省"]
        );
        for &root in forest.roots() {
            assert_eq!(forest.node(root).parent, None);
        }
    }

    #[test]
    fn test_sibling_cities_and_counties() {
        let forest = build(entries(&[
            ("河北省", "130000"),
            ("石家庄市", "130100"),
            ("长安区", "130102"),
            ("桥西区", "130104"),
            ("唐山市", "130200"),
            ("路南区", "130202"),
        ]));

        let sjz = find(&forest, "石家庄市");
        assert_eq!(
            names(&forest, &forest.node(sjz).children),
            vec!["长安区", "桥西区"]
        );
        let tangshan = find(&forest, "唐山市");
        assert_eq!(names(&forest, &forest.node(tangshan).children), vec!["路南区"]);
        assert_eq!(forest.depth(find(&forest, "路南区")), 2);
    }

    #[test]
    fn test_city_immediately_after_city() {
        let forest = build(entries(&[
            ("河北省", "130000"),
            ("石家庄市", "130100"),
            ("唐山市", "130200"),
        ]));

        let hebei = find(&forest, "河北省");
        assert_eq!(
            names(&forest, &forest.node(hebei).children),
            vec!["石家庄市", "唐山市"]
        );
    }

    #[test]
    fn test_province_after_county_ascends_to_root() {
        let forest = build(entries(&[
            ("河北省", "130000"),
            ("石家庄市", "130100"),
            ("长安区", "130102"),
            ("山西省", "140000"),
            ("太原市", "140100"),
        ]));

        assert_eq!(names(&forest, forest.roots()), vec!["河北省", "山西省"]);
        let shanxi = find(&forest, "山西省");
        assert_eq!(names(&forest, &forest.node(shanxi).children), vec!["太原市"]);
    }

    #[test]
    fn test_orphan_city_is_clamped_at_root() {
        let forest = build(entries(&[("石家庄市", "130100"), ("长安区", "130102")]));

        assert_eq!(names(&forest, forest.roots()), vec!["石家庄市"]);
        assert_eq!(forest.warnings().len(), 1);
        assert!(matches!(
            &forest.warnings()[0],
            BuildWarning::Orphan { position: 1, tier: Tier::City, .. }
        ));
        // The county still nests under the orphaned city
        assert_eq!(forest.depth(find(&forest, "长安区")), 1);
    }

    #[test]
    fn test_malformed_code_is_kept_as_county() {
        let forest = build(entries(&[("河北省", "130000"), ("未知", "")]));

        assert_eq!(forest.len(), 2);
        let unknown = find(&forest, "未知");
        assert_eq!(forest.node(unknown).tier, Tier::County);
        assert_eq!(forest.node(unknown).parent, Some(find(&forest, "河北省")));
        assert!(matches!(
            &forest.warnings()[0],
            BuildWarning::MalformedCode { position: 2, .. }
        ));
    }

    #[test]
    fn test_ancestor_stack_depth() {
        let mut builder = HierarchyBuilder::new();
        assert_eq!(builder.depth(), 0);
        builder.push(RawEntry::new("河北省", "130000"));
        assert_eq!(builder.depth(), 1);
        builder.push(RawEntry::new("石家庄市", "130100"));
        assert_eq!(builder.depth(), 2);
        builder.push(RawEntry::new("长安区", "130102"));
        assert_eq!(builder.depth(), 3);
        builder.push(RawEntry::new("桥西区", "130104"));
        assert_eq!(builder.depth(), 3);
        builder.push(RawEntry::new("唐山市", "130200"));
        assert_eq!(builder.depth(), 2);
        builder.push(RawEntry::new("山西省", "140000"));
        assert_eq!(builder.depth(), 1);
    }

    #[test]
    fn test_empty_input() {
        let forest = build(Vec::new());
        assert!(forest.is_empty());
        assert!(forest.roots().is_empty());
    }
}
