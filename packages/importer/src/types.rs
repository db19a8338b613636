//! Core data types for the importer.
//!
//! The in-memory forest is an arena: nodes live in one vector and refer to
//! their parent and children by [`NodeId`]. The country-level root is never a
//! node; top-level subtrees are listed in [`RegionForest::roots`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity assigned to a region by the persistent store.
pub type RegionId = i64;

/// One (name, code) pair from the source listing, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Division name (e.g. "石家庄市").
    pub name: String,

    /// Raw division code as scraped (e.g. "130100").
    pub division_code: String,
}

impl RawEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(name: impl Into<String>, division_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            division_code: division_code.into(),
        }
    }
}

/// Administrative tier derived from a division code.
///
/// Ordered by depth: a tier only nests under tiers that compare less.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// The synthetic country-level root. Never produced by classification.
    Root,
    Province,
    City,
    County,
}

impl Tier {
    /// Get the string value for display.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Province => "province",
            Self::City => "city",
            Self::County => "county",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index of a node inside a [`RegionForest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

/// A division in the reconstructed tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionNode {
    pub name: String,
    pub division_code: String,
    pub tier: Tier,

    /// `None` for top-level subtrees.
    pub parent: Option<NodeId>,

    /// Children in document order.
    pub children: Vec<NodeId>,
}

/// Non-fatal data-quality findings raised while building the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildWarning {
    /// Code is not six ASCII digits; it was classified by the fallback rule.
    MalformedCode {
        position: usize,
        name: String,
        division_code: String,
    },

    /// A city or county appeared with no open province and became top-level.
    Orphan {
        position: usize,
        name: String,
        division_code: String,
        tier: Tier,
    },
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedCode {
                position,
                name,
                division_code,
            } => write!(
                f,
                "entry {position} ('{name}'): malformed division code '{division_code}'"
            ),
            Self::Orphan {
                position,
                name,
                division_code,
                tier,
            } => write!(
                f,
                "entry {position} ('{name}', {division_code}): {tier} has no enclosing province, kept as top-level"
            ),
        }
    }
}

/// The reconstructed forest of top-level subtrees.
#[derive(Debug, Clone, Default)]
pub struct RegionForest {
    pub(crate) nodes: Vec<RegionNode>,
    pub(crate) roots: Vec<NodeId>,
    pub(crate) warnings: Vec<BuildWarning>,
}

impl RegionForest {
    /// Create an empty forest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node under `parent`, or as a new top-level subtree.
    pub(crate) fn attach(&mut self, entry: RawEntry, tier: Tier, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(RegionNode {
            name: entry.name,
            division_code: entry.division_code,
            tier,
            parent,
            children: Vec::new(),
        });

        match parent {
            Some(parent_id) => self.nodes[parent_id.0].children.push(id),
            None => self.roots.push(id),
        }

        id
    }

    /// Look up a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &RegionNode {
        &self.nodes[id.0]
    }

    /// Top-level subtrees in document order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Warnings collected while building.
    #[must_use]
    pub fn warnings(&self) -> &[BuildWarning] {
        &self.warnings
    }

    /// Total number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of a subtree in pre-order, starting at `root`.
    #[must_use]
    pub fn preorder(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        order
    }

    /// All nodes in pre-order across every top-level subtree.
    #[must_use]
    pub fn flatten(&self) -> Vec<&RegionNode> {
        self.roots
            .iter()
            .flat_map(|&root| self.preorder(root))
            .map(|id| self.node(id))
            .collect()
    }

    /// Number of edges between `id` and its top-level ancestor.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.node(parent).parent;
        }
        depth
    }
}

/// A row handed to the store, part of one pre-ordered subtree batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRegion {
    pub name: String,
    pub division_code: String,
    pub full_name: String,

    /// Materialized path code (e.g. "0001.0002").
    pub code: String,

    /// Depth below the top-level subtree root (which is 0).
    pub level: i32,

    /// Index of the parent row within the same batch; `None` for the batch root.
    pub parent: Option<usize>,
}

/// A committed region as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub id: RegionId,
    pub parent_id: Option<RegionId>,
    pub name: String,
    pub division_code: String,
    pub full_name: String,
    pub code: String,
    pub level: i32,
}
