//! The lineage record handed back to callers and to the table writer.

use indexmap::IndexMap;
use serde::Serialize;

/// A fully built lineage: fixed metadata fields plus the rank→tax_id
/// mapping accumulated on the walk down from the root. The rank map is
/// ordered root first and its key set varies per taxon, since labels for
/// undefined ranks are synthesized from the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lineage {
    pub tax_id: String,
    pub parent_id: String,
    /// The taxon's own rank, after undefined-rank renaming.
    pub rank: String,
    /// Primary name of the taxon.
    pub tax_name: String,
    /// Rank label to ancestor tax_id, root first; includes the taxon itself.
    #[serde(flatten)]
    pub ranks: IndexMap<String, String>,
}

impl Lineage {
    /// The tax_id of the ancestor at `rank`, if the lineage passes
    /// through that rank.
    pub fn ancestor_at(&self, rank: &str) -> Option<&str> {
        self.ranks.get(rank).map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.parent_id == self.tax_id
    }

    /// Number of nodes on the root-to-taxon chain.
    pub fn depth(&self) -> usize {
        self.ranks.len()
    }
}
