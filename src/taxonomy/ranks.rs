//! Ordered registry of taxonomic rank labels.

use std::collections::HashSet;

/// Rank value NCBI assigns to taxa without an explicit rank.
pub const UNDEFINED_RANK: &str = "no_rank";

/// Rank assigned to the root node when the taxonomy is loaded.
pub const ROOT_RANK: &str = "root";

/// Prefix used when synthesizing a label for an undefined rank.
pub const UNDEF_PREFIX: &str = "below";

/// NCBI rank names, root first. Whitespace in the original labels is
/// replaced by underscores so rank labels are usable as column names.
pub const NCBI_RANKS: &[&str] = &[
    "root",
    "superkingdom",
    "kingdom",
    "subkingdom",
    "superphylum",
    "phylum",
    "subphylum",
    "superclass",
    "class",
    "subclass",
    "infraclass",
    "superorder",
    "order",
    "suborder",
    "parvorder",
    "infraorder",
    "superfamily",
    "family",
    "subfamily",
    "tribe",
    "subtribe",
    "genus",
    "subgenus",
    "species_group",
    "species_subgroup",
    "species",
    "subspecies",
    "varietas",
    "forma",
];

/// An ordered catalog of rank labels, root first, that grows as lineage
/// construction synthesizes labels for undefined ranks. Labels are never
/// removed or reordered once registered.
#[derive(Debug, Clone)]
pub struct RankRegistry {
    ranks: Vec<String>,
    seen: HashSet<String>,
}

impl RankRegistry {
    pub fn new(ranks: &[&str]) -> Self {
        Self {
            ranks: ranks.iter().map(|r| r.to_string()).collect(),
            seen: ranks.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Registry preloaded with the standard NCBI rank names.
    pub fn ncbi() -> Self {
        Self::new(NCBI_RANKS)
    }

    pub fn contains(&self, rank: &str) -> bool {
        self.seen.contains(rank)
    }

    /// Insert `rank` immediately after `parent_rank`. Inserting a label
    /// that is already registered is a no-op, so repeated synthesis of the
    /// same label from sibling subtrees converges on one entry.
    ///
    /// # Panics
    ///
    /// Panics if `parent_rank` is not registered. Lineages are built root
    /// to leaf, which registers every generating rank before its
    /// descendants; hitting this panic indicates a traversal-order bug.
    pub fn insert_after(&mut self, rank: &str, parent_rank: &str) {
        if self.seen.contains(rank) {
            return;
        }
        let pos = self
            .ranks
            .iter()
            .position(|r| r == parent_rank)
            .unwrap_or_else(|| panic!("rank {parent_rank:?} is not registered"));
        self.ranks.insert(pos + 1, rank.to_string());
        self.seen.insert(rank.to_string());
    }

    /// Rank labels in order, root first.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.ranks.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

impl Default for RankRegistry {
    fn default() -> Self {
        Self::ncbi()
    }
}
