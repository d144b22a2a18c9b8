//! Lineage construction over a parent-pointer taxonomy.
//!
//! The engine answers "what is the full rank-by-rank ancestry of taxon X"
//! by walking parent links up to the root, renaming ranks the source data
//! leaves undefined, and memoizing everything it builds. Caches are never
//! evicted: once a taxon has been queried its lineage stays available for
//! the life of the engine instance, and overlapping queries pay the
//! upward-walk cost once per distinct node.

pub mod lineage;
pub mod ranks;
pub mod table;

pub use lineage::Lineage;
pub use ranks::RankRegistry;

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use crate::store::{NameRow, NodeRow, TaxStore};
use crate::{Result, TaxtreeError};

/// Upper bound on the length of an ancestor chain. NCBI lineages are at
/// most a few dozen nodes deep; exceeding this means the parent pointers
/// in the store form a cycle.
const MAX_DEPTH: usize = 512;

/// A record supplied by the new-node ingestion collaborator. Exactly one
/// of `source_id` and `source_name` must be set when the record is handed
/// to [`Taxonomy::add_node`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewNode {
    pub tax_id: String,
    pub parent_id: String,
    pub rank: String,
    pub tax_name: String,
    #[serde(default)]
    pub source_id: Option<i64>,
    #[serde(default)]
    pub source_name: Option<String>,
}

/// Outcome of a name → taxon lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMatch {
    pub tax_id: String,
    /// The name that matched, which may be a synonym of the primary name.
    pub tax_name: String,
    pub is_primary: bool,
}

/// The lineage engine. Owns the rank registry and both memoization
/// tables; single-threaded by design (see `&mut self` on everything that
/// can populate a cache or extend the registry).
pub struct Taxonomy {
    store: TaxStore,
    ranks: RankRegistry,
    undefined_rank: String,
    undef_prefix: String,
    /// Ancestor chains as (rank, tax_id) pairs, root first, keyed by the
    /// chain's own leaf. Ranks here are raw; renaming happens at lineage
    /// build time.
    chains: HashMap<String, Vec<(String, String)>>,
    /// Finished lineage records, keyed by tax_id.
    lineages: HashMap<String, Lineage>,
}

impl Taxonomy {
    /// Engine over `store` with the standard NCBI rank registry.
    pub fn new(store: TaxStore) -> Self {
        Self::with_registry(store, RankRegistry::default())
    }

    pub fn with_registry(store: TaxStore, ranks: RankRegistry) -> Self {
        Self {
            store,
            ranks,
            undefined_rank: ranks::UNDEFINED_RANK.to_string(),
            undef_prefix: ranks::UNDEF_PREFIX.to_string(),
            chains: HashMap::new(),
            lineages: HashMap::new(),
        }
    }

    pub fn store(&self) -> &TaxStore {
        &self.store
    }

    pub fn ranks(&self) -> &RankRegistry {
        &self.ranks
    }

    /// Whether a finished lineage for `tax_id` is already cached.
    pub fn has_lineage(&self, tax_id: &str) -> bool {
        self.lineages.contains_key(tax_id)
    }

    fn node(&self, tax_id: &str) -> Result<NodeRow> {
        self.store.node(tax_id)?.ok_or_else(|| {
            TaxtreeError::NotFound(format!("tax_id {tax_id:?} not found in nodes"))
        })
    }

    /// The ancestor chain for `tax_id` as (rank, tax_id) pairs, root
    /// first. Walks upward only as far as the first cached ancestor and
    /// caches the chain of every node visited on the way, so a batch of
    /// overlapping queries hits the store once per distinct node.
    fn chain(&mut self, tax_id: &str) -> Result<Vec<(String, String)>> {
        if let Some(cached) = self.chains.get(tax_id) {
            return Ok(cached.clone());
        }
        debug!(tax_id, "reconstructing ancestor chain");

        // Walk up, collecting uncached nodes leaf-to-root.
        let mut pending: Vec<NodeRow> = Vec::new();
        let mut cursor = tax_id.to_string();
        let mut chain: Vec<(String, String)> = loop {
            if let Some(cached) = self.chains.get(&cursor) {
                break cached.clone();
            }
            if pending.len() == MAX_DEPTH {
                return Err(TaxtreeError::Corrupt(format!(
                    "no root reached within {MAX_DEPTH} steps above tax_id {tax_id:?}"
                )));
            }
            let node = self.node(&cursor)?;
            let at_root = node.parent_id == node.tax_id;
            cursor = node.parent_id.clone();
            pending.push(node);
            if at_root {
                break Vec::new();
            }
        };

        // Extend the prefix top-down, caching each intermediate chain.
        for node in pending.into_iter().rev() {
            chain.push((node.rank, node.tax_id.clone()));
            self.chains.insert(node.tax_id, chain.clone());
        }
        Ok(chain)
    }

    /// The full lineage of `tax_id`: rank → ancestor tax_id plus the
    /// taxon's own metadata. Built once and cached; the second call for
    /// the same taxon performs no store lookups.
    ///
    /// Undefined ranks are renamed root-to-leaf by prefixing the previous
    /// (possibly itself synthesized) rank label, and the synthesized
    /// label is registered immediately after its generating rank. The
    /// synthesis depends only on the parent rank, so sibling subtrees
    /// converge on identical labels regardless of query order.
    pub fn lineage(&mut self, tax_id: &str) -> Result<Lineage> {
        if let Some(cached) = self.lineages.get(tax_id) {
            return Ok(cached.clone());
        }
        debug!(tax_id, "building lineage");

        let chain = self.chain(tax_id)?;
        let mut rank_map = IndexMap::with_capacity(chain.len());
        let mut prev: Option<String> = None;
        for (raw_rank, id) in &chain {
            let label = if *raw_rank == self.undefined_rank {
                let parent_rank = prev.as_deref().ok_or_else(|| {
                    TaxtreeError::Corrupt(format!(
                        "root tax_id {id:?} carries the {:?} sentinel",
                        self.undefined_rank
                    ))
                })?;
                let label = format!("{}_{}", self.undef_prefix, parent_rank);
                self.ranks.insert_after(&label, parent_rank);
                label
            } else {
                raw_rank.clone()
            };
            rank_map.insert(label.clone(), id.clone());
            prev = Some(label);
        }

        let rank = prev.ok_or_else(|| {
            TaxtreeError::Corrupt(format!("empty ancestor chain for tax_id {tax_id:?}"))
        })?;
        let parent_id = if chain.len() >= 2 {
            chain[chain.len() - 2].1.clone()
        } else {
            tax_id.to_string()
        };
        let tax_name = self.primary_name(tax_id)?;

        let built = Lineage {
            tax_id: tax_id.to_string(),
            parent_id,
            rank,
            tax_name,
            ranks: rank_map,
        };
        self.lineages.insert(tax_id.to_string(), built.clone());
        Ok(built)
    }

    /// The primary name recorded for `tax_id`.
    pub fn primary_name(&self, tax_id: &str) -> Result<String> {
        self.store.primary_name(tax_id)?.ok_or_else(|| {
            TaxtreeError::NotFound(format!("no primary name for tax_id {tax_id:?}"))
        })
    }

    /// Map a name to a taxon. Primary names are searched first; synonyms
    /// only when no primary name matches. When several taxa share the
    /// queried name, the lowest tax_id wins (numeric value, then
    /// lexicographic).
    pub fn resolve_name(&self, tax_name: &str) -> Result<NameMatch> {
        let row = match self.store.match_primary(tax_name)? {
            Some(row) => row,
            None => self.store.match_synonym(tax_name)?.ok_or_else(|| {
                TaxtreeError::NotFound(format!(
                    "name {tax_name:?} matches no primary name or synonym"
                ))
            })?,
        };
        Ok(NameMatch {
            tax_id: row.tax_id,
            tax_name: row.tax_name,
            is_primary: row.is_primary,
        })
    }

    /// Non-primary names of a taxon, identified by exactly one of
    /// `tax_id` or `tax_name`.
    pub fn synonyms(&self, tax_id: Option<&str>, tax_name: Option<&str>) -> Result<Vec<String>> {
        let tax_id = match (tax_id, tax_name) {
            (Some(id), None) => id.to_string(),
            (None, Some(name)) => self.resolve_name(name)?.tax_id,
            _ => {
                return Err(TaxtreeError::InvalidInput(
                    "synonyms requires exactly one of tax_id or tax_name".to_string(),
                ))
            }
        };
        self.store.synonyms_of(&tax_id)
    }

    /// Record a provenance source, returning its id and whether a new row
    /// was created. Re-adding an existing name is not an error; the
    /// existing id comes back with `created = false`.
    pub fn add_source(&mut self, name: &str, description: Option<&str>) -> Result<(i64, bool)> {
        if let Some(id) = self.store.try_insert_source(name, description)? {
            return Ok((id, true));
        }
        let id = self.store.source_id_by_name(name)?.ok_or_else(|| {
            TaxtreeError::NotFound(format!(
                "source {name:?} missing after uniqueness conflict"
            ))
        })?;
        Ok((id, false))
    }

    /// Append a taxon and its primary name, then build and return its
    /// lineage. The record must carry exactly one of `source_id` and
    /// `source_name`; a source name is resolved (creating the source row
    /// if needed) via [`Taxonomy::add_source`].
    pub fn add_node(&mut self, node: &NewNode) -> Result<Lineage> {
        let source_id = match (node.source_id, node.source_name.as_deref()) {
            (Some(id), None) => id,
            (None, Some(name)) => self.add_source(name, None)?.0,
            (Some(_), Some(_)) => {
                return Err(TaxtreeError::InvalidInput(
                    "add_node accepts source_id or source_name, not both".to_string(),
                ))
            }
            (None, None) => {
                return Err(TaxtreeError::InvalidInput(
                    "add_node requires source_id or source_name".to_string(),
                ))
            }
        };

        self.store.insert_node(&NodeRow {
            tax_id: node.tax_id.clone(),
            parent_id: node.parent_id.clone(),
            rank: node.rank.clone(),
            source_id,
        })?;
        self.store.insert_name(&NameRow {
            tax_id: node.tax_id.clone(),
            tax_name: node.tax_name.clone(),
            is_primary: true,
        })?;

        debug!(tax_id = %node.tax_id, rank = %node.rank, "added node");
        self.lineage(&node.tax_id)
    }
}
