//! Ingestion of supplementary "new taxon" records.
//!
//! Records arrive as CSV with a header row naming at least `tax_id`,
//! `parent_id`, `rank` and `tax_name`; `source_id` and `source_name`
//! columns are optional and other columns are ignored. The engine
//! consumes the records purely through [`Taxonomy::add_node`].
//!
//! [`Taxonomy::add_node`]: crate::taxonomy::Taxonomy::add_node

use std::path::Path;

use tracing::debug;

use crate::taxonomy::NewNode;
use crate::Result;

/// Read new-node records from a CSV file. Rows with an empty `tax_id`
/// are skipped.
pub fn read_new_nodes<P: AsRef<Path>>(path: P) -> Result<Vec<NewNode>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)?;
    let mut nodes = Vec::new();
    for record in reader.deserialize() {
        let node: NewNode = record?;
        if node.tax_id.is_empty() {
            continue;
        }
        nodes.push(node);
    }
    debug!(count = nodes.len(), file = %path.display(), "read new-node records");
    Ok(nodes)
}
