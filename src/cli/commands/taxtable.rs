use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use crate::ingest;
use crate::store::TaxStore;
use crate::taxonomy::Taxonomy;
use crate::TaxtreeError;

#[derive(Args)]
pub struct TaxtableArgs {
    /// Path to the taxonomy SQLite database
    #[arg(short, long, value_name = "FILE")]
    pub db: PathBuf,

    /// Comma-delimited tax_ids, or a file of whitespace-delimited tax_ids
    /// (lines beginning with '#' are ignored)
    #[arg(short, long, value_name = "IDS|FILE")]
    pub tax_ids: Option<String>,

    /// File of taxonomic names (one per line, '#' comments) matched
    /// against primary names and synonyms
    #[arg(short = 'n', long, value_name = "FILE")]
    pub tax_names: Option<PathBuf>,

    /// CSV file of nodes to add to the taxonomy before building the table
    #[arg(short = 'a', long, value_name = "FILE")]
    pub add_nodes: Option<PathBuf>,

    /// Source name recorded for added nodes that carry none themselves
    #[arg(short = 'S', long, default_value = "unknown")]
    pub source_name: String,

    /// Emit every registered rank column, not just the occupied ones
    #[arg(long)]
    pub full: bool,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn run(args: TaxtableArgs) -> Result<()> {
    let store = TaxStore::open(&args.db)?;
    let mut tax = Taxonomy::new(store);

    if let Some(path) = &args.add_nodes {
        add_new_nodes(&mut tax, path, &args.source_name)?;
    }

    for tax_id in collect_tax_ids(args.tax_ids.as_deref())? {
        tax.lineage(&tax_id)
            .with_context(|| format!("building lineage for tax_id {tax_id}"))?;
    }

    if let Some(path) = &args.tax_names {
        for name in read_name_list(path)? {
            let matched = tax.resolve_name(&name)?;
            if !matched.is_primary {
                info!(name = %name, tax_id = %matched.tax_id, "matched via synonym");
            }
            tax.lineage(&matched.tax_id)
                .with_context(|| format!("building lineage for name {name:?}"))?;
        }
    }

    match &args.output {
        Some(path) => {
            info!(file = %path.display(), "writing taxtable");
            let file =
                File::create(path).with_context(|| format!("creating {}", path.display()))?;
            tax.write_table(None, args.full, file)?;
        }
        None => tax.write_table(None, args.full, io::stdout().lock())?,
    }
    Ok(())
}

fn add_new_nodes(tax: &mut Taxonomy, path: &Path, default_source: &str) -> Result<()> {
    let nodes = ingest::read_new_nodes(path)?;
    for mut node in nodes {
        if node.source_id.is_none() && node.source_name.is_none() {
            node.source_name = Some(default_source.to_string());
        }
        match tax.add_node(&node) {
            Ok(_) => info!(tax_id = %node.tax_id, "added node"),
            // Typically a tax_id that already exists; skip and continue.
            Err(TaxtreeError::Database(e)) => {
                warn!(tax_id = %node.tax_id, error = %e, "skipping node");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Tax_ids either inline (comma-delimited) or from a file of
/// whitespace-delimited ids with '#' comment lines.
fn collect_tax_ids(ids: Option<&str>) -> Result<Vec<String>> {
    let Some(ids) = ids else {
        return Ok(Vec::new());
    };
    let path = Path::new(ids);
    if path.is_file() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Ok(content
            .lines()
            .filter(|line| !line.trim_start().starts_with('#'))
            .flat_map(str::split_whitespace)
            .map(str::to_string)
            .collect())
    } else {
        Ok(ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// One name per line; blank lines and '#' comments are ignored.
fn read_name_list(path: &Path) -> Result<Vec<String>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
