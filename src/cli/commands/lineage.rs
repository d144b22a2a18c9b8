use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::store::TaxStore;
use crate::taxonomy::Taxonomy;

#[derive(Args)]
pub struct LineageArgs {
    /// Path to the taxonomy SQLite database
    #[arg(short, long, value_name = "FILE")]
    pub db: PathBuf,

    /// Taxon identifier to look up
    #[arg(required_unless_present = "name", conflicts_with = "name")]
    pub tax_id: Option<String>,

    /// Look up by taxonomic name (primary names, then synonyms)
    #[arg(short, long)]
    pub name: Option<String>,
}

pub fn run(args: LineageArgs) -> Result<()> {
    let store = TaxStore::open(&args.db)?;
    let mut tax = Taxonomy::new(store);

    let tax_id = match (&args.tax_id, &args.name) {
        (Some(tax_id), None) => tax_id.clone(),
        (None, Some(name)) => {
            let matched = tax.resolve_name(name)?;
            if !matched.is_primary {
                info!(name = %name, matched = %matched.tax_name, "matched via synonym");
            }
            matched.tax_id
        }
        // clap enforces exactly one of the two.
        _ => anyhow::bail!("provide a tax_id or --name"),
    };

    let lineage = tax.lineage(&tax_id)?;
    println!("{}", serde_json::to_string_pretty(&lineage)?);
    Ok(())
}
