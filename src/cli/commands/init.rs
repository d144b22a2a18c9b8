use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::store::TaxStore;

#[derive(Args)]
pub struct InitArgs {
    /// Path of the database to create
    #[arg(short, long, value_name = "FILE")]
    pub db: PathBuf,
}

pub fn run(args: InitArgs) -> Result<()> {
    let store = TaxStore::open(&args.db)?;
    store.init_schema()?;
    info!(file = %args.db.display(), "initialized taxonomy schema");
    Ok(())
}
