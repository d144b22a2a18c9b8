pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "taxtree",
    version,
    about = "Taxonomic lineage construction and taxtable export",
    long_about = "Taxtree materializes rank-by-rank lineages from a local SQLite copy of a \
                  parent-pointer taxonomy (e.g. the NCBI taxonomy), renames ranks the source \
                  data leaves undefined, and exports the accumulated lineages as a CSV table."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build lineages for a set of taxa and export them as a table
    Taxtable(commands::taxtable::TaxtableArgs),

    /// Look up the lineage of a single taxon
    Lineage(commands::lineage::LineageArgs),

    /// Create an empty taxonomy database
    Init(commands::init::InitArgs),
}
