pub mod cli;
pub mod ingest;
pub mod store;
pub mod taxonomy;

pub use crate::store::TaxStore;
pub use crate::taxonomy::{Lineage, NewNode, RankRegistry, Taxonomy};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaxtreeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Corrupt taxonomy: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, TaxtreeError>;
