//! Error type shared by the catalog store, the listing parameters and the
//! category collaborator.
//!
//! Query construction itself never fails: the normalizer, the rules and
//! the composer degrade to empty output instead of returning errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("`{0}` already exists")]
    Conflict(String),

    /// Rejected filter, sort, include or page parameter.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown search rule `{0}`")]
    UnknownRule(String),

    #[error("invalid boost {value} for field `{field}`")]
    InvalidBoost { field: String, value: f64 },

    #[error("category hierarchy contains a cycle through `{0}`")]
    CategoryCycle(String),

    #[error("category hierarchy deeper than {0} levels")]
    CategoryTooDeep(usize),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
