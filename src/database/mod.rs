// Persistence layer: entities, store traits, Postgres and in-memory backends
pub mod models;
pub mod pool;
pub mod stores;

// Re-export core types
pub use models::*;
pub use stores::*;

use thiserror::Error;

/// Errors from the store layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
