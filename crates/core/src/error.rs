//! Error types for the recollect domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Extraction, consolidation, ranking and working-set assembly are total
//! functions and never produce errors; only the store boundary does.

use thiserror::Error;

/// The top-level error type for all recollect operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised by a [`MemoryStore`](crate::store::MemoryStore).
///
/// These are propagated unchanged to the caller; the core never retries.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store I/O failed: {0}")]
    Io(String),

    #[error("Failed to (de)serialize stored record: {0}")]
    Serialization(String),

    #[error("Item not found: {0}")]
    NotFound(String),
}
