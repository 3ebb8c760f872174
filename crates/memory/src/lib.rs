//! Memory pipeline for recollect: extraction, consolidation and storage.
//!
//! - [`Extractor`] turns raw conversation text into candidate items.
//! - [`Consolidator`] merges candidates into a thread's existing memory.
//! - [`InMemoryStore`] and [`FileStore`] implement
//!   [`MemoryStore`](recollect_core::MemoryStore).

pub mod consolidator;
pub mod extractor;
pub mod file_backend;
pub mod in_memory;
pub mod redact;
pub mod similarity;

pub use consolidator::{Consolidator, Outcome};
pub use extractor::{Extraction, Extractor};
pub use file_backend::FileStore;
pub use in_memory::InMemoryStore;
pub use redact::{Redacted, redact};

use recollect_config::StoreConfig;
use recollect_core::{MemoryStore, StoreError};
use std::sync::Arc;

/// Open the backend named in `config`.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn MemoryStore>, StoreError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryStore::new())),
        "file" => Ok(Arc::new(FileStore::new(config.resolved_path()))),
        other => Err(StoreError::Unavailable(format!(
            "Unknown store backend: {other}"
        ))),
    }
}
