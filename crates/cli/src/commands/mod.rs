pub mod config_cmd;
pub mod context;
pub mod ingest;
pub mod stats;

use recollect_config::RecollectConfig;
use recollect_context::MemoryService;

/// Load config and open the configured store.
pub(crate) fn open_service() -> Result<MemoryService, Box<dyn std::error::Error>> {
    let config = RecollectConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let store = recollect_memory::open_store(&config.store)?;
    tracing::debug!(backend = store.name(), "Store opened");
    Ok(MemoryService::new(store, &config))
}
