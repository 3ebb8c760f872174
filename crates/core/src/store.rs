//! Store trait — the persistence boundary of the memory engine.
//!
//! The engine reads a thread snapshot, computes in memory, and writes back
//! through idempotent upserts. Store failures are the only errors allowed
//! to escape the core; they are returned unchanged to the caller.

use async_trait::async_trait;
use crate::error::StoreError;
use crate::item::{Artifact, EpisodicItem, SemanticItem, ThreadItems, UsageEvent, UsageStats};

/// The core MemoryStore trait.
///
/// Implementations: in-memory (for testing), JSONL files.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// The backend name (e.g., "memory", "file").
    fn name(&self) -> &str;

    /// Load every item the thread owns.
    async fn load_thread_items(&self, thread_id: &str) -> Result<ThreadItems, StoreError>;

    /// Usage counters for one item, if any feedback was ever recorded.
    async fn load_usage_stats(&self, item_id: &str) -> Result<Option<UsageStats>, StoreError>;

    /// Insert or replace a semantic item, keyed by `id`.
    async fn upsert_semantic(&self, item: SemanticItem) -> Result<(), StoreError>;

    /// Insert or replace an episodic item, keyed by `id`.
    async fn upsert_episodic(&self, item: EpisodicItem) -> Result<(), StoreError>;

    /// Insert or replace an artifact, keyed by `ref`.
    async fn upsert_artifact(&self, artifact: Artifact) -> Result<(), StoreError>;

    /// Feedback path: record a usage signal against an item. Semantic items
    /// also count it in their `usage_count`.
    async fn record_usage(&self, item_id: &str, event: UsageEvent) -> Result<UsageStats, StoreError>;

    /// All thread ids with at least one stored item, sorted.
    async fn thread_ids(&self) -> Result<Vec<String>, StoreError>;
}
