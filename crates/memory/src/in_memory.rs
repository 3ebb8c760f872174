//! In-memory store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use recollect_core::clock::{Clock, SystemClock};
use recollect_core::error::StoreError;
use recollect_core::item::{
    Artifact, EpisodicItem, SemanticItem, ThreadItems, UsageEvent, UsageStats,
};
use recollect_core::store::MemoryStore;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A store that keeps every thread in a map. Upserts replace in place, so a
/// thread's items keep their first-insertion order.
pub struct InMemoryStore {
    threads: Arc<RwLock<BTreeMap<String, ThreadItems>>>,
    usage: Arc<RwLock<HashMap<String, UsageStats>>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Use `clock` to timestamp usage events.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            threads: Arc::new(RwLock::new(BTreeMap::new())),
            usage: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn upsert_by<T>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> &str) {
    match items.iter().position(|i| key(i) == key(&item)) {
        Some(idx) => items[idx] = item,
        None => items.push(item),
    }
}

/// Bump `usage_count` on the semantic item with `item_id`, returning its thread.
pub(crate) fn bump_usage_count(
    threads: &mut BTreeMap<String, ThreadItems>,
    item_id: &str,
) -> Option<String> {
    threads.iter_mut().find_map(|(thread_id, items)| {
        let item = items.semantic.iter_mut().find(|s| s.id == item_id)?;
        item.usage_count = item.usage_count.saturating_add(1);
        Some(thread_id.clone())
    })
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load_thread_items(&self, thread_id: &str) -> Result<ThreadItems, StoreError> {
        let threads = self.threads.read().await;
        Ok(threads.get(thread_id).cloned().unwrap_or_default())
    }

    async fn load_usage_stats(&self, item_id: &str) -> Result<Option<UsageStats>, StoreError> {
        Ok(self.usage.read().await.get(item_id).cloned())
    }

    async fn upsert_semantic(&self, item: SemanticItem) -> Result<(), StoreError> {
        let mut threads = self.threads.write().await;
        let thread = threads.entry(item.thread_id.clone()).or_default();
        upsert_by(&mut thread.semantic, item, |i| &i.id);
        Ok(())
    }

    async fn upsert_episodic(&self, item: EpisodicItem) -> Result<(), StoreError> {
        let mut threads = self.threads.write().await;
        let thread = threads.entry(item.thread_id.clone()).or_default();
        upsert_by(&mut thread.episodic, item, |i| &i.id);
        Ok(())
    }

    async fn upsert_artifact(&self, artifact: Artifact) -> Result<(), StoreError> {
        let mut threads = self.threads.write().await;
        let thread = threads.entry(artifact.thread_id.clone()).or_default();
        upsert_by(&mut thread.artifacts, artifact, |a| &a.reference);
        Ok(())
    }

    async fn record_usage(
        &self,
        item_id: &str,
        event: UsageEvent,
    ) -> Result<UsageStats, StoreError> {
        bump_usage_count(&mut *self.threads.write().await, item_id);
        let mut usage = self.usage.write().await;
        let stats = usage.entry(item_id.to_string()).or_default();
        stats.record(event, self.clock.now());
        Ok(stats.clone())
    }

    async fn thread_ids(&self) -> Result<Vec<String>, StoreError> {
        let threads = self.threads.read().await;
        Ok(threads
            .iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(id, _)| id.clone())
            .collect())
    }
}
