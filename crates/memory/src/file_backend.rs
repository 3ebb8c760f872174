//! File-based store — persistent JSON-lines storage.
//!
//! Each thread gets one JSONL file under `<root>/threads/`, one tagged
//! `MemoryItem` per line. Usage counters live in `<root>/usage.json`.
//!
//! Storage location: `~/.recollect/memory/` unless configured otherwise.
//!
//! Threads are loaded into memory on creation and the affected thread file
//! is rewritten on every upsert. This gives fast reads with durable writes.

use crate::in_memory::{bump_usage_count, upsert_by};
use async_trait::async_trait;
use recollect_core::clock::{Clock, SystemClock};
use recollect_core::error::StoreError;
use recollect_core::item::{
    Artifact, EpisodicItem, MemoryItem, SemanticItem, ThreadItems, UsageEvent, UsageStats,
};
use recollect_core::store::MemoryStore;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

const THREADS_DIR: &str = "threads";
const USAGE_FILE: &str = "usage.json";

/// A file-backed store using one JSONL file per thread.
pub struct FileStore {
    root: PathBuf,
    threads: Arc<RwLock<BTreeMap<String, ThreadItems>>>,
    usage: Arc<RwLock<HashMap<String, UsageStats>>>,
    clock: Arc<dyn Clock>,
}

impl FileStore {
    /// Open (or lazily create) a store rooted at `root`.
    ///
    /// Existing thread files are loaded; the directory is created on first
    /// write.
    pub fn new(root: PathBuf) -> Self {
        Self::with_clock(root, Arc::new(SystemClock))
    }

    pub fn with_clock(root: PathBuf, clock: Arc<dyn Clock>) -> Self {
        let threads = Self::load_threads(&root.join(THREADS_DIR));
        let usage = Self::load_usage(&root.join(USAGE_FILE));
        debug!(
            path = %root.display(),
            threads = threads.len(),
            usage_entries = usage.len(),
            "File store loaded"
        );
        Self {
            root,
            threads: Arc::new(RwLock::new(threads)),
            usage: Arc::new(RwLock::new(usage)),
            clock,
        }
    }

    fn thread_file(&self, thread_id: &str) -> PathBuf {
        self.root
            .join(THREADS_DIR)
            .join(format!("{}.jsonl", sanitize_file_stem(thread_id)))
    }

    fn load_threads(dir: &Path) -> BTreeMap<String, ThreadItems> {
        let mut threads: BTreeMap<String, ThreadItems> = BTreeMap::new();
        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(_) => return threads, // Directory doesn't exist yet — start empty
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                continue;
            }
            let content = match std::fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable thread file");
                    continue;
                }
            };
            for line in content.lines().filter(|l| !l.trim().is_empty()) {
                match serde_json::from_str::<MemoryItem>(line) {
                    Ok(item) => {
                        let thread = threads.entry(item.thread_id().to_string()).or_default();
                        match item {
                            MemoryItem::Semantic(s) => upsert_by(&mut thread.semantic, s, |i| &i.id),
                            MemoryItem::Episodic(e) => upsert_by(&mut thread.episodic, e, |i| &i.id),
                            MemoryItem::Artifact(a) => {
                                upsert_by(&mut thread.artifacts, a, |a| &a.reference)
                            }
                        }
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Skipping corrupted memory item");
                    }
                }
            }
        }
        threads
    }

    fn load_usage(path: &Path) -> HashMap<String, UsageStats> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return HashMap::new(),
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Ignoring corrupted usage file");
            HashMap::new()
        })
    }

    /// Rewrite the file that holds `thread_id`.
    ///
    /// Distinct thread ids can sanitize to the same file name, so every
    /// thread mapping to that file is written.
    fn flush_thread(
        &self,
        threads: &BTreeMap<String, ThreadItems>,
        thread_id: &str,
    ) -> Result<(), StoreError> {
        let path = self.thread_file(thread_id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Io(format!("Failed to create thread directory: {e}"))
            })?;
        }

        let mut content = String::new();
        for (id, items) in threads.iter() {
            if self.thread_file(id) != path {
                continue;
            }
            for item in items.clone().into_items() {
                let line = serde_json::to_string(&item).map_err(|e| {
                    StoreError::Serialization(format!("Failed to serialize memory item: {e}"))
                })?;
                content.push_str(&line);
                content.push('\n');
            }
        }

        std::fs::write(&path, &content)
            .map_err(|e| StoreError::Io(format!("Failed to write thread file: {e}")))
    }

    fn flush_usage(&self, usage: &HashMap<String, UsageStats>) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.root)
            .map_err(|e| StoreError::Io(format!("Failed to create store directory: {e}")))?;
        // Sorted keys keep the file diffable.
        let sorted: BTreeMap<&String, &UsageStats> = usage.iter().collect();
        let content = serde_json::to_string_pretty(&sorted).map_err(|e| {
            StoreError::Serialization(format!("Failed to serialize usage stats: {e}"))
        })?;
        std::fs::write(self.root.join(USAGE_FILE), content)
            .map_err(|e| StoreError::Io(format!("Failed to write usage file: {e}")))
    }
}

/// Map a thread id onto a safe file stem.
fn sanitize_file_stem(thread_id: &str) -> String {
    let stem: String = thread_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() { "_".to_string() } else { stem }
}

#[async_trait]
impl MemoryStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn load_thread_items(&self, thread_id: &str) -> Result<ThreadItems, StoreError> {
        let threads = self.threads.read().await;
        Ok(threads.get(thread_id).cloned().unwrap_or_default())
    }

    async fn load_usage_stats(&self, item_id: &str) -> Result<Option<UsageStats>, StoreError> {
        Ok(self.usage.read().await.get(item_id).cloned())
    }

    async fn upsert_semantic(&self, item: SemanticItem) -> Result<(), StoreError> {
        let thread_id = item.thread_id.clone();
        let mut threads = self.threads.write().await;
        let thread = threads.entry(thread_id.clone()).or_default();
        upsert_by(&mut thread.semantic, item, |i| &i.id);
        self.flush_thread(&threads, &thread_id)
    }

    async fn upsert_episodic(&self, item: EpisodicItem) -> Result<(), StoreError> {
        let thread_id = item.thread_id.clone();
        let mut threads = self.threads.write().await;
        let thread = threads.entry(thread_id.clone()).or_default();
        upsert_by(&mut thread.episodic, item, |i| &i.id);
        self.flush_thread(&threads, &thread_id)
    }

    async fn upsert_artifact(&self, artifact: Artifact) -> Result<(), StoreError> {
        let thread_id = artifact.thread_id.clone();
        let mut threads = self.threads.write().await;
        let thread = threads.entry(thread_id.clone()).or_default();
        upsert_by(&mut thread.artifacts, artifact, |a| &a.reference);
        self.flush_thread(&threads, &thread_id)
    }

    async fn record_usage(
        &self,
        item_id: &str,
        event: UsageEvent,
    ) -> Result<UsageStats, StoreError> {
        {
            let mut threads = self.threads.write().await;
            if let Some(thread_id) = bump_usage_count(&mut threads, item_id) {
                self.flush_thread(&threads, &thread_id)?;
            }
        }
        let mut usage = self.usage.write().await;
        let stats = usage.entry(item_id.to_string()).or_default();
        stats.record(event, self.clock.now());
        let stats = stats.clone();
        self.flush_usage(&usage)?;
        Ok(stats)
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
