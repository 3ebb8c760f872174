//! Caller-facing memory operations.
//!
//! `MemoryService` wires the extractor, consolidator, retriever and builder
//! to a [`MemoryStore`]. Ingest is a read-modify-write, so calls for the same
//! thread are serialized behind a per-thread lock; recall and build take no
//! lock and may observe a thread mid-ingest.

use crate::retriever::{RetrievalResult, Retriever};
use crate::working_set::{WorkingSet, WorkingSetBuilder};
use chrono::{DateTime, Utc};
use recollect_config::RecollectConfig;
use recollect_core::clock::{Clock, SystemClock};
use recollect_core::error::Result;
use recollect_core::item::{UsageEvent, UsageStats};
use recollect_core::store::MemoryStore;
use recollect_memory::{Consolidator, Extraction, Extractor};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// What one ingest call changed, by item family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub thread_id: String,
    pub semantic_added: Vec<String>,
    pub semantic_updated: Vec<String>,
    pub episodic_added: Vec<String>,
    pub episodic_updated: Vec<String>,
    pub artifacts_added: Vec<String>,
    pub artifacts_updated: Vec<String>,
    /// Secrets replaced before extraction.
    pub redactions: usize,
}

impl IngestReport {
    pub fn added(&self) -> usize {
        self.semantic_added.len() + self.episodic_added.len() + self.artifacts_added.len()
    }

    pub fn updated(&self) -> usize {
        self.semantic_updated.len() + self.episodic_updated.len() + self.artifacts_updated.len()
    }
}

/// Item counts for one stored thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadStats {
    pub thread_id: String,
    pub semantic: usize,
    pub episodic: usize,
    pub artifacts: usize,
}

pub struct MemoryService {
    store: Arc<dyn MemoryStore>,
    clock: Arc<dyn Clock>,
    extractor: Extractor,
    consolidator: Consolidator,
    retriever: Retriever,
    builder: WorkingSetBuilder,
    default_recall_budget: usize,
    thread_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MemoryService {
    pub fn new(store: Arc<dyn MemoryStore>, config: &RecollectConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn MemoryStore>,
        config: &RecollectConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            clock,
            extractor: Extractor::new(config.extraction.clone()),
            consolidator: Consolidator::new(&config.consolidation),
            retriever: Retriever::new(&config.retrieval),
            builder: WorkingSetBuilder::new(&config.working_set),
            default_recall_budget: config.retrieval.default_token_budget,
            thread_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn MemoryStore> {
        &self.store
    }

    async fn thread_lock(&self, thread_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.thread_locks.lock().await;
        locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the thread's lock entry once no other ingest holds or awaits it.
    async fn release_thread_lock(&self, thread_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.thread_locks.lock().await;
        // The map's copy plus ours; clones are only taken under the map lock.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(thread_id);
        }
        drop(lock);
    }

    /// Extract items from `content` and consolidate them into the thread.
    ///
    /// Store failures are returned unchanged; nothing is retried.
    pub async fn ingest(
        &self,
        content: &str,
        thread_id: &str,
        source: Option<&str>,
    ) -> Result<IngestReport> {
        let now = self.clock.now();
        let extraction = self.extractor.extract(content, thread_id, source, now);
        let mut report = IngestReport {
            thread_id: thread_id.to_string(),
            redactions: extraction.redactions,
            ..Default::default()
        };
        if extraction.is_empty() {
            debug!(thread_id, "Nothing to extract");
            return Ok(report);
        }

        let lock = self.thread_lock(thread_id).await;
        let outcome = {
            let _guard = lock.lock().await;
            self.consolidate_into(thread_id, extraction, now, &mut report)
                .await
        };
        self.release_thread_lock(thread_id, lock).await;
        outcome?;

        info!(
            thread_id,
            added = report.added(),
            updated = report.updated(),
            redactions = report.redactions,
            "Ingested content"
        );
        Ok(report)
    }

    /// Load, consolidate and write back. Callers hold the thread lock.
    async fn consolidate_into(
        &self,
        thread_id: &str,
        extraction: Extraction,
        now: DateTime<Utc>,
        report: &mut IngestReport,
    ) -> Result<()> {
        let existing = self.store.load_thread_items(thread_id).await?;

        let artifacts = self
            .consolidator
            .consolidate_artifacts(existing.artifacts, extraction.artifacts);
        let artifact_refs: HashSet<String> =
            artifacts.items.iter().map(|a| a.reference.clone()).collect();
        let semantic = self.consolidator.consolidate_semantic(
            existing.semantic,
            extraction.semantic,
            &artifact_refs,
            now,
        );
        let episodic = self
            .consolidator
            .consolidate_episodic(existing.episodic, extraction.episodic);

        {
            let touched = artifacts.touched();
            for a in artifacts.items.iter().filter(|a| touched.contains(a.reference.as_str())) {
                self.store.upsert_artifact(a.clone()).await?;
            }
        }
        {
            let touched = semantic.touched();
            for s in semantic.items.iter().filter(|s| touched.contains(s.id.as_str())) {
                self.store.upsert_semantic(s.clone()).await?;
            }
        }
        {
            let touched = episodic.touched();
            for e in episodic.items.iter().filter(|e| touched.contains(e.id.as_str())) {
                self.store.upsert_episodic(e.clone()).await?;
            }
        }

        report.semantic_added = semantic.added;
        report.semantic_updated = semantic.updated;
        report.episodic_added = episodic.added;
        report.episodic_updated = episodic.updated;
        report.artifacts_added = artifacts.added;
        report.artifacts_updated = artifacts.updated;
        Ok(())
    }

    /// Rank the thread for `purpose` within `token_budget` (or the configured
    /// default).
    pub async fn recall(
        &self,
        thread_id: &str,
        purpose: &str,
        token_budget: Option<usize>,
    ) -> Result<RetrievalResult> {
        let items = self.store.load_thread_items(thread_id).await?;

        let mut usage: HashMap<String, UsageStats> = HashMap::new();
        let ids = items
            .semantic
            .iter()
            .map(|s| &s.id)
            .chain(items.episodic.iter().map(|e| &e.id));
        for id in ids {
            if let Some(stats) = self.store.load_usage_stats(id).await? {
                usage.insert(id.clone(), stats);
            }
        }

        let budget = token_budget.unwrap_or(self.default_recall_budget);
        Ok(self
            .retriever
            .recall(thread_id, &items, &usage, purpose, budget, self.clock.now()))
    }

    /// Package a retrieval result. Pure; never touches the store.
    pub fn build_working_set(
        &self,
        result: &RetrievalResult,
        token_budget: Option<usize>,
    ) -> WorkingSet {
        self.builder.build(result, token_budget)
    }

    /// Recall and build in one step with the same budget.
    pub async fn prepare_context(
        &self,
        thread_id: &str,
        purpose: &str,
        token_budget: Option<usize>,
    ) -> Result<WorkingSet> {
        let result = self.recall(thread_id, purpose, token_budget).await?;
        Ok(self.build_working_set(&result, token_budget))
    }

    /// Feedback path: count a usage signal against an item.
    pub async fn record_usage(&self, item_id: &str, event: UsageEvent) -> Result<UsageStats> {
        Ok(self.store.record_usage(item_id, event).await?)
    }

    /// Per-thread item counts, sorted by thread id.
    pub async fn stats(&self) -> Result<Vec<ThreadStats>> {
        let mut out = Vec::new();
        for thread_id in self.store.thread_ids().await? {
            let items = self.store.load_thread_items(&thread_id).await?;
            out.push(ThreadStats {
                semantic: items.semantic.len(),
                episodic: items.episodic.len(),
                artifacts: items.artifacts.len(),
                thread_id,
            });
        }
        Ok(out)
    }
}
