//! End-to-end tests: ingest → consolidate → recall → build.

use chrono::{TimeZone, Utc};
use recollect_config::RecollectConfig;
use recollect_context::MemoryService;
use recollect_core::clock::FixedClock;
use recollect_core::hash::content_hash;
use recollect_core::item::{EpisodicItem, EpisodicKind, SemanticKind};
use recollect_core::store::MemoryStore;
use recollect_memory::{FileStore, InMemoryStore};
use std::sync::Arc;

const JWT: &str = "We decided to use JWT tokens for authentication.";

const TRANSCRIPT: &str = "\
We decided to use Postgres as the primary datastore.
The API must respond within 200ms at p95.
Responses can't exceed 2MB per request.
TODO: implement retry with exponential backoff in src/client/retry.rs
We agreed to keep sessions stateless.
The importer shall accept CSV and JSON inputs.
Never store raw card numbers in logs.
TODO: add integration tests for the importer
We chose tokio for the async runtime.
Uploads are limited to 50 files per batch.
FAILED: test_import_large_csv expected 200 got 500
thread 'importer' panicked at src/import/csv.rs:88:13
[ERROR] importer worker crashed while parsing row 1042
diff --git a/src/import/csv.rs b/src/import/csv.rs
Next step: follow up with the data team about the schema.
We decided to version the API under /v2 for breaking changes.
";

fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap(),
    ))
}

fn service() -> MemoryService {
    let clock = fixed_clock();
    let store = Arc::new(InMemoryStore::with_clock(clock.clone()));
    MemoryService::with_clock(store, &RecollectConfig::default(), clock)
}

#[tokio::test]
async fn jwt_decision_end_to_end() {
    let svc = service();

    let first = svc.ingest(JWT, "T1", None).await.unwrap();
    assert_eq!(first.semantic_added.len(), 1);
    assert!(first.semantic_updated.is_empty());
    let id = first.semantic_added[0].clone();

    let items = svc.store().load_thread_items("T1").await.unwrap();
    assert_eq!(items.semantic.len(), 1);
    assert_eq!(items.semantic[0].kind, SemanticKind::Decision);
    assert_eq!(items.semantic[0].salience, 0.8);

    let second = svc.ingest(JWT, "T1", None).await.unwrap();
    assert!(second.semantic_added.is_empty());
    assert_eq!(second.semantic_updated, vec![id.clone()]);
    assert_eq!(svc.store().load_thread_items("T1").await.unwrap().semantic.len(), 1);

    let result = svc.recall("T1", "authentication", Some(4000)).await.unwrap();
    assert_eq!(result.focus_ids, vec![id]);
    assert!(result.token_estimate > 0);
}

#[tokio::test]
async fn recall_and_build_are_deterministic() {
    let svc = service();
    svc.ingest(TRANSCRIPT, "T1", Some("chat")).await.unwrap();

    let a = svc.recall("T1", "importer failures", Some(1500)).await.unwrap();
    let b = svc.recall("T1", "importer failures", Some(1500)).await.unwrap();
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );

    let ws_a = svc.build_working_set(&a, Some(1500));
    let ws_b = svc.build_working_set(&b, Some(1500));
    assert_eq!(
        serde_json::to_string(&ws_a).unwrap(),
        serde_json::to_string(&ws_b).unwrap()
    );
}

#[tokio::test]
async fn token_estimate_grows_with_budget() {
    let svc = service();
    svc.ingest(TRANSCRIPT, "T1", None).await.unwrap();

    let small = svc.recall("T1", "api design", Some(500)).await.unwrap();
    let large = svc.recall("T1", "api design", Some(5000)).await.unwrap();

    assert!(small.token_estimate <= large.token_estimate);
    assert!(small.focus_ids.len() <= large.focus_ids.len());
    for id in &small.focus_ids {
        assert!(large.focus_ids.contains(id));
    }
}

#[tokio::test]
async fn failure_purpose_surfaces_failures() {
    let svc = service();
    svc.ingest(TRANSCRIPT, "T1", None).await.unwrap();

    let result = svc.recall("T1", "why does the import fail", Some(4000)).await.unwrap();
    let top = &result.focus[0];
    assert!(matches!(
        top.kind,
        recollect_core::item::ItemKind::Episodic(EpisodicKind::TestFail)
    ));
}

#[tokio::test]
async fn artifacts_flow_into_the_working_set() {
    let svc = service();
    svc.ingest(TRANSCRIPT, "T1", None).await.unwrap();

    let items = svc.store().load_thread_items("T1").await.unwrap();
    let refs: Vec<&str> = items.artifacts.iter().map(|a| a.reference.as_str()).collect();
    assert!(refs.contains(&"CODE:src/client/retry.rs"));
    assert!(refs.contains(&"CODE:src/import/csv.rs#L88"));

    let result = svc.recall("T1", "retry", Some(4000)).await.unwrap();
    assert!(result.artifact_refs.contains(&"CODE:src/client/retry.rs".to_string()));

    let ws = svc.build_working_set(&result, None);
    assert!(ws.artifacts.contains(&"CODE:src/client/retry.rs".to_string()));
    assert!(ws.render().contains("CODE:src/client/retry.rs"));
}

#[tokio::test]
async fn exact_episodic_duplicates_collapse_to_max_salience() {
    let clock = fixed_clock();
    let store = Arc::new(InMemoryStore::with_clock(clock.clone()));
    let svc = MemoryService::with_clock(store.clone(), &RecollectConfig::default(), clock);

    let line = "[ERROR] database connection pool exhausted";
    // Seed a lower-salience copy with the same content hash.
    store
        .upsert_episodic(EpisodicItem {
            id: format!("E_{}", &content_hash(line)[..8]),
            thread_id: "T1".into(),
            kind: EpisodicKind::Log,
            title: "database connection pool exhausted".into(),
            snippet: line.into(),
            source: "seed".into(),
            hash: content_hash(line),
            salience: 0.1,
            neighbors: vec![],
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        })
        .await
        .unwrap();

    let first = svc.ingest(line, "T1", None).await.unwrap();
    assert!(first.episodic_added.is_empty());
    assert_eq!(first.episodic_updated.len(), 1);

    let second = svc.ingest(line, "T1", None).await.unwrap();
    assert!(second.episodic_added.is_empty());
    assert!(second.episodic_updated.is_empty());

    let items = store.load_thread_items("T1").await.unwrap();
    assert_eq!(items.episodic.len(), 1);
    assert_eq!(items.episodic[0].salience, 0.3);
    assert_eq!(items.episodic[0].source, "seed");
}

#[tokio::test]
async fn concurrent_ingest_on_one_thread_does_not_duplicate() {
    let svc = Arc::new(service());
    let mut handles = Vec::new();
    for _ in 0..8 {
        let svc = Arc::clone(&svc);
        handles.push(tokio::spawn(async move {
            svc.ingest(JWT, "T1", None).await.unwrap()
        }));
    }

    let mut added = 0;
    for handle in handles {
        added += handle.await.unwrap().semantic_added.len();
    }
    assert_eq!(added, 1);
    assert_eq!(svc.store().load_thread_items("T1").await.unwrap().semantic.len(), 1);
}

#[tokio::test]
async fn file_store_survives_restart() {
    let dir = tempfile::TempDir::new().unwrap();
    let clock = fixed_clock();
    let config = RecollectConfig::default();

    let id = {
        let store = Arc::new(FileStore::with_clock(dir.path().to_path_buf(), clock.clone()));
        let svc = MemoryService::with_clock(store, &config, clock.clone());
        svc.ingest(JWT, "T1", None).await.unwrap().semantic_added[0].clone()
    };

    let store = Arc::new(FileStore::with_clock(dir.path().to_path_buf(), clock.clone()));
    let svc = MemoryService::with_clock(store, &config, clock);
    let result = svc.recall("T1", "authentication", None).await.unwrap();
    assert_eq!(result.focus_ids, vec![id]);
}

#[tokio::test]
async fn threads_do_not_leak_into_each_other() {
    let svc = service();
    svc.ingest(JWT, "A", None).await.unwrap();
    svc.ingest("TODO: migrate billing to the new ledger service", "B", None)
        .await
        .unwrap();

    let a = svc.recall("A", "billing", None).await.unwrap();
    assert_eq!(a.focus_ids.len(), 1);
    assert!(a.focus[0].title.contains("JWT"));
}
