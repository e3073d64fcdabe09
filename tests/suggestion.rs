//! End-to-end tests for the suggestion engine.
//!
//! These exercise the full pipeline (store, similarity search, scoring,
//! explanation, result assembly) with hand-constructed embeddings whose
//! cosine similarities are known exactly.

use chrono::{DateTime, Duration, Utc};
use quadrant::embed::{Embedder, HashEncoder};
use quadrant::embedding::{Dimension, Embedding};
use quadrant::engine::{BackfillReport, SuggestionEngine};
use quadrant::error::{QuadrantError, SuggestError};
use quadrant::store::{MemoryTaskStore, TaskStore};
use quadrant::task::{OwnerId, Quadrant, Task, TaskId, TaskStatus};

const OWNER: OwnerId = OwnerId(1);

fn test_engine(store: MemoryTaskStore) -> SuggestionEngine<MemoryTaskStore> {
    SuggestionEngine::new(
        store,
        Embedder::with_backend(Box::new(HashEncoder::new(Dimension::TEST))),
    )
}

/// Unit vector whose cosine similarity to `[1, 0, 0, 0]` is exactly `sim`.
fn vector_with_similarity(sim: f32) -> Embedding {
    Embedding::new(vec![sim, (1.0 - sim * sim).sqrt(), 0.0, 0.0])
}

fn query_task(id: u64) -> Task {
    let mut task = Task::new(TaskId(id), OWNER, "query");
    task.embedding = Some(Embedding::new(vec![1.0, 0.0, 0.0, 0.0]));
    task
}

fn historical(
    id: u64,
    sim: f32,
    important: bool,
    completed_days_ago: i64,
    now: DateTime<Utc>,
) -> Task {
    let mut task = Task::new(TaskId(id), OWNER, format!("historical {id}"));
    task.status = TaskStatus::Done;
    task.is_important = important;
    task.embedding = Some(vector_with_similarity(sim));
    task.created_at = now - Duration::days(completed_days_ago + 1);
    task.completed_at = Some(now - Duration::days(completed_days_ago));
    task
}

// ---------------------------------------------------------------------------
// Suggestion scenarios
// ---------------------------------------------------------------------------

#[test]
fn importance_is_weighted_by_similarity() {
    let now = Utc::now();
    let store = MemoryTaskStore::new();
    store.insert(query_task(100));
    store.insert(historical(1, 0.9, true, 1, now));
    store.insert(historical(2, 0.8, true, 2, now));
    store.insert(historical(3, 0.3, false, 3, now));

    let engine = test_engine(store);
    let result = engine.suggest_at(TaskId(100), OWNER, 5, now).unwrap();

    // (0.9 + 0.8) / (0.9 + 0.8 + 0.3) = 0.85
    assert_eq!(result.importance_score, 0.85);
    assert!(result.suggested_important);

    // No due date: urgency floors, never errors.
    assert_eq!(result.urgency_score, 0.1);
    assert!(!result.suggested_urgent);
    assert_eq!(result.suggested_quadrant, Quadrant::Schedule);
    assert_eq!(result.similar_tasks.len(), 3);
}

#[test]
fn overdue_task_with_no_history_falls_back_to_delegate() {
    let now = Utc::now();
    let store = MemoryTaskStore::new();
    let mut task = query_task(100);
    task.due_date = Some(now - Duration::days(2));
    store.insert(task);

    let engine = test_engine(store);
    let result = engine.suggest_at(TaskId(100), OWNER, 5, now).unwrap();

    assert_eq!(result.urgency_score, 1.0);
    assert!(result.suggested_urgent);
    assert_eq!(result.importance_score, 0.5);
    assert!(!result.suggested_important);
    assert_eq!(result.confidence, 0.3);
    assert_eq!(result.suggested_quadrant, Quadrant::Delegate);
    assert!(result.similar_tasks.is_empty());
}

#[test]
fn confidence_stays_capped_even_with_perfect_evidence() {
    let now = Utc::now();
    let store = MemoryTaskStore::new();
    store.insert(query_task(100));
    for i in 0..8 {
        store.insert(historical(i, 1.0, true, i as i64, now));
    }

    let engine = test_engine(store);
    let result = engine.suggest_at(TaskId(100), OWNER, 8, now).unwrap();
    assert!(result.confidence <= 0.95);
    assert_eq!(result.confidence, 0.95);
}

#[test]
fn suggestions_are_reproducible_for_a_fixed_clock() {
    let now = Utc::now();
    let store = MemoryTaskStore::new();
    store.insert(query_task(100));
    store.insert(historical(1, 0.7, true, 3, now));

    let engine = test_engine(store);
    let a = engine.suggest_at(TaskId(100), OWNER, 5, now).unwrap();
    let b = engine.suggest_at(TaskId(100), OWNER, 5, now).unwrap();
    assert_eq!(a.reasoning, b.reasoning);
    assert_eq!(a.confidence, b.confidence);
    assert_eq!(a.importance_score, b.importance_score);
}

#[test]
fn history_never_crosses_owners() {
    let now = Utc::now();
    let store = MemoryTaskStore::new();
    store.insert(query_task(100));

    // A perfectly matching completed task that belongs to someone else.
    let mut foreign = historical(1, 1.0, true, 1, now);
    foreign.owner = OwnerId(2);
    store.insert(foreign);

    let engine = test_engine(store);
    let result = engine.suggest_at(TaskId(100), OWNER, 5, now).unwrap();
    // Fallback path: the foreign task contributed nothing.
    assert_eq!(result.confidence, 0.3);
    assert!(result.similar_tasks.is_empty());
}

#[test]
fn suggestion_serializes_with_wire_quadrant_names() {
    let now = Utc::now();
    let store = MemoryTaskStore::new();
    let mut task = query_task(100);
    task.due_date = Some(now - Duration::days(1));
    store.insert(task);

    let engine = test_engine(store);
    let result = engine.suggest_at(TaskId(100), OWNER, 5, now).unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["suggested_quadrant"], "DELEGATE");
    assert_eq!(json["confidence"], 0.3);
    assert!(json["reasoning"].as_str().unwrap().contains("deadline"));
}

// ---------------------------------------------------------------------------
// find_similar
// ---------------------------------------------------------------------------

#[test]
fn find_similar_excludes_self_and_honors_threshold() {
    let now = Utc::now();
    let store = MemoryTaskStore::new();

    // Query task is itself completed and embedded.
    let mut query = historical(100, 1.0, false, 0, now);
    query.embedding = Some(Embedding::new(vec![1.0, 0.0, 0.0, 0.0]));
    store.insert(query);

    store.insert(historical(1, 0.9, true, 1, now));
    store.insert(historical(2, 0.2, false, 2, now));

    let engine = test_engine(store);
    let similar = engine
        .find_similar(TaskId(100), OWNER, 10, 0.5, true)
        .unwrap();

    let ids: Vec<u64> = similar.iter().map(|s| s.task.id.0).collect();
    assert_eq!(ids, vec![1]); // no self, no below-threshold entry
    assert!((similar[0].similarity - 0.9).abs() < 1e-6);
}

#[test]
fn find_similar_can_widen_past_completed_tasks() {
    let now = Utc::now();
    let store = MemoryTaskStore::new();
    store.insert(query_task(100));

    // Embedded but still pending: invisible to completed-only search.
    let mut pending = Task::new(TaskId(1), OWNER, "in flight");
    pending.status = TaskStatus::InProgress;
    pending.embedding = Some(vector_with_similarity(0.8));
    store.insert(pending);

    let engine = test_engine(store);
    let completed_only = engine
        .find_similar(TaskId(100), OWNER, 10, 0.0, true)
        .unwrap();
    assert!(completed_only.is_empty());

    let widened = engine
        .find_similar(TaskId(100), OWNER, 10, 0.0, false)
        .unwrap();
    assert_eq!(widened.len(), 1);
    assert_eq!(widened[0].task.id, TaskId(1));
}

#[test]
fn find_similar_requires_an_embedding() {
    let store = MemoryTaskStore::new();
    store.insert(Task::new(TaskId(1), OWNER, "bare"));

    let engine = test_engine(store);
    let err = engine.find_similar(TaskId(1), OWNER, 5, 0.0, true).unwrap_err();
    assert!(matches!(
        err,
        QuadrantError::Suggest(SuggestError::MissingEmbedding { task_id: 1 })
    ));
}

// ---------------------------------------------------------------------------
// Backfill
// ---------------------------------------------------------------------------

/// Store wrapper that counts embedding writes.
struct CountingStore {
    inner: MemoryTaskStore,
    writes: std::sync::atomic::AtomicUsize,
}

impl CountingStore {
    fn new(inner: MemoryTaskStore) -> Self {
        Self {
            inner,
            writes: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    fn writes(&self) -> usize {
        self.writes.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl TaskStore for CountingStore {
    fn get(&self, id: TaskId, owner: OwnerId) -> Option<Task> {
        self.inner.get(id, owner)
    }

    fn completed_with_embedding(&self, owner: OwnerId, limit: usize) -> Vec<Task> {
        self.inner.completed_with_embedding(owner, limit)
    }

    fn without_embedding(&self, owner: OwnerId) -> Vec<Task> {
        self.inner.without_embedding(owner)
    }

    fn all_tasks(&self, owner: OwnerId) -> Vec<Task> {
        self.inner.all_tasks(owner)
    }

    fn save_embedding(&self, id: TaskId, embedding: Embedding) {
        self.writes
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.inner.save_embedding(id, embedding);
    }
}

#[test]
fn backfill_embeds_pending_tasks_and_reports_counts() {
    let store = MemoryTaskStore::new();
    for i in 0..4 {
        store.insert(Task::new(TaskId(i), OWNER, format!("pending {i}")));
    }

    let engine = test_engine(store);
    let report = engine.backfill_embeddings(OWNER, false);
    assert_eq!(
        report,
        BackfillReport {
            attempted: 4,
            succeeded: 4,
            failed: 0
        }
    );
    assert!(engine.store().without_embedding(OWNER).is_empty());
}

#[test]
fn backfill_is_idempotent_without_force() {
    let store = CountingStore::new(MemoryTaskStore::new());
    for i in 0..3 {
        store.inner.insert(Task::new(TaskId(i), OWNER, format!("pending {i}")));
    }

    let engine = SuggestionEngine::new(
        store,
        Embedder::with_backend(Box::new(HashEncoder::new(Dimension::TEST))),
    );

    let first = engine.backfill_embeddings(OWNER, false);
    assert_eq!(first.succeeded, 3);
    assert_eq!(engine.store().writes(), 3);

    // Fully embedded set: the second run performs zero writes.
    let second = engine.backfill_embeddings(OWNER, false);
    assert_eq!(second, BackfillReport::default());
    assert_eq!(engine.store().writes(), 3);
}

#[test]
fn forced_backfill_rewrites_everything() {
    let store = CountingStore::new(MemoryTaskStore::new());
    for i in 0..3 {
        store.inner.insert(Task::new(TaskId(i), OWNER, format!("task {i}")));
    }

    let engine = SuggestionEngine::new(
        store,
        Embedder::with_backend(Box::new(HashEncoder::new(Dimension::TEST))),
    );

    engine.backfill_embeddings(OWNER, false);
    let report = engine.backfill_embeddings(OWNER, true);
    assert_eq!(report.attempted, 3);
    assert_eq!(report.succeeded, 3);
    assert_eq!(engine.store().writes(), 6);
}

#[test]
fn backfill_isolates_per_task_failures() {
    let store = MemoryTaskStore::new();
    store.insert(Task::new(TaskId(1), OWNER, "fine"));
    store.insert(Task::new(TaskId(2), OWNER, "   ")); // nothing to embed
    store.insert(Task::new(TaskId(3), OWNER, "also fine"));

    let engine = test_engine(store);
    let report = engine.backfill_embeddings(OWNER, false);

    assert_eq!(report.attempted, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);

    // The failure did not roll back its siblings.
    let remaining = engine.store().without_embedding(OWNER);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, TaskId(2));
}

// ---------------------------------------------------------------------------
// Dimension safety
// ---------------------------------------------------------------------------

#[test]
fn stale_vector_from_another_model_is_rejected() {
    let now = Utc::now();
    let store = MemoryTaskStore::new();
    store.insert(query_task(100)); // 4-dim

    let mut stale = historical(1, 0.9, true, 1, now);
    stale.embedding = Some(Embedding::new(vec![1.0, 0.0])); // 2-dim
    store.insert(stale);

    let engine = test_engine(store);
    let err = engine.suggest_at(TaskId(100), OWNER, 5, now).unwrap_err();
    assert!(matches!(err, QuadrantError::Embed(_)));
}

// ---------------------------------------------------------------------------
// Probe
// ---------------------------------------------------------------------------

#[test]
fn probe_reports_backend_readiness() {
    let engine = test_engine(MemoryTaskStore::new());
    let report = engine.probe().unwrap();
    assert_eq!(report.backend, "hash-v1");
    assert_eq!(report.dimension, Dimension::TEST);
}
