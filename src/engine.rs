//! Engine facade: end-to-end suggestion orchestration.
//!
//! [`SuggestionEngine`] wires the collaborators together: fetch the task
//! scoped to its owner, verify its embedding, rank the owner's completed
//! history, score, and assemble an explainable [`SuggestionResult`]. The
//! whole request path is read → compute → return; nothing here mutates task
//! state. The only writer is the bulk embedding backfill, which updates each
//! task in isolation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::embed::{Embedder, ProbeReport};
use crate::error::{EmbedError, QuadrantResult, SuggestError};
use crate::score;
use crate::search::{self, CANDIDATE_WINDOW, SimilarTask};
use crate::store::TaskStore;
use crate::task::{OwnerId, Quadrant, Task, TaskId};

/// How many similar tasks are included in a result for display.
const DISPLAY_LIMIT: usize = 3;

/// Configuration for the suggestion engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Candidate window size: how many of the owner's most recent
    /// completions participate in similarity search.
    pub candidate_window: usize,
    /// Default number of ranked candidates fed to the scorer.
    pub default_top_k: usize,
    /// Minimum similarity for a candidate to influence a suggestion.
    pub min_similarity: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            candidate_window: CANDIDATE_WINDOW,
            default_top_k: 5,
            min_similarity: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Display view of one similar historical task.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarTaskView {
    pub id: TaskId,
    pub title: String,
    /// Truncated to 100 characters for display.
    pub description: Option<String>,
    /// Rounded to 3 decimals.
    pub similarity: f64,
    pub was_urgent: bool,
    pub was_important: bool,
    pub quadrant: Quadrant,
    pub completion_time_days: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SimilarTaskView {
    fn from_scored(scored: &SimilarTask) -> Self {
        let task = &scored.task;
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task
                .description
                .as_ref()
                .map(|d| d.chars().take(100).collect()),
            similarity: round3(scored.similarity as f64),
            was_urgent: task.is_urgent,
            was_important: task.is_important,
            quadrant: task.quadrant(),
            completion_time_days: task.completion_days(),
            created_at: task.created_at,
            completed_at: task.completed_at,
        }
    }
}

/// The assembled suggestion returned to callers.
///
/// Scores are rounded to 2 decimals for presentation; `similar_tasks` holds
/// only the first [`DISPLAY_LIMIT`] ranked candidates and must not be
/// confused with the full candidate set used for scoring.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestionResult {
    pub task_id: TaskId,
    pub suggested_urgent: bool,
    pub suggested_important: bool,
    pub suggested_quadrant: Quadrant,
    pub urgency_score: f64,
    pub importance_score: f64,
    pub confidence: f64,
    pub reasoning: String,
    pub similar_tasks: Vec<SimilarTaskView>,
}

/// Aggregate outcome of a bulk embedding backfill.
///
/// "Attempted" is the only guarantee: per-task failures are logged and
/// counted, never propagated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The AI priority suggestion engine.
///
/// Stateless across requests except for the shared embedding backend inside
/// [`Embedder`], which initializes once and then serves concurrent readers.
pub struct SuggestionEngine<S: TaskStore> {
    config: EngineConfig,
    store: S,
    embedder: Embedder,
}

impl<S: TaskStore> SuggestionEngine<S> {
    /// Engine with default configuration.
    pub fn new(store: S, embedder: Embedder) -> Self {
        Self::with_config(store, embedder, EngineConfig::default())
    }

    pub fn with_config(store: S, embedder: Embedder, config: EngineConfig) -> Self {
        tracing::info!(
            candidate_window = config.candidate_window,
            default_top_k = config.default_top_k,
            "initializing suggestion engine"
        );
        Self {
            config,
            store,
            embedder,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Suggest a priority for a task from its owner's completed history.
    pub fn suggest(
        &self,
        task_id: TaskId,
        owner: OwnerId,
    ) -> QuadrantResult<SuggestionResult> {
        self.suggest_at(task_id, owner, self.config.default_top_k, Utc::now())
    }

    /// [`suggest`](Self::suggest) with an explicit candidate count.
    pub fn suggest_with(
        &self,
        task_id: TaskId,
        owner: OwnerId,
        top_k: usize,
    ) -> QuadrantResult<SuggestionResult> {
        self.suggest_at(task_id, owner, top_k, Utc::now())
    }

    /// Full suggestion pipeline against an explicit clock, for deterministic
    /// callers and tests.
    pub fn suggest_at(
        &self,
        task_id: TaskId,
        owner: OwnerId,
        top_k: usize,
        now: DateTime<Utc>,
    ) -> QuadrantResult<SuggestionResult> {
        let task = self.fetch(task_id, owner)?;
        let embedding = task
            .embedding
            .as_ref()
            .ok_or(SuggestError::MissingEmbedding { task_id: task_id.0 })?;

        let window = self
            .store
            .completed_with_embedding(owner, self.config.candidate_window);
        let window: Vec<Task> =
            window.into_iter().filter(|t| t.id != task_id).collect();

        let candidates =
            search::top_k(embedding, &window, top_k, self.config.min_similarity)?;

        if candidates.is_empty() {
            tracing::warn!(
                task = %task_id,
                owner = %owner,
                searched = window.len(),
                "no similar completed tasks; deadline-only fallback"
            );
            return Ok(self.fallback(&task, now));
        }

        let scores = score::score(task.due_date, &candidates, now);
        let reasoning =
            score::explanation(task.due_date, &candidates, scores.quadrant, now);

        tracing::info!(
            task = %task_id,
            owner = %owner,
            quadrant = %scores.quadrant,
            confidence = scores.confidence,
            candidates = candidates.len(),
            "priority suggestion generated"
        );

        Ok(SuggestionResult {
            task_id,
            suggested_urgent: scores.suggested_urgent,
            suggested_important: scores.suggested_important,
            suggested_quadrant: scores.quadrant,
            urgency_score: round2(scores.urgency),
            importance_score: round2(scores.importance),
            confidence: round2(scores.confidence),
            reasoning,
            similar_tasks: candidates
                .iter()
                .take(DISPLAY_LIMIT)
                .map(SimilarTaskView::from_scored)
                .collect(),
        })
    }

    /// Deadline-only suggestion when the owner has no usable history.
    ///
    /// Importance stays neutral and unsuggested; confidence is fixed low.
    fn fallback(&self, task: &Task, now: DateTime<Utc>) -> SuggestionResult {
        let urgency = score::urgency_score(task.due_date, now);
        let suggested_urgent = urgency > 0.5;
        let quadrant = Quadrant::from_flags(suggested_urgent, false);

        let mut reasoning = String::from(
            "No similar historical tasks found in your completed tasks. \
             This suggestion is based only on the deadline. ",
        );
        reasoning.push_str(if suggested_urgent {
            "Task is urgent based on deadline. "
        } else {
            "No urgency based on deadline. "
        });
        reasoning.push_str(
            "As you complete more tasks, suggestions will become more \
             personalized and accurate. Consider marking this task as \
             important based on your own judgment.",
        );

        SuggestionResult {
            task_id: task.id,
            suggested_urgent,
            suggested_important: false,
            suggested_quadrant: quadrant,
            urgency_score: round2(urgency),
            importance_score: score::NEUTRAL_IMPORTANCE,
            confidence: score::NO_HISTORY_CONFIDENCE,
            reasoning,
            similar_tasks: Vec::new(),
        }
    }

    /// Find historical tasks similar to the given one.
    ///
    /// Display operation: the query task itself is excluded. With
    /// `completed_only` unset the search widens to every embedded task the
    /// owner has, not just the completed window.
    pub fn find_similar(
        &self,
        task_id: TaskId,
        owner: OwnerId,
        limit: usize,
        min_similarity: f32,
        completed_only: bool,
    ) -> QuadrantResult<Vec<SimilarTask>> {
        let task = self.fetch(task_id, owner)?;
        let embedding = task
            .embedding
            .as_ref()
            .ok_or(SuggestError::MissingEmbedding { task_id: task_id.0 })?;

        let pool = if completed_only {
            self.store
                .completed_with_embedding(owner, self.config.candidate_window)
        } else {
            self.store.all_tasks(owner)
        };
        let pool: Vec<Task> = pool.into_iter().filter(|t| t.id != task_id).collect();

        let ranked = search::top_k(embedding, &pool, limit, min_similarity)?;
        tracing::debug!(
            task = %task_id,
            owner = %owner,
            found = ranked.len(),
            completed_only,
            "similarity search finished"
        );
        Ok(ranked)
    }

    /// Generate embeddings for the owner's tasks that lack one.
    ///
    /// Each task is processed independently: an encoding failure is logged
    /// and counted, never aborts the batch, and never rolls back sibling
    /// writes. With `force` set, every task is re-embedded, as required
    /// after an encoding model change. Synchronous; callers with interactive
    /// traffic run it off the request path.
    pub fn backfill_embeddings(&self, owner: OwnerId, force: bool) -> BackfillReport {
        let pending = if force {
            self.store.all_tasks(owner)
        } else {
            self.store.without_embedding(owner)
        };

        if pending.is_empty() {
            tracing::info!(owner = %owner, "backfill: nothing to do");
            return BackfillReport::default();
        }

        tracing::info!(
            owner = %owner,
            count = pending.len(),
            force,
            "bulk embedding backfill started"
        );

        let mut report = BackfillReport {
            attempted: pending.len(),
            ..Default::default()
        };
        for (done, task) in pending.iter().enumerate() {
            match self
                .embedder
                .embed(&task.title, task.description.as_deref())
            {
                Ok(embedding) => {
                    self.store.save_embedding(task.id, embedding);
                    report.succeeded += 1;
                }
                Err(err) => {
                    report.failed += 1;
                    tracing::error!(
                        task = %task.id,
                        owner = %owner,
                        %err,
                        "embedding generation failed; continuing"
                    );
                }
            }
            if (done + 1) % 10 == 0 {
                tracing::info!(
                    owner = %owner,
                    done = done + 1,
                    total = pending.len(),
                    "backfill progress"
                );
            }
        }

        tracing::info!(
            owner = %owner,
            succeeded = report.succeeded,
            failed = report.failed,
            "backfill finished"
        );
        report
    }

    /// Health probe: loads the embedding backend if needed and reports it.
    pub fn probe(&self) -> Result<ProbeReport, EmbedError> {
        self.embedder.probe()
    }

    fn fetch(&self, id: TaskId, owner: OwnerId) -> Result<Task, SuggestError> {
        self.store.get(id, owner).ok_or(SuggestError::TaskNotFound {
            task_id: id.0,
            owner_id: owner.0,
        })
    }
}

impl<S: TaskStore> std::fmt::Debug for SuggestionEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuggestionEngine")
            .field("config", &self.config)
            .field("embedder", &self.embedder)
            .finish()
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
