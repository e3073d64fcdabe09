//! Ad-hoc similarity index: ranked cosine search over a bounded window.
//!
//! A per-request linear scan, O(window × D). No persistent index structure
//! is kept at this scale; the [`top_k`] contract (ordering, threshold
//! filtering, tie-break) is exactly what an approximate nearest-neighbor
//! index would have to preserve to replace it without touching the scorer
//! or the orchestrator.

use crate::embedding::Embedding;
use crate::error::EmbedError;
use crate::task::Task;

/// Default cap on the candidate window: the owner's most recently completed
/// tasks, newest first. Search is bounded, not exhaustive.
pub const CANDIDATE_WINDOW: usize = 100;

/// A historical task paired with its similarity to the query.
#[derive(Debug, Clone)]
pub struct SimilarTask {
    pub task: Task,
    pub similarity: f32,
}

/// Rank `candidates` against `query` by cosine similarity.
///
/// Ordering is descending similarity, ties broken by more recent
/// `completed_at` (stable and deterministic). Entries below `min_similarity`
/// are dropped before truncation to `k`; returning fewer than `k` results,
/// including zero, is normal and not an error.
///
/// Candidates without an embedding are skipped. A candidate whose embedding
/// dimensionality disagrees with the query is an error: a stale vector from
/// a different model survived a backfill.
pub fn top_k(
    query: &Embedding,
    candidates: &[Task],
    k: usize,
    min_similarity: f32,
) -> Result<Vec<SimilarTask>, EmbedError> {
    let mut scored = Vec::with_capacity(candidates.len());
    for task in candidates {
        let Some(embedding) = &task.embedding else {
            continue;
        };
        let similarity = query.cosine_similarity(embedding)?;
        if similarity < min_similarity {
            continue;
        }
        scored.push(SimilarTask {
            task: task.clone(),
            similarity,
        });
    }

    scored.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| b.task.completed_at.cmp(&a.task.completed_at))
    });
    scored.truncate(k);
    Ok(scored)
}
