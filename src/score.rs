//! Priority scoring: urgency, importance, confidence, and explanations.
//!
//! Everything here is a deterministic pure function of its inputs plus an
//! explicit clock. Scores are ephemeral derived values, computed per request
//! and never persisted.

use chrono::{DateTime, Utc};

use crate::search::SimilarTask;
use crate::task::Quadrant;

/// Confidence is never reported above this; the engine does not claim full
/// certainty.
pub const CONFIDENCE_CAP: f64 = 0.95;

/// Confidence reported when no historical evidence exists at all.
pub const NO_HISTORY_CONFIDENCE: f64 = 0.3;

/// Importance reported when no historical evidence exists (neutral).
pub const NEUTRAL_IMPORTANCE: f64 = 0.5;

// ---------------------------------------------------------------------------
// Component scores
// ---------------------------------------------------------------------------

/// Deadline-based urgency on a fixed bucket table.
///
/// | days until due      | score |
/// |---------------------|-------|
/// | overdue             | 1.0   |
/// | 0–1                 | 1.0   |
/// | 2–3                 | 0.8   |
/// | 4–7                 | 0.6   |
/// | 8–14                | 0.4   |
/// | 15–30               | 0.2   |
/// | >30 or no due date  | 0.1   |
///
/// A task with no due date floors at 0.1 rather than erroring. That treats
/// "unscheduled" as "not urgent", which is the reference behavior.
pub fn urgency_score(due_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(due) = due_date else {
        return 0.1;
    };
    let days = (due - now).num_days();
    if days < 0 {
        1.0
    } else if days <= 1 {
        1.0
    } else if days <= 3 {
        0.8
    } else if days <= 7 {
        0.6
    } else if days <= 14 {
        0.4
    } else if days <= 30 {
        0.2
    } else {
        0.1
    }
}

/// Similarity-weighted mean of the historical importance flags.
///
/// More similar candidates carry more weight. An empty candidate set scores
/// neutral (0.5); the caller falls back to deadline-only mode.
pub fn importance_score(candidates: &[SimilarTask]) -> f64 {
    if candidates.is_empty() {
        return NEUTRAL_IMPORTANCE;
    }

    let mut weighted = 0.0;
    let mut total = 0.0;
    for candidate in candidates {
        let weight = candidate.similarity as f64;
        if candidate.task.is_important {
            weighted += weight;
        }
        total += weight;
    }

    if total == 0.0 {
        NEUTRAL_IMPORTANCE
    } else {
        weighted / total
    }
}

/// Multi-factor confidence estimate, each factor normalized to [0, 1]:
///
/// 1. Mean similarity of the candidate set (weight 0.4).
/// 2. Consistency: how strongly candidates agree on importance,
///    independent of direction (weight 0.3).
/// 3. Sample size, saturating at 5 candidates (weight 0.2).
/// 4. Recency of the single most similar candidate's completion
///    (≤30 days → 1.0, ≤90 → 0.7, else 0.5; weight 0.1).
///
/// Capped at [`CONFIDENCE_CAP`]; exactly [`NO_HISTORY_CONFIDENCE`] with zero
/// candidates.
pub fn confidence_score(candidates: &[SimilarTask], now: DateTime<Utc>) -> f64 {
    if candidates.is_empty() {
        return NO_HISTORY_CONFIDENCE;
    }

    let count = candidates.len() as f64;
    let mean_similarity =
        candidates.iter().map(|c| c.similarity as f64).sum::<f64>() / count;

    let important_ratio =
        candidates.iter().filter(|c| c.task.is_important).count() as f64 / count;
    let consistency = (important_ratio - 0.5).abs() * 2.0;

    let count_factor = (count / 5.0).min(1.0);

    // Candidates are ranked, so index 0 is the most similar.
    let recency_factor = match candidates[0].task.completed_at {
        Some(done) => {
            let days_since = (now - done).num_days();
            if days_since <= 30 {
                1.0
            } else if days_since <= 90 {
                0.7
            } else {
                0.5
            }
        }
        None => 0.5,
    };

    let confidence = mean_similarity * 0.4
        + consistency * 0.3
        + count_factor * 0.2
        + recency_factor * 0.1;
    confidence.min(CONFIDENCE_CAP)
}

// ---------------------------------------------------------------------------
// Combined scoring
// ---------------------------------------------------------------------------

/// The scorer's combined output for one task.
#[derive(Debug, Clone)]
pub struct PriorityScores {
    pub urgency: f64,
    pub importance: f64,
    pub confidence: f64,
    pub suggested_urgent: bool,
    pub suggested_important: bool,
    pub quadrant: Quadrant,
}

/// Score a task against its ranked candidate set at an explicit instant.
pub fn score(
    due_date: Option<DateTime<Utc>>,
    candidates: &[SimilarTask],
    now: DateTime<Utc>,
) -> PriorityScores {
    let urgency = urgency_score(due_date, now);
    let importance = importance_score(candidates);
    let confidence = confidence_score(candidates, now);
    let suggested_urgent = urgency > 0.5;
    let suggested_important = importance > 0.5;

    PriorityScores {
        urgency,
        importance,
        confidence,
        suggested_urgent,
        suggested_important,
        quadrant: Quadrant::from_flags(suggested_urgent, suggested_important),
    }
}

// ---------------------------------------------------------------------------
// Explanation
// ---------------------------------------------------------------------------

/// Deterministic, human-readable explanation for a suggestion.
///
/// Fixed composition order: a deadline sentence, a candidate-set summary (or
/// a no-history sentence), then the per-quadrant recommendation. Wording is
/// never randomized; reproducibility is a tested property.
pub fn explanation(
    due_date: Option<DateTime<Utc>>,
    candidates: &[SimilarTask],
    quadrant: Quadrant,
    now: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    match due_date {
        Some(due) => {
            let days = (due - now).num_days();
            if days < 0 {
                out.push_str(&format!("This task is overdue by {} day(s). ", -days));
            } else if days == 0 {
                out.push_str("This task is due today. ");
            } else if days == 1 {
                out.push_str("This task is due tomorrow. ");
            } else if days <= 30 {
                out.push_str(&format!("This task is due in {days} days. "));
            } else {
                out.push_str(&format!(
                    "This task is due in {days} days (plenty of time). "
                ));
            }
        }
        None => out.push_str("No deadline set for this task. "),
    }

    if candidates.is_empty() {
        out.push_str(
            "No similar completed tasks found in your history. \
             This suggestion is based solely on the deadline. ",
        );
    } else {
        let count = candidates.len() as f64;
        let mean_similarity =
            candidates.iter().map(|c| c.similarity as f64).sum::<f64>() / count;
        let important_pct =
            candidates.iter().filter(|c| c.task.is_important).count() as f64 / count
                * 100.0;

        out.push_str(&format!(
            "Based on {} similar task(s) (average similarity: {:.0}%), ",
            candidates.len(),
            mean_similarity * 100.0
        ));

        if important_pct >= 70.0 {
            out.push_str(&format!("{important_pct:.0}% were marked as important. "));
        } else if important_pct >= 40.0 {
            out.push_str(&format!(
                "about half ({important_pct:.0}%) were important. "
            ));
        } else {
            out.push_str(&format!(
                "only {important_pct:.0}% were marked as important. "
            ));
        }

        let completion_days: Vec<i64> = candidates
            .iter()
            .filter_map(|c| c.task.completion_days())
            .collect();
        if !completion_days.is_empty() {
            let min = completion_days.iter().copied().min().unwrap_or(0);
            let max = completion_days.iter().copied().max().unwrap_or(0);
            let mean = completion_days.iter().sum::<i64>() as f64
                / completion_days.len() as f64;

            if min == max {
                out.push_str(&format!(
                    "Similar tasks took about {mean:.0} day(s) to complete. "
                ));
            } else {
                out.push_str(&format!(
                    "Similar tasks took {min}-{max} days \
                     (average: {mean:.0} days) to complete. "
                ));
            }
        }
    }

    out.push_str("Recommendation: ");
    out.push_str(quadrant.recommendation());
    out
}
