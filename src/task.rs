//! Shared task domain types.
//!
//! The engine reads tasks, it never owns them: persistence, auth, and HTTP
//! semantics live with the storage collaborator. [`Task`] therefore carries
//! only the fields the suggestion pipeline consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::embedding::Embedding;

/// Unique task identifier, immutable for the task's lifetime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TaskId(pub u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies the owning user.
///
/// Every engine operation is scoped to one owner; historical evidence never
/// crosses owners under any circumstance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct OwnerId(pub u64);

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task lifecycle status.
///
/// Only `Done` tasks participate as historical evidence for suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

// ---------------------------------------------------------------------------
// Quadrant
// ---------------------------------------------------------------------------

/// Eisenhower quadrant: a pure function of the (urgent, important) pair.
///
/// Never stored on a task — always derived, so it cannot diverge from the
/// underlying flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Quadrant {
    /// Urgent and important.
    DoFirst,
    /// Important but not urgent.
    Schedule,
    /// Urgent but not important.
    Delegate,
    /// Neither urgent nor important.
    Eliminate,
}

impl Quadrant {
    /// Derive the quadrant from the standard truth table.
    pub fn from_flags(urgent: bool, important: bool) -> Self {
        match (urgent, important) {
            (true, true) => Self::DoFirst,
            (false, true) => Self::Schedule,
            (true, false) => Self::Delegate,
            (false, false) => Self::Eliminate,
        }
    }

    /// Canonical wire name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::DoFirst => "DO_FIRST",
            Self::Schedule => "SCHEDULE",
            Self::Delegate => "DELEGATE",
            Self::Eliminate => "ELIMINATE",
        }
    }

    /// Fixed recommendation sentence used in explanations.
    ///
    /// Wording is deliberately static: explanation reproducibility is a
    /// tested property.
    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::DoFirst => {
                "Do this first - it's both urgent and important. \
                 Prioritize this task immediately."
            }
            Self::Schedule => {
                "Schedule dedicated time for this - it's important but not \
                 urgent. Plan when you'll work on it."
            }
            Self::Delegate => {
                "Consider delegating if possible - it's urgent but may not be \
                 critical to your core goals."
            }
            Self::Eliminate => {
                "Question if this is necessary - it's neither urgent nor \
                 important. Consider removing or deferring indefinitely."
            }
        }
    }
}

impl std::fmt::Display for Quadrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A task, restricted to the fields the suggestion engine reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub owner: OwnerId,
    /// Primary signal for embedding. Required.
    pub title: String,
    /// Additional context for embedding. Optional.
    pub description: Option<String>,
    /// Present once generated, either whole or not at all.
    pub embedding: Option<Embedding>,
    pub is_urgent: bool,
    pub is_important: bool,
    /// Drives urgency scoring. A task without one is treated as low urgency.
    pub due_date: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    /// Set only when `status` transitions to `Done`.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// New pending task with neutral flags and no deadline.
    pub fn new(id: TaskId, owner: OwnerId, title: impl Into<String>) -> Self {
        Self {
            id,
            owner,
            title: title.into(),
            description: None,
            embedding: None,
            is_urgent: false,
            is_important: false,
            due_date: None,
            status: TaskStatus::Todo,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// The quadrant implied by this task's current flags.
    pub fn quadrant(&self) -> Quadrant {
        Quadrant::from_flags(self.is_urgent, self.is_important)
    }

    /// Whether this task may serve as historical evidence: completed, with
    /// an embedding and a completion timestamp.
    pub fn is_candidate(&self) -> bool {
        self.status == TaskStatus::Done
            && self.embedding.is_some()
            && self.completed_at.is_some()
    }

    /// Whole days from creation to completion, if completed.
    pub fn completion_days(&self) -> Option<i64> {
        self.completed_at
            .map(|done| (done - self.created_at).num_days())
    }
}
