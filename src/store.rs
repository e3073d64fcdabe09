//! The Task Store collaborator: read access to an owner's tasks plus
//! embedding writes.
//!
//! The engine never manages persistence itself; callers adapt whatever
//! storage they have behind [`TaskStore`]. [`MemoryTaskStore`] is a
//! concurrent in-memory implementation for tests and embedded use.

use dashmap::DashMap;

use crate::embedding::Embedding;
use crate::task::{OwnerId, Task, TaskId};

/// Storage surface the engine needs from its collaborator.
///
/// Owner scoping is absolute: no method may ever return another owner's
/// tasks, under any circumstance.
pub trait TaskStore: Send + Sync {
    /// Fetch a task scoped to its owner. `None` when the task is missing or
    /// belongs to a different owner; the two are indistinguishable.
    fn get(&self, id: TaskId, owner: OwnerId) -> Option<Task>;

    /// The owner's completed tasks that carry an embedding and a completion
    /// timestamp, most recently completed first, capped at `limit`.
    ///
    /// This is the candidate window for similarity search: bounded and
    /// recency-biased, not exhaustive.
    fn completed_with_embedding(&self, owner: OwnerId, limit: usize) -> Vec<Task>;

    /// The owner's tasks still lacking an embedding.
    fn without_embedding(&self, owner: OwnerId) -> Vec<Task>;

    /// Every task the owner has. Used by forced backfills and by searches
    /// that include uncompleted tasks.
    fn all_tasks(&self, owner: OwnerId) -> Vec<Task>;

    /// Persist a freshly generated embedding for one task.
    ///
    /// Each call must be an independent write so that one failure in a bulk
    /// backfill cannot roll back its siblings.
    fn save_embedding(&self, id: TaskId, embedding: Embedding);
}

/// Concurrent in-memory store backed by a sharded hashmap.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: DashMap<TaskId, Task>,
}

impl MemoryTaskStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            tasks: DashMap::new(),
        }
    }

    /// Insert or replace a task.
    pub fn insert(&self, task: Task) {
        self.tasks.insert(task.id, task);
    }

    /// Number of tasks stored, across all owners.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn owned_by(&self, owner: OwnerId) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|entry| entry.value().owner == owner)
            .map(|entry| entry.value().clone())
            .collect()
    }
}

impl TaskStore for MemoryTaskStore {
    fn get(&self, id: TaskId, owner: OwnerId) -> Option<Task> {
        self.tasks
            .get(&id)
            .filter(|entry| entry.value().owner == owner)
            .map(|entry| entry.value().clone())
    }

    fn completed_with_embedding(&self, owner: OwnerId, limit: usize) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .owned_by(owner)
            .into_iter()
            .filter(Task::is_candidate)
            .collect();
        tasks.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        tasks.truncate(limit);
        tasks
    }

    fn without_embedding(&self, owner: OwnerId) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .owned_by(owner)
            .into_iter()
            .filter(|t| t.embedding.is_none())
            .collect();
        tasks.sort_by_key(|t| t.id);
        tasks
    }

    fn all_tasks(&self, owner: OwnerId) -> Vec<Task> {
        let mut tasks = self.owned_by(owner);
        tasks.sort_by_key(|t| t.id);
        tasks
    }

    fn save_embedding(&self, id: TaskId, embedding: Embedding) {
        if let Some(mut entry) = self.tasks.get_mut(&id) {
            entry.value_mut().embedding = Some(embedding);
        }
    }
}
