//! # quadrant
//!
//! An AI priority suggestion engine: converts free-text task descriptions
//! into fixed-length semantic vectors, runs nearest-neighbor similarity
//! search over a user's completed history, and fuses the result with
//! deadline signals into an explainable urgency/importance recommendation
//! on the Eisenhower matrix.
//!
//! ## Architecture
//!
//! - **Text embedder** (`embed`): interchangeable encoding backends behind
//!   [`embed::TextEncoder`], lazily loaded, shared per process
//! - **Similarity index** (`search`): bounded, recency-windowed cosine
//!   ranking with a contract an ANN index could later satisfy
//! - **Priority scorer** (`score`): deterministic urgency/importance/
//!   confidence scoring with documented tie-break and edge-case policy
//! - **Orchestrator** (`engine`): read → compute → return pipeline over an
//!   external [`store::TaskStore`] collaborator
//!
//! ## Library usage
//!
//! ```no_run
//! use quadrant::embed::Embedder;
//! use quadrant::engine::SuggestionEngine;
//! use quadrant::store::MemoryTaskStore;
//! use quadrant::task::{OwnerId, TaskId};
//!
//! let store = MemoryTaskStore::new();
//! let engine = SuggestionEngine::new(store, Embedder::hash());
//!
//! let owner = OwnerId(1);
//! engine.backfill_embeddings(owner, false);
//! let suggestion = engine.suggest(TaskId(42), owner).unwrap();
//! println!("{}: {}", suggestion.suggested_quadrant, suggestion.reasoning);
//! ```

pub mod embed;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod score;
pub mod search;
pub mod store;
pub mod task;
