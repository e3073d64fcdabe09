//! Rich diagnostic error types for the quadrant engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]`
//! derives, providing error codes and help text so callers know exactly what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the quadrant engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full
/// diagnostic chain (error codes, help text) through to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum QuadrantError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Embed(#[from] EmbedError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Suggest(#[from] SuggestError),
}

// ---------------------------------------------------------------------------
// Embedding errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EmbedError {
    #[error("nothing to embed: text is empty after trimming")]
    #[diagnostic(
        code(quadrant::embed::empty_input),
        help("Provide a non-empty task title. Whitespace-only titles cannot be encoded.")
    )]
    EmptyInput,

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    #[diagnostic(
        code(quadrant::embed::dim_mismatch),
        help(
            "All vectors in a similarity computation must share the same \
             dimensionality. A stored embedding that disagrees with the current \
             model was produced by a different model version — run a full \
             backfill to regenerate it."
        )
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding backend failed to load: {message}")]
    #[diagnostic(
        code(quadrant::embed::model_load),
        help(
            "The text-encoding model could not be initialized. Check that the \
             model files are available (the `minilm` backend downloads them on \
             first use) and that there is enough memory."
        )
    )]
    ModelLoad { message: String },

    #[error("text encoding failed: {message}")]
    #[diagnostic(
        code(quadrant::embed::encoding),
        help(
            "The encoding model failed on this input. This is usually \
             transient — the caller may retry. The engine itself never retries."
        )
    )]
    Encoding { message: String },
}

// ---------------------------------------------------------------------------
// Suggestion errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SuggestError {
    #[error("task {task_id} not found for owner {owner_id}")]
    #[diagnostic(
        code(quadrant::suggest::not_found),
        help(
            "The task does not exist or belongs to a different owner. \
             Similarity search is strictly owner-scoped, so a foreign task \
             is indistinguishable from a missing one."
        )
    )]
    TaskNotFound { task_id: u64, owner_id: u64 },

    #[error("task {task_id} has no embedding yet")]
    #[diagnostic(
        code(quadrant::suggest::missing_embedding),
        help(
            "Embeddings are generated on task creation or via \
             `backfill_embeddings()`. Run the backfill for this owner first; \
             the engine never embeds silently mid-request."
        )
    )]
    MissingEmbedding { task_id: u64 },
}

/// Convenience alias for functions returning quadrant results.
pub type QuadrantResult<T> = std::result::Result<T, QuadrantError>;
