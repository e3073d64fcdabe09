//! Fixed-length embedding vectors and the cosine similarity primitive.
//!
//! An [`Embedding`] is a dense array of IEEE-754 `f32` components whose
//! dimensionality is fixed for the lifetime of a deployed encoding model.
//! Changing the model invalidates every stored vector and requires a full
//! backfill. Mixed-dimension comparisons are rejected, never truncated or
//! padded.

use serde::{Deserialize, Serialize};

use crate::error::EmbedError;

/// Embedding dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension(pub usize);

impl Dimension {
    /// Dimensionality of the reference MiniLM model (AllMiniLML6V2).
    pub const DEFAULT: Self = Self(384);

    /// Small dimension for fast, hand-constructed test vectors.
    pub const TEST: Self = Self(8);
}

impl Default for Dimension {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A dense semantic vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    data: Vec<f32>,
}

impl Embedding {
    /// Wrap raw components. The caller is responsible for producing vectors
    /// of the model's dimensionality; comparisons check it on every use.
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Dimensionality of this vector.
    pub fn dim(&self) -> Dimension {
        Dimension(self.data.len())
    }

    /// Raw components.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Euclidean (L2) norm.
    pub fn norm(&self) -> f32 {
        self.data.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Cosine similarity: the dot product of the L2-normalized vectors.
    ///
    /// Symmetric, and the result lies in [-1, 1]. Vectors of disagreeing
    /// dimensionality are an error, never silently truncated.
    pub fn cosine_similarity(&self, other: &Embedding) -> Result<f32, EmbedError> {
        if self.data.len() != other.data.len() {
            return Err(EmbedError::DimensionMismatch {
                expected: self.data.len(),
                actual: other.data.len(),
            });
        }

        let dot: f32 = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a * b)
            .sum();
        let denom = self.norm() * other.norm();
        if denom == 0.0 {
            // A zero vector carries no direction; report no similarity.
            return Ok(0.0);
        }
        Ok((dot / denom).clamp(-1.0, 1.0))
    }
}
