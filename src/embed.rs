//! Text embedding: task text → fixed-length semantic vectors.
//!
//! The encoding model is an interchangeable dependency behind the
//! [`TextEncoder`] trait. Two backends ship:
//!
//! - [`HashEncoder`]: deterministic, dependency-free vectors derived from
//!   SHA-256. No semantic signal; for tests and offline use.
//! - `MiniLmEncoder` (feature `minilm`): fastembed's AllMiniLML6V2, the
//!   384-dim reference model.
//!
//! Backends are expensive to initialize (seconds, tens of MB), so the
//! [`Embedder`] handle loads one lazily on first use and caches it for the
//! process lifetime. The handle itself is explicitly constructed and passed
//! around rather than hidden in a global, so tests substitute backends
//! freely.

use std::sync::OnceLock;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::embedding::{Dimension, Embedding};
use crate::error::EmbedError;

/// Number of texts encoded per chunk in batch operations, bounding peak
/// memory during bulk backfill.
pub const BATCH_CHUNK: usize = 32;

/// A text-encoding backend.
///
/// Implementations must be deterministic for a fixed model version, must
/// produce exactly `dimension()` components per text, and must preserve
/// input order in `encode`.
pub trait TextEncoder: Send + Sync {
    /// Backend name, for logs and health probes.
    fn name(&self) -> &str;

    /// Output dimensionality.
    fn dimension(&self) -> Dimension;

    /// Encode a batch of texts, one vector per text.
    fn encode(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbedError>;
}

// ---------------------------------------------------------------------------
// Hash backend
// ---------------------------------------------------------------------------

/// Deterministic hash-derived encoder.
///
/// Expands SHA-256 digests of the input into an L2-normalized vector.
/// Distinct texts land near-orthogonal, identical texts land identical;
/// there is no semantic neighborhood structure. Useful wherever determinism
/// matters more than meaning: tests, offline environments, CI.
#[derive(Debug, Clone)]
pub struct HashEncoder {
    dim: Dimension,
}

impl HashEncoder {
    pub fn new(dim: Dimension) -> Self {
        Self { dim }
    }

    fn encode_one(&self, text: &str) -> Embedding {
        let mut data = Vec::with_capacity(self.dim.0);
        let mut block: u32 = 0;
        while data.len() < self.dim.0 {
            let mut hasher = Sha256::new();
            hasher.update(text.as_bytes());
            hasher.update(block.to_le_bytes());
            for byte in hasher.finalize() {
                if data.len() == self.dim.0 {
                    break;
                }
                data.push((byte as f32 / 255.0) * 2.0 - 1.0);
            }
            block += 1;
        }

        let norm = data.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut data {
                *x /= norm;
            }
        }
        Embedding::new(data)
    }
}

impl Default for HashEncoder {
    fn default() -> Self {
        Self::new(Dimension::DEFAULT)
    }
}

impl TextEncoder for HashEncoder {
    fn name(&self) -> &str {
        "hash-v1"
    }

    fn dimension(&self) -> Dimension {
        self.dim
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbedError> {
        Ok(texts.iter().map(|t| self.encode_one(t)).collect())
    }
}

// ---------------------------------------------------------------------------
// MiniLM backend (feature-gated: pulls ONNX Runtime)
// ---------------------------------------------------------------------------

/// The reference semantic backend: AllMiniLML6V2 via fastembed, 384-dim.
///
/// `fastembed::TextEmbedding::embed` takes `&mut self`, so the model sits
/// behind a mutex to keep the encoder `Sync`.
#[cfg(feature = "minilm")]
pub struct MiniLmEncoder {
    model: std::sync::Mutex<fastembed::TextEmbedding>,
}

#[cfg(feature = "minilm")]
impl MiniLmEncoder {
    /// Load the model, downloading it on first use.
    pub fn load() -> Result<Self, EmbedError> {
        let model = fastembed::TextEmbedding::try_new(
            fastembed::InitOptions::new(fastembed::EmbeddingModel::AllMiniLML6V2)
                .with_show_download_progress(false),
        )
        .map_err(|e| EmbedError::ModelLoad {
            message: e.to_string(),
        })?;
        Ok(Self {
            model: std::sync::Mutex::new(model),
        })
    }
}

#[cfg(feature = "minilm")]
impl TextEncoder for MiniLmEncoder {
    fn name(&self) -> &str {
        "minilm-l6-v2"
    }

    fn dimension(&self) -> Dimension {
        Dimension::DEFAULT
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbedError> {
        let mut model = self.model.lock().map_err(|_| EmbedError::Encoding {
            message: "encoder lock poisoned".into(),
        })?;
        let vectors = model
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbedError::Encoding {
                message: e.to_string(),
            })?;
        Ok(vectors.into_iter().map(Embedding::new).collect())
    }
}

// ---------------------------------------------------------------------------
// Embedder handle
// ---------------------------------------------------------------------------

/// Readiness report from [`Embedder::probe`].
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub backend: String,
    pub dimension: Dimension,
}

/// Handle to the shared embedding backend.
///
/// The backend loads on first use and is then treated as immutable, safe for
/// concurrent read-only use across simultaneous requests. Construct one per
/// process and share it.
pub struct Embedder {
    loader: Box<dyn Fn() -> Result<Box<dyn TextEncoder>, EmbedError> + Send + Sync>,
    backend: OnceLock<Box<dyn TextEncoder>>,
}

impl Embedder {
    /// Embedder over an already-initialized backend.
    pub fn with_backend(backend: Box<dyn TextEncoder>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(backend);
        Self {
            loader: Box::new(|| {
                Err(EmbedError::ModelLoad {
                    message: "backend was provided eagerly".into(),
                })
            }),
            backend: cell,
        }
    }

    /// Embedder that loads its backend lazily on first use.
    pub fn lazy(
        loader: impl Fn() -> Result<Box<dyn TextEncoder>, EmbedError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            loader: Box::new(loader),
            backend: OnceLock::new(),
        }
    }

    /// The deterministic hash backend at the reference dimensionality.
    pub fn hash() -> Self {
        Self::with_backend(Box::new(HashEncoder::default()))
    }

    /// The MiniLM reference model, loaded lazily on first use.
    #[cfg(feature = "minilm")]
    pub fn minilm() -> Self {
        Self::lazy(|| Ok(Box::new(MiniLmEncoder::load()?) as Box<dyn TextEncoder>))
    }

    fn backend(&self) -> Result<&dyn TextEncoder, EmbedError> {
        if let Some(backend) = self.backend.get() {
            return Ok(backend.as_ref());
        }
        let loaded = (self.loader)()?;
        tracing::info!(
            backend = loaded.name(),
            dim = loaded.dimension().0,
            "embedding backend loaded"
        );
        // Another thread may have won the race; either instance is equivalent.
        Ok(self.backend.get_or_init(|| loaded).as_ref())
    }

    /// Dimensionality of the active backend, loading it if needed.
    pub fn dimension(&self) -> Result<Dimension, EmbedError> {
        Ok(self.backend()?.dimension())
    }

    /// Embed a (title, description) pair.
    ///
    /// The title is written twice into the encoded text, biasing the encoder
    /// toward the short, high-signal field; the description, when present,
    /// follows. Empty text after trimming is rejected.
    pub fn embed(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<Embedding, EmbedError> {
        let text = compose_text(title, description)?;
        let mut out = self.backend()?.encode(std::slice::from_ref(&text))?;
        out.pop().ok_or_else(|| EmbedError::Encoding {
            message: "backend returned no vector".into(),
        })
    }

    /// Embed many pairs, chunked to bound peak memory. Result order matches
    /// input order.
    pub fn embed_batch(
        &self,
        pairs: &[(String, Option<String>)],
    ) -> Result<Vec<Embedding>, EmbedError> {
        let texts = pairs
            .iter()
            .map(|(title, description)| compose_text(title, description.as_deref()))
            .collect::<Result<Vec<_>, _>>()?;

        let backend = self.backend()?;
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_CHUNK) {
            out.extend(backend.encode(chunk)?);
        }
        Ok(out)
    }

    /// Encode a fixed probe sentence and report backend readiness.
    pub fn probe(&self) -> Result<ProbeReport, EmbedError> {
        let backend = self.backend()?;
        backend.encode(&["probe sentence".to_string()])?;
        Ok(ProbeReport {
            backend: backend.name().to_string(),
            dimension: backend.dimension(),
        })
    }
}

impl std::fmt::Debug for Embedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Embedder")
            .field("loaded", &self.backend.get().is_some())
            .finish()
    }
}

/// Compose the text fed to the encoder: `title title [description]`.
fn compose_text(title: &str, description: Option<&str>) -> Result<String, EmbedError> {
    let title = title.trim();
    let text = match description.map(str::trim).filter(|d| !d.is_empty()) {
        Some(description) => format!("{title} {title} {description}"),
        None => format!("{title} {title}"),
    };
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(EmbedError::EmptyInput);
    }
    Ok(text)
}
