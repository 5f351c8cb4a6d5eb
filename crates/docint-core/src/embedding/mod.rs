//! Text vectorization and similarity ranking.

mod hash;
mod onnx;
mod ranker;

pub use hash::HashVectorizer;
pub use onnx::{load_tokenizer, OnnxVectorizer};
pub use ranker::{cosine_similarity, rank, RankedMatch};

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::info;

use crate::error::{DocintError, Result};
use crate::models::config::{VectorizerBackend, VectorizerConfig};

/// Maps texts to fixed-dimension vectors.
///
/// Output order matches input order, and a text's vector must not depend on
/// the other texts in the batch.
pub trait TextVectorizer: Send + Sync {
    /// Vectorize a batch of texts.
    fn vectorize(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Dimension of every produced vector.
    fn dimension(&self) -> usize;

    /// Short identifier for logs.
    fn name(&self) -> &str;
}

/// Initialize-once holder for a shared vectorizer.
///
/// The first successful `get_or_try_init` stores the vectorizer; later calls
/// return the same instance. A failed initialization is not cached.
#[derive(Default)]
pub struct VectorizerCell {
    slot: OnceCell<Arc<dyn TextVectorizer>>,
}

impl VectorizerCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the stored vectorizer, building it with `init` on first use.
    pub fn get_or_try_init<F>(&self, init: F) -> Result<Arc<dyn TextVectorizer>>
    where
        F: FnOnce() -> Result<Arc<dyn TextVectorizer>>,
    {
        self.slot.get_or_try_init(init).map(Arc::clone)
    }

    /// The stored vectorizer, if initialized.
    pub fn get(&self) -> Option<Arc<dyn TextVectorizer>> {
        self.slot.get().cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.slot.get().is_some()
    }
}

/// Construct the vectorizer selected by configuration.
pub fn build_vectorizer(config: &VectorizerConfig) -> Result<Arc<dyn TextVectorizer>> {
    match config.backend {
        VectorizerBackend::Hash => {
            info!("Using hashing vectorizer ({} dimensions)", config.hash_dimension);
            Ok(Arc::new(HashVectorizer::new(config.hash_dimension)))
        }
        VectorizerBackend::Onnx => build_onnx_vectorizer(config),
    }
}

#[cfg(feature = "native")]
fn build_onnx_vectorizer(config: &VectorizerConfig) -> Result<Arc<dyn TextVectorizer>> {
    use docint_inference::OrtBackend;

    let model_path = config.model_path();
    let tokenizer_path = config.tokenizer_path();

    let backend = OrtBackend::from_file(&model_path, config.num_threads).map_err(|e| {
        DocintError::ModelUnavailable(format!("{}: {}", model_path.display(), e))
    })?;
    let tokenizer = load_tokenizer(&tokenizer_path)?;
    let vectorizer = OnnxVectorizer::new(backend, tokenizer, config.max_sequence_length)?;

    info!(
        "Loaded sentence encoder from {} ({} dimensions)",
        model_path.display(),
        vectorizer.dimension()
    );
    Ok(Arc::new(vectorizer))
}

#[cfg(not(feature = "native"))]
fn build_onnx_vectorizer(_config: &VectorizerConfig) -> Result<Arc<dyn TextVectorizer>> {
    Err(DocintError::ModelUnavailable(
        "built without the native ONNX backend".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_cell_initializes_once() {
        let cell = VectorizerCell::new();
        assert!(!cell.is_initialized());

        let first = cell
            .get_or_try_init(|| Ok(Arc::new(HashVectorizer::new(8)) as Arc<dyn TextVectorizer>))
            .unwrap();
        let second = cell
            .get_or_try_init(|| panic!("initializer must not run twice"))
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(cell.is_initialized());
    }

    #[test]
    fn test_cell_does_not_cache_failure() {
        let cell = VectorizerCell::new();
        let err = cell
            .get_or_try_init(|| Err(DocintError::ModelUnavailable("missing".into())))
            .err()
            .unwrap();
        assert!(matches!(err, DocintError::ModelUnavailable(_)));
        assert!(!cell.is_initialized());

        let vectorizer = cell
            .get_or_try_init(|| Ok(Arc::new(HashVectorizer::new(4)) as Arc<dyn TextVectorizer>))
            .unwrap();
        assert_eq!(vectorizer.dimension(), 4);
    }

    #[test]
    fn test_cell_shared_across_threads() {
        let cell = Arc::new(VectorizerCell::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cell = Arc::clone(&cell);
                std::thread::spawn(move || {
                    cell.get_or_try_init(|| {
                        Ok(Arc::new(HashVectorizer::new(16)) as Arc<dyn TextVectorizer>)
                    })
                    .unwrap()
                })
            })
            .collect();

        let vectorizers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for v in &vectorizers[1..] {
            assert!(Arc::ptr_eq(&vectorizers[0], v));
        }
    }

    #[test]
    fn test_build_hash_vectorizer() {
        let config = VectorizerConfig {
            backend: VectorizerBackend::Hash,
            hash_dimension: 32,
            ..VectorizerConfig::default()
        };
        let vectorizer = build_vectorizer(&config).unwrap();
        assert_eq!(vectorizer.dimension(), 32);
        assert_eq!(vectorizer.name(), "hash");
    }

    #[test]
    fn test_missing_onnx_model_is_unavailable() {
        let config = VectorizerConfig {
            backend: VectorizerBackend::Onnx,
            model_dir: PathBuf::from("/nonexistent/docint-model"),
            ..VectorizerConfig::default()
        };
        let err = build_vectorizer(&config).err().unwrap();
        assert!(matches!(err, DocintError::ModelUnavailable(_)));
    }
}
