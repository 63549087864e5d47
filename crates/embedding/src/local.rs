//! Local embedder running ColPali in-process through candle.
//!
//! Model files come from a local directory (`MIDRAS_MODEL_DIR`) or the Hugging Face hub.
//! The embedder is constructed explicitly and owns its model; dropping it frees the weights.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::DynamicImage;
use midras_core::error::{require_non_empty, require_texts};
use midras_core::{ColBert, EmbeddingResponse, Mode};

use crate::config::EmbeddingConfig;
use crate::engine::Embedder;
use crate::error::EmbeddingError;
use crate::model::ColPaliModel;
use crate::processing::batch_ranges;

/// Environment variable pointing at a directory with ColPali weights and tokenizer.
pub const MODEL_DIR_ENV: &str = "MIDRAS_MODEL_DIR";

/// Hub repository with merged ColPali weights.
pub const DEFAULT_MODEL_REPO: &str = "vidore/colpali-v1.2-merged";

const TOKENIZER_FILE: &str = "tokenizer.json";
const SINGLE_WEIGHTS_FILE: &str = "model.safetensors";
const WEIGHTS_INDEX_FILE: &str = "model.safetensors.index.json";

/// Paths to all required model files.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    /// Safetensors shards, in load order.
    pub weights: Vec<PathBuf>,
    /// Path to the tokenizer file (tokenizer.json).
    pub tokenizer: PathBuf,
}

/// Shard file names listed in a `model.safetensors.index.json`, sorted and deduplicated.
fn shard_names(index_json: &str) -> Result<Vec<String>, EmbeddingError> {
    let index: serde_json::Value = serde_json::from_str(index_json)
        .map_err(|e| EmbeddingError::ModelLoad(format!("invalid weights index: {e}")))?;
    let map = index
        .get("weight_map")
        .and_then(serde_json::Value::as_object)
        .ok_or_else(|| EmbeddingError::ModelLoad("weights index has no weight_map".into()))?;
    let mut names: Vec<String> = map
        .values()
        .filter_map(|v| v.as_str().map(str::to_owned))
        .collect();
    names.sort();
    names.dedup();
    Ok(names)
}

fn require_file(path: PathBuf) -> Result<PathBuf, EmbeddingError> {
    if path.exists() {
        Ok(path)
    } else {
        Err(EmbeddingError::ModelLoad(format!(
            "required model file missing: {}",
            path.display()
        )))
    }
}

impl ModelFiles {
    /// Resolves model files inside `dir`, accepting a single weights file or a sharded index.
    pub fn from_dir(dir: &Path) -> Result<Self, EmbeddingError> {
        let tokenizer = require_file(dir.join(TOKENIZER_FILE))?;

        let single = dir.join(SINGLE_WEIGHTS_FILE);
        let weights = if single.exists() {
            vec![single]
        } else {
            let index_path = require_file(dir.join(WEIGHTS_INDEX_FILE))?;
            let index = std::fs::read_to_string(&index_path).map_err(|e| {
                EmbeddingError::ModelLoad(format!("cannot read {}: {e}", index_path.display()))
            })?;
            shard_names(&index)?
                .into_iter()
                .map(|name| require_file(dir.join(name)))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(Self { weights, tokenizer })
    }

    /// Resolves model files from the directory named by `MIDRAS_MODEL_DIR`.
    pub fn from_env() -> Result<Self, EmbeddingError> {
        let dir = std::env::var(MODEL_DIR_ENV).map_err(|_| {
            EmbeddingError::ModelLoad(format!("{MODEL_DIR_ENV} is not set"))
        })?;
        Self::from_dir(Path::new(&dir))
    }

    /// Downloads (or reuses cached) model files from the Hugging Face hub.
    pub fn from_hub(repo_id: &str) -> Result<Self, EmbeddingError> {
        use hf_hub::{Repo, RepoType, api::sync::Api};

        let api = Api::new().map_err(|e| {
            EmbeddingError::ModelLoad(format!("failed to initialize Hugging Face API: {e}"))
        })?;
        let repo = api.repo(Repo::new(repo_id.to_owned(), RepoType::Model));
        let fetch = |file: &str| {
            repo.get(file).map_err(|e| {
                EmbeddingError::ModelLoad(format!("{file} not found in {repo_id}: {e}"))
            })
        };

        tracing::info!(repo = repo_id, "fetching colpali model files");
        let tokenizer = fetch(TOKENIZER_FILE)?;
        let weights = match repo.get(WEIGHTS_INDEX_FILE) {
            Ok(index_path) => {
                let index = std::fs::read_to_string(&index_path).map_err(|e| {
                    EmbeddingError::ModelLoad(format!("cannot read {}: {e}", index_path.display()))
                })?;
                shard_names(&index)?
                    .iter()
                    .map(|name| fetch(name))
                    .collect::<Result<Vec<_>, _>>()?
            }
            Err(_) => vec![fetch(SINGLE_WEIGHTS_FILE)?],
        };

        Ok(Self { weights, tokenizer })
    }
}

/// Local embedder running ColPali on this machine.
///
/// Forward passes need exclusive access to the model, so calls are serialized.
/// Inputs are processed in chunks of `batch_size`, one forward pass per item.
/// Every response costs zero credits; the mode is ignored.
pub struct LocalEmbedder {
    config: EmbeddingConfig,
    model: Mutex<ColPaliModel>,
}

impl LocalEmbedder {
    /// Loads the model from `MIDRAS_MODEL_DIR`, falling back to the Hugging Face hub.
    pub fn new(config: EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let files = match ModelFiles::from_env() {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(error = %e, "local model files unavailable, using the hub");
                ModelFiles::from_hub(DEFAULT_MODEL_REPO)?
            }
        };
        Self::from_files(config, &files)
    }

    /// Creates a `LocalEmbedder` from already resolved model files.
    pub fn from_files(config: EmbeddingConfig, files: &ModelFiles) -> Result<Self, EmbeddingError> {
        let model = ColPaliModel::load(&files.weights, &files.tokenizer, &config)?;
        Ok(Self {
            config,
            model: Mutex::new(model),
        })
    }

    fn run<T>(
        &self,
        items: &[T],
        mut embed_one: impl FnMut(&mut ColPaliModel, &T) -> Result<ColBert, EmbeddingError>,
    ) -> Result<Vec<ColBert>, EmbeddingError> {
        let mut model = self
            .model
            .lock()
            .map_err(|_| EmbeddingError::Inference("model lock poisoned".into()))?;
        let mut out = Vec::with_capacity(items.len());
        for (start, end) in batch_ranges(items.len(), self.config.batch_size) {
            tracing::debug!(start, end, total = items.len(), "embedding chunk");
            for item in &items[start..end] {
                out.push(embed_one(&mut *model, item)?);
            }
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl Embedder for LocalEmbedder {
    #[allow(clippy::unnecessary_literal_bound)] // trait signature uses &str
    fn name(&self) -> &str {
        "colpali"
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    async fn embed_queries(
        &self,
        queries: &[&str],
        _mode: Mode,
    ) -> Result<EmbeddingResponse, EmbeddingError> {
        require_texts(queries, "queries")?;
        let embeddings = self.run(queries, |model, query| model.embed_query(query))?;
        Ok(EmbeddingResponse::local(embeddings))
    }

    async fn embed_images(
        &self,
        images: &[DynamicImage],
        _mode: Mode,
    ) -> Result<EmbeddingResponse, EmbeddingError> {
        require_non_empty(images, "images")?;
        let embeddings = self.run(images, ColPaliModel::embed_image)?;
        Ok(EmbeddingResponse::local(embeddings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::OnceLock;

    // All tests that require model download are #[ignore].
    // Run with: cargo test -p midras-embedding -- --ignored

    fn env_lock() -> &'static Mutex<()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    // === ModelFiles ===

    #[test]
    fn shard_names_are_sorted_and_unique() {
        let index = r#"{
            "metadata": {"total_size": 1},
            "weight_map": {
                "a.weight": "model-00002-of-00002.safetensors",
                "b.weight": "model-00001-of-00002.safetensors",
                "c.weight": "model-00001-of-00002.safetensors"
            }
        }"#;
        assert_eq!(
            shard_names(index).unwrap(),
            vec![
                "model-00001-of-00002.safetensors",
                "model-00002-of-00002.safetensors"
            ]
        );
    }

    #[test]
    fn shard_names_require_weight_map() {
        let err = shard_names("{}").unwrap_err();
        assert!(matches!(err, EmbeddingError::ModelLoad(_)));
    }

    #[test]
    fn from_dir_prefers_single_weights_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(TOKENIZER_FILE), b"{}").unwrap();
        fs::write(dir.path().join(SINGLE_WEIGHTS_FILE), b"").unwrap();

        let files = ModelFiles::from_dir(dir.path()).unwrap();
        assert_eq!(files.weights, vec![dir.path().join(SINGLE_WEIGHTS_FILE)]);
        assert!(files.tokenizer.ends_with("tokenizer.json"));
    }

    #[test]
    fn from_dir_resolves_sharded_weights() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(TOKENIZER_FILE), b"{}").unwrap();
        fs::write(
            dir.path().join(WEIGHTS_INDEX_FILE),
            br#"{"weight_map": {"x": "part-1.safetensors", "y": "part-2.safetensors"}}"#,
        )
        .unwrap();
        fs::write(dir.path().join("part-1.safetensors"), b"").unwrap();
        fs::write(dir.path().join("part-2.safetensors"), b"").unwrap();

        let files = ModelFiles::from_dir(dir.path()).unwrap();
        assert_eq!(files.weights.len(), 2);
        assert!(files.weights[1].ends_with("part-2.safetensors"));
    }

    #[test]
    fn from_dir_errors_when_shard_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(TOKENIZER_FILE), b"{}").unwrap();
        fs::write(
            dir.path().join(WEIGHTS_INDEX_FILE),
            br#"{"weight_map": {"x": "part-1.safetensors"}}"#,
        )
        .unwrap();

        match ModelFiles::from_dir(dir.path()) {
            Err(EmbeddingError::ModelLoad(message)) => {
                assert!(
                    message.contains("required model file missing"),
                    "unexpected error message: {message}"
                );
            }
            other => panic!("expected EmbeddingError::ModelLoad, got {other:?}"),
        }
    }

    #[test]
    #[allow(unsafe_code)]
    fn from_env_errors_when_required_files_are_missing() {
        let _guard = env_lock().lock().expect("env lock poisoned");
        let dir = tempfile::tempdir().unwrap();

        let previous = std::env::var(MODEL_DIR_ENV).ok();
        unsafe { std::env::set_var(MODEL_DIR_ENV, dir.path()) };

        let result = ModelFiles::from_env();

        match previous {
            Some(value) => unsafe { std::env::set_var(MODEL_DIR_ENV, value) },
            None => unsafe { std::env::remove_var(MODEL_DIR_ENV) },
        }

        assert!(matches!(result, Err(EmbeddingError::ModelLoad(_))));
    }

    // === Model ===

    fn embedder() -> LocalEmbedder {
        LocalEmbedder::new(EmbeddingConfig::default()).unwrap()
    }

    #[tokio::test]
    #[ignore = "requires model download"]
    async fn colpali_returns_name_and_dimensions() {
        let engine = embedder();
        assert_eq!(engine.name(), "colpali");
        assert_eq!(engine.dimensions(), 128);
    }

    #[tokio::test]
    #[ignore = "requires model download"]
    async fn colpali_embeds_two_queries() {
        let engine = embedder();
        let resp = engine
            .embed_queries(&["hello", "it's me"], Mode::Local)
            .await
            .unwrap();
        assert_eq!(resp.len(), 2);
        assert_eq!(resp.credits_spent, 0);
        for colbert in &resp.embeddings {
            assert!(!colbert.is_empty());
            assert!(colbert.iter().all(|v| v.len() == 128));
        }
    }

    #[tokio::test]
    #[ignore = "requires model download"]
    async fn colpali_vectors_have_unit_length() {
        let engine = embedder();
        let resp = engine
            .embed_queries(&["test normalization"], Mode::Local)
            .await
            .unwrap();
        for vec in &resp.embeddings[0] {
            let magnitude: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!(
                (magnitude - 1.0).abs() < 1e-2,
                "Expected unit length, got {magnitude}"
            );
        }
    }

    #[tokio::test]
    #[ignore = "requires model download"]
    async fn colpali_embeds_images_in_order() {
        let engine = embedder();
        let white = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            64,
            64,
            image::Rgb([255, 255, 255]),
        ));
        let black = DynamicImage::ImageRgb8(image::RgbImage::new(64, 64));
        let batch = engine
            .embed_images(&[white.clone(), black], Mode::Local)
            .await
            .unwrap();
        let single = engine.embed_images(&[white], Mode::Local).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.embeddings[0], single.embeddings[0]);
        assert_ne!(batch.embeddings[0], batch.embeddings[1]);
    }

    #[tokio::test]
    #[ignore = "requires model download"]
    async fn colpali_rejects_empty_input() {
        let engine = embedder();
        let err = engine.embed_queries(&[""], Mode::Local).await.unwrap_err();
        assert!(err.is_validation());
    }
}
