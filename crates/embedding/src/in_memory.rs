//! In-memory deterministic embedder for testing and development.

use image::DynamicImage;
use image::imageops::FilterType;
use midras_core::error::{require_non_empty, require_texts};
use midras_core::{ColBert, Embedding, EmbeddingResponse, Mode};

use crate::config::EmbeddingConfig;
use crate::engine::Embedder;
use crate::error::EmbeddingError;

/// Side length of the patch grid used for images.
const PATCH_GRID: u32 = 4;

/// A deterministic, hash-based embedder useful for testing.
///
/// Text yields one vector per whitespace-separated token; images yield one vector per
/// cell of a fixed patch grid. The same input always yields the same ColBERT embedding.
/// No ML model is required and every call costs zero credits. The mode is ignored.
pub struct InMemoryEmbedder {
    config: EmbeddingConfig,
}

impl InMemoryEmbedder {
    /// Creates a new `InMemoryEmbedder` with the given configuration.
    pub fn new(config: EmbeddingConfig) -> Self {
        Self { config }
    }

    /// FNV-1a hash.
    fn hash_bytes(bytes: &[u8]) -> u64 {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in bytes {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        hash
    }

    /// Generates a deterministic float vector from a seed.
    fn generate_vector(&self, seed: u64) -> Embedding {
        let dims = self.config.dimensions;
        let mut vec = Vec::with_capacity(dims);
        let mut hash = seed;

        for _ in 0..dims {
            #[allow(clippy::cast_precision_loss)] // intentional: 16-bit value fits in f32
            let val = ((hash & 0xFFFF) as f32 / 32768.0) - 1.0;
            vec.push(val);
            hash = hash
                .wrapping_mul(0x0100_0000_01b3)
                .wrapping_add(0x9e37_79b9_7f4a_7c15);
        }

        if self.config.normalize {
            let magnitude: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
            if magnitude > 0.0 {
                for x in &mut vec {
                    *x /= magnitude;
                }
            }
        }

        vec
    }

    fn embed_text(&self, text: &str) -> ColBert {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            return vec![self.generate_vector(Self::hash_bytes(text.as_bytes()))];
        }
        tokens
            .iter()
            .map(|token| self.generate_vector(Self::hash_bytes(token.as_bytes())))
            .collect()
    }

    fn embed_image(&self, image: &DynamicImage) -> ColBert {
        let grid = image
            .resize_exact(PATCH_GRID, PATCH_GRID, FilterType::Triangle)
            .to_rgb8();
        grid.enumerate_pixels()
            .map(|(x, y, pixel)| {
                let mut bytes = Vec::with_capacity(11);
                bytes.extend_from_slice(&x.to_le_bytes());
                bytes.extend_from_slice(&y.to_le_bytes());
                bytes.extend_from_slice(&pixel.0);
                self.generate_vector(Self::hash_bytes(&bytes))
            })
            .collect()
    }
}

impl Default for InMemoryEmbedder {
    fn default() -> Self {
        Self::new(EmbeddingConfig::default())
    }
}

#[async_trait::async_trait]
impl Embedder for InMemoryEmbedder {
    #[allow(clippy::unnecessary_literal_bound)] // trait signature uses &str
    fn name(&self) -> &str {
        "in-memory"
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
        Ok(EmbeddingResponse::local(
            queries.iter().map(|q| self.embed_text(q)).collect(),
        ))
    }

    async fn embed_images(
        &self,
        images: &[DynamicImage],
        _mode: Mode,
    ) -> Result<EmbeddingResponse, EmbeddingError> {
        require_non_empty(images, "images")?;
        Ok(EmbeddingResponse::local(
            images.iter().map(|i| self.embed_image(i)).collect(),
        ))
    }
}
