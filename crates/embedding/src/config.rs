//! Configuration for embedders.

/// Width of every token/patch vector produced by ColPali.
pub const COLPALI_DIMENSIONS: usize = 128;

/// Configuration for an embedder.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Output vector dimensions (per token/patch).
    pub dimensions: usize,
    /// Maximum number of inputs processed per model pass group.
    pub batch_size: usize,
    /// Maximum query length in tokens, excluding prompt tokens.
    pub max_query_length: usize,
    /// Side length, in pixels, of the square model input image.
    pub image_size: u32,
    /// Number of image placeholder tokens the vision tower expands into.
    pub image_seq_len: usize,
    /// Whether to L2-normalize output vectors to unit length.
    pub normalize: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimensions: COLPALI_DIMENSIONS,
            batch_size: 4,
            max_query_length: 50,
            image_size: 448,
            image_seq_len: 1024,
            normalize: true,
        }
    }
}

/// Builder for `EmbeddingConfig`.
#[derive(Debug)]
#[must_use]
pub struct EmbeddingConfigBuilder {
    config: EmbeddingConfig,
}

impl EmbeddingConfig {
    /// Creates a builder with default values.
    pub fn builder() -> EmbeddingConfigBuilder {
        EmbeddingConfigBuilder {
            config: Self::default(),
        }
    }
}

impl EmbeddingConfigBuilder {
    pub fn dimensions(mut self, dimensions: usize) -> Self {
        self.config.dimensions = dimensions;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn max_query_length(mut self, max_query_length: usize) -> Self {
        self.config.max_query_length = max_query_length;
        self
    }

    pub fn image_size(mut self, image_size: u32) -> Self {
        self.config.image_size = image_size;
        self
    }

    pub fn image_seq_len(mut self, image_seq_len: usize) -> Self {
        self.config.image_seq_len = image_seq_len;
        self
    }

    pub fn normalize(mut self, normalize: bool) -> Self {
        self.config.normalize = normalize;
        self
    }

    pub fn build(self) -> EmbeddingConfig {
        self.config
    }
}
