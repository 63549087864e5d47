//! ColPali model internals.
//!
//! PaliGemma-3B backbone (SigLIP vision tower + Gemma language model) followed by a
//! linear projection to 128 dimensions. Every token or image patch becomes one
//! vector, L2-normalized unless [`EmbeddingConfig::normalize`] is off.

use std::path::Path;

use candle_core::{D, DType, Device, Module, Result as CandleResult, Tensor};
use candle_nn::{Linear, VarBuilder};
use candle_transformers::models::paligemma;
use image::DynamicImage;
use midras_core::ColBert;

use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;
use crate::processing::{
    format_image_prompt, format_query, image_to_chw, query_suffix, truncate_query_ids,
};

// ---------------------------------------------------------------------------
// Utility functions (testable without model)
// ---------------------------------------------------------------------------

/// L2-normalizes a tensor along the last dimension.
///
/// Each vector is scaled to unit length: `x / ||x||_2`.
pub fn l2_normalize(tensor: &Tensor) -> CandleResult<Tensor> {
    let norm_sq = tensor.sqr()?.sum_keepdim(D::Minus1)?;
    let norm = norm_sq.sqrt()?.clamp(1e-12, f64::MAX)?;
    tensor.broadcast_div(&norm)
}

/// Converts a `[1, seq_len, dim]` output into one `Vec<f32>` per position.
pub fn to_colbert(tensor: &Tensor) -> CandleResult<ColBert> {
    tensor.squeeze(0)?.to_dtype(DType::F32)?.to_vec2::<f32>()
}

/// Turns projected `[1, seq_len, dim]` states into a ColBERT embedding.
pub fn finish(projected: &Tensor, normalize: bool) -> CandleResult<ColBert> {
    if normalize {
        to_colbert(&l2_normalize(projected)?)
    } else {
        to_colbert(projected)
    }
}

/// Picks the first CUDA device when present, otherwise the CPU.
///
/// CUDA runs in bf16, CPU in f32.
pub fn select_device() -> (Device, DType) {
    match Device::cuda_if_available(0) {
        Ok(device) if device.is_cuda() => (device, DType::BF16),
        _ => (Device::Cpu, DType::F32),
    }
}

fn inference(context: &str) -> impl Fn(candle_core::Error) -> EmbeddingError + '_ {
    move |e| EmbeddingError::Inference(format!("{context}: {e}"))
}

// ---------------------------------------------------------------------------
// Full ColPali model
// ---------------------------------------------------------------------------

/// ColPali loaded from merged safetensors weights.
pub struct ColPaliModel {
    backbone: paligemma::Model,
    projection: Linear,
    tokenizer: tokenizers::Tokenizer,
    device: Device,
    dtype: DType,
    image_size: u32,
    image_seq_len: usize,
    max_query_length: usize,
    suffix_len: usize,
    normalize: bool,
}

impl ColPaliModel {
    /// Loads the model from safetensors shards and a tokenizer file.
    pub fn load(
        weights: &[impl AsRef<Path>],
        tokenizer_path: &Path,
        config: &EmbeddingConfig,
    ) -> Result<Self, EmbeddingError> {
        let (device, dtype) = select_device();

        let tokenizer = tokenizers::Tokenizer::from_file(tokenizer_path)
            .map_err(|e| EmbeddingError::ModelLoad(format!("tokenizer load failed: {e}")))?;
        let suffix_len = tokenizer
            .encode(query_suffix(), false)
            .map_err(|e| EmbeddingError::Tokenization(e.to_string()))?
            .len();

        let paths: Vec<&Path> = weights.iter().map(AsRef::as_ref).collect();
        // SAFETY: the weight files are not modified while mapped.
        #[allow(unsafe_code)]
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&paths, dtype, &device) }
            .map_err(|e| EmbeddingError::ModelLoad(format!("failed to map weights: {e}")))?;

        let model_config = paligemma::Config::paligemma_3b_448();
        let backbone = paligemma::Model::new(&model_config, vb.pp("model"))
            .map_err(|e| EmbeddingError::ModelLoad(format!("paligemma: {e}")))?;
        let projection = candle_nn::linear(
            model_config.text_config.hidden_size,
            config.dimensions,
            vb.pp("custom_text_proj"),
        )
        .map_err(|e| EmbeddingError::ModelLoad(format!("custom_text_proj: {e}")))?;

        tracing::info!(device = ?device, dtype = ?dtype, "colpali model loaded");

        Ok(Self {
            backbone,
            projection,
            tokenizer,
            device,
            dtype,
            image_size: config.image_size,
            image_seq_len: config.image_seq_len,
            max_query_length: config.max_query_length,
            suffix_len,
            normalize: config.normalize,
        })
    }

    fn encode(&self, text: &str) -> Result<Vec<u32>, EmbeddingError> {
        Ok(self
            .tokenizer
            .encode(text, false)
            .map_err(|e| EmbeddingError::Tokenization(e.to_string()))?
            .get_ids()
            .to_vec())
    }

    fn input_ids(&self, ids: &[u32]) -> Result<Tensor, EmbeddingError> {
        Tensor::new(ids, &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(inference("input tensor"))
    }

    fn project(&self, hidden: &Tensor) -> Result<ColBert, EmbeddingError> {
        let projected = self
            .projection
            .forward(hidden)
            .map_err(inference("custom_text_proj"))?;
        finish(&projected, self.normalize).map_err(inference("finish projection"))
    }

    /// Embeds one query, one vector per token.
    pub fn embed_query(&mut self, query: &str) -> Result<ColBert, EmbeddingError> {
        let ids = self.encode(&format_query(query))?;
        let ids = truncate_query_ids(ids, self.suffix_len, self.max_query_length);
        let input_ids = self.input_ids(&ids)?;

        self.backbone.clear_kv_cache();
        let hidden = self
            .backbone
            .forward_without_projection(&input_ids)
            .map_err(inference("text forward"))?;
        self.project(&hidden)
    }

    /// Embeds one image, one vector per patch and prompt token.
    pub fn embed_image(&mut self, image: &DynamicImage) -> Result<ColBert, EmbeddingError> {
        let size = self.image_size as usize;
        let pixels = image_to_chw(image, self.image_size);
        let pixels = Tensor::from_vec(pixels, (1, 3, size, size), &self.device)
            .and_then(|t| t.to_dtype(self.dtype))
            .map_err(inference("pixel tensor"))?;
        let ids = self.encode(&format_image_prompt(self.image_seq_len))?;
        let input_ids = self.input_ids(&ids)?;

        self.backbone.clear_kv_cache();
        let hidden = self
            .backbone
            .setup_without_projection(&pixels, &input_ids)
            .map_err(inference("image forward"))?;
        self.project(&hidden)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
