//! Embedder trait definition.

use image::DynamicImage;
use midras_core::{Base64Image, EmbeddingResponse, Mode};

use crate::encoding::decode_base64_all;
use crate::error::EmbeddingError;
use crate::pdf::{PdfOptions, PdfSource};

/// A backend that turns texts and images into multi-vector embeddings.
///
/// Every method returns exactly one ColBERT embedding per input, in input order.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the embedder name (e.g., "remote", "colpali").
    fn name(&self) -> &str;

    /// Returns the width of each token/patch vector.
    fn dimensions(&self) -> usize;

    /// Embeds a batch of text queries.
    async fn embed_queries(
        &self,
        queries: &[&str],
        mode: Mode,
    ) -> Result<EmbeddingResponse, EmbeddingError>;

    /// Embeds a batch of images.
    async fn embed_images(
        &self,
        images: &[DynamicImage],
        mode: Mode,
    ) -> Result<EmbeddingResponse, EmbeddingError>;

    /// Embeds a batch of base64-encoded images.
    ///
    /// The default implementation decodes locally and calls [`Embedder::embed_images`].
    async fn embed_base64_images(
        &self,
        images: &[Base64Image],
        mode: Mode,
    ) -> Result<EmbeddingResponse, EmbeddingError> {
        midras_core::error::require_non_empty(images, "images")?;
        let decoded = decode_base64_all(images)?;
        self.embed_images(&decoded, mode).await
    }

    /// Embeds a whole PDF on the backend, one embedding per page.
    ///
    /// Only backends that rasterize on their side support this; callers holding a
    /// [`crate::pdf::PageRasterizer`] use [`crate::pdf::embed_pdf_pages`] instead.
    async fn embed_pdf(
        &self,
        _source: &PdfSource,
        _options: &PdfOptions,
    ) -> Result<EmbeddingResponse, EmbeddingError> {
        Err(EmbeddingError::Unsupported(format!(
            "embedder '{}' cannot embed PDFs without a page rasterizer",
            self.name()
        )))
    }
}
