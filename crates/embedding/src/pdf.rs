//! PDF embedding: rasterize every page, then embed pages in sequential chunks.

use std::path::PathBuf;

use image::DynamicImage;
use midras_core::{DEFAULT_PDF_BATCH_SIZE, EmbeddingResponse, Mode, PdfParams, ValidationError};

use crate::encoding::encode_png_base64_all;
use crate::engine::Embedder;
use crate::error::EmbeddingError;

/// Where PDF bytes come from.
#[derive(Debug, Clone)]
pub enum PdfSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl PdfSource {
    /// Reads the whole document into memory.
    pub fn read_bytes(&self) -> Result<Vec<u8>, EmbeddingError> {
        match self {
            Self::Path(path) => std::fs::read(path)
                .map_err(|e| EmbeddingError::Pdf(format!("cannot read {}: {e}", path.display()))),
            Self::Bytes(bytes) => Ok(bytes.clone()),
        }
    }

    /// File name sent with uploads.
    pub fn file_name(&self) -> String {
        match self {
            Self::Path(path) => path
                .file_name()
                .map_or_else(|| "document.pdf".to_owned(), |n| n.to_string_lossy().into_owned()),
            Self::Bytes(_) => "document.pdf".to_owned(),
        }
    }
}

impl From<PathBuf> for PdfSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&std::path::Path> for PdfSource {
    fn from(path: &std::path::Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for PdfSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// Options for embedding a PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfOptions {
    /// Pages embedded per call.
    pub batch_size: usize,
    /// Return the rasterized pages alongside the embeddings.
    pub include_images: bool,
    /// Mode to embed with. Unset means the caller's default.
    pub mode: Option<Mode>,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_PDF_BATCH_SIZE,
            include_images: false,
            mode: None,
        }
    }
}

impl PdfOptions {
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn include_images(mut self, include_images: bool) -> Self {
        self.include_images = include_images;
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Uses `mode` only when no mode was chosen yet.
    #[must_use]
    pub fn or_mode(mut self, mode: Mode) -> Self {
        self.mode = self.mode.or(Some(mode));
        self
    }

    /// The chosen mode, falling back to [`Mode::default`].
    pub fn effective_mode(&self) -> Mode {
        self.mode.unwrap_or_default()
    }

    /// Fails when the batch size is zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.batch_size == 0 {
            return Err(ValidationError::InvalidBatchSize);
        }
        Ok(())
    }
}

impl From<PdfParams> for PdfOptions {
    fn from(params: PdfParams) -> Self {
        Self {
            batch_size: params.batch_size,
            include_images: params.include_images,
            mode: Some(params.mode),
        }
    }
}

impl From<PdfOptions> for PdfParams {
    fn from(options: PdfOptions) -> Self {
        Self {
            batch_size: options.batch_size,
            include_images: options.include_images,
            mode: options.effective_mode(),
        }
    }
}

/// Renders every page of a PDF to an image, in page order.
pub trait PageRasterizer: Send + Sync {
    fn rasterize(&self, pdf: &[u8]) -> Result<Vec<DynamicImage>, EmbeddingError>;
}

/// Embeds a PDF page by page.
///
/// Pages are embedded in chunks of `options.batch_size`, one chunk after another.
/// Embeddings are concatenated in page order and costs are summed, so the result does
/// not depend on the batch size. A document without pages yields an empty response.
pub async fn embed_pdf_pages(
    embedder: &dyn Embedder,
    rasterizer: &dyn PageRasterizer,
    source: &PdfSource,
    options: &PdfOptions,
) -> Result<EmbeddingResponse, EmbeddingError> {
    options.validate()?;
    let bytes = source.read_bytes()?;
    let pages = rasterizer.rasterize(&bytes)?;
    tracing::debug!(
        pages = pages.len(),
        batch_size = options.batch_size,
        "embedding pdf pages"
    );

    let mut response = EmbeddingResponse::default();
    for chunk in pages.chunks(options.batch_size) {
        let mut part = embedder.embed_images(chunk, options.effective_mode()).await?;
        if part.len() != chunk.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: chunk.len(),
                got: part.len(),
            });
        }
        part.images = None;
        response.append(part);
    }

    if options.include_images {
        response.images = Some(encode_png_base64_all(&pages)?);
    }
    Ok(response)
}
