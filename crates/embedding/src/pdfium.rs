//! Page rasterizer backed by the pdfium library.

use std::path::PathBuf;

use image::DynamicImage;
use pdfium_render::prelude::{PdfRenderConfig, Pdfium, PdfiumError};

use crate::error::EmbeddingError;
use crate::pdf::PageRasterizer;

/// Renders PDF pages with pdfium, bound at call time.
///
/// Pdfium bindings are not thread-safe, so each call binds the library afresh.
#[derive(Debug, Clone)]
pub struct PdfiumRasterizer {
    library_path: Option<PathBuf>,
    target_width: i32,
}

impl Default for PdfiumRasterizer {
    fn default() -> Self {
        Self {
            library_path: None,
            target_width: 1536,
        }
    }
}

impl PdfiumRasterizer {
    /// Uses the system pdfium library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads pdfium from an explicit directory instead of the system library.
    #[must_use]
    pub fn with_library_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.library_path = Some(dir.into());
        self
    }

    /// Sets the width, in pixels, pages are rendered at.
    #[must_use]
    pub fn with_target_width(mut self, width: i32) -> Self {
        self.target_width = width;
        self
    }

    fn bind(&self) -> Result<Pdfium, PdfiumError> {
        let bindings = match &self.library_path {
            Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))?,
            None => Pdfium::bind_to_system_library()?,
        };
        Ok(Pdfium::new(bindings))
    }
}

fn pdf_error(e: PdfiumError) -> EmbeddingError {
    EmbeddingError::Pdf(e.to_string())
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(&self, pdf: &[u8]) -> Result<Vec<DynamicImage>, EmbeddingError> {
        let pdfium = self.bind().map_err(pdf_error)?;
        let document = pdfium.load_pdf_from_byte_slice(pdf, None).map_err(pdf_error)?;
        let config = PdfRenderConfig::new().set_target_width(self.target_width);

        let pages = document
            .pages()
            .iter()
            .map(|page| {
                page.render_with_config(&config)
                    .map(|bitmap| bitmap.as_image())
                    .map_err(pdf_error)
            })
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(pages = pages.len(), "rasterized pdf");
        Ok(pages)
    }
}
