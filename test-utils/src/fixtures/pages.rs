use image::{DynamicImage, Rgb, RgbImage};
use midras_embedding::{EmbeddingError, PageRasterizer};

/// Solid 8x8 page image.
pub fn solid_page(shade: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([shade, 255 - shade, 0])))
}

/// Rasterizer returning a fixed number of distinct pages for any `%PDF` input.
pub struct FakeRasterizer {
    pages: usize,
}

impl FakeRasterizer {
    pub fn new(pages: usize) -> Self {
        Self { pages }
    }

    /// The pages this rasterizer produces, in order.
    #[allow(clippy::cast_possible_truncation)] // shade wraps at 256 pages
    pub fn pages(&self) -> Vec<DynamicImage> {
        (0..self.pages)
            .map(|i| solid_page((i * 37 % 256) as u8))
            .collect()
    }
}

impl PageRasterizer for FakeRasterizer {
    fn rasterize(&self, pdf: &[u8]) -> Result<Vec<DynamicImage>, EmbeddingError> {
        if !pdf.starts_with(b"%PDF") {
            return Err(EmbeddingError::Pdf("missing %PDF header".into()));
        }
        Ok(self.pages())
    }
}
