//! Lossless base64 image encoding for transport.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat};
use midras_core::Base64Image;

use crate::error::EmbeddingError;

/// Encodes an image as base64 PNG.
pub fn encode_png_base64(image: &DynamicImage) -> Result<Base64Image, EmbeddingError> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(STANDARD.encode(buffer.into_inner()))
}

/// Encodes every image as base64 PNG, preserving order.
pub fn encode_png_base64_all(images: &[DynamicImage]) -> Result<Vec<Base64Image>, EmbeddingError> {
    images.iter().map(encode_png_base64).collect()
}

/// Decodes a base64 string into an image, guessing the bitmap format from its content.
pub fn decode_base64(encoded: &str) -> Result<DynamicImage, EmbeddingError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| EmbeddingError::Image(format!("invalid base64: {e}")))?;
    Ok(image::load_from_memory(&bytes)?)
}

/// Decodes every base64 string, preserving order.
pub fn decode_base64_all<S: AsRef<str>>(encoded: &[S]) -> Result<Vec<DynamicImage>, EmbeddingError> {
    encoded.iter().map(|e| decode_base64(e.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn red_square() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([255, 0, 0])))
    }

    #[test]
    fn png_encoding_is_lossless() {
        let original = red_square();
        let encoded = encode_png_base64(&original).unwrap();
        let decoded = decode_base64(&encoded).unwrap();
        assert_eq!(decoded.to_rgb8(), original.to_rgb8());
    }

    #[test]
    fn encode_all_preserves_order() {
        let small = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        let encoded = encode_png_base64_all(&[red_square(), small]).unwrap();
        assert_eq!(encoded.len(), 2);
        assert_eq!(decode_base64(&encoded[1]).unwrap().width(), 2);
    }

    #[test]
    fn decode_rejects_invalid_base64() {
        let err = decode_base64("not base64 at all!").unwrap_err();
        assert!(matches!(err, EmbeddingError::Image(_)));
    }

    #[test]
    fn decode_rejects_non_image_bytes() {
        let encoded = STANDARD.encode(b"plain text");
        assert!(matches!(
            decode_base64(&encoded).unwrap_err(),
            EmbeddingError::Image(_)
        ));
    }
}
