//! Midras Embedding - multi-vector (ColBERT-style) embedders for texts, images, and PDFs.

pub mod config;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod in_memory;
#[cfg(feature = "local")]
pub mod local;
#[cfg(feature = "local")]
pub mod model;
pub mod pdf;
#[cfg(feature = "pdfium")]
pub mod pdfium;
pub mod processing;
pub mod remote;

pub use config::{COLPALI_DIMENSIONS, EmbeddingConfig};
pub use engine::Embedder;
pub use error::EmbeddingError;
pub use in_memory::InMemoryEmbedder;
#[cfg(feature = "local")]
pub use local::{LocalEmbedder, ModelFiles};
pub use pdf::{PageRasterizer, PdfOptions, PdfSource, embed_pdf_pages};
#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumRasterizer;
pub use remote::RemoteEmbedder;
