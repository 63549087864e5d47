//! Pre-built embeddings, payloads, and PDF pages.

mod embeddings;
mod pages;

pub use embeddings::{axis_colbert, one_hot, sample_payload};
pub use pages::{FakeRasterizer, solid_page};
