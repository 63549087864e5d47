//! Midras Vector Index - multi-vector collections searched by max-similarity.

pub mod config;
pub mod error;
pub mod in_memory;
pub mod index;
#[cfg(feature = "qdrant")]
pub mod qdrant;
pub mod scoring;

pub use config::{IndexParams, QdrantConfig};
pub use error::IndexError;
pub use in_memory::InMemoryIndex;
pub use index::{UpdateAck, UpdateStatus, VectorIndex};
#[cfg(feature = "qdrant")]
pub use qdrant::QdrantIndex;
