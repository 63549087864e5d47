//! Midras - multi-vector document retrieval client.
//!
//! [`Midras`] pairs an [`Embedder`] with a [`VectorIndex`]: embed queries, images, and PDF
//! pages into ColBERT-style multi-vector embeddings, store them as index points, and
//! search them by max-similarity. [`blocking::Midras`] offers the same operations
//! without an async runtime.

pub mod blocking;
pub mod client;
pub mod error;

pub use client::{DEFAULT_QUERY_LIMIT, Midras};
pub use error::MidrasError;

pub use midras_core::{
    ApiKeyPlacement, Base64Image, ClientConfig, ColBert, Embedding, EmbeddingResponse, IndexPoint,
    Mode, Payload, PointId, QueryResult, ValidationError, payload,
};
pub use midras_embedding::{
    Embedder, EmbeddingConfig, EmbeddingError, InMemoryEmbedder, PageRasterizer, PdfOptions,
    PdfSource, RemoteEmbedder,
};
#[cfg(feature = "local")]
pub use midras_embedding::LocalEmbedder;
#[cfg(feature = "pdfium")]
pub use midras_embedding::PdfiumRasterizer;
#[cfg(feature = "qdrant")]
pub use midras_vector_index::QdrantIndex;
pub use midras_vector_index::{
    IndexError, IndexParams, InMemoryIndex, QdrantConfig, UpdateAck, UpdateStatus, VectorIndex,
};
