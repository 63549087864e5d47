//! Midras Core - data model, wire types, and shared validation for the Midras client.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ApiKeyPlacement, ClientConfig};
pub use error::ValidationError;
pub use types::{
    payload, Base64Image, ColBert, Embedding, EmbeddingResponse, ImagesRequest, IndexPoint, Mode,
    Payload, PdfParams, PointId, QueriesRequest, QueryResult, DEFAULT_PDF_BATCH_SIZE,
};
