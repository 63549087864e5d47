//! Data model shared by embedders, indexes, and the wire protocol.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single fixed-width vector.
pub type Embedding = Vec<f32>;

/// A multi-vector embedding: one [`Embedding`] per token or image patch, in position order.
pub type ColBert = Vec<Embedding>;

/// Base64 of an encoded bitmap (PNG when produced by this library).
pub type Base64Image = String;

/// Arbitrary JSON object stored next to a point.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Quality/latency tier of the embedding backend.
///
/// The tier is opaque to the client: it is forwarded as-is and interpreted by
/// the backend. `Local` only applies to in-process embedders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Standard,
    Turbo,
    Local,
}

impl Mode {
    /// Returns the wire name of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Turbo => "turbo",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of any embedding call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// One multi-vector embedding per input item, in input order.
    pub embeddings: Vec<ColBert>,
    /// Cost counter reported by the hosted service. Always 0 for local inference.
    #[serde(default)]
    pub credits_spent: u64,
    /// Echoed input images, when pass-through was requested.
    #[serde(default)]
    pub images: Option<Vec<Base64Image>>,
}

impl EmbeddingResponse {
    /// Builds a zero-cost response, as produced by in-process embedders.
    pub fn local(embeddings: Vec<ColBert>) -> Self {
        Self {
            embeddings,
            credits_spent: 0,
            images: None,
        }
    }

    /// Number of embeddings in the response.
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    /// Appends another response: embeddings are concatenated in order, costs are summed,
    /// and echoed images are concatenated when both sides carry them.
    pub fn append(&mut self, other: Self) {
        self.embeddings.extend(other.embeddings);
        self.credits_spent = self.credits_spent.saturating_add(other.credits_spent);
        if let Some(images) = other.images {
            self.images.get_or_insert_with(Vec::new).extend(images);
        }
    }

    /// Consumes the response and returns its first embedding.
    pub fn into_first(self) -> Option<ColBert> {
        self.embeddings.into_iter().next()
    }
}

/// Caller-chosen identifier of an index point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Text(String),
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for PointId {
    fn from(value: u64) -> Self {
        Self::Num(value)
    }
}

impl From<u32> for PointId {
    fn from(value: u32) -> Self {
        Self::Num(u64::from(value))
    }
}

impl From<usize> for PointId {
    fn from(value: usize) -> Self {
        Self::Num(value as u64)
    }
}

impl From<&str> for PointId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for PointId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One stored unit of a vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexPoint {
    pub id: PointId,
    pub embedding: ColBert,
    pub payload: Payload,
}

impl IndexPoint {
    pub fn new(id: impl Into<PointId>, embedding: ColBert, payload: Payload) -> Self {
        Self {
            id: id.into(),
            embedding,
            payload,
        }
    }
}

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub id: PointId,
    /// Similarity score; higher is more similar.
    pub score: f32,
    pub data: Option<Payload>,
}

/// Body of `POST /embed/queries`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueriesRequest {
    pub queries: Vec<String>,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Body of `POST /embed/images`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagesRequest {
    pub images: Vec<Base64Image>,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Query parameters of `POST /embed/pdf`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfParams {
    #[serde(default = "default_pdf_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub include_images: bool,
    #[serde(default)]
    pub mode: Mode,
}

/// Default number of PDF pages embedded per call.
pub const DEFAULT_PDF_BATCH_SIZE: usize = 10;

fn default_pdf_batch_size() -> usize {
    DEFAULT_PDF_BATCH_SIZE
}

impl Default for PdfParams {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_PDF_BATCH_SIZE,
            include_images: false,
            mode: Mode::default(),
        }
    }
}

/// Helper for building payloads from `json!` literals.
///
/// Non-object values produce an empty payload.
pub fn payload(value: serde_json::Value) -> Payload {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Payload::new(),
    }
}
