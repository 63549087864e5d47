//! Vector index trait definition.

use midras_core::{ColBert, IndexPoint, QueryResult};
use serde::{Deserialize, Serialize};

use crate::error::IndexError;

/// State of a write once the backend replied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStatus {
    /// Accepted but not yet applied.
    Acknowledged,
    /// Applied and visible to searches.
    Completed,
}

/// Acknowledgement returned by point writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAck {
    pub operation_id: Option<u64>,
    pub status: UpdateStatus,
}

impl UpdateAck {
    pub fn completed(operation_id: u64) -> Self {
        Self {
            operation_id: Some(operation_id),
            status: UpdateStatus::Completed,
        }
    }
}

/// A named collection store of multi-vector points searched by max-similarity.
///
/// An index must be created before points are added to or searched in it. Adding a
/// point whose id already exists overwrites it.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Returns the backend name (e.g., "qdrant", "in-memory").
    fn name(&self) -> &str;

    /// Creates a collection. Creating an existing collection is an error.
    async fn create_index(&self, name: &str) -> Result<bool, IndexError>;

    /// Deletes a collection and all of its points.
    async fn delete_index(&self, name: &str) -> Result<bool, IndexError>;

    /// Returns whether the collection exists.
    async fn index_exists(&self, name: &str) -> Result<bool, IndexError>;

    /// Upserts a single point.
    async fn add_point(&self, index: &str, point: IndexPoint) -> Result<UpdateAck, IndexError> {
        self.add_points(index, vec![point]).await
    }

    /// Upserts a batch of points in one call.
    async fn add_points(
        &self,
        index: &str,
        points: Vec<IndexPoint>,
    ) -> Result<UpdateAck, IndexError>;

    /// Returns at most `k` points ordered by descending max-similarity score.
    async fn search(
        &self,
        index: &str,
        query: &ColBert,
        k: usize,
    ) -> Result<Vec<QueryResult>, IndexError>;
}
