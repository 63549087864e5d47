//! In-process vector index with exact max-similarity search.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use midras_core::error::{require_limit, require_non_empty};
use midras_core::{ColBert, IndexPoint, PointId, QueryResult};
use tokio::sync::RwLock;

use crate::config::IndexParams;
use crate::error::IndexError;
use crate::index::{UpdateAck, VectorIndex};
use crate::scoring::max_sim;

struct Collection {
    points: BTreeMap<PointId, IndexPoint>,
}

/// Vector index kept entirely in memory.
///
/// Scores are computed exactly over every stored point. Nothing is persisted; the data
/// lives as long as the index value.
pub struct InMemoryIndex {
    params: IndexParams,
    collections: RwLock<HashMap<String, Collection>>,
    operations: AtomicU64,
}

impl InMemoryIndex {
    pub fn new(params: IndexParams) -> Self {
        Self {
            params,
            collections: RwLock::new(HashMap::new()),
            operations: AtomicU64::new(0),
        }
    }

    fn check_vectors(&self, vectors: &ColBert, what: &'static str) -> Result<(), IndexError> {
        require_non_empty(vectors, what)?;
        match vectors.iter().find(|v| v.len() != self.params.dimensions) {
            Some(v) => Err(IndexError::DimensionMismatch {
                expected: self.params.dimensions,
                got: v.len(),
            }),
            None => Ok(()),
        }
    }

    /// Number of points stored in `index`.
    pub async fn len(&self, index: &str) -> Result<usize, IndexError> {
        let collections = self.collections.read().await;
        collections
            .get(index)
            .map(|c| c.points.len())
            .ok_or_else(|| IndexError::NotFound(index.to_owned()))
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new(IndexParams::default())
    }
}

#[async_trait::async_trait]
impl VectorIndex for InMemoryIndex {
    #[allow(clippy::unnecessary_literal_bound)] // trait signature uses &str
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn create_index(&self, name: &str) -> Result<bool, IndexError> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            return Err(IndexError::AlreadyExists(name.to_owned()));
        }
        collections.insert(
            name.to_owned(),
            Collection {
                points: BTreeMap::new(),
            },
        );
        tracing::debug!(index = name, "created in-memory index");
        Ok(true)
    }

    async fn delete_index(&self, name: &str) -> Result<bool, IndexError> {
        let mut collections = self.collections.write().await;
        match collections.remove(name) {
            Some(_) => Ok(true),
            None => Err(IndexError::NotFound(name.to_owned())),
        }
    }

    async fn index_exists(&self, name: &str) -> Result<bool, IndexError> {
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn add_points(
        &self,
        index: &str,
        points: Vec<IndexPoint>,
    ) -> Result<UpdateAck, IndexError> {
        require_non_empty(&points, "points")?;
        for point in &points {
            self.check_vectors(&point.embedding, "embedding")?;
        }

        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(index)
            .ok_or_else(|| IndexError::NotFound(index.to_owned()))?;
        for point in points {
            collection.points.insert(point.id.clone(), point);
        }
        Ok(UpdateAck::completed(
            self.operations.fetch_add(1, Ordering::Relaxed),
        ))
    }

    async fn search(
        &self,
        index: &str,
        query: &ColBert,
        k: usize,
    ) -> Result<Vec<QueryResult>, IndexError> {
        require_limit(k)?;
        self.check_vectors(query, "query")?;

        let collections = self.collections.read().await;
        let collection = collections
            .get(index)
            .ok_or_else(|| IndexError::NotFound(index.to_owned()))?;

        let mut results: Vec<QueryResult> = collection
            .points
            .values()
            .map(|point| QueryResult {
                id: point.id.clone(),
                score: max_sim(query, &point.embedding),
                data: Some(point.payload.clone()),
            })
            .collect();
        results.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        results.truncate(k);
        Ok(results)
    }
}
