//! Vector index backed by a qdrant server.
//!
//! Collections use qdrant's multivector support: cosine distance with the `MaxSim`
//! comparator, so ranking matches [`crate::scoring::max_sim`]. Missing and duplicate
//! collections surface as [`IndexError::NotFound`] and [`IndexError::AlreadyExists`];
//! other backend errors pass through as [`IndexError::Backend`] with qdrant's message.

use midras_core::error::{require_limit, require_non_empty};
use midras_core::{ColBert, IndexPoint, Payload, PointId, QueryResult};
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeleteCollectionBuilder, Distance, MultiVectorComparator,
    MultiVectorConfigBuilder, PointStruct, Query, QueryPointsBuilder, ScoredPoint,
    UpdateResult, UpsertPointsBuilder, Vector, VectorInput, VectorParamsBuilder,
};
use qdrant_client::Qdrant;

use crate::config::{IndexParams, QdrantConfig};
use crate::error::IndexError;
use crate::index::{UpdateAck, UpdateStatus, VectorIndex};

/// Vector index stored in qdrant.
pub struct QdrantIndex {
    client: Qdrant,
    params: IndexParams,
}

impl QdrantIndex {
    /// Connects to the qdrant server described by `config`.
    pub fn new(config: &QdrantConfig) -> Result<Self, IndexError> {
        let mut builder = Qdrant::from_url(&config.url).timeout(config.timeout);
        if let Some(key) = &config.api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            params: config.params,
        })
    }

    /// Wraps an already configured client.
    pub fn from_client(client: Qdrant, params: IndexParams) -> Self {
        Self { client, params }
    }
}

fn to_qdrant_id(id: &PointId) -> qdrant_client::qdrant::PointId {
    match id {
        PointId::Num(n) => (*n).into(),
        PointId::Text(s) => s.clone().into(),
    }
}

fn from_qdrant_id(id: Option<qdrant_client::qdrant::PointId>) -> Option<PointId> {
    match id?.point_id_options? {
        PointIdOptions::Num(n) => Some(PointId::Num(n)),
        PointIdOptions::Uuid(s) => Some(PointId::Text(s)),
    }
}

fn to_qdrant_payload(payload: Payload) -> Result<qdrant_client::Payload, IndexError> {
    qdrant_client::Payload::try_from(serde_json::Value::Object(payload))
        .map_err(|e| IndexError::Backend(format!("invalid payload: {e}")))
}

fn to_query_result(point: ScoredPoint) -> Option<QueryResult> {
    let id = from_qdrant_id(point.id)?;
    let data = point
        .payload
        .into_iter()
        .map(|(k, v)| (k, v.into_json()))
        .collect::<Payload>();
    Some(QueryResult {
        id,
        score: point.score,
        data: Some(data),
    })
}

fn to_ack(result: Option<UpdateResult>) -> UpdateAck {
    match result {
        Some(result) => UpdateAck {
            operation_id: result.operation_id,
            status: if result.status == qdrant_client::qdrant::UpdateStatus::Completed as i32 {
                UpdateStatus::Completed
            } else {
                UpdateStatus::Acknowledged
            },
        },
        None => UpdateAck {
            operation_id: None,
            status: UpdateStatus::Acknowledged,
        },
    }
}

#[async_trait::async_trait]
impl VectorIndex for QdrantIndex {
    #[allow(clippy::unnecessary_literal_bound)] // trait signature uses &str
    fn name(&self) -> &str {
        "qdrant"
    }

    async fn create_index(&self, name: &str) -> Result<bool, IndexError> {
        let vectors = VectorParamsBuilder::new(self.params.dimensions as u64, Distance::Cosine)
            .multivector_config(MultiVectorConfigBuilder::new(MultiVectorComparator::MaxSim));
        let response = self
            .client
            .create_collection(CreateCollectionBuilder::new(name).vectors_config(vectors))
            .await?;
        tracing::debug!(index = name, "created qdrant collection");
        Ok(response.result)
    }

    async fn delete_index(&self, name: &str) -> Result<bool, IndexError> {
        let response = self
            .client
            .delete_collection(DeleteCollectionBuilder::new(name))
            .await?;
        Ok(response.result)
    }

    async fn index_exists(&self, name: &str) -> Result<bool, IndexError> {
        Ok(self.client.collection_exists(name).await?)
    }

    async fn add_points(
        &self,
        index: &str,
        points: Vec<IndexPoint>,
    ) -> Result<UpdateAck, IndexError> {
        require_non_empty(&points, "points")?;
        let points = points
            .into_iter()
            .map(|p| {
                Ok(PointStruct::new(
                    to_qdrant_id(&p.id),
                    Vector::new_multi(p.embedding),
                    to_qdrant_payload(p.payload)?,
                ))
            })
            .collect::<Result<Vec<_>, IndexError>>()?;

        tracing::debug!(index, count = points.len(), "upserting points");
        let response = self
            .client
            .upsert_points(UpsertPointsBuilder::new(index, points).wait(true))
            .await?;
        Ok(to_ack(response.result))
    }

    async fn search(
        &self,
        index: &str,
        query: &ColBert,
        k: usize,
    ) -> Result<Vec<QueryResult>, IndexError> {
        require_limit(k)?;
        require_non_empty(query, "query")?;

        let request = QueryPointsBuilder::new(index)
            .query(Query::new_nearest(VectorInput::new_multi(query.clone())))
            .limit(k as u64)
            .with_payload(true);
        let response = self.client.query(request).await?;
        Ok(response
            .result
            .into_iter()
            .filter_map(to_query_result)
            .collect())
    }
}
