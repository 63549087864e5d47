//! Request handlers for the embedding endpoints.

use axum::Json;
use axum::extract::{Multipart, Query, State};
use midras_core::{EmbeddingResponse, ImagesRequest, PdfParams, QueriesRequest};
use midras_embedding::{PdfOptions, PdfSource, embed_pdf_pages};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ServerError;

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub embedder: String,
    pub dimensions: usize,
    pub pdf: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_owned(),
        embedder: state.embedder.name().to_owned(),
        dimensions: state.embedder.dimensions(),
        pdf: state.rasterizer.is_some(),
    })
}

pub async fn embed_queries(
    State(state): State<AppState>,
    Json(request): Json<QueriesRequest>,
) -> Result<Json<EmbeddingResponse>, ServerError> {
    tracing::debug!(count = request.queries.len(), mode = %request.mode, "embedding queries");
    let queries: Vec<&str> = request.queries.iter().map(String::as_str).collect();
    let response = state.embedder.embed_queries(&queries, request.mode).await?;
    Ok(Json(response))
}

pub async fn embed_images(
    State(state): State<AppState>,
    Json(request): Json<ImagesRequest>,
) -> Result<Json<EmbeddingResponse>, ServerError> {
    tracing::debug!(count = request.images.len(), mode = %request.mode, "embedding images");
    let response = state
        .embedder
        .embed_base64_images(&request.images, request.mode)
        .await?;
    Ok(Json(response))
}

pub async fn embed_pdf(
    State(state): State<AppState>,
    Query(params): Query<PdfParams>,
    mut multipart: Multipart,
) -> Result<Json<EmbeddingResponse>, ServerError> {
    let rasterizer = state.rasterizer.as_ref().ok_or(ServerError::NoRasterizer)?;

    let mut file = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            file = Some(field.bytes().await?.to_vec());
        }
    }
    let bytes = file.ok_or(ServerError::MissingField("file"))?;

    tracing::debug!(size = bytes.len(), batch_size = params.batch_size, "embedding pdf");
    let response = embed_pdf_pages(
        state.embedder.as_ref(),
        rasterizer.as_ref(),
        &PdfSource::Bytes(bytes),
        &PdfOptions::from(params),
    )
    .await?;
    Ok(Json(response))
}
