//! The `Midras` facade: one embedder plus one vector index.

use std::sync::Arc;

use image::DynamicImage;
use midras_core::{
    Base64Image, ClientConfig, ColBert, EmbeddingResponse, IndexPoint, Mode, Payload, PointId,
    QueryResult,
};
use midras_embedding::{
    Embedder, EmbeddingConfig, InMemoryEmbedder, PageRasterizer, PdfOptions, PdfSource,
    RemoteEmbedder, embed_pdf_pages,
};
use midras_vector_index::{InMemoryIndex, IndexParams, UpdateAck, VectorIndex};

use crate::error::MidrasError;

/// Number of results returned by [`Midras::query`] when the caller has no preference.
pub const DEFAULT_QUERY_LIMIT: usize = 5;

/// Client combining an embedding backend with a vector index.
///
/// Holds no state of its own beyond its handles; everything persisted lives in the index.
#[derive(Clone)]
pub struct Midras {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    rasterizer: Option<Arc<dyn PageRasterizer>>,
    mode: Mode,
}

impl Midras {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            rasterizer: None,
            mode: Mode::default(),
        }
    }

    /// Uses the hosted embedding API described by `config`.
    pub fn remote(config: ClientConfig, index: Arc<dyn VectorIndex>) -> Result<Self, MidrasError> {
        let mode = config.mode;
        let embedder = RemoteEmbedder::new(config)?;
        Ok(Self::new(Arc::new(embedder), index).with_mode(mode))
    }

    /// Runs ColPali in-process.
    #[cfg(feature = "local")]
    pub fn local(config: EmbeddingConfig, index: Arc<dyn VectorIndex>) -> Result<Self, MidrasError> {
        let embedder = midras_embedding::LocalEmbedder::new(config)?;
        Ok(Self::new(Arc::new(embedder), index).with_mode(Mode::Local))
    }

    /// Deterministic embedder and in-memory index, for development and tests.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryEmbedder::new(EmbeddingConfig::default())),
            Arc::new(InMemoryIndex::new(IndexParams::default())),
        )
    }

    /// Rasterizes PDFs locally instead of uploading them to the embedder.
    #[must_use]
    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    /// Sets the mode used by every embedding call.
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    // --- Embedding ---

    pub async fn embed_queries(&self, queries: &[&str]) -> Result<EmbeddingResponse, MidrasError> {
        Ok(self.embedder.embed_queries(queries, self.mode).await?)
    }

    pub async fn embed_images(
        &self,
        images: &[DynamicImage],
    ) -> Result<EmbeddingResponse, MidrasError> {
        Ok(self.embedder.embed_images(images, self.mode).await?)
    }

    pub async fn embed_base64_images(
        &self,
        images: &[Base64Image],
    ) -> Result<EmbeddingResponse, MidrasError> {
        Ok(self.embedder.embed_base64_images(images, self.mode).await?)
    }

    /// Embeds every page of a PDF, one embedding per page in page order.
    ///
    /// With a rasterizer configured, pages are rendered locally and embedded in
    /// `options.batch_size` chunks; otherwise the whole file goes to the embedder.
    pub async fn embed_pdf(
        &self,
        source: impl Into<PdfSource>,
        options: PdfOptions,
    ) -> Result<EmbeddingResponse, MidrasError> {
        let source = source.into();
        let options = options.or_mode(self.mode);
        let response = match &self.rasterizer {
            Some(rasterizer) => {
                embed_pdf_pages(self.embedder.as_ref(), rasterizer.as_ref(), &source, &options)
                    .await?
            }
            None => self.embedder.embed_pdf(&source, &options).await?,
        };
        Ok(response)
    }

    // --- Index ---

    pub async fn create_index(&self, name: &str) -> Result<bool, MidrasError> {
        Ok(self.index.create_index(name).await?)
    }

    pub async fn delete_index(&self, name: &str) -> Result<bool, MidrasError> {
        Ok(self.index.delete_index(name).await?)
    }

    pub async fn index_exists(&self, name: &str) -> Result<bool, MidrasError> {
        Ok(self.index.index_exists(name).await?)
    }

    pub async fn add_point(
        &self,
        index: &str,
        id: impl Into<PointId>,
        embedding: ColBert,
        payload: Payload,
    ) -> Result<UpdateAck, MidrasError> {
        let point = IndexPoint::new(id, embedding, payload);
        Ok(self.index.add_point(index, point).await?)
    }

    pub async fn add_points(
        &self,
        index: &str,
        points: Vec<IndexPoint>,
    ) -> Result<UpdateAck, MidrasError> {
        Ok(self.index.add_points(index, points).await?)
    }

    pub async fn search(
        &self,
        index: &str,
        query: &ColBert,
        k: usize,
    ) -> Result<Vec<QueryResult>, MidrasError> {
        Ok(self.index.search(index, query, k).await?)
    }

    /// Embeds `query` and returns the `k` best matches in `index`.
    pub async fn query(
        &self,
        index: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<QueryResult>, MidrasError> {
        let response = self.embed_queries(&[query]).await?;
        let embedding = response.into_first().ok_or(MidrasError::EmptyEmbedding)?;
        tracing::debug!(index, k, vectors = embedding.len(), "searching index");
        self.search(index, &embedding, k).await
    }
}
