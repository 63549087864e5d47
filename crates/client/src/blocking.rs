//! Blocking variant of the client.
//!
//! Wraps [`crate::Midras`] and drives each call to completion on a private
//! current-thread runtime. Must not be used from inside an async context.

use image::DynamicImage;
use midras_core::{Base64Image, ColBert, EmbeddingResponse, IndexPoint, Payload, PointId, QueryResult};
use midras_embedding::{PdfOptions, PdfSource};
use midras_vector_index::UpdateAck;
use tokio::runtime::{Builder, Runtime};

use crate::error::MidrasError;

/// Blocking Midras client.
pub struct Midras {
    inner: crate::Midras,
    runtime: Runtime,
}

impl Midras {
    /// Wraps an async client.
    pub fn new(inner: crate::Midras) -> Result<Self, MidrasError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| MidrasError::Runtime(e.to_string()))?;
        Ok(Self { inner, runtime })
    }

    /// Blocking client over [`crate::Midras::in_memory`].
    pub fn in_memory() -> Result<Self, MidrasError> {
        Self::new(crate::Midras::in_memory())
    }

    /// Returns the wrapped async client.
    pub fn inner(&self) -> &crate::Midras {
        &self.inner
    }

    pub fn embed_queries(&self, queries: &[&str]) -> Result<EmbeddingResponse, MidrasError> {
        self.runtime.block_on(self.inner.embed_queries(queries))
    }

    pub fn embed_images(&self, images: &[DynamicImage]) -> Result<EmbeddingResponse, MidrasError> {
        self.runtime.block_on(self.inner.embed_images(images))
    }

    pub fn embed_base64_images(
        &self,
        images: &[Base64Image],
    ) -> Result<EmbeddingResponse, MidrasError> {
        self.runtime.block_on(self.inner.embed_base64_images(images))
    }

    pub fn embed_pdf(
        &self,
        source: impl Into<PdfSource>,
        options: PdfOptions,
    ) -> Result<EmbeddingResponse, MidrasError> {
        self.runtime.block_on(self.inner.embed_pdf(source, options))
    }

    pub fn create_index(&self, name: &str) -> Result<bool, MidrasError> {
        self.runtime.block_on(self.inner.create_index(name))
    }

    pub fn delete_index(&self, name: &str) -> Result<bool, MidrasError> {
        self.runtime.block_on(self.inner.delete_index(name))
    }

    pub fn index_exists(&self, name: &str) -> Result<bool, MidrasError> {
        self.runtime.block_on(self.inner.index_exists(name))
    }

    pub fn add_point(
        &self,
        index: &str,
        id: impl Into<PointId>,
        embedding: ColBert,
        payload: Payload,
    ) -> Result<UpdateAck, MidrasError> {
        self.runtime
            .block_on(self.inner.add_point(index, id, embedding, payload))
    }

    pub fn add_points(&self, index: &str, points: Vec<IndexPoint>) -> Result<UpdateAck, MidrasError> {
        self.runtime.block_on(self.inner.add_points(index, points))
    }

    pub fn search(
        &self,
        index: &str,
        query: &ColBert,
        k: usize,
    ) -> Result<Vec<QueryResult>, MidrasError> {
        self.runtime.block_on(self.inner.search(index, query, k))
    }

    pub fn query(&self, index: &str, query: &str, k: usize) -> Result<Vec<QueryResult>, MidrasError> {
        self.runtime.block_on(self.inner.query(index, query, k))
    }
}
