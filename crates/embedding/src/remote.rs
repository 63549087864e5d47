//! Remote embedder calling the hosted Midras embedding API.

use image::DynamicImage;
use midras_core::config::ApiKeyPlacement;
use midras_core::error::{require_non_empty, require_texts};
use midras_core::{
    Base64Image, ClientConfig, EmbeddingResponse, ImagesRequest, Mode, PdfParams, QueriesRequest,
    ValidationError,
};
use serde::Serialize;

use crate::config::COLPALI_DIMENSIONS;
use crate::encoding::encode_png_base64_all;
use crate::engine::Embedder;
use crate::error::EmbeddingError;
use crate::pdf::{PdfOptions, PdfSource};

/// Embedder backed by the hosted HTTP API.
///
/// Each operation is a single request bounded by the configured timeout. Nothing is retried.
pub struct RemoteEmbedder {
    client: reqwest::Client,
    config: ClientConfig,
}

impl RemoteEmbedder {
    /// Creates a new `RemoteEmbedder` from a client configuration.
    pub fn new(config: ClientConfig) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Sets a custom reqwest client (e.g. for testing with `no_proxy()`).
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn body_key(&self) -> Option<String> {
        match self.config.api_key_placement {
            ApiKeyPlacement::Body if !self.config.api_key.is_empty() => {
                Some(self.config.api_key.clone())
            }
            _ => None,
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.api_key_placement {
            ApiKeyPlacement::Header if !self.config.api_key.is_empty() => {
                request.bearer_auth(&self.config.api_key)
            }
            _ => request,
        }
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<EmbeddingResponse, EmbeddingError> {
        let url = self.config.endpoint(path);
        tracing::debug!(url = %url, "posting embedding request");
        let response = self.authorize(self.client.post(&url)).json(body).send().await?;
        decode(response).await
    }

    async fn post_pdf(
        &self,
        bytes: Vec<u8>,
        file_name: String,
        params: &PdfParams,
    ) -> Result<EmbeddingResponse, EmbeddingError> {
        let url = self.config.endpoint("/embed/pdf");
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let mut form = reqwest::multipart::Form::new().part("file", part);
        if let Some(key) = self.body_key() {
            form = form.text("api_key", key);
        }

        tracing::debug!(url = %url, batch_size = params.batch_size, "uploading pdf");
        let response = self
            .authorize(self.client.post(&url))
            .query(params)
            .multipart(form)
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode(response: reqwest::Response) -> Result<EmbeddingResponse, EmbeddingError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), body = %body, "embedding request failed");
        return Err(if status.is_server_error() {
            EmbeddingError::Server {
                status: status.as_u16(),
                body,
            }
        } else {
            EmbeddingError::Api {
                status: status.as_u16(),
                body,
            }
        });
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))
}

fn check_count(response: &EmbeddingResponse, expected: usize) -> Result<(), EmbeddingError> {
    if response.len() == expected {
        Ok(())
    } else {
        Err(EmbeddingError::CountMismatch {
            expected,
            got: response.len(),
        })
    }
}

fn remote_mode(mode: Mode) -> Result<Mode, ValidationError> {
    match mode {
        Mode::Local => Err(ValidationError::UnsupportedMode(mode)),
        other => Ok(other),
    }
}

#[async_trait::async_trait]
impl Embedder for RemoteEmbedder {
    #[allow(clippy::unnecessary_literal_bound)] // trait signature uses &str
    fn name(&self) -> &str {
        "remote"
    }

    fn dimensions(&self) -> usize {
        COLPALI_DIMENSIONS
    }

    async fn embed_queries(
        &self,
        queries: &[&str],
        mode: Mode,
    ) -> Result<EmbeddingResponse, EmbeddingError> {
        require_texts(queries, "queries")?;
        let body = QueriesRequest {
            queries: queries.iter().map(|q| (*q).to_owned()).collect(),
            mode: remote_mode(mode)?,
            api_key: self.body_key(),
        };
        let response = self.post_json("/embed/queries", &body).await?;
        check_count(&response, queries.len())?;
        Ok(response)
    }

    async fn embed_images(
        &self,
        images: &[DynamicImage],
        mode: Mode,
    ) -> Result<EmbeddingResponse, EmbeddingError> {
        require_non_empty(images, "images")?;
        let mode = remote_mode(mode)?;
        let encoded = encode_png_base64_all(images)?;
        self.embed_base64_images(&encoded, mode).await
    }

    async fn embed_base64_images(
        &self,
        images: &[Base64Image],
        mode: Mode,
    ) -> Result<EmbeddingResponse, EmbeddingError> {
        require_texts(images, "images")?;
        let body = ImagesRequest {
            images: images.to_vec(),
            mode: remote_mode(mode)?,
            api_key: self.body_key(),
        };
        let response = self.post_json("/embed/images", &body).await?;
        check_count(&response, images.len())?;
        Ok(response)
    }

    async fn embed_pdf(
        &self,
        source: &PdfSource,
        options: &PdfOptions,
    ) -> Result<EmbeddingResponse, EmbeddingError> {
        options.validate()?;
        remote_mode(options.effective_mode())?;
        let bytes = source.read_bytes()?;
        self.post_pdf(bytes, source.file_name(), &PdfParams::from(*options))
            .await
    }
}
