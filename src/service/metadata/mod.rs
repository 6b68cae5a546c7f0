use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{
    platform::{map_metadata, ClassifiedUrl, MediaMetadata, PlatformError},
    service::http::{cancellable, endpoint, HttpClient, HttpError},
};

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error(transparent)]
    InvalidUrl(#[from] PlatformError),
    #[error("network error: {0}")]
    Network(HttpError),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("request cancelled")]
    Cancelled,
}

impl From<HttpError> for MetadataError {
    fn from(error: HttpError) -> Self {
        match error {
            HttpError::Decode(message) => MetadataError::Parse(message),
            HttpError::Cancelled => MetadataError::Cancelled,
            other => MetadataError::Network(other),
        }
    }
}

/// Resolves a pasted link into a [`MediaMetadata`] through the extraction API.
#[derive(Clone)]
pub struct MetadataService {
    http: Arc<dyn HttpClient>,
    base_url: Url,
}

impl MetadataService {
    pub fn new(http: Arc<dyn HttpClient>, base_url: Url) -> Self {
        info!("Initializing MetadataService against {}", base_url);
        Self { http, base_url }
    }

    /// Classifies `input` and fetches its metadata. Blank or unrecognized input
    /// fails before any request is made.
    pub async fn fetch(&self, input: &str, cancel: &CancellationToken) -> Result<MediaMetadata, MetadataError> {
        let source = ClassifiedUrl::parse(input)?;
        self.fetch_metadata(&source, cancel).await
    }

    pub async fn fetch_metadata(
        &self,
        source: &ClassifiedUrl,
        cancel: &CancellationToken,
    ) -> Result<MediaMetadata, MetadataError> {
        let url = self.metadata_url(source)?;
        info!("Fetching {} metadata", source.platform);

        let body = cancellable(cancel, async { self.http.get_json(&url).await.map_err(MetadataError::from) }).await?;

        let metadata = map_metadata(source, body).map_err(|e| MetadataError::Parse(e.to_string()))?;
        debug!(
            "Mapped metadata for {} with {} variants",
            metadata.author.handle,
            metadata.variants.len()
        );
        Ok(metadata)
    }

    pub fn metadata_url(&self, source: &ClassifiedUrl) -> Result<Url, MetadataError> {
        if !source.platform.is_supported() {
            return Err(PlatformError::InvalidUrl(source.raw.clone()).into());
        }
        Ok(endpoint(&self.base_url, &["api", source.platform.as_str()], ("url", &source.raw))?)
    }
}
