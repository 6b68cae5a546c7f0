use std::{future::Future, time::Duration};

use async_trait::async_trait;
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Client, Response,
};
use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::ApiConfig;

const USER_AGENT: &str = concat!("ssdown/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status: {0}")]
    Status(u16),
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("request timed out")]
    TimedOut,
    #[error("request cancelled")]
    Cancelled,
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Appends `segments` to the base URL path and sets one query parameter,
/// percent-encoding the value.
pub fn endpoint(base: &Url, segments: &[&str], query: (&str, &str)) -> Result<Url, HttpError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| HttpError::InvalidEndpoint(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    url.query_pairs_mut().clear().append_pair(query.0, query.1);
    Ok(url)
}

/// Outbound HTTP used by the metadata and download services.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GETs `url` and parses the body as JSON. Non-2xx answers fail with
    /// [`HttpError::Status`].
    async fn get_json(&self, url: &Url) -> Result<Value, HttpError>;

    /// GETs `url` and writes the body into `sink` chunk by chunk, returning the
    /// number of bytes written.
    async fn download(&self, url: &Url, sink: &mut (dyn AsyncWrite + Unpin + Send)) -> Result<u64, HttpError>;
}

#[derive(Clone)]
pub struct HttpService {
    client: Client,
    request_timeout: Duration,
}

impl HttpService {
    pub fn new(config: &ApiConfig) -> Result<Self, HttpError> {
        let client = Self::create_client(Self::default_headers(), config.connect_timeout)?;

        Ok(Self {
            client,
            request_timeout: config.request_timeout,
        })
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json, video/*;q=0.9, */*;q=0.8"));
        headers
    }

    fn create_client(headers: HeaderMap, connect_timeout: Duration) -> Result<Client, HttpError> {
        // no total timeout here: video bodies can take longer than any sane
        // request deadline, the download loop bounds each chunk instead
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .default_headers(headers)
            .build()?;
        Ok(client)
    }

    async fn send(&self, url: &Url) -> Result<Response, HttpError> {
        let response = tokio::time::timeout(self.request_timeout, self.client.get(url.clone()).send())
            .await
            .map_err(|_| HttpError::TimedOut)??;

        let status = response.status();
        if !status.is_success() {
            warn!("GET {} answered {}", url, status);
            return Err(HttpError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl HttpClient for HttpService {
    async fn get_json(&self, url: &Url) -> Result<Value, HttpError> {
        debug!("GET {}", url);
        let response = self.send(url).await?;
        let text = tokio::time::timeout(self.request_timeout, response.text())
            .await
            .map_err(|_| HttpError::TimedOut)??;

        if text.trim().is_empty() {
            return Err(HttpError::Decode("Empty response body".into()));
        }

        serde_json::from_str(&text).map_err(|e| HttpError::Decode(format!("Failed to parse JSON: {}", e)))
    }

    async fn download(&self, url: &Url, sink: &mut (dyn AsyncWrite + Unpin + Send)) -> Result<u64, HttpError> {
        debug!("GET {} (streaming)", url);
        let mut response = self.send(url).await?;
        let mut written = 0u64;

        loop {
            let chunk = tokio::time::timeout(self.request_timeout, response.chunk())
                .await
                .map_err(|_| HttpError::TimedOut)??;

            match chunk {
                Some(bytes) => {
                    sink.write_all(&bytes).await?;
                    written += bytes.len() as u64;
                }
                None => break,
            }
        }

        sink.flush().await?;
        Ok(written)
    }
}

/// Races `fut` against `cancel`, so callers can drop interest in a request
/// when the screen that started it goes away.
pub async fn cancellable<T, E, F>(cancel: &CancellationToken, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<HttpError>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(HttpError::Cancelled.into()),
        result = fut => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancellable_passes_result_through() {
        let token = CancellationToken::new();
        let result: Result<u8, HttpError> = cancellable(&token, async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_cancellable_stops_pending_future() {
        let token = CancellationToken::new();
        token.cancel();
        let result: Result<u8, HttpError> = cancellable(&token, std::future::pending()).await;
        assert!(matches!(result, Err(HttpError::Cancelled)));
    }

    #[test]
    fn test_endpoint_encodes_query() {
        let base = Url::parse("https://ssdown.app").unwrap();
        let url = endpoint(&base, &["api", "tiktok"], ("url", "https://www.tiktok.com/@u/video/1?lang=en&x=1")).unwrap();
        assert_eq!(url.path(), "/api/tiktok");
        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, "url");
        assert_eq!(value, "https://www.tiktok.com/@u/video/1?lang=en&x=1");
        assert!(!url.query().unwrap().contains("&x=1"));
    }

    #[test]
    fn test_endpoint_keeps_base_prefix() {
        let base = Url::parse("http://localhost:8080/proxy/").unwrap();
        let url = endpoint(&base, &["api", "x", "download"], ("videoUrl", "https://cdn/v.mp4")).unwrap();
        assert_eq!(url.path(), "/proxy/api/x/download");

        let opaque = Url::parse("mailto:someone@example.com").unwrap();
        assert!(matches!(
            endpoint(&opaque, &["api"], ("a", "b")),
            Err(HttpError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_service_builds_from_config() {
        let config = ApiConfig {
            base_url: Url::parse("https://ssdown.app").unwrap(),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(5),
        };
        assert!(HttpService::new(&config).is_ok());
    }
}
