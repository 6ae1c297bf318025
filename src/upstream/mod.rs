use std::time::Duration;

use log::{debug, error};
use reqwest::{Client, Url};
use rocket::http::Method;
use thiserror::Error;

use crate::config::{AppConfig, ConfigError};
use crate::images::detect_image_type;

const JSON_ACCEPT: &str = "application/json";
const IMAGE_ACCEPT: &str = "image/webp,image/apng,image/*,*/*;q=0.8";

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Method {0} not allowed")]
    MethodNotAllowed(Method),

    #[error("Upstream timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Upstream responded with {status} {reason}")]
    Status {
        status: u16,
        reason: String,
        body: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Json,
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

pub fn is_read_method(method: Method) -> bool {
    matches!(method, Method::Get | Method::Head)
}

/// A single fetch against the API host or the image host. Implementations must not retry.
#[rocket::async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch(
        &self,
        method: Method,
        kind: ResourceKind,
        url: &Url,
    ) -> Result<UpstreamResponse, UpstreamError>;
}

pub struct HttpUpstream {
    client: Client,
    timeout: Duration,
    image_timeout: Duration,
    user_agent: String,
    referer: String,
}

impl HttpUpstream {
    pub fn new(config: &AppConfig) -> Result<Self, ConfigError> {
        // Timeouts are applied per request since they differ by resource kind
        let client = Client::builder()
            .build()
            .map_err(|e| ConfigError::ClientError(format!("Failed to build client: {}", e)))?;

        Ok(Self {
            client,
            timeout: Duration::from_secs(config.timeout),
            image_timeout: Duration::from_secs(config.image_timeout),
            user_agent: config.user_agent.clone(),
            referer: config.referer.clone(),
        })
    }

    fn build_request(&self, method: reqwest::Method, kind: ResourceKind, url: &Url) -> reqwest::RequestBuilder {
        let request = self
            .client
            .request(method, url.clone())
            .header("User-Agent", &self.user_agent);

        match kind {
            ResourceKind::Json => request
                .timeout(self.timeout)
                .header("Accept", JSON_ACCEPT)
                .header("Content-Type", JSON_ACCEPT),
            // The image host rejects requests that do not look like they come from the site
            ResourceKind::Image => request
                .timeout(self.image_timeout)
                .header("Referer", &self.referer)
                .header("Accept", IMAGE_ACCEPT)
                .header("Accept-Language", "en-US,en;q=0.9")
                .header("Cache-Control", "no-cache"),
        }
    }

    fn timeout_for(&self, kind: ResourceKind) -> Duration {
        match kind {
            ResourceKind::Json => self.timeout,
            ResourceKind::Image => self.image_timeout,
        }
    }
}

#[rocket::async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(
        &self,
        method: Method,
        kind: ResourceKind,
        url: &Url,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let method = match method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            other => return Err(UpstreamError::MethodNotAllowed(other)),
        };

        debug!("Fetching {:?} resource {}", kind, url);

        let response = self
            .build_request(method, kind, url)
            .send()
            .await
            .map_err(|e| self.map_transport_error(kind, url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.ok().filter(|b| !b.is_empty());
            error!(
                "Upstream request to {} failed with status: {}. Body: {}",
                url,
                status,
                body.as_deref().unwrap_or("<empty>")
            );
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
                body,
            });
        }

        // Get the content-type from headers or default to octet-stream
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(kind, url, e))?
            .to_vec();

        // If content type is missing or generic, try to detect from image data
        let content_type = match kind {
            ResourceKind::Image if content_type == "application/octet-stream" => {
                detect_image_type(&body)
                    .map(str::to_string)
                    .unwrap_or(content_type)
            }
            _ => content_type,
        };

        Ok(UpstreamResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

impl HttpUpstream {
    fn map_transport_error(&self, kind: ResourceKind, url: &Url, e: reqwest::Error) -> UpstreamError {
        if e.is_timeout() {
            error!("Upstream request to {} timed out", url);
            UpstreamError::Timeout(self.timeout_for(kind))
        } else {
            error!("Upstream request to {} failed: {}", url, e);
            UpstreamError::NetworkError(e.to_string())
        }
    }
}
