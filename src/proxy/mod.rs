use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::Url;
use rocket::http::Method;

use crate::api::ApiError;
use crate::cache::ResponseCache;
use crate::config::{AppConfig, ConfigError};
use crate::images::{inline_placeholder, CoverStrategy, ImageTranscoder, INLINE_PLACEHOLDER_TYPE};
use crate::models::{AtHomeServer, CacheStatsResponse, ChapterPages};
use crate::query::{resolve_url, QueryParams};
use crate::upstream::{is_read_method, ResourceKind, Upstream, UpstreamError};

pub const IMAGE_MAX_AGE: u64 = 86400;
pub const FALLBACK_MAX_AGE: u64 = 3600;

/// A JSON resource on the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiRoute<'a> {
    MangaList,
    Manga(&'a str),
    ChapterList,
    Chapter(&'a str),
    MangaStatistics,
    AtHomeServer(&'a str),
    /// Any other API path, forwarded as is.
    Passthrough(&'a str),
}

impl<'a> ApiRoute<'a> {
    pub fn path(&self) -> &'a str {
        match *self {
            ApiRoute::MangaList | ApiRoute::Manga(_) => "manga",
            ApiRoute::ChapterList | ApiRoute::Chapter(_) => "chapter",
            ApiRoute::MangaStatistics => "statistics/manga",
            ApiRoute::AtHomeServer(_) => "at-home/server",
            ApiRoute::Passthrough(path) => path,
        }
    }

    pub fn id(&self) -> Option<&'a str> {
        match *self {
            ApiRoute::Manga(id) | ApiRoute::Chapter(id) | ApiRoute::AtHomeServer(id) => Some(id),
            _ => None,
        }
    }

    /// Seconds clients may cache the response for; statistics change slowly.
    pub fn max_age(&self) -> u64 {
        if self.path().trim_start_matches('/').starts_with("statistics") {
            600
        } else {
            300
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ApiRoute::MangaStatistics => "MangaDex Statistics API",
            ApiRoute::AtHomeServer(_) => "MangaDex At-Home API",
            _ => "MangaDex API",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
    pub cache_control: String,
    pub cache_status: CacheStatus,
    pub kind: ResourceKind,
}

impl ProxyResponse {
    fn image(body: Vec<u8>, content_type: String, max_age: u64, cache_status: CacheStatus) -> Self {
        Self {
            status: 200,
            content_type,
            body,
            cache_control: format!("public, max-age={}", max_age),
            cache_status,
            kind: ResourceKind::Image,
        }
    }
}

/// Per-request orchestration: resolve the upstream URL, consult the cache, fetch on a
/// miss, normalize images and store successful payloads.
pub struct MangaProxy {
    upstream: Arc<dyn Upstream>,
    images: Arc<ResponseCache>,
    api: Arc<ResponseCache>,
    transcoder: ImageTranscoder,
    api_base: Url,
    image_base: Url,
    image_hosts: Vec<String>,
    placeholder: Option<Url>,
}

impl MangaProxy {
    pub fn new(config: &AppConfig, upstream: Arc<dyn Upstream>) -> Result<Self, ConfigError> {
        let api_base = parse_base("api_base_url", &config.api_base_url)?;
        let image_base = parse_base("image_base_url", &config.image_base_url)?;
        let placeholder = config
            .placeholder_url
            .as_deref()
            .map(|url| parse_base("placeholder_url", url))
            .transpose()?;

        let mut image_hosts: Vec<String> = config
            .allowed_image_hosts
            .iter()
            .map(|host| host.trim().to_ascii_lowercase())
            .filter(|host| !host.is_empty())
            .collect();
        if let Some(host) = image_base.host_str() {
            if !image_hosts.iter().any(|h| h == host) {
                image_hosts.push(host.to_string());
            }
        }

        Ok(Self {
            upstream,
            images: Arc::new(ResponseCache::new(Duration::from_secs(config.image_cache_ttl))),
            api: Arc::new(ResponseCache::new(Duration::from_secs(config.api_cache_ttl))),
            transcoder: ImageTranscoder::new(&config.transcode),
            api_base,
            image_base,
            image_hosts,
            placeholder,
        })
    }

    pub fn with_caches(mut self, images: Arc<ResponseCache>, api: Arc<ResponseCache>) -> Self {
        self.images = images;
        self.api = api;
        self
    }

    pub fn with_transcoder(mut self, transcoder: ImageTranscoder) -> Self {
        self.transcoder = transcoder;
        self
    }

    pub fn image_cache(&self) -> Arc<ResponseCache> {
        Arc::clone(&self.images)
    }

    pub fn api_cache(&self) -> Arc<ResponseCache> {
        Arc::clone(&self.api)
    }

    pub fn allowed_image_hosts(&self) -> &[String] {
        &self.image_hosts
    }

    pub fn cache_stats(&self) -> CacheStatsResponse {
        CacheStatsResponse {
            images: self.images.stats(),
            api: self.api.stats(),
        }
    }

    pub fn clear_caches(&self) {
        self.images.clear();
        self.api.clear();
        info!("Caches cleared");
    }

    /// Forward a JSON API request; a successful upstream body is returned byte for byte.
    pub async fn proxy_json(
        &self,
        method: Method,
        route: ApiRoute<'_>,
        params: &QueryParams,
    ) -> Result<ProxyResponse, ApiError> {
        ensure_read(method)?;

        let url = resolve_url(&self.api_base, route.path(), route.id(), params)?;
        let cache_control = format!("public, max-age={}", route.max_age());

        if self.api.is_enabled() {
            if let Some(entry) = self.api.get(url.as_str()) {
                debug!("API cache hit: {}", url);
                return Ok(ProxyResponse {
                    status: 200,
                    content_type: entry.content_type,
                    body: entry.body,
                    cache_control,
                    cache_status: CacheStatus::Hit,
                    kind: ResourceKind::Json,
                });
            }
        }

        info!("Proxying {} request to: {}", route.label(), url);

        let response = self
            .upstream
            .fetch(Method::Get, ResourceKind::Json, &url)
            .await
            .map_err(|e| api_error(route.label(), e))?;

        if response.status == 200 {
            self.api
                .set(url.as_str(), response.body.clone(), response.content_type.clone());
        }

        Ok(ProxyResponse {
            status: response.status,
            content_type: response.content_type,
            body: response.body,
            cache_control,
            cache_status: CacheStatus::Miss,
            kind: ResourceKind::Json,
        })
    }

    /// Fetch an image from an allow-listed host.
    pub async fn proxy_image(
        &self,
        method: Method,
        url: Option<&str>,
    ) -> Result<ProxyResponse, ApiError> {
        ensure_read(method)?;

        let raw = url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ApiError::BadRequest("URL parameter is required".to_string()))?;
        let target = self.allowed_image_url(raw)?;

        self.fetch_image(&target, IMAGE_MAX_AGE).await
    }

    /// Resolve a chapter's page URLs through the at-home delivery network.
    pub async fn chapter_pages(
        &self,
        method: Method,
        chapter_id: &str,
        data_saver: bool,
    ) -> Result<ChapterPages, ApiError> {
        let response = self
            .proxy_json(method, ApiRoute::AtHomeServer(chapter_id), &QueryParams::new())
            .await?;

        let at_home = match serde_json::from_slice::<AtHomeServer>(&response.body) {
            Ok(at_home) => at_home,
            Err(e) => {
                warn!("Unexpected at-home payload for chapter {}: {}", chapter_id, e);
                AtHomeServer::default()
            }
        };

        Ok(ChapterPages::from_at_home(chapter_id, at_home, data_saver))
    }

    /// Serve a cover, walking the fallback chain until one strategy produces an image.
    pub async fn cover(
        &self,
        method: Method,
        manga_id: &str,
        file_name: &str,
        title: Option<&str>,
    ) -> Result<ProxyResponse, ApiError> {
        ensure_read(method)?;

        let strategies = CoverStrategy::chain(
            &self.image_base,
            manga_id,
            file_name,
            self.placeholder.as_ref(),
            title,
        );

        for strategy in &strategies {
            let attempt = match strategy {
                CoverStrategy::Upstream(url) => self.fetch_image(url, IMAGE_MAX_AGE).await,
                CoverStrategy::Placeholder(url) => self.fetch_image(url, FALLBACK_MAX_AGE).await,
                CoverStrategy::Inline => Ok(ProxyResponse::image(
                    inline_placeholder(),
                    INLINE_PLACEHOLDER_TYPE.to_string(),
                    FALLBACK_MAX_AGE,
                    CacheStatus::Miss,
                )),
            };

            match attempt {
                Ok(response) => {
                    debug!("Cover for {} served by {} strategy", manga_id, strategy.name());
                    return Ok(response);
                }
                Err(e) => warn!(
                    "Cover strategy {} failed for manga {}: {}",
                    strategy.name(),
                    manga_id,
                    e
                ),
            }
        }

        Err(ApiError::InternalError(format!(
            "no cover strategy succeeded for manga {}",
            manga_id
        )))
    }

    fn allowed_image_url(&self, raw: &str) -> Result<Url, ApiError> {
        let url = Url::parse(raw)
            .map_err(|e| ApiError::BadRequest(format!("Invalid image URL: {}", e)))?;

        let host_allowed = matches!(url.scheme(), "http" | "https")
            && url
                .host_str()
                .map_or(false, |host| self.image_hosts.iter().any(|h| h == host));

        if !host_allowed {
            warn!("Refusing to proxy image from {}", raw);
            return Err(ApiError::BadRequest(format!(
                "Only {} images are allowed",
                self.image_hosts.join(", ")
            )));
        }

        Ok(url)
    }

    async fn fetch_image(&self, url: &Url, max_age: u64) -> Result<ProxyResponse, ApiError> {
        if let Some(entry) = self.images.get(url.as_str()) {
            debug!("Image found in cache: {}", url);
            return Ok(ProxyResponse::image(
                entry.body,
                entry.content_type,
                max_age,
                CacheStatus::Hit,
            ));
        }

        debug!("Image not found in cache: {}", url);

        let response = self
            .upstream
            .fetch(Method::Get, ResourceKind::Image, url)
            .await
            .map_err(image_error)?;

        let transcoder = self.transcoder.clone();
        let (body, content_type) = rocket::tokio::task::spawn_blocking(move || {
            transcoder.normalize(response.body, response.content_type)
        })
        .await
        .map_err(|e| ApiError::InternalError(format!("image transcoding task failed: {}", e)))?;

        self.images.set(url.as_str(), body.clone(), content_type.clone());

        Ok(ProxyResponse::image(body, content_type, max_age, CacheStatus::Miss))
    }
}

fn ensure_read(method: Method) -> Result<(), ApiError> {
    if is_read_method(method) {
        Ok(())
    } else {
        Err(ApiError::MethodNotAllowed)
    }
}

fn parse_base(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        field,
        reason: e.to_string(),
    })?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl {
            field,
            reason: format!("{} cannot be a base URL", raw),
        });
    }

    Ok(url)
}

fn api_error(label: &str, error: UpstreamError) -> ApiError {
    match error {
        UpstreamError::Status { status, reason, body } => ApiError::upstream(
            status,
            format!("{} error: {} {}", label, status, reason).trim_end().to_string(),
            body,
        ),
        UpstreamError::MethodNotAllowed(_) => ApiError::MethodNotAllowed,
        UpstreamError::Timeout(after) => {
            ApiError::BadGateway(format!("{} timed out after {}s", label, after.as_secs()))
        }
        UpstreamError::NetworkError(_) => ApiError::BadGateway(format!("Unable to reach {}", label)),
    }
}

fn image_error(error: UpstreamError) -> ApiError {
    match error {
        UpstreamError::Status { status: 404, .. } => ApiError::upstream(404, "Image not found", None),
        UpstreamError::Status { status: 403, .. } => {
            ApiError::upstream(403, "Access forbidden - possible hotlink protection", None)
        }
        UpstreamError::Status { status, body, .. } => {
            ApiError::upstream(status, "Failed to fetch image", body)
        }
        UpstreamError::MethodNotAllowed(_) => ApiError::MethodNotAllowed,
        UpstreamError::Timeout(_) | UpstreamError::NetworkError(_) => {
            ApiError::BadGateway("Unable to fetch image from source".to_string())
        }
    }
}
