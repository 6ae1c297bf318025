#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use otakushelf_proxy::build_rocket;
use otakushelf_proxy::cache::ResponseCache;
use otakushelf_proxy::config::AppConfig;
use otakushelf_proxy::proxy::MangaProxy;
use otakushelf_proxy::upstream::{
    is_read_method, ResourceKind, Upstream, UpstreamError, UpstreamResponse,
};
use parking_lot::Mutex;
use reqwest::Url;
use rocket::http::Method;
use rocket::local::asynchronous::Client;

type Responder =
    Box<dyn Fn(ResourceKind, &Url) -> Result<UpstreamResponse, UpstreamError> + Send + Sync>;

/// Records every call and answers from a closure instead of the network.
pub struct FakeUpstream {
    calls: Mutex<Vec<(ResourceKind, Url)>>,
    respond: Responder,
}

impl FakeUpstream {
    pub fn new(
        respond: impl Fn(ResourceKind, &Url) -> Result<UpstreamResponse, UpstreamError>
            + Send
            + Sync
            + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        })
    }

    pub fn json(body: serde_json::Value) -> Arc<Self> {
        let body = serde_json::to_vec(&body).unwrap();
        Self::new(move |_, _| {
            Ok(UpstreamResponse {
                status: 200,
                content_type: "application/json".to_string(),
                body: body.clone(),
            })
        })
    }

    pub fn image(body: Vec<u8>, content_type: &'static str) -> Arc<Self> {
        Self::new(move |_, _| {
            Ok(UpstreamResponse {
                status: 200,
                content_type: content_type.to_string(),
                body: body.clone(),
            })
        })
    }

    pub fn status(status: u16, reason: &'static str, body: Option<&'static str>) -> Arc<Self> {
        Self::new(move |_, _| {
            Err(UpstreamError::Status {
                status,
                reason: reason.to_string(),
                body: body.map(str::to_string),
            })
        })
    }

    pub fn unreachable() -> Arc<Self> {
        Self::new(|_, _| Err(UpstreamError::NetworkError("connection refused".to_string())))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<(ResourceKind, Url)> {
        self.calls.lock().clone()
    }
}

#[rocket::async_trait]
impl Upstream for FakeUpstream {
    async fn fetch(
        &self,
        method: Method,
        kind: ResourceKind,
        url: &Url,
    ) -> Result<UpstreamResponse, UpstreamError> {
        if !is_read_method(method) {
            return Err(UpstreamError::MethodNotAllowed(method));
        }
        self.calls.lock().push((kind, url.clone()));
        (self.respond)(kind, url)
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        cache_sweep_interval: 0,
        placeholder_url: None,
        ..AppConfig::default()
    }
}

pub fn proxy(upstream: &Arc<FakeUpstream>) -> MangaProxy {
    let upstream: Arc<dyn Upstream> = upstream.clone();
    MangaProxy::new(&test_config(), upstream).unwrap()
}

pub fn proxy_with_image_ttl(upstream: &Arc<FakeUpstream>, ttl: Duration) -> MangaProxy {
    proxy(upstream).with_caches(
        Arc::new(ResponseCache::new(ttl)),
        Arc::new(ResponseCache::new(Duration::ZERO)),
    )
}

pub fn proxy_with_api_ttl(upstream: &Arc<FakeUpstream>, ttl: Duration) -> MangaProxy {
    let config = test_config();
    proxy(upstream).with_caches(
        Arc::new(ResponseCache::new(Duration::from_secs(config.image_cache_ttl))),
        Arc::new(ResponseCache::new(ttl)),
    )
}

pub async fn client(proxy: MangaProxy) -> Client {
    client_with_config(proxy, &test_config()).await
}

pub async fn client_with_config(proxy: MangaProxy, config: &AppConfig) -> Client {
    let figment = rocket::Config::figment().merge(("log_level", "off"));
    Client::tracked(build_rocket(figment, config, proxy))
        .await
        .expect("valid rocket instance")
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 60, 90]));
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut out), ImageOutputFormat::Png)
        .unwrap();
    out
}

/// Percent-encode a value for use in a request query string.
pub fn encode(value: &str) -> String {
    let mut url = Url::parse("http://localhost/").unwrap();
    url.query_pairs_mut().append_pair("v", value);
    url.query().unwrap()[2..].to_string()
}
