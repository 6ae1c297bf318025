use std::env;

use log::warn;
use rocket::figment::{
    providers::{Format, Serialized, Toml},
    Figment, Profile,
};
use rocket::Config;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("HTTP client error: {0}")]
    ClientError(String),
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub port: u16,
    pub address: String,
    pub api_base_url: String,
    pub image_base_url: String,
    pub allowed_image_hosts: Vec<String>,
    pub allowed_origin: String,
    pub base_path: String,
    pub timeout: u64,
    pub image_timeout: u64,
    pub user_agent: String,
    pub referer: String,
    pub image_cache_ttl: u64,
    pub api_cache_ttl: u64,
    pub cache_sweep_interval: u64,
    pub transcode: TranscodeConfig,
    pub placeholder_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            address: "127.0.0.1".to_string(),
            api_base_url: "https://api.mangadex.org".to_string(),
            image_base_url: "https://uploads.mangadex.org".to_string(),
            allowed_image_hosts: vec!["uploads.mangadex.org".to_string()],
            allowed_origin: "*".to_string(),
            base_path: "/".to_string(),
            timeout: 15,
            image_timeout: 30,
            user_agent: "OtakuShelf/1.0.0".to_string(),
            referer: "https://mangadex.org/".to_string(),
            image_cache_ttl: 86400,
            api_cache_ttl: 0,
            cache_sweep_interval: 3600,
            transcode: TranscodeConfig::default(),
            placeholder_url: Some("https://placehold.co/256x384/2a2a4e/c77dff/png".to_string()),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TranscodeConfig {
    pub enabled: bool,
    pub max_width: u32,
    pub max_height: u32,
    pub quality: u8,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_width: 500,
            max_height: 750,
            quality: 85,
        }
    }
}

/// Layers Rocket defaults, `App.toml` and environment overrides, then selects the
/// profile named by `APP_PROFILE`.
pub fn figment() -> Figment {
    let figment = Figment::from(Config::default()).merge(Toml::file("App.toml").nested());
    with_env_overrides(figment, |name| env::var(name).ok())
        .select(Profile::from_env_or("APP_PROFILE", "default"))
}

// Overrides are global so they beat every profile in App.toml
fn with_env_overrides(mut figment: Figment, var: impl Fn(&str) -> Option<String>) -> Figment {
    if let Some(api_base) = var("MANGA_API_BASE") {
        figment = figment.merge(Serialized::global("api_base_url", api_base));
    }

    if let Some(image_base) = var("IMAGE_HOST_BASE") {
        figment = figment.merge(Serialized::global("image_base_url", image_base));
    }

    if let Some(hosts) = var("ALLOWED_IMAGE_HOSTS") {
        figment = figment.merge(Serialized::global(
            "allowed_image_hosts",
            hosts
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<String>>(),
        ));
    }

    // FRONTEND_URL is the older name for the CORS origin
    if let Some(origin) = var("ALLOWED_ORIGIN").or_else(|| var("FRONTEND_URL")) {
        figment = figment.merge(Serialized::global("allowed_origin", origin));
    }

    if let Some(port) = var("PORT") {
        match port.parse::<u16>() {
            Ok(port) => figment = figment.merge(Serialized::global("port", port)),
            Err(e) => warn!("Ignoring invalid PORT '{}': {}", port, e),
        }
    }

    if let Some(ttl) = var("CACHE_TTL_SECONDS") {
        match ttl.parse::<u64>() {
            Ok(ttl) => figment = figment.merge(Serialized::global("image_cache_ttl", ttl)),
            Err(e) => warn!("Ignoring invalid CACHE_TTL_SECONDS '{}': {}", ttl, e),
        }
    }

    figment
}
