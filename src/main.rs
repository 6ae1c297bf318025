#[macro_use]
extern crate rocket;

use std::process;
use std::sync::Arc;

use dotenv::dotenv;
use env_logger::Env;
use log::{error, info};

use otakushelf_proxy::config::{self, AppConfig};
use otakushelf_proxy::proxy::MangaProxy;
use otakushelf_proxy::upstream::HttpUpstream;

#[launch]
async fn rocket() -> _ {
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    // Load config
    let figment = config::figment();
    let config = match figment.extract::<AppConfig>() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };
    info!("Configuration loaded successfully");

    let upstream = match HttpUpstream::new(&config) {
        Ok(upstream) => upstream,
        Err(e) => {
            error!("Failed to initialize upstream client: {}", e);
            process::exit(1);
        }
    };

    let proxy = match MangaProxy::new(&config, Arc::new(upstream)) {
        Ok(proxy) => proxy,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    info!("MangaDex API proxy: {}", config.api_base_url);
    info!(
        "Image proxy allows: {} (cache TTL {}s, transcoding {})",
        proxy.allowed_image_hosts().join(", "),
        config.image_cache_ttl,
        if config.transcode.enabled { "on" } else { "off" }
    );
    info!("CORS origin: {}", config.allowed_origin);
    info!(
        "Starting Otaku Shelf proxy on {}:{}",
        config.address, config.port
    );

    otakushelf_proxy::build_rocket(figment, &config, proxy)
}
