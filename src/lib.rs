#[macro_use]
extern crate rocket;

pub mod api;
pub mod cache;
pub mod config;
pub mod cors;
pub mod images;
pub mod models;
pub mod proxy;
pub mod query;
pub mod upstream;

use std::time::Duration;

use log::debug;
use rocket::fairing::AdHoc;
use rocket::figment::Figment;
use rocket::{Build, Rocket};

use config::AppConfig;
use cors::Cors;
use proxy::MangaProxy;

/// Assemble the server around an already constructed proxy service.
pub fn build_rocket(figment: Figment, config: &AppConfig, proxy: MangaProxy) -> Rocket<Build> {
    let sweep_every = Duration::from_secs(config.cache_sweep_interval);
    let image_cache = proxy.image_cache();
    let api_cache = proxy.api_cache();

    let rocket = rocket::custom(figment)
        .attach(Cors::new(config.allowed_origin.clone()))
        .manage(proxy)
        .manage(config.clone())
        .mount(config.base_path.as_str(), api::routes())
        .register(config.base_path.as_str(), api::catchers());

    if sweep_every.is_zero() {
        return rocket;
    }

    rocket.attach(AdHoc::on_liftoff("Cache sweeper", move |_| {
        Box::pin(async move {
            rocket::tokio::spawn(async move {
                let mut interval = rocket::tokio::time::interval(sweep_every);
                // the first tick completes immediately
                interval.tick().await;
                loop {
                    interval.tick().await;
                    let removed = image_cache.purge_expired() + api_cache.purge_expired();
                    debug!("Cache sweep removed {} expired entries", removed);
                }
            });
        })
    }))
}
