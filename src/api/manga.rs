use std::path::PathBuf;

use rocket::http::uri::Origin;
use rocket::http::Method;
use rocket::serde::json::Json;
use rocket::State;

use crate::api::ApiError;
use crate::models::ChapterPages;
use crate::proxy::{ApiRoute, MangaProxy, ProxyResponse};
use crate::query::QueryParams;

fn query_params(origin: &Origin<'_>) -> Result<QueryParams, ApiError> {
    Ok(QueryParams::parse(origin.query().map(|q| q.as_str()))?)
}

#[get("/manga")]
pub async fn manga_list(
    method: Method,
    origin: &Origin<'_>,
    proxy: &State<MangaProxy>,
) -> Result<ProxyResponse, ApiError> {
    let params = query_params(origin)?;
    proxy.proxy_json(method, ApiRoute::MangaList, &params).await
}

#[get("/manga/<id>")]
pub async fn manga_detail(
    id: &str,
    method: Method,
    origin: &Origin<'_>,
    proxy: &State<MangaProxy>,
) -> Result<ProxyResponse, ApiError> {
    let params = query_params(origin)?;
    proxy.proxy_json(method, ApiRoute::Manga(id), &params).await
}

#[get("/chapter")]
pub async fn chapter_list(
    method: Method,
    origin: &Origin<'_>,
    proxy: &State<MangaProxy>,
) -> Result<ProxyResponse, ApiError> {
    let params = query_params(origin)?;
    proxy.proxy_json(method, ApiRoute::ChapterList, &params).await
}

#[get("/chapter/<id>")]
pub async fn chapter_detail(
    id: &str,
    method: Method,
    origin: &Origin<'_>,
    proxy: &State<MangaProxy>,
) -> Result<ProxyResponse, ApiError> {
    let params = query_params(origin)?;
    proxy.proxy_json(method, ApiRoute::Chapter(id), &params).await
}

#[get("/chapter/<id>/pages?<data_saver>")]
pub async fn chapter_pages(
    id: &str,
    data_saver: Option<bool>,
    method: Method,
    proxy: &State<MangaProxy>,
) -> Result<Json<ChapterPages>, ApiError> {
    let pages = proxy
        .chapter_pages(method, id, data_saver.unwrap_or(true))
        .await?;
    Ok(Json(pages))
}

#[get("/statistics/manga")]
pub async fn manga_statistics(
    method: Method,
    origin: &Origin<'_>,
    proxy: &State<MangaProxy>,
) -> Result<ProxyResponse, ApiError> {
    let params = query_params(origin)?;
    proxy
        .proxy_json(method, ApiRoute::MangaStatistics, &params)
        .await
}

#[get("/at-home/server/<id>")]
pub async fn at_home_server(
    id: &str,
    method: Method,
    origin: &Origin<'_>,
    proxy: &State<MangaProxy>,
) -> Result<ProxyResponse, ApiError> {
    let params = query_params(origin)?;
    proxy
        .proxy_json(method, ApiRoute::AtHomeServer(id), &params)
        .await
}

#[get("/mangadex/<path..>")]
pub async fn passthrough(
    path: PathBuf,
    method: Method,
    origin: &Origin<'_>,
    proxy: &State<MangaProxy>,
) -> Result<ProxyResponse, ApiError> {
    let path = path
        .iter()
        .filter_map(|segment| segment.to_str())
        .collect::<Vec<_>>()
        .join("/");
    if path.is_empty() {
        return Err(ApiError::BadRequest("Upstream path is required".to_string()));
    }

    let params = query_params(origin)?;
    proxy
        .proxy_json(method, ApiRoute::Passthrough(&path), &params)
        .await
}
