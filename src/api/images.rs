use rocket::http::uri::Origin;
use rocket::http::Method;
use rocket::State;

use crate::api::ApiError;
use crate::proxy::{MangaProxy, ProxyResponse};
use crate::query::QueryParams;

#[get("/image-proxy")]
pub async fn proxy_image(
    method: Method,
    origin: &Origin<'_>,
    proxy: &State<MangaProxy>,
) -> Result<ProxyResponse, ApiError> {
    let params = QueryParams::parse(origin.query().map(|q| q.as_str()))?;
    let url = params.get("url").and_then(|value| value.first());

    log::debug!("Proxying image, URL: {:?}", url);

    proxy.proxy_image(method, url).await
}

#[get("/cover/<manga_id>/<file_name>?<title>")]
pub async fn cover(
    manga_id: &str,
    file_name: &str,
    title: Option<&str>,
    method: Method,
    proxy: &State<MangaProxy>,
) -> Result<ProxyResponse, ApiError> {
    proxy.cover(method, manga_id, file_name, title).await
}
