use chrono::Utc;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Request, State};

use crate::api::ApiError;
use crate::models::{CacheStatsResponse, ErrorBody, HealthStatus, MessageBody};
use crate::proxy::MangaProxy;

#[get("/health")]
pub fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "OK",
        timestamp: Utc::now(),
    })
}

#[get("/cache-stats")]
pub fn cache_stats(proxy: &State<MangaProxy>) -> Json<CacheStatsResponse> {
    Json(proxy.cache_stats())
}

#[post("/cache-clear")]
pub fn cache_clear(proxy: &State<MangaProxy>) -> Json<MessageBody> {
    proxy.clear_caches();
    Json(MessageBody {
        message: "Cache cleared successfully",
    })
}

// Preflight requests are answered here; the CORS fairing adds the headers
#[options("/<_..>")]
pub fn preflight() -> Status {
    Status::Ok
}

#[post("/<_..>", rank = 100)]
pub fn post_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[put("/<_..>", rank = 100)]
pub fn put_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[delete("/<_..>", rank = 100)]
pub fn delete_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[patch("/<_..>", rank = 100)]
pub fn patch_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

fn error_json(message: &str) -> Json<ErrorBody> {
    Json(ErrorBody {
        error: message.to_string(),
        details: None,
    })
}

#[catch(400)]
pub fn bad_request() -> Json<ErrorBody> {
    error_json("Bad request")
}

#[catch(404)]
pub fn not_found(req: &Request<'_>) -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "Not found".to_string(),
        details: Some(req.uri().path().to_string()),
    })
}

#[catch(422)]
pub fn unprocessable() -> Json<ErrorBody> {
    error_json("Invalid request parameters")
}

#[catch(500)]
pub fn internal_error() -> Json<ErrorBody> {
    error_json("Internal server error")
}
