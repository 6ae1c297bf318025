pub mod admin;
mod error;
pub mod images;
pub mod manga;
mod responses;

pub use error::ApiError;

use rocket::{Catcher, Route};

pub fn routes() -> Vec<Route> {
    routes![
        manga::manga_list,
        manga::manga_detail,
        manga::chapter_list,
        manga::chapter_detail,
        manga::chapter_pages,
        manga::manga_statistics,
        manga::at_home_server,
        manga::passthrough,
        images::proxy_image,
        images::cover,
        admin::health,
        admin::cache_stats,
        admin::cache_clear,
        admin::preflight,
        admin::post_not_allowed,
        admin::put_not_allowed,
        admin::delete_not_allowed,
        admin::patch_not_allowed,
    ]
}

pub fn catchers() -> Vec<Catcher> {
    catchers![
        admin::bad_request,
        admin::not_found,
        admin::unprocessable,
        admin::internal_error,
    ]
}
