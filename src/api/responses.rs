use std::io::Cursor;

use rocket::http::{ContentType, Header, Status};
use rocket::{request::Request, response::{self, Responder, Response}};

use crate::proxy::ProxyResponse;
use crate::upstream::ResourceKind;

impl<'r> Responder<'r, 'static> for ProxyResponse {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let content_type =
            ContentType::parse_flexible(&self.content_type).unwrap_or(ContentType::Binary);
        let cache_status = Header::new("X-Cache", self.cache_status.as_str());
        let cache_control = Header::new("Cache-Control", self.cache_control);

        if self.kind == ResourceKind::Image {
            let etag = format!("\"{:x}\"", md5::compute(&self.body));
            // Check If-None-Match header
            if req.headers().get_one("If-None-Match") == Some(etag.as_str()) {
                return Response::build()
                    .status(Status::NotModified)
                    .header(Header::new("ETag", etag))
                    .header(cache_control)
                    .header(cache_status)
                    .ok();
            }

            return Response::build()
                .status(Status::new(self.status))
                .header(content_type)
                .header(cache_control)
                .header(cache_status)
                .header(Header::new("ETag", etag))
                .sized_body(self.body.len(), Cursor::new(self.body))
                .ok();
        }

        Response::build()
            .status(Status::new(self.status))
            .header(content_type)
            .header(cache_control)
            .header(cache_status)
            .sized_body(self.body.len(), Cursor::new(self.body))
            .ok()
    }
}
