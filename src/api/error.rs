use std::io::Cursor;

use rocket::http::{ContentType, Status};
use thiserror::Error;

use crate::models::ErrorBody;
use crate::query::QueryError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    BadRequest(String),

    #[error("{error}")]
    UpstreamClientError {
        status: u16,
        error: String,
        details: Option<String>,
    },

    #[error("{error}")]
    UpstreamServerError {
        status: u16,
        error: String,
        details: Option<String>,
    },

    #[error("{0}")]
    BadGateway(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApiError {
    /// Classify a failed upstream status. Anything outside 4xx/5xx is treated as a gateway
    /// failure.
    pub fn upstream(status: u16, error: impl Into<String>, details: Option<String>) -> Self {
        let error = error.into();
        match status {
            400..=499 => ApiError::UpstreamClientError { status, error, details },
            500..=599 => ApiError::UpstreamServerError { status, error, details },
            _ => ApiError::BadGateway(error),
        }
    }

    pub fn status(&self) -> Status {
        match self {
            ApiError::MethodNotAllowed => Status::MethodNotAllowed,
            ApiError::BadRequest(_) => Status::BadRequest,
            ApiError::UpstreamClientError { status, .. }
            | ApiError::UpstreamServerError { status, .. } => Status::new(*status),
            ApiError::BadGateway(_) => Status::BadGateway,
            ApiError::InternalError(_) => Status::InternalServerError,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::MethodNotAllowed => ErrorBody {
                error: "Method not allowed".to_string(),
                details: None,
            },
            ApiError::BadRequest(message) | ApiError::BadGateway(message) => ErrorBody {
                error: message.clone(),
                details: None,
            },
            ApiError::UpstreamClientError { error, details, .. }
            | ApiError::UpstreamServerError { error, details, .. } => ErrorBody {
                error: error.clone(),
                details: details.clone(),
            },
            // local faults are never described to clients
            ApiError::InternalError(_) => ErrorBody {
                error: "Internal server error".to_string(),
                details: None,
            },
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(error: QueryError) -> Self {
        ApiError::BadRequest(error.to_string())
    }
}

impl<'r> rocket::response::Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'static> {
        let status = self.status();
        if status.code >= 500 {
            log::error!("{} {} failed: {}", req.method(), req.uri(), self);
        } else {
            log::warn!("{} {} rejected: {}", req.method(), req.uri(), self);
        }

        let body = match serde_json::to_string(&self.body()) {
            Ok(body) => body,
            Err(_) => r#"{"error":"Internal server error"}"#.to_string(),
        };

        rocket::Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}
