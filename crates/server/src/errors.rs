use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ErrorBody;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::error;

/// Failures of authenticated and business endpoints. The auth endpoint family
/// never returns these for credential problems; it answers `{success:false}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn unauthenticated() -> Self { ApiError::Unauthorized("authentication required".into()) }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(m) => ApiError::BadRequest(m),
            ServiceError::NotFound(m) => ApiError::NotFound(m),
            other => {
                error!(code = other.code(), error = %other, "service failure");
                ApiError::Internal
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(r: JsonRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_status() {
        assert_eq!(ApiError::from(ServiceError::not_found("project")).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(ServiceError::Validation("x".into())).status(), StatusCode::BAD_REQUEST);
        let internal = ApiError::from(ServiceError::Db("connection reset".into()));
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!internal.to_string().contains("connection"));
    }
}
