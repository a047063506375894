use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use smartcenter_shared::InvalidStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unknown district {0:?}")]
    UnknownDistrict(String),
    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatus),
    #[error("failed to encode status event: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownDistrict(_) | Self::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            Self::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
