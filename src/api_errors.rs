use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-request failures surfaced to HTTP clients
#[derive(Debug, Error, PartialEq)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Inference(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Inference(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Error payload returned with every non-2xx prediction response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status();
        (code, Json(ErrorBody { detail: self.to_string() })).into_response()
    }
}

// Body that fails to parse or deserialize is a validation failure
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

// Backend failures reach clients as inference errors; rows are validated before inference
impl From<crate::errors::ForecastError> for ApiError {
    fn from(err: crate::errors::ForecastError) -> Self {
        ApiError::Inference(format!("Prediction failed: {err}"))
    }
}
