use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use docmeta_core::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            service: "docmeta".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Everything a handler can fail with, rendered as `{ "error": ... }`.
#[derive(Debug)]
pub enum ApiError {
    Pipeline(PipelineError),
    /// The multipart body itself could not be read.
    Multipart { status: StatusCode, message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Pipeline(e) => StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::Multipart { status, .. } => *status,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::Pipeline(e) => e.to_string(),
            ApiError::Multipart { message, .. } => message.clone(),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        ApiError::Pipeline(e)
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::Multipart {
            status: e.status(),
            message: format!("Failed to read upload: {}", e.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.message(), "request failed");
        } else {
            tracing::debug!(status = %status, error = %self.message(), "request rejected");
        }
        (
            status,
            Json(ErrorBody {
                error: self.message(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_map_to_status_codes() {
        let cases = [
            (PipelineError::MissingFile, StatusCode::BAD_REQUEST),
            (
                PipelineError::UnsupportedFileType("notes.txt".into()),
                StatusCode::BAD_REQUEST,
            ),
            (PipelineError::NoTextContent, StatusCode::UNPROCESSABLE_ENTITY),
            (
                PipelineError::ExtractionFailed("bad xref".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                PipelineError::GenerationFailed("timeout".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn health_has_constant_shape() {
        let value = serde_json::to_value(HealthResponse::ok()).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["service"], "docmeta");
        assert!(value["version"].is_string());
    }
}
