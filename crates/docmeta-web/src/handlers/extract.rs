use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use std::sync::Arc;

use docmeta_core::ResponseEnvelope;

use crate::models::ApiError;
use crate::state::AppState;
use crate::upload;

/// `POST /extract`: run the uploaded PDF through the extraction pipeline.
///
/// A request that is not multipart at all is treated the same as a form
/// without a `file` field.
pub async fn extract(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ResponseEnvelope>, ApiError> {
    let upload = match multipart {
        Ok(multipart) => upload::read_upload(multipart).await?,
        Err(rejection) => {
            tracing::debug!(reason = %rejection.body_text(), "request is not multipart");
            None
        }
    };

    let envelope = state.pipeline.extract(upload).await?;
    Ok(Json(envelope))
}
