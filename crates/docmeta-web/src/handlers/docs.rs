use axum::Json;
use axum::response::Html;

use crate::openapi::{self, OPENAPI_PATH};
use crate::template;

pub async fn openapi_json() -> Json<serde_json::Value> {
    Json(openapi::document())
}

pub async fn docs() -> Html<String> {
    template::render_docs(OPENAPI_PATH)
}
