use docmeta_core::ExtractionPipeline;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub pipeline: ExtractionPipeline,
    /// Request body cap applied to `/extract`.
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: ExtractionPipeline, max_upload_bytes: usize) -> Self {
        Self {
            pipeline,
            max_upload_bytes,
        }
    }
}
