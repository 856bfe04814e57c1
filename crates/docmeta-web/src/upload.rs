use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;

use docmeta_core::Upload;

/// Name of the multipart field carrying the PDF.
pub const FILE_FIELD: &str = "file";

/// Read the `file` field from a multipart upload.
///
/// Returns `Ok(None)` when the field is absent or was sent as a plain string
/// (no filename), so the pipeline can report it as a missing file. Other
/// fields are drained and ignored.
pub async fn read_upload(mut multipart: Multipart) -> Result<Option<Upload>, MultipartError> {
    let mut upload: Option<Upload> = None;

    while let Some(field) = multipart.next_field().await? {
        let is_file_field = field.name() == Some(FILE_FIELD);
        let filename = field.file_name().map(str::to_string);

        match (is_file_field, filename) {
            (true, Some(filename)) if upload.is_none() => {
                let data = field.bytes().await?.to_vec();
                tracing::debug!(filename = %filename, bytes = data.len(), "received upload");
                upload = Some(Upload::new(filename, data));
            }
            (true, None) => {
                tracing::debug!("`file` field sent as text, ignoring");
                let _ = field.bytes().await?;
            }
            _ => {
                // Ignore unknown fields
                let _ = field.bytes().await?;
            }
        }
    }

    Ok(upload)
}
