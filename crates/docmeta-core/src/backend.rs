use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::metadata::{DocumentMetadata, MetadataError};
use crate::{ExtractedText, prompt};

#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("failed to open PDF: {0}")]
    Open(String),
    #[error("failed to extract text: {0}")]
    Extraction(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for PDF text extraction backends.
///
/// Implementors turn raw uploaded bytes into plain text plus a page count.
/// Extraction is synchronous; the pipeline moves it onto the blocking pool.
pub trait TextExtractor: Send + Sync {
    /// Extract the full text content of an in-memory PDF.
    fn extract_text(&self, data: &[u8]) -> Result<ExtractedText, ExtractorError>;
}

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("schema validation failed: {0}")]
    Invalid(#[from] MetadataError),
}

/// What the pipeline hands to a [`MetadataGenerator`]: the (already
/// truncated) document text and the output schema the result must follow.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub text: String,
    pub schema: serde_json::Value,
}

impl GenerationRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            schema: DocumentMetadata::json_schema(),
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        prompt::SYSTEM_PROMPT
    }

    pub fn user_prompt(&self) -> String {
        prompt::build_user_prompt(&self.text)
    }
}

pub type GenerateFuture<'a> =
    Pin<Box<dyn Future<Output = Result<DocumentMetadata, GeneratorError>> + Send + 'a>>;

/// A hosted model that produces [`DocumentMetadata`] for a document.
pub trait MetadataGenerator: Send + Sync {
    /// Short provider name used in logs (e.g., "OpenAI").
    fn name(&self) -> &str;

    /// Generate schema-conformant metadata for the request.
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> GenerateFuture<'a>;
}
