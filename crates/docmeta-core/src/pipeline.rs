//! The extraction pipeline: one upload in, one [`ResponseEnvelope`] out.
//!
//! Stages run strictly in order and stop at the first failure:
//! 1. presence check (`MissingFile`)
//! 2. `.pdf` extension check (`UnsupportedFileType`)
//! 3. text extraction on the blocking pool (`ExtractionFailed`)
//! 4. blank-text guard (`NoTextContent`)
//! 5. prompt truncation to the character budget
//! 6. structured generation (`GenerationFailed`)
//! 7. envelope assembly
//!
//! Nothing is retried. Both collaborator calls are bounded by a timeout.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::prompt::truncate_chars;
use crate::{
    Config, DocumentMetadata, ExtractedText, GenerationRequest, MetadataGenerator,
    ResponseEnvelope, TextExtractor, Upload,
};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No file uploaded. Please provide a PDF file in the 'file' field.")]
    MissingFile,
    #[error("Only PDF files are accepted. Received: {0}")]
    UnsupportedFileType(String),
    #[error(
        "Could not extract text from the PDF. The file may be a scanned image without a text layer."
    )]
    NoTextContent,
    #[error("Failed to extract text from PDF: {0}")]
    ExtractionFailed(String),
    #[error("Failed to generate metadata: {0}")]
    GenerationFailed(String),
}

impl PipelineError {
    /// HTTP status code this error is reported with.
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::MissingFile | PipelineError::UnsupportedFileType(_) => 400,
            PipelineError::NoTextContent => 422,
            PipelineError::ExtractionFailed(_) | PipelineError::GenerationFailed(_) => 500,
        }
    }
}

/// The text half of the pipeline: presence and extension checks, bounded
/// extraction, and the blank-text guard. Usable without a generator.
pub struct TextExtraction {
    extractor: Arc<dyn TextExtractor>,
    timeout: Duration,
}

impl TextExtraction {
    pub fn new(extractor: Arc<dyn TextExtractor>, config: &Config) -> Self {
        Self {
            extractor,
            timeout: config.extract_timeout(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate the upload and pull non-blank text out of it.
    ///
    /// Returns the filename alongside the text for logging by the caller.
    pub async fn run(
        &self,
        upload: Option<Upload>,
    ) -> Result<(String, ExtractedText), PipelineError> {
        let upload = upload.ok_or(PipelineError::MissingFile)?;

        if !upload.has_pdf_extension() {
            tracing::debug!(filename = %upload.filename, "rejecting non-PDF upload");
            return Err(PipelineError::UnsupportedFileType(upload.filename));
        }

        let Upload { filename, data } = upload;
        tracing::debug!(filename = %filename, bytes = data.len(), "extracting text");

        let extracted = self.extract_text(data).await.inspect_err(|e| {
            tracing::warn!(filename = %filename, error = %e, "text extraction failed");
        })?;

        if extracted.is_blank() {
            tracing::warn!(
                filename = %filename,
                pages = extracted.page_count,
                "no extractable text"
            );
            return Err(PipelineError::NoTextContent);
        }

        Ok((filename, extracted))
    }

    /// Run the synchronous extractor on the blocking pool, bounded by the
    /// extraction timeout.
    async fn extract_text(&self, data: Vec<u8>) -> Result<ExtractedText, PipelineError> {
        let extractor = Arc::clone(&self.extractor);
        let handle = tokio::task::spawn_blocking(move || extractor.extract_text(&data));

        // Blocking tasks cannot be cancelled. On timeout the task is
        // detached and keeps its pool thread until the extractor returns.
        match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(Ok(extracted))) => Ok(extracted),
            Ok(Ok(Err(e))) => Err(PipelineError::ExtractionFailed(e.to_string())),
            Ok(Err(join_err)) => Err(PipelineError::ExtractionFailed(format!(
                "extraction task failed: {join_err}"
            ))),
            Err(_) => Err(PipelineError::ExtractionFailed(format!(
                "timed out after {}s",
                self.timeout.as_secs_f64()
            ))),
        }
    }
}

pub struct ExtractionPipeline {
    text: TextExtraction,
    generator: Arc<dyn MetadataGenerator>,
    max_prompt_chars: usize,
    generate_timeout: Duration,
}

impl ExtractionPipeline {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        generator: Arc<dyn MetadataGenerator>,
        config: &Config,
    ) -> Self {
        Self {
            text: TextExtraction::new(extractor, config),
            generator,
            max_prompt_chars: config.max_prompt_chars,
            generate_timeout: config.generate_timeout(),
        }
    }

    pub fn with_extract_timeout(mut self, timeout: Duration) -> Self {
        self.text = self.text.with_timeout(timeout);
        self
    }

    pub fn with_generate_timeout(mut self, timeout: Duration) -> Self {
        self.generate_timeout = timeout;
        self
    }

    /// Run one upload through every stage.
    ///
    /// `None` means the request carried no binary `file` field.
    pub async fn extract(&self, upload: Option<Upload>) -> Result<ResponseEnvelope, PipelineError> {
        let (filename, extracted) = self.text.run(upload).await?;

        let (prompt_text, truncated) = truncate_chars(&extracted.text, self.max_prompt_chars);
        if truncated {
            tracing::debug!(
                filename = %filename,
                chars = extracted.char_len(),
                budget = self.max_prompt_chars,
                "truncating prompt text"
            );
        }
        let request = GenerationRequest::new(prompt_text);

        let metadata = self.generate(&request).await.inspect_err(|e| {
            tracing::warn!(filename = %filename, error = %e, "metadata generation failed");
        })?;

        tracing::info!(
            filename = %filename,
            pages = extracted.page_count,
            document_type = %metadata.document_type,
            truncated,
            "extraction complete"
        );

        Ok(ResponseEnvelope::new(metadata, extracted, truncated))
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<DocumentMetadata, PipelineError> {
        let provider = self.generator.name();
        tracing::debug!(provider, bytes = request.text.len(), "requesting metadata");

        let metadata =
            match tokio::time::timeout(self.generate_timeout, self.generator.generate(request)).await
            {
                Ok(Ok(metadata)) => metadata,
                Ok(Err(e)) => return Err(PipelineError::GenerationFailed(e.to_string())),
                Err(_) => {
                    return Err(PipelineError::GenerationFailed(format!(
                        "{provider} timed out after {}s",
                        self.generate_timeout.as_secs_f64()
                    )));
                }
            };

        metadata
            .validate()
            .map_err(|e| PipelineError::GenerationFailed(format!("invalid metadata: {e}")))?;

        Ok(metadata)
    }
}
