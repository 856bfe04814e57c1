//! Hand-rolled collaborator mocks for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::{
    DocumentMetadata, DocumentType, ExtractedText, ExtractorError, GenerateFuture,
    GenerationRequest, GeneratorError, MetadataGenerator, TextExtractor,
};

/// Metadata that passes [`DocumentMetadata::validate`].
pub fn sample_metadata() -> DocumentMetadata {
    DocumentMetadata {
        title: "Annual Operations Report".to_string(),
        author: Some("Operations Team".to_string()),
        summary: "Summarizes operations for the year. Highlights cost savings.".to_string(),
        topics: vec![
            "operations".to_string(),
            "budget".to_string(),
            "staffing".to_string(),
        ],
        keywords: vec![
            "annual".to_string(),
            "report".to_string(),
            "costs".to_string(),
            "efficiency".to_string(),
            "planning".to_string(),
        ],
        document_type: DocumentType::Report,
    }
}

/// A configurable response for [`MockExtractor`].
#[derive(Clone, Debug)]
pub enum MockExtraction {
    Text { text: String, page_count: usize },
    Fail(String),
}

/// A mock implementing [`TextExtractor`] that counts its calls.
pub struct MockExtractor {
    response: MockExtraction,
    delay: Option<Duration>,
    call_count: AtomicUsize,
}

impl MockExtractor {
    pub fn new(response: MockExtraction) -> Self {
        Self {
            response,
            delay: None,
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn with_text(text: impl Into<String>, page_count: usize) -> Self {
        Self::new(MockExtraction::Text {
            text: text.into(),
            page_count,
        })
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(MockExtraction::Fail(message.into()))
    }

    /// Block the calling thread for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl TextExtractor for MockExtractor {
    fn extract_text(&self, _data: &[u8]) -> Result<ExtractedText, ExtractorError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        match &self.response {
            MockExtraction::Text { text, page_count } => {
                Ok(ExtractedText::new(text.clone(), *page_count))
            }
            MockExtraction::Fail(msg) => Err(ExtractorError::Open(msg.clone())),
        }
    }
}

/// A configurable response for [`MockGenerator`].
#[derive(Clone, Debug)]
pub enum MockGeneration {
    Metadata(DocumentMetadata),
    Fail(String),
}

/// A mock implementing [`MetadataGenerator`] that records every request.
pub struct MockGenerator {
    response: MockGeneration,
    delay: Option<Duration>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerator {
    pub fn new(response: MockGeneration) -> Self {
        Self {
            response,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn returning(metadata: DocumentMetadata) -> Self {
        Self::new(MockGeneration::Metadata(metadata))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(MockGeneration::Fail(message.into()))
    }

    /// Sleep (asynchronously) for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Text of the most recent request, if any.
    pub fn last_text(&self) -> Option<String> {
        self.requests
            .lock()
            .ok()
            .and_then(|r| r.last().map(|req| req.text.clone()))
    }
}

impl MetadataGenerator for MockGenerator {
    fn name(&self) -> &str {
        "Mock"
    }

    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> GenerateFuture<'a> {
        Box::pin(async move {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request.clone());
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.response {
                MockGeneration::Metadata(m) => Ok(m.clone()),
                MockGeneration::Fail(msg) => Err(GeneratorError::Api(msg.clone())),
            }
        })
    }
}
