//! The fixed output schema the metadata generator must conform to.

use std::fmt;

use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TOPICS_RANGE: (usize, usize) = (3, 5);
pub const KEYWORDS_RANGE: (usize, usize) = (5, 10);

/// Closed set of document kinds the generator may choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Report,
    Article,
    Letter,
    Contract,
    Manual,
    Presentation,
    AcademicPaper,
    Invoice,
    Resume,
    Other,
}

impl DocumentType {
    pub const ALL: [DocumentType; 10] = [
        DocumentType::Report,
        DocumentType::Article,
        DocumentType::Letter,
        DocumentType::Contract,
        DocumentType::Manual,
        DocumentType::Presentation,
        DocumentType::AcademicPaper,
        DocumentType::Invoice,
        DocumentType::Resume,
        DocumentType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Report => "report",
            DocumentType::Article => "article",
            DocumentType::Letter => "letter",
            DocumentType::Contract => "contract",
            DocumentType::Manual => "manual",
            DocumentType::Presentation => "presentation",
            DocumentType::AcademicPaper => "academic_paper",
            DocumentType::Invoice => "invoice",
            DocumentType::Resume => "resume",
            DocumentType::Other => "other",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("field `{0}` must not be empty")]
    EmptyField(&'static str),
    #[error("field `{field}` has {len} items, expected {min} to {max}")]
    ListLength {
        field: &'static str,
        len: usize,
        min: usize,
        max: usize,
    },
}

/// Structured metadata describing one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// The document title. Infer a descriptive title if none is stated.
    pub title: String,
    /// The author or issuing organization, or null if not identifiable.
    pub author: Option<String>,
    /// A 2-3 sentence summary of the document.
    pub summary: String,
    /// 3-5 main topics covered by the document.
    pub topics: Vec<String>,
    /// 5-10 keywords for search and indexing.
    pub keywords: Vec<String>,
    pub document_type: DocumentType,
}

impl DocumentMetadata {
    /// JSON schema for this type as produced by `schemars`.
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schema_for!(DocumentMetadata)).unwrap_or_default()
    }

    /// Check the constraints the type system does not express.
    pub fn validate(&self) -> Result<(), MetadataError> {
        if self.title.trim().is_empty() {
            return Err(MetadataError::EmptyField("title"));
        }
        if self.summary.trim().is_empty() {
            return Err(MetadataError::EmptyField("summary"));
        }
        check_len("topics", &self.topics, TOPICS_RANGE)?;
        check_len("keywords", &self.keywords, KEYWORDS_RANGE)?;
        Ok(())
    }
}

fn check_len(
    field: &'static str,
    items: &[String],
    (min, max): (usize, usize),
) -> Result<(), MetadataError> {
    let len = items.len();
    if len < min || len > max {
        return Err(MetadataError::ListLength {
            field,
            len,
            min,
            max,
        });
    }
    if items.iter().any(|s| s.trim().is_empty()) {
        return Err(MetadataError::EmptyField(field));
    }
    Ok(())
}
