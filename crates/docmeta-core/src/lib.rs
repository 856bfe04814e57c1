use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod backend;
pub mod config_file;
pub mod metadata;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod pipeline;
pub mod prompt;

// Re-export for convenience
pub use backend::{
    ExtractorError, GenerateFuture, GenerationRequest, GeneratorError, MetadataGenerator,
    TextExtractor,
};
pub use config_file::ConfigFile;
pub use metadata::{DocumentMetadata, DocumentType, MetadataError};
pub use pipeline::{ExtractionPipeline, PipelineError, TextExtraction};
pub use prompt::DEFAULT_MAX_PROMPT_CHARS;

/// A file received from a client, alive for the duration of one request.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }

    /// Extension check only; content is not sniffed.
    pub fn has_pdf_extension(&self) -> bool {
        self.filename.to_lowercase().ends_with(".pdf")
    }
}

/// Plain text pulled out of a PDF together with its page count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: usize,
}

impl ExtractedText {
    pub fn new(text: impl Into<String>, page_count: usize) -> Self {
        Self {
            text: text.into(),
            page_count,
        }
    }

    /// True when there is nothing but whitespace (e.g. scanned image pages).
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Length in characters, not bytes.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub page_count: usize,
    pub text_length: usize,
}

/// The JSON body returned for a successful extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub success: bool,
    pub metadata: DocumentMetadata,
    pub raw_text: String,
    pub stats: DocumentStats,
    /// Whether the text sent to the model was cut to the prompt budget.
    /// `raw_text` is never truncated.
    pub truncated: bool,
}

impl ResponseEnvelope {
    pub fn new(metadata: DocumentMetadata, extracted: ExtractedText, truncated: bool) -> Self {
        let stats = DocumentStats {
            page_count: extracted.page_count,
            text_length: extracted.char_len(),
        };
        Self {
            success: true,
            metadata,
            raw_text: extracted.text,
            stats,
            truncated,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Process-wide settings, built once at startup and passed to constructors.
#[derive(Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub model: String,
    pub max_prompt_chars: usize,
    pub extract_timeout_secs: u64,
    pub generate_timeout_secs: u64,
    pub bind_addr: String,
    pub max_upload_mb: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "***"))
            .field("openai_base_url", &self.openai_base_url)
            .field("model", &self.model)
            .field("max_prompt_chars", &self.max_prompt_chars)
            .field("extract_timeout_secs", &self.extract_timeout_secs)
            .field("generate_timeout_secs", &self.generate_timeout_secs)
            .field("bind_addr", &self.bind_addr)
            .field("max_upload_mb", &self.max_upload_mb)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
            extract_timeout_secs: 60,
            generate_timeout_secs: 120,
            bind_addr: "0.0.0.0:3000".to_string(),
            max_upload_mb: 50,
        }
    }
}

impl Config {
    /// Load from the config file cascade, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(config_file::load_config(), |key| std::env::var(key).ok())
    }

    /// Build a config from a parsed file and an environment lookup.
    /// Environment values win over file values, which win over defaults.
    pub fn from_sources(
        file: ConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(openai) = file.openai {
            config.openai_api_key = openai.api_key.or(config.openai_api_key);
            config.openai_base_url = openai.base_url.unwrap_or(config.openai_base_url);
            config.model = openai.model.unwrap_or(config.model);
        }
        if let Some(pipeline) = file.pipeline {
            config.max_prompt_chars = pipeline.max_prompt_chars.unwrap_or(config.max_prompt_chars);
            config.extract_timeout_secs = pipeline
                .extract_timeout_secs
                .unwrap_or(config.extract_timeout_secs);
            config.generate_timeout_secs = pipeline
                .generate_timeout_secs
                .unwrap_or(config.generate_timeout_secs);
        }
        if let Some(server) = file.server {
            config.bind_addr = server.bind_addr.unwrap_or(config.bind_addr);
            config.max_upload_mb = server.max_upload_mb.unwrap_or(config.max_upload_mb);
        }

        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("OPENAI_API_KEY") {
            config.openai_api_key = Some(key);
        }
        if let Some(url) = non_empty("OPENAI_BASE_URL") {
            config.openai_base_url = url;
        }
        if let Some(model) = non_empty("DOCMETA_MODEL") {
            config.model = model;
        }
        if let Some(addr) = non_empty("DOCMETA_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(v) = non_empty("DOCMETA_MAX_PROMPT_CHARS") {
            config.max_prompt_chars = parse_env("DOCMETA_MAX_PROMPT_CHARS", v)?;
        }
        if let Some(v) = non_empty("DOCMETA_EXTRACT_TIMEOUT_SECS") {
            config.extract_timeout_secs = parse_env("DOCMETA_EXTRACT_TIMEOUT_SECS", v)?;
        }
        if let Some(v) = non_empty("DOCMETA_GENERATE_TIMEOUT_SECS") {
            config.generate_timeout_secs = parse_env("DOCMETA_GENERATE_TIMEOUT_SECS", v)?;
        }
        if let Some(v) = non_empty("DOCMETA_MAX_UPLOAD_MB") {
            config.max_upload_mb = parse_env("DOCMETA_MAX_UPLOAD_MB", v)?;
        }

        Ok(config)
    }

    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_secs)
    }

    pub fn generate_timeout(&self) -> Duration {
        Duration::from_secs(self.generate_timeout_secs)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn upload_extension_check_is_case_insensitive() {
        assert!(Upload::new("report.pdf", vec![]).has_pdf_extension());
        assert!(Upload::new("REPORT.PDF", vec![]).has_pdf_extension());
        assert!(Upload::new("a.b.Pdf", vec![]).has_pdf_extension());
        assert!(!Upload::new("notes.txt", vec![]).has_pdf_extension());
        assert!(!Upload::new("pdf", vec![]).has_pdf_extension());
        assert!(!Upload::new("report.pdf.txt", vec![]).has_pdf_extension());
    }

    #[test]
    fn blank_text_detection() {
        assert!(ExtractedText::new("", 0).is_blank());
        assert!(ExtractedText::new(" \n\t\r\n ", 3).is_blank());
        assert!(!ExtractedText::new("  x ", 1).is_blank());
    }

    #[test]
    fn defaults_without_file_or_env() {
        let config = Config::from_sources(ConfigFile::default(), env_of(&[])).unwrap();
        assert_eq!(config.max_prompt_chars, 15_000);
        assert_eq!(config.extract_timeout(), Duration::from_secs(60));
        assert_eq!(config.generate_timeout(), Duration::from_secs(120));
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.max_upload_bytes(), 50 * 1024 * 1024);
    }

    #[test]
    fn env_overrides_file() {
        let file: ConfigFile = toml::from_str(
            "[openai]\napi_key = \"from-file\"\nmodel = \"file-model\"\n\
             [pipeline]\nmax_prompt_chars = 500\n",
        )
        .unwrap();
        let config = Config::from_sources(
            file,
            env_of(&[("OPENAI_API_KEY", "from-env"), ("DOCMETA_EXTRACT_TIMEOUT_SECS", "5")]),
        )
        .unwrap();
        assert_eq!(config.openai_api_key.as_deref(), Some("from-env"));
        assert_eq!(config.model, "file-model");
        assert_eq!(config.max_prompt_chars, 500);
        assert_eq!(config.extract_timeout_secs, 5);
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let config =
            Config::from_sources(ConfigFile::default(), env_of(&[("OPENAI_API_KEY", "  ")]))
                .unwrap();
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn invalid_numeric_env_is_an_error() {
        let err = Config::from_sources(
            ConfigFile::default(),
            env_of(&[("DOCMETA_MAX_PROMPT_CHARS", "lots")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("DOCMETA_MAX_PROMPT_CHARS"));
    }

    #[test]
    fn debug_masks_api_key() {
        let config = Config {
            openai_api_key: Some("sk-secret".into()),
            ..Config::default()
        };
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("***"));
    }

    #[test]
    fn envelope_stats_count_characters() {
        let metadata = mock::sample_metadata();
        let text = "ünïcödé text";
        let envelope = ResponseEnvelope::new(metadata, ExtractedText::new(text, 2), false);
        assert_eq!(envelope.stats.text_length, text.chars().count());
        assert_eq!(envelope.stats.page_count, 2);
        assert!(envelope.success);

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["stats"]["textLength"], 12);
        assert_eq!(json["stats"]["pageCount"], 2);
        assert_eq!(json["rawText"], text);
        assert_eq!(json["truncated"], false);
    }
}
