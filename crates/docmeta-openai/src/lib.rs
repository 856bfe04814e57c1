//! OpenAI-backed [`MetadataGenerator`].
//!
//! Sends the document prompt to the chat-completions endpoint with a strict
//! `json_schema` response format derived from [`DocumentMetadata`], then
//! deserializes and validates the reply.

pub mod schema;
pub mod types;

use reqwest::Client;
use tracing::{debug, warn};

use docmeta_core::{
    Config, DocumentMetadata, GenerateFuture, GenerationRequest, GeneratorError,
    MetadataGenerator,
};

pub use schema::strict_schema;
pub use types::StructuredRequest;

const SCHEMA_NAME: &str = "document_metadata";

#[derive(Clone)]
pub struct OpenAiGenerator {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for OpenAiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiGenerator")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiGenerator {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.into(),
        }
    }

    /// Build from startup configuration. Fails when no API key is configured.
    pub fn from_config(config: &Config) -> Result<Self, GeneratorError> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or_else(|| GeneratorError::Config("OPENAI_API_KEY not set".into()))?;

        let http_client = Client::builder()
            .timeout(config.generate_timeout())
            .build()
            .map_err(|e| GeneratorError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            api_key,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    /// Set a custom base URL (for Azure, proxies, local test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the chat-completions body for a generation request.
    pub fn build_request(&self, request: &GenerationRequest) -> StructuredRequest {
        StructuredRequest::new(
            &self.model,
            request.system_prompt(),
            request.user_prompt(),
            SCHEMA_NAME,
            strict_schema(&request.schema),
        )
    }

    async fn structured_output(&self, body: &StructuredRequest) -> Result<String, GeneratorError> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "OpenAI request failed");
                GeneratorError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "OpenAI API error");
            return Err(GeneratorError::Api(format!("HTTP {status}: {error_text}")));
        }

        let chat_response: types::ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| GeneratorError::Parse(e.to_string()))?;

        if let Some(usage) = &chat_response.usage {
            debug!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                duration_ms = start.elapsed().as_millis(),
                "OpenAI structured output"
            );
        }

        extract_content(chat_response)
    }
}

/// Pull the JSON payload out of the first choice.
fn extract_content(response: types::ChatResponseRaw) -> Result<String, GeneratorError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GeneratorError::Parse("no choices in response".into()))?;

    if let Some(refusal) = choice.message.refusal {
        return Err(GeneratorError::Api(format!("model refused: {refusal}")));
    }
    if choice.finish_reason.as_deref() == Some("length") {
        return Err(GeneratorError::Parse(
            "response truncated by token limit".into(),
        ));
    }

    choice
        .message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| GeneratorError::Parse("empty response content".into()))
}

/// Deserialize and validate the model's JSON output.
pub fn parse_metadata(content: &str) -> Result<DocumentMetadata, GeneratorError> {
    let metadata: DocumentMetadata = serde_json::from_str(content)
        .map_err(|e| GeneratorError::Parse(format!("response does not match schema: {e}")))?;
    metadata.validate()?;
    Ok(metadata)
}

impl MetadataGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "OpenAI"
    }

    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> GenerateFuture<'a> {
        Box::pin(async move {
            let body = self.build_request(request);
            let content = self.structured_output(&body).await?;
            parse_metadata(&content)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmeta_core::mock::sample_metadata;

    use axum::Json;
    use axum::http::StatusCode;
    use axum::routing::post;
    use serde_json::{Value, json};

    /// Serve `/chat/completions` on an ephemeral port with a fixed reply.
    async fn spawn_stub(status: StatusCode, body: Value) -> String {
        let app = axum::Router::new().route(
            "/chat/completions",
            post(move |Json(_req): Json<Value>| {
                let body = body.clone();
                async move { (status, Json(body)) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn completion(content: &str) -> Value {
        json!({
            "choices": [{ "message": { "content": content }, "finish_reason": "stop" }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
        })
    }

    fn generator(base_url: &str) -> OpenAiGenerator {
        OpenAiGenerator::new("sk-test", "gpt-4o-mini").with_base_url(base_url)
    }

    #[test]
    fn from_config_requires_key() {
        let err = OpenAiGenerator::from_config(&Config::default()).unwrap_err();
        assert!(matches!(err, GeneratorError::Config(_)));

        let config = Config {
            openai_api_key: Some("sk-test".into()),
            openai_base_url: "https://proxy.example.com/v1/".into(),
            model: "gpt-4o".into(),
            ..Config::default()
        };
        let g = OpenAiGenerator::from_config(&config).unwrap();
        assert_eq!(g.base_url(), "https://proxy.example.com/v1");
        assert_eq!(g.model(), "gpt-4o");
        assert!(!format!("{g:?}").contains("sk-test"));
    }

    #[test]
    fn request_body_uses_strict_json_schema() {
        let g = generator("http://localhost");
        let body = g.build_request(&GenerationRequest::new("Some document text"));
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["temperature"], 0.0);
        assert_eq!(value["response_format"]["type"], "json_schema");
        assert_eq!(value["response_format"]["json_schema"]["strict"], true);
        assert_eq!(value["response_format"]["json_schema"]["name"], SCHEMA_NAME);
        assert_eq!(
            value["response_format"]["json_schema"]["schema"]["additionalProperties"],
            false
        );
        assert_eq!(value["messages"][0]["role"], "system");
        assert!(
            value["messages"][1]["content"]
                .as_str()
                .unwrap()
                .contains("Some document text")
        );
    }

    #[test]
    fn parse_metadata_rejects_schema_mismatch() {
        let mut value = serde_json::to_value(sample_metadata()).unwrap();
        value["documentType"] = "memo".into();
        let err = parse_metadata(&value.to_string()).unwrap_err();
        assert!(matches!(err, GeneratorError::Parse(_)));

        let mut short = sample_metadata();
        short.keywords.truncate(2);
        let err = parse_metadata(&serde_json::to_string(&short).unwrap()).unwrap_err();
        assert!(matches!(err, GeneratorError::Invalid(_)));
    }

    #[test]
    fn refusal_is_an_api_error() {
        let raw: types::ChatResponseRaw = serde_json::from_value(json!({
            "choices": [{ "message": { "content": null, "refusal": "cannot help" } }]
        }))
        .unwrap();
        let err = extract_content(raw).unwrap_err();
        assert!(err.to_string().contains("cannot help"));
    }

    #[tokio::test]
    async fn generates_metadata_from_stub_server() {
        let content = serde_json::to_string(&sample_metadata()).unwrap();
        let url = spawn_stub(StatusCode::OK, completion(&content)).await;

        let request = GenerationRequest::new("Annual report text");
        let metadata = generator(&url).generate(&request).await.unwrap();

        assert_eq!(metadata, sample_metadata());
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let url = spawn_stub(
            StatusCode::TOO_MANY_REQUESTS,
            json!({ "error": { "message": "rate limited" } }),
        )
        .await;

        let request = GenerationRequest::new("text");
        let err = generator(&url).generate(&request).await.unwrap_err();

        assert!(matches!(err, GeneratorError::Api(_)));
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn non_json_content_is_parse_error() {
        let url = spawn_stub(StatusCode::OK, completion("not json at all")).await;

        let request = GenerationRequest::new("text");
        let err = generator(&url).generate(&request).await.unwrap_err();

        assert!(matches!(err, GeneratorError::Parse(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let request = GenerationRequest::new("text");
        let err = generator("http://127.0.0.1:9")
            .generate(&request)
            .await
            .unwrap_err();

        assert!(matches!(err, GeneratorError::Network(_)));
    }
}
