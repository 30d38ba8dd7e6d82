// AI Reasoning Provider Service
// Implements Gemini and OpenAI structured-output calls and the fallback chain

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

const GEMINI_DEFAULT_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const OPENAI_DEFAULT_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Missing content in response")]
    MissingContent,
    #[error("JSON parse error: {0}")]
    JsonError(String),
    #[error("Schema violation: {0}")]
    SchemaViolation(String),
    #[error("API key not configured")]
    MissingApiKey,
}

// ============ Output Schema ============

/// Strict output contract submitted with every reasoning prompt. A
/// response that is empty, malformed, or violates the schema fails the
/// provider attempt; it is never accepted as a partial success.
#[derive(Debug, Clone)]
pub struct OutputSchema {
    pub name: &'static str,
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

#[derive(Debug, Clone)]
pub enum FieldKind {
    Integer { min: i64, max: i64 },
    Float { min: f64, max: f64 },
    Text,
    Enumerated(&'static [&'static str]),
}

impl OutputSchema {
    /// Render the JSON-output instructions appended to every prompt.
    pub fn render_instructions(&self) -> String {
        let mut out = String::from(
            "Respond with a single JSON object containing exactly these fields:\n",
        );
        for field in &self.fields {
            let desc = match &field.kind {
                FieldKind::Integer { min, max } => {
                    format!("- {}: integer between {} and {}", field.name, min, max)
                }
                FieldKind::Float { min, max } => {
                    format!("- {}: number between {:.1} and {:.1}", field.name, min, max)
                }
                FieldKind::Text => format!("- {}: string", field.name),
                FieldKind::Enumerated(values) => {
                    format!("- {}: one of [{}]", field.name, values.join(", "))
                }
            };
            out.push_str(&desc);
            out.push('\n');
        }
        out.push_str("Return only the JSON object, no other text.");
        out
    }

    /// Validate a candidate value against the schema.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        let obj = value
            .as_object()
            .ok_or_else(|| "response is not a JSON object".to_string())?;
        for field in &self.fields {
            let v = obj
                .get(field.name)
                .ok_or_else(|| format!("missing field '{}'", field.name))?;
            match &field.kind {
                FieldKind::Integer { min, max } => {
                    let n = v
                        .as_i64()
                        .ok_or_else(|| format!("field '{}' is not an integer", field.name))?;
                    if n < *min || n > *max {
                        return Err(format!(
                            "field '{}' out of range: {} not in [{}, {}]",
                            field.name, n, min, max
                        ));
                    }
                }
                FieldKind::Float { min, max } => {
                    let n = v
                        .as_f64()
                        .ok_or_else(|| format!("field '{}' is not a number", field.name))?;
                    if n < *min || n > *max {
                        return Err(format!(
                            "field '{}' out of range: {} not in [{}, {}]",
                            field.name, n, min, max
                        ));
                    }
                }
                FieldKind::Text => {
                    let s = v
                        .as_str()
                        .ok_or_else(|| format!("field '{}' is not a string", field.name))?;
                    if s.trim().is_empty() {
                        return Err(format!("field '{}' is empty", field.name));
                    }
                }
                FieldKind::Enumerated(values) => {
                    let s = v
                        .as_str()
                        .ok_or_else(|| format!("field '{}' is not a string", field.name))?;
                    if !values.contains(&s) {
                        return Err(format!(
                            "field '{}' has value '{}', expected one of [{}]",
                            field.name,
                            s,
                            values.join(", ")
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

// ============ Reasoning Provider ============

/// Any model backend able to execute a structured-output prompt.
/// Instances are constructed once at process start and injected into the
/// pipeline; API keys are read from the environment at call time.
#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(&self, prompt: &str, schema: &OutputSchema) -> Result<Value, ProviderError>;
}

/// Extract a JSON object from response content that may carry prose or
/// code fences around it.
fn extract_json(content: &str) -> Result<String, ProviderError> {
    let content = content.trim();
    if content.starts_with('{') && content.ends_with('}') {
        return Ok(content.to_string());
    }
    match (content.find('{'), content.rfind('}')) {
        (Some(start), Some(end)) if end > start => Ok(content[start..=end].to_string()),
        _ => Err(ProviderError::JsonError("no JSON object in response".to_string())),
    }
}

/// Parse and schema-check raw provider content.
fn parse_structured(content: &str, schema: &OutputSchema) -> Result<Value, ProviderError> {
    if content.trim().is_empty() {
        return Err(ProviderError::MissingContent);
    }
    let json_str = extract_json(content)?;
    let value: Value =
        serde_json::from_str(&json_str).map_err(|e| ProviderError::JsonError(e.to_string()))?;
    schema
        .validate(&value)
        .map_err(ProviderError::SchemaViolation)?;
    Ok(value)
}

/// Get API key from environment. Both the plain and the app-prefixed
/// variable names are accepted.
pub fn get_api_key(provider: &str) -> Option<String> {
    let env_keys = match provider {
        "gemini" => vec!["GEMINI_API_KEY", "VERITAS_GEMINI_API_KEY"],
        "openai" => vec!["OPENAI_API_KEY", "VERITAS_OPENAI_API_KEY"],
        _ => vec![],
    };

    for key in env_keys {
        if let Ok(val) = env::var(key) {
            let v = val.trim();
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }
    }

    None
}

// ============ Gemini (primary) ============

pub struct GeminiProvider {
    client: Client,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(client: Client, model: impl Into<String>) -> Self {
        let base_url =
            env::var("GEMINI_API_URL").unwrap_or_else(|_| GEMINI_DEFAULT_URL.to_string());
        Self {
            client,
            base_url,
            model: model.into(),
        }
    }
}

#[async_trait]
impl ReasoningProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn execute(&self, prompt: &str, schema: &OutputSchema) -> Result<Value, ProviderError> {
        let api_key = get_api_key("gemini").ok_or(ProviderError::MissingApiKey)?;
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        );

        let full_prompt = format!("{}\n\n{}", prompt, schema.render_instructions());
        let request = serde_json::json!({
            "contents": [{"parts": [{"text": full_prompt}]}],
            "generationConfig": {
                "temperature": 0.0,
                "responseMimeType": "application/json"
            }
        });

        let start = Instant::now();

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        // Gemini response format: {"candidates":[{"content":{"parts":[{"text":"..."}]}}]}
        let data: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        let content = data["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or(ProviderError::MissingContent)?;

        info!(provider = "gemini", latency_ms, schema = schema.name, "reasoning call returned");
        parse_structured(content, schema)
    }
}

// ============ OpenAI (fallback) ============

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: i32,
    temperature: f64,
    response_format: ResponseFormat,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    r#type: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

pub struct OpenAiProvider {
    client: Client,
    url: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(client: Client, model: impl Into<String>) -> Self {
        let url = env::var("OPENAI_API_URL").unwrap_or_else(|_| OPENAI_DEFAULT_URL.to_string());
        Self {
            client,
            url,
            model: model.into(),
        }
    }
}

#[async_trait]
impl ReasoningProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn execute(&self, prompt: &str, schema: &OutputSchema) -> Result<Value, ProviderError> {
        let api_key = get_api_key("openai").ok_or(ProviderError::MissingApiKey)?;

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: schema.render_instructions(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            max_tokens: 1024,
            temperature: 0.0,
            response_format: ResponseFormat {
                r#type: "json_object".to_string(),
            },
        };

        let start = Instant::now();

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        let content = data
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or(ProviderError::MissingContent)?;

        info!(provider = "openai", latency_ms, schema = schema.name, "reasoning call returned");
        parse_structured(&content, schema)
    }
}

// ============ Fallback Chain ============

#[derive(Debug, Clone)]
pub struct ChainFailure {
    pub provider: String,
    pub reason: String,
}

impl fmt::Display for ChainFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.reason)
    }
}

/// Every provider in the chain failed. Carries each attempt's failure
/// reason; callers decide the final fallback behavior.
#[derive(Debug)]
pub struct ChainExhausted {
    pub attempts: Vec<ChainFailure>,
}

impl fmt::Display for ChainExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "all reasoning providers failed: ")?;
        for (i, attempt) in self.attempts.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", attempt)?;
        }
        Ok(())
    }
}

impl std::error::Error for ChainExhausted {}

/// Prioritized provider list. Providers are attempted in order with the
/// identical prompt and schema; the first success wins. The chain never
/// fabricates a result on total failure.
pub struct ProviderChain {
    providers: Vec<Arc<dyn ReasoningProvider>>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn ReasoningProvider>>) -> Self {
        Self { providers }
    }

    pub async fn execute(
        &self,
        prompt: &str,
        schema: &OutputSchema,
    ) -> Result<Value, ChainExhausted> {
        let mut attempts = Vec::new();

        for provider in &self.providers {
            match provider.execute(prompt, schema).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        schema = schema.name,
                        error = %e,
                        "provider attempt failed, advancing chain"
                    );
                    attempts.push(ChainFailure {
                        provider: provider.name().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(ChainExhausted { attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mock_provider::MockProvider;

    fn score_schema() -> OutputSchema {
        OutputSchema {
            name: "score",
            fields: vec![
                FieldSpec {
                    name: "deception_score",
                    kind: FieldKind::Integer { min: 0, max: 100 },
                },
                FieldSpec {
                    name: "confidence_score",
                    kind: FieldKind::Float { min: 0.0, max: 1.0 },
                },
                FieldSpec {
                    name: "explanation_summary",
                    kind: FieldKind::Text,
                },
                FieldSpec {
                    name: "verdict",
                    kind: FieldKind::Enumerated(&["manipulated", "authentic", "inconclusive"]),
                },
            ],
        }
    }

    #[test]
    fn test_extract_json_plain_and_fenced() {
        assert_eq!(extract_json("{\"a\":1}").unwrap(), "{\"a\":1}");
        assert_eq!(
            extract_json("```json\n{\"a\": 1}\n```").unwrap(),
            "{\"a\": 1}"
        );
        assert!(extract_json("no json here").is_err());
    }

    #[test]
    fn test_schema_accepts_conforming_value() {
        let value = serde_json::json!({
            "deception_score": 82,
            "confidence_score": 0.91,
            "explanation_summary": "emotional escalation detected",
            "verdict": "manipulated"
        });
        assert!(score_schema().validate(&value).is_ok());
    }

    #[test]
    fn test_schema_rejects_missing_field() {
        let value = serde_json::json!({"deception_score": 82});
        let err = score_schema().validate(&value).unwrap_err();
        assert!(err.contains("missing field"));
    }

    #[test]
    fn test_schema_rejects_out_of_range() {
        let value = serde_json::json!({
            "deception_score": 150,
            "confidence_score": 0.5,
            "explanation_summary": "x",
            "verdict": "authentic"
        });
        assert!(score_schema().validate(&value).is_err());
    }

    #[test]
    fn test_schema_rejects_unknown_enum_value() {
        let value = serde_json::json!({
            "deception_score": 10,
            "confidence_score": 0.5,
            "explanation_summary": "x",
            "verdict": "guilty"
        });
        let err = score_schema().validate(&value).unwrap_err();
        assert!(err.contains("verdict"));
    }

    #[test]
    fn test_schema_rejects_fractional_integer() {
        let value = serde_json::json!({
            "deception_score": 82.5,
            "confidence_score": 0.5,
            "explanation_summary": "x",
            "verdict": "authentic"
        });
        assert!(score_schema().validate(&value).is_err());
    }

    #[test]
    fn test_parse_structured_rejects_nonconforming_payload() {
        let schema = score_schema();
        assert!(matches!(
            parse_structured("", &schema),
            Err(ProviderError::MissingContent)
        ));
        assert!(matches!(
            parse_structured("{not json", &schema),
            Err(ProviderError::JsonError(_))
        ));
        assert!(matches!(
            parse_structured("{\"deception_score\": 5}", &schema),
            Err(ProviderError::SchemaViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_chain_returns_first_success() {
        let primary = Arc::new(MockProvider::new(
            "primary",
            serde_json::json!({"ok": true}),
        ));
        let fallback = Arc::new(MockProvider::new(
            "fallback",
            serde_json::json!({"ok": false}),
        ));
        let chain = ProviderChain::new(vec![primary.clone(), fallback.clone()]);
        let schema = OutputSchema { name: "ok", fields: vec![] };

        let value = chain.execute("prompt", &schema).await.unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(primary.call_count(), 1);
        assert_eq!(fallback.call_count(), 0);
    }

    #[tokio::test]
    async fn test_chain_falls_back_with_identical_prompt() {
        let primary = Arc::new(MockProvider::failing("primary"));
        let fallback = Arc::new(MockProvider::new(
            "fallback",
            serde_json::json!({"ok": true}),
        ));
        let chain = ProviderChain::new(vec![primary.clone(), fallback.clone()]);
        let schema = OutputSchema { name: "ok", fields: vec![] };

        let value = chain.execute("the one prompt", &schema).await.unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(primary.call_count(), 1);
        assert_eq!(fallback.call_count(), 1);
        assert_eq!(primary.last_prompt(), fallback.last_prompt());
        assert_eq!(fallback.last_prompt().as_deref(), Some("the one prompt"));
    }

    #[tokio::test]
    async fn test_chain_exhaustion_aggregates_every_failure() {
        let a = Arc::new(MockProvider::failing("a"));
        let b = Arc::new(MockProvider::failing("b"));
        let chain = ProviderChain::new(vec![a, b]);
        let schema = OutputSchema { name: "ok", fields: vec![] };

        let err = chain.execute("prompt", &schema).await.unwrap_err();
        assert_eq!(err.attempts.len(), 2);
        assert_eq!(err.attempts[0].provider, "a");
        assert_eq!(err.attempts[1].provider, "b");
        let msg = err.to_string();
        assert!(msg.contains("all reasoning providers failed"));
        assert!(msg.contains("a:"));
        assert!(msg.contains("b:"));
    }
}
