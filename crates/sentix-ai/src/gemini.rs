//! Gemini `generateContent` client for sentiment classification.
//!
//! The request pins the response to a JSON schema (label enum, numeric
//! confidence, list of key terms) so the answer is machine-parseable. The
//! answer is still validated here: the service is trusted for transport, not
//! for contract.

use async_trait::async_trait;
use sentix_core::{Classification, SentimentLabel};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{ClassifyError, SchemaViolation};
use crate::Classifier;

/// Longest server error body kept in [`ClassifyError::Server`].
const MAX_ERROR_BODY: usize = 320;

// ── Prompt and schema ──

fn build_prompt(text: &str) -> String {
    format!(
        "Analyze the sentiment of the following customer feedback.\n\
         Classify it as exactly one of: {labels}.\n\
         Give a confidence probability between 0 and 1 for that classification.\n\
         List the 3 words that most influenced the result, most influential first.\n\
         \n\
         Text: \"{text}\"",
        labels = SentimentLabel::wire_names().join(", "),
    )
}

/// Response schema in the Gemini OpenAPI subset.
fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "label": {
                "type": "STRING",
                "enum": SentimentLabel::wire_names(),
                "description": "The sentiment classification."
            },
            "confidence": {
                "type": "NUMBER",
                "description": "Confidence probability between 0 and 1."
            },
            "key_terms": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Words that influenced the sentiment, most influential first."
            }
        },
        "required": ["label", "confidence", "key_terms"]
    })
}

/// Full `generateContent` request body for one text.
pub fn request_body(text: &str) -> Value {
    json!({
        "contents": [
            { "parts": [ { "text": build_prompt(text) } ] }
        ],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema()
        }
    })
}

// ── Wire types ──

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

/// The model's structured answer, before validation.
#[derive(Deserialize)]
struct SentimentPayload {
    label: String,
    confidence: f64,
    key_terms: Vec<String>,
}

/// Extract the candidate text from a raw `generateContent` response body.
fn candidate_text(body: &str) -> Result<String, SchemaViolation> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(SchemaViolation::Envelope)?;
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(SchemaViolation::NoCandidates {
            finish_reason: None,
        })?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(SchemaViolation::NoCandidates {
            finish_reason: candidate.finish_reason,
        });
    }
    Ok(text)
}

/// Validate the structured payload against the classification contract.
///
/// Missing fields, an unknown label, or a confidence outside [0, 1] are
/// violations. Nothing is coerced.
pub fn parse_payload(text: &str) -> Result<Classification, SchemaViolation> {
    let payload: SentimentPayload =
        serde_json::from_str(text).map_err(SchemaViolation::Payload)?;
    let label: SentimentLabel = payload.label.parse()?;
    Ok(Classification::new(
        label,
        payload.confidence,
        payload.key_terms,
    )?)
}

fn truncate(value: &str, max_chars: usize) -> String {
    let mut chars = value.chars();
    let truncated: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{truncated}...")
    } else {
        truncated
    }
}

// ── Client ──

/// Sentiment classifier backed by the Gemini API.
pub struct GeminiClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl GeminiClient {
    /// Create a client. The HTTP timeout comes from `config.timeout`.
    ///
    /// A missing API key is not an error here; it is reported by every
    /// [`classify`](Classifier::classify) call instead.
    pub fn new(config: ClientConfig) -> Result<Self, ClassifyError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Create a client configured from the process environment.
    pub fn from_env() -> Result<Self, ClassifyError> {
        Self::new(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn generate(&self, api_key: &str, text: &str) -> Result<Classification, ClassifyError> {
        let url = self.config.generate_url();
        info!(model = %self.config.model, chars = text.chars().count(), "requesting sentiment classification");

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request_body(text))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClassifyError::Server {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        let body = resp.text().await?;
        let payload = candidate_text(&body)?;
        debug!(payload = %payload, "classification payload received");
        let classification = parse_payload(&payload)?;

        info!(
            label = %classification.label(),
            confidence = classification.confidence(),
            "classification received"
        );
        Ok(classification)
    }
}

#[async_trait]
impl Classifier for GeminiClient {
    async fn classify(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Classification, ClassifyError> {
        // Checked before any I/O: a missing key is a configuration error.
        let api_key = self.config.api_key()?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClassifyError::Cancelled),
            result = self.generate(api_key, text) => result,
        }
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}
