//! Gemini `generateContent` client
//!
//! Sends a prompt with a JSON response schema and decodes the model's text
//! part into the requested shape. A missing API key is reported per request
//! rather than at construction, so the portal starts without one.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::{AnalysisError, MarketAnalyst, MarketOutlook, PairAnalysis, Validate};

/// Default API host
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
/// Default model
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
/// Default timeout for generation requests (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const OUTLOOK_PROMPT: &str = "Generate a daily forex market sentiment analysis. Include sections for 'Key Trends', 'Top Movers', and 'Expert Advice'. Keep it professional and concise for a financial portal.";

fn pair_prompt(symbol: &str) -> String {
    format!(
        "Perform a technical and fundamental outlook for {}. Provide a 'Sentiment' (Bullish/Bearish), 'Key Level', and 'Trade Idea'.",
        symbol
    )
}

fn outlook_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "headline": { "type": "STRING" },
            "keyTrends": { "type": "ARRAY", "items": { "type": "STRING" } },
            "topMovers": { "type": "ARRAY", "items": { "type": "STRING" } },
            "advice": { "type": "STRING" }
        },
        "required": ["headline", "keyTrends", "topMovers", "advice"]
    })
}

fn pair_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "sentiment": { "type": "STRING" },
            "keyLevel": { "type": "STRING" },
            "tradeIdea": { "type": "STRING" }
        },
        "required": ["sentiment", "keyLevel", "tradeIdea"]
    })
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate, parts joined
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Decode the model's JSON text. Malformed JSON is a parse error; JSON of
/// the wrong shape is a schema error.
pub fn decode<T: DeserializeOwned + Validate>(text: &str) -> Result<T, AnalysisError> {
    let value: T = serde_json::from_str(text).map_err(|e| {
        if e.is_data() {
            AnalysisError::Schema(e.to_string())
        } else {
            AnalysisError::Parse(e.to_string())
        }
    })?;
    value.validate()?;
    Ok(value)
}

/// Gemini API client
pub struct GeminiClient {
    http_client: Client,
    endpoint: Url,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    /// Create a client for `model` on `base_url`. A blank key is treated as
    /// no key.
    pub fn new(
        api_key: Option<String>,
        model: &str,
        base_url: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let endpoint =
            Url::parse(&base)?.join(&format!("v1beta/models/{}:generateContent", model))?;

        let http_client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(2)
            .build()?;

        let api_key = api_key.filter(|k| !k.trim().is_empty());
        info!(
            "Gemini client initialized: model={}, key_configured={}",
            model,
            api_key.is_some()
        );

        Ok(Self {
            http_client,
            endpoint,
            model: model.to_string(),
            api_key,
        })
    }

    /// Client against the public API with default model and timeout
    pub fn with_key(api_key: Option<String>) -> anyhow::Result<Self> {
        Self::new(
            api_key,
            DEFAULT_MODEL,
            DEFAULT_BASE_URL,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Run one structured generation request
    pub async fn generate<T>(&self, prompt: &str, schema: Value) -> Result<T, AnalysisError>
    where
        T: DeserializeOwned + Validate,
    {
        let api_key = self.api_key.as_deref().ok_or(AnalysisError::MissingApiKey)?;

        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema
            }
        });

        debug!("Requesting generation from {}", self.model);

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::Request("generation request timed out".to_string())
                } else {
                    AnalysisError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Parse(e.to_string()))?;

        let text = generated
            .text()
            .ok_or_else(|| AnalysisError::Parse("response has no text candidate".to_string()))?;

        decode(&text)
    }
}

#[async_trait::async_trait]
impl MarketAnalyst for GeminiClient {
    async fn market_outlook(&self) -> Result<MarketOutlook, AnalysisError> {
        self.generate(OUTLOOK_PROMPT, outlook_schema()).await
    }

    async fn pair_analysis(&self, symbol: &str) -> Result<PairAnalysis, AnalysisError> {
        self.generate(&pair_prompt(symbol), pair_schema()).await
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_includes_model() {
        let client = GeminiClient::new(
            None,
            "test-model",
            "http://localhost:9000",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "http://localhost:9000/v1beta/models/test-model:generateContent"
        );
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let client = GeminiClient::with_key(Some("  ".to_string())).unwrap();
        assert!(!client.has_api_key());
    }

    #[test]
    fn test_missing_key_fails_per_request() {
        let client = GeminiClient::with_key(None).unwrap();
        let result = tokio_test::block_on(client.market_outlook());
        assert_eq!(result, Err(AnalysisError::MissingApiKey));
    }

    #[test]
    fn test_decode_distinguishes_parse_and_schema() {
        assert!(matches!(decode::<PairAnalysis>("not json"), Err(AnalysisError::Parse(_))));
        assert!(matches!(
            decode::<PairAnalysis>(r#"{"sentiment":"Bullish"}"#),
            Err(AnalysisError::Schema(_))
        ));

        let ok: PairAnalysis =
            decode(r#"{"sentiment":"Bullish","keyLevel":"1.09","tradeIdea":"Buy"}"#).unwrap();
        assert!(ok.is_bullish());
    }

    #[test]
    fn test_candidate_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] } }]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("{\"a\":1}"));

        let empty: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.text().is_none());
    }
}
