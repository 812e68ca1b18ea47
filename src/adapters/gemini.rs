//! Gemini `generateContent` client and the two ports built on it:
//! label extraction from the photo and a model-estimated road distance.

use crate::config::toml_config::GeminiConfig;
use crate::core::model_output::parse_json_reply;
use crate::domain::model::{AddressPair, Distance, LabelImage, RouteQuery};
use crate::domain::ports::{DistanceProvider, LabelExtractor};
use crate::utils::error::{RelayError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const EXTRACTION_PROMPT: &str = "Extract postal sender and receiver addresses as JSON only. \
Use this structure: {\
'from': {'first_name': '', 'last_name': '', 'address': '', 'city': '', 'state': '', 'pincode': '', 'mobile': ''}, \
'to': {'first_name': '', 'last_name': '', 'address': '', 'city': '', 'state': '', 'pincode': '', 'mobile': ''}\
}";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Part {
    InlineData { mime_type: String, data: String },
    Text(String),
}

impl Part {
    pub fn image(image: &LabelImage) -> Self {
        Part::InlineData {
            mime_type: image.mime_type.clone(),
            data: STANDARD.encode(&image.bytes),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: &'a [Part],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// 送出一次 generateContent 請求，回傳第一個候選結果的文字
    pub async fn generate(&self, parts: &[Part]) -> Result<String> {
        let body = GenerateRequest {
            contents: [Content { parts }],
        };

        tracing::debug!("Sending generateContent request to model {}", self.model);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::extraction(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        tracing::debug!("Gemini response status: {}", status);

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(RelayError::extraction(format!(
                "Gemini returned {}: {}",
                status, error_body
            )));
        }

        let reply: GenerateResponse = response
            .json()
            .await
            .map_err(|e| {
                RelayError::extraction(format!("malformed response body: {}", e.without_url()))
            })?;

        let text = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = reply
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(RelayError::extraction(format!(
                "Gemini returned no text: {}",
                reason
            )));
        }

        Ok(text)
    }
}

pub struct GeminiLabelExtractor {
    client: Arc<GeminiClient>,
}

impl GeminiLabelExtractor {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LabelExtractor for GeminiLabelExtractor {
    async fn extract(&self, image: &LabelImage) -> Result<AddressPair> {
        let parts = [Part::image(image), Part::text(EXTRACTION_PROMPT)];
        let reply = self.client.generate(&parts).await?;

        let pair: AddressPair = parse_json_reply(&reply)?;
        tracing::debug!(
            "Parsed addresses: {}",
            serde_json::to_string_pretty(&pair).unwrap_or_default()
        );
        Ok(pair)
    }
}

#[derive(Debug, Deserialize)]
struct DistanceReply {
    distance_km: f64,
}

pub struct GeminiDistanceEstimator {
    client: Arc<GeminiClient>,
    country: String,
}

impl GeminiDistanceEstimator {
    pub fn new(client: Arc<GeminiClient>, country: impl Into<String>) -> Self {
        Self {
            client,
            country: country.into(),
        }
    }

    pub fn prompt(&self, query: &RouteQuery) -> String {
        let region = if self.country.is_empty() {
            String::new()
        } else {
            format!(" in {}", self.country)
        };
        format!(
            "What is the accurate driving distance in kilometers between the following addresses{}? \
From: {}\nTo: {}\n\
Base your answer on Google Maps data for road distance, not straight-line. \
Respond with JSON only: {{'distance_km': integer}}",
            region, query.origin, query.destination
        )
    }
}

#[async_trait]
impl DistanceProvider for GeminiDistanceEstimator {
    fn name(&self) -> &str {
        "model"
    }

    fn country_suffix(&self) -> Option<&str> {
        Some(self.country.as_str()).filter(|c| !c.is_empty())
    }

    async fn distance(&self, query: &RouteQuery) -> Result<Distance> {
        let reply = self
            .client
            .generate(&[Part::text(self.prompt(query))])
            .await
            .map_err(|e| RelayError::distance(e.to_string()))?;

        let parsed: DistanceReply =
            parse_json_reply(&reply).map_err(|e| RelayError::distance(e.to_string()))?;

        if !parsed.distance_km.is_finite() || parsed.distance_km < 0.0 {
            return Err(RelayError::distance(format!(
                "model returned an invalid distance: {}",
                parsed.distance_km
            )));
        }

        Ok(Distance::from_kilometers(parsed.distance_km))
    }
}
