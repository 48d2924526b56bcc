//! Gemini text backend for promotional copy.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::CopyConfig;
use crate::copywriter::{CompletionOptions, TextBackend};
use crate::error::{CopyError, WorkerError, WorkerResult};

/// Gemini API client with an ordered model fallback list.
pub struct GeminiBackend {
    api_key: String,
    base_url: String,
    models: Vec<String>,
    client: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiBackend {
    /// `None` when no API key is configured.
    pub fn from_config(config: &CopyConfig) -> WorkerResult<Option<Self>> {
        let Some(api_key) = config.gemini_api_key.clone() else {
            return Ok(None);
        };
        if config.models.is_empty() {
            return Err(WorkerError::config_error("GEMINI_MODELS is empty"));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| WorkerError::config_error(format!("Failed to build Gemini client: {e}")))?;

        Ok(Some(Self {
            api_key,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            models: config.models.clone(),
            client,
        }))
    }

    async fn call_model(
        &self,
        model: &str,
        prompt: &str,
        system_prompt: &str,
        options: CompletionOptions,
    ) -> Result<String, CopyError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let request = GeminiRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: system_prompt.to_string(),
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_length,
            },
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(CopyError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CopyError::Http {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| CopyError::InvalidResponse(e.to_string()))?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        debug!(model = model, len = text.len(), "Gemini reply received");
        Ok(text)
    }
}

#[async_trait]
impl TextBackend for GeminiBackend {
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: &str,
        options: CompletionOptions,
    ) -> Result<String, CopyError> {
        let mut last_error = None;

        for model in &self.models {
            match self.call_model(model, prompt, system_prompt, options).await {
                Ok(text) if !text.trim().is_empty() => {
                    info!(model = %model, "Copy generated");
                    return Ok(text);
                }
                Ok(_) => {
                    warn!(model = %model, "Model returned no text");
                    last_error = Some(CopyError::Empty);
                }
                Err(e) => {
                    warn!(model = %model, "Failed with model: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CopyError::Unavailable("no Gemini models configured".to_string())))
    }
}
