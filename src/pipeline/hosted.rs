//! Hosted backend: Google generateContent wire protocol.
//!
//! One POST per generation. The request carries a fixed generation
//! configuration (bounded output length, moderate sampling temperature)
//! and the assembled user prompt; the response text is pulled out of
//! `candidates[0].content.parts[0].text`. A response missing that shape is
//! an [`DeckError::UpstreamFormat`]; we refuse to guess at alternatives.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::GenerationConfig;
use crate::error::DeckError;
use crate::pipeline::backend::SlideBackend;
use crate::prompts::{build_prompt, HOSTED_WRAPPER_INSTRUCTION};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug)]
pub struct HostedBackend {
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    timeout: Duration,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<Part>>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl HostedBackend {
    pub fn new(api_key: &str, config: &GenerationConfig) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: config.hosted_model.clone(),
            temperature: config.hosted_temperature,
            max_tokens: config.hosted_max_tokens,
            timeout: Duration::from_secs(config.hosted_timeout_secs),
        }
    }

    fn endpoint(&self) -> String {
        format!("{API_BASE}/{}:generateContent", self.model)
    }
}

#[async_trait]
impl SlideBackend for HostedBackend {
    fn name(&self) -> &'static str {
        "hosted"
    }

    async fn generate_raw(&self, topic: &str, source_text: &str) -> Result<String, DeckError> {
        let prompt = format!(
            "{}\n\n{}",
            build_prompt(topic, source_text),
            HOSTED_WRAPPER_INSTRUCTION
        );

        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {
                "temperature": self.temperature,
                "topP": 0.8,
                "topK": 40,
                "maxOutputTokens": self.max_tokens,
            }
        });

        info!("Sending generation request to hosted model '{}'", self.model);
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| DeckError::Transport {
                detail: e.to_string(),
                local: false,
            })?;
        let response = client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| DeckError::Transport {
                detail: e.to_string(),
                local: false,
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DeckError::Upstream {
                backend: "hosted",
                status: status.as_u16(),
                detail,
            });
        }

        let parsed: GenerateContentResponse =
            response.json().await.map_err(|e| DeckError::UpstreamFormat {
                backend: "hosted",
                detail: format!("response body was not JSON: {e}"),
            })?;

        let text = parsed
            .candidates
            .and_then(|mut c| if c.is_empty() { None } else { Some(c.remove(0)) })
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .and_then(|mut p| if p.is_empty() { None } else { Some(p.remove(0)) })
            .and_then(|p| p.text)
            .ok_or_else(|| DeckError::UpstreamFormat {
                backend: "hosted",
                detail: "missing candidates[0].content.parts[0].text".to_string(),
            })?;

        debug!("Hosted model returned {} chars", text.len());
        Ok(text)
    }
}
