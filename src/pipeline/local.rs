//! Local backend: OpenAI-compatible chat completions against a
//! locally-reachable inference server (LM Studio, llama.cpp server, …).
//!
//! Differences from the hosted variant are deliberate, not incidental:
//! near-zero sampling temperature and a larger output budget, because
//! local models are typically more verbose and less instruction-following,
//! plus a blunt system instruction forbidding any conversational wrapper.
//! The expected payload is a bare JSON array of slides, without a `slides`
//! envelope.
//!
//! A refused connection is the overwhelmingly common failure ("the server
//! is simply not running"), so it is translated into a transport error
//! flagged `local: true`, which carries its own actionable user message.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::GenerationConfig;
use crate::error::DeckError;
use crate::pipeline::backend::SlideBackend;
use crate::prompts::{build_prompt, LOCAL_SYSTEM_PROMPT};

#[derive(Debug)]
pub struct LocalBackend {
    endpoint: String,
    temperature: f32,
    max_tokens: usize,
    timeout: Duration,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl LocalBackend {
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            endpoint: config.local_endpoint.clone(),
            temperature: config.local_temperature,
            max_tokens: config.local_max_tokens,
            timeout: Duration::from_secs(config.local_timeout_secs),
        }
    }
}

/// Whether a reqwest error chain bottoms out in a refused connection.
fn is_connection_refused(err: &reqwest::Error) -> bool {
    if err.is_connect() {
        return true;
    }
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        source = inner.source();
    }
    false
}

#[async_trait]
impl SlideBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn generate_raw(&self, topic: &str, source_text: &str) -> Result<String, DeckError> {
        let prompt = build_prompt(topic, source_text);

        let body = json!({
            "messages": [
                {"role": "system", "content": LOCAL_SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "stream": false,
        });

        info!("Sending generation request to local server at {}", self.endpoint);
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| DeckError::Transport {
                detail: e.to_string(),
                local: true,
            })?;

        let response = client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| DeckError::Transport {
                local: is_connection_refused(&e),
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DeckError::Upstream {
                backend: "local",
                status: status.as_u16(),
                detail,
            });
        }

        let parsed: ChatCompletionResponse =
            response.json().await.map_err(|e| DeckError::UpstreamFormat {
                backend: "local",
                detail: format!("response body was not JSON: {e}"),
            })?;

        // Validate the envelope before touching content: a server that
        // answers 200 without `choices` is misconfigured, not empty.
        let content = parsed
            .choices
            .and_then(|mut c| if c.is_empty() { None } else { Some(c.remove(0)) })
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| DeckError::UpstreamFormat {
                backend: "local",
                detail: "missing choices[0].message.content".to_string(),
            })?;

        debug!("Local server returned {} chars", content.len());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_without_choices_is_detected() {
        let parsed: ChatCompletionResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.choices.is_none());
    }

    #[test]
    fn envelope_extracts_content() {
        let raw = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "[]"}}]
        });
        let parsed: ChatCompletionResponse = serde_json::from_value(raw).unwrap();
        let mut choices = parsed.choices.unwrap();
        let content = choices.remove(0).message.unwrap().content;
        assert_eq!(content.as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn refused_connection_is_local_transport_error() {
        // Port 9 (discard) is not listening on loopback in any sane setup.
        let config = GenerationConfig::builder()
            .local_endpoint("http://127.0.0.1:9/v1/chat/completions")
            .local_timeout_secs(2)
            .build()
            .unwrap();
        let backend = LocalBackend::new(&config);
        let err = backend.generate_raw("topic", "").await.unwrap_err();
        match err {
            DeckError::Transport { local, .. } => assert!(local),
            other => panic!("expected transport error, got {other:?}"),
        }
    }
}
