//! Backend abstraction: one capability, two wire protocols.
//!
//! Everything downstream of backend selection is backend-agnostic: a
//! backend's only job is to turn (topic, source text) into raw response
//! text. Both implementations are observed to occasionally wrap output in
//! extraneous prose despite instruction, so raw text is *always* routed
//! through [`crate::pipeline::repair`] before parsing, never parsed
//! directly.
//!
//! Selection happens exactly once per request in [`resolve_backend`]; an
//! unusable selection (missing credential) fails with
//! [`DeckError::Configuration`] before any network call. There is no
//! fallback between backends.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{Backend, GenerationConfig};
use crate::error::DeckError;
use crate::pipeline::hosted::HostedBackend;
use crate::pipeline::local::LocalBackend;

/// The uniform generation capability implemented by each backend variant.
#[async_trait]
pub trait SlideBackend: Send + Sync + std::fmt::Debug {
    /// Stable name recorded in deck metadata and logs.
    fn name(&self) -> &'static str;

    /// Produce raw response text for the topic and (possibly empty,
    /// already truncated) source text. This is the single long-latency
    /// await of a generation request.
    async fn generate_raw(&self, topic: &str, source_text: &str) -> Result<String, DeckError>;
}

/// Instantiate the configured backend.
///
/// The hosted variant requires a credential and fails here, not at call
/// time, when none is configured.
pub fn resolve_backend(config: &GenerationConfig) -> Result<Arc<dyn SlideBackend>, DeckError> {
    match config.backend {
        Backend::Hosted => {
            let key = config
                .api_key
                .as_deref()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| DeckError::Configuration {
                    detail: "hosted backend selected but no API key configured \
                             (set GEMINI_API_KEY or GenerationConfig::api_key)"
                        .to_string(),
                })?;
            Ok(Arc::new(HostedBackend::new(key, config)))
        }
        Backend::Local => Ok(Arc::new(LocalBackend::new(config))),
    }
}
