//! Configuration types for deck generation.
//!
//! All generation behaviour is controlled through [`GenerationConfig`],
//! built via its [`GenerationConfigBuilder`]. Keeping every knob in one
//! struct makes it trivial to share configs across requests, log them, and
//! diff two runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor breaks on every new field. The builder lets
//! callers set only what they care about and rely on documented defaults.

use crate::error::DeckError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Upper bound on topic length, in characters.
pub const MAX_TOPIC_CHARS: usize = 200;

/// Which AI backend generates the slide content.
///
/// A closed set: the backend is selected once per request and never
/// branched on again downstream; every stage after adapter selection is
/// backend-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Cloud-hosted model behind the Google generateContent API.
    /// Requires an API key.
    Hosted,
    /// Locally-reachable OpenAI-compatible chat-completion server
    /// (LM Studio, llama.cpp server, …). No credential.
    Local,
}

impl Backend {
    /// Stable lowercase name used in deck metadata and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Hosted => "hosted",
            Backend::Local => "local",
        }
    }
}

impl FromStr for Backend {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hosted" | "gemini" => Ok(Backend::Hosted),
            "local" | "lmstudio" => Ok(Backend::Local),
            other => Err(DeckError::Configuration {
                detail: format!("unknown backend '{other}' (expected 'hosted' or 'local')"),
            }),
        }
    }
}

/// Configuration for one or more deck generations.
///
/// Built via [`GenerationConfig::builder()`] or [`GenerationConfig::default()`].
///
/// # Example
/// ```rust
/// use deckforge::{Backend, GenerationConfig};
///
/// let config = GenerationConfig::builder()
///     .backend(Backend::Local)
///     .local_endpoint("http://localhost:1234/v1/chat/completions")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Which backend to use. Default: [`Backend::Hosted`].
    pub backend: Backend,

    /// Credential for the hosted backend. Default: `GEMINI_API_KEY` env var,
    /// read at build time. The local backend ignores it.
    pub api_key: Option<String>,

    /// Hosted model identifier. Default: "gemini-1.5-pro-latest".
    pub hosted_model: String,

    /// Chat-completions URL of the local inference server.
    /// Default: `http://localhost:1234/v1/chat/completions`.
    pub local_endpoint: String,

    /// Sampling temperature for the hosted backend. Default: 0.7.
    ///
    /// Slide authoring benefits from some creativity; transcription-grade
    /// determinism is not the goal here.
    pub hosted_temperature: f32,

    /// Output token budget for the hosted backend. Default: 4096.
    pub hosted_max_tokens: usize,

    /// Sampling temperature for the local backend. Default: 0.1.
    ///
    /// Near-deterministic on purpose: local models are more verbose and
    /// less instruction-following, and low temperature keeps them closest
    /// to the "emit only a JSON array" system instruction.
    pub local_temperature: f32,

    /// Output token budget for the local backend. Default: 8192, larger
    /// than hosted because local models pad their output more.
    pub local_max_tokens: usize,

    /// Per-call timeout for the hosted backend, seconds. Default: 60.
    pub hosted_timeout_secs: u64,

    /// Per-call timeout for the local backend, seconds. Default: 300.
    /// Local inference is typically much slower than a cloud API.
    pub local_timeout_secs: u64,

    /// Source text cap in characters before it is handed to the backend.
    /// Longer texts are truncated with a "..." marker. Default: 10_000.
    pub source_text_limit: usize,

    /// Maximum images placed on one synthesised image slide. Default: 4.
    pub max_images_per_slide: usize,

    /// Root directory for persisted document images. Each request gets a
    /// fresh `request-{uuid}` directory underneath. Default: `temp_images`.
    pub image_root: PathBuf,

    /// Public URL prefix under which persisted images are served back.
    /// Default: `/api/images`.
    pub image_url_prefix: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Hosted,
            api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            hosted_model: "gemini-1.5-pro-latest".to_string(),
            local_endpoint: "http://localhost:1234/v1/chat/completions".to_string(),
            hosted_temperature: 0.7,
            hosted_max_tokens: 4096,
            local_temperature: 0.1,
            local_max_tokens: 8192,
            hosted_timeout_secs: 60,
            local_timeout_secs: 300,
            source_text_limit: 10_000,
            max_images_per_slide: 4,
            image_root: PathBuf::from("temp_images"),
            image_url_prefix: "/api/images".to_string(),
        }
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn backend(mut self, backend: Backend) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn hosted_model(mut self, model: impl Into<String>) -> Self {
        self.config.hosted_model = model.into();
        self
    }

    pub fn local_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.local_endpoint = url.into();
        self
    }

    pub fn hosted_temperature(mut self, t: f32) -> Self {
        self.config.hosted_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn local_temperature(mut self, t: f32) -> Self {
        self.config.local_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn hosted_max_tokens(mut self, n: usize) -> Self {
        self.config.hosted_max_tokens = n;
        self
    }

    pub fn local_max_tokens(mut self, n: usize) -> Self {
        self.config.local_max_tokens = n;
        self
    }

    pub fn hosted_timeout_secs(mut self, secs: u64) -> Self {
        self.config.hosted_timeout_secs = secs.max(1);
        self
    }

    pub fn local_timeout_secs(mut self, secs: u64) -> Self {
        self.config.local_timeout_secs = secs.max(1);
        self
    }

    pub fn source_text_limit(mut self, chars: usize) -> Self {
        self.config.source_text_limit = chars;
        self
    }

    pub fn max_images_per_slide(mut self, n: usize) -> Self {
        self.config.max_images_per_slide = n;
        self
    }

    pub fn image_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.image_root = root.into();
        self
    }

    pub fn image_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.image_url_prefix = prefix.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, DeckError> {
        let c = &self.config;
        if c.max_images_per_slide == 0 {
            return Err(DeckError::InvalidConfig(
                "max_images_per_slide must be ≥ 1".into(),
            ));
        }
        if c.local_endpoint.is_empty() {
            return Err(DeckError::InvalidConfig("local_endpoint is empty".into()));
        }
        if c.hosted_model.is_empty() {
            return Err(DeckError::InvalidConfig("hosted_model is empty".into()));
        }
        Ok(self.config)
    }
}
