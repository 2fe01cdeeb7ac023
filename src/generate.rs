//! End-to-end deck generation.
//!
//! One request runs as a sequential pipeline: validate the topic, truncate
//! the source text, call the selected backend (the single cancellable
//! long-latency await), repair and validate the response, then persist and
//! pack document images and assemble the deck. Image persistence is the
//! only internally concurrent step; each image's write is independent.
//!
//! AI-slide generation always completes (or fails terminally) before image
//! slides are appended; image slides are a strict suffix of the deck.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{GenerationConfig, MAX_TOPIC_CHARS};
use crate::deck::{Deck, ExtractedImage};
use crate::error::DeckError;
use crate::pipeline::assemble::{assemble, AssemblyInputs};
use crate::pipeline::backend::{resolve_backend, SlideBackend};
use crate::pipeline::images::{pack_image_slides, ImageStore};
use crate::pipeline::repair::extract_structured_fragment;
use crate::pipeline::validate::validate_slides;
use crate::prompts::truncate_source;

/// A document already processed by the extraction collaborator: plain
/// text plus the images it embedded, in extraction order.
#[derive(Debug, Clone, Default)]
pub struct SourceDocument {
    pub text: String,
    pub images: Vec<ExtractedImage>,
}

/// One generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Presentation topic, 1–200 characters after trimming.
    pub topic: String,
    /// Optional source document to ground the content on.
    pub source: Option<SourceDocument>,
}

impl GenerationRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: SourceDocument) -> Self {
        self.source = Some(source);
        self
    }
}

/// Generate a deck using the backend named in `config`.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Fails as a whole, no partial decks. See [`DeckError`] for the
/// taxonomy and [`DeckError::user_message`] for caller-facing strings.
pub async fn generate(
    request: &GenerationRequest,
    config: &GenerationConfig,
) -> Result<Deck, DeckError> {
    let backend = resolve_backend(config)?;
    generate_with_backend(request, backend, config).await
}

/// Generate a deck with a pre-built backend.
///
/// The seam used by tests and by callers that need custom middleware
/// around the backend; [`generate`] delegates here after selection.
pub async fn generate_with_backend(
    request: &GenerationRequest,
    backend: Arc<dyn SlideBackend>,
    config: &GenerationConfig,
) -> Result<Deck, DeckError> {
    let started_at = Instant::now();

    // ── Step 1: Validate the request ─────────────────────────────────────
    let topic = request.topic.trim();
    if topic.is_empty() {
        return Err(DeckError::InvalidTopic {
            reason: "topic cannot be empty".to_string(),
        });
    }
    if topic.chars().count() > MAX_TOPIC_CHARS {
        return Err(DeckError::InvalidTopic {
            reason: format!("topic exceeds {MAX_TOPIC_CHARS} characters"),
        });
    }
    info!("Generating deck for topic '{}' via '{}'", topic, backend.name());

    // ── Step 2: Prepare source text ──────────────────────────────────────
    let source_text = match &request.source {
        Some(doc) => {
            let truncated = truncate_source(&doc.text, config.source_text_limit);
            if truncated.len() < doc.text.len() {
                debug!(
                    "Source text truncated to {} characters",
                    config.source_text_limit
                );
            }
            truncated
        }
        None => String::new(),
    };
    let has_source_document = !source_text.is_empty();

    // ── Step 3: Backend call ─────────────────────────────────────────────
    let raw = backend.generate_raw(topic, &source_text).await?;
    debug!("Backend returned {} chars of raw text", raw.len());

    // ── Step 4: Repair and validate ──────────────────────────────────────
    // Raw output is never parsed directly; both backends occasionally wrap
    // the data in prose despite instruction.
    let ai_slides = match extract_structured_fragment(&raw) {
        Ok(fragment) => validate_slides(&fragment).inspect_err(|e| {
            warn!("Rejected AI response ({e}); raw response: {raw}");
        })?,
        Err(e) => {
            warn!("No structure in AI response ({e}); raw response: {raw}");
            return Err(e);
        }
    };

    // ── Step 5: Persist and pack document images ─────────────────────────
    let image_slides = match &request.source {
        Some(doc) if !doc.images.is_empty() => {
            let store = ImageStore::new(&config.image_root, &config.image_url_prefix);
            let request_id = ImageStore::new_request_id();
            let payloads = store.persist(&request_id, &doc.images).await?;
            pack_image_slides(&payloads, config.max_images_per_slide)
        }
        _ => Vec::new(),
    };

    // ── Step 6: Assemble ─────────────────────────────────────────────────
    assemble(
        ai_slides,
        image_slides,
        AssemblyInputs {
            topic,
            backend_used: backend.name(),
            started_at,
            has_source_document,
        },
    )
}
