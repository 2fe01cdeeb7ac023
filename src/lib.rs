//! # deckforge
//!
//! Generate structured slide decks from a topic (and optionally a source
//! document) using one of two interchangeable AI backends.
//!
//! ## Why this crate?
//!
//! Asking a language model for "a slide deck as JSON" gets you something
//! JSON-*shaped*: wrapped in markdown fences, prefixed with an
//! acknowledgement, sprinkled with trailing commas, or followed by
//! commentary. The hard part is not calling the API, it is turning that
//! unreliable free-form response into a validated, structurally consistent
//! slide sequence, while folding a second independent stream (images
//! extracted from an uploaded document) into the same deck without
//! exceeding layout limits. deckforge guarantees *structural* validity and
//! deterministic recovery/rejection; it makes no claim about the semantic
//! quality of what the model wrote.
//!
//! ## Pipeline Overview
//!
//! ```text
//! topic + source text
//!  │
//!  ├─ 1. Backend    hosted (generateContent) or local (chat completions)
//!  ├─ 2. Repair     recover the JSON fragment from noisy response text
//!  ├─ 3. Validate   structural admission of the slide sequence
//!  ├─ 4. Images     persist extracted images, pack into image slides
//!  └─ 5. Assemble   AI slides + image-slide suffix + metadata
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deckforge::{generate, Backend, GenerationConfig, GenerationRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Hosted credential read from GEMINI_API_KEY by default.
//!     let config = GenerationConfig::builder()
//!         .backend(Backend::Hosted)
//!         .build()?;
//!     let deck = generate(&GenerationRequest::new("The Rust borrow checker"), &config).await?;
//!     println!("{} slides in {}ms", deck.metadata.slide_count, deck.metadata.generation_time_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `deckforge` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! deckforge = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod deck;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod prompts;
pub mod search;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Backend, GenerationConfig, GenerationConfigBuilder, MAX_TOPIC_CHARS};
pub use deck::{
    ChartData, ChartDataset, ChartSpec, Deck, DeckMetadata, ExtractedImage, ImageMime,
    ImagePayload, SlideBody, SlideRecord, TableSpec,
};
pub use error::DeckError;
pub use generate::{generate, generate_with_backend, GenerationRequest, SourceDocument};
pub use pipeline::backend::SlideBackend;
pub use search::{Attribution, ImageHit, ImageSearcher};
