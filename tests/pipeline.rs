//! End-to-end pipeline tests for deckforge.
//!
//! No network: backends are in-test implementations of `SlideBackend`
//! returning canned response text, exactly the seam
//! `generate_with_backend` exists for. Image stores live in per-test
//! temp directories.

use async_trait::async_trait;
use deckforge::{
    generate_with_backend, Backend, DeckError, ExtractedImage, GenerationConfig,
    GenerationRequest, ImageMime, SlideBackend, SlideBody, SourceDocument,
};
use std::sync::Arc;
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────

/// A backend that returns fixed response text under a fixed name.
#[derive(Debug)]
struct CannedBackend {
    name: &'static str,
    response: String,
}

impl CannedBackend {
    fn new(name: &'static str, response: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name,
            response: response.into(),
        })
    }
}

#[async_trait]
impl SlideBackend for CannedBackend {
    fn name(&self) -> &'static str {
        self.name
    }
    async fn generate_raw(&self, _topic: &str, _source: &str) -> Result<String, DeckError> {
        Ok(self.response.clone())
    }
}

/// Config with an image root inside `dir` so tests never touch the CWD.
fn config_in(dir: &TempDir) -> GenerationConfig {
    GenerationConfig::builder()
        .api_key("test-key")
        .image_root(dir.path().join("images"))
        .build()
        .expect("config builds")
}

fn extracted_image(width: u32, height: u32) -> ExtractedImage {
    ExtractedImage {
        bytes: vec![0u8; 16],
        mime: ImageMime::Png,
        width,
        height,
    }
}

/// The hosted-shape response: an object wrapping a `slides` array.
const HOSTED_RESPONSE: &str = r#"Here is your deck:
{"slides": [
  {"title": "Intro", "html": "<p>welcome</p>", "image_query": "sunrise"},
  {"title": "Numbers", "table": {"headers": ["Year", "Users"], "rows": [["2024", "10"], ["2025", "40"]]}},
  {"title": "Trend", "chart": {"type": "line", "data": {"labels": ["Q1", "Q2"], "datasets": [{"name": "Growth", "data": [1.0, 3.5]}]}}}
]}
Let me know if you need changes!"#;

/// The local-shape response: a bare array, fenced despite instruction.
const LOCAL_RESPONSE: &str = "```json\n[\n  {\"title\": \"Intro\", \"html\": \"<p>welcome</p>\", \"image_query\": \"sunrise\"},\n  {\"title\": \"Numbers\", \"table\": {\"headers\": [\"Year\", \"Users\"], \"rows\": [[\"2024\", \"10\"], [\"2025\", \"40\"]]}},\n  {\"title\": \"Trend\", \"chart\": {\"type\": \"line\", \"data\": {\"labels\": [\"Q1\", \"Q2\"], \"datasets\": [{\"name\": \"Growth\", \"data\": [1.0, 3.5]}]}}}\n]\n```";

// ── Full pipeline ────────────────────────────────────────────────────────

#[tokio::test]
async fn hosted_shape_end_to_end() {
    let dir = TempDir::new().unwrap();
    let deck = generate_with_backend(
        &GenerationRequest::new("Growth report"),
        CannedBackend::new("hosted", HOSTED_RESPONSE),
        &config_in(&dir),
    )
    .await
    .unwrap();

    assert_eq!(deck.slides.len(), 3);
    assert!(matches!(deck.slides[0].body, SlideBody::Markup(_)));
    assert!(matches!(deck.slides[1].body, SlideBody::Table(_)));
    assert!(matches!(deck.slides[2].body, SlideBody::Chart(_)));
    assert_eq!(deck.slides[0].image_query.as_deref(), Some("sunrise"));
    assert_eq!(deck.metadata.topic, "Growth report");
    assert_eq!(deck.metadata.slide_count, 3);
    assert!(!deck.metadata.has_images);
}

#[tokio::test]
async fn backend_isolation_same_pipeline_either_shape() {
    // Swapping backends with equivalent content must produce decks that
    // differ only in `backend_used`; every stage downstream of the
    // adapter is backend-agnostic.
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let request = GenerationRequest::new("Growth report");

    let hosted = generate_with_backend(
        &request,
        CannedBackend::new("hosted", HOSTED_RESPONSE),
        &config,
    )
    .await
    .unwrap();
    let local = generate_with_backend(
        &request,
        CannedBackend::new("local", LOCAL_RESPONSE),
        &config,
    )
    .await
    .unwrap();

    assert_eq!(hosted.slides, local.slides);
    assert_eq!(hosted.metadata.topic, local.metadata.topic);
    assert_ne!(hosted.metadata.backend_used, local.metadata.backend_used);
}

#[tokio::test]
async fn document_images_become_trailing_slides() {
    let dir = TempDir::new().unwrap();
    // 5 images, ascending area: expect a 4-image slide then a 1-image one,
    // appended after the single AI slide.
    let images: Vec<_> = (1..=5).map(|n| extracted_image(100 * n, 100)).collect();
    let request = GenerationRequest::new("Annual review").with_source(SourceDocument {
        text: "source text".into(),
        images,
    });

    let deck = generate_with_backend(
        &request,
        CannedBackend::new("hosted", r#"{"slides":[{"title":"A","html":"<p>a</p>"}]}"#),
        &config_in(&dir),
    )
    .await
    .unwrap();

    assert_eq!(deck.slides.len(), 3);
    assert!(!deck.slides[0].is_image_slide);
    assert!(deck.slides[1].is_image_slide);
    assert!(deck.slides[2].is_image_slide);
    assert_ne!(deck.slides[1].title, deck.slides[2].title);
    assert!(deck.metadata.has_images);
    assert!(deck.metadata.has_source_document);

    match (&deck.slides[1].body, &deck.slides[2].body) {
        (SlideBody::Images(first), SlideBody::Images(rest)) => {
            assert_eq!(first.len(), 4);
            assert_eq!(rest.len(), 1);
            // Largest image leads; the smallest is alone on the overflow slide.
            assert_eq!(first[0].width, 500);
            assert_eq!(rest[0].width, 100);
            // Files were actually persisted where the URLs claim.
            assert!(first[0].url.starts_with("/api/images/request-"));
        }
        other => panic!("expected image bodies, got {other:?}"),
    }
}

#[tokio::test]
async fn document_only_deck_is_supported() {
    // Zero AI slides plus extracted images: a valid, image-only deck.
    let dir = TempDir::new().unwrap();
    let request = GenerationRequest::new("Scans").with_source(SourceDocument {
        text: String::new(),
        images: vec![extracted_image(800, 600)],
    });

    let deck = generate_with_backend(
        &request,
        CannedBackend::new("hosted", r#"{"slides":[]}"#),
        &config_in(&dir),
    )
    .await
    .unwrap();

    assert_eq!(deck.slides.len(), 1);
    assert!(deck.slides[0].is_image_slide);
    assert!(deck.metadata.has_images);
    // Empty source text means no document framing was sent to the model.
    assert!(!deck.metadata.has_source_document);
}

#[tokio::test]
async fn empty_everything_is_empty_deck_error() {
    let dir = TempDir::new().unwrap();
    let err = generate_with_backend(
        &GenerationRequest::new("Nothing"),
        CannedBackend::new("hosted", r#"{"slides":[]}"#),
        &config_in(&dir),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, DeckError::EmptyDeck));
    assert_eq!(err.user_message(), "No slides generated");
}

#[tokio::test]
async fn interior_corruption_fails_cleanly() {
    // The repair step fixes wrapping noise, not a broken interior: this
    // must surface as a parse failure, not a mangled deck.
    let dir = TempDir::new().unwrap();
    let err = generate_with_backend(
        &GenerationRequest::new("Broken"),
        CannedBackend::new("hosted", r#"{"slides": [{"title": "A", }}"#),
        &config_in(&dir),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, DeckError::ParseFailed { .. }));
    assert_eq!(
        err.user_message(),
        "Failed to parse AI response. The response may be invalid."
    );
}

#[tokio::test]
async fn deck_serialises_to_the_wire_shape() {
    let dir = TempDir::new().unwrap();
    let deck = generate_with_backend(
        &GenerationRequest::new("Wire"),
        CannedBackend::new("hosted", HOSTED_RESPONSE),
        &config_in(&dir),
    )
    .await
    .unwrap();

    let value = serde_json::to_value(&deck).unwrap();
    assert!(value["slides"].is_array());
    assert_eq!(value["slides"][0]["html"], "<p>welcome</p>");
    assert_eq!(value["slides"][1]["table"]["headers"][0], "Year");
    assert_eq!(value["metadata"]["backendUsed"], "hosted");
    assert!(value["metadata"]["generationTimeMs"].is_u64());

    // And back: the deck round-trips.
    let back: deckforge::Deck = serde_json::from_value(value).unwrap();
    assert_eq!(back, deck);
}

// ── Backend selection ────────────────────────────────────────────────────

#[test]
fn unknown_backend_name_fails_before_any_call() {
    let err = "chatgpt5".parse::<Backend>().unwrap_err();
    assert!(matches!(err, DeckError::Configuration { .. }));
}

// ── Throttle gate ────────────────────────────────────────────────────────

#[tokio::test]
async fn throttle_gate_is_shared_across_tasks() {
    use deckforge::ImageSearcher;
    use std::time::Duration;

    let searcher = Arc::new(ImageSearcher::with_throttle(
        Some("k".into()),
        Duration::from_secs(5),
    ));

    let a = Arc::clone(&searcher);
    let b = Arc::clone(&searcher);
    let (first, second) = tokio::join!(
        tokio::spawn(async move { a.check_throttle().await }),
        tokio::spawn(async move { b.check_throttle().await }),
    );

    let results = [first.unwrap(), second.unwrap()];
    let accepted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 1, "exactly one concurrent call may pass the gate");

    let rejected = results.into_iter().find(|r| r.is_err()).unwrap();
    match rejected.unwrap_err() {
        DeckError::RateLimited { retry_after_ms } => assert!(retry_after_ms <= 5_000),
        other => panic!("expected rate limit, got {other:?}"),
    }
}
