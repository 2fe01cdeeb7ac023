//! Deck assembly: concatenate slide streams and attach metadata.
//!
//! Image slides always trail the AI-authored slides (the synthesised
//! visual appendix comes last) and the emptiness check happens here, on
//! the final concatenation, because an image-only deck is valid while a
//! deck with no slides at all never is. No partial decks exist: assembly
//! either fully succeeds or the whole request fails.

use std::time::Instant;
use tracing::info;

use crate::deck::{Deck, DeckMetadata, SlideRecord};
use crate::error::DeckError;

/// Observational inputs collected across the request, folded into
/// [`DeckMetadata`] at assembly time.
pub struct AssemblyInputs<'a> {
    pub topic: &'a str,
    pub backend_used: &'a str,
    /// Wall-clock start of the request; elapsed time to assembly
    /// completion becomes `generation_time_ms`.
    pub started_at: Instant,
    pub has_source_document: bool,
}

/// Concatenate AI slides and image slides into the final deck.
pub fn assemble(
    ai_slides: Vec<SlideRecord>,
    image_slides: Vec<SlideRecord>,
    inputs: AssemblyInputs<'_>,
) -> Result<Deck, DeckError> {
    let has_images = !image_slides.is_empty();

    let mut slides = ai_slides;
    slides.extend(image_slides);

    if slides.is_empty() {
        return Err(DeckError::EmptyDeck);
    }

    let generation_time_ms = inputs.started_at.elapsed().as_millis() as u64;
    let metadata = DeckMetadata {
        topic: inputs.topic.to_string(),
        backend_used: inputs.backend_used.to_string(),
        slide_count: slides.len(),
        generation_time_ms,
        has_source_document: inputs.has_source_document,
        has_images,
    };

    info!(
        "Assembled deck: {} slides via '{}' in {}ms",
        metadata.slide_count, metadata.backend_used, metadata.generation_time_ms
    );

    Ok(Deck { slides, metadata })
}
