//! Structural admission of the recovered fragment.
//!
//! The contract here is deliberately narrow: the fragment must parse as
//! JSON and must yield a sequence of slide objects, after unwrapping a
//! `slides` envelope when the backend used one. Nothing else is checked.
//! Per-field strictness is not this pipeline's job; backends do not
//! guarantee field completeness and downstream consumers are defensive
//! about absent titles and bodies.
//!
//! Emptiness is *not* rejected here. A deck may legitimately end up with
//! zero AI-authored slides when document images make up the difference;
//! the only place an empty deck is an error is at assembly time, on the
//! final concatenation.

use tracing::debug;

use crate::deck::SlideRecord;
use crate::error::DeckError;
use crate::pipeline::repair::Fragment;

/// Parse and structurally admit a repaired fragment as a slide sequence.
///
/// Accepts both backend shapes:
/// - hosted: `{"slides": [...]}` (the envelope is unwrapped)
/// - local: `[...]` (the bare array)
///
/// Fails with [`DeckError::ParseFailed`] when the fragment is not JSON,
/// and [`DeckError::Schema`] when the (unwrapped) value is not an array.
pub fn validate_slides(fragment: &Fragment) -> Result<Vec<SlideRecord>, DeckError> {
    let value: serde_json::Value =
        serde_json::from_str(&fragment.json).map_err(|e| DeckError::ParseFailed {
            detail: e.to_string(),
        })?;

    let sequence = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("slides") {
            Some(serde_json::Value::Array(items)) => items,
            Some(other) => {
                return Err(DeckError::Schema {
                    detail: format!("'slides' field is not an array: {other}"),
                })
            }
            None => {
                return Err(DeckError::Schema {
                    detail: "object response has no 'slides' field".to_string(),
                })
            }
        },
        other => {
            return Err(DeckError::Schema {
                detail: format!("expected an array or a slides object, got {other}"),
            })
        }
    };

    let slides = sequence
        .into_iter()
        .map(SlideRecord::from_value)
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Admitted {} AI-authored slides", slides.len());
    Ok(slides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::SlideBody;

    fn fragment(json: &str) -> Fragment {
        Fragment {
            json: json.to_string(),
            discarded_tail: None,
        }
    }

    #[test]
    fn bare_array_is_admitted() {
        let slides =
            validate_slides(&fragment(r#"[{"title":"A","html":"<p>x</p>"}]"#)).unwrap();
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].title.as_deref(), Some("A"));
    }

    #[test]
    fn slides_envelope_is_unwrapped() {
        let slides =
            validate_slides(&fragment(r#"{"slides":[{"title":"A"},{"title":"B"}]}"#)).unwrap();
        assert_eq!(slides.len(), 2);
    }

    #[test]
    fn empty_array_is_admitted_here() {
        // Emptiness is an assembly-time concern, not a schema one.
        let slides = validate_slides(&fragment("[]")).unwrap();
        assert!(slides.is_empty());
    }

    #[test]
    fn non_json_is_parse_failure() {
        let err = validate_slides(&fragment("{not json")).unwrap_err();
        assert!(matches!(err, DeckError::ParseFailed { .. }));
    }

    #[test]
    fn scalar_is_schema_failure() {
        let err = validate_slides(&fragment("42")).unwrap_err();
        assert!(matches!(err, DeckError::Schema { .. }));
    }

    #[test]
    fn object_without_slides_field_is_schema_failure() {
        let err = validate_slides(&fragment(r#"{"deck":[]}"#)).unwrap_err();
        assert!(matches!(err, DeckError::Schema { .. }));
    }

    #[test]
    fn non_array_slides_field_is_schema_failure() {
        let err = validate_slides(&fragment(r#"{"slides":"three of them"}"#)).unwrap_err();
        assert!(matches!(err, DeckError::Schema { .. }));
    }

    #[test]
    fn non_object_entry_is_schema_failure() {
        let err = validate_slides(&fragment(r#"["just a string"]"#)).unwrap_err();
        assert!(matches!(err, DeckError::Schema { .. }));
    }

    #[test]
    fn validation_is_idempotent() {
        // Admitting a sequence, re-serialising it, and admitting it again
        // yields the same records.
        let first =
            validate_slides(&fragment(r#"[{"title":"A","html":"<p>x</p>"},{"title":"B"}]"#))
                .unwrap();
        let reserialised = serde_json::to_string(&first).unwrap();
        let second = validate_slides(&fragment(&reserialised)).unwrap();
        assert_eq!(first, second);
        assert!(matches!(second[1].body, SlideBody::Empty));
    }
}
