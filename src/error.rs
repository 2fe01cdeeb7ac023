//! Error types for the deckforge library.
//!
//! Every pipeline stage reports failures through one enum, [`DeckError`],
//! so the request boundary can classify an error once and map it to a
//! fixed caller-facing message via [`DeckError::user_message`]. Internal
//! detail (raw model output, upstream status text) lives only in the
//! `Display` output and tracing diagnostics; it is never part of the
//! per-category client string, because model output must not leak to
//! clients outside diagnostic builds.
//!
//! The taxonomy separates *where* a generation failed:
//!
//! * configuration: the selected backend is unusable before any I/O
//! * transport / upstream: the backend network call itself
//! * structure recovery: the response text could not be repaired or parsed
//! * assembly: everything worked but the deck came out empty

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the deckforge library.
#[derive(Debug, Error)]
pub enum DeckError {
    // ── Request validation ───────────────────────────────────────────────
    /// The topic failed request-level validation (empty, or over 200 chars).
    #[error("Invalid topic: {reason}")]
    InvalidTopic { reason: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Backend selection / transport ────────────────────────────────────
    /// The selected backend cannot be used: unknown name or missing credential.
    /// Raised before any network call is attempted; there is no silent
    /// fallback between backends.
    #[error("Backend not usable: {detail}")]
    Configuration { detail: String },

    /// Network-level failure reaching a backend. `local` distinguishes the
    /// locally-hosted inference server (connection refused usually means the
    /// service is simply not running) from a generic network failure.
    #[error("Transport error{}: {detail}", if *.local { " (local inference server)" } else { "" })]
    Transport { detail: String, local: bool },

    /// The backend was reachable but returned a failure status.
    #[error("Upstream error from '{backend}' (status {status}): {detail}")]
    Upstream {
        backend: &'static str,
        status: u16,
        detail: String,
    },

    /// The backend response envelope was missing a required field
    /// (e.g. no `choices`), detected before any content extraction.
    #[error("Unexpected response shape from '{backend}': {detail}")]
    UpstreamFormat {
        backend: &'static str,
        detail: String,
    },

    // ── Structure recovery ───────────────────────────────────────────────
    /// The raw response contained no `{`/`[` opening marker, or the closing
    /// marker did not come after it. Nothing to repair.
    #[error("No JSON structure found in the AI response")]
    NoStructureFound,

    /// The repaired fragment still failed to parse as JSON.
    #[error("Failed to parse repaired AI response: {detail}")]
    ParseFailed { detail: String },

    /// The parsed value was structurally invalid (not a slide sequence).
    #[error("AI response is not a slide sequence: {detail}")]
    Schema { detail: String },

    // ── Assembly ─────────────────────────────────────────────────────────
    /// No slides at all after full assembly (AI slides + image slides).
    #[error("No slides generated")]
    EmptyDeck,

    // ── Image handling ───────────────────────────────────────────────────
    /// Persisting an extracted image to the store failed.
    #[error("Failed to write image '{path}': {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Image search ─────────────────────────────────────────────────────
    /// A search call arrived inside the global throttle window. The caller
    /// must wait `retry_after_ms` before retrying; requests are rejected,
    /// never queued.
    #[error("Image search throttled, retry in {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// The search upstream returned no usable result for the query.
    #[error("No suitable image found")]
    ImageNotFound,
}

impl DeckError {
    /// The fixed caller-facing message for this error's category.
    ///
    /// One string per category, matching how the request boundary reports
    /// failures to clients. Parse and schema failures share a message on
    /// purpose: the distinction matters for diagnostics, not for users.
    pub fn user_message(&self) -> &'static str {
        match self {
            DeckError::InvalidTopic { .. } => "Topic is required and must be under 200 characters.",
            DeckError::InvalidConfig(_) | DeckError::Configuration { .. } => {
                "AI service not configured properly. Please check API keys."
            }
            DeckError::Transport { local: true, .. } => {
                "Local AI server is not running. Please start it and try again."
            }
            DeckError::Transport { local: false, .. } => {
                "Network error or AI service is not running."
            }
            DeckError::Upstream { detail, .. } if is_quota_message(detail) => {
                "AI service quota exceeded. Please try again later."
            }
            DeckError::Upstream { .. } | DeckError::UpstreamFormat { .. } => {
                "AI service returned an unexpected response. Please try again."
            }
            DeckError::NoStructureFound
            | DeckError::ParseFailed { .. }
            | DeckError::Schema { .. } => {
                "Failed to parse AI response. The response may be invalid."
            }
            DeckError::EmptyDeck => "No slides generated",
            DeckError::ImageWrite { .. } => "Failed to store document images.",
            DeckError::RateLimited { .. } => "Too many image requests. Please try again shortly.",
            DeckError::ImageNotFound => "No suitable image found for this query.",
        }
    }
}

/// Quota exhaustion is detected by message content: upstreams report it with
/// varying status codes but a recognisable wording.
fn is_quota_message(detail: &str) -> bool {
    let d = detail.to_ascii_lowercase();
    d.contains("quota") || d.contains("rate limit") || d.contains("resource_exhausted")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_display_marks_local() {
        let e = DeckError::Transport {
            detail: "connection refused".into(),
            local: true,
        };
        assert!(e.to_string().contains("local inference server"));
    }

    #[test]
    fn transport_display_generic() {
        let e = DeckError::Transport {
            detail: "dns failure".into(),
            local: false,
        };
        assert!(!e.to_string().contains("local inference server"));
    }

    #[test]
    fn quota_maps_to_quota_message() {
        let e = DeckError::Upstream {
            backend: "hosted",
            status: 429,
            detail: "Quota exceeded for model".into(),
        };
        assert!(e.user_message().contains("quota exceeded"));
    }

    #[test]
    fn parse_and_schema_share_user_message() {
        let parse = DeckError::ParseFailed {
            detail: "unexpected eof".into(),
        };
        let schema = DeckError::Schema {
            detail: "expected array".into(),
        };
        assert_eq!(parse.user_message(), schema.user_message());
    }

    #[test]
    fn user_message_never_echoes_detail() {
        let e = DeckError::ParseFailed {
            detail: "raw model text that must not leak".into(),
        };
        assert!(!e.user_message().contains("raw model text"));
    }

    #[test]
    fn empty_deck_is_distinct() {
        assert_eq!(DeckError::EmptyDeck.user_message(), "No slides generated");
    }
}
