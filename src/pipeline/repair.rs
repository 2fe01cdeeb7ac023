//! Text repair: recover a JSON fragment from noisy model output.
//!
//! ## Why is this necessary?
//!
//! Language-model output is not reliably pure JSON, however firmly the
//! prompt forbids extras. The two dominant real-world noise patterns are
//!
//! - wrapping text: a leading acknowledgement ("Sure! Here are your
//!   slides:"), markdown fences, or trailing commentary around the data
//! - trailing commas before a closing bracket, which strict JSON rejects
//!
//! [`extract_structured_fragment`] repairs exactly these two patterns with
//! a cheap bracket-position heuristic. It is intentionally *not* a
//! tolerant parser: interior corruption still fails cleanly downstream,
//! which is what we want: silently "fixing" broken content would hand
//! garbage to the validator.
//!
//! ## Known limitation
//!
//! The heuristic picks the *earliest* opening and *latest* closing bracket
//! regardless of type or balance. A prose preamble that itself contains an
//! unmatched bracket (say, a sentence mentioning "[citation]") shifts the
//! start and mis-extracts. This is an accepted approximation; callers who
//! need rigour can opt into [`balanced_fragment`], which honours string
//! literals and bracket balance but recovers less aggressively. The two
//! are never substituted for each other silently.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::error::DeckError;

/// A recovered fragment plus the diagnostic tail that was discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// The cleaned JSON slice, trimmed of surrounding whitespace.
    pub json: String,
    /// Non-whitespace text that followed the computed end index. Backends
    /// sometimes append commentary after the data; it is surfaced here (and
    /// logged) as a diagnostic, never as an error.
    pub discarded_tail: Option<String>,
}

static RE_TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
    Regex::new(r",(\s*[}\]])").unwrap()
});

/// Recover a syntactically plausible JSON fragment from `raw`.
///
/// Algorithm (a heuristic, not a parser):
/// 1. Fragment start = the earlier of the first `{` and the first `[`.
/// 2. Fragment end = the *later* of the last `}` and the last `]`; the
///    closing marker is chosen by position, not by matching the opening
///    marker's type.
/// 3. Fail with [`DeckError::NoStructureFound`] if no opening marker
///    exists or end ≤ start.
/// 4. Slice inclusively, strip trailing commas before closing markers,
///    remove all line breaks, trim.
///
/// Pure function of its input: fixed input, fixed output.
pub fn extract_structured_fragment(raw: &str) -> Result<Fragment, DeckError> {
    let obj_start = raw.find('{');
    let arr_start = raw.find('[');
    let start = match (obj_start, arr_start) {
        (Some(o), Some(a)) => o.min(a),
        (Some(o), None) => o,
        (None, Some(a)) => a,
        (None, None) => return Err(DeckError::NoStructureFound),
    };

    let obj_end = raw.rfind('}');
    let arr_end = raw.rfind(']');
    let end = match (obj_end, arr_end) {
        (Some(o), Some(a)) => o.max(a),
        (Some(o), None) => o,
        (None, Some(a)) => a,
        (None, None) => return Err(DeckError::NoStructureFound),
    };

    if end <= start {
        return Err(DeckError::NoStructureFound);
    }

    let slice = &raw[start..=end];

    let repaired = RE_TRAILING_COMMA.replace_all(slice, "$1");
    // Literal line breaks inside the slice break downstream parsing when
    // they land inside string values; drop them wholesale.
    let cleaned: String = repaired.chars().filter(|c| *c != '\n' && *c != '\r').collect();

    let tail = raw[end + 1..].trim();
    let discarded_tail = if tail.is_empty() {
        None
    } else {
        warn!("Discarding trailing non-JSON content: {}", tail);
        Some(tail.to_string())
    };

    Ok(Fragment {
        json: cleaned.trim().to_string(),
        discarded_tail,
    })
}

/// Stricter alternative to [`extract_structured_fragment`]: scan for the
/// first opening bracket and return the slice up to its *balanced* closing
/// bracket, skipping brackets inside JSON string literals.
///
/// Opt-in hardening for callers bitten by the positional heuristic's
/// known preamble-bracket limitation. Applies the same trailing-comma and
/// line-break cleanup so the output contract matches.
pub fn balanced_fragment(raw: &str) -> Result<Fragment, DeckError> {
    let start = match (raw.find('{'), raw.find('[')) {
        (Some(o), Some(a)) => o.min(a),
        (Some(o), None) => o,
        (None, Some(a)) => a,
        (None, None) => return Err(DeckError::NoStructureFound),
    };

    let bytes = raw.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut end = None;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    end = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }

    let end = end.ok_or(DeckError::NoStructureFound)?;
    let slice = &raw[start..=end];
    let repaired = RE_TRAILING_COMMA.replace_all(slice, "$1");
    let cleaned: String = repaired.chars().filter(|c| *c != '\n' && *c != '\r').collect();

    let tail = raw[end + 1..].trim();
    Ok(Fragment {
        json: cleaned.trim().to_string(),
        discarded_tail: (!tail.is_empty()).then(|| tail.to_string()),
    })
}
