//! Output types: slides, decks, and the image payloads folded into them.
//!
//! ## The slide content union
//!
//! A slide carries exactly one kind of body: free-form markup, a table
//! spec, a chart spec, or a list of persisted images. Modelling this as
//! the closed enum [`SlideBody`] (rather than a struct with four optional
//! fields) makes "exactly one variant populated" a compile-time invariant.
//! On the wire the union is encoded the way the client renderer expects:
//! one of the keys `html` / `table` / `chart` / `images` on a flat object.
//!
//! ## Leniency
//!
//! AI backends do not guarantee field completeness, so deserialisation is
//! deliberately forgiving: a missing title is `None`, an absent or
//! malformed body collapses to [`SlideBody::Empty`] instead of failing the
//! record, and unknown keys are ignored. Structural admission happens in
//! [`crate::pipeline::validate`]; per-field strictness is explicitly not
//! this pipeline's contract.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DeckError;

// ── Slide records ────────────────────────────────────────────────────────

/// One slide of the generated deck.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideRecord {
    /// Slide title. Backends occasionally omit it on markup-bearing slides.
    pub title: Option<String>,
    /// The single content variant this slide carries.
    pub body: SlideBody,
    /// Hint for a later illustrative-image lookup, resolved by an external
    /// collaborator; this pipeline only passes it through.
    pub image_query: Option<String>,
    /// True only for slides synthesised by the image consolidator.
    pub is_image_slide: bool,
}

impl SlideRecord {
    /// A markup slide with a title, the common AI-authored shape.
    pub fn markup(title: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: SlideBody::Markup(html.into()),
            image_query: None,
            is_image_slide: false,
        }
    }

    /// An image slide synthesised from persisted document images.
    pub fn image_slide(title: impl Into<String>, images: Vec<ImagePayload>) -> Self {
        Self {
            title: Some(title.into()),
            body: SlideBody::Images(images),
            image_query: None,
            is_image_slide: true,
        }
    }
}

/// The content variant of a slide. Exactly one per record.
#[derive(Debug, Clone, PartialEq)]
pub enum SlideBody {
    /// Free-form markup block (`html` on the wire).
    Markup(String),
    /// Structured table.
    Table(TableSpec),
    /// Structured chart specification.
    Chart(ChartSpec),
    /// Persisted document images; only ever set on `is_image_slide` records.
    Images(Vec<ImagePayload>),
    /// The backend omitted every content key. Admitted structurally;
    /// consumers render such slides as title-only.
    Empty,
}

/// Table content: header row plus data rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableSpec {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

/// Chart content in the shape the client renderer feeds to its charting
/// library: labels on one axis, one or more datasets.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Chart kind ("bar", "line", …). Renderer falls back to "bar".
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<String>,
    #[serde(default)]
    pub data: ChartData,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartData {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub datasets: Vec<ChartDataset>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartDataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub data: Vec<f64>,
}

// ── Images ───────────────────────────────────────────────────────────────

/// Image format accepted from the extraction collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMime {
    Jpeg,
    Png,
}

impl ImageMime {
    /// File extension used when persisting, matching the served filename.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageMime::Jpeg => "jpg",
            ImageMime::Png => "png",
        }
    }
}

/// An image recovered from an uploaded document, before persistence.
/// Immutable once received from the extraction collaborator.
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    pub bytes: Vec<u8>,
    pub mime: ImageMime,
    pub width: u32,
    pub height: u32,
}

impl ExtractedImage {
    /// Decode a `data:image/(jpeg|png);base64,…` URI as produced by the
    /// document-extraction collaborator.
    ///
    /// Returns `None` for any other prefix: unsupported formats are
    /// skipped, not treated as errors, matching the extraction contract.
    pub fn from_data_uri(uri: &str, width: u32, height: u32) -> Option<Self> {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine as _;

        let (mime, rest) = if let Some(rest) = uri.strip_prefix("data:image/jpeg;base64,") {
            (ImageMime::Jpeg, rest)
        } else if let Some(rest) = uri.strip_prefix("data:image/png;base64,") {
            (ImageMime::Png, rest)
        } else {
            return None;
        };

        let bytes = STANDARD.decode(rest.trim()).ok()?;
        Some(Self {
            bytes,
            mime,
            width,
            height,
        })
    }

    /// Visual area in pixels; the packer's sort key.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// A persisted document image, addressable by URL. Produced by
/// [`crate::pipeline::images::ImageStore::persist`]; the in-memory
/// [`ExtractedImage`] is discarded once this exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl ImagePayload {
    /// Visual area in pixels; the packer's sort key.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

// ── Deck ─────────────────────────────────────────────────────────────────

/// The full validated slide sequence plus generation metadata, returned
/// once per request. Request-scoped: it has no persisted lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub slides: Vec<SlideRecord>,
    pub metadata: DeckMetadata,
}

/// Observational metadata about one generation. None of these fields feed
/// back into control decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckMetadata {
    pub topic: String,
    pub backend_used: String,
    pub slide_count: usize,
    pub generation_time_ms: u64,
    pub has_source_document: bool,
    pub has_images: bool,
}

// ── Wire (de)serialisation for SlideRecord ───────────────────────────────

/// Flat wire shape of a slide: the union is spread over optional keys.
/// `RawSlide` exists only at the serde boundary; everywhere else the
/// closed [`SlideBody`] enum is the source of truth.
#[derive(Serialize, Deserialize, Default)]
struct RawSlide {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    html: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    table: Option<TableSpec>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    chart: Option<ChartSpec>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    images: Option<Vec<ImagePayload>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_query: Option<String>,
    #[serde(rename = "isImageSlide", default, skip_serializing_if = "std::ops::Not::not")]
    is_image_slide: bool,
}

/// Deserialise a field, collapsing type mismatches to `None` instead of
/// failing the whole record. Backends emit the right key with the wrong
/// shape often enough that strictness here would reject usable decks.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

impl From<RawSlide> for SlideRecord {
    fn from(raw: RawSlide) -> Self {
        // Precedence when a backend populates several keys: the most
        // structured variant wins. Exactly one survives.
        let body = if let Some(images) = raw.images {
            SlideBody::Images(images)
        } else if let Some(chart) = raw.chart {
            SlideBody::Chart(chart)
        } else if let Some(table) = raw.table {
            SlideBody::Table(table)
        } else if let Some(html) = raw.html {
            SlideBody::Markup(html)
        } else {
            SlideBody::Empty
        };

        SlideRecord {
            title: raw.title,
            body,
            image_query: raw.image_query,
            is_image_slide: raw.is_image_slide,
        }
    }
}

impl From<&SlideRecord> for RawSlide {
    fn from(slide: &SlideRecord) -> Self {
        let mut raw = RawSlide {
            title: slide.title.clone(),
            image_query: slide.image_query.clone(),
            is_image_slide: slide.is_image_slide,
            ..RawSlide::default()
        };
        match &slide.body {
            SlideBody::Markup(html) => raw.html = Some(html.clone()),
            SlideBody::Table(t) => raw.table = Some(t.clone()),
            SlideBody::Chart(c) => raw.chart = Some(c.clone()),
            SlideBody::Images(imgs) => raw.images = Some(imgs.clone()),
            SlideBody::Empty => {}
        }
        raw
    }
}

impl Serialize for SlideRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RawSlide::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SlideRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawSlide::deserialize(deserializer).map(SlideRecord::from)
    }
}

impl SlideRecord {
    /// Convert a parsed JSON value into a slide record.
    ///
    /// Fails only when `value` is not an object at all; any object is
    /// admitted, however sparse.
    pub fn from_value(value: serde_json::Value) -> Result<Self, DeckError> {
        if !value.is_object() {
            return Err(DeckError::Schema {
                detail: format!("slide entry is not an object: {value}"),
            });
        }
        serde_json::from_value(value).map_err(|e| DeckError::Schema {
            detail: format!("slide entry rejected: {e}"),
        })
    }
}
