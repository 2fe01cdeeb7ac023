//! Image persistence and consolidation.
//!
//! Two concerns live here because they share the [`ImagePayload`] type and
//! nothing else touches it:
//!
//! 1. [`ImageStore`] turns the extraction collaborator's in-memory images
//!    into addressable files under a per-request namespace. Writes are
//!    dispatched concurrently (each image's persistence is independent)
//!    and the resulting payload list is restored to extraction order
//!    before it is handed on.
//! 2. [`pack_image_slides`] folds the persisted payloads into synthetic
//!    image slides: stable sort by descending visual area, then sequential
//!    chunks of at most `max_per_slide`. Chunking is deliberately not a
//!    bin-packing optimisation over visual balance; larger images are
//!    assumed to be primary figures and simply lead the visual section.

use futures::future;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::deck::{ExtractedImage, ImagePayload, SlideRecord};
use crate::error::DeckError;

/// Title of the first synthesised image slide.
pub const PRIMARY_VISUALS_TITLE: &str = "Visuals from Source Document";
/// Title of every overflow image slide.
pub const OVERFLOW_VISUALS_TITLE: &str = "Additional Visuals";

/// Filesystem store for per-request document images.
///
/// Each request gets a fresh `request-{uuid}` directory under `root`, so
/// concurrent requests can never collide. The served URL mirrors the path:
/// `{url_prefix}/request-{uuid}/image_{n}.{ext}`.
pub struct ImageStore {
    root: PathBuf,
    url_prefix: String,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }

    /// Generate a fresh request namespace.
    pub fn new_request_id() -> String {
        format!("request-{}", Uuid::new_v4())
    }

    /// Persist all extracted images under `request_id`, concurrently.
    ///
    /// The returned payloads are in the original extraction order
    /// regardless of write completion order; the packer re-sorts by area
    /// afterwards, but extraction order is the tie-break it relies on.
    pub async fn persist(
        &self,
        request_id: &str,
        images: &[ExtractedImage],
    ) -> Result<Vec<ImagePayload>, DeckError> {
        if images.is_empty() {
            return Ok(Vec::new());
        }

        let dir = self.root.join(request_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| DeckError::ImageWrite {
                path: dir.clone(),
                source: e,
            })?;

        let writes = images.iter().enumerate().map(|(index, image)| {
            let filename = format!("image_{}.{}", index + 1, image.mime.extension());
            let path = dir.join(&filename);
            let url = format!("{}/{}/{}", self.url_prefix, request_id, filename);
            let payload = ImagePayload {
                url,
                width: image.width,
                height: image.height,
            };
            async move {
                tokio::fs::write(&path, &image.bytes)
                    .await
                    .map_err(|e| DeckError::ImageWrite { path, source: e })?;
                Ok::<_, DeckError>(payload)
            }
        });

        // join_all preserves input order, so extraction order survives the
        // concurrent dispatch.
        let payloads = future::join_all(writes)
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        info!("Persisted {} images under {}", payloads.len(), dir.display());
        Ok(payloads)
    }

    /// Remove one request's image directory. Best-effort cleanup used by
    /// callers that own the request lifecycle.
    pub async fn remove_request(&self, request_id: &str) -> std::io::Result<()> {
        tokio::fs::remove_dir_all(self.root.join(request_id)).await
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Group persisted images into image slides.
///
/// - Empty input → empty output (no-op stage).
/// - Stable sort by descending `width * height`; ties keep extraction
///   order, so equally-sized images appear as extracted.
/// - Sequential chunks of at most `max_per_slide`, each chunk one slide;
///   the first slide is titled distinctly from overflow slides.
pub fn pack_image_slides(images: &[ImagePayload], max_per_slide: usize) -> Vec<SlideRecord> {
    if images.is_empty() || max_per_slide == 0 {
        return Vec::new();
    }

    let mut sorted: Vec<ImagePayload> = images.to_vec();
    sorted.sort_by(|a, b| b.area().cmp(&a.area()));

    let slides: Vec<SlideRecord> = sorted
        .chunks(max_per_slide)
        .enumerate()
        .map(|(i, chunk)| {
            let title = if i == 0 {
                PRIMARY_VISUALS_TITLE
            } else {
                OVERFLOW_VISUALS_TITLE
            };
            SlideRecord::image_slide(title, chunk.to_vec())
        })
        .collect();

    debug!(
        "Packed {} images into {} image slides",
        images.len(),
        slides.len()
    );
    slides
}
