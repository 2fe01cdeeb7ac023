//! Illustrative-image search proxy with a process-wide throttle gate.
//!
//! Slide renderers resolve each slide's `image_query` hint through this
//! helper. The upstream photo API enforces a strict request budget, so
//! calls are spaced by a single gate shared across *all* concurrent
//! requests: one last-call timestamp behind a lock. A call arriving inside
//! the throttle window is rejected with an explicit retry-after value,
//! never queued or silently delayed, so callers can surface a proper
//! retry signal instead of hanging.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::DeckError;

/// Minimum spacing between two upstream search calls.
pub const DEFAULT_THROTTLE: Duration = Duration::from_secs(5);

const SEARCH_URL: &str = "https://api.unsplash.com/search/photos";

/// One search result: a usable image URL plus photographer attribution
/// when the upstream supplied it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageHit {
    pub image_url: String,
    pub attribution: Option<Attribution>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribution {
    pub name: String,
    pub username: String,
    pub link: String,
}

// Upstream response shape (only the fields we read).
#[derive(Deserialize)]
struct SearchResponse {
    results: Option<Vec<SearchResult>>,
}

#[derive(Deserialize)]
struct SearchResult {
    urls: ResultUrls,
    user: Option<ResultUser>,
}

#[derive(Deserialize)]
struct ResultUrls {
    regular: String,
}

#[derive(Deserialize)]
struct ResultUser {
    name: String,
    username: String,
    links: ResultUserLinks,
}

#[derive(Deserialize)]
struct ResultUserLinks {
    html: String,
}

/// Rate-limited search client. Share one instance process-wide; the gate
/// only throttles calls that go through the same instance.
pub struct ImageSearcher {
    access_key: Option<String>,
    throttle: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl ImageSearcher {
    pub fn new(access_key: Option<String>) -> Self {
        Self::with_throttle(access_key, DEFAULT_THROTTLE)
    }

    pub fn with_throttle(access_key: Option<String>, throttle: Duration) -> Self {
        Self {
            access_key: access_key.filter(|k| !k.is_empty()),
            throttle,
            last_call: Mutex::new(None),
        }
    }

    /// Reserve a call slot, or report how long to wait.
    ///
    /// On success the gate timestamp advances immediately; a concurrent
    /// caller racing us will see the updated timestamp and be rejected.
    /// The returned retry-after is always within `[0, throttle]`.
    pub async fn check_throttle(&self) -> Result<(), DeckError> {
        let mut last = self.last_call.lock().await;
        let now = Instant::now();
        if let Some(previous) = *last {
            let elapsed = now.duration_since(previous);
            if elapsed < self.throttle {
                let wait = self.throttle - elapsed;
                debug!("Image search throttled for {}ms", wait.as_millis());
                return Err(DeckError::RateLimited {
                    retry_after_ms: wait.as_millis() as u64,
                });
            }
        }
        *last = Some(now);
        Ok(())
    }

    /// Search for one landscape photo matching `query`.
    pub async fn search(&self, query: &str) -> Result<ImageHit, DeckError> {
        let access_key = self.access_key.as_deref().ok_or_else(|| {
            DeckError::Configuration {
                detail: "image search access key not configured".to_string(),
            }
        })?;

        self.check_throttle().await?;

        info!("Searching for image: '{}'", query);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| DeckError::Transport {
                detail: e.to_string(),
                local: false,
            })?;

        let response = client
            .get(SEARCH_URL)
            .query(&[
                ("query", query),
                ("per_page", "1"),
                ("orientation", "landscape"),
                ("content_filter", "high"),
            ])
            .header("Authorization", format!("Client-ID {access_key}"))
            .header("Accept-Version", "v1")
            .send()
            .await
            .map_err(|e| DeckError::Transport {
                detail: e.to_string(),
                local: false,
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DeckError::Upstream {
                backend: "image-search",
                status: status.as_u16(),
                detail,
            });
        }

        let parsed: SearchResponse =
            response.json().await.map_err(|e| DeckError::UpstreamFormat {
                backend: "image-search",
                detail: format!("response body was not JSON: {e}"),
            })?;

        let result = parsed
            .results
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or(DeckError::ImageNotFound)?;

        Ok(ImageHit {
            image_url: result.urls.regular,
            attribution: result.user.map(|u| Attribution {
                name: u.name,
                username: u.username,
                link: u.links.html,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_call_passes_second_is_throttled() {
        let searcher = ImageSearcher::with_throttle(Some("k".into()), Duration::from_secs(5));
        searcher.check_throttle().await.unwrap();

        let err = searcher.check_throttle().await.unwrap_err();
        match err {
            DeckError::RateLimited { retry_after_ms } => {
                assert!(retry_after_ms <= 5_000, "retry-after beyond window");
            }
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn gate_reopens_after_window() {
        tokio::time::pause();
        let searcher = ImageSearcher::with_throttle(Some("k".into()), Duration::from_millis(100));
        searcher.check_throttle().await.unwrap();
        tokio::time::advance(Duration::from_millis(150)).await;
        searcher.check_throttle().await.unwrap();
    }

    #[tokio::test]
    async fn rejected_call_does_not_advance_the_gate() {
        tokio::time::pause();
        let searcher = ImageSearcher::with_throttle(Some("k".into()), Duration::from_millis(100));
        searcher.check_throttle().await.unwrap();

        tokio::time::advance(Duration::from_millis(60)).await;
        assert!(searcher.check_throttle().await.is_err());

        // 110ms after the *accepted* call: had the rejected call advanced
        // the gate this would still be throttled.
        tokio::time::advance(Duration::from_millis(50)).await;
        searcher.check_throttle().await.unwrap();
    }

    #[tokio::test]
    async fn missing_key_is_configuration_error() {
        let searcher = ImageSearcher::new(None);
        let err = searcher.search("mountains").await.unwrap_err();
        assert!(matches!(err, DeckError::Configuration { .. }));
    }

    #[test]
    fn search_response_parses_minimal_shape() {
        let raw = serde_json::json!({
            "results": [{
                "urls": {"regular": "https://images.example/photo.jpg", "small": "x"},
                "user": {
                    "name": "Ada",
                    "username": "ada",
                    "links": {"html": "https://unsplash.com/@ada"}
                }
            }]
        });
        let parsed: SearchResponse = serde_json::from_value(raw).unwrap();
        let results = parsed.results.unwrap();
        let result = &results[0];
        assert_eq!(result.urls.regular, "https://images.example/photo.jpg");
        assert_eq!(result.user.as_ref().unwrap().username, "ada");
    }
}
