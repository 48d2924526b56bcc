//! Asset fetcher.
//!
//! Downloads imagery referenced by a candidate, rejects anything that is
//! not a raster before decoding, and tries ordered URL variants under one
//! time budget.

use std::time::Duration;

use futures::stream::{FuturesOrdered, StreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::raster::{is_accepted_format, RasterAsset};

/// Largest payload accepted from an image host.
pub const DEFAULT_MAX_BYTES: usize = 25 * 1024 * 1024;

/// Timing for one multi-variant acquisition.
#[derive(Debug, Clone, Copy)]
pub struct AcquirePolicy {
    /// Timeout for each individual variant attempt
    pub attempt_timeout: Duration,
    /// Wall-clock budget for all variants together
    pub budget: Duration,
}

impl Default for AcquirePolicy {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(12),
            budget: Duration::from_secs(30),
        }
    }
}

/// Reject payloads that are not raster images.
///
/// Markup is detected from both the declared content type and the leading
/// bytes, so an HTML error page served as `image/jpeg` is still refused.
pub fn sniff_payload(content_type: Option<&str>, bytes: &[u8]) -> MediaResult<()> {
    if bytes.is_empty() {
        return Err(MediaError::unsupported("empty body"));
    }

    if let Some(ct) = content_type {
        let ct = ct.to_ascii_lowercase();
        if ct.contains("html") || ct.contains("xml") || ct.contains("svg") {
            return Err(MediaError::unsupported(format!("markup content type {ct}")));
        }
    }

    let head = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let first = head.iter().find(|b| !b.is_ascii_whitespace());
    if first == Some(&b'<') {
        return Err(MediaError::unsupported("markup payload"));
    }

    match image::guess_format(bytes) {
        Ok(format) if is_accepted_format(format) => Ok(()),
        Ok(format) => Err(MediaError::unsupported(format!("{format:?} is not accepted"))),
        Err(_) => Err(MediaError::unsupported("unrecognized image signature")),
    }
}

/// HTTP image downloader.
#[derive(Clone)]
pub struct AssetFetcher {
    client: Client,
    max_bytes: usize,
}

impl AssetFetcher {
    pub fn new(timeout: Duration) -> MediaResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("trend-poster/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            max_bytes: DEFAULT_MAX_BYTES,
        })
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Download and decode one image.
    pub async fn fetch(&self, url: &str) -> MediaResult<RasterAsset> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MediaError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::from_status(status.as_u16(), url));
        }

        if response
            .content_length()
            .is_some_and(|len| len as usize > self.max_bytes)
        {
            return Err(MediaError::unsupported(format!("{url} exceeds {} bytes", self.max_bytes)));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MediaError::from_reqwest(url, e))?;
        if bytes.len() > self.max_bytes {
            return Err(MediaError::unsupported(format!("{url} exceeds {} bytes", self.max_bytes)));
        }

        sniff_payload(content_type.as_deref(), &bytes)?;

        // Decoding large images is CPU-bound.
        let url_owned = url.to_string();
        tokio::task::spawn_blocking(move || RasterAsset::decode(&bytes, Some(&url_owned)))
            .await
            .map_err(|e| MediaError::Decode(format!("decode task failed: {e}")))?
    }

    /// Try `urls` concurrently and return the first success in declared order.
    ///
    /// Each attempt has its own timeout; the whole acquisition is bounded by
    /// `policy.budget`. The last error is returned when every variant fails.
    pub async fn fetch_first(&self, urls: &[String], policy: AcquirePolicy) -> MediaResult<RasterAsset> {
        if urls.is_empty() {
            return Err(MediaError::NoVariants);
        }

        let run = async {
            let mut attempts: FuturesOrdered<_> = urls
                .iter()
                .map(|url| async move {
                    match tokio::time::timeout(policy.attempt_timeout, self.fetch(url)).await {
                        Ok(result) => (url, result),
                        Err(_) => (url, Err(MediaError::Timeout(url.clone()))),
                    }
                })
                .collect();

            let mut last_error = MediaError::NoVariants;
            while let Some((url, result)) = attempts.next().await {
                match result {
                    Ok(asset) => return Ok(asset),
                    Err(e) => {
                        debug!(url = %url, "Asset variant failed: {}", e);
                        last_error = e;
                    }
                }
            }
            Err(last_error)
        };

        match tokio::time::timeout(policy.budget, run).await {
            Ok(result) => result,
            Err(_) => {
                warn!(variants = urls.len(), budget_ms = policy.budget.as_millis() as u64, "Asset budget exhausted");
                Err(MediaError::Timeout(format!(
                    "asset budget of {}ms exhausted",
                    policy.budget.as_millis()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::test_support::encoded;
    use image::ImageFormat;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> AssetFetcher {
        AssetFetcher::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_sniff_rejects_markup() {
        assert!(sniff_payload(Some("text/html; charset=utf-8"), b"\x89PNG").unwrap_err().is_unsupported());
        assert!(sniff_payload(Some("image/svg+xml"), b"<svg/>").unwrap_err().is_unsupported());
        assert!(sniff_payload(Some("image/jpeg"), b"  <!DOCTYPE html><html>").unwrap_err().is_unsupported());
        assert!(sniff_payload(None, b"<?xml version=\"1.0\"?>").unwrap_err().is_unsupported());
        assert!(sniff_payload(Some("image/png"), b"").unwrap_err().is_unsupported());
    }

    #[test]
    fn test_sniff_accepts_raster() {
        let png = encoded(2, 2, [0, 0, 0, 255], ImageFormat::Png);
        assert!(sniff_payload(Some("application/octet-stream"), &png).is_ok());
    }

    #[tokio::test]
    async fn test_html_error_page_is_unsupported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/poster.jpg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .set_body_string("<html><body>Access denied</body></html>"),
            )
            .mount(&server)
            .await;

        let err = fetcher()
            .fetch(&format!("{}/poster.jpg", server.uri()))
            .await
            .unwrap_err();
        assert!(err.is_unsupported());
    }

    #[tokio::test]
    async fn test_fetch_decodes_jpeg() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/poster.jpg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .set_body_bytes(encoded(20, 30, [90, 90, 90, 255], ImageFormat::Jpeg)),
            )
            .mount(&server)
            .await;

        let asset = fetcher().fetch(&format!("{}/poster.jpg", server.uri())).await.unwrap();
        assert_eq!((asset.width(), asset.height()), (20, 30));
    }

    #[tokio::test]
    async fn test_fetch_first_prefers_declared_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(encoded(5, 5, [1, 2, 3, 255], ImageFormat::Png))
                    .set_delay(Duration::from_millis(150)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/c.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(encoded(7, 7, [4, 5, 6, 255], ImageFormat::Png)))
            .mount(&server)
            .await;

        let urls: Vec<String> = ["a", "b", "c"]
            .iter()
            .map(|n| format!("{}/{n}.png", server.uri()))
            .collect();
        let asset = fetcher().fetch_first(&urls, AcquirePolicy::default()).await.unwrap();
        assert_eq!(asset.width(), 5);
    }

    #[tokio::test]
    async fn test_fetch_first_all_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let urls = vec![format!("{}/x.png", server.uri()), format!("{}/y.png", server.uri())];
        let err = fetcher().fetch_first(&urls, AcquirePolicy::default()).await.unwrap_err();
        assert!(matches!(err, MediaError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_fetch_first_attempt_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(encoded(2, 2, [0, 0, 0, 255], ImageFormat::Png))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let policy = AcquirePolicy {
            attempt_timeout: Duration::from_millis(100),
            budget: Duration::from_secs(2),
        };
        let urls = vec![format!("{}/slow.png", server.uri())];
        let err = fetcher().fetch_first(&urls, policy).await.unwrap_err();
        assert!(matches!(err, MediaError::Timeout(_)));
    }
}
