//! HTTP feed fetcher.
//!
//! Retrieves the raw feed document.  Two quirks of real-world news sites
//! shape this:
//!
//! * intermediate caches happily serve stale feeds, so every request carries
//!   a fresh `_=<unix seconds>` query parameter;
//! * some servers reject non-browser clients, so we send a browser-like
//!   `User-Agent`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::FeedSource;
use crate::error::FetchError;

/// Browser identity sent with every feed request.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0 Safari/537.36";

/// Query parameter used to defeat caches.
const CACHE_BUST_PARAM: &str = "_";

/// Fetches the feed over HTTP(S).
pub struct HttpFetcher {
    client: Client,
    url: Url,
    label: String,
}

impl HttpFetcher {
    /// Create a fetcher for `url` with a bounded per-request `timeout`.
    ///
    /// # Arguments
    ///
    /// * `url`: the feed URL as configured (may already carry a query).
    /// * `label`: short name used in log lines.
    /// * `timeout`: upper bound on a whole request, so a hung server cannot
    ///   stall later cycles.
    pub fn new(
        url: &str,
        label: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let url = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url,
            label: label.into(),
        })
    }

    /// The request URL for a fetch at `timestamp` (unix seconds).
    ///
    /// Appends with `&` when the configured URL already has a query and `?`
    /// otherwise; `Url` takes care of that.
    pub fn cache_busted_url(&self, timestamp: i64) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair(CACHE_BUST_PARAM, &timestamp.to_string());
        url
    }
}

#[async_trait]
impl FeedSource for HttpFetcher {
    fn name(&self) -> &str {
        &self.label
    }

    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        let url = self.cache_busted_url(Utc::now().timestamp());
        debug!("Fetching {} from {url}", self.label);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        debug!("Fetched {} bytes from {}", body.len(), self.label);
        Ok(body.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(url: &str) -> HttpFetcher {
        HttpFetcher::new(url, "test", Duration::from_secs(5)).expect("valid test URL")
    }

    #[test]
    fn cache_bust_appends_to_existing_query() {
        let f = fetcher("https://news.example.com/feed?rss");
        assert_eq!(
            f.cache_busted_url(1_700_000_000).as_str(),
            "https://news.example.com/feed?rss&_=1700000000"
        );
    }

    #[test]
    fn cache_bust_starts_query_when_absent() {
        let f = fetcher("https://news.example.com/feed");
        assert_eq!(
            f.cache_busted_url(42).as_str(),
            "https://news.example.com/feed?_=42"
        );
    }

    #[test]
    fn invalid_url_is_rejected() {
        assert!(matches!(
            HttpFetcher::new("not a url", "t", Duration::from_secs(1)),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn name_returns_label() {
        assert_eq!(fetcher("http://example.com/feed").name(), "test");
    }

    #[tokio::test]
    async fn fetch_sends_cache_buster_and_browser_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<rss/>"))
            .expect(1)
            .mount(&server)
            .await;

        let f = fetcher(&format!("{}/feed?rss", server.uri()));
        let body = f.fetch().await.expect("fetch should succeed");

        assert_eq!(body, b"<rss/>");

        let requests = server.received_requests().await.expect("recording enabled");
        let query = requests[0].url.query().unwrap_or_default();
        assert!(query.starts_with("rss&_="), "unexpected query: {query}");
        let agent = requests[0]
            .headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok());
        assert_eq!(agent, Some(USER_AGENT));
    }

    #[tokio::test]
    async fn fetch_reports_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let f = fetcher(&format!("{}/feed", server.uri()));

        assert!(matches!(f.fetch().await, Err(FetchError::Status(503))));
    }

    #[tokio::test]
    async fn fetch_reports_transport_failure() {
        // Nothing listens on port 9 (discard) on test hosts.
        let f = fetcher("http://127.0.0.1:9/feed");
        assert!(matches!(f.fetch().await, Err(FetchError::Transport(_))));
    }

    #[tokio::test]
    async fn fetch_times_out_on_slow_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let f = HttpFetcher::new(
            &format!("{}/feed", server.uri()),
            "slow",
            Duration::from_millis(200),
        )
        .unwrap();

        assert!(matches!(f.fetch().await, Err(FetchError::Transport(_))));
    }
}
