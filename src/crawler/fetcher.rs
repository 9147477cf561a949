//! HTTP page fetcher with charset detection
//!
//! This module provides the page retrieval capability consumed by the
//! monitor workers, including:
//! - A shared connection pool with a per-request timeout
//! - A fixed browser-like User-Agent
//! - A body size cap
//! - Charset detection (Content-Type, then `<meta charset>`, then UTF-8)

use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use regex::bytes::Regex;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE},
    Client, Response,
};
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

use crate::config::FetcherConfig;
use crate::utils::error::FetchError;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default User-Agent sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/139.0.0.0 Safari/537.36";

/// Default body size cap (10 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 << 20;

/// Retrieves the raw markup of a page
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return its body as text
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// reqwest-backed page fetcher
///
/// One instance is shared by all monitors so connections are reused.
pub struct HttpFetcher {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Bytes read from a body before the rest is discarded
    max_body_bytes: usize,
}

impl HttpFetcher {
    /// Create a fetcher with default settings
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, DEFAULT_MAX_BODY_BYTES)
    }

    /// Create a fetcher from the `fetcher` configuration section
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn from_config(config: &FetcherConfig) -> Result<Self, FetchError> {
        Self::with_config(
            config.timeout(),
            &config.user_agent,
            config.max_body_bytes,
        )
    }

    /// Create a fetcher with custom configuration
    ///
    /// # Arguments
    ///
    /// * `timeout` - Whole-request timeout
    /// * `user_agent` - User-Agent header value
    /// * `max_body_bytes` - Body size cap; excess bytes are dropped
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn with_config(
        timeout: Duration,
        user_agent: &str,
        max_body_bytes: usize,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .user_agent(user_agent)
            .default_headers(Self::build_headers())
            .pool_max_idle_per_host(20)
            .build()?;

        Ok(Self {
            client,
            max_body_bytes,
        })
    }

    /// Browser-like headers sent with every request
    fn build_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9,*;q=0.5"),
        );
        headers
    }

    /// Read the body up to the size cap, then decode it
    async fn read_body(&self, mut response: Response) -> Result<String, FetchError> {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_default();

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(map_reqwest_error)? {
            let remaining = self.max_body_bytes.saturating_sub(body.len());
            if chunk.len() >= remaining {
                body.extend_from_slice(&chunk[..remaining]);
                tracing::warn!(
                    limit = self.max_body_bytes,
                    "Response body truncated at size limit"
                );
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(decode_body(&body, &content_type))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = self.read_body(response).await?;
        tracing::debug!(url, bytes = body.len(), "Page fetched");
        Ok(body)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Http(e)
    }
}

/// Decode a body using the best charset hint available.
///
/// Order: `charset=` in the Content-Type header, a `<meta charset>` tag in
/// the first kilobyte, UTF-8. Malformed sequences become U+FFFD.
pub fn decode_body(bytes: &[u8], content_type: &str) -> String {
    let encoding = charset_from_content_type(content_type)
        .or_else(|| charset_from_meta(bytes))
        .unwrap_or(UTF_8);

    let (text, _encoding, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(encoding = encoding.name(), "Body contained malformed sequences");
    }
    text.into_owned()
}

fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    let lower = content_type.to_ascii_lowercase();
    let label = lower.split(';').find_map(|part| {
        part.trim()
            .strip_prefix("charset=")
            .map(|v| v.trim_matches(|c| c == '"' || c == '\''))
    })?;
    Encoding::for_label(label.as_bytes())
}

fn charset_from_meta(bytes: &[u8]) -> Option<&'static Encoding> {
    static META_CHARSET: OnceLock<Regex> = OnceLock::new();

    let re = META_CHARSET.get_or_init(|| {
        Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([a-z0-9_\-]+)"#)
            .expect("Invalid regex pattern")
    });

    let head = &bytes[..bytes.len().min(1024)];
    let label = re.captures(head)?.get(1)?;
    Encoding::for_label(label.as_bytes())
}
