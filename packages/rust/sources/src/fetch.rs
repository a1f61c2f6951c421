//! HTTP fetcher shared by every agent.
//!
//! One reqwest client per [`Fetcher`], a minimum interval between requests,
//! an SSRF guard on the first URL and on every redirect hop, and a response
//! size cap.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};
use url::Url;

use tadka_shared::{FetchConfig, Result, TadkaError};

/// User-Agent string for outgoing requests.
const USER_AGENT: &str = concat!("TadkaAgents/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Fetch results
// ---------------------------------------------------------------------------

/// A fetched text document (HTML page or feed).
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// URL that was requested.
    pub url: Url,
    /// URL after redirects.
    pub final_url: Url,
    pub status: u16,
    pub body: String,
    /// SHA-256 of the body, hex encoded.
    pub content_hash: String,
    pub fetched_at: DateTime<Utc>,
}

/// A fetched binary resource (image).
#[derive(Debug, Clone)]
pub struct FetchedBytes {
    pub url: Url,
    pub final_url: Url,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Rate-limited HTTP client with SSRF protection.
pub struct Fetcher {
    config: FetchConfig,
    client: Client,
    /// Allow loopback hosts (integration tests with mock servers). Shared
    /// with the client's redirect policy.
    allow_loopback: Arc<AtomicBool>,
    /// When the previous request was sent.
    last_request: Mutex<Option<Instant>>,
}

impl Fetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let allow_loopback = Arc::new(AtomicBool::new(false));
        let user_agent = config.user_agent.as_deref().unwrap_or(USER_AGENT);
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(redirect_policy(config.max_redirects, allow_loopback.clone()))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TadkaError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            allow_loopback,
            last_request: Mutex::new(None),
        })
    }

    /// Allow fetching from loopback hosts (mock servers in tests). Other
    /// private ranges stay blocked.
    pub fn allow_loopback(self) -> Self {
        self.allow_loopback.store(true, Ordering::Relaxed);
        self
    }

    /// Fetch a page or feed as text.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch_page(&self, url: &Url) -> Result<FetchedDocument> {
        let (final_url, status, _, bytes) = self.get(url).await?;
        let body = String::from_utf8_lossy(&bytes).into_owned();
        let content_hash = compute_hash(&body);

        debug!(%final_url, status, bytes = body.len(), "page fetched");

        Ok(FetchedDocument {
            url: url.clone(),
            final_url,
            status,
            body,
            content_hash,
            fetched_at: Utc::now(),
        })
    }

    /// Fetch a binary resource such as an image.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch_bytes(&self, url: &Url) -> Result<FetchedBytes> {
        let (final_url, _, content_type, bytes) = self.get(url).await?;
        debug!(%final_url, bytes = bytes.len(), "resource fetched");
        Ok(FetchedBytes {
            url: url.clone(),
            final_url,
            content_type,
            bytes,
        })
    }

    /// Wait until `rate_limit_ms` has passed since the previous request.
    async fn wait_turn(&self) {
        let interval = Duration::from_millis(self.config.rate_limit_ms);
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + interval).await;
        }
        *last = Some(Instant::now());
    }

    async fn get(&self, url: &Url) -> Result<(Url, u16, Option<String>, Vec<u8>)> {
        if is_blocked(url, self.allow_loopback.load(Ordering::Relaxed)) {
            warn!(%url, "SSRF protection: blocked");
            return Err(TadkaError::Network(format!(
                "{url}: blocked private or non-HTTP target"
            )));
        }

        self.wait_turn().await;

        let mut response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| TadkaError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TadkaError::Network(format!("{url}: HTTP {status}")));
        }

        let limit = self.config.max_response_bytes;
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(TadkaError::Network(format!(
                "{url}: response exceeds {limit} bytes"
            )));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| TadkaError::Network(format!("{url}: body read failed: {e}")))?
        {
            bytes.extend_from_slice(&chunk);
            if bytes.len() as u64 > limit {
                return Err(TadkaError::Network(format!(
                    "{url}: response exceeds {limit} bytes"
                )));
            }
        }

        Ok((final_url, status.as_u16(), content_type, bytes))
    }
}

// ---------------------------------------------------------------------------
// SSRF protection
// ---------------------------------------------------------------------------

/// Check if a URL targets a potentially dangerous resource.
pub fn is_ssrf_target(url: &Url) -> bool {
    // Block non-HTTP schemes
    match url.scheme() {
        "http" | "https" => {}
        _ => return true,
    }

    match url.host() {
        Some(url::Host::Ipv4(v4)) => is_private_ip(&IpAddr::V4(v4)),
        Some(url::Host::Ipv6(v6)) => is_private_ip(&IpAddr::V6(v6)),
        Some(url::Host::Domain(host)) => {
            host == "localhost" || host.ends_with(".local") || host.ends_with(".internal")
        }
        None => true,
    }
}

/// [`is_ssrf_target`], with loopback hosts let through when allowed.
fn is_blocked(url: &Url, allow_loopback: bool) -> bool {
    if allow_loopback {
        let loopback = match url.host() {
            Some(url::Host::Ipv4(v4)) => v4.is_loopback(),
            Some(url::Host::Ipv6(v6)) => v6.is_loopback(),
            Some(url::Host::Domain(host)) => host == "localhost",
            None => false,
        };
        if loopback && matches!(url.scheme(), "http" | "https") {
            return false;
        }
    }
    is_ssrf_target(url)
}

/// Follow at most `max_redirects` hops, refusing any hop that
/// [`is_blocked`] rejects.
fn redirect_policy(max_redirects: usize, allow_loopback: Arc<AtomicBool>) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() > max_redirects {
            attempt.error(format!("more than {max_redirects} redirects"))
        } else if is_blocked(attempt.url(), allow_loopback.load(Ordering::Relaxed)) {
            warn!(url = %attempt.url(), "SSRF protection: redirect blocked");
            let msg = format!(
                "redirect to blocked private or non-HTTP target {}",
                attempt.url()
            );
            attempt.error(msg)
        } else {
            attempt.follow()
        }
    })
}

/// Check if an IP is in a private/reserved range.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // 100.64.0.0/10 (Carrier-grade NAT)
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64)
                // 192.0.0.0/24
                || (v4.octets()[0] == 192 && v4.octets()[1] == 0 && v4.octets()[2] == 0)
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                // fc00::/7 unique local
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                // fe80::/10 link local
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

/// Compute SHA-256 hash of content.
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
