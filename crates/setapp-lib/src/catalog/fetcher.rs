use super::cache::{CacheRecord, CacheStore};
use super::types::CatalogDocument;
use crate::error::CatalogError;
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderName, CACHE_CONTROL, ETAG, EXPIRES, LAST_MODIFIED};
use std::sync::Arc;
use std::time::Duration;

/// Response metadata that drives cache expiry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogHeaders {
    pub cache_control: Option<String>,
    pub expires: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl CatalogHeaders {
    pub fn from_header_map(headers: &HeaderMap) -> Self {
        let get = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self {
            cache_control: get(CACHE_CONTROL),
            expires: get(EXPIRES),
            etag: get(ETAG),
            last_modified: get(LAST_MODIFIED),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchedCatalog {
    pub document: CatalogDocument,
    pub headers: CatalogHeaders,
}

/// Remote source of the catalog document.
pub trait CatalogSource: Send + Sync {
    fn fetch(&self) -> BoxFuture<'_, Result<FetchedCatalog>>;
}

/// `GET`s the catalog over HTTP, retrying transport and status failures with
/// exponential backoff. A body that fails to parse is not retried.
pub struct HttpCatalogSource {
    client: reqwest::Client,
    url: String,
    attempts: u32,
    initial_backoff: Duration,
}

impl HttpCatalogSource {
    pub fn new(url: impl Into<String>, timeout: Duration, attempts: u32) -> Result<Self> {
        // Create HTTP client with timeout to prevent hanging requests
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: url.into(),
            attempts: attempts.max(1),
            initial_backoff: Duration::from_millis(1000),
        })
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    async fn fetch_with_retry(&self) -> Result<FetchedCatalog> {
        let mut last_error = None;

        for attempt in 0..self.attempts {
            if attempt > 0 {
                let backoff = self.initial_backoff * 2u32.pow(attempt - 1);
                log::info!(
                    "Retrying catalog fetch (attempt {}/{}) after {}ms...",
                    attempt + 1,
                    self.attempts,
                    backoff.as_millis()
                );
                tokio::time::sleep(backoff).await;
            }

            let response = match self.client.get(&self.url).send().await {
                Ok(response) => response,
                Err(e) => {
                    log::warn!("Failed to GET catalog: {}", e);
                    last_error = Some(anyhow::anyhow!("Failed to GET {}: {}", self.url, e));
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                log::warn!("HTTP {} from catalog URL", status);
                last_error = Some(anyhow::anyhow!("HTTP {} from {}", status, self.url));
                continue;
            }

            let headers = CatalogHeaders::from_header_map(response.headers());
            let document = response
                .json::<CatalogDocument>()
                .await
                .context("Catalog response does not match the expected document shape")?;

            log::info!("Fetched catalog from {}", self.url);
            return Ok(FetchedCatalog { document, headers });
        }

        Err(last_error.unwrap_or_else(|| {
            anyhow::anyhow!("Failed to fetch catalog after {} attempts", self.attempts)
        }))
    }
}

impl CatalogSource for HttpCatalogSource {
    fn fetch(&self) -> BoxFuture<'_, Result<FetchedCatalog>> {
        Box::pin(self.fetch_with_retry())
    }
}

/// Extract `max-age` (seconds) from a Cache-Control value
pub fn parse_max_age(cache_control: &str) -> Option<i64> {
    cache_control.split(',').find_map(|directive| {
        let (key, value) = directive.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("max-age") {
            return None;
        }
        value
            .trim()
            .trim_matches('"')
            .parse::<i64>()
            .ok()
            .filter(|secs| *secs >= 0)
    })
}

/// Parse an HTTP date (`Wed, 21 Oct 2015 07:28:00 GMT`) into epoch millis
pub fn parse_http_date(value: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.timestamp_millis())
}

/// Expiry for a response fetched at `fetched_at`: `fetched_at + max-age`
/// (or the fallback window), clamped to the absolute `Expires` when that is
/// sooner.
pub fn compute_expiry(headers: &CatalogHeaders, fetched_at: i64, fallback: Duration) -> i64 {
    let max_age_millis = headers
        .cache_control
        .as_deref()
        .and_then(parse_max_age)
        .map(|secs| secs.saturating_mul(1000))
        .unwrap_or(fallback.as_millis() as i64);

    let relative = fetched_at.saturating_add(max_age_millis);

    match headers.expires.as_deref().and_then(parse_http_date) {
        Some(absolute) => relative.min(absolute),
        None => relative,
    }
}

/// Cache-first access to the catalog
pub struct CatalogClient {
    store: CacheStore,
    source: Arc<dyn CatalogSource>,
    fallback_window: Duration,
    force_refresh: bool,
}

impl CatalogClient {
    pub fn new(store: CacheStore, source: Arc<dyn CatalogSource>, fallback_window: Duration) -> Self {
        Self {
            store,
            source,
            fallback_window,
            force_refresh: false,
        }
    }

    /// Skip a still-valid cache and always hit the remote source
    pub fn force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }

    pub async fn get_catalog(&self, now_millis: i64) -> Result<CatalogDocument, CatalogError> {
        if self.force_refresh {
            log::info!("Catalog refresh forced, ignoring cache");
        } else {
            match self.store.load().await {
                Some(record) if record.is_valid(now_millis) => {
                    log::info!(
                        "Using cached catalog (expires in {}s)",
                        (record.expiry - now_millis) / 1000
                    );
                    return Ok(record.data);
                }
                Some(_) => log::info!("Cached catalog is stale, refreshing..."),
                None => log::info!("No cached catalog found, fetching fresh..."),
            }
        }

        let fetched = self.source.fetch().await.map_err(|e| {
            log::error!("Failed to fetch catalog: {:#}", e);
            CatalogError::Unavailable(format!("{:#}", e))
        })?;

        let expiry = compute_expiry(&fetched.headers, now_millis, self.fallback_window);
        let record = CacheRecord {
            data: fetched.document,
            expiry,
            etag: fetched.headers.etag,
            last_modified: fetched.headers.last_modified,
        };

        if let Err(e) = self.store.save(&record).await {
            log::warn!("Failed to save catalog cache: {:#}", e);
        }

        Ok(record.data)
    }
}
