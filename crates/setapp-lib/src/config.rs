//! Centralized installer settings.
//! Defaults are static constants; `InstallerConfig::from_env` layers the
//! `SETAPP_GET_*` environment overrides on top, and the CLI applies its flags last.

use std::path::PathBuf;
use std::time::Duration;

// URL Constants
pub const DEFAULT_CATALOG_URL: &str = "https://store.setapp.com/store/api/v8/en";

pub const DEFAULT_DESTINATION: &str = "/Applications/Setapp";
pub const BUNDLE_SUFFIX: &str = ".app";
pub const CACHE_DIR_NAME: &str = "setapp-get";
pub const CACHE_FILENAME: &str = "catalog.json";

/// Used when the catalog response carries no usable max-age
pub const FALLBACK_CACHE_HOURS: u64 = 4;
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
/// Longest silence tolerated while an archive is downloading
pub const DOWNLOAD_IDLE_TIMEOUT_SECS: u64 = 60;
pub const FETCH_ATTEMPTS: u32 = 3;

pub const ENV_CATALOG_URL: &str = "SETAPP_GET_CATALOG_URL";
pub const ENV_DESTINATION: &str = "SETAPP_GET_DESTINATION";
pub const ENV_CACHE_PATH: &str = "SETAPP_GET_CACHE_PATH";

#[derive(Debug, Clone)]
pub struct InstallerConfig {
    /// Remote catalog endpoint
    pub catalog_url: String,

    /// Directory bundles are placed into
    pub destination: PathBuf,

    /// Suffix identifying an installable bundle inside an archive
    pub bundle_suffix: String,

    /// Scratch space for downloads and extraction
    pub temp_dir: PathBuf,

    /// Location of the persisted catalog cache
    pub cache_path: PathBuf,

    pub cache_fallback: Duration,
    /// Whole-request limit for the catalog fetch
    pub request_timeout: Duration,

    /// Archive downloads have no overall limit, only this per-read one
    pub download_idle_timeout: Duration,

    pub fetch_attempts: u32,

    /// Upper bound on concurrently running pipelines in parallel mode.
    /// `None` starts every target at once.
    pub concurrency: Option<usize>,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            destination: PathBuf::from(DEFAULT_DESTINATION),
            bundle_suffix: BUNDLE_SUFFIX.to_string(),
            temp_dir: std::env::temp_dir(),
            cache_path: default_cache_path(),
            cache_fallback: Duration::from_secs(FALLBACK_CACHE_HOURS * 60 * 60),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            download_idle_timeout: Duration::from_secs(DOWNLOAD_IDLE_TIMEOUT_SECS),
            fetch_attempts: FETCH_ATTEMPTS,
            concurrency: None,
        }
    }
}

impl InstallerConfig {
    /// Defaults plus any overrides found in the process environment
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(ENV_CATALOG_URL) {
            log::debug!("Catalog URL overridden: {}", url);
            self.catalog_url = url;
        }
        if let Some(dest) = non_empty(ENV_DESTINATION) {
            log::debug!("Destination overridden: {}", dest);
            self.destination = PathBuf::from(dest);
        }
        if let Some(path) = non_empty(ENV_CACHE_PATH) {
            log::debug!("Cache path overridden: {}", path);
            self.cache_path = PathBuf::from(path);
        }
        self
    }
}

/// `<user cache dir>/setapp-get/catalog.json`, or the temp dir when the
/// platform reports no home directory.
pub fn default_cache_path() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir)
        .join(CACHE_DIR_NAME)
        .join(CACHE_FILENAME)
}
