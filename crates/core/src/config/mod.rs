//! Runtime settings for the gateway.
//!
//! Settings are assembled with figment by stacking three sources: built-in
//! defaults at the bottom, an optional TOML file named by
//! `PORTICO_CONFIG_FILE`, and `PORTICO_`-prefixed environment variables on
//! top. Each layer overrides the one below it.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Paths precached into the static bucket at startup.
///
/// These are the assets the site needs to render at all: the shell pages,
/// core styles and scripts, logos, self-hosted fonts, and the offline
/// fallback document. The offline document must be in this list so it is
/// always available when the origin is down.
pub const DEFAULT_PRECACHE_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/styles.css",
    "/script.js",
    "/script-deferred.js",
    "/shared.js",
    "/assets/logo.png",
    "/assets/logo-dark.png",
    "/articles/recommended-articles.js",
    "/articles/article-shared.css",
    "/assets/fonts/inter-v20-latin-regular.woff2",
    "/assets/fonts/space-mono-v17-latin-regular.woff2",
    "/assets/fonts/instrument-serif-v5-latin-regular.woff2",
    "/assets/fonts.css",
    "/offline.html",
];

/// Everything the gateway needs to run.
///
/// Construct with [`AppConfig::load`] to pick up the TOML file and
/// environment overrides, or with `Default::default()` in tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Socket address the gateway listens on.
    ///
    /// Set via PORTICO_LISTEN_ADDR environment variable.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Base URL of the origin server the gateway fronts.
    ///
    /// Set via PORTICO_UPSTREAM_ORIGIN environment variable.
    #[serde(default = "default_upstream_origin")]
    pub upstream_origin: String,

    /// Filesystem path of the SQLite database holding cached responses.
    ///
    /// Set via PORTICO_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Cache version label, e.g. "v6".
    ///
    /// Bucket names are derived from this ("static-v6"). Bumping it orphans
    /// every bucket of the previous version; activation then deletes them.
    /// Set via PORTICO_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Maximum number of entries kept in the photo bucket after a trim.
    ///
    /// Set via PORTICO_PHOTO_CACHE_CAP environment variable.
    #[serde(default = "default_photo_cache_cap")]
    pub photo_cache_cap: u64,

    /// Paths fetched and stored into the static bucket at startup.
    ///
    /// Set via PORTICO_PRECACHE_ASSETS environment variable or config file.
    #[serde(default = "default_precache_assets")]
    pub precache_assets: Vec<String>,

    /// Path of the offline fallback document served to navigations when
    /// both the origin and the page cache miss.
    ///
    /// Must appear in `precache_assets`.
    /// Set via PORTICO_OFFLINE_PATH environment variable.
    #[serde(default = "default_offline_path")]
    pub offline_path: String,

    /// User-Agent header sent with every origin request.
    ///
    /// Set via PORTICO_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Largest origin response body the gateway will read, in bytes.
    ///
    /// Responses over this size fail rather than truncate.
    /// Set via PORTICO_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// How long to wait on the origin, in milliseconds, before the
    /// request counts as failed and cache fallback kicks in.
    ///
    /// Set via PORTICO_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".into()
}

fn default_upstream_origin() -> String {
    "http://127.0.0.1:3000".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./portico-cache.sqlite")
}

fn default_cache_version() -> String {
    "v6".into()
}

fn default_photo_cache_cap() -> u64 {
    200
}

fn default_precache_assets() -> Vec<String> {
    DEFAULT_PRECACHE_ASSETS.iter().copied().map(String::from).collect()
}

fn default_offline_path() -> String {
    "/offline.html".into()
}

fn default_user_agent() -> String {
    "portico/0.1".into()
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB, full-size photos included
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            upstream_origin: default_upstream_origin(),
            db_path: default_db_path(),
            cache_version: default_cache_version(),
            photo_cache_cap: default_photo_cache_cap(),
            precache_assets: default_precache_assets(),
            offline_path: default_offline_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Origin timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolve the effective configuration.
    ///
    /// Merges, lowest layer first: built-in defaults, the TOML file named
    /// by `PORTICO_CONFIG_FILE` when that variable is set, and `PORTICO_`
    /// environment variables. Nested keys use `__` in the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a source fails to parse or the merged
    /// result does not validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PORTICO_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("PORTICO_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.upstream_origin, "http://127.0.0.1:3000");
        assert_eq!(config.db_path, PathBuf::from("./portico-cache.sqlite"));
        assert_eq!(config.cache_version, "v6");
        assert_eq!(config.photo_cache_cap, 200);
        assert_eq!(config.offline_path, "/offline.html");
        assert_eq!(config.user_agent, "portico/0.1");
        assert_eq!(config.max_bytes, 10_485_760);
        assert_eq!(config.timeout_ms, 10_000);
    }

    #[test]
    fn test_default_manifest_includes_offline_document() {
        let config = AppConfig::default();
        assert!(config.precache_assets.contains(&config.offline_path));
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig { timeout_ms: 2_500, ..Default::default() };
        assert_eq!(config.timeout(), Duration::from_millis(2_500));
    }
}
