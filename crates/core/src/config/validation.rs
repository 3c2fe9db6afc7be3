//! Sanity checks on a merged [`AppConfig`].
//!
//! Validation runs once, after figment has layered defaults, file, and
//! environment. A config that passes here is safe to hand to the
//! lifecycle and origin client without further checks.

use crate::config::AppConfig;
use crate::route::{Bucket, classify};
use thiserror::Error;

/// What went wrong while loading or checking the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Reject values the gateway cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field. The
    /// checks cover the origin URL scheme, bucket-name safety of
    /// `cache_version`, the photo cap, the precache manifest and offline
    /// document, and the origin client limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.upstream_origin.starts_with("http://") && !self.upstream_origin.starts_with("https://") {
            return Err(ConfigError::Invalid {
                field: "upstream_origin".into(),
                reason: "must be an http:// or https:// URL".into(),
            });
        }

        if self.cache_version.is_empty() {
            return Err(ConfigError::Invalid { field: "cache_version".into(), reason: "must not be empty".into() });
        }
        if !self.cache_version.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
            return Err(ConfigError::Invalid {
                field: "cache_version".into(),
                reason: "only ASCII alphanumerics and dots are usable in bucket names".into(),
            });
        }

        if self.photo_cache_cap == 0 {
            return Err(ConfigError::Invalid {
                field: "photo_cache_cap".into(),
                reason: "a cap of 0 would empty the photo bucket on every trim".into(),
            });
        }

        if self.precache_assets.is_empty() {
            return Err(ConfigError::Invalid {
                field: "precache_assets".into(),
                reason: "must list at least one path".into(),
            });
        }
        for asset in &self.precache_assets {
            if !asset.starts_with('/') {
                return Err(ConfigError::Invalid {
                    field: "precache_assets".into(),
                    reason: format!("path {asset:?} must start with '/'"),
                });
            }
        }

        if !self.precache_assets.contains(&self.offline_path) {
            return Err(ConfigError::Invalid {
                field: "offline_path".into(),
                reason: "must be listed in precache_assets so it is available offline".into(),
            });
        }

        if self.max_bytes == 0 || self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid {
                field: "max_bytes".into(),
                reason: "must be between 1 byte and 50MB".into(),
            });
        }

        if !(100..=300_000).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must be between 100ms and 5 minutes".into(),
            });
        }

        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be blank".into() });
        }

        let shadowed = self
            .precache_assets
            .iter()
            .filter(|asset| {
                let path = asset.split_once('?').map_or(asset.as_str(), |(p, _)| p);
                classify(path).bucket == Bucket::Photos
            })
            .count();
        if shadowed > 0 {
            tracing::warn!(
                count = shadowed,
                "Precache assets that classify as photos land in the static \
                 bucket; stale-while-revalidate looks only in the photo \
                 bucket, so they are re-fetched on first request"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected_field(result: Result<(), ConfigError>) -> String {
        match result {
            Err(ConfigError::Invalid { field, .. }) => field,
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_default_config() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_bad_upstream_origin() {
        let config = AppConfig { upstream_origin: "ftp://example.com".into(), ..Default::default() };
        assert_eq!(rejected_field(config.validate()), "upstream_origin");
    }

    #[test]
    fn test_validate_cache_version() {
        let empty = AppConfig { cache_version: String::new(), ..Default::default() };
        assert_eq!(rejected_field(empty.validate()), "cache_version");

        let punctuated = AppConfig { cache_version: "v6-beta!".into(), ..Default::default() };
        assert_eq!(rejected_field(punctuated.validate()), "cache_version");
    }

    #[test]
    fn test_validate_photo_cap_zero() {
        let config = AppConfig { photo_cache_cap: 0, ..Default::default() };
        assert_eq!(rejected_field(config.validate()), "photo_cache_cap");
    }

    #[test]
    fn test_validate_empty_manifest() {
        let config = AppConfig { precache_assets: Vec::new(), ..Default::default() };
        assert_eq!(rejected_field(config.validate()), "precache_assets");
    }

    #[test]
    fn test_validate_relative_manifest_path() {
        let config = AppConfig {
            precache_assets: vec!["/".into(), "styles.css".into(), "/offline.html".into()],
            ..Default::default()
        };
        assert_eq!(rejected_field(config.validate()), "precache_assets");
    }

    #[test]
    fn test_validate_offline_path_must_be_precached() {
        let config =
            AppConfig { precache_assets: vec!["/".into(), "/styles.css".into()], ..Default::default() };
        assert_eq!(rejected_field(config.validate()), "offline_path");
    }

    #[test]
    fn test_validate_max_bytes_bounds() {
        let zero = AppConfig { max_bytes: 0, ..Default::default() };
        assert_eq!(rejected_field(zero.validate()), "max_bytes");

        let oversized = AppConfig { max_bytes: 51 * 1024 * 1024, ..Default::default() };
        assert_eq!(rejected_field(oversized.validate()), "max_bytes");
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let hasty = AppConfig { timeout_ms: 50, ..Default::default() };
        assert_eq!(rejected_field(hasty.validate()), "timeout_ms");

        let glacial = AppConfig { timeout_ms: 301_000, ..Default::default() };
        assert_eq!(rejected_field(glacial.validate()), "timeout_ms");
    }

    #[test]
    fn test_validate_blank_user_agent() {
        let config = AppConfig { user_agent: "   ".into(), ..Default::default() };
        assert_eq!(rejected_field(config.validate()), "user_agent");
    }

    #[test]
    fn test_validate_smallest_legal_values() {
        let config = AppConfig { max_bytes: 1, timeout_ms: 100, photo_cache_cap: 1, ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
