//! Client configuration.
//!
//! Only the API token is required. `from_env` reads the same settings from
//! environment variables:
//!
//! - `CDN_API_TOKEN` (required) - delivery API token
//! - `CDN_BASE_URL` (optional) - defaults to [`DEFAULT_BASE_URL`]
//! - `CDN_AUTO_CACHE_INVALIDATION` (optional) - `1`, `true` or `yes` to
//!   refresh the cache version before every content request

use crate::error::{ApiError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.storyblok.com/v1/cdn";

pub const ENV_TOKEN: &str = "CDN_API_TOKEN";
pub const ENV_BASE_URL: &str = "CDN_BASE_URL";
pub const ENV_AUTO_CACHE_INVALIDATION: &str = "CDN_AUTO_CACHE_INVALIDATION";

/// What a fetch does when the automatic cache version refresh fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheRefreshFailure {
    /// Abort the fetch with `ApiError::CacheRefresh`.
    #[default]
    Propagate,
    /// Log a warning and send the request with the last known version, if any.
    Degrade,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub token: String,
    pub auto_cache_invalidation: bool,
    pub base_url: String,
    pub cache_refresh_failure: CacheRefreshFailure,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            auto_cache_invalidation: false,
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_refresh_failure: CacheRefreshFailure::default(),
        }
    }

    pub fn with_auto_cache_invalidation(mut self, enabled: bool) -> Self {
        self.auto_cache_invalidation = enabled;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_cache_refresh_failure(mut self, policy: CacheRefreshFailure) -> Self {
        self.cache_refresh_failure = policy;
        self
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, config file, test map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(ENV_TOKEN)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ApiError::Config(format!("{ENV_TOKEN} is not set")))?;

        let mut config = Self::new(token);
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|u| !u.trim().is_empty()) {
            config.base_url = base_url;
        }
        if let Some(raw) = lookup(ENV_AUTO_CACHE_INVALIDATION) {
            config.auto_cache_invalidation = parse_bool(&raw).ok_or_else(|| {
                ApiError::Config(format!(
                    "{ENV_AUTO_CACHE_INVALIDATION} must be a boolean, got `{raw}`"
                ))
            })?;
        }
        Ok(config)
    }

    /// Reject configurations no request could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(ApiError::invalid("API token must not be empty"));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ApiError::Config(format!(
                "base URL `{}` must start with http:// or https://",
                self.base_url
            )));
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
