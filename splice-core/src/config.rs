//! Centralized configuration for Splice.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::SpliceError;

/// Central configuration for all Splice components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct SpliceConfig {
    pub server: ServerConfig,
    pub streaming: StreamingConfig,
    pub playback: PlaybackConfig,
    pub listing: ListingConfig,
}

/// HTTP server binding and media resolution.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind the API server to
    pub host: String,
    /// Port to bind the API server to
    pub port: u16,
    /// Directory media paths resolve beneath (None = absolute request paths)
    pub media_root: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            media_root: None,
        }
    }
}

impl ServerConfig {
    /// Returns the `host:port` pair the server listens on.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Range serving parameters.
#[derive(Debug, Clone)]
pub struct StreamingConfig {
    /// Chunk size used when streaming file bodies
    pub read_chunk_size: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: 65536, // 64 KiB
        }
    }
}

/// Segment playback controller configuration.
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Window within which a load must report ready or error
    pub load_timeout: Duration,
    /// Source substituted for a segment that fails to load or play
    pub fallback_source: Option<Url>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            load_timeout: Duration::from_millis(10_000),
            fallback_source: None,
        }
    }
}

/// Remote directory listing retrieval.
#[derive(Debug, Clone)]
pub struct ListingConfig {
    /// HTTP request timeout when fetching a remote listing
    pub request_timeout: Duration,
    /// User agent for listing requests
    pub user_agent: &'static str,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(15),
            user_agent: "splice/0.1.0",
        }
    }
}

impl SpliceConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults. Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("SPLICE_HOST")
            && !host.is_empty()
        {
            config.server.host = host;
        }

        if let Ok(port) = std::env::var("SPLICE_PORT")
            && let Ok(port) = port.parse::<u16>()
        {
            config.server.port = port;
        }

        if let Ok(root) = std::env::var("SPLICE_MEDIA_ROOT")
            && !root.is_empty()
        {
            config.server.media_root = Some(PathBuf::from(root));
        }

        if let Ok(timeout) = std::env::var("SPLICE_LOAD_TIMEOUT_MS")
            && let Ok(millis) = timeout.parse::<u64>()
        {
            config.playback.load_timeout = Duration::from_millis(millis);
        }

        if let Ok(source) = std::env::var("SPLICE_FALLBACK_SOURCE") {
            match Url::parse(&source) {
                Ok(url) => config.playback.fallback_source = Some(url),
                Err(e) => tracing::warn!("Ignoring SPLICE_FALLBACK_SOURCE={source}: {e}"),
            }
        }

        if let Ok(timeout) = std::env::var("SPLICE_LISTING_TIMEOUT")
            && let Ok(seconds) = timeout.parse::<u64>()
        {
            config.listing.request_timeout = Duration::from_secs(seconds);
        }

        config
    }

    /// Rejects settings no component can run with.
    ///
    /// # Errors
    /// - `SpliceError::Configuration` - A timeout or chunk size is zero, or the host is empty
    pub fn validate(&self) -> crate::Result<()> {
        let invalid = |reason: &str| {
            Err(SpliceError::Configuration {
                reason: reason.to_string(),
            })
        };

        if self.server.host.trim().is_empty() {
            return invalid("server host is empty");
        }
        if self.streaming.read_chunk_size == 0 {
            return invalid("read chunk size must be greater than zero");
        }
        if self.playback.load_timeout.is_zero() {
            return invalid("load timeout must be greater than zero");
        }
        if self.listing.request_timeout.is_zero() {
            return invalid("listing request timeout must be greater than zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SpliceConfig::default();
        assert_eq!(config.playback.load_timeout, Duration::from_millis(10_000));
        assert!(config.playback.fallback_source.is_none());
        assert_eq!(config.server.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.streaming.read_chunk_size, 64 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut config = SpliceConfig::default();
        config.playback.load_timeout = Duration::ZERO;

        let err = config.validate().unwrap_err();
        assert!(err.is_user_error());
        assert_eq!(
            err.user_message(),
            "Invalid configuration: load timeout must be greater than zero"
        );

        let mut config = SpliceConfig::default();
        config.listing.request_timeout = Duration::ZERO;
        assert!(matches!(config.validate(), Err(SpliceError::Configuration { .. })));
    }
}
