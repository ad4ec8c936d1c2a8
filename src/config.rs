//! Configuration Module
//!
//! Holds the governance policy (cache, quota, retry and compression tunables)
//! and the deployment settings of the gateway, loaded from environment
//! variables with defaults.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use directories::ProjectDirs;

// == Policy ==
/// Read-only tunables consumed by every governance component.
///
/// Built once at startup and shared by reference; nothing mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    /// Page size used when a request does not ask for one
    pub default_page_size: u32,
    /// Upper bound on any requested page size
    pub max_page_size: u32,
    /// Default cache entry lifetime in seconds
    pub cache_ttl: u64,
    /// Entry-count bound of the response cache
    pub max_cache_size: usize,
    /// Attempts made against the upstream before giving up
    pub max_retries: u32,
    /// Delay between upstream attempts in milliseconds
    pub retry_delay: u64,
    /// Per-attempt upstream timeout in milliseconds
    pub request_timeout: u64,
    /// When true no upstream request is ever issued
    pub offline_mode: bool,
    /// Interval between background refreshes in seconds (advisory)
    pub sync_interval: u64,
    /// Daily request ceiling checked before each upstream call
    pub max_daily_requests: u32,
    /// Gate for payload shrinking on cache writes
    pub compression_enabled: bool,
    /// Serialized size in bytes below which payloads are left untouched
    pub compression_threshold: usize,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
            cache_ttl: 300,
            max_cache_size: 50,
            max_retries: 3,
            retry_delay: 1000,
            request_timeout: 10_000,
            offline_mode: false,
            sync_interval: 300,
            max_daily_requests: 1000,
            compression_enabled: true,
            compression_threshold: 1024,
        }
    }
}

impl Policy {
    /// Loads the policy from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_PAGE_SIZE` (default: 20), `MAX_PAGE_SIZE` (default: 100)
    /// - `CACHE_TTL` seconds (default: 300), `MAX_CACHE_SIZE` (default: 50)
    /// - `MAX_RETRIES` (default: 3), `RETRY_DELAY_MS` (default: 1000)
    /// - `REQUEST_TIMEOUT_MS` (default: 10000)
    /// - `OFFLINE_MODE` (default: false)
    /// - `SYNC_INTERVAL` seconds (default: 300)
    /// - `MAX_DAILY_REQUESTS` (default: 1000)
    /// - `COMPRESSION_ENABLED` (default: true)
    /// - `COMPRESSION_THRESHOLD` bytes (default: 1024)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_page_size: env_or("DEFAULT_PAGE_SIZE", defaults.default_page_size),
            max_page_size: env_or("MAX_PAGE_SIZE", defaults.max_page_size),
            cache_ttl: env_or("CACHE_TTL", defaults.cache_ttl),
            max_cache_size: env_or("MAX_CACHE_SIZE", defaults.max_cache_size),
            max_retries: env_or("MAX_RETRIES", defaults.max_retries),
            retry_delay: env_or("RETRY_DELAY_MS", defaults.retry_delay),
            request_timeout: env_or("REQUEST_TIMEOUT_MS", defaults.request_timeout),
            offline_mode: env_or("OFFLINE_MODE", defaults.offline_mode),
            sync_interval: env_or("SYNC_INTERVAL", defaults.sync_interval),
            max_daily_requests: env_or("MAX_DAILY_REQUESTS", defaults.max_daily_requests),
            compression_enabled: env_or("COMPRESSION_ENABLED", defaults.compression_enabled),
            compression_threshold: env_or("COMPRESSION_THRESHOLD", defaults.compression_threshold),
        }
    }
}

// == Config ==
/// Gateway configuration: the policy plus where to listen, what to talk to
/// and where to keep the quota record.
#[derive(Debug, Clone)]
pub struct Config {
    /// Governance tunables
    pub policy: Policy,
    /// HTTP server port
    pub server_port: u16,
    /// Base URL of the hosted backend
    pub upstream_url: String,
    /// API key sent to the hosted backend, if any
    pub upstream_api_key: Option<String>,
    /// Location of the persisted quota record
    pub quota_file: PathBuf,
    /// Resources refreshed by the background sync task
    pub sync_resources: Vec<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `UPSTREAM_URL` - backend base URL (default: http://localhost:54321)
    /// - `UPSTREAM_API_KEY` - backend API key (default: unset)
    /// - `QUOTA_FILE` - quota record path (default: platform data dir)
    /// - `SYNC_RESOURCES` - comma-separated resources to keep warm (default: none)
    ///
    /// Policy variables are documented on [`Policy::from_env`].
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            policy: Policy::from_env(),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            upstream_url: env::var("UPSTREAM_URL").unwrap_or(defaults.upstream_url),
            upstream_api_key: env::var("UPSTREAM_API_KEY").ok().filter(|k| !k.is_empty()),
            quota_file: env::var("QUOTA_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.quota_file),
            sync_resources: env::var("SYNC_RESOURCES")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: Policy::default(),
            server_port: 3000,
            upstream_url: "http://localhost:54321".to_string(),
            upstream_api_key: None,
            quota_file: default_quota_file(),
            sync_resources: Vec::new(),
        }
    }
}

/// Platform data directory for the quota record, or the working directory
/// when no home directory can be determined.
fn default_quota_file() -> PathBuf {
    ProjectDirs::from("", "", "request_governor")
        .map(|dirs| dirs.data_dir().join("quota.json"))
        .unwrap_or_else(|| PathBuf::from("quota.json"))
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_default() {
        let policy = Policy::default();
        assert_eq!(policy.default_page_size, 20);
        assert_eq!(policy.max_page_size, 100);
        assert_eq!(policy.cache_ttl, 300);
        assert_eq!(policy.max_cache_size, 50);
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.retry_delay, 1000);
        assert_eq!(policy.request_timeout, 10_000);
        assert!(!policy.offline_mode);
        assert_eq!(policy.sync_interval, 300);
        assert_eq!(policy.max_daily_requests, 1000);
        assert!(policy.compression_enabled);
        assert_eq!(policy.compression_threshold, 1024);
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert!(config.upstream_api_key.is_none());
        assert!(config.sync_resources.is_empty());
        assert!(config.quota_file.ends_with("quota.json"));
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        env::set_var("REQUEST_GOVERNOR_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_or("REQUEST_GOVERNOR_TEST_GARBAGE", 7u32), 7);
        env::remove_var("REQUEST_GOVERNOR_TEST_GARBAGE");
    }

    #[test]
    fn test_env_or_parses_bool() {
        env::set_var("REQUEST_GOVERNOR_TEST_BOOL", " true ");
        assert!(env_or("REQUEST_GOVERNOR_TEST_BOOL", false));
        env::remove_var("REQUEST_GOVERNOR_TEST_BOOL");
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list("products, sales,,stock_movements "),
            vec!["products", "sales", "stock_movements"]
        );
        assert!(parse_list(" , ").is_empty());
    }
}
