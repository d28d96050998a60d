use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

/// Origin used when neither the caller nor the environment provides one.
pub const DEFAULT_ORIGIN: &str = "http://localhost:8000";

pub const ENV_ORIGIN: &str = "SHARED_TABLES_ORIGIN";
pub const ENV_TIMEOUT_MS: &str = "SHARED_TABLES_TIMEOUT_MS";
pub const ENV_MAX_RETRIES: &str = "SHARED_TABLES_MAX_RETRIES";

/// Transport configuration for shared-table requests.
///
/// Built once and handed to the client; nothing reads it from global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablesConfig {
    /// Scheme and host of the tables service. Paths are replaced per endpoint.
    pub origin: String,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Additional headers merged into request headers (auth lives here).
    pub extra_headers: BTreeMap<String, String>,
    /// Optional limit on waiting for response headers. Streamed bodies may
    /// run longer.
    pub timeout: Option<Duration>,
    /// Retries of the initial request on transient failures. Never applied
    /// once a response has been accepted.
    pub max_retries: u32,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            user_agent: None,
            extra_headers: BTreeMap::new(),
            timeout: None,
            max_retries: 0,
        }
    }
}

impl TablesConfig {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `SHARED_TABLES_*` variables. Empty or
    /// unparsable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(origin) = env_string_opt(ENV_ORIGIN) {
            config.origin = origin;
        }
        if let Some(timeout_ms) = env_parse_opt::<u64>(ENV_TIMEOUT_MS) {
            config.timeout = Some(Duration::from_millis(timeout_ms));
        }
        if let Some(max_retries) = env_parse_opt::<u32>(ENV_MAX_RETRIES) {
            config.max_retries = max_retries;
        }
        config
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.extra_headers.extend(headers);
        self
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    })
}

fn env_parse_opt<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string_opt(key).and_then(|value| value.parse().ok())
}
