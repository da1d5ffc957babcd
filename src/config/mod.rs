//! Configuration (layered: code > env > `.env` file).

use std::fmt;
use std::time::Duration;

/// Default spacing between two run status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Default Assistants API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client and polling configuration.
///
/// Values set in code win over values loaded by [`ClientConfig::from_env`],
/// which in turn reads a `.env` file if one is present.
#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub organization: Option<String>,
    /// Assistant for `Conversation::query_default`.
    pub assistant_id: Option<String>,
    pub poll_interval: Duration,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("base_url", &self.base_url)
            .field("organization", &self.organization)
            .field("assistant_id", &self.assistant_id)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            organization: None,
            assistant_id: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from environment variables (OPENAI_API_KEY, OPENAI_ASSISTANT_ID, etc.).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::new();

        config.api_key = non_empty_var("OPENAI_API_KEY");
        if let Some(url) = non_empty_var("OPENAI_BASE_URL") {
            config.base_url = url;
        }
        config.organization = non_empty_var("OPENAI_ORG_ID");
        config.assistant_id = non_empty_var("OPENAI_ASSISTANT_ID");

        if let Some(raw) = non_empty_var("THREADKIT_POLL_INTERVAL_MS") {
            match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => config.poll_interval = Duration::from_millis(ms),
                _ => tracing::warn!(
                    value = %raw,
                    "ignoring invalid THREADKIT_POLL_INTERVAL_MS"
                ),
            }
        }

        config
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_assistant_id(mut self, assistant_id: impl Into<String>) -> Self {
        self.assistant_id = Some(assistant_id.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Base URL without a trailing slash.
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
