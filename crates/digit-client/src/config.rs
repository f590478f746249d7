//! Client configuration.
//!
//! Compiled defaults, overridden by whatever the caller fills in, overridden
//! by `DIGIT_*` environment variables. The base URL is normalized to a
//! trailing slash once here so every endpoint path can simply be appended.

use digit_auth::ProbePolicy;
use digit_core::RetryPolicy;
use digit_realtime::RealtimeConfig;
use serde::{Deserialize, Serialize};

/// Default per-request timeout in ms.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Everything a [`DigitClient`](crate::DigitClient) needs to reach one
/// platform instance as one user.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DigitConfig {
    /// Platform base URL, e.g. `https://digit.example.org/app/`.
    pub base_url: String,
    /// Login name.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Fixed timeout for each REST request in ms (default: 30000).
    pub request_timeout_ms: u64,
    /// Busy-state retry parameters.
    pub retry: RetryPolicy,
    /// Probe self-retry parameters.
    pub probe: ProbePolicy,
    /// Socket manager timing.
    pub realtime: RealtimeConfig,
}

impl Default for DigitConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            password: String::new(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            retry: RetryPolicy::default(),
            probe: ProbePolicy::default(),
            realtime: RealtimeConfig::default(),
        }
    }
}

impl DigitConfig {
    /// A config with the three required fields set and defaults elsewhere.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Overlay `DIGIT_*` environment variables (highest priority).
    ///
    /// Recognized: `DIGIT_BASE_URL`, `DIGIT_USERNAME`, `DIGIT_PASSWORD`,
    /// `DIGIT_REQUEST_TIMEOUT_MS`.
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    fn apply_env_from(mut self, get: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = get("DIGIT_BASE_URL") {
            self.base_url = value;
        }
        if let Some(value) = get("DIGIT_USERNAME") {
            self.username = value;
        }
        if let Some(value) = get("DIGIT_PASSWORD") {
            self.password = value;
        }
        if let Some(value) = get("DIGIT_REQUEST_TIMEOUT_MS") {
            match value.parse() {
                Ok(ms) => self.request_timeout_ms = ms,
                Err(_) => {
                    tracing::warn!(value = %value, "ignoring unparsable DIGIT_REQUEST_TIMEOUT_MS");
                }
            }
        }
        self
    }

    /// The base URL with a guaranteed trailing slash.
    pub fn normalized_base_url(&self) -> String {
        if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        }
    }

    /// The socket endpoint: scheme upgraded http→ws / https→wss, path `ws`
    /// on the same host.
    pub fn ws_url(&self) -> String {
        let base = self.normalized_base_url();
        let upgraded = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base
        };
        format!("{upgraded}ws")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
