//! Configuration for the identity client.

use serde::{Deserialize, Serialize};

/// Identity API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Users endpoint; the user id is appended as a path segment.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer secret. Supplied through the environment, never compiled in.
    #[serde(default)]
    pub secret_key: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.clerk.dev/v1/users".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            secret_key: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

impl IdentityConfig {
    pub fn secret_configured(&self) -> bool {
        !self.secret_key.trim().is_empty()
    }
}
