//! Identity service integration.
//!
//! Resolves opaque user identifiers to display names through a Clerk-style
//! user API (`GET {base_url}/{user_id}` with a bearer secret).

mod clerk;
mod config;
mod types;

pub use clerk::ClerkClient;
pub use config::IdentityConfig;
pub use types::{unknown_user_label, IdentityEmail, IdentityUser};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when resolving a user.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with something other than 200.
    #[error("Identity API returned status {status}")]
    Status { status: u16 },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Client not configured (missing secret, bad base URL).
    #[error("Identity client not configured: {0}")]
    NotConfigured(String),
}

/// Resolves a user identifier to a display name.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Returns the name of this resolver implementation.
    fn name(&self) -> &str;

    /// Resolves one identifier. Fails on transport errors, non-200 answers
    /// and malformed bodies.
    async fn resolve(&self, user_id: &str) -> Result<String, IdentityError>;
}
