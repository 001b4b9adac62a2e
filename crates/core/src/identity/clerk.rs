//! Clerk user API client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::metrics;

use super::config::IdentityConfig;
use super::types::IdentityUser;
use super::{IdentityError, IdentityResolver};

const SERVICE: &str = "clerk";

/// Identity resolver backed by the Clerk users endpoint.
pub struct ClerkClient {
    client: Client,
    base_url: String,
}

impl ClerkClient {
    /// Create a new client. Fails when no secret is configured.
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        if !config.secret_configured() {
            return Err(IdentityError::NotConfigured(
                "secret_key is empty (set CLERK_SECRET_KEY or OPSBATCH_IDENTITY__SECRET_KEY)"
                    .to_string(),
            ));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.secret_key.trim()))
            .map_err(|_| {
                IdentityError::NotConfigured("secret_key contains invalid characters".to_string())
            })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(format!("opsbatch/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn user_url(&self, user_id: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(user_id))
    }

    /// Fetch the raw user record.
    pub async fn fetch_user(&self, user_id: &str) -> Result<IdentityUser, IdentityError> {
        let started = Instant::now();
        let result = self.request_user(user_id).await;

        metrics::EXTERNAL_SERVICE_DURATION
            .with_label_values(&[SERVICE, "get_user"])
            .observe(started.elapsed().as_secs_f64());
        metrics::EXTERNAL_SERVICE_REQUESTS
            .with_label_values(&[
                SERVICE,
                "get_user",
                if result.is_ok() { "success" } else { "error" },
            ])
            .inc();

        result
    }

    async fn request_user(&self, user_id: &str) -> Result<IdentityUser, IdentityError> {
        debug!("Fetching user: {}", user_id);

        let response = self.client.get(self.user_url(user_id)).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(IdentityError::Status {
                status: status.as_u16(),
            });
        }

        response
            .json::<IdentityUser>()
            .await
            .map_err(|e| IdentityError::Parse(format!("Failed to parse user {}: {}", user_id, e)))
    }
}

#[async_trait]
impl IdentityResolver for ClerkClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn resolve(&self, user_id: &str) -> Result<String, IdentityError> {
        let user = self.fetch_user(user_id).await?;
        Ok(user.display_name(user_id))
    }
}
