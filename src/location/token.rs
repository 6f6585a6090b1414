//! OAuth2 client-credentials token acquisition.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::cache::{AccessToken, TokenCache};
use super::http::{HttpClient, HttpRequest};
use super::normalize::as_f64;
use super::types::LocationError;
use crate::config::ResolverConfig;

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;
/// Upper bound on `expires_in`; anything longer is treated as a year.
const MAX_EXPIRES_IN_SECS: f64 = 365.0 * 24.0 * 3600.0;

pub struct TokenManager {
    http: Arc<dyn HttpClient>,
    endpoint: String,
    credentials: Option<(String, String)>,
    cache: Arc<TokenCache>,
}

impl TokenManager {
    pub fn new(http: Arc<dyn HttpClient>, config: &ResolverConfig, cache: Arc<TokenCache>) -> Self {
        Self {
            http,
            endpoint: config.endpoints.token.clone(),
            credentials: config
                .client_credentials()
                .map(|(id, secret)| (id.to_string(), secret.to_string())),
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<TokenCache> {
        &self.cache
    }

    /// A usable bearer token, or `None` when auth is unavailable.
    ///
    /// Serves the cached token while it is fresh and exchanges credentials
    /// otherwise. Failures are logged, never returned.
    pub fn access_token(&self) -> Option<String> {
        let now = Utc::now();
        if let Some(value) = self.cache.get_fresh(now) {
            debug!("using cached access token");
            return Some(value);
        }

        match self.fetch(now) {
            Ok(token) => {
                info!(expires_at = %token.expires_at, "obtained access token");
                let value = token.value.clone();
                self.cache.store(token);
                Some(value)
            }
            Err(e) if e.is_configuration() => {
                debug!(error = %e, "token exchange skipped");
                None
            }
            Err(e) => {
                warn!(error = %e, endpoint = %self.endpoint, "token exchange failed");
                None
            }
        }
    }

    fn fetch(&self, now: DateTime<Utc>) -> Result<AccessToken, LocationError> {
        let (id, secret) = self
            .credentials
            .as_ref()
            .ok_or(LocationError::MissingCredential("mapmyindia client id/secret"))?;

        let basic = STANDARD.encode(format!("{}:{}", id, secret));
        let request = HttpRequest::post_form(
            &self.endpoint,
            vec![("grant_type".to_string(), "client_credentials".to_string())],
        )
        .header("Authorization", format!("Basic {}", basic))
        .header("Accept", "application/json");

        let body = self.http.send(&request)?.into_json()?;

        let value = body
            .get("access_token")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| LocationError::Parse("token response has no access_token".into()))?;
        let expires_in = body
            .get("expires_in")
            .and_then(as_f64)
            .filter(|secs| secs.is_finite())
            .map(|secs| secs.clamp(0.0, MAX_EXPIRES_IN_SECS) as i64)
            .unwrap_or(DEFAULT_EXPIRES_IN_SECS);

        Ok(AccessToken::issued_at(value, now, expires_in))
    }
}
