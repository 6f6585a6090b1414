//! Resolver configuration: credentials and provider endpoints.
//!
//! Each credential is optional. A missing one disables only the stage that
//! needs it; the chain as a whole keeps working.

use std::env;

pub const ENV_CLIENT_ID: &str = "MAPMYINDIA_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "MAPMYINDIA_CLIENT_SECRET";
pub const ENV_LEGACY_API_KEY: &str = "MAPMYINDIA_API_KEY";
pub const ENV_GOOGLE_API_KEY: &str = "GOOGLE_MAPS_API_KEY";

/// Provider URLs. The defaults point at production; tests swap in mock hosts.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// OAuth2 client-credentials token endpoint.
    pub token: String,
    /// Structured-address geocoder (`address=`).
    pub geocode: String,
    /// Free-text place search (`query=`).
    pub search: String,
    /// Legacy key-in-path geocoder; the key is inserted as a path segment.
    pub legacy_base: String,
    /// eLoc → coordinates lookup; the eLoc is appended as a path segment.
    pub eloc: String,
    pub google_geocode: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            token: "https://outpost.mapmyindia.com/api/security/oauth/token".into(),
            geocode: "https://atlas.mapmyindia.com/api/places/geocode".into(),
            search: "https://atlas.mapmyindia.com/api/places/search/json".into(),
            legacy_base: "https://apis.mapmyindia.com/advancedmaps/v1".into(),
            eloc: "https://explore.mapmyindia.com/apis/O2O/entity".into(),
            google_geocode: "https://maps.googleapis.com/maps/api/geocode/json".into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    pub mapmyindia_client_id: Option<String>,
    pub mapmyindia_client_secret: Option<String>,
    pub mapmyindia_legacy_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub endpoints: Endpoints,
}

impl ResolverConfig {
    /// Read credentials from the process environment. Empty values count as unset.
    pub fn from_env() -> Self {
        Self {
            mapmyindia_client_id: env_opt(ENV_CLIENT_ID),
            mapmyindia_client_secret: env_opt(ENV_CLIENT_SECRET),
            mapmyindia_legacy_api_key: env_opt(ENV_LEGACY_API_KEY),
            google_api_key: env_opt(ENV_GOOGLE_API_KEY),
            endpoints: Endpoints::default(),
        }
    }

    /// Client id and secret, when both are present.
    pub fn client_credentials(&self) -> Option<(&str, &str)> {
        match (
            non_empty(self.mapmyindia_client_id.as_deref()),
            non_empty(self.mapmyindia_client_secret.as_deref()),
        ) {
            (Some(id), Some(secret)) => Some((id, secret)),
            _ => None,
        }
    }

    pub fn legacy_api_key(&self) -> Option<&str> {
        non_empty(self.mapmyindia_legacy_api_key.as_deref())
    }

    pub fn google_api_key(&self) -> Option<&str> {
        non_empty(self.google_api_key.as_deref())
    }

    /// One line per stage saying whether it can run, for startup logs.
    pub fn summary(&self) -> String {
        let flag = |on: bool| if on { "on" } else { "off" };
        format!(
            "mapmyindia-oauth={} mapmyindia-legacy={} google={}",
            flag(self.client_credentials().is_some()),
            flag(self.legacy_api_key().is_some()),
            flag(self.google_api_key().is_some()),
        )
    }
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
