//! In-memory access-token cache.
//!
//! Holds at most one token. A token within `EXPIRY_MARGIN_MS` of its expiry
//! is treated as already expired. Nothing is written to disk; the cache is
//! lost on restart.
//!
//! The lock is held only to read or replace the entry, never across the
//! refresh request, so two callers racing on an expired token may both
//! refresh. The last write wins.

use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

const EXPIRY_MARGIN_MS: i64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// A token valid for `expires_in_secs` from `now`.
    pub fn issued_at(value: impl Into<String>, now: DateTime<Utc>, expires_in_secs: i64) -> Self {
        Self {
            value: value.into(),
            expires_at: now + Duration::seconds(expires_in_secs),
        }
    }

    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::milliseconds(EXPIRY_MARGIN_MS) < self.expires_at
    }
}

#[derive(Debug, Default)]
pub struct TokenCache {
    entry: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached token value if it is still fresh at `now`.
    pub fn get_fresh(&self, now: DateTime<Utc>) -> Option<String> {
        let guard = self.entry.lock().unwrap_or_else(|p| p.into_inner());
        guard
            .as_ref()
            .filter(|t| t.is_fresh_at(now))
            .map(|t| t.value.clone())
    }

    /// Replace the cached entry.
    pub fn store(&self, token: AccessToken) {
        let mut guard = self.entry.lock().unwrap_or_else(|p| p.into_inner());
        *guard = Some(token);
    }

    /// Current entry regardless of freshness.
    pub fn peek(&self) -> Option<AccessToken> {
        self.entry.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Move the cached token's expiry to `at`. No-op when empty.
    pub fn set_expiry(&self, at: DateTime<Utc>) {
        let mut guard = self.entry.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(token) = guard.as_mut() {
            token.expires_at = at;
        }
    }

    pub fn clear(&self) {
        *self.entry.lock().unwrap_or_else(|p| p.into_inner()) = None;
    }
}
