//! Core types for the location subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::granularity::Granularity;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Build from two values, rejecting NaN and infinities.
    pub fn finite(latitude: f64, longitude: f64) -> Option<Self> {
        (latitude.is_finite() && longitude.is_finite()).then_some(Self { latitude, longitude })
    }
}

/// Which stage of the chain produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationSource {
    Direct,
    MapmyindiaGeocode,
    MapmyindiaSearch,
    MapmyindiaLegacy,
    Google,
    Gazetteer,
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::MapmyindiaGeocode => write!(f, "mapmyindia-geocode"),
            Self::MapmyindiaSearch => write!(f, "mapmyindia-search"),
            Self::MapmyindiaLegacy => write!(f, "mapmyindia-legacy"),
            Self::Google => write!(f, "google"),
            Self::Gazetteer => write!(f, "gazetteer"),
        }
    }
}

/// A resolved location. Built fresh for every call and never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationResult {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
    pub granularity: Granularity,
    pub estimated_radius_meters: u32,
    /// Provider certainty, always within `[0, 1]`.
    pub importance: f64,
    pub source: LocationSource,
    /// Provider record the result was extracted from, when there was one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}

impl LocationResult {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Why a single stage of the chain did not produce a result.
///
/// These never leave the resolver: each one is logged and the chain moves on.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
    #[error("network error: {0}")]
    Transport(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    Parse(String),
    #[error("no match for '{0}'")]
    NoMatch(String),
}

impl LocationError {
    /// Missing credentials are expected configuration, not failures worth a warning.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingCredential(_))
    }
}
