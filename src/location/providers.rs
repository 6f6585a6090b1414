//! Resolution stages: MapmyIndia endpoints, Google Geocoding, and the
//! built-in gazetteer.
//!
//! Each stage implements [`ResolveStrategy`] so the resolver can walk them
//! as one ordered list.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::granularity::Granularity;
use super::http::{url_with_params, url_with_segment, HttpClient, HttpRequest};
use super::normalize::{GoogleAdapter, MapmyIndiaAdapter, ResponseNormalizer};
use super::types::{LocationError, LocationResult, LocationSource};

/// One stage of the fallback chain.
pub trait ResolveStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Stages that need a MapmyIndia bearer token are skipped without one.
    fn requires_token(&self) -> bool {
        false
    }

    fn try_resolve(&self, query: &str, token: Option<&str>) -> Result<LocationResult, LocationError>;
}

// ─── MapmyIndia ─────────────────────────────────────────────────

/// Which MapmyIndia API a provider instance talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapmyIndiaEndpoint {
    /// Structured-address geocoder.
    Geocode,
    /// Free-text place search.
    Search,
    /// Older API with the key embedded in the path.
    Legacy,
}

impl MapmyIndiaEndpoint {
    fn source(self) -> LocationSource {
        match self {
            Self::Geocode => LocationSource::MapmyindiaGeocode,
            Self::Search => LocationSource::MapmyindiaSearch,
            Self::Legacy => LocationSource::MapmyindiaLegacy,
        }
    }
}

pub struct MapmyIndiaProvider {
    endpoint: MapmyIndiaEndpoint,
    base_url: String,
    legacy_key: Option<String>,
    http: Arc<dyn HttpClient>,
    normalizer: Arc<ResponseNormalizer>,
}

impl MapmyIndiaProvider {
    pub fn geocode(
        http: Arc<dyn HttpClient>,
        normalizer: Arc<ResponseNormalizer>,
        base_url: impl Into<String>,
    ) -> Self {
        Self::build(MapmyIndiaEndpoint::Geocode, http, normalizer, base_url, None)
    }

    pub fn search(
        http: Arc<dyn HttpClient>,
        normalizer: Arc<ResponseNormalizer>,
        base_url: impl Into<String>,
    ) -> Self {
        Self::build(MapmyIndiaEndpoint::Search, http, normalizer, base_url, None)
    }

    pub fn legacy(
        http: Arc<dyn HttpClient>,
        normalizer: Arc<ResponseNormalizer>,
        base_url: impl Into<String>,
        key: Option<String>,
    ) -> Self {
        Self::build(MapmyIndiaEndpoint::Legacy, http, normalizer, base_url, key)
    }

    fn build(
        endpoint: MapmyIndiaEndpoint,
        http: Arc<dyn HttpClient>,
        normalizer: Arc<ResponseNormalizer>,
        base_url: impl Into<String>,
        legacy_key: Option<String>,
    ) -> Self {
        Self {
            endpoint,
            base_url: base_url.into(),
            legacy_key,
            http,
            normalizer,
        }
    }

    fn request(&self, query: &str, token: &str) -> Result<HttpRequest, LocationError> {
        let request = match self.endpoint {
            MapmyIndiaEndpoint::Geocode => {
                HttpRequest::get(url_with_params(&self.base_url, &[("address", query)])?).bearer(token)
            }
            MapmyIndiaEndpoint::Search => {
                HttpRequest::get(url_with_params(&self.base_url, &[("query", query)])?).bearer(token)
            }
            MapmyIndiaEndpoint::Legacy => {
                let key = self
                    .legacy_key
                    .as_deref()
                    .ok_or(LocationError::MissingCredential("mapmyindia legacy api key"))?;
                let keyed = url_with_segment(&self.base_url, key)?;
                let path = url_with_segment(&keyed, "geo_code")?;
                HttpRequest::get(url_with_params(&path, &[("addr", query)])?)
            }
        };
        Ok(request.header("Accept", "application/json"))
    }
}

impl ResolveStrategy for MapmyIndiaProvider {
    fn name(&self) -> &'static str {
        match self.endpoint {
            MapmyIndiaEndpoint::Geocode => "mapmyindia-geocode",
            MapmyIndiaEndpoint::Search => "mapmyindia-search",
            MapmyIndiaEndpoint::Legacy => "mapmyindia-legacy",
        }
    }

    fn requires_token(&self) -> bool {
        true
    }

    fn try_resolve(&self, query: &str, token: Option<&str>) -> Result<LocationResult, LocationError> {
        let token = token.ok_or(LocationError::MissingCredential("mapmyindia access token"))?;
        let request = self.request(query, token)?;
        let body = self.http.send(&request)?.into_json()?;
        self.normalizer
            .normalize(&MapmyIndiaAdapter, &body, query, Some(token), self.endpoint.source())
    }
}

// ─── Google Geocoding ───────────────────────────────────────────

pub struct GoogleProvider {
    base_url: String,
    api_key: Option<String>,
    http: Arc<dyn HttpClient>,
    normalizer: Arc<ResponseNormalizer>,
}

impl GoogleProvider {
    pub fn new(
        http: Arc<dyn HttpClient>,
        normalizer: Arc<ResponseNormalizer>,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            http,
            normalizer,
        }
    }
}

impl ResolveStrategy for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn try_resolve(&self, query: &str, _token: Option<&str>) -> Result<LocationResult, LocationError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(LocationError::MissingCredential("google api key"))?;
        let url = url_with_params(&self.base_url, &[("address", query), ("key", key)])?;
        let body = self.http.send(&HttpRequest::get(url))?.into_json()?;
        self.normalizer
            .normalize(&GoogleAdapter, &body, query, None, LocationSource::Google)
    }
}

// ─── Built-in gazetteer ─────────────────────────────────────────

/// Radius reported for gazetteer hits.
pub const GAZETTEER_RADIUS_M: u32 = 10_000;
/// Importance reported for gazetteer hits.
pub const GAZETTEER_IMPORTANCE: f64 = 0.3;
const APPROXIMATE_SUFFIX: &str = " (Approximate)";

struct GazetteerEntry {
    /// Lowercase; matched by containment in the lowercased query.
    match_substring: &'static str,
    lat: f64,
    lon: f64,
    display_name: &'static str,
    granularity: Granularity,
}

const fn city(match_substring: &'static str, lat: f64, lon: f64, display_name: &'static str) -> GazetteerEntry {
    GazetteerEntry {
        match_substring,
        lat,
        lon,
        display_name,
        granularity: Granularity::City,
    }
}

// Order matters: the first containment match wins, so more specific names
// come before the names they contain.
const GAZETTEER: &[GazetteerEntry] = &[
    city("barrackpore", 22.7606, 88.3742, "Barrackpore, North 24 Parganas"),
    city("titagarh", 22.7400, 88.3730, "Titagarh, North 24 Parganas"),
    city("khardah", 22.7200, 88.3800, "Khardah, North 24 Parganas"),
    city("sodepur", 22.6980, 88.3880, "Sodepur, North 24 Parganas"),
    city("panihati", 22.6940, 88.3740, "Panihati, North 24 Parganas"),
    city("belgharia", 22.6570, 88.3890, "Belgharia, North 24 Parganas"),
    city("dum dum", 22.6218, 88.4225, "Dum Dum, North 24 Parganas"),
    city("barasat", 22.7231, 88.4810, "Barasat, North 24 Parganas"),
    city("shyamnagar", 22.8300, 88.3700, "Shyamnagar, North 24 Parganas"),
    city("bhatpara", 22.8664, 88.4011, "Bhatpara, North 24 Parganas"),
    city("naihati", 22.8930, 88.4220, "Naihati, North 24 Parganas"),
    city("kalyani", 22.9750, 88.4340, "Kalyani, Nadia"),
    city("salt lake", 22.5867, 88.4171, "Salt Lake City, Bidhannagar"),
    city("new town", 22.5924, 88.4846, "New Town, Kolkata"),
    city("howrah", 22.5958, 88.2636, "Howrah, West Bengal"),
    city("kolkata", 22.5726, 88.3639, "Kolkata, West Bengal"),
    city("calcutta", 22.5726, 88.3639, "Kolkata, West Bengal"),
    city("delhi", 28.6139, 77.2090, "New Delhi, Delhi"),
    city("mumbai", 19.0760, 72.8777, "Mumbai, Maharashtra"),
    city("bengaluru", 12.9716, 77.5946, "Bengaluru, Karnataka"),
    city("bangalore", 12.9716, 77.5946, "Bengaluru, Karnataka"),
    city("chennai", 13.0827, 80.2707, "Chennai, Tamil Nadu"),
    city("hyderabad", 17.3850, 78.4867, "Hyderabad, Telangana"),
];

/// Look a query up in the gazetteer by case-insensitive containment.
pub fn gazetteer_lookup(query: &str) -> Option<LocationResult> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return None;
    }
    let entry = GAZETTEER.iter().find(|e| q.contains(e.match_substring))?;
    debug!(query = %query, matched = entry.match_substring, "gazetteer hit");

    Some(LocationResult {
        latitude: entry.lat,
        longitude: entry.lon,
        display_name: format!("{}{}", entry.display_name, APPROXIMATE_SUFFIX),
        granularity: entry.granularity,
        estimated_radius_meters: GAZETTEER_RADIUS_M,
        importance: GAZETTEER_IMPORTANCE,
        source: LocationSource::Gazetteer,
        raw: None,
    })
}

/// A gazetteer row for the public listing API.
#[derive(Debug, Clone, Serialize)]
pub struct GazetteerInfo {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Every gazetteer entry, in match order.
pub fn gazetteer_list() -> Vec<GazetteerInfo> {
    GAZETTEER
        .iter()
        .map(|e| GazetteerInfo {
            name: e.display_name.to_string(),
            latitude: e.lat,
            longitude: e.lon,
        })
        .collect()
}

/// Last-resort stage backed by the static table.
pub struct Gazetteer;

impl ResolveStrategy for Gazetteer {
    fn name(&self) -> &'static str {
        "gazetteer"
    }

    fn try_resolve(&self, query: &str, _token: Option<&str>) -> Result<LocationResult, LocationError> {
        gazetteer_lookup(query).ok_or_else(|| LocationError::NoMatch(query.to_string()))
    }
}
