//! Provider response normalization.
//!
//! Every provider speaks a slightly different JSON dialect. Each dialect gets
//! a [`ProviderAdapter`] that pulls out a [`PartialLocation`]; the
//! [`ResponseNormalizer`] then turns that into a [`LocationResult`], following
//! an eLoc indirection when the provider gave no coordinates.

use serde_json::Value;

use super::eloc::ELocResolver;
use super::granularity::Granularity;
use super::types::{Coordinates, LocationError, LocationResult, LocationSource};

/// Importance when a provider returns coordinates without a confidence value.
pub const DIRECT_IMPORTANCE: f64 = 0.8;
/// Importance for coordinates reached through an eLoc lookup.
pub const ELOC_IMPORTANCE: f64 = 0.5;

const RESULT_KEYS: &[&str] = &["results", "suggestedLocations", "copResults", "cop_results"];
const COORDINATE_PAIRS: &[(&str, &str)] = &[("latitude", "longitude"), ("lat", "lng")];
const PLACE_TYPE_KEYS: &[&str] = &["geocodeLevel", "type", "placeType", "place_type"];
const NAME_KEYS: &[&str] = &[
    "formattedAddress",
    "formatted_address",
    "placeAddress",
    "placeName",
    "address",
];
const CONFIDENCE_KEYS: &[&str] = &["confidenceScore", "confidence"];
const ELOC_KEYS: &[&str] = &["eLoc", "eloc"];

// ─── JSON helpers ────────────────────────────────────────────────

/// A number, or a string holding one. Providers are inconsistent about which.
pub fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn first_str<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| record.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

fn first_number(record: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|k| record.get(*k).and_then(as_f64))
        .find(|n| n.is_finite())
}

/// The record to read from: the first known results container (or the raw
/// object itself), and its first element when it is a list.
/// Returns `None` for an empty list.
pub fn first_record(raw: &Value) -> Option<&Value> {
    let located = RESULT_KEYS
        .iter()
        .filter_map(|k| raw.get(*k))
        .find(|v| !v.is_null())
        .unwrap_or(raw);
    match located {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

/// Finite coordinates from `latitude/longitude`, `lat/lng` or `geo.lat/geo.lng`.
pub fn direct_coordinates(record: &Value) -> Option<Coordinates> {
    for (lat_key, lon_key) in COORDINATE_PAIRS {
        let lat = record.get(*lat_key).and_then(as_f64);
        let lon = record.get(*lon_key).and_then(as_f64);
        if let Some(c) = lat.zip(lon).and_then(|(lat, lon)| Coordinates::finite(lat, lon)) {
            return Some(c);
        }
    }
    let geo = record.get("geo")?;
    Coordinates::finite(geo.get("lat").and_then(as_f64)?, geo.get("lng").and_then(as_f64)?)
}

// ─── Adapters ────────────────────────────────────────────────────

/// Where a partial result points.
#[derive(Debug, Clone, PartialEq)]
pub enum Anchor {
    Point(Coordinates),
    ELoc(String),
}

/// What an adapter could read out of one provider response.
#[derive(Debug, Clone)]
pub struct PartialLocation {
    pub anchor: Anchor,
    pub display_name: Option<String>,
    pub granularity: Granularity,
    /// Provider certainty when it reports one, already within `[0, 1]`.
    pub confidence: Option<f64>,
    pub record: Value,
}

/// Extracts a [`PartialLocation`] from one provider's response shape.
pub trait ProviderAdapter: Send + Sync {
    fn extract(&self, raw: &Value) -> Option<PartialLocation>;
}

/// MapmyIndia geocode, search and legacy endpoints.
pub struct MapmyIndiaAdapter;

impl ProviderAdapter for MapmyIndiaAdapter {
    fn extract(&self, raw: &Value) -> Option<PartialLocation> {
        let record = first_record(raw)?;

        let anchor = match direct_coordinates(record) {
            Some(c) => Anchor::Point(c),
            None => Anchor::ELoc(first_str(record, ELOC_KEYS)?.to_string()),
        };

        Some(PartialLocation {
            anchor,
            display_name: first_str(record, NAME_KEYS).map(String::from),
            granularity: Granularity::classify(first_str(record, PLACE_TYPE_KEYS)),
            confidence: first_number(record, CONFIDENCE_KEYS).map(clamp_unit),
            record: record.clone(),
        })
    }
}

/// Google Geocoding API (`status`, `results[].geometry.location`, `types`).
pub struct GoogleAdapter;

impl ProviderAdapter for GoogleAdapter {
    fn extract(&self, raw: &Value) -> Option<PartialLocation> {
        if let Some(status) = raw.get("status").and_then(Value::as_str) {
            if status != "OK" {
                return None;
            }
        }
        let record = raw.get("results")?.as_array()?.first()?;
        let location = record.get("geometry")?.get("location")?;
        let coords = Coordinates::finite(
            location.get("lat").and_then(as_f64)?,
            location.get("lng").and_then(as_f64)?,
        )?;

        let types = record
            .get("types")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(Value::as_str).collect::<Vec<_>>())
            .unwrap_or_default();

        Some(PartialLocation {
            anchor: Anchor::Point(coords),
            display_name: first_str(record, &["formatted_address"]).map(String::from),
            granularity: Granularity::classify_any(types),
            confidence: None,
            record: record.clone(),
        })
    }
}

fn clamp_unit(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

// ─── Normalizer ──────────────────────────────────────────────────

pub struct ResponseNormalizer {
    eloc: ELocResolver,
}

impl ResponseNormalizer {
    pub fn new(eloc: ELocResolver) -> Self {
        Self { eloc }
    }

    /// Turn one provider response into a result, or say why it is a miss.
    pub fn normalize(
        &self,
        adapter: &dyn ProviderAdapter,
        raw: &Value,
        query: &str,
        token: Option<&str>,
        source: LocationSource,
    ) -> Result<LocationResult, LocationError> {
        let partial = adapter
            .extract(raw)
            .ok_or_else(|| LocationError::Parse("unrecognised response shape".into()))?;

        let (coords, default_importance) = match &partial.anchor {
            Anchor::Point(c) => (*c, DIRECT_IMPORTANCE),
            Anchor::ELoc(code) => {
                let token = token.ok_or(LocationError::MissingCredential("access token for eLoc lookup"))?;
                let c = self
                    .eloc
                    .resolve(token, code)
                    .ok_or_else(|| LocationError::NoMatch(format!("eLoc {}", code)))?;
                (c, ELOC_IMPORTANCE)
            }
        };

        let granularity = partial.granularity;
        Ok(LocationResult {
            latitude: coords.latitude,
            longitude: coords.longitude,
            display_name: partial.display_name.unwrap_or_else(|| query.to_string()),
            granularity,
            estimated_radius_meters: granularity.radius_meters(),
            importance: partial.confidence.unwrap_or(default_importance),
            source,
            raw: Some(partial.record),
        })
    }
}
