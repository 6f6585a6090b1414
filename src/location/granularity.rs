//! Place-type classification.
//!
//! Providers describe how precise a hit is with their own vocabulary
//! (`geocodeLevel`, Google `types`, ...). Everything is folded onto one
//! coarseness scale with a matching search-radius estimate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarseness of a resolved location, finest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Exact,
    Street,
    Neighbourhood,
    City,
    Region,
    Country,
    Unknown,
}

impl Granularity {
    /// The known levels from finest to coarsest (`Unknown` excluded).
    pub const ORDERED: [Granularity; 6] = [
        Self::Exact,
        Self::Street,
        Self::Neighbourhood,
        Self::City,
        Self::Region,
        Self::Country,
    ];

    /// Classify a provider place-type string. Absent or unrecognised → `Unknown`.
    pub fn classify(place_type: Option<&str>) -> Self {
        let Some(raw) = place_type else {
            return Self::Unknown;
        };
        match raw.trim().to_lowercase().as_str() {
            "house" | "building" | "poi" | "premise" | "street_address" => Self::Exact,
            "street" | "road" | "route" => Self::Street,
            "locality" | "sublocality" | "neighbourhood" | "neighborhood" => Self::Neighbourhood,
            "city" | "town" | "village" | "administrative_area_level_3" => Self::City,
            "district" | "state" | "administrative_area_level_1" | "administrative_area_level_2" => {
                Self::Region
            }
            "country" => Self::Country,
            _ => Self::Unknown,
        }
    }

    /// First recognised entry of a type list, e.g. Google's `types` array.
    pub fn classify_any<'a, I>(types: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        types
            .into_iter()
            .map(|t| Self::classify(Some(t)))
            .find(|g| *g != Self::Unknown)
            .unwrap_or(Self::Unknown)
    }

    pub fn radius_meters(self) -> u32 {
        radius_for(self)
    }
}

/// Search-radius estimate in metres for a granularity.
pub fn radius_for(granularity: Granularity) -> u32 {
    match granularity {
        Granularity::Exact => 50,
        Granularity::Street => 200,
        Granularity::Neighbourhood => 1_000,
        Granularity::City => 5_000,
        Granularity::Region => 50_000,
        Granularity::Country => 100_000,
        Granularity::Unknown => 2_000,
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Exact => "exact",
            Self::Street => "street",
            Self::Neighbourhood => "neighbourhood",
            Self::City => "city",
            Self::Region => "region",
            Self::Country => "country",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}
