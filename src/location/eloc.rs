//! eLoc → coordinates lookup.
//!
//! The MapmyIndia search endpoint often answers with an opaque eLoc code and
//! no coordinates. One extra authenticated GET turns that code into a point.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::http::{url_with_segment, HttpClient, HttpRequest};
use super::normalize::{direct_coordinates, first_record};
use super::types::{Coordinates, LocationError};

pub struct ELocResolver {
    http: Arc<dyn HttpClient>,
    endpoint: String,
}

impl ELocResolver {
    pub fn new(http: Arc<dyn HttpClient>, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    /// Coordinates for `code`, or `None` on any failure (logged).
    pub fn resolve(&self, token: &str, code: &str) -> Option<Coordinates> {
        match self.lookup(token, code) {
            Ok(c) => {
                debug!(eloc = code, lat = c.latitude, lon = c.longitude, "eLoc resolved");
                Some(c)
            }
            Err(e) => {
                warn!(eloc = code, error = %e, "eLoc resolution failed");
                None
            }
        }
    }

    fn lookup(&self, token: &str, code: &str) -> Result<Coordinates, LocationError> {
        let url = url_with_segment(&self.endpoint, code.trim())?;
        let body: Value = self.http.send(&HttpRequest::get(url).bearer(token))?.into_json()?;
        let record = first_record(&body).unwrap_or(&body);
        direct_coordinates(record)
            .ok_or_else(|| LocationError::Parse(format!("no finite coordinates for eLoc {}", code)))
    }
}
