//! Location resolver: orchestrates the fallback chain.
//!
//! Flow: direct "lat,lon" parse → access token → MapmyIndia geocode →
//! MapmyIndia search → MapmyIndia legacy → Google → gazetteer → `None`.
//!
//! Stages run strictly in order and the first success wins. A failing stage
//! is logged and skipped; nothing here returns an error to the caller.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::cache::TokenCache;
use super::eloc::ELocResolver;
use super::granularity::Granularity;
use super::http::{HttpClient, UreqClient};
use super::normalize::ResponseNormalizer;
use super::providers::{Gazetteer, GoogleProvider, MapmyIndiaProvider, ResolveStrategy};
use super::token::TokenManager;
use super::types::{Coordinates, LocationError, LocationResult, LocationSource};
use crate::config::ResolverConfig;
use crate::geo::format_coordinates;

/// Importance of a coordinate pair typed in directly.
pub const DIRECT_INPUT_IMPORTANCE: f64 = 1.0;

pub struct LocationResolver {
    tokens: TokenManager,
    chain: Vec<Box<dyn ResolveStrategy>>,
}

impl LocationResolver {
    /// Production resolver: ureq transport and a fresh token cache.
    pub fn new(config: &ResolverConfig) -> Self {
        Self::with_http(config, Arc::new(UreqClient::new()), Arc::new(TokenCache::new()))
    }

    /// Standard chain over a given transport and token cache.
    pub fn with_http(config: &ResolverConfig, http: Arc<dyn HttpClient>, cache: Arc<TokenCache>) -> Self {
        let endpoints = &config.endpoints;
        let normalizer = Arc::new(ResponseNormalizer::new(ELocResolver::new(
            http.clone(),
            endpoints.eloc.clone(),
        )));

        let chain: Vec<Box<dyn ResolveStrategy>> = vec![
            Box::new(MapmyIndiaProvider::geocode(
                http.clone(),
                normalizer.clone(),
                endpoints.geocode.clone(),
            )),
            Box::new(MapmyIndiaProvider::search(
                http.clone(),
                normalizer.clone(),
                endpoints.search.clone(),
            )),
            Box::new(MapmyIndiaProvider::legacy(
                http.clone(),
                normalizer.clone(),
                endpoints.legacy_base.clone(),
                config.legacy_api_key().map(String::from),
            )),
            Box::new(GoogleProvider::new(
                http.clone(),
                normalizer,
                endpoints.google_geocode.clone(),
                config.google_api_key().map(String::from),
            )),
            Box::new(Gazetteer),
        ];

        Self::with_chain(TokenManager::new(http, config, cache), chain)
    }

    /// Custom stage list, walked in the given order.
    pub fn with_chain(tokens: TokenManager, chain: Vec<Box<dyn ResolveStrategy>>) -> Self {
        Self { tokens, chain }
    }

    pub fn token_cache(&self) -> &Arc<TokenCache> {
        self.tokens.cache()
    }

    /// Stage names in the order they are tried.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.chain.iter().map(|s| s.name()).collect()
    }

    /// Resolve free text or a `"lat,lon"` literal. `None` when every stage failed.
    pub fn resolve(&self, text: &str) -> Option<LocationResult> {
        let query = text.trim();
        if query.is_empty() {
            debug!("empty location query");
            return None;
        }

        if let Some(c) = parse_coordinates(query) {
            debug!(lat = c.latitude, lon = c.longitude, "coordinate literal, no lookup needed");
            return Some(direct_result(c));
        }

        let token = if self.chain.iter().any(|s| s.requires_token()) {
            self.tokens.access_token()
        } else {
            None
        };
        if token.is_none() {
            debug!("no access token; token-bound providers will be skipped");
        }

        for stage in &self.chain {
            if stage.requires_token() && token.is_none() {
                continue;
            }
            debug!(stage = stage.name(), query = %query, "trying stage");
            match stage.try_resolve(query, token.as_deref()) {
                Ok(result) => {
                    info!(
                        stage = stage.name(),
                        query = %query,
                        lat = result.latitude,
                        lon = result.longitude,
                        granularity = %result.granularity,
                        "location resolved"
                    );
                    return Some(result);
                }
                Err(e @ (LocationError::MissingCredential(_) | LocationError::NoMatch(_))) => {
                    debug!(stage = stage.name(), reason = %e, "stage skipped");
                }
                Err(e) => {
                    warn!(stage = stage.name(), error = %e, "stage failed");
                }
            }
        }

        warn!(query = %query, "location could not be resolved by any stage");
        None
    }

    /// Human-readable text for a coordinate pair. Never empty.
    pub fn reverse_to_text(&self, coords: Coordinates) -> String {
        let literal = format!("{},{}", coords.latitude, coords.longitude);
        self.resolve(&literal)
            .map(|r| r.display_name)
            .unwrap_or_else(|| format_coordinates(coords))
    }
}

/// Parse `"<number>,<number>"`. Both parts must be finite.
pub fn parse_coordinates(text: &str) -> Option<Coordinates> {
    let (lat, lon) = text.split_once(',')?;
    Coordinates::finite(lat.trim().parse().ok()?, lon.trim().parse().ok()?)
}

fn direct_result(c: Coordinates) -> LocationResult {
    LocationResult {
        latitude: c.latitude,
        longitude: c.longitude,
        display_name: format_coordinates(c),
        granularity: Granularity::Exact,
        estimated_radius_meters: Granularity::Exact.radius_meters(),
        importance: DIRECT_INPUT_IMPORTANCE,
        source: LocationSource::Direct,
        raw: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoints;
    use crate::location::http::mock::MockHttp;

    const TOKEN: &str = "http://mock/token";
    const GEOCODE: &str = "http://mock/geocode";
    const SEARCH: &str = "http://mock/search";
    const LEGACY: &str = "http://mock/legacy";
    const ELOC: &str = "http://mock/eloc";
    const GOOGLE: &str = "http://mock/google";

    const TOKEN_OK: &str = r#"{"access_token":"tok","expires_in":3600,"token_type":"bearer"}"#;

    fn endpoints() -> Endpoints {
        Endpoints {
            token: TOKEN.into(),
            geocode: GEOCODE.into(),
            search: SEARCH.into(),
            legacy_base: LEGACY.into(),
            eloc: ELOC.into(),
            google_geocode: GOOGLE.into(),
        }
    }

    fn full_config() -> ResolverConfig {
        ResolverConfig {
            mapmyindia_client_id: Some("id".into()),
            mapmyindia_client_secret: Some("secret".into()),
            mapmyindia_legacy_api_key: Some("LEGACYKEY".into()),
            google_api_key: Some("GKEY".into()),
            endpoints: endpoints(),
        }
    }

    fn bare_config() -> ResolverConfig {
        ResolverConfig {
            endpoints: endpoints(),
            ..Default::default()
        }
    }

    fn resolver(http: &Arc<MockHttp>, config: &ResolverConfig) -> LocationResolver {
        LocationResolver::with_http(config, http.clone(), Arc::new(TokenCache::new()))
    }

    fn fail_everything(http: &MockHttp) {
        http.fail(TOKEN, "connection refused")
            .fail(GEOCODE, "connection refused")
            .fail(SEARCH, "connection refused")
            .fail(LEGACY, "connection refused")
            .fail(ELOC, "connection refused")
            .fail(GOOGLE, "connection refused");
    }

    #[test]
    fn test_stage_order() {
        let http = Arc::new(MockHttp::new());
        let r = resolver(&http, &full_config());
        assert_eq!(
            r.stage_names(),
            vec!["mapmyindia-geocode", "mapmyindia-search", "mapmyindia-legacy", "google", "gazetteer"]
        );
    }

    #[test]
    fn test_coordinate_fast_path() {
        let http = Arc::new(MockHttp::new());
        let r = resolver(&http, &full_config());

        for input in ["22.7606,88.3742", " -33.8688 , 151.2093 ", "0,0", "12,-1.5e1"] {
            let loc = r.resolve(input).unwrap();
            assert_eq!(loc.granularity, Granularity::Exact);
            assert_eq!(loc.estimated_radius_meters, 50);
            assert_eq!(loc.importance, 1.0);
            assert_eq!(loc.source, LocationSource::Direct);
        }
        let loc = r.resolve("22.7606,88.3742").unwrap();
        assert_eq!(loc.display_name, "22.760600, 88.374200");
        assert_eq!(http.total_calls(), 0);
    }

    #[test]
    fn test_blank_input() {
        let http = Arc::new(MockHttp::new());
        let r = resolver(&http, &full_config());
        assert!(r.resolve("").is_none());
        assert!(r.resolve("   \t\n").is_none());
        assert_eq!(http.total_calls(), 0);
    }

    #[test]
    fn test_gazetteer_when_everything_is_unconfigured() {
        let http = Arc::new(MockHttp::new());
        let r = resolver(&http, &bare_config());
        let loc = r.resolve("Barrackpore").unwrap();
        assert_eq!(loc.latitude, 22.7606);
        assert_eq!(loc.longitude, 88.3742);
        assert_eq!(loc.display_name, "Barrackpore, North 24 Parganas (Approximate)");
        assert_eq!(loc.granularity, Granularity::City);
        assert_eq!(loc.estimated_radius_meters, 10_000);
        assert_eq!(loc.importance, 0.3);
        assert_eq!(http.total_calls(), 0);
    }

    #[test]
    fn test_gazetteer_when_everything_fails() {
        let http = Arc::new(MockHttp::new());
        fail_everything(&http);
        let r = resolver(&http, &full_config());
        let loc = r.resolve("Barrackpore").unwrap();
        assert_eq!(loc.source, LocationSource::Gazetteer);
        assert_eq!(loc.display_name, "Barrackpore, North 24 Parganas (Approximate)");
        // Token failed, so only Google was attempted over the network.
        assert_eq!(http.calls_to(TOKEN), 1);
        assert_eq!(http.calls_to(GEOCODE), 0);
        assert_eq!(http.calls_to(GOOGLE), 1);
    }

    #[test]
    fn test_gazetteer_when_providers_error_with_token() {
        let http = Arc::new(MockHttp::new());
        http.on(TOKEN, 200, TOKEN_OK)
            .on(GEOCODE, 500, "oops")
            .on(SEARCH, 502, "bad gateway")
            .on(LEGACY, 401, "denied")
            .on(GOOGLE, 200, r#"{"status":"ZERO_RESULTS","results":[]}"#);
        let r = resolver(&http, &full_config());
        let loc = r.resolve("Barrackpore").unwrap();
        assert_eq!(loc.source, LocationSource::Gazetteer);
        assert_eq!(http.calls_to(GEOCODE), 1);
        assert_eq!(http.calls_to(SEARCH), 1);
        assert_eq!(http.calls_to(LEGACY), 1);
        assert_eq!(http.calls_to(GOOGLE), 1);
    }

    #[test]
    fn test_total_failure_returns_none() {
        let http = Arc::new(MockHttp::new());
        fail_everything(&http);
        let r = resolver(&http, &full_config());
        assert!(r.resolve("Timbuktu").is_none());
    }

    #[test]
    fn test_token_reused_until_expiry() {
        let http = Arc::new(MockHttp::new());
        http.on(TOKEN, 200, TOKEN_OK)
            .on(GEOCODE, 200, r#"{"copResults":{"latitude":22.6,"longitude":88.4}}"#);
        let r = resolver(&http, &full_config());

        r.resolve("Park Street").unwrap();
        r.resolve("Esplanade").unwrap();
        assert_eq!(http.calls_to(TOKEN), 1);

        r.token_cache()
            .set_expiry(chrono::Utc::now() - chrono::Duration::seconds(1));
        r.resolve("Sealdah").unwrap();
        assert_eq!(http.calls_to(TOKEN), 2);
    }

    #[test]
    fn test_malformed_first_provider_falls_through_to_second() {
        let http = Arc::new(MockHttp::new());
        http.on(TOKEN, 200, TOKEN_OK)
            .on(GEOCODE, 200, "{this is not json")
            .on(
                SEARCH,
                200,
                r#"{"suggestedLocations":[{"latitude":22.5867,"longitude":88.4171,
                    "placeName":"Salt Lake","placeAddress":"Bidhannagar, Kolkata","type":"locality"}]}"#,
            )
            .on(LEGACY, 200, r#"{"results":[{"lat":0.0,"lng":0.0}]}"#);
        let r = resolver(&http, &full_config());

        let loc = r.resolve("Salt Lake").unwrap();
        assert_eq!(loc.source, LocationSource::MapmyindiaSearch);
        assert_eq!(loc.latitude, 22.5867);
        assert_eq!(loc.display_name, "Bidhannagar, Kolkata");
        assert_eq!(loc.granularity, Granularity::Neighbourhood);
        assert_eq!(loc.importance, 0.8);
        assert_eq!(http.calls_to(LEGACY), 0);
        assert_eq!(http.calls_to(GOOGLE), 0);
    }

    #[test]
    fn test_first_success_wins() {
        let http = Arc::new(MockHttp::new());
        http.on(TOKEN, 200, TOKEN_OK)
            .on(GEOCODE, 200, r#"{"copResults":{"latitude":1.0,"longitude":1.0}}"#)
            .on(SEARCH, 200, r#"{"suggestedLocations":[{"latitude":2.0,"longitude":2.0,"confidence":1.0}]}"#);
        let r = resolver(&http, &full_config());
        let loc = r.resolve("anywhere").unwrap();
        assert_eq!(loc.source, LocationSource::MapmyindiaGeocode);
        assert_eq!(http.calls_to(SEARCH), 0);
    }

    #[test]
    fn test_legacy_used_after_two_misses() {
        let http = Arc::new(MockHttp::new());
        http.on(TOKEN, 200, TOKEN_OK)
            .on(GEOCODE, 200, r#"{"copResults":[]}"#)
            .on(SEARCH, 503, "unavailable")
            .on(LEGACY, 200, r#"{"results":[{"lat":"22.5958","lng":"88.2636","formatted_address":"Howrah"}]}"#);
        let r = resolver(&http, &full_config());
        let loc = r.resolve("Howrah Maidan").unwrap();
        assert_eq!(loc.source, LocationSource::MapmyindiaLegacy);
        assert_eq!(loc.display_name, "Howrah");
        assert!(http.requests().iter().any(|req| req.url.starts_with("http://mock/legacy/LEGACYKEY/geo_code")));
    }

    #[test]
    fn test_legacy_skipped_without_key() {
        let http = Arc::new(MockHttp::new());
        http.on(TOKEN, 200, TOKEN_OK)
            .on(GEOCODE, 404, "")
            .on(SEARCH, 404, "")
            .on(LEGACY, 200, r#"{"results":[{"lat":1.0,"lng":1.0}]}"#);
        let config = ResolverConfig {
            mapmyindia_legacy_api_key: None,
            google_api_key: None,
            ..full_config()
        };
        let r = resolver(&http, &config);
        let loc = r.resolve("Kolkata").unwrap();
        assert_eq!(loc.source, LocationSource::Gazetteer);
        assert_eq!(http.calls_to(LEGACY), 0);
    }

    #[test]
    fn test_no_token_skips_to_google() {
        let http = Arc::new(MockHttp::new());
        http.on(
            GOOGLE,
            200,
            r#"{"status":"OK","results":[{"formatted_address":"Mumbai, Maharashtra, India",
                "geometry":{"location":{"lat":19.076,"lng":72.8777}},"types":["locality","political"]}]}"#,
        );
        let config = ResolverConfig {
            google_api_key: Some("GKEY".into()),
            ..bare_config()
        };
        let r = resolver(&http, &config);
        let loc = r.resolve("Mumbai").unwrap();
        assert_eq!(loc.source, LocationSource::Google);
        assert_eq!(loc.display_name, "Mumbai, Maharashtra, India");
        assert_eq!(http.calls_to(TOKEN), 0);
        assert_eq!(http.calls_to(GEOCODE), 0);
    }

    #[test]
    fn test_search_eloc_indirection() {
        let http = Arc::new(MockHttp::new());
        http.on(TOKEN, 200, TOKEN_OK)
            .on(GEOCODE, 200, r#"{"copResults":{"formattedAddress":"nothing useful"}}"#)
            .on(SEARCH, 200, r#"{"suggestedLocations":[{"eLoc":"7DSA2B","placeName":"Victoria Memorial","type":"POI"}]}"#)
            .on(ELOC, 200, r#"{"latitude":22.5448,"longitude":88.3426}"#);
        let r = resolver(&http, &full_config());
        let loc = r.resolve("Victoria Memorial").unwrap();
        assert_eq!(loc.source, LocationSource::MapmyindiaSearch);
        assert_eq!(loc.latitude, 22.5448);
        assert_eq!(loc.granularity, Granularity::Exact);
        assert_eq!(loc.importance, 0.5);
        assert_eq!(http.calls_to("http://mock/eloc/7DSA2B"), 1);
    }

    #[test]
    fn test_reverse_to_text() {
        let http = Arc::new(MockHttp::new());
        let r = resolver(&http, &bare_config());
        let text = r.reverse_to_text(Coordinates::new(22.7606, 88.3742));
        assert_eq!(text, "22.760600, 88.374200");
        assert_eq!(http.total_calls(), 0);
    }

    #[test]
    fn test_reverse_to_text_never_empty() {
        let http = Arc::new(MockHttp::new());
        let r = resolver(&http, &bare_config());
        let text = r.reverse_to_text(Coordinates::new(f64::NAN, 88.0));
        assert_eq!(text, "NaN, 88.000000");
    }

    #[test]
    fn test_parse_coordinates() {
        assert_eq!(parse_coordinates("22.5,88.3"), Some(Coordinates::new(22.5, 88.3)));
        assert_eq!(parse_coordinates(" 22.5 , 88.3 "), Some(Coordinates::new(22.5, 88.3)));
        assert_eq!(parse_coordinates("Kolkata, India"), None);
        assert_eq!(parse_coordinates("1,2,3"), None);
        assert_eq!(parse_coordinates("NaN,1"), None);
        assert_eq!(parse_coordinates("inf,1"), None);
        assert_eq!(parse_coordinates("22.5"), None);
        assert_eq!(parse_coordinates(",88.3"), None);
    }

    #[test]
    fn test_concurrent_resolves_share_cache() {
        let http = Arc::new(MockHttp::new());
        http.on(TOKEN, 200, TOKEN_OK)
            .on(GEOCODE, 200, r#"{"copResults":{"latitude":22.6,"longitude":88.4}}"#);
        let r = Arc::new(resolver(&http, &full_config()));
        // Prime the cache so the threads below all hit it.
        r.resolve("Park Street").unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let r = r.clone();
                std::thread::spawn(move || r.resolve("Esplanade").is_some())
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap());
        }
        assert_eq!(http.calls_to(TOKEN), 1);
    }
}
