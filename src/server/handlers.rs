use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::geo::{distance_between, format_coordinates};
use crate::location::{gazetteer_list, Coordinates, GazetteerInfo, LocationResult};

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

fn check_coords(lat: f64, lon: f64) -> Result<Coordinates, ApiError> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Invalid coordinates. Lat: -90..90, Lon: -180..180",
        ));
    }
    Ok(Coordinates::new(lat, lon))
}

/// Run a resolver call on the blocking pool; provider I/O is synchronous.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!(error = %e, "resolver task failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "resolver task failed")
    })
}

// ─── GET /health ─────────────────────────────────────────────────

pub async fn health() -> &'static str {
    "ok"
}

// ─── GET /api/resolve ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResolveQuery {
    pub query: Option<String>,
}

pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveQuery>,
) -> Result<Json<LocationResult>, ApiError> {
    let start = Instant::now();

    let query = params.query.unwrap_or_default().trim().to_string();
    if query.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing 'query' parameter"));
    }

    let resolver = state.resolver.clone();
    let q = query.clone();
    let resolved = blocking(move || resolver.resolve(&q)).await?;

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    match resolved {
        Some(result) => {
            info!(query = %query, source = %result.source, elapsed_ms = elapsed_ms, "GET /api/resolve");
            Ok(Json(result))
        }
        None => {
            info!(query = %query, elapsed_ms = elapsed_ms, "GET /api/resolve -> not found");
            Err(api_error(
                StatusCode::NOT_FOUND,
                format!("Location not found: '{}'", query),
            ))
        }
    }
}

// ─── GET /api/reverse ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ReverseQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Serialize)]
pub struct ReverseResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub text: String,
}

pub async fn reverse(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReverseQuery>,
) -> Result<Json<ReverseResponse>, ApiError> {
    let (Some(lat), Some(lon)) = (params.lat, params.lon) else {
        return Err(api_error(StatusCode::BAD_REQUEST, "Provide 'lat' and 'lon' parameters"));
    };
    let coords = check_coords(lat, lon)?;

    let resolver = state.resolver.clone();
    let text = blocking(move || resolver.reverse_to_text(coords)).await?;

    Ok(Json(ReverseResponse {
        latitude: lat,
        longitude: lon,
        text,
    }))
}

// ─── GET /api/distance ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct DistanceQuery {
    pub lat1: f64,
    pub lon1: f64,
    pub lat2: f64,
    pub lon2: f64,
}

#[derive(Serialize)]
pub struct DistanceResponse {
    pub from: String,
    pub to: String,
    pub meters: f64,
}

pub async fn distance(Query(params): Query<DistanceQuery>) -> Result<Json<DistanceResponse>, ApiError> {
    let a = check_coords(params.lat1, params.lon1)?;
    let b = check_coords(params.lat2, params.lon2)?;
    Ok(Json(DistanceResponse {
        from: format_coordinates(a),
        to: format_coordinates(b),
        meters: distance_between(a, b),
    }))
}

// ─── GET /api/gazetteer ──────────────────────────────────────────

pub async fn gazetteer() -> Json<Vec<GazetteerInfo>> {
    Json(gazetteer_list())
}
