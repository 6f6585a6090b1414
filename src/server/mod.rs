mod handlers;
mod state;

use axum::http::{header, HeaderValue};
use axum::routing::get;
use axum::Router;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{error, info};

use crate::location::LocationResolver;

pub fn build_router(resolver: Arc<LocationResolver>) -> Router {
    let state = Arc::new(AppState { resolver });

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/resolve", get(handlers::resolve))
        .route("/api/reverse", get(handlers::reverse))
        .route("/api/distance", get(handlers::distance))
        .route("/api/gazetteer", get(handlers::gazetteer))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, resolver: Arc<LocationResolver>) -> std::io::Result<()> {
    let app = build_router(resolver);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        error!(addr = %addr, error = %e, "cannot bind");
        e
    })?;

    info!("placefinder listening on http://{}", addr);
    axum::serve(listener, app).await
}
