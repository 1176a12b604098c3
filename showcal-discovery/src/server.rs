use crate::orchestrator::DiscoveryOrchestrator;
use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use hyper::Server;
use serde::Deserialize;
use serde_json::json;
use showcal_core::common::error::DiscoveryError;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

pub struct AppState {
    pub orchestrator: DiscoveryOrchestrator,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviewBatchRequest {
    venue_slugs: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeRequest {
    event_ids: Vec<String>,
}

/// Map the error taxonomy onto HTTP statuses: configuration/bad-input
/// errors are the caller's fault, provider/remote failures are upstream's.
fn error_response(e: &DiscoveryError) -> Response {
    let status = match e {
        DiscoveryError::UnknownVenue(_) => StatusCode::NOT_FOUND,
        DiscoveryError::UnsupportedProvider(_)
        | DiscoveryError::Config(_)
        | DiscoveryError::MissingField(_)
        | DiscoveryError::StepBlocked(_) => StatusCode::BAD_REQUEST,
        DiscoveryError::Provider { .. } | DiscoveryError::Remote { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": e.to_string() }))).into_response()
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "showcal-discovery",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn venues(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let venues: Vec<_> = state
        .orchestrator
        .venues()
        .iter()
        .map(|v| {
            json!({
                "slug": v.slug,
                "name": v.name,
                "providerType": v.provider_type,
                "city": v.city,
                "state": v.state,
            })
        })
        .collect();
    Json(venues)
}

async fn preview_one(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Response {
    match state.orchestrator.preview(&slug).await {
        Ok(stubs) => Json(stubs).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn preview_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PreviewBatchRequest>,
) -> Response {
    if request.venue_slugs.is_empty() {
        return error_response(&DiscoveryError::MissingField("venueSlugs".to_string()));
    }
    let results = state.orchestrator.preview_batch(&request.venue_slugs).await;
    Json(results).into_response()
}

async fn scrape_one(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Json(request): Json<ScrapeRequest>,
) -> Response {
    let event_ids: HashSet<String> = request.event_ids.into_iter().collect();
    match state.orchestrator.scrape(&slug, &event_ids).await {
        Ok(events) => Json(events).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Build the discovery HTTP surface. CORS is permissive: this is a local
/// operator tool, not a public API.
pub fn create_server(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/discovery/health", get(health))
        .route("/discovery/venues", get(venues))
        .route("/discovery/preview/:slug", get(preview_one))
        .route("/discovery/preview-batch", post(preview_batch))
        .route("/discovery/scrape/:slug", post(scrape_one))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state)
}

/// Start the HTTP server on the specified port
pub async fn start_server(state: Arc<AppState>, port: u16) -> anyhow::Result<()> {
    let app = create_server(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    println!("🚀 Discovery service running on http://localhost:{port}");
    println!("💚 Health check: http://localhost:{port}/discovery/health");
    println!("📍 Venues:       http://localhost:{port}/discovery/venues");

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
