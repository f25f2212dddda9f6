use crate::geo::Coordinates;
use crate::location::{AgentRecord, LocationRegistry, RegistryStats};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Shared state for the location HTTP API
#[derive(Clone)]
pub struct LocationAppState {
    pub registry: Arc<LocationRegistry>,
}

/// Request body for `POST /api/location`.
///
/// The HTTP companion write path: persists the latest sample without
/// fanning it out (broadcast belongs to the socket path). There is no
/// session layer, so the agent id travels in the body.
#[derive(Deserialize)]
struct LocationWriteRequest {
    #[serde(rename = "agentId")]
    agent_id: String,
    lat: f64,
    lon: f64,
}

/// Agent location response (shared by the write and read endpoints)
#[derive(Serialize)]
struct AgentLocationResponse {
    #[serde(rename = "agentId")]
    agent_id: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(rename = "isOnline")]
    is_online: bool,
    #[serde(rename = "lastUpdated")]
    last_updated: String,
}

impl From<AgentRecord> for AgentLocationResponse {
    fn from(record: AgentRecord) -> Self {
        Self {
            agent_id: record.agent_id,
            latitude: record.position.map(|p| p.latitude),
            longitude: record.position.map(|p| p.longitude),
            is_online: record.is_online,
            last_updated: record.last_updated.to_rfc3339(),
        }
    }
}

/// Health response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(flatten)]
    stats: RegistryStats,
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create location API router
pub fn create_location_router(state: Arc<LocationAppState>) -> Router {
    Router::new()
        .route("/api/location", post(write_location))
        .route("/api/agents/:id/location", get(get_agent_location))
        .route("/api/health", get(health))
        .with_state(state)
}

/// POST /api/location - persist an agent's latest sample
async fn write_location(
    State(state): State<Arc<LocationAppState>>,
    Json(request): Json<LocationWriteRequest>,
) -> Result<Json<AgentLocationResponse>, LocationError> {
    if request.agent_id.is_empty() {
        return Err(LocationError::Validation("agentId must not be empty".into()));
    }
    if !request.lat.is_finite() || !request.lon.is_finite() {
        return Err(LocationError::Validation(
            "lat and lon must be finite numbers".into(),
        ));
    }

    info!(agent_id = %request.agent_id, "Storing location over HTTP");

    state
        .registry
        .store_position(&request.agent_id, Coordinates::new(request.lat, request.lon));

    // store_position just inserted the record
    let record = state
        .registry
        .get(&request.agent_id)
        .ok_or(LocationError::NotFound)?;

    Ok(Json(record.into()))
}

/// GET /api/agents/:id/location - last-known record for one agent
async fn get_agent_location(
    State(state): State<Arc<LocationAppState>>,
    Path(id): Path<String>,
) -> Result<Json<AgentLocationResponse>, LocationError> {
    let record = state.registry.get(&id).ok_or(LocationError::NotFound)?;
    Ok(Json(record.into()))
}

/// GET /api/health - liveness probe with registry counters
async fn health(State(state): State<Arc<LocationAppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        stats: state.registry.stats(),
    })
}

/// Location API error types
enum LocationError {
    Validation(String),
    NotFound,
}

impl IntoResponse for LocationError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            LocationError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            LocationError::NotFound => (StatusCode::NOT_FOUND, "Agent not found".to_string()),
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}
