// Integration tests for the location HTTP API

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use courier::api::{create_location_router, LocationAppState};
use courier::geo::Coordinates;
use courier::location::LocationRegistry;
use std::sync::Arc;
use tower::ServiceExt;

fn create_test_app() -> (Router, Arc<LocationRegistry>) {
    let registry = Arc::new(LocationRegistry::new());
    let app = create_location_router(Arc::new(LocationAppState {
        registry: Arc::clone(&registry),
    }));
    (app, registry)
}

fn post_location(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/location")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_write_location_persists_record() {
    let (app, registry) = create_test_app();

    let response = app
        .oneshot(post_location(
            r#"{"agentId":"agent-7","lat":22.50,"lon":88.30}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["agentId"], "agent-7");
    assert_eq!(json["latitude"], 22.50);
    assert_eq!(json["longitude"], 88.30);
    assert_eq!(json["isOnline"], false);

    let record = registry.get("agent-7").unwrap();
    assert_eq!(record.position, Some(Coordinates::new(22.50, 88.30)));
}

#[tokio::test]
async fn test_write_location_does_not_broadcast() {
    let (app, registry) = create_test_app();
    let mut rx = registry.subscribe();

    let response = app
        .oneshot(post_location(
            r#"{"agentId":"agent-7","lat":22.50,"lon":88.30}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Fan-out belongs to the socket path only
    assert!(matches!(
        rx.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn test_write_location_rejects_empty_agent_id() {
    let (app, _registry) = create_test_app();

    let response = app
        .oneshot(post_location(r#"{"agentId":"","lat":22.50,"lon":88.30}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_write_location_rejects_missing_coordinates() {
    let (app, _registry) = create_test_app();

    let response = app
        .oneshot(post_location(r#"{"agentId":"agent-7","lat":22.50}"#))
        .await
        .unwrap();

    // Body fails to deserialize
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_get_agent_location() {
    let (app, registry) = create_test_app();
    registry.store_position("agent-7", Coordinates::new(22.50, 88.30));

    let response = app
        .oneshot(get("/api/agents/agent-7/location"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["agentId"], "agent-7");
    assert_eq!(json["latitude"], 22.50);
    assert_eq!(json["longitude"], 88.30);
}

#[tokio::test]
async fn test_get_unknown_agent_returns_404() {
    let (app, _registry) = create_test_app();

    let response = app
        .oneshot(get("/api/agents/nobody/location"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_reports_counters() {
    let (app, registry) = create_test_app();
    registry.store_position("agent-7", Coordinates::new(22.50, 88.30));

    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["agents"], 1);
    assert_eq!(json["open_connections"], 0);
}
