mod common;

use axum::{Router, routing::get};
use axum_test::TestServer;
use curtail::api::handlers::health_handler;

#[tokio::test]
async fn test_health_all_components_ok() {
    let ctx = common::create_test_context();
    let app = Router::new()
        .route("/health", get(health_handler))
        .with_state(ctx.state.clone());
    let server = TestServer::new(app).unwrap();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["checks"]["database"]["status"], "ok");
    assert_eq!(json["checks"]["visit_queue"]["status"], "ok");
    assert_eq!(json["checks"]["cache"]["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_health_degraded_when_queue_closed() {
    let mut ctx = common::create_test_context();

    // Dropping the receiver closes the channel.
    ctx.visit_rx.close();

    let app = Router::new()
        .route("/health", get(health_handler))
        .with_state(ctx.state.clone());
    let server = TestServer::new(app).unwrap();

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), 503);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["visit_queue"]["status"], "error");
}
