mod common;

use axum::{
    Router,
    extract::ConnectInfo,
    routing::{get, post},
};
use axum_test::TestServer;
use curtail::api::handlers::{analytics_handler, redirect_handler, shorten_handler};
use std::net::SocketAddr;

/// Injects a fixed peer address so the `ConnectInfo` extractor works under
/// the mock transport.
#[derive(Clone)]
struct FakePeerLayer;

impl<S> tower::Layer<S> for FakePeerLayer {
    type Service = FakePeerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        FakePeerService { inner }
    }
}

#[derive(Clone)]
struct FakePeerService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for FakePeerService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "203.0.113.9:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}

fn redirect_app(ctx: &common::TestContext) -> TestServer {
    let app = Router::new()
        .route("/{code}", get(redirect_handler))
        .layer(FakePeerLayer)
        .with_state(ctx.state.clone());
    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_redirect_found() {
    let ctx = common::create_test_context();
    common::create_test_link(&ctx, "target1", "https://example.com/target").await;

    let server = redirect_app(&ctx);
    let response = server.get("/target1").await;

    assert_eq!(response.status_code(), 302);
    assert_eq!(response.header("location"), "https://example.com/target");
}

#[tokio::test]
async fn test_redirect_not_found() {
    let ctx = common::create_test_context();
    let server = redirect_app(&ctx);

    let response = server.get("/missing").await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_redirect_emits_click_event() {
    let mut ctx = common::create_test_context();
    common::create_test_link(&ctx, "target1", "https://example.com/target").await;

    let server = redirect_app(&ctx);
    server.get("/target1").await;

    let event = ctx.visit_rx.try_recv().unwrap();
    assert_eq!(event.short_code, "target1");
    assert_eq!(event.destination_url, "https://example.com/target");
    assert_eq!(event.ip.as_deref(), Some("203.0.113.9"));
    assert!(!event.is_scan());
}

#[tokio::test]
async fn test_redirect_with_qr_ref_emits_scan() {
    let mut ctx = common::create_test_context();
    common::create_test_link(&ctx, "target1", "https://example.com/target").await;

    let server = redirect_app(&ctx);
    let response = server.get("/target1").add_query_param("ref", "qr").await;

    assert_eq!(response.status_code(), 302);

    let event = ctx.visit_rx.try_recv().unwrap();
    assert!(event.is_scan());
}

#[tokio::test]
async fn test_redirect_repopulates_cache() {
    let ctx = common::create_test_context();
    common::create_test_link(&ctx, "target1", "https://example.com/target").await;

    let server = redirect_app(&ctx);
    server.get("/target1").await;

    // Write-through is detached from the request.
    tokio::task::yield_now().await;

    use curtail::infrastructure::cache::CacheService;
    assert_eq!(
        ctx.cache.get_url("target1").await.unwrap(),
        Some("https://example.com/target".to_string())
    );
}

#[tokio::test]
async fn test_redirect_cache_hit_skips_store() {
    let ctx = common::create_test_context();

    // Entry exists only in the cache; a store lookup would 404.
    use curtail::infrastructure::cache::CacheService;
    ctx.cache
        .set_url("cached1", "https://cached.example.com", None)
        .await
        .unwrap();

    let server = redirect_app(&ctx);
    let response = server.get("/cached1").await;

    assert_eq!(response.status_code(), 302);
    assert_eq!(response.header("location"), "https://cached.example.com");
}

#[tokio::test]
async fn test_create_resolve_ingest_analytics_flow() {
    let mut ctx = common::create_test_context();

    let app = Router::new()
        .route("/shorten", post(shorten_handler))
        .route("/analytics/{code}", get(analytics_handler))
        .route("/{code}", get(redirect_handler))
        .layer(FakePeerLayer)
        .with_state(ctx.state.clone());
    let server = TestServer::new(app).unwrap();

    let created = server
        .post("/shorten")
        .json(&serde_json::json!({ "url": "https://example.com/launch" }))
        .await;
    assert_eq!(created.status_code(), 201);
    let code = created.json::<serde_json::Value>()["short_code"]
        .as_str()
        .unwrap()
        .to_string();

    let redirect = server.get(&format!("/{code}")).await;
    assert_eq!(redirect.status_code(), 302);

    // Process the queued visit the way the background worker would.
    common::drain_visits(&mut ctx).await;

    let analytics = server.get(&format!("/analytics/{code}")).await;
    analytics.assert_status_ok();
    let json = analytics.json::<serde_json::Value>();
    assert_eq!(json["overview"]["clicks"], 1);
    assert_eq!(json["overview"]["scans"], 0);
    assert_eq!(json["overview"]["total_engagement"], 1);
}

#[tokio::test]
async fn test_redirect_not_found_is_not_cached() {
    let ctx = common::create_test_context();
    let server = redirect_app(&ctx);

    server.get("/missing").await;
    tokio::task::yield_now().await;

    use curtail::infrastructure::cache::CacheService;
    assert_eq!(ctx.cache.get_url("missing").await.unwrap(), None);
}
