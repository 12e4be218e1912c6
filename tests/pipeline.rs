//! End-to-end behaviour of the admission pipeline, driven through
//! `tower::ServiceExt::oneshot` against an in-memory store.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, Response, StatusCode},
    routing::{get, post},
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use mut_api::{
    api,
    middleware::{
        auth::RoleGate,
        pipeline::{self, PipelineConfig},
    },
    repos::{
        MemoryStore, Session, User,
        user_repo::{ROLE_ADMIN, ROLE_READONLY, ROLE_USER},
    },
    services::metrics::{
        HttpMetrics, REQUEST_DURATION_SECONDS, REQUEST_SIZE_BYTES, RESPONSE_SIZE_BYTES,
        UNMATCHED_ROUTE,
    },
    state::AppState,
};

const MAX_BODY_BYTES: usize = 64;

struct Harness {
    app: Router,
    store: Arc<MemoryStore>,
    metrics: Arc<HttpMetrics>,
    hits: Arc<AtomicUsize>,
}

fn user(id: i64, role: &str, api_key: Option<&str>, is_active: bool) -> User {
    User {
        id,
        email: format!("user{id}@example.com"),
        role: role.to_string(),
        api_key: api_key.map(str::to_string),
        is_active,
    }
}

fn session(id: i64, token: &str, user_id: i64, ttl: chrono::Duration, revoked: bool) -> Session {
    Session {
        id,
        token: token.to_string(),
        user_id,
        expires_at: Utc::now() + ttl,
        revoked,
    }
}

async fn explode() -> &'static str {
    panic!("handler exploded")
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    store.insert_user(user(1, ROLE_ADMIN, Some("admin-key"), true));
    store.insert_user(user(2, ROLE_READONLY, Some("readonly-key"), true));
    store.insert_user(user(3, ROLE_ADMIN, Some("inactive-key"), false));
    store.insert_user(user(4, ROLE_USER, None, true));
    store.insert_user(user(5, "guest", Some("guest-key"), true));
    store.insert_session(session(10, "sess-valid", 4, chrono::Duration::hours(1), false));
    store.insert_session(session(11, "sess-expired", 4, chrono::Duration::hours(-1), false));
    store.insert_session(session(12, "sess-revoked", 4, chrono::Duration::hours(1), true));
    store.insert_session(session(13, "sess-orphan", 99, chrono::Duration::hours(1), false));

    let metrics = Arc::new(HttpMetrics::new().unwrap());
    let state = AppState::from_store(store.clone(), metrics.clone());
    let hits = Arc::new(AtomicUsize::new(0));

    let admin_hits = hits.clone();
    let thing_hits = hits.clone();
    let nobody_hits = hits.clone();

    let v1 = api::v1::routes()
        .route(
            "/admin/users",
            RoleGate::any_of([ROLE_ADMIN]).guard(get(move || {
                admin_hits.fetch_add(1, Ordering::SeqCst);
                async { "[]" }
            })),
        )
        .route(
            "/things",
            RoleGate::any_of([ROLE_ADMIN, ROLE_USER]).guard(post(move |body: Bytes| {
                thing_hits.fetch_add(1, Ordering::SeqCst);
                async move { body.len().to_string() }
            })),
        )
        .route(
            "/nobody",
            RoleGate::any_of(Vec::<String>::new()).guard(get(move || {
                nobody_hits.fetch_add(1, Ordering::SeqCst);
                async { "unreachable" }
            })),
        )
        .route(
            "/boom",
            RoleGate::any_of([ROLE_ADMIN]).guard(get(explode)),
        );

    let router = Router::new()
        .route("/metrics", get(api::metrics::metrics))
        .nest("/api/v1", v1);

    let config = PipelineConfig {
        max_body_bytes: MAX_BODY_BYTES,
        request_timeout: Duration::from_secs(5),
    };
    let app = pipeline::apply(router, &state, &config).with_state(state);

    Harness {
        app,
        store,
        metrics,
        hits,
    }
}

fn get_req(uri: &str) -> axum::http::request::Builder {
    Request::builder().method("GET").uri(uri)
}

async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn text_body(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_is_public_and_tagged() {
    let h = harness();

    let response = send(&h.app, get_req("/api/v1/public/_health").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let request_id = response.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert!(uuid::Uuid::parse_str(request_id).is_ok());
    assert_eq!(json_body(response).await, serde_json::json!({"status": "ok"}));
}

#[tokio::test]
async fn client_request_id_is_echoed() {
    let h = harness();

    let req = get_req("/api/v1/action/profile")
        .header("x-request-id", "trace-42")
        .body(Body::empty())
        .unwrap();
    let response = send(&h.app, req).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers().get("x-request-id").unwrap(), "trace-42");
}

#[tokio::test]
async fn missing_credentials_are_401() {
    let h = harness();

    let response = send(&h.app, get_req("/api/v1/admin/users").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(
        json_body(response).await,
        serde_json::json!({"errorMessage": "Not authenticated"})
    );
    assert_eq!(h.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn admin_api_key_reaches_handler_and_is_counted_once() {
    let h = harness();

    let req = get_req("/api/v1/admin/users")
        .header("x-api-key", "admin-key")
        .body(Body::empty())
        .unwrap();
    let response = send(&h.app, req).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(h.hits.load(Ordering::SeqCst), 1);
    assert_eq!(
        h.metrics.request_count("GET", "/api/v1/admin/users", "200"),
        1
    );
}

#[tokio::test]
async fn inactive_user_is_403() {
    let h = harness();

    let req = get_req("/api/v1/admin/users")
        .header("x-api-key", "inactive-key")
        .body(Body::empty())
        .unwrap();
    let response = send(&h.app, req).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({"errorMessage": "Account is inactive"})
    );
    assert_eq!(h.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn wrong_role_is_403() {
    let h = harness();

    let req = get_req("/api/v1/admin/users")
        .header("x-api-key", "readonly-key")
        .body(Body::empty())
        .unwrap();
    let response = send(&h.app, req).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({"errorMessage": "Insufficient permissions"})
    );
}

#[tokio::test]
async fn empty_role_set_rejects_every_principal() {
    let h = harness();

    let req = get_req("/api/v1/nobody")
        .header("x-api-key", "admin-key")
        .body(Body::empty())
        .unwrap();
    let response = send(&h.app, req).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(h.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_api_key_is_401() {
    let h = harness();

    let req = get_req("/api/v1/admin/users")
        .header("x-api-key", "nope")
        .body(Body::empty())
        .unwrap();
    let response = send(&h.app, req).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({"errorMessage": "Invalid API key"})
    );
}

#[tokio::test]
async fn session_cookie_reaches_profile() {
    let h = harness();

    let req = get_req("/api/v1/action/profile")
        .header("cookie", "theme=dark; _mut_session=sess-valid")
        .body(Body::empty())
        .unwrap();
    let response = send(&h.app, req).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({
            "id": 4,
            "email": "user4@example.com",
            "role": "user",
            "isActive": true
        })
    );
}

#[tokio::test]
async fn bad_sessions_are_401() {
    let h = harness();

    for token in ["sess-expired", "sess-revoked", "sess-orphan", "sess-unknown"] {
        let req = get_req("/api/v1/action/profile")
            .header("cookie", format!("_mut_session={token}"))
            .body(Body::empty())
            .unwrap();
        let response = send(&h.app, req).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "token {token}");
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"errorMessage": "Invalid or expired session"})
        );
    }

    // expired sessions are discarded on sight
    assert!(!h.store.has_session(11));
    assert!(h.store.has_session(12));
}

#[tokio::test]
async fn api_key_wins_over_session_cookie() {
    let h = harness();

    let req = get_req("/api/v1/action/profile")
        .header("x-api-key", "admin-key")
        .header("cookie", "_mut_session=sess-valid")
        .body(Body::empty())
        .unwrap();
    let response = send(&h.app, req).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["id"], 1);
    assert_eq!(h.store.session_lookups(), 0);
}

#[tokio::test]
async fn unknown_role_cannot_read_profile() {
    let h = harness();

    let req = get_req("/api/v1/action/profile")
        .header("x-api-key", "guest-key")
        .body(Body::empty())
        .unwrap();
    let response = send(&h.app, req).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn panicking_handler_is_500_json_and_counted() {
    let h = harness();

    let req = get_req("/api/v1/boom")
        .header("x-api-key", "admin-key")
        .body(Body::empty())
        .unwrap();
    let response = send(&h.app, req).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        json_body(response).await,
        serde_json::json!({"errorMessage": "Internal server error"})
    );
    assert_eq!(h.metrics.request_count("GET", "/api/v1/boom", "500"), 1);
    assert_eq!(h.metrics.request_count("GET", "/api/v1/boom", "499"), 0);
}

#[tokio::test]
async fn body_at_limit_is_allowed() {
    let h = harness();

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/things")
        .header("x-api-key", "admin-key")
        .header("content-length", MAX_BODY_BYTES.to_string())
        .body(Body::from(vec![b'x'; MAX_BODY_BYTES]))
        .unwrap();
    let response = send(&h.app, req).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text_body(response).await, MAX_BODY_BYTES.to_string());
    assert_eq!(h.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn body_over_limit_is_413_without_handler() {
    let h = harness();

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/things")
        .header("x-api-key", "admin-key")
        .header("content-length", (MAX_BODY_BYTES + 1).to_string())
        .body(Body::from(vec![b'x'; MAX_BODY_BYTES + 1]))
        .unwrap();
    let response = send(&h.app, req).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({"errorMessage": "Request body too large"})
    );
    assert_eq!(h.hits.load(Ordering::SeqCst), 0);
    assert_eq!(h.metrics.request_count("POST", "/api/v1/things", "413"), 1);
    assert_eq!(h.metrics.sample_count(REQUEST_DURATION_SECONDS), 1);
    assert_eq!(h.metrics.sample_count(REQUEST_SIZE_BYTES), 1);
}

#[tokio::test]
async fn streamed_body_over_limit_is_413_json() {
    let h = harness();

    let chunks = futures_util::stream::iter([
        Ok::<_, std::io::Error>(Bytes::from(vec![b'x'; MAX_BODY_BYTES])),
        Ok(Bytes::from_static(b"overflow")),
    ]);
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/things")
        .header("x-api-key", "admin-key")
        .body(Body::from_stream(chunks))
        .unwrap();
    let response = send(&h.app, req).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(
        json_body(response).await,
        serde_json::json!({"errorMessage": "Request body too large"})
    );
    assert_eq!(h.metrics.request_count("POST", "/api/v1/things", "413"), 1);
}

#[tokio::test]
async fn scrape_is_not_recorded() {
    let h = harness();

    send(&h.app, get_req("/api/v1/public/_health").body(Body::empty()).unwrap()).await;
    let before = h.metrics.request_count("GET", "/api/v1/public/_health", "200");
    assert_eq!(before, 1);

    let response = send(
        &h.app,
        get_req("/metrics")
            .header("content-length", "0")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    let exposition = text_body(response).await;
    assert!(exposition.contains("http_requests_total"));
    assert!(exposition.contains("path=\"/api/v1/public/_health\""));

    assert_eq!(h.metrics.sample_count(REQUEST_DURATION_SECONDS), 1);
    assert_eq!(h.metrics.sample_count(RESPONSE_SIZE_BYTES), 1);
    assert_eq!(h.metrics.sample_count(REQUEST_SIZE_BYTES), 0);
    assert!(!h.metrics.observed_paths().contains(&"/metrics".to_string()));
}

#[tokio::test]
async fn raw_paths_never_become_labels() {
    let h = harness();

    for id in 0..5 {
        let response = send(
            &h.app,
            get_req(&format!("/random/{id}")).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key("x-request-id"));
    }
    send(&h.app, get_req("/api/v1/public/_health").body(Body::empty()).unwrap()).await;

    assert_eq!(
        h.metrics.observed_paths(),
        vec![
            "/api/v1/public/_health".to_string(),
            UNMATCHED_ROUTE.to_string()
        ]
    );
    assert_eq!(h.metrics.request_count("GET", UNMATCHED_ROUTE, "404"), 5);
}

#[tokio::test]
async fn readiness_follows_the_store() {
    let h = harness();

    let response = send(&h.app, get_req("/api/v1/public/_ready").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);

    h.store.set_reachable(false);
    let response = send(&h.app, get_req("/api/v1/public/_ready").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await, serde_json::json!({"status": "not_ok"}));
}

#[tokio::test]
async fn reset_clears_every_series() {
    let h = harness();

    send(&h.app, get_req("/api/v1/public/_health").body(Body::empty()).unwrap()).await;
    h.metrics.reset();
    assert_eq!(h.metrics.sample_count(REQUEST_DURATION_SECONDS), 0);
    assert!(h.metrics.observed_paths().is_empty());
}
