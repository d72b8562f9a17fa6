use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Multipart, RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use bytes::Bytes;
use futures::future::join_all;
use futures::{stream, FutureExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};
use vidstream_api::api::{AuthApi, SearchApi, ShareApi, UserApi};
use vidstream_api::models::search::ScopedLimitParams;
use vidstream_api::models::video::{VideoListParams, VideoSortBy};
use vidstream_api::{
    ApiError, Client, ClientConfig, QueryParams, RequestOptions, TokenPair, UploadFile,
    UploadOptions,
};

// ============================================================================
// Test server infrastructure
// ============================================================================

struct TestServer {
    base_url: String,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    async fn new(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let server = axum::serve(listener, router).with_graceful_shutdown(async {
            shutdown_rx.await.ok();
        });

        tokio::spawn(async move {
            server.await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    fn client(&self) -> Client {
        Client::new(ClientConfig::new(&self.base_url))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
    }
}

// ============================================================================
// Test endpoints
// ============================================================================

#[derive(Default)]
struct Counters {
    refresh_calls: AtomicUsize,
    requests: AtomicUsize,
    uploads: Mutex<Vec<Value>>,
}

type Shared = Arc<Counters>;

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn refresh_ok(State(state): State<Shared>) -> impl IntoResponse {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    // Long enough for every concurrent 401 to join the same refresh
    tokio::time::sleep(Duration::from_millis(200)).await;
    Json(json!({ "accessToken": "fresh", "refreshToken": "refresh-2", "expiresIn": 3600 }))
}

async fn refresh_rejected(State(state): State<Shared>) -> impl IntoResponse {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "refresh token expired" })))
}

/// Accepts only the refreshed token
async fn profile(State(state): State<Shared>, headers: HeaderMap) -> impl IntoResponse {
    state.requests.fetch_add(1, Ordering::SeqCst);
    match bearer(&headers).as_deref() {
        Some("fresh") => (StatusCode::OK, Json(json!({ "name": "viewer" }))),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({ "message": "token expired" }))),
    }
}

async fn always_unauthorized(State(state): State<Shared>) -> impl IntoResponse {
    state.requests.fetch_add(1, Ordering::SeqCst);
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "nope" })))
}

async fn echo_query(RawQuery(query): RawQuery) -> impl IntoResponse {
    Json(json!({ "query": query.unwrap_or_default() }))
}

async fn slow() -> impl IntoResponse {
    tokio::time::sleep(Duration::from_millis(500)).await;
    Json(json!({}))
}

async fn validation_failure() -> impl IntoResponse {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "message": "Title too long", "code": "E_TITLE", "details": { "max": 80 } })),
    )
}

async fn plain_failure() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn no_content() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

async fn login(headers: HeaderMap) -> impl IntoResponse {
    if headers.contains_key(header::AUTHORIZATION) {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "unexpected credential" })));
    }
    (
        StatusCode::OK,
        Json(json!({
            "user": {
                "id": "u1",
                "username": "viewer",
                "email": "viewer@example.com",
                "isVip": false,
                "createdAt": "2024-01-01T00:00:00Z",
                "updatedAt": "2024-01-01T00:00:00Z"
            },
            "accessToken": "access-1",
            "refreshToken": "refresh-1",
            "expiresIn": 3600
        })),
    )
}

async fn summarize_multipart(headers: &HeaderMap, mut multipart: Multipart) -> Value {
    let mut summary = json!({
        "authorization": bearer(headers),
        "requestContentType": headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
    });
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            summary["fileName"] = json!(field.file_name().map(str::to_string));
            summary["contentType"] = json!(field.content_type().map(str::to_string));
            let data = field.bytes().await.unwrap();
            summary["size"] = json!(data.len());
        } else {
            summary[name] = json!(field.text().await.unwrap());
        }
    }
    summary
}

async fn upload(
    State(state): State<Shared>,
    headers: HeaderMap,
    multipart: Multipart,
) -> impl IntoResponse {
    let summary = summarize_multipart(&headers, multipart).await;
    state.uploads.lock().unwrap().push(summary.clone());
    Json(summary)
}

/// Reads the whole form, then accepts it only under the refreshed token
async fn guarded_upload(
    State(state): State<Shared>,
    headers: HeaderMap,
    multipart: Multipart,
) -> impl IntoResponse {
    let summary = summarize_multipart(&headers, multipart).await;
    state.uploads.lock().unwrap().push(summary.clone());
    match bearer(&headers).as_deref() {
        Some("fresh") => (StatusCode::OK, Json(summary)),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({ "message": "token expired" }))),
    }
}

/// Reports what arrived: content type, raw body length and the body as JSON
async fn inspect_body(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    Json(json!({
        "contentType": headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        "length": body.len(),
        "body": serde_json::from_slice::<Value>(&body).ok(),
    }))
}

/// Sends headers and the first byte, then stalls the rest of the body
async fn stalled_body() -> impl IntoResponse {
    let chunks = stream::once(async { Ok::<_, std::io::Error>(Bytes::from_static(b"{")) }).chain(
        stream::once(async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Bytes::from_static(b"}"))
        }),
    );
    (
        [(header::CONTENT_TYPE, "application/json")],
        Body::from_stream(chunks),
    )
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/auth/refresh", post(refresh_ok))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(plain_failure))
        .route("/api/profile", get(profile))
        .route("/api/locked", get(always_unauthorized))
        .route("/api/echo", get(echo_query))
        .route("/api/slow", get(slow))
        .route("/api/invalid", post(validation_failure))
        .route("/api/broken", get(plain_failure))
        .route("/api/user/history/:id", delete(no_content))
        .route("/api/upload", post(upload))
        .route("/api/upload/guarded", post(guarded_upload))
        .route(
            "/api/inspect",
            post(inspect_body).put(inspect_body).patch(inspect_body),
        )
        .route("/api/stall", get(stalled_body))
        .route(
            "/api/share/data",
            get(|| async { Json(json!({ "success": false, "message": "Sharing disabled" })) }),
        )
        .with_state(state)
}

async fn setup() -> (TestServer, Shared) {
    let state = Shared::default();
    (TestServer::new(router(state.clone())).await, state)
}

// ============================================================================
// Token refresh
// ============================================================================

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_refresh() {
    let (server, state) = setup().await;
    let client = server.client();
    client.tokens().set_tokens("stale", "refresh-1").unwrap();

    let params = QueryParams::new();
    let results = join_all(
        (0..5).map(|_| client.get::<Value>("/profile", &params, RequestOptions::new())),
    )
    .await;

    for result in results {
        assert_eq!(result.unwrap()["name"], "viewer");
    }
    assert_eq!(state.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(state.requests.load(Ordering::SeqCst), 10);
    assert_eq!(client.tokens().get_access_token().as_deref(), Some("fresh"));
    assert_eq!(client.tokens().get_refresh_token().as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn retried_request_failure_is_final() {
    let (server, state) = setup().await;
    let client = server.client();
    client.tokens().set_tokens("stale", "refresh-1").unwrap();

    let err = client
        .get::<Value>("/locked", &QueryParams::new(), RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(state.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(state.requests.load(Ordering::SeqCst), 2);
    // The refresh itself succeeded, so the new pair is kept
    assert_eq!(client.tokens().get_access_token().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn failed_refresh_clears_tokens() {
    let state = Shared::default();
    let app = Router::new()
        .route("/api/auth/refresh", post(refresh_rejected))
        .route("/api/profile", get(profile))
        .with_state(state.clone());
    let server = TestServer::new(app).await;
    let client = server.client();
    client.tokens().set_tokens("stale", "refresh-1").unwrap();

    let err = client
        .get::<Value>("/profile", &QueryParams::new(), RequestOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Auth(ref m) if m == "Token refresh failed"));
    assert!(err.requires_login());
    assert_eq!(state.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(client.tokens().get_access_token(), None);
    assert_eq!(client.tokens().get_refresh_token(), None);
}

#[tokio::test]
async fn unauthenticated_requests_never_refresh() {
    let (server, state) = setup().await;
    let client = server.client();

    // No token stored
    let err = client
        .get::<Value>("/profile", &QueryParams::new(), RequestOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));

    // Token stored but explicitly not sent
    client.tokens().set_tokens("stale", "refresh-1").unwrap();
    let err = client
        .get::<Value>(
            "/profile",
            &QueryParams::new(),
            RequestOptions::new().no_credential(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));

    assert_eq!(state.refresh_calls.load(Ordering::SeqCst), 0);
    assert_eq!(client.tokens().get_access_token().as_deref(), Some("stale"));
}

#[tokio::test]
async fn refresh_hook_receives_new_pair() {
    let (server, _state) = setup().await;
    let client = server.client();
    client.tokens().set_tokens("stale", "refresh-1").unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    client.tokens().set_on_tokens_refreshed(Arc::new(move |pair: TokenPair| {
        let sink = sink.clone();
        async move {
            sink.lock().unwrap().push(pair.access_token);
        }
        .boxed()
    }));

    assert_ok!(
        client
            .get::<Value>("/profile", &QueryParams::new(), RequestOptions::new())
            .await
    );
    assert_eq!(*seen.lock().unwrap(), vec!["fresh".to_string()]);
}

// ============================================================================
// Transport behaviour
// ============================================================================

#[tokio::test]
async fn slow_responses_time_out() {
    let (server, _state) = setup().await;
    let client = Client::new(
        ClientConfig::new(&server.base_url).with_timeout(Duration::from_millis(100)),
    );

    let err = client
        .get::<Value>("/slow", &QueryParams::new(), RequestOptions::new())
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(err.to_string(), "Request timeout");
}

#[tokio::test]
async fn stalled_response_body_times_out() {
    let (server, _state) = setup().await;
    let client = Client::new(
        ClientConfig::new(&server.base_url).with_timeout(Duration::from_millis(200)),
    );

    let started = std::time::Instant::now();
    let err = client
        .get::<Value>("/stall", &QueryParams::new(), RequestOptions::new())
        .await
        .unwrap_err();

    assert!(err.is_timeout(), "unexpected error: {:?}", err);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn json_verbs_send_serialized_body_with_json_content_type() {
    let (server, _state) = setup().await;
    let client = server.client();
    let payload = json!({ "title": "x" });
    let expected_len = serde_json::to_vec(&payload).unwrap().len();

    let replies: Vec<Value> = vec![
        client.post("/inspect", &payload, RequestOptions::new()).await.unwrap(),
        client.put("/inspect", &payload, RequestOptions::new()).await.unwrap(),
        client.patch("/inspect", &payload, RequestOptions::new()).await.unwrap(),
    ];

    for reply in replies {
        assert_eq!(reply["contentType"], "application/json");
        assert_eq!(reply["length"], expected_len);
        assert_eq!(reply["body"], payload);
    }
}

#[tokio::test]
async fn empty_verbs_send_no_body() {
    let (server, _state) = setup().await;
    let client = server.client();

    let replies: Vec<Value> = vec![
        client.post_empty("/inspect", RequestOptions::new()).await.unwrap(),
        client.put_empty("/inspect", RequestOptions::new()).await.unwrap(),
        client.patch_empty("/inspect", RequestOptions::new()).await.unwrap(),
    ];

    for reply in replies {
        assert_eq!(reply["contentType"], "application/json");
        assert_eq!(reply["length"], 0);
        assert!(reply["body"].is_null());
    }
}

#[tokio::test]
async fn list_params_are_flattened_into_the_query_string() {
    let (server, _state) = setup().await;
    let client = server.client();

    let params = VideoListParams {
        tags: Some(vec!["a".into(), "b".into()]),
        sort_by: Some(VideoSortBy::Popular),
        ..Default::default()
    };
    let echoed: Value = client
        .get(
            "/echo",
            &QueryParams::from_serialize(&params).unwrap(),
            RequestOptions::new(),
        )
        .await
        .unwrap();

    let query = echoed["query"].as_str().unwrap();
    assert!(query.contains("tags=a%2Cb"), "query was {}", query);
    assert!(query.contains("sortBy=popular"));
    assert!(!query.contains("page"));
}

#[tokio::test]
async fn server_errors_are_normalized() {
    let (server, _state) = setup().await;
    let client = server.client();

    let err = client
        .post::<Value, _>("/invalid", &json!({ "title": "x" }), RequestOptions::new())
        .await
        .unwrap_err();
    match err {
        ApiError::Http { status, ref message, ref details, .. } => {
            assert_eq!(status, 422);
            assert_eq!(message, "Title too long");
            assert_eq!(details.as_ref().unwrap()["max"], 80);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.code(), Some("E_TITLE"));

    let err = client
        .get::<Value>("/broken", &QueryParams::new(), RequestOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn empty_success_bodies_decode() {
    let (server, _state) = setup().await;
    let client = server.client();

    assert_ok!(client.delete_play_history("h1").await);
    let value: Value = client
        .delete("/user/history/h2", RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(value, json!({}));
}

#[tokio::test]
async fn connection_failures_are_network_errors() {
    // Bind then drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = Client::new(ClientConfig::new(format!("http://{}", addr)));
    let err = client
        .get::<Value>("/anything", &QueryParams::new(), RequestOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
}

// ============================================================================
// Domain endpoints
// ============================================================================

#[tokio::test]
async fn login_sends_no_credential_and_stores_tokens() {
    let (server, _state) = setup().await;
    let client = server.client();
    client.tokens().set_tokens("old", "old-refresh").unwrap();

    let auth = client.login("viewer", "secret123").await.unwrap();
    assert_eq!(auth.user.username, "viewer");
    assert_eq!(client.tokens().get_access_token().as_deref(), Some("access-1"));
    assert_eq!(client.tokens().get_refresh_token().as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn logout_clears_tokens_even_when_the_server_fails() {
    let (server, _state) = setup().await;
    let client = server.client();
    client.tokens().set_tokens("access-1", "refresh-1").unwrap();

    let err = assert_err!(client.logout().await);
    assert_eq!(err.status(), Some(500));
    assert_eq!(client.tokens().get_access_token(), None);
    assert_eq!(client.tokens().get_refresh_token(), None);
}

#[tokio::test]
async fn unsuccessful_envelope_becomes_an_error() {
    let (server, _state) = setup().await;
    let client = server.client();

    let err = client.get_share_data().await.unwrap_err();
    assert!(matches!(err, ApiError::Other(ref m) if m == "Sharing disabled"));
}

#[tokio::test]
async fn empty_autocomplete_makes_no_request() {
    let (server, state) = setup().await;
    let client = server.client();

    let entries = client
        .get_auto_complete("", &ScopedLimitParams::default())
        .await
        .unwrap();
    assert!(entries.is_empty());
    assert_eq!(state.requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rating_outside_range_is_rejected() {
    let (server, _state) = setup().await;
    let client = server.client();

    for rating in [0, 6] {
        let err = client.rate_video("v1", rating).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation { ref field, .. } if field == "rating"));
    }
    let err = client.delete_favorites(&[]).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation { .. }));
}

// ============================================================================
// Uploads
// ============================================================================

#[tokio::test]
async fn upload_sends_file_fields_and_reports_progress() {
    let (server, state) = setup().await;
    let client = server.client();
    client.tokens().set_tokens("access-1", "refresh-1").unwrap();

    let progress = Arc::new(Mutex::new(Vec::new()));
    let sink = progress.clone();
    let file = UploadFile::new("clip.png", "image/png", Bytes::from(vec![7u8; 200_000]));

    let reply = client
        .upload_file(
            "/upload",
            file,
            UploadOptions::new()
                .with_additional_data(QueryParams::new().insert("title", "Holiday"))
                .on_progress(move |percent| sink.lock().unwrap().push(percent)),
        )
        .await
        .unwrap();

    assert_eq!(reply["fileName"], "clip.png");
    assert_eq!(reply["contentType"], "image/png");
    assert_eq!(reply["size"], 200_000);
    assert_eq!(reply["title"], "Holiday");
    assert_eq!(reply["authorization"], "access-1");
    assert_eq!(state.uploads.lock().unwrap().len(), 1);

    let progress = progress.lock().unwrap();
    assert_eq!(progress.last(), Some(&100));
    assert!(progress.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn multipart_upload_is_rebuilt_after_refresh() {
    let (server, state) = setup().await;
    let client = server.client();
    client.tokens().set_tokens("stale", "refresh-1").unwrap();

    let file = UploadFile::new("avatar.png", "image/png", Bytes::from(vec![1u8; 1000]));
    let reply: Value = client
        .upload(
            "/upload/guarded",
            file,
            QueryParams::new().insert("title", "Me"),
            RequestOptions::new(),
        )
        .await
        .unwrap();

    assert_eq!(state.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(reply["authorization"], "fresh");
    assert_eq!(reply["size"], 1000);
    assert_eq!(reply["fileName"], "avatar.png");
    assert_eq!(reply["title"], "Me");

    let attempts = state.uploads.lock().unwrap();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0]["authorization"], "stale");
    for attempt in attempts.iter() {
        let content_type = attempt["requestContentType"].as_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data"), "{}", content_type);
        assert_eq!(attempt["size"], 1000);
        assert_eq!(attempt["title"], "Me");
    }
}

#[tokio::test]
async fn oversized_upload_is_rejected_locally() {
    let (server, state) = setup().await;
    let client = server.client();

    let file = UploadFile::new("big.png", "image/png", Bytes::from(vec![0u8; 2 * 1024 * 1024]));
    let err = client
        .upload_file("/upload", file, UploadOptions::new().with_max_size(1024 * 1024))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Invalid file: File size must not exceed 1MB");
    assert!(state.uploads.lock().unwrap().is_empty());
}
