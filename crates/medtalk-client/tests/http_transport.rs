//! End-to-end tests for the HTTP adapter against an in-process axum server.
//!
//! Each test binds its own server on `127.0.0.1:0`, so tests run in parallel
//! without port clashes and without any external network access.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::{Json, Query};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use bytes::Bytes;
use futures_util::StreamExt;
use serde_json::{Value, json};

use medtalk_client::{ApiClient, ClientConfig, ClientError};
use medtalk_core::{
    ChatRequest, SpeechError, SpeechErrorKind, SpeechRequest, SpeechTransport,
};

// ── Helpers ────────────────────────────────────────────────────────

/// Serve `app` on an ephemeral port and return its base URL.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client_for(base: &str) -> ApiClient {
    ApiClient::new(&ClientConfig::new().with_base_url(base)).unwrap()
}

/// An `audio/mpeg` response whose body arrives as the given chunks.
fn chunked_audio(chunks: Vec<Bytes>) -> Response {
    let stream = futures_util::stream::iter(chunks.into_iter().map(Ok::<_, std::io::Error>));
    Response::builder()
        .header(header::CONTENT_TYPE, "audio/mpeg")
        .body(Body::from_stream(stream))
        .unwrap()
}

/// An `audio/mpeg` response sending `count` chunks of `b"abcd"`, `gap` apart.
fn slow_audio(count: usize, gap: Duration) -> Response {
    let stream = futures_util::stream::unfold(0, move |sent| async move {
        if sent == count {
            return None;
        }
        if sent > 0 {
            tokio::time::sleep(gap).await;
        }
        Some((Ok::<_, std::io::Error>(Bytes::from_static(b"abcd")), sent + 1))
    });
    Response::builder()
        .header(header::CONTENT_TYPE, "audio/mpeg")
        .body(Body::from_stream(stream))
        .unwrap()
}

async fn collect(
    mut stream: medtalk_core::AudioStream,
) -> (Vec<u8>, Option<SpeechError>) {
    let mut bytes = Vec::new();
    while let Some(item) = stream.next().await {
        match item {
            Ok(chunk) => bytes.extend_from_slice(&chunk),
            Err(e) => return (bytes, Some(e)),
        }
    }
    (bytes, None)
}

// ── Streaming speech ───────────────────────────────────────────────

#[tokio::test]
async fn stream_delivers_chunks_in_order_and_sends_context() {
    let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let seen_in_handler = Arc::clone(&seen);

    let app = Router::new().route(
        "/api/speech/stream",
        post(move |Json(body): Json<Value>| {
            let seen = Arc::clone(&seen_in_handler);
            async move {
                *seen.lock().unwrap() = Some(body);
                chunked_audio(vec![
                    Bytes::from_static(&[0x49, 0x44, 0x33]),
                    Bytes::from_static(&[0x04, 0x00]),
                ])
            }
        }),
    );
    let client = client_for(&serve(app).await);

    let request = SpeechRequest::new("Hello")
        .with_session(Some("s-1".to_string()))
        .with_speaker(Some("dr_tewari".to_string()));
    let stream = client.open_stream(&request).await.unwrap();
    let (bytes, error) = collect(stream).await;

    assert!(error.is_none());
    assert_eq!(bytes, vec![0x49, 0x44, 0x33, 0x04, 0x00]);

    let body = seen.lock().unwrap().clone().unwrap();
    assert_eq!(body["text"], "Hello");
    assert_eq!(body["session_id"], "s-1");
    assert_eq!(body["speaker_id"], "dr_tewari");
    assert!(body.get("language").is_none());
}

#[tokio::test]
async fn unavailable_status_is_protocol_error() {
    let app = Router::new().route(
        "/api/speech/stream",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "tts offline") }),
    );
    let client = client_for(&serve(app).await);

    let Err(err) = client.open_stream(&SpeechRequest::new("Hello")).await else {
        panic!("503 must not open a stream");
    };
    assert_eq!(err.kind(), SpeechErrorKind::Protocol);
    assert_eq!(
        err,
        SpeechError::Status {
            status: 503,
            body: "tts offline".to_string()
        }
    );
}

#[tokio::test]
async fn fastapi_detail_is_surfaced() {
    let app = Router::new().route(
        "/api/speech/stream",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                axum::Json(json!({ "detail": "text required" })),
            )
        }),
    );
    let client = client_for(&serve(app).await);

    let Err(err) = client.open_stream(&SpeechRequest::new("Hi")).await else {
        panic!("400 must not open a stream");
    };
    assert!(matches!(
        err,
        SpeechError::Status { status: 400, ref body } if body == "text required"
    ));
}

#[tokio::test]
async fn no_content_is_missing_body() {
    let app = Router::new().route(
        "/api/speech/stream",
        post(|| async { StatusCode::NO_CONTENT }),
    );
    let client = client_for(&serve(app).await);

    let Err(err) = client.open_stream(&SpeechRequest::new("Hello")).await else {
        panic!("204 must not open a stream");
    };
    assert_eq!(err, SpeechError::MissingBody);
}

#[tokio::test]
async fn empty_success_body_is_an_empty_stream() {
    let app = Router::new().route(
        "/api/speech/stream",
        post(|| async { chunked_audio(Vec::new()) }),
    );
    let client = client_for(&serve(app).await);

    let stream = client.open_stream(&SpeechRequest::new("Hello")).await.unwrap();
    let (bytes, error) = collect(stream).await;
    assert!(bytes.is_empty());
    assert!(error.is_none());
}

#[tokio::test]
async fn broken_body_is_transport_error() {
    let app = Router::new().route(
        "/api/speech/stream",
        post(|| async {
            let stream = futures_util::stream::iter(vec![
                Ok(Bytes::from_static(&[0x49, 0x44, 0x33])),
                Err(std::io::Error::other("synthesiser crashed")),
            ]);
            Response::builder()
                .header(header::CONTENT_TYPE, "audio/mpeg")
                .body(Body::from_stream(stream))
                .unwrap()
        }),
    );
    let client = client_for(&serve(app).await);

    let stream = client.open_stream(&SpeechRequest::new("Hello")).await.unwrap();
    let (_, error) = collect(stream).await;
    let error = error.expect("a truncated body must surface an error");
    assert_eq!(error.kind(), SpeechErrorKind::Transport);
}

#[tokio::test]
async fn blank_text_is_rejected_before_any_request() {
    // Nothing listens here; a request would fail with a transport error.
    let client = client_for("http://127.0.0.1:9");
    let Err(err) = client.open_stream(&SpeechRequest::new("   ")).await else {
        panic!("blank text must be rejected");
    };
    assert_eq!(err, SpeechError::EmptyText);
}

#[tokio::test]
async fn refused_connection_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{addr}"));
    let Err(err) = client.open_stream(&SpeechRequest::new("Hello")).await else {
        panic!("nothing is listening");
    };
    assert_eq!(err.kind(), SpeechErrorKind::Transport);
}

// ── Timeouts ───────────────────────────────────────────────────────

#[tokio::test]
async fn long_stream_outlives_request_timeout() {
    let app = Router::new().route(
        "/api/speech/stream",
        post(|| async { slow_audio(3, Duration::from_millis(700)) }),
    );
    let base = serve(app).await;
    let client = ApiClient::new(
        &ClientConfig::new()
            .with_base_url(&base)
            .with_timeout(Duration::from_secs(1)),
    )
    .unwrap();

    let stream = client.open_stream(&SpeechRequest::new("Hello")).await.unwrap();
    let (bytes, error) = collect(stream).await;
    assert!(error.is_none(), "stream cut short: {error:?}");
    assert_eq!(bytes, b"abcdabcdabcd");
}

#[tokio::test]
async fn stalled_stream_hits_idle_timeout() {
    let app = Router::new().route(
        "/api/speech/stream",
        post(|| async { slow_audio(2, Duration::from_secs(2)) }),
    );
    let base = serve(app).await;
    let client = ApiClient::new(
        &ClientConfig::new()
            .with_base_url(&base)
            .with_idle_timeout(Duration::from_millis(300)),
    )
    .unwrap();

    let stream = client.open_stream(&SpeechRequest::new("Hello")).await.unwrap();
    let (bytes, error) = collect(stream).await;
    assert_eq!(bytes, b"abcd");
    let error = error.expect("stall must end the stream with an error");
    assert_eq!(error.kind(), SpeechErrorKind::Transport);
}

#[tokio::test]
async fn slow_headers_hit_request_timeout() {
    let app = Router::new().route(
        "/api/speech/stream",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            slow_audio(1, Duration::ZERO)
        }),
    );
    let base = serve(app).await;
    let client = ApiClient::new(
        &ClientConfig::new()
            .with_base_url(&base)
            .with_timeout(Duration::from_millis(300)),
    )
    .unwrap();

    let Err(err) = client.open_stream(&SpeechRequest::new("Hello")).await else {
        panic!("headers never arrived in time");
    };
    assert_eq!(err.kind(), SpeechErrorKind::Transport);
}

// ── Buffered speech ────────────────────────────────────────────────

#[tokio::test]
async fn buffered_synthesis_returns_locator_that_can_be_fetched() {
    let app = Router::new()
        .route(
            "/api/speech",
            post(|Json(body): Json<Value>| async move {
                axum::Json(json!({
                    "session_id": body["session_id"].as_str().unwrap_or("fresh"),
                    "audio_url": "/media/s1/response_1.mp3",
                    "voice_used": true,
                    "error": null
                }))
            }),
        )
        .route(
            "/media/s1/response_1.mp3",
            get(|| async {
                chunked_audio(vec![
                    Bytes::from_static(b"ID3"),
                    Bytes::from_static(&[0x04, 0x00]),
                ])
            }),
        );
    let client = client_for(&serve(app).await);

    let request = SpeechRequest::new("Hello").with_session(Some("s1".to_string()));
    let response = client.synthesize(&request).await.unwrap();
    assert_eq!(response.session_id, "s1");
    assert!(response.voice_used);

    let locator = response.audio_url.unwrap();
    let (bytes, error) = collect(client.fetch_audio(&locator).await.unwrap()).await;
    assert!(error.is_none());
    assert_eq!(bytes, b"ID3\x04\x00");
}

#[tokio::test]
async fn buffered_synthesis_without_voice() {
    let app = Router::new().route(
        "/api/speech",
        post(|| async {
            axum::Json(json!({
                "session_id": "s2",
                "audio_url": null,
                "voice_used": false,
                "error": "voice generation unavailable"
            }))
        }),
    );
    let client = client_for(&serve(app).await);

    let response = client.synthesize(&SpeechRequest::new("Hello")).await.unwrap();
    assert!(response.audio_url.is_none());
    assert_eq!(response.error.as_deref(), Some("voice generation unavailable"));
}

#[tokio::test]
async fn malformed_json_is_protocol_error() {
    let app = Router::new().route("/api/speech", post(|| async { "not json" }));
    let client = client_for(&serve(app).await);

    let Err(err) = client.synthesize(&SpeechRequest::new("Hello")).await else {
        panic!("garbage must not parse");
    };
    assert_eq!(err.kind(), SpeechErrorKind::Protocol);
}

// ── Chat helpers ───────────────────────────────────────────────────

#[tokio::test]
async fn chat_session_and_history_round_trip() {
    let app = Router::new()
        .route(
            "/api/chat/sessions",
            post(|| async { axum::Json(json!({ "session_id": "abc" })) }),
        )
        .route(
            "/api/chat",
            post(|Json(body): Json<Value>| async move {
                axum::Json(json!({
                    "response": format!("You said: {}", body["message"].as_str().unwrap_or("")),
                    "message": null,
                    "session_id": body["session_id"].as_str().unwrap_or("new"),
                    "audio_url": null,
                    "voice_used": false
                }))
            }),
        )
        .route(
            "/api/chat/history",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let id = params.get("session_id").cloned().unwrap_or_default();
                axum::Json(json!({
                    "session_id": id,
                    "messages": [
                        { "role": "user", "content": "What is PSA?" },
                        { "role": "assistant", "content": "A blood test." }
                    ]
                }))
            }),
        );
    let client = client_for(&serve(app).await);

    let session = client.create_session().await.unwrap();
    assert_eq!(session.session_id, "abc");

    let reply = client
        .chat(&ChatRequest {
            message: "What is PSA?".to_string(),
            session_id: Some(session.session_id.clone()),
        })
        .await
        .unwrap();
    assert_eq!(reply.session_id, "abc");
    assert_eq!(reply.response, "You said: What is PSA?");

    let history = client.history("abc").await.unwrap();
    assert_eq!(history.session_id, "abc");
    assert_eq!(history.messages.len(), 2);
    assert_eq!(history.messages[1].role, "assistant");
}

#[tokio::test]
async fn history_requires_session_id() {
    let client = client_for("http://127.0.0.1:9");
    assert!(matches!(
        client.history("  ").await,
        Err(ClientError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn health_and_clinician() {
    let app = Router::new()
        .route(
            "/api/health",
            get(|| async {
                axum::Json(json!({
                    "status": "ok",
                    "gemini_api_key_loaded": true,
                    "gemini_model": "gemini-2.0-flash",
                    "audio_dir_writable": true
                }))
            }),
        )
        .route(
            "/api/config",
            get(|| async {
                axum::Json(json!({
                    "clinician_name": "Dr Ash Tewari",
                    "clinician_title": "Urologic Surgeon",
                    "avatar_image_url": "/drtewari.png"
                }))
            }),
        );
    let client = client_for(&serve(app).await);

    let health = client.health().await.unwrap();
    assert!(health.is_ok());
    assert_eq!(health.gemini_api_key_loaded, Some(true));

    let clinician = client.clinician().await.unwrap();
    assert_eq!(clinician.clinician_title, "Urologic Surgeon");
}

#[tokio::test]
async fn base_can_be_overridden_at_runtime() {
    let first = serve(Router::new().route(
        "/api/health",
        get(|| async { axum::Json(json!({ "status": "ok" })) }),
    ))
    .await;
    let second = serve(Router::new().route(
        "/api/health",
        get(|| async { axum::Json(json!({ "status": "degraded" })) }),
    ))
    .await;

    let client = client_for(&first);
    assert_eq!(client.health().await.unwrap().status, "ok");

    client.endpoint().set_base(&second).unwrap();
    assert_eq!(client.health().await.unwrap().status, "degraded");
}
