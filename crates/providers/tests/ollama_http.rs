//! HTTP-level tests for `OllamaClient` against an in-process fake backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use ollachat_core::error::ProviderError;
use ollachat_core::provider::{GenerationRequest, InferenceClient};
use ollachat_providers::OllamaClient;
use serde_json::{Value, json};

/// Serve `router` on an ephemeral port and return its base URL.
async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// A backend that records each request body and answers with `reply`.
async fn recording_backend(reply: Value) -> (String, Arc<Mutex<Vec<Value>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let router = Router::new().route(
        "/api/generate",
        post(move |Json(body): Json<Value>| {
            let sink = sink.clone();
            let reply = reply.clone();
            async move {
                sink.lock().unwrap().push(body);
                Json(reply)
            }
        }),
    );
    (spawn_backend(router).await, seen)
}

fn client(base_url: &str) -> OllamaClient {
    OllamaClient::new(base_url, Duration::from_secs(5)).unwrap()
}

/// A base URL nothing is listening on.
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

#[tokio::test]
async fn generate_posts_wire_format_and_parses_reply() {
    let (url, seen) = recording_backend(json!({
        "model": "llama3.2",
        "response": "Hello there",
        "done": true,
        "eval_count": 12
    }))
    .await;

    let request = GenerationRequest::new("llama3.2", "System: S\nHuman: U\nAssistant:\n")
        .with_options(0.7, 0.9);
    let response = client(&url).generate(request).await.unwrap();

    assert_eq!(response.text.as_deref(), Some("Hello there"));
    assert!(response.done);
    assert_eq!(response.eval_count, Some(12));

    let bodies = seen.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    assert_eq!(body["model"], "llama3.2");
    assert_eq!(body["prompt"], "System: S\nHuman: U\nAssistant:\n");
    assert_eq!(body["stream"], false);
    assert_eq!(body["options"]["temperature"], 0.7);
    assert_eq!(body["options"]["top_p"], 0.9);
}

#[tokio::test]
async fn trailing_slash_base_url_hits_same_endpoint() {
    let (url, seen) = recording_backend(json!({"response": "ok", "done": true})).await;
    let response = client(&format!("{url}/"))
        .generate(GenerationRequest::new("m", "p"))
        .await
        .unwrap();
    assert_eq!(response.text.as_deref(), Some("ok"));
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn non_success_status_is_protocol_error_with_body() {
    let router = Router::new().route(
        "/api/generate",
        post(|| async {
            (
                StatusCode::NOT_FOUND,
                r#"{"error":"model 'llama9' not found, try pulling it first"}"#,
            )
        }),
    );
    let url = spawn_backend(router).await;

    let err = client(&url)
        .generate(GenerationRequest::new("llama9", "hi"))
        .await
        .unwrap_err();

    match err {
        ProviderError::Protocol {
            status_code,
            reason,
            body,
        } => {
            assert_eq!(status_code, 404);
            assert_eq!(reason, "Not Found");
            assert!(body.contains("try pulling it first"));
        }
        other => panic!("expected Protocol, got {other:?}"),
    }
}

#[tokio::test]
async fn unparseable_body_is_invalid_response() {
    let router = Router::new().route("/api/generate", post(|| async { "definitely not json" }));
    let url = spawn_backend(router).await;

    let err = client(&url)
        .generate(GenerationRequest::new("m", "p"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::InvalidResponse(_)), "got {err:?}");
}

#[tokio::test]
async fn refused_connection_is_transport_error() {
    let err = client(&closed_port_url())
        .generate(GenerationRequest::new("m", "p"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_backend_is_timeout_error() {
    let router = Router::new().route(
        "/api/generate",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({"response": "too late", "done": true}))
        }),
    );
    let url = spawn_backend(router).await;
    let client = OllamaClient::new(&url, Duration::from_millis(200)).unwrap();

    let err = client
        .generate(GenerationRequest::new("m", "p"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Timeout(_)), "got {err:?}");
}

#[tokio::test]
async fn probe_sends_hello_without_options() {
    let (url, seen) = recording_backend(json!({"response": "Hi!", "done": true})).await;

    assert!(client(&url).probe("llama3.2").await);

    let bodies = seen.lock().unwrap();
    assert_eq!(bodies[0]["prompt"], "Hello");
    assert_eq!(bodies[0]["model"], "llama3.2");
    assert_eq!(bodies[0]["stream"], false);
    assert!(bodies[0].get("options").is_none());
}

#[tokio::test]
async fn probe_is_false_for_empty_text() {
    let (url, _) = recording_backend(json!({"response": "", "done": true})).await;
    assert!(!client(&url).probe("llama3.2").await);

    let (url, _) = recording_backend(json!({"response": null, "done": true})).await;
    assert!(!client(&url).probe("llama3.2").await);
}

#[tokio::test]
async fn probe_is_false_when_unreachable() {
    assert!(!client(&closed_port_url()).probe("llama3.2").await);
}
