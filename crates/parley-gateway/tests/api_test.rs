//! Integration tests for the HTTP API.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use parley_core::ChatMessage;
use serde_json::{Value, json};
use tower::ServiceExt;

mod common;

use common::{MockProvider, test_app};

async fn json_body(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn post_chat(body: Value) -> Request<Body> {
    Request::post("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ============================================================================
// Status Endpoints
// ============================================================================

#[tokio::test]
async fn test_root() {
    let app = test_app(MockProvider::ok("ChatGPT", "unused"));

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"message": "Multi-AI Chatbot API is running"})
    );
}

#[tokio::test]
async fn test_health() {
    let app = test_app(MockProvider::ok("ChatGPT", "unused"));

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"status": "healthy"}));
}

// ============================================================================
// Chat API
// ============================================================================

#[tokio::test]
async fn test_chat_hello_chatgpt() {
    let mock = MockProvider::ok("ChatGPT", "Hello! How can I help you today?");
    let app = test_app(mock.clone());

    let response = app
        .oneshot(post_chat(json!({"message": "Hello", "provider": "chatgpt"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"response": "Hello! How can I help you today?", "provider": "chatgpt"})
    );

    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, vec![ChatMessage::user("Hello")]);
    assert_eq!(calls[0].1, "You are a helpful assistant.");
}

#[tokio::test]
async fn test_chat_echoes_provider() {
    for tag in ["chatgpt", "grok", "openrouter"] {
        let app = test_app(MockProvider::ok("Mock", "reply"));
        let response = app
            .oneshot(post_chat(json!({
                "message": "hi",
                "provider": tag,
                "conversation_history": []
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["provider"], tag);
    }
}

#[tokio::test]
async fn test_chat_invalid_provider() {
    let mock = MockProvider::ok("ChatGPT", "unused");
    let app = test_app(mock.clone());

    let response = app
        .oneshot(post_chat(json!({"message": "Hello", "provider": "unknown"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({"detail": "Invalid provider"}));
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_chat_provider_failure() {
    let mock = MockProvider::failing("OpenRouter", "Incorrect API key provided");
    let app = test_app(mock);

    let response = app
        .oneshot(post_chat(json!({"message": "Hello", "provider": "openrouter"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert!(
        json["detail"]
            .as_str()
            .unwrap()
            .contains("OpenRouter error: Incorrect API key provided")
    );
}

#[tokio::test]
async fn test_chat_forwards_last_ten_history_entries() {
    let mock = MockProvider::ok("Grok", "42");
    let app = test_app(mock.clone());

    let history: Vec<Value> = (0..12)
        .map(|i| {
            json!({
                "id": i,
                "text": format!("m{}", i),
                "sender": if i % 2 == 0 { "user" } else { "ai" },
                "timestamp": "10:00"
            })
        })
        .collect();

    let response = app
        .oneshot(post_chat(json!({
            "message": "What is the answer?",
            "provider": "grok",
            "conversation_history": history
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (messages, system) = &mock.calls()[0];
    assert!(system.starts_with("You are Grok"));
    assert_eq!(messages.len(), 11);
    assert_eq!(messages[0], ChatMessage::user("m2"));
    assert_eq!(messages[1], ChatMessage::assistant("m3"));
    assert_eq!(messages[9], ChatMessage::assistant("m11"));
    assert_eq!(messages[10], ChatMessage::user("What is the answer?"));
}

#[tokio::test]
async fn test_chat_ignores_malformed_entry_outside_history_window() {
    let mock = MockProvider::ok("ChatGPT", "ok");
    let app = test_app(mock.clone());

    let mut history = vec![json!({"id": 0, "text": "stale"})];
    history.extend((1..=10).map(|i| json!({"sender": "ai", "text": format!("m{}", i)})));

    let response = app
        .oneshot(post_chat(json!({
            "message": "Hello",
            "provider": "chatgpt",
            "conversation_history": history
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (messages, _) = &mock.calls()[0];
    assert_eq!(messages.len(), 11);
    assert_eq!(messages[0], ChatMessage::assistant("m1"));
}

#[tokio::test]
async fn test_chat_malformed_body() {
    let mock = MockProvider::ok("ChatGPT", "unused");
    let app = test_app(mock.clone());

    let response = app
        .oneshot(post_chat(json!({"provider": "chatgpt"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json_body(response).await["detail"].is_string());
    assert!(mock.calls().is_empty());
}

// ============================================================================
// CORS
// ============================================================================

#[tokio::test]
async fn test_cors_preflight_allowed_origin() {
    let app = test_app(MockProvider::ok("ChatGPT", "unused"));

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/chat")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
}

#[tokio::test]
async fn test_cors_rejects_unknown_origin() {
    let app = test_app(MockProvider::ok("ChatGPT", "ok"));

    let response = app
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, "http://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}
