use futures::StreamExt;
use serde_json::json;
use tempfile::TempDir;

use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use antelito::app::App;
use antelito::library::{Capability, DocumentStore, LibraryManager};
use antelito::providers::{ContentPart, GeminiProvider, ModelProvider};
use antelito::session::REQUEST_ERROR_MESSAGE;

const SSE_BODY: &str = concat!(
    "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hola \"}]}}]}\n\n",
    "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"mundo\"}]}}]}\n\n",
);

fn sse_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body)
}

async fn provider_for(server: &MockServer) -> GeminiProvider {
    GeminiProvider::new(
        "test-key".to_string(),
        "gemini-test".to_string(),
        Some(server.uri()),
    )
    .unwrap()
}

/// Fragments arrive in order from the SSE stream.
#[tokio::test]
async fn test_stream_message_yields_fragments() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-test:streamGenerateContent"))
        .and(query_param("alt", "sse"))
        .and(query_param("key", "test-key"))
        .respond_with(sse_response(SSE_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server).await;
    let mut stream = provider
        .stream_message(
            "instruccion",
            &[],
            vec![ContentPart::Text {
                text: "hola".to_string(),
            }],
        )
        .await
        .unwrap();

    let mut fragments = Vec::new();
    while let Some(item) = stream.next().await {
        fragments.push(item.unwrap());
    }
    assert_eq!(fragments, vec!["Hola ", "mundo"]);
}

/// The request carries the system instruction and the turn payload.
#[tokio::test]
async fn test_stream_message_request_shape() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-test:streamGenerateContent"))
        .and(body_partial_json(json!({
            "systemInstruction": {"parts": [{"text": "instruccion"}]},
            "contents": [{"role": "user", "parts": [{"text": "hola"}]}]
        })))
        .respond_with(sse_response(SSE_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server).await;
    let mut stream = provider
        .stream_message(
            "instruccion",
            &[],
            vec![ContentPart::Text {
                text: "hola".to_string(),
            }],
        )
        .await
        .unwrap();
    while stream.next().await.is_some() {}
}

/// A non-success status fails the request before any streaming starts.
#[tokio::test]
async fn test_stream_message_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-test:streamGenerateContent"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .mount(&server)
        .await;

    let provider = provider_for(&server).await;
    let result = provider
        .stream_message(
            "instruccion",
            &[],
            vec![ContentPart::Text {
                text: "hola".to_string(),
            }],
        )
        .await;
    assert!(result.is_err());
}

async fn app_against(server: &MockServer, dir: &TempDir) -> App {
    let store = DocumentStore::new_with_path(dir.path()).unwrap();
    let manager = LibraryManager::init(store, None).await.unwrap();
    let provider = provider_for(server).await;
    App::new(manager, Box::new(provider), Capability::User)
}

/// End to end: a turn streams into the transcript.
#[tokio::test]
async fn test_send_turn_streams_into_transcript() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-test:streamGenerateContent"))
        .respond_with(sse_response(SSE_BODY))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut app = app_against(&server, &dir).await;

    let mut seen = String::new();
    app.send_turn("hola", vec![], |f| seen.push_str(f))
        .await
        .unwrap();

    assert_eq!(seen, "Hola mundo");
    let transcript = app.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1].text, "Hola mundo");
    assert!(!transcript[1].is_thinking);
}

/// End to end: a provider failure leaves the canned reply.
#[tokio::test]
async fn test_send_turn_failure_sets_canned_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-test:streamGenerateContent"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut app = app_against(&server, &dir).await;

    app.send_turn("hola", vec![], |_| {}).await.unwrap();
    let transcript = app.transcript();
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript.last().unwrap().text, REQUEST_ERROR_MESSAGE);
}

/// A second turn replays the first exchange as history.
#[tokio::test]
async fn test_second_turn_carries_history() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-test:streamGenerateContent"))
        .respond_with(sse_response(SSE_BODY))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut app = app_against(&server, &dir).await;

    app.send_turn("primera", vec![], |_| {}).await.unwrap();

    // The second request must replay the first user turn and reply.
    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-test:streamGenerateContent"))
        .and(body_partial_json(json!({
            "contents": [
                {"role": "user", "parts": [{"text": "primera"}]},
                {"role": "model", "parts": [{"text": "Hola mundo"}]},
                {"role": "user", "parts": [{"text": "segunda"}]}
            ]
        })))
        .respond_with(sse_response(SSE_BODY))
        .expect(1)
        .mount(&server)
        .await;

    app.send_turn("segunda", vec![], |_| {}).await.unwrap();
    assert_eq!(app.transcript().len(), 4);
}
