use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestServer, TestServerConfig, TestWebSocket};
use serde_json::json;
use tempfile::TempDir;

use zestofy::prompt::RenderedPrompt;
use zestofy::web_server::{build_router, AppState, ServerEvent, UploadReport};
use zestofy::{InferenceClient, InferenceError, Settings, TurnProcessor};

struct StubClient;

#[async_trait]
impl InferenceClient for StubClient {
    async fn complete(&self, _prompt: &RenderedPrompt) -> Result<String, InferenceError> {
        Ok("Focus on ROI.".to_string())
    }
}

/// Records the user part of every prompt it is sent.
#[derive(Default)]
struct RecordingClient {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl InferenceClient for RecordingClient {
    async fn complete(&self, prompt: &RenderedPrompt) -> Result<String, InferenceError> {
        self.prompts.lock().unwrap().push(prompt.user.clone());
        Ok("Answer: Focus on ROI.".to_string())
    }
}

fn server(template_dir: Option<PathBuf>, static_dir: PathBuf) -> TestServer {
    let processor = Arc::new(TurnProcessor::new(Arc::new(StubClient), &Settings::with_api_key("k")));
    let state = AppState::new(processor, Duration::ZERO, template_dir);
    TestServer::new(build_router(state, static_dir)).unwrap()
}

#[tokio::test]
async fn test_index_renders_chat_page() {
    let static_dir = TempDir::new().unwrap();
    let server = server(None, static_dir.path().to_path_buf());

    let response = server.get("/").await;

    response.assert_status_ok();
    let page = response.text();
    assert!(page.contains("<title>Zestofy Valuation Bot</title>"));
    assert!(page.contains("Start by typing a message"));
    assert!(page.contains(r#"placeholder="Write your message...""#));
    assert!(page.contains("Upload any relevant document"));
}

#[tokio::test]
async fn test_index_uses_template_dir_override() {
    let template_dir = TempDir::new().unwrap();
    std::fs::write(template_dir.path().join("index.html"), "<h1>{{ title }}</h1>").unwrap();
    let static_dir = TempDir::new().unwrap();
    let server = server(Some(template_dir.path().to_path_buf()), static_dir.path().to_path_buf());

    let response = server.get("/").await;

    response.assert_status_ok();
    assert_eq!(response.text(), "<h1>Zestofy Valuation Bot</h1>");
}

#[tokio::test]
async fn test_index_reports_missing_template() {
    let template_dir = TempDir::new().unwrap();
    let static_dir = TempDir::new().unwrap();
    let server = server(Some(template_dir.path().to_path_buf()), static_dir.path().to_path_buf());

    let response = server.get("/").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.text().starts_with("Internal Server Error"));
}

#[tokio::test]
async fn test_static_files_and_fallback() {
    let static_dir = TempDir::new().unwrap();
    std::fs::write(static_dir.path().join("style.css"), "body { margin: 0; }").unwrap();
    let server = server(None, static_dir.path().to_path_buf());

    let css = server.get("/static/style.css").await;
    css.assert_status_ok();
    assert_eq!(css.text(), "body { margin: 0; }");

    let missing = server.get("/static/missing.js").await;
    missing.assert_status_not_found();
    assert_eq!(missing.text(), "Not Found");
}

#[tokio::test]
async fn test_upload_accepts_pdfs_only() {
    let static_dir = TempDir::new().unwrap();
    let server = server(None, static_dir.path().to_path_buf());

    let form = MultipartForm::new()
        .add_part(
            "files",
            Part::bytes(b"%PDF-1.4 plan".to_vec()).file_name("plan.pdf").mime_type("application/pdf"),
        )
        .add_part(
            "files",
            Part::bytes(b"%PDF-1.7 deck".to_vec()).file_name("DECK.PDF").mime_type("application/octet-stream"),
        )
        .add_part("files", Part::bytes(b"hello".to_vec()).file_name("notes.txt").mime_type("text/plain"));

    let response = server.post("/upload").multipart(form).await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<UploadReport>(),
        UploadReport {
            accepted: vec!["plan.pdf".to_string(), "DECK.PDF".to_string()],
            rejected: vec!["notes.txt".to_string()],
        }
    );
}

#[tokio::test]
async fn test_health() {
    let static_dir = TempDir::new().unwrap();
    let server = server(None, static_dir.path().to_path_buf());

    let response = server.get("/health").await;

    response.assert_status_ok();
    assert_eq!(response.text(), "ok");
}

async fn receive_reply(socket: &mut TestWebSocket) -> (Vec<String>, String) {
    let mut tokens = Vec::new();
    loop {
        match socket.receive_json::<ServerEvent>().await {
            ServerEvent::Token { text } => tokens.push(text),
            ServerEvent::Done { content } => return (tokens, content),
            other => panic!("unexpected event mid-turn: {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_chat_sockets_keep_separate_transcripts() {
    let client = Arc::new(RecordingClient::default());
    let processor = Arc::new(TurnProcessor::new(client.clone(), &Settings::with_api_key("k")));
    let static_dir = TempDir::new().unwrap();
    let state = AppState::new(processor, Duration::ZERO, None);
    let server = TestServerConfig::builder()
        .http_transport()
        .build_server(build_router(state, static_dir.path().to_path_buf()))
        .unwrap();

    let mut first = server.get_websocket("/ws").await.into_websocket().await;
    let mut second = server.get_websocket("/ws").await.into_websocket().await;
    for socket in [&mut first, &mut second] {
        assert_eq!(
            socket.receive_json::<ServerEvent>().await,
            ServerEvent::Info { message: "Connected to Zestofy".to_string() }
        );
    }

    first.send_json(&json!({ "type": "query", "text": "budget?" })).await;
    let (tokens, content) = receive_reply(&mut first).await;
    assert_eq!(tokens, vec!["Zestofy: ", "\t ", "Focus ", "on ", "ROI. "]);
    assert_eq!(content, "Zestofy: \t Focus on ROI.");

    second.send_text("not json").await;
    assert!(matches!(
        second.receive_json::<ServerEvent>().await,
        ServerEvent::Error { message } if message.starts_with("Unreadable message")
    ));

    second.send_json(&json!({ "type": "query", "text": "SEO?" })).await;
    let (_, content) = receive_reply(&mut second).await;
    assert_eq!(content, "Zestofy: \t Focus on ROI.");

    let prompts = client.prompts.lock().unwrap().clone();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].starts_with(r#"History: [{"role":"user","content":"SEO?"}]"#));
    assert!(!prompts[1].contains("budget?"));
}
