use anyhow::{Context, Result};
use axum::{
    extract::{
        multipart::MultipartError,
        ws::{Message, WebSocket, WebSocketUpgrade},
        DefaultBodyLimit, Multipart, Request, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    serve, Json, Router,
};
use futures::{future, sink::SinkExt, stream::StreamExt, Sink};
use minijinja::{path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, path::PathBuf, sync::Arc, time::Duration};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::WebSettings;
use crate::constants::UPLOAD_BODY_LIMIT;
use crate::streaming::stream_words;
use crate::turn::{ChatSession, TurnProcessor};

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

/// Messages sent by the browser.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    Query { text: String },
}

/// Messages sent to the browser over the chat socket.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Info { message: String },
    /// One streamed word of the assistant reply.
    Token { text: String },
    /// The reply is complete; `content` is what was recorded in the transcript.
    Done { content: String },
    Error { message: String },
}

// Shared application state
#[derive(Clone)]
pub struct AppState {
    templates: Arc<AutoReloader>,
    processor: Arc<TurnProcessor>,
    stream_delay: Duration,
}

impl AppState {
    pub fn new(processor: Arc<TurnProcessor>, stream_delay: Duration, template_dir: Option<PathBuf>) -> Self {
        Self {
            templates: Arc::new(create_minijinja_env(template_dir)),
            processor,
            stream_delay,
        }
    }
}

// Templates come from the binary unless a directory is given, in which case
// they are loaded from disk and reloaded when they change.
fn create_minijinja_env(template_dir: Option<PathBuf>) -> AutoReloader {
    AutoReloader::new(move |notifier| {
        let mut env = Environment::new();
        match &template_dir {
            Some(dir) => {
                env.set_loader(path_loader(dir.clone()));
                notifier.watch_path(dir, true);
            }
            None => env.add_template("index.html", INDEX_TEMPLATE)?,
        }
        Ok(env)
    })
}

async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, (StatusCode, Html<String>)> {
    state
        .templates
        .acquire_env()
        .and_then(|env| {
            env.get_template("index.html").and_then(|tmpl| {
                tmpl.render(minijinja::context! {
                    title => "Zestofy Valuation Bot",
                    hint => "Start by typing a message",
                    placeholder => "Write your message...",
                    upload_label => "Upload any relevant document",
                })
            })
        })
        .map(Html)
        .map_err(|e| {
            error!("Failed to get or render template: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Html(format!("Internal Server Error: {}", e)))
        })
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    info!("WebSocket connection upgrade requested");
    ws.on_upgrade(move |socket| {
        let session_id = Uuid::new_v4();
        handle_socket(socket, state).instrument(info_span!("chat_session", %session_id))
    })
}

// Every connection is its own chat session with its own transcript. Input is
// read only between turns, so a session never runs two turns at once.
async fn handle_socket(socket: WebSocket, state: AppState) {
    info!("New chat session");
    let mut session = ChatSession::new(state.processor.clone());
    let (sender, mut receiver) = socket.split();
    let mut events = sender.with(|event: ServerEvent| {
        future::ready(
            serde_json::to_string(&event)
                .map(Message::Text)
                .map_err(axum::Error::new),
        )
    });

    let welcome = ServerEvent::Info { message: "Connected to Zestofy".to_string() };
    if events.send(welcome).await.is_err() {
        warn!("Failed to send welcome message to new WebSocket client");
        return;
    }

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(ClientEvent::Query { text }) => {
                    if let Err(e) = run_turn(&mut session, &text, state.stream_delay, &mut events).await {
                        warn!("WebSocket client disconnected mid-turn: {}", e);
                        break;
                    }
                }
                Err(e) => {
                    warn!("Unreadable client message: {}", e);
                    let reply = ServerEvent::Error { message: format!("Unreadable message: {}", e) };
                    if events.send(reply).await.is_err() {
                        break;
                    }
                }
            },
            Ok(Message::Binary(_)) => warn!("Received unexpected binary message from client"),
            Ok(Message::Close(_)) => {
                info!("Client requested WebSocket close");
                break;
            }
            // Axum answers pings itself
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }
    info!(messages = session.transcript().len(), "Chat session closed");
}

/// Runs one turn of `session` and reports it to `sink`: the reply word by
/// word, then `Done`, or a single `Error`. Only sink failures are returned.
pub async fn run_turn<S>(session: &mut ChatSession, query: &str, delay: Duration, sink: &mut S) -> Result<(), S::Error>
where
    S: Sink<ServerEvent> + Unpin,
{
    if query.trim().is_empty() {
        return sink
            .send(ServerEvent::Error { message: "Message must not be empty".to_string() })
            .await;
    }

    match session.submit(query).await {
        Ok(reply) => {
            let mut words = Box::pin(stream_words(&reply, delay));
            while let Some(text) = words.next().await {
                sink.send(ServerEvent::Token { text }).await?;
            }
            sink.send(ServerEvent::Done { content: reply }).await
        }
        Err(e) => {
            error!("Turn failed: {}", e);
            sink.send(ServerEvent::Error { message: e.to_string() }).await
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct UploadReport {
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
}

// PDFs are accepted and dropped; nothing reads them.
async fn upload_handler(mut multipart: Multipart) -> Result<Json<UploadReport>, MultipartError> {
    let mut report = UploadReport::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field
            .file_name()
            .or_else(|| field.name())
            .unwrap_or("unnamed")
            .to_string();
        let is_pdf = field.content_type() == Some("application/pdf") || name.to_ascii_lowercase().ends_with(".pdf");
        let size = field.bytes().await?.len();

        if is_pdf {
            info!(file = %name, size, "Accepted upload");
            report.accepted.push(name);
        } else {
            warn!(file = %name, "Rejected non-PDF upload");
            report.rejected.push(name);
        }
    }
    Ok(Json(report))
}

async fn health_handler() -> &'static str {
    "ok"
}

pub fn build_router(state: AppState, static_dir: PathBuf) -> Router {
    let static_files_service = ServeDir::new(static_dir).not_found_service(tower::service_fn(|_req: Request| async {
        Ok::<_, Infallible>((StatusCode::NOT_FOUND, "Not Found").into_response())
    }));

    Router::new()
        .route("/", get(index_handler))
        .route("/ws", get(ws_handler))
        .route("/upload", post(upload_handler).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)))
        .route("/health", get(health_handler))
        .nest_service("/static", static_files_service)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn start_web_server(web: WebSettings, processor: Arc<TurnProcessor>, stream_delay: Duration) -> Result<()> {
    let state = AppState::new(processor, stream_delay, web.template_dir.clone());
    let app = build_router(state, web.static_dir.clone());

    let listener = tokio::net::TcpListener::bind((web.host.as_str(), web.port))
        .await
        .context(format!("Failed to bind to {}:{}", web.host, web.port))?;
    info!("Web server listening on http://{}", listener.local_addr()?);

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
