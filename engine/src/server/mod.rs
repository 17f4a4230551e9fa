//! Quiz server
//!
//! HTTP and WebSocket front end for the session coordinator.
//!
//! # Endpoints
//!
//! - GET /ws - WebSocket, one quiz session per connection
//! - GET /api/status - Server status and topic list
//! - GET / - Static page for manual testing

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use sdk::errors::{EngineError, QuizError};
use sdk::types::ServerMessage;
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tracing::Instrument;

use crate::session::{QuizServices, Session};

/// Server state shared across handlers
#[derive(Clone)]
struct ServerState {
    services: Arc<QuizServices>,
}

/// Handle to a server running in the background
pub struct RunningServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), EngineError>>,
}

impl RunningServer {
    /// Signal graceful shutdown and wait for the server task to finish.
    pub async fn stop(mut self) -> Result<(), EngineError> {
        if let Some(tx) = self.shutdown_tx.take() {
            tx.send(()).ok();
        }
        self.task
            .await
            .map_err(|e| EngineError::Server(format!("Server task failed: {}", e)))?
    }
}

/// Build the router with WebSocket and HTTP endpoints
pub fn router(services: Arc<QuizServices>) -> Router {
    let state = ServerState { services };

    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/api/status", get(status_handler))
        .route("/", get(index_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve<F>(
    addr: &str,
    services: Arc<QuizServices>,
    shutdown: F,
) -> Result<(), EngineError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| EngineError::Server(format!("Failed to bind to {}: {}", addr, e)))?;

    serve_on(listener, services, shutdown).await
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve_on<F>(
    listener: TcpListener,
    services: Arc<QuizServices>,
    shutdown: F,
) -> Result<(), EngineError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .map_err(|e| EngineError::Server(format!("Failed to get local address: {}", e)))?;

    tracing::info!("Quiz server listening on http://{}", addr);

    axum::serve(listener, router(services))
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("Quiz server shutting down gracefully");
        })
        .await
        .map_err(|e| EngineError::Server(format!("Server error: {}", e)))
}

/// Start the server in a background task.
///
/// Binding to port 0 picks a free port; the chosen address is returned.
pub async fn start(addr: &str, services: Arc<QuizServices>) -> Result<RunningServer, EngineError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| EngineError::Server(format!("Failed to bind to {}: {}", addr, e)))?;

    let local = listener
        .local_addr()
        .map_err(|e| EngineError::Server(format!("Failed to get local address: {}", e)))?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(serve_on(listener, services, async move {
        shutdown_rx.await.ok();
    }));

    Ok(RunningServer {
        addr: local,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

/// WebSocket handler
async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<ServerState>) -> Response {
    let span = tracing::info_span!("session", id = %uuid::Uuid::new_v4());
    ws.on_upgrade(move |socket| handle_websocket(socket, state).instrument(span))
}

/// Run one quiz session until the client disconnects
async fn handle_websocket(mut socket: WebSocket, state: ServerState) {
    tracing::info!("Client connected");

    let mut session = Session::new(state.services);

    while let Some(msg) = socket.recv().await {
        let reply = match msg {
            Ok(Message::Text(text)) => {
                tracing::debug!("Received WebSocket message: {}", text);
                session.handle_text(&text).await
            }
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => session.handle_text(&text).await,
                Err(e) => ServerMessage::error(&QuizError::MalformedMessage(e.to_string())),
            },
            Ok(Message::Close(_)) => {
                tracing::debug!("WebSocket connection closed by client");
                break;
            }
            // Ping/pong are answered by the protocol layer
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!("WebSocket error: {}", e);
                break;
            }
        };

        if socket.send(Message::Text(reply.to_json())).await.is_err() {
            tracing::debug!("Client went away before the reply was sent");
            break;
        }
    }

    tracing::info!("Client disconnected");
}

/// Server status API endpoint
async fn status_handler(State(state): State<ServerState>) -> Json<serde_json::Value> {
    let topics: Vec<&str> = state
        .services
        .catalog()
        .topics()
        .map(|t| t.name.as_str())
        .collect();

    Json(json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "topics": topics,
    }))
}

/// Static page for trying the quiz from a browser
async fn index_handler() -> Response {
    Html(INDEX_HTML).into_response()
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>AI/ML Quiz</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            max-width: 720px;
            margin: 40px auto;
            padding: 20px;
        }
        .hidden { display: none; }
        .error { color: #b00020; }
    </style>
</head>
<body>
    <h1>AI/ML Quiz</h1>

    <label for="topic">Topic:</label>
    <select id="topic" onchange="selectTopic()">
        <option value="">-- Select Topic --</option>
        <option value="AI">Artificial Intelligence</option>
        <option value="ML">Machine Learning</option>
    </select>

    <div id="subtopic-container"></div>

    <label for="level">Level:</label>
    <select id="level">
        <option value="easy">Easy</option>
        <option value="medium">Medium</option>
        <option value="hard">Hard</option>
    </select>

    <button id="ask" class="hidden" onclick="askQuestion()">Get Question</button>

    <h2 id="question">Select a topic to start.</h2>

    <div id="answer-container" class="hidden">
        <input id="answer" placeholder="Enter your answer">
        <button onclick="submitAnswer()">Submit Answer</button>
    </div>

    <h3 id="feedback"></h3>
    <h3 id="score"></h3>
    <p id="error" class="error"></p>

    <script>
        const ws = new WebSocket(`ws://${location.host}/ws`);
        const $ = (id) => document.getElementById(id);

        ws.onmessage = (event) => {
            const data = JSON.parse(event.data);
            $("error").innerText = "";
            if (data.type === "subtopics") {
                const select = document.createElement("select");
                select.id = "subtopic";
                data.subtopics.forEach((name) => select.add(new Option(name, name)));
                $("subtopic-container").replaceChildren(select);
                $("ask").classList.remove("hidden");
            } else if (data.type === "question") {
                $("question").innerText = data.question;
                $("answer-container").classList.remove("hidden");
                $("feedback").innerText = "";
                $("score").innerText = "";
            } else if (data.type === "evaluation") {
                $("feedback").innerText = `Feedback: ${data.feedback}`;
                $("score").innerText = `Score: ${data.score}/10`;
            } else if (data.type === "error") {
                $("error").innerText = data.message;
            }
        };

        function selectTopic() {
            const topic = $("topic").value;
            if (!topic) return;
            ws.send(JSON.stringify({ topic }));
            $("subtopic-container").innerText = "Loading subtopics...";
            $("ask").classList.add("hidden");
        }

        function askQuestion() {
            ws.send(JSON.stringify({ subtopic: $("subtopic").value, level: $("level").value }));
            $("question").innerText = "Waiting for the question...";
            $("answer-container").classList.add("hidden");
        }

        function submitAnswer() {
            ws.send(JSON.stringify({ answer: $("answer").value }));
        }
    </script>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_page_uses_protocol_shapes() {
        assert!(INDEX_HTML.contains("<html"));
        assert!(INDEX_HTML.contains("JSON.stringify({ topic })"));
        assert!(INDEX_HTML.contains("data.type === \"evaluation\""));
    }
}
