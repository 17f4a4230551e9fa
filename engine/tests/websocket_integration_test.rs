//! End-to-end tests for the quiz WebSocket server
//!
//! Each test starts the real server on an ephemeral port with the built-in
//! catalog, generated reference PDFs and a deterministic model backend.

mod common;

use common::{builtin_services, page_text, FakeBackend};
use futures::{SinkExt, StreamExt};
use quiz_engine::llm::ModelBackend;
use quiz_engine::server::{self, RunningServer};
use sdk::types::ServerMessage;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Harness {
    _dir: tempfile::TempDir,
    backend: Arc<FakeBackend>,
    server: RunningServer,
}

async fn start() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(FakeBackend::default());
    let services = builtin_services(dir.path(), Arc::clone(&backend) as Arc<dyn ModelBackend>);
    let server = server::start("127.0.0.1:0", services).await.unwrap();

    Harness {
        _dir: dir,
        backend,
        server,
    }
}

async fn connect(harness: &Harness) -> Client {
    let url = format!("ws://{}/ws", harness.server.addr);
    let (client, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    client
}

/// Send one text frame and wait for the single reply.
async fn turn(client: &mut Client, text: &str) -> ServerMessage {
    client.send(Message::Text(text.to_string())).await.unwrap();
    next_reply(client).await
}

async fn next_reply(client: &mut Client) -> ServerMessage {
    loop {
        match client.next().await.unwrap().unwrap() {
            Message::Text(reply) => return serde_json::from_str(&reply).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {:?}", other),
        }
    }
}

fn error(message: &str) -> ServerMessage {
    ServerMessage::Error {
        message: message.to_string(),
    }
}

#[tokio::test]
async fn test_full_quiz_round() {
    let harness = start().await;
    let mut client = connect(&harness).await;

    let reply = turn(&mut client, r#"{"topic": "AI"}"#).await;
    assert_eq!(
        reply,
        ServerMessage::Subtopics {
            subtopics: vec![
                "Overview of AI".to_string(),
                "Areas of Application of AI in our Daily Life".to_string(),
                "Application Program Interfaces (APIs)".to_string(),
            ]
        }
    );

    let reply = turn(
        &mut client,
        r#"{"subtopic": "Overview of AI", "level": "easy"}"#,
    )
    .await;
    assert_eq!(
        reply,
        ServerMessage::Question {
            question: "What is meant by Artificial intelligence lets machines?".to_string()
        }
    );

    let answer = serde_json::json!({ "answer": page_text("AI", 7) }).to_string();
    let reply = turn(&mut client, &answer).await;
    assert_eq!(
        reply,
        ServerMessage::Evaluation {
            score: 10,
            feedback: "Excellent! Your answer is highly relevant.".to_string()
        }
    );

    client.close(None).await.unwrap();
    harness.server.stop().await.unwrap();
}

#[tokio::test]
async fn test_partial_and_unrelated_answers() {
    let harness = start().await;
    let mut client = connect(&harness).await;

    turn(&mut client, r#"{"topic": "AI"}"#).await;
    turn(
        &mut client,
        r#"{"subtopic": "Overview of AI", "level": "hard"}"#,
    )
    .await;

    let reply = turn(
        &mut client,
        r#"{"answer": "Artificial intelligence lets machines"}"#,
    )
    .await;
    assert_eq!(
        reply,
        ServerMessage::Evaluation {
            score: 8,
            feedback: "Good job! Your answer is close. Elaborate more!".to_string()
        }
    );

    // The question stays pending, so the client may answer again
    let reply = turn(&mut client, r#"{"answer": "bananas"}"#).await;
    assert_eq!(
        reply,
        ServerMessage::Evaluation {
            score: 1,
            feedback: "Your answer doesn't align. Revise the concepts.".to_string()
        }
    );
}

#[tokio::test]
async fn test_errors_keep_the_session_open() {
    let harness = start().await;
    let mut client = connect(&harness).await;

    assert_eq!(
        turn(&mut client, r#"{"topic": "Chemistry"}"#).await,
        error("Invalid topic")
    );
    assert_eq!(
        turn(&mut client, r#"{"subtopic": "Overview of AI", "level": "easy"}"#).await,
        error("Invalid subtopic selected")
    );
    assert_eq!(
        turn(&mut client, r#"{"answer": "anything"}"#).await,
        error("No question has been asked yet")
    );
    assert_eq!(
        turn(&mut client, r#"{"colour": "blue"}"#).await,
        error("Unrecognized message")
    );
    assert_eq!(turn(&mut client, "not json").await, error("Malformed message"));

    turn(&mut client, r#"{"topic": "ML"}"#).await;
    assert_eq!(
        turn(&mut client, r#"{"subtopic": "Overview of AI", "level": "easy"}"#).await,
        error("Invalid subtopic selected")
    );

    // Still usable after every failure above
    let reply = turn(
        &mut client,
        r#"{"subtopic": "Understanding Data and Datasets", "level": "medium"}"#,
    )
    .await;
    assert_eq!(
        reply,
        ServerMessage::Question {
            question: "What is meant by A dataset is a?".to_string()
        }
    );
}

#[tokio::test]
async fn test_binary_frames() {
    let harness = start().await;
    let mut client = connect(&harness).await;

    client
        .send(Message::Binary(vec![0xff, 0xfe, 0x7b]))
        .await
        .unwrap();
    let reply = next_reply(&mut client).await;
    assert_eq!(reply, error("Malformed message"));

    // Valid UTF-8 in a binary frame is handled like text
    client
        .send(Message::Binary(br#"{"topic": "ML"}"#.to_vec()))
        .await
        .unwrap();
    let reply = next_reply(&mut client).await;
    assert!(matches!(reply, ServerMessage::Subtopics { .. }));
}

#[tokio::test]
async fn test_mistyped_topic_is_not_an_answer() {
    let harness = start().await;
    let mut client = connect(&harness).await;

    turn(&mut client, r#"{"topic": "AI"}"#).await;
    turn(&mut client, r#"{"subtopic": "Overview of AI", "level": "easy"}"#).await;

    assert_eq!(
        turn(&mut client, r#"{"topic": 5, "answer": "machines reason"}"#).await,
        error("Unrecognized message")
    );
}

#[tokio::test]
async fn test_generation_failure_is_reported() {
    let harness = start().await;
    let mut client = connect(&harness).await;

    turn(&mut client, r#"{"topic": "AI"}"#).await;
    harness.backend.set_failing(true);
    assert_eq!(
        turn(&mut client, r#"{"subtopic": "Overview of AI", "level": "easy"}"#).await,
        error("Failed to generate a question")
    );

    harness.backend.set_failing(false);
    let reply = turn(&mut client, r#"{"subtopic": "Overview of AI", "level": "easy"}"#).await;
    assert!(matches!(reply, ServerMessage::Question { .. }));
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let harness = start().await;
    let mut first = connect(&harness).await;
    let mut second = connect(&harness).await;

    turn(&mut first, r#"{"topic": "AI"}"#).await;
    turn(&mut first, r#"{"subtopic": "Overview of AI", "level": "easy"}"#).await;

    // The second connection sees none of the first one's state
    assert_eq!(
        turn(&mut second, r#"{"answer": "anything"}"#).await,
        error("No question has been asked yet")
    );
    assert_eq!(
        turn(&mut second, r#"{"subtopic": "Overview of AI", "level": "easy"}"#).await,
        error("Invalid subtopic selected")
    );

    // Closing one connection leaves the other running
    second.close(None).await.unwrap();
    let reply = turn(&mut first, r#"{"answer": "machines reason"}"#).await;
    assert!(matches!(reply, ServerMessage::Evaluation { .. }));
}

#[tokio::test]
async fn test_status_endpoint() {
    let harness = start().await;

    let body: serde_json::Value = reqwest::get(format!("http://{}/api/status", harness.server.addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "running");
    assert_eq!(body["topics"], serde_json::json!(["AI", "ML"]));
}

#[tokio::test]
async fn test_index_page_is_served() {
    let harness = start().await;

    let response = reqwest::get(format!("http://{}/", harness.server.addr))
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert!(response.text().await.unwrap().contains("AI/ML Quiz"));
}
