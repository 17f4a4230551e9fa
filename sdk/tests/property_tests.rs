use proptest::prelude::*;
use sdk::errors::{QuizError, QuizErrorExt};
use sdk::types::{ClientMessage, ServerMessage};

const CLIENT_MESSAGES: [&str; 12] = [
    "Invalid topic",
    "No subtopics available for this topic",
    "Invalid subtopic selected",
    "No content found for this subtopic",
    "Failed to read content for this subtopic",
    "Failed to generate a question",
    "Failed to evaluate the answer",
    "The request timed out",
    "No question has been asked yet",
    "No answer provided",
    "Unrecognized message",
    "Malformed message",
];

// Client messages come from a fixed set and never echo the cause.
proptest! {
    #[test]
    fn test_client_message_is_fixed(cause in "\\PC*") {
        let errs = vec![
            QuizError::UnknownTopic(cause.clone()),
            QuizError::NoSubtopics(cause.clone()),
            QuizError::UnknownSubtopic(cause.clone()),
            QuizError::Extraction(cause.clone()),
            QuizError::Generation(cause.clone()),
            QuizError::Evaluation(cause.clone()),
            QuizError::MalformedMessage(cause.clone()),
        ];

        for err in errs {
            let message = err.client_message();
            prop_assert!(CLIENT_MESSAGES.contains(&message));
        }
    }
}

// Arbitrary text never panics the parser; it either parses or yields a
// protocol error.
proptest! {
    #[test]
    fn test_parse_total(text in "\\PC*") {
        match ClientMessage::parse(&text) {
            Ok(_) => {}
            Err(QuizError::UnrecognizedMessage) | Err(QuizError::MalformedMessage(_)) => {}
            Err(other) => prop_assert!(false, "unexpected error: {:?}", other),
        }
    }
}

proptest! {
    #[test]
    fn test_topic_messages_parse(topic in "[A-Za-z0-9 ]{0,40}") {
        let text = serde_json::json!({ "topic": topic.clone() }).to_string();
        let parsed = ClientMessage::parse(&text).expect("topic message should parse");
        prop_assert_eq!(parsed, ClientMessage::Topic { topic });
    }

    #[test]
    fn test_evaluation_messages_serialize(score in 1u8..=10, feedback in "[a-z ]{1,30}") {
        let json = ServerMessage::Evaluation { score, feedback: feedback.clone() }.to_json();
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        prop_assert_eq!(value["type"].as_str(), Some("evaluation"));
        prop_assert_eq!(value["score"].as_u64(), Some(score as u64));
        prop_assert_eq!(value["feedback"].as_str(), Some(feedback.as_str()));
    }
}
