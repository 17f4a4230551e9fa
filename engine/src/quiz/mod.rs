//! Question generation and answer evaluation
//!
//! Thin glue between the session coordinator and the model backend. The
//! models themselves are black boxes; this module owns the prompt format,
//! the question post-processing, and the score and feedback rules.

pub mod evaluator;
pub mod generator;

pub use evaluator::{score_for, AnswerEvaluator, Evaluation, Feedback};
pub use generator::{Difficulty, QuestionGenerator};
