//! Answer evaluator
//!
//! Scores a free-text answer by the cosine similarity between its embedding
//! and the embedding of the context the question was generated from.

use sdk::errors::QuizError;
use std::sync::Arc;

use crate::llm::ModelBackend;

/// Categorical feedback derived from similarity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Excellent,
    Good,
    OnTrack,
    Misaligned,
}

impl Feedback {
    /// Thresholds are checked top-down, first match wins:
    /// `> 0.8`, `> 0.5`, `> 0.3`, otherwise misaligned.
    pub fn for_similarity(similarity: f64) -> Self {
        if similarity > 0.8 {
            Self::Excellent
        } else if similarity > 0.5 {
            Self::Good
        } else if similarity > 0.3 {
            Self::OnTrack
        } else {
            Self::Misaligned
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent! Your answer is highly relevant.",
            Self::Good => "Good job! Your answer is close. Elaborate more!",
            Self::OnTrack => "You're on the right track. Revisit key points.",
            Self::Misaligned => "Your answer doesn't align. Revise the concepts.",
        }
    }

    /// All feedback categories, best first.
    pub fn all() -> [Feedback; 4] {
        [Self::Excellent, Self::Good, Self::OnTrack, Self::Misaligned]
    }
}

/// Integer score in `1..=10` for a similarity.
///
/// `similarity * 10` rounded half to even, then clamped. The floor is 1, so
/// zero and negative similarities still score 1.
pub fn score_for(similarity: f64) -> u8 {
    let rounded = (similarity * 10.0).round_ties_even();
    // NaN casts to 0 and lands on the floor
    (rounded as i64).clamp(1, 10) as u8
}

/// Cosine similarity of two vectors, in `[-1, 1]`.
///
/// `None` for vectors of different length or with zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    Some((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

/// Result of scoring one answer
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub similarity: f64,
    pub score: u8,
    pub feedback: Feedback,
}

impl Evaluation {
    pub fn from_similarity(similarity: f64) -> Self {
        Self {
            similarity,
            score: score_for(similarity),
            feedback: Feedback::for_similarity(similarity),
        }
    }
}

/// Scores answers against their reference context
pub struct AnswerEvaluator {
    backend: Arc<dyn ModelBackend>,
}

impl AnswerEvaluator {
    pub fn new(backend: Arc<dyn ModelBackend>) -> Self {
        Self { backend }
    }

    /// Similarity between `context` and `answer` plus the derived score.
    ///
    /// # Errors
    ///
    /// `QuizError::Evaluation` if either embedding call fails or the
    /// embeddings cannot be compared.
    pub async fn evaluate(&self, context: &str, answer: &str) -> Result<Evaluation, QuizError> {
        let (answer_embedding, context_embedding) =
            tokio::try_join!(self.backend.embed(answer), self.backend.embed(context))
                .map_err(|e| QuizError::Evaluation(e.to_string()))?;

        let similarity = cosine_similarity(&answer_embedding, &context_embedding).ok_or_else(|| {
            QuizError::Evaluation(format!(
                "embeddings not comparable (lengths {} and {})",
                answer_embedding.len(),
                context_embedding.len()
            ))
        })?;

        let evaluation = Evaluation::from_similarity(similarity);
        tracing::debug!(
            similarity = evaluation.similarity,
            score = evaluation.score,
            "Answer evaluated"
        );

        Ok(evaluation)
    }
}
