//! Content catalog
//!
//! Static mapping of topic → ordered (subtopic → page number). Built once at
//! startup and shared read-only between sessions behind an `Arc`.
//!
//! Topics and subtopics keep their definition order; every listing the
//! catalog hands out follows it.

use sdk::errors::QuizError;

/// Built-in topics: (topic, [(subtopic, 1-based page)]).
const BUILTIN: &[(&str, &[(&str, u32)])] = &[
    (
        "AI",
        &[
            ("Overview of AI", 7),
            ("Areas of Application of AI in our Daily Life", 16),
            ("Application Program Interfaces (APIs)", 24),
        ],
    ),
    (
        "ML",
        &[
            ("Machine Learning – The foundation of Artificial Intelligence", 6),
            ("Understanding Data and Datasets", 10),
            ("Machine Learning and CHATBOTs", 29),
        ],
    ),
];

/// A subtopic bound to a page of its topic's reference document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtopic {
    pub name: String,
    pub page: u32,
}

/// A topic and its subtopics in definition order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub name: String,
    pub subtopics: Vec<Subtopic>,
}

impl Topic {
    /// Highest page referenced by any subtopic, if there are any.
    pub fn max_page(&self) -> Option<u32> {
        self.subtopics.iter().map(|s| s.page).max()
    }
}

/// Immutable topic catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    topics: Vec<Topic>,
}

impl Catalog {
    /// The compiled-in catalog.
    pub fn builtin() -> Self {
        Self::from_entries(BUILTIN.iter().map(|(topic, subtopics)| {
            (
                topic.to_string(),
                subtopics
                    .iter()
                    .map(|(name, page)| (name.to_string(), *page))
                    .collect::<Vec<_>>(),
            )
        }))
    }

    /// Build a catalog from (topic, [(subtopic, page)]) entries.
    ///
    /// A topic listed twice keeps its first position; its subtopics are
    /// appended. A repeated subtopic keeps its first page.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<(String, u32)>)>,
    {
        let mut topics: Vec<Topic> = Vec::new();

        for (name, subtopics) in entries {
            let idx = match topics.iter().position(|t| t.name == name) {
                Some(idx) => idx,
                None => {
                    topics.push(Topic {
                        name,
                        subtopics: Vec::new(),
                    });
                    topics.len() - 1
                }
            };

            let topic = &mut topics[idx];
            for (sub, page) in subtopics {
                if !topic.subtopics.iter().any(|s| s.name == sub) {
                    topic.subtopics.push(Subtopic { name: sub, page });
                }
            }
        }

        Self { topics }
    }

    /// All topics in catalog order.
    pub fn topics(&self) -> impl Iterator<Item = &Topic> {
        self.topics.iter()
    }

    /// Look up a topic by exact name.
    pub fn topic(&self, name: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.name == name)
    }

    /// Whether the catalog knows this topic.
    pub fn contains(&self, topic: &str) -> bool {
        self.topic(topic).is_some()
    }

    /// Subtopic names of `topic`, in catalog order.
    ///
    /// The list may be empty for a topic defined without subtopics; callers
    /// decide how to report that.
    pub fn subtopics(&self, topic: &str) -> Result<Vec<&str>, QuizError> {
        let topic = self
            .topic(topic)
            .ok_or_else(|| QuizError::UnknownTopic(topic.to_string()))?;

        Ok(topic.subtopics.iter().map(|s| s.name.as_str()).collect())
    }

    /// Page number of `subtopic` under `topic`.
    pub fn page_for(&self, topic: &str, subtopic: &str) -> Result<u32, QuizError> {
        self.topic(topic)
            .and_then(|t| t.subtopics.iter().find(|s| s.name == subtopic))
            .map(|s| s.page)
            .ok_or_else(|| QuizError::UnknownSubtopic(subtopic.to_string()))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
