//! Document collection and relevance judgments.
//!
//! The collection is a JSON array of documents. Each document belongs to one search
//! task (topic) and carries a binary relevance judgment for that task:
//!
//! ```json
//! [{"title": "...", "abstract_text": "...", "search_task_number": 5, "relevant": true}]
//! ```

use crate::Error;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One document of the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Document title.
    #[serde(default)]
    pub title: Option<String>,
    /// Abstract / body text.
    #[serde(default, alias = "abstract")]
    pub abstract_text: Option<String>,
    /// Search task the relevance judgment refers to.
    #[serde(alias = "task")]
    pub search_task_number: u32,
    /// Whether the document is relevant to its search task.
    #[serde(default)]
    pub relevant: bool,
}

impl Document {
    /// Build a fully populated document.
    pub fn new(
        title: impl Into<String>,
        abstract_text: impl Into<String>,
        search_task_number: u32,
        relevant: bool,
    ) -> Self {
        Self {
            title: Some(title.into()),
            abstract_text: Some(abstract_text.into()),
            search_task_number,
            relevant,
        }
    }
}

/// Parse a JSON document collection.
pub fn parse_collection(json: &str) -> Result<Vec<Document>, Error> {
    Ok(serde_json::from_str(json)?)
}

/// Load a JSON document collection from disk.
pub fn load_collection(path: impl AsRef<Path>) -> Result<Vec<Document>, Error> {
    let text = std::fs::read_to_string(path)?;
    parse_collection(&text)
}

/// Relevance judgments for one topic, addressed by document id (collection order).
///
/// Only documents of the target topic can be relevant; every other document is
/// judged non-relevant even if it is relevant to its own task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Judgments {
    topic: u32,
    relevant: Vec<bool>,
}

impl Judgments {
    /// Judge `documents` against `topic`.
    pub fn for_topic(documents: &[Document], topic: u32) -> Self {
        let relevant = documents
            .iter()
            .map(|d| d.relevant && d.search_task_number == topic)
            .collect();
        Self { topic, relevant }
    }

    /// Topic these judgments refer to.
    pub fn topic(&self) -> u32 {
        self.topic
    }

    /// Whether document `doc_id` is relevant (unknown ids are not).
    pub fn is_relevant(&self, doc_id: u32) -> bool {
        self.relevant.get(doc_id as usize).copied().unwrap_or(false)
    }

    /// Number of relevant documents for the topic.
    pub fn relevant_count(&self) -> usize {
        self.relevant.iter().filter(|&&r| r).count()
    }
}
