use serde::{Deserialize, Serialize};

/// One raw hit returned by the search backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub href: String,
    pub snippet: String,
}

/// A discovered article. Created by the search stage, enriched in place by
/// every later stage. Records are never deleted once created; a processing
/// failure is recorded in `error` instead.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArticleRecord {
    pub title: String,
    /// Unique key within a run.
    pub url: String,
    pub snippet: String,
    pub source: String,
    /// The search query that surfaced this record.
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    /// Path to the downloaded PDF, column name `local_pdf_path` in the CSVs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Rendered text of an article page as returned by `html_extract`.
/// A fetch failure yields empty content plus the `error` marker, never an Err.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArticleContent {
    pub title: String,
    pub url: String,
    pub content: String,
    pub content_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ArticleContent {
    pub fn failed(url: &str, error: impl ToString) -> Self {
        Self {
            url: url.to_string(),
            error: Some(error.to_string()),
            ..Default::default()
        }
    }
}

/// Fan-in unit of the summarization stage: exactly one per submitted file
/// path, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbstractResult {
    pub file_path: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AbstractResult {
    pub fn failed(file_path: &str, error: impl ToString) -> Self {
        let error = error.to_string();
        Self {
            file_path: file_path.to_string(),
            title: String::new(),
            abstract_text: format!("Error processing article: {error}"),
            error: Some(error),
        }
    }
}
