use std::collections::HashMap;

use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Canonical state keys. Each stage owns writing its own keys; keys
/// accumulate monotonically across a run and are never removed.
pub struct StateKey;

impl StateKey {
    pub const TOPIC: &'static str = "topic";
    pub const PLAN: &'static str = "plan";
    pub const ARTICLES: &'static str = "articles";
    pub const ARTICLE_CONTENTS: &'static str = "article_contents";
    pub const CSV_PATH: &'static str = "csv_path";
    pub const URL_TO_FILEPATH: &'static str = "url_to_filepath";
    pub const ABSTRACTS: &'static str = "abstracts";
    pub const FINAL_CSV_PATH: &'static str = "final_csv_path";
    pub const REPORT: &'static str = "report";
    pub const LATEX_REPORT: &'static str = "latex_report";
    pub const REPORT_PATH: &'static str = "report_path";
}

/// The state accumulator threaded through the pipeline. Owned by the driver
/// and passed by reference into stages; worker tasks never see it. Readers
/// must tolerate missing optional keys via `get_or_default`.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    data: HashMap<String, Value>,
}

impl PipelineState {
    /// Create a state holding only the seed topic.
    pub fn seeded(topic: &str) -> Self {
        let mut state = Self::default();
        state.data.insert(
            StateKey::TOPIC.to_string(),
            Value::String(topic.to_string()),
        );
        state
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Missing or unparsable keys substitute the type's default instead of
    /// failing, so later stages survive earlier stages producing nothing.
    pub fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.get(key).unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.data.keys().map(String::as_str).collect()
    }

    /// Key-wise overwrite merge of a stage's partial update. Untouched keys
    /// are preserved.
    pub fn merge(&mut self, update: StageUpdate) {
        self.data.extend(update.entries);
    }
}

/// Partial-state update produced by one stage.
#[derive(Debug, Default)]
pub struct StageUpdate {
    entries: HashMap<String, Value>,
}

impl StageUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        self.entries
            .insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
