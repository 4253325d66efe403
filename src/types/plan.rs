use serde::{Deserialize, Serialize};

/// Research plan produced once per run by the planning stage, read-only afterward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResearchPlan {
    pub topic: String,
    pub subtopics: Vec<String>,
    pub search_queries: Vec<String>,
    pub expected_outcome: String,
    #[serde(alias = "research_strategy")]
    pub strategy: String,
}

impl ResearchPlan {
    /// Minimal synthetic plan used when the model output cannot be parsed.
    pub fn fallback(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            subtopics: vec![format!("General {topic}")],
            search_queries: vec![topic.to_string(), format!("latest research {topic}")],
            expected_outcome: format!("General overview of {topic}"),
            strategy: "General search on the topic".to_string(),
        }
    }
}
