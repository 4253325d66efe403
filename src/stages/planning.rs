use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::pipeline::{PipelineContext, PipelineState, Stage, StageUpdate, StateKey};
use crate::types::ResearchPlan;

const SYSTEM_PROMPT: &str =
    "You are a research planning assistant. You design precise, comprehensive literature search plans.";

/// Generates the research plan for the seed topic. Model output that fails
/// to parse falls back to a minimal synthetic plan; this stage never aborts
/// the pipeline over a malformed response.
pub struct PlanningStage;

#[async_trait]
impl Stage for PlanningStage {
    fn name(&self) -> &'static str {
        "planning"
    }

    async fn run(&self, context: &PipelineContext, state: &PipelineState) -> Result<StageUpdate> {
        let topic: String = state.get_or_default(StateKey::TOPIC);
        println!("🎯 Generating research plan for topic: {}", topic);

        let prompt = build_prompt(&topic);
        let plan = match context.language_model.invoke(SYSTEM_PROMPT, &prompt).await {
            Ok(response) => parse_plan(&topic, &response),
            Err(e) => {
                eprintln!("⚠️ Error generating plan, using fallback: {}", e);
                ResearchPlan::fallback(&topic)
            }
        };

        println!(
            "✅ Plan ready: {} subtopics, {} search queries",
            plan.subtopics.len(),
            plan.search_queries.len()
        );
        if context.config.verbose {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }

        let mut update = StageUpdate::new();
        update.set(StateKey::PLAN, plan)?;
        Ok(update)
    }
}

fn build_prompt(topic: &str) -> String {
    format!(
        r#"I need to research the topic described by these keywords: '{topic}'.

Please provide:
1. A clear breakdown of subtopics to explore
2. At least 5 specific search queries that would help gather comprehensive information
3. A short description of the expected outcome of this research

Format your response as a JSON with the following structure:
{{
    "subtopics": ["subtopic1", "subtopic2", ...],
    "search_queries": ["query1", "query2", ...],
    "expected_outcome": "description of expected outcome",
    "research_strategy": "brief description of research strategy"
}}"#
    )
}

#[derive(Deserialize)]
struct PlanDocument {
    #[serde(default)]
    subtopics: Vec<String>,
    #[serde(default)]
    search_queries: Vec<String>,
    #[serde(default)]
    expected_outcome: String,
    #[serde(default, alias = "strategy")]
    research_strategy: String,
}

/// Defensively parse the model's free-text response. Code fences and
/// surrounding prose are tolerated; anything unparsable, or a parsed plan
/// without a single search query, falls back to the synthetic plan.
pub fn parse_plan(topic: &str, response: &str) -> ResearchPlan {
    let Some(json) = extract_json_object(response) else {
        return ResearchPlan::fallback(topic);
    };

    match serde_json::from_str::<PlanDocument>(json) {
        Ok(doc) if !doc.search_queries.is_empty() => ResearchPlan {
            topic: topic.to_string(),
            subtopics: if doc.subtopics.is_empty() {
                vec![format!("General {topic}")]
            } else {
                doc.subtopics
            },
            search_queries: doc.search_queries,
            expected_outcome: doc.expected_outcome,
            strategy: doc.research_strategy,
        },
        _ => ResearchPlan::fallback(topic),
    }
}

/// Slice out the outermost JSON object from a response that may wrap it in
/// markdown fences or explanation text.
fn extract_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end > start).then(|| &response[start..=end])
}
