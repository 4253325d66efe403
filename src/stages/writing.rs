use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::pipeline::{PipelineContext, PipelineState, Stage, StageUpdate, StateKey};
use crate::types::ResearchPlan;

const SYSTEM_PROMPT: &str =
    "You are an academic writing assistant. You write complete, well-structured LaTeX documents.";

const REPORT_FILENAME: &str = "academic_report.tex";

/// Terminal stage: turns the plan and the final CSV into a long-form LaTeX
/// report and persists it. Appended to the pipeline unless skipped by
/// configuration.
pub struct WritingStage;

#[async_trait]
impl Stage for WritingStage {
    fn name(&self) -> &'static str {
        "writing"
    }

    async fn run(&self, context: &PipelineContext, state: &PipelineState) -> Result<StageUpdate> {
        let topic: String = state.get_or_default(StateKey::TOPIC);
        let plan: ResearchPlan = state
            .get(StateKey::PLAN)
            .unwrap_or_else(|| ResearchPlan::fallback(&topic));
        let final_csv_path: String = state.get_or_default(StateKey::FINAL_CSV_PATH);

        // The article table is inlined into the prompt; a missing or empty
        // CSV still produces a (thin) report.
        let csv_content = std::fs::read_to_string(&final_csv_path).unwrap_or_default();

        println!("📝 Writing academic report...");
        let prompt = build_prompt(&plan, &csv_content);
        let response = context
            .language_model
            .invoke(SYSTEM_PROMPT, &prompt)
            .await
            .context("report generation failed")?;
        let latex_report = strip_code_fences(&response);

        let report_path = context.config.data_dir.join(REPORT_FILENAME);
        std::fs::write(&report_path, &latex_report)
            .with_context(|| format!("failed to write report to {:?}", report_path))?;
        let report_path = report_path.to_string_lossy().into_owned();
        println!("📝 LaTeX report saved to: {}", report_path);

        let mut update = StageUpdate::new();
        update.set(StateKey::LATEX_REPORT, latex_report)?;
        update.set(StateKey::REPORT_PATH, report_path)?;
        Ok(update)
    }
}

fn build_prompt(plan: &ResearchPlan, csv_content: &str) -> String {
    format!(
        r#"Write a complete LaTeX academic survey report on the topic: {topic}

Research plan:
- Subtopics: {subtopics}
- Expected outcome: {expected_outcome}
- Strategy: {strategy}

Surveyed articles (CSV with columns title, authors, link, abstract, local_pdf_path):
{csv_content}

Requirements:
- A full standalone LaTeX document (documentclass, begin/end document).
- Title page, abstract, an introduction covering the research strategy, one
  section per subtopic discussing the relevant articles, and a conclusion.
- A bibliography listing every surveyed article with its link.
Return only the LaTeX source."#,
        topic = plan.topic,
        subtopics = plan.subtopics.join(", "),
        expected_outcome = plan.expected_outcome,
        strategy = plan.strategy,
    )
}

/// Models often wrap the document in a markdown fence; strip it.
fn strip_code_fences(response: &str) -> String {
    let trimmed = response.trim();
    let Some(without_open) = trimmed
        .strip_prefix("```latex")
        .or_else(|| trimmed.strip_prefix("```tex"))
        .or_else(|| trimmed.strip_prefix("```"))
    else {
        return trimmed.to_string();
    };
    without_open
        .trim_start_matches('\n')
        .trim_end_matches('`')
        .trim_end()
        .to_string()
}
