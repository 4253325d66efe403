//! Pipeline driver: a fixed, linear sequence of stages, each consuming the
//! accumulated state and returning a partial update that the driver merges.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::Config;
use crate::llm::LLMClient;
use crate::stages::{
    IntegrationStage, PlanningStage, SearchStage, SummarizationStage, TransformationStage,
    WritingStage,
};
use crate::types::SummaryReport;

pub mod context;
pub mod state;

pub use context::PipelineContext;
pub use state::{PipelineState, StageUpdate, StateKey};

/// One step of the fixed pipeline. A returned `Err` is fatal and aborts the
/// run; anything recoverable must be handled inside the stage and recorded
/// on the affected items instead.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, context: &PipelineContext, state: &PipelineState) -> Result<StageUpdate>;
}

/// The pipeline driver. Holds the stage order fixed at construction, runs
/// the stages sequentially and performs no I/O of its own beyond merging.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// The standard research pipeline. The writing stage is appended unless
    /// the configuration skips it.
    pub fn standard(config: &Config) -> Self {
        let mut stages: Vec<Box<dyn Stage>> = vec![
            Box::new(PlanningStage),
            Box::new(SearchStage),
            Box::new(IntegrationStage),
            Box::new(SummarizationStage),
            Box::new(TransformationStage),
        ];
        if !config.skip_writing {
            stages.push(Box::new(WritingStage));
        }
        Self::new(stages)
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order against the seed state, merging each partial
    /// update by key-wise overwrite. The first stage error aborts the run.
    pub async fn run(
        &self,
        context: &PipelineContext,
        seed: PipelineState,
    ) -> Result<PipelineState> {
        let mut state = seed;
        for stage in &self.stages {
            println!("\n▶️ Stage: {}", stage.name());
            let update = stage
                .run(context, &state)
                .await
                .with_context(|| format!("stage '{}' failed", stage.name()))?;
            state.merge(update);
        }
        Ok(state)
    }
}

/// Launch the complete research workflow for a topic.
pub async fn launch(config: &Config, topic: &str) -> Result<PipelineState> {
    println!("🚀 Starting research workflow for topic: {}", topic);

    // Fail fast on an unreachable model before any stage runs; the checked
    // client is the one the stages use.
    let llm_client = LLMClient::new(config.clone())?;
    llm_client.check_connection().await?;

    let context = PipelineContext::with_language_model(config.clone(), Arc::new(llm_client));
    let pipeline = Pipeline::standard(config);
    let state = pipeline.run(&context, PipelineState::seeded(topic)).await?;

    if let Some(report) = state.get::<SummaryReport>(StateKey::REPORT) {
        println!("\n🏁 Workflow completed");
        println!(
            "   {} articles collected, {} with abstracts",
            report.total_articles, report.articles_with_abstracts
        );
        for (source, count) in &report.sources {
            println!("   - {}: {}", source, count);
        }
    }
    if let Some(csv_path) = state.get::<String>(StateKey::FINAL_CSV_PATH) {
        println!("   Final CSV: {}", csv_path);
    }
    if let Some(report_path) = state.get::<String>(StateKey::REPORT_PATH) {
        println!("   LaTeX report: {}", report_path);
    }

    Ok(state)
}

#[cfg(test)]
mod tests;
