use anyhow::{Result, anyhow};
use async_trait::async_trait;

use super::*;
use crate::config::Config;

fn test_context() -> PipelineContext {
    // Adapter construction performs no network I/O; the toy stages below
    // never touch the adapters.
    PipelineContext::new(Config::default()).unwrap()
}

struct WriteStage {
    key: &'static str,
    value: &'static str,
}

#[async_trait]
impl Stage for WriteStage {
    fn name(&self) -> &'static str {
        "write"
    }

    async fn run(&self, _context: &PipelineContext, _state: &PipelineState) -> Result<StageUpdate> {
        let mut update = StageUpdate::new();
        update.set(self.key, self.value)?;
        Ok(update)
    }
}

struct FailingStage;

#[async_trait]
impl Stage for FailingStage {
    fn name(&self) -> &'static str {
        "doomed"
    }

    async fn run(&self, _context: &PipelineContext, _state: &PipelineState) -> Result<StageUpdate> {
        Err(anyhow!("adapter construction failed"))
    }
}

struct EchoModel;

#[async_trait]
impl crate::llm::LanguageModel for EchoModel {
    async fn invoke(&self, _system_prompt: &str, user_prompt: &str) -> Result<String> {
        Ok(user_prompt.to_string())
    }
}

#[test]
fn test_context_shares_the_supplied_model() {
    // The connection-checked client instance is the one the stages consume.
    let model: Arc<dyn crate::llm::LanguageModel> = Arc::new(EchoModel);
    let context = PipelineContext::with_language_model(Config::default(), model.clone());
    assert!(Arc::ptr_eq(&context.language_model, &model));
}

#[test]
fn test_state_seeded_with_topic() {
    let state = PipelineState::seeded("graph neural networks");
    assert_eq!(
        state.get::<String>(StateKey::TOPIC).as_deref(),
        Some("graph neural networks")
    );
    assert_eq!(state.keys().len(), 1);
}

#[test]
fn test_state_get_or_default_tolerates_missing_keys() {
    let state = PipelineState::seeded("topic");
    let articles: Vec<crate::types::ArticleRecord> = state.get_or_default(StateKey::ARTICLES);
    assert!(articles.is_empty());
    let path: String = state.get_or_default(StateKey::CSV_PATH);
    assert!(path.is_empty());
}

#[test]
fn test_merge_accumulates_and_overwrites() {
    let mut state = PipelineState::seeded("topic");

    let mut first = StageUpdate::new();
    first.set("a", 1).unwrap();
    first.set("b", "one").unwrap();
    state.merge(first);

    let mut second = StageUpdate::new();
    second.set("b", "two").unwrap();
    state.merge(second);

    // Untouched keys survive; touched keys are overwritten.
    assert_eq!(state.get::<i64>("a"), Some(1));
    assert_eq!(state.get::<String>("b").as_deref(), Some("two"));
    assert!(state.contains(StateKey::TOPIC));
}

#[tokio::test]
async fn test_driver_runs_stages_in_order() {
    let pipeline = Pipeline::new(vec![
        Box::new(WriteStage {
            key: "x",
            value: "first",
        }),
        Box::new(WriteStage {
            key: "x",
            value: "second",
        }),
        Box::new(WriteStage {
            key: "y",
            value: "only",
        }),
    ]);

    let state = pipeline
        .run(&test_context(), PipelineState::seeded("t"))
        .await
        .unwrap();

    assert_eq!(state.get::<String>("x").as_deref(), Some("second"));
    assert_eq!(state.get::<String>("y").as_deref(), Some("only"));
}

#[tokio::test]
async fn test_driver_propagates_stage_failure() {
    let pipeline = Pipeline::new(vec![
        Box::new(WriteStage {
            key: "x",
            value: "v",
        }),
        Box::new(FailingStage),
        Box::new(WriteStage {
            key: "never",
            value: "v",
        }),
    ]);

    let err = pipeline
        .run(&test_context(), PipelineState::seeded("t"))
        .await
        .unwrap_err();

    // The error names the failing stage for diagnostics.
    assert!(err.to_string().contains("doomed"));
}

#[test]
fn test_standard_pipeline_shape() {
    let config = Config::default();
    let pipeline = Pipeline::standard(&config);
    assert_eq!(
        pipeline.stage_names(),
        vec![
            "planning",
            "searching",
            "integration",
            "abstracting",
            "transformation",
            "writing"
        ]
    );

    let mut skipping = Config::default();
    skipping.skip_writing = true;
    let pipeline = Pipeline::standard(&skipping);
    assert_eq!(pipeline.stage_names().last(), Some(&"transformation"));
}
