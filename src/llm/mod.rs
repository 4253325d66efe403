//! Language-model capability: a narrow prompt-in, text-out contract that the
//! pipeline stages consume, with interchangeable provider backends behind it.

use anyhow::Result;
use async_trait::async_trait;

pub mod client;

pub use client::LLMClient;

/// The capability surface the pipeline needs from a language model.
/// No streaming, no schema-enforced output; callers parse free text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn invoke(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}
