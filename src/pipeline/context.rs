use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::fetch::{DocumentFetcher, HttpFetcher};
use crate::llm::{LLMClient, LanguageModel};
use crate::retrieval::{KnowledgeBase, VectorKnowledgeBase};
use crate::search::{DuckDuckGoSearch, SearchBackend};

/// Shared context handed to every stage: the configuration plus the
/// capability adapters behind trait objects, so tests can substitute stubs.
#[derive(Clone)]
pub struct PipelineContext {
    pub config: Config,
    pub language_model: Arc<dyn LanguageModel>,
    pub search: Arc<dyn SearchBackend>,
    pub fetcher: Arc<dyn DocumentFetcher>,
    pub knowledge_base: Arc<dyn KnowledgeBase>,
}

impl PipelineContext {
    /// Build the context with the production adapters.
    pub fn new(config: Config) -> Result<Self> {
        let llm_client = LLMClient::new(config.clone())?;
        Ok(Self::with_language_model(config, Arc::new(llm_client)))
    }

    /// Build the context around an already-constructed language model,
    /// wiring up the remaining production adapters.
    pub fn with_language_model(config: Config, language_model: Arc<dyn LanguageModel>) -> Self {
        let fetcher: Arc<dyn DocumentFetcher> =
            Arc::new(HttpFetcher::new(config.search.timeout_seconds));
        let knowledge_base = Arc::new(VectorKnowledgeBase::new(
            config.embedding.clone(),
            fetcher.clone(),
        ));
        let search = Arc::new(DuckDuckGoSearch::new(config.search.timeout_seconds));

        Self {
            config,
            language_model,
            search,
            fetcher,
            knowledge_base,
        }
    }

    /// Build a context around caller-supplied adapters.
    pub fn with_adapters(
        config: Config,
        language_model: Arc<dyn LanguageModel>,
        search: Arc<dyn SearchBackend>,
        fetcher: Arc<dyn DocumentFetcher>,
        knowledge_base: Arc<dyn KnowledgeBase>,
    ) -> Self {
        Self {
            config,
            language_model,
            search,
            fetcher,
            knowledge_base,
        }
    }
}
