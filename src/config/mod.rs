use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

/// LLM provider type. The pipeline supports a cloud backend (OpenAI) and a
/// locally hosted backend (Ollama), selectable at run time.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    #[default]
    OpenAI,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// Application configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Directory for downloaded articles, CSV artifacts and the final report.
    pub data_dir: PathBuf,

    /// Skip the terminal report-writing stage.
    pub skip_writing: bool,

    /// Enable verbose logging.
    pub verbose: bool,

    /// LLM model configuration.
    pub llm: LLMConfig,

    /// Web search configuration.
    pub search: SearchConfig,

    /// Embedding backend configuration for the retrieval knowledge base.
    pub embedding: EmbeddingConfig,
}

/// LLM model configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM provider type.
    pub provider: LLMProvider,

    /// LLM API key. Falls back to the OPENAI_API_KEY environment variable.
    pub api_key: String,

    /// LLM API base address.
    pub api_base_url: String,

    /// Model identifier.
    pub model: String,

    /// Maximum response tokens.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f64,

    /// Retry attempts per call.
    pub retry_attempts: u32,

    /// Delay between retries, milliseconds.
    pub retry_delay_ms: u64,

    /// Request timeout, seconds.
    pub timeout_seconds: u64,

    /// Worker budget of the summarization fan-out.
    pub max_parallels: usize,

    /// Character cap applied to article bodies before summarization.
    pub max_content_length: usize,

    /// Word cap requested for generated abstracts.
    pub abstract_max_words: usize,
}

/// Web search configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// Trusted host suffix; hits outside this domain are discarded.
    pub domain: String,

    /// Overall result budget, divided evenly across the plan's queries.
    pub max_results: usize,

    /// Pause between consecutive queries, milliseconds.
    pub query_pause_ms: u64,

    /// Per-request timeout, seconds.
    pub timeout_seconds: u64,
}

/// Embedding backend configuration (Ollama-compatible HTTP endpoint).
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding model name.
    pub model: String,

    /// Embedding endpoint base address.
    pub api_base_url: String,

    /// Chunk size used when indexing documents.
    pub chunk_size: usize,

    /// Overlap between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            skip_writing: false,
            verbose: false,
            llm: LLMConfig::default(),
            search: SearchConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::OpenAI,
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            api_base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 4096,
            temperature: 0.7,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            timeout_seconds: 120,
            max_parallels: 5,
            max_content_length: 10_000,
            abstract_max_words: 200,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            domain: "arxiv.org".to_string(),
            max_results: 10,
            query_pause_ms: 1000,
            timeout_seconds: 10,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "nomic-embed-text".to_string(),
            api_base_url: "http://localhost:11434".to_string(),
            chunk_size: 2000,
            chunk_overlap: 200,
        }
    }
}

#[cfg(test)]
mod tests;
