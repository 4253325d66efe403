use crate::config::{Config, LLMProvider};
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

/// paper-scout - a multi-agent research assistant pipeline driven by Rust and AI.
#[derive(Parser, Debug)]
#[command(name = "paper-scout")]
#[command(
    about = "Automated article search and summarization pipeline. Plans search queries for a topic, retrieves arXiv articles, summarizes them with a language model and emits CSV and LaTeX reports."
)]
#[command(version)]
pub struct Args {
    /// Research topic keywords
    pub topic: String,

    /// Data directory for downloaded articles and generated artifacts
    #[arg(short, long, default_value = "./data")]
    pub data_dir: PathBuf,

    /// Config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// LLM provider (openai, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// Model identifier
    #[arg(short, long)]
    pub model: Option<String>,

    /// LLM API key (falls back to OPENAI_API_KEY)
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// LLM API base address
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// Maximum response tokens
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Worker budget of the summarization fan-out
    #[arg(long)]
    pub max_parallels: Option<usize>,

    /// Overall search result budget, divided across queries
    #[arg(long)]
    pub max_results: Option<usize>,

    /// Skip the terminal report-writing stage
    #[arg(long)]
    pub skip_writing: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Resolve CLI arguments into the topic and the effective configuration.
    /// An explicit --config file is loaded first, then a ./paper-scout.toml
    /// next to the working directory, then defaults; CLI flags override all.
    pub fn into_config(self) -> (String, Config) {
        let mut config = if let Some(config_path) = &self.config {
            Config::from_file(config_path).unwrap_or_else(|e| {
                panic!("⚠️ Unable to read config file {:?}: {}", config_path, e)
            })
        } else {
            let default_config_path = std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("paper-scout.toml");

            if default_config_path.exists() {
                Config::from_file(&default_config_path).unwrap_or_else(|e| {
                    panic!(
                        "⚠️ Unable to read config file {:?}: {}",
                        default_config_path, e
                    )
                })
            } else {
                Config::default()
            }
        };

        config.data_dir = self.data_dir;

        if let Some(provider) = self.llm_provider {
            config.llm.provider = LLMProvider::from_str(&provider)
                .unwrap_or_else(|e| panic!("⚠️ Invalid LLM provider: {}", e));
        }
        if let Some(model) = self.model {
            config.llm.model = model;
        }
        if let Some(api_key) = self.llm_api_key {
            config.llm.api_key = api_key;
        }
        if let Some(api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = api_base_url;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }
        if let Some(max_parallels) = self.max_parallels {
            config.llm.max_parallels = max_parallels;
        }
        if let Some(max_results) = self.max_results {
            config.search.max_results = max_results;
        }
        if self.skip_writing {
            config.skip_writing = true;
        }
        if self.verbose {
            config.verbose = true;
        }

        (self.topic, config)
    }
}

#[cfg(test)]
mod tests;
