use super::*;
use std::str::FromStr;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.data_dir, PathBuf::from("data"));
    assert!(!config.skip_writing);
    assert!(!config.verbose);
    assert_eq!(config.llm.provider, LLMProvider::OpenAI);
    assert_eq!(config.llm.max_parallels, 5);
    assert_eq!(config.llm.max_content_length, 10_000);
    assert_eq!(config.llm.abstract_max_words, 200);
    assert_eq!(config.search.domain, "arxiv.org");
    assert_eq!(config.search.max_results, 10);
    assert_eq!(config.search.query_pause_ms, 1000);
    assert_eq!(config.embedding.model, "nomic-embed-text");
    assert_eq!(config.embedding.chunk_size, 2000);
    assert_eq!(config.embedding.chunk_overlap, 200);
}

#[test]
fn test_provider_from_str() {
    assert_eq!(LLMProvider::from_str("openai").unwrap(), LLMProvider::OpenAI);
    assert_eq!(LLMProvider::from_str("OpenAI").unwrap(), LLMProvider::OpenAI);
    assert_eq!(LLMProvider::from_str("ollama").unwrap(), LLMProvider::Ollama);
    assert!(LLMProvider::from_str("gemini").is_err());
}

#[test]
fn test_provider_display_roundtrip() {
    for provider in [LLMProvider::OpenAI, LLMProvider::Ollama] {
        let parsed = LLMProvider::from_str(&provider.to_string()).unwrap();
        assert_eq!(parsed, provider);
    }
}

#[test]
fn test_config_from_file() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let config_path = temp_dir.path().join("paper-scout.toml");
    let content = r#"
data_dir = "research_data"
skip_writing = true

[llm]
provider = "ollama"
model = "llama3"
max_parallels = 3

[search]
max_results = 20
"#;
    std::fs::write(&config_path, content).unwrap();

    let config = Config::from_file(&config_path).unwrap();
    assert_eq!(config.data_dir, PathBuf::from("research_data"));
    assert!(config.skip_writing);
    assert_eq!(config.llm.provider, LLMProvider::Ollama);
    assert_eq!(config.llm.model, "llama3");
    assert_eq!(config.llm.max_parallels, 3);
    assert_eq!(config.search.max_results, 20);
    // Untouched sections keep their defaults.
    assert_eq!(config.search.domain, "arxiv.org");
    assert_eq!(config.embedding.model, "nomic-embed-text");
}

#[test]
fn test_config_from_missing_file() {
    let path = PathBuf::from("/nonexistent/paper-scout.toml");
    assert!(Config::from_file(&path).is_err());
}

#[test]
fn test_config_serialization_roundtrip() {
    let config = Config::default();
    let serialized = toml::to_string(&config).unwrap();
    let deserialized: Config = toml::from_str(&serialized).unwrap();

    assert_eq!(deserialized.llm.provider, config.llm.provider);
    assert_eq!(deserialized.llm.model, config.llm.model);
    assert_eq!(deserialized.search.max_results, config.search.max_results);
    assert_eq!(deserialized.data_dir, config.data_dir);
}
