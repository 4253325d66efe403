use super::*;
use clap::Parser;

#[test]
fn test_args_minimal() {
    let args = Args::parse_from(["paper-scout", "graph neural networks"]);
    assert_eq!(args.topic, "graph neural networks");
    assert_eq!(args.data_dir, PathBuf::from("./data"));
    assert!(args.config.is_none());
    assert!(!args.skip_writing);
    assert!(!args.verbose);
}

#[test]
fn test_args_overrides() {
    let args = Args::parse_from([
        "paper-scout",
        "quantum computing",
        "--data-dir",
        "/tmp/research",
        "--llm-provider",
        "ollama",
        "--model",
        "llama3",
        "--max-parallels",
        "5",
        "--max-results",
        "30",
        "--skip-writing",
        "--verbose",
    ]);

    assert_eq!(args.max_parallels, Some(5));
    assert_eq!(args.max_results, Some(30));

    let (topic, config) = args.into_config();
    assert_eq!(topic, "quantum computing");
    assert_eq!(config.data_dir, PathBuf::from("/tmp/research"));
    assert_eq!(config.llm.provider, LLMProvider::Ollama);
    assert_eq!(config.llm.model, "llama3");
    assert_eq!(config.llm.max_parallels, 5);
    assert_eq!(config.search.max_results, 30);
    assert!(config.skip_writing);
    assert!(config.verbose);
}

#[test]
fn test_args_defaults_pass_through() {
    let args = Args::parse_from(["paper-scout", "federated learning"]);
    let (_, config) = args.into_config();

    assert_eq!(config.llm.provider, LLMProvider::OpenAI);
    assert_eq!(config.search.domain, "arxiv.org");
    assert_eq!(config.search.max_results, 10);
    assert!(!config.skip_writing);
}

#[test]
fn test_args_config_file() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let config_path = temp_dir.path().join("custom.toml");
    std::fs::write(&config_path, "[llm]\nprovider = \"ollama\"\n").unwrap();

    let args = Args::parse_from([
        "paper-scout",
        "swarm robotics",
        "--config",
        config_path.to_str().unwrap(),
        "--temperature",
        "0.2",
    ]);

    let (_, config) = args.into_config();
    assert_eq!(config.llm.provider, LLMProvider::Ollama);
    assert_eq!(config.llm.temperature, 0.2);
}

#[test]
#[should_panic]
fn test_args_invalid_provider_panics() {
    let args = Args::parse_from([
        "paper-scout",
        "topic",
        "--llm-provider",
        "not-a-provider",
    ]);
    let _ = args.into_config();
}
