pub mod cli;
pub mod config;
pub mod fetch;
pub mod llm;
pub mod pipeline;
pub mod retrieval;
pub mod search;
pub mod stages;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use pipeline::launch;
