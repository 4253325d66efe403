use crate::pipeline::launch;
use anyhow::Result;
use clap::Parser;

mod cli;
mod config;
mod fetch;
mod llm;
mod pipeline;
mod retrieval;
mod search;
mod stages;
mod types;
mod utils;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    let (topic, config) = args.into_config();

    launch(&config, &topic).await?;
    Ok(())
}
