//! vue-template-rs: compiles Vue 2 single-file component templates.

mod cli;
mod config;
mod orchestrator;
mod output;

use clap::Parser;
use cli::Args;
use miette::Result;
use node_runner::NodeRunner;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "VUE_TEMPLATE_LOG";

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if args.node_version {
        let node = orchestrator::locate_node(&args)?;
        let runner = NodeRunner::new(node.clone(), args.workspace.clone(), 1)
            .map_err(orchestrator::OrchestratorError::from)?;
        println!("node {}", runner.node_version().map_err(orchestrator::OrchestratorError::from)?);
        println!("path: {}", node);
        if let Some(cache_dir) = NodeRunner::get_cache_dir() {
            println!("cache: {}", cache_dir);
        }
        return Ok(());
    }

    let summary = orchestrator::run(args)?;
    if summary.failed() {
        std::process::exit(1);
    }
    Ok(())
}
