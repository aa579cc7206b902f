//! # TransFuser Evaluation CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 排行榜评估（evaluate）
//! - 本地闭环驾驶（drive）
//! - 天气预设与配置查看

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_config, run_drive, run_evaluate, run_weather};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "TransFuser evaluation starting"
    );

    let result = match &cli.command {
        Commands::Evaluate(args) => run_evaluate(args).await,
        Commands::Drive(args) => run_drive(args).await,
        Commands::Weather => run_weather(),
        Commands::Config(args) => run_config(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging (and the optional metrics endpoint) from CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    let config = ObservabilityConfig::from_verbosity(cli.verbose, cli.quiet)
        .with_format(cli.log_format.into())
        .with_metrics_port(cli.metrics_port);
    observability::init_with_config(config)
}
