//! # Gyro Syncer CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 离线估计两份录制之间的时间延迟
//! - 设备同步服务器
//! - 配置验证

mod cli;
mod commands;
mod pipeline;
mod server;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_estimate, run_serve, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Metrics are installed by `serve` once its configuration is known
    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: None,
        default_log_level: log_level(&cli).to_string(),
    })?;

    info!(version = env!("CARGO_PKG_VERSION"), "Gyro Syncer CLI starting");

    let result = match &cli.command {
        Commands::Estimate(args) => run_estimate(args),
        Commands::Serve(args) => run_serve(args).await,
        Commands::Validate(args) => run_validate(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

fn log_level(cli: &Cli) -> &'static str {
    if cli.quiet {
        return "warn";
    }
    match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}
