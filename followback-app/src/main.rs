use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use followback_common::observability::{LogConfig, LogFormat, init_logging};
use followback_config::{FollowbackConfig, FollowbackConfigLoader};

mod cli;
mod commands;

const DEFAULT_CONFIG_FILE: &str = "followback.yaml";

fn load_config(cli: &Cli) -> Result<FollowbackConfig> {
    let loader = match &cli.config {
        Some(path) => FollowbackConfigLoader::new().with_file(path),
        None => FollowbackConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    let mut cfg = loader.load()?;

    // Flags (and their env fallbacks) win over file/env config.
    if let Some(token) = &cli.token {
        cfg.github.token = Some(token.clone());
    }
    Ok(cfg)
}

fn log_config(cli: &Cli, cfg: &FollowbackConfig) -> LogConfig {
    let format = cli
        .log_format
        .or_else(|| cfg.log.format.as_deref().and_then(|f| f.parse().ok()))
        .unwrap_or(LogFormat::Text);
    LogConfig {
        log_dir: cfg.log.dir.clone(),
        emit_stderr: cli.verbose || cfg.log.stderr,
        format,
        ..LogConfig::default()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let cfg = load_config(&cli)?;
    init_logging(log_config(&cli, &cfg))?;

    match cli.command {
        Command::Check(args) => commands::check(args, &cfg).await,
        Command::Sync(args) => commands::sync(args, &cfg).await,
        Command::Serve(args) => commands::serve(args, &cfg).await,
    }
}
