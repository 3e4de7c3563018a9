use clap::{Args, Parser, Subcommand};
use followback_common::observability::LogFormat;
use std::path::PathBuf;

/// Find who doesn't follow you back on GitHub, and optionally fix it.
#[derive(Debug, Parser)]
#[command(name = "followback", version)]
pub struct Cli {
    /// Configuration file; `followback.yaml` is used when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Personal access token (overrides `github.token`).
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Log encoding: text or json.
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// Mirror logs to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print both differences without changing anything.
    Check(CheckArgs),
    /// Unfollow non-followers and follow back followers.
    Sync(SyncArgs),
    /// Run the HTTP endpoint.
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub struct SubjectArgs {
    /// Account to inspect (overrides `github.username`).
    #[arg(short, long, env = "GITHUB_USERNAME")]
    pub username: Option<String>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub subject: SubjectArgs,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    #[command(flatten)]
    pub subject: SubjectArgs,

    /// Show what would change without sending follow/unfollow requests.
    #[arg(long)]
    pub dry_run: bool,

    /// Pause between mutating requests (overrides `sync.delay_ms`).
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Skip following back.
    #[arg(long)]
    pub no_follow: bool,

    /// Skip unfollowing.
    #[arg(long)]
    pub no_unfollow: bool,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Listen address (overrides `server.bind`).
    #[arg(long)]
    pub bind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sync_flags() {
        let cli = Cli::try_parse_from([
            "followback",
            "sync",
            "--username",
            "octocat",
            "--dry-run",
            "--delay-ms",
            "250",
            "--no-follow",
        ])
        .unwrap();
        match cli.command {
            Command::Sync(args) => {
                assert_eq!(args.subject.username.as_deref(), Some("octocat"));
                assert!(args.dry_run && args.no_follow && !args.no_unfollow);
                assert_eq!(args.delay_ms, Some(250));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "followback",
            "check",
            "--json",
            "--log-format",
            "json",
            "--config",
            "alt.yaml",
        ])
        .unwrap();
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert_eq!(cli.config, Some(PathBuf::from("alt.yaml")));
        assert!(matches!(cli.command, Command::Check(CheckArgs { json: true, .. })));
    }
}
