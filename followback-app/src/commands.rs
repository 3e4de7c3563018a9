use crate::cli::{CheckArgs, ServeArgs, SubjectArgs, SyncArgs};
use anyhow::{Context, Result};
use followback_common::FollowbackError;
use followback_config::FollowbackConfig;
use followback_social::github::GithubApi;
use followback_social::{Action, ActuationReport, Actuator, DifferenceResult, FollowGraph, Outcome};
use followback_web::AppState;
use std::collections::BTreeSet;
use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;

fn subject<'a>(args: &'a SubjectArgs, cfg: &'a FollowbackConfig) -> Result<&'a str, FollowbackError> {
    args.username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .or_else(|| cfg.github.username())
        .ok_or_else(|| FollowbackError::missing("github.username (or --username / GITHUB_USERNAME)"))
}

fn github_api(cfg: &FollowbackConfig, require_token: bool) -> Result<GithubApi> {
    let token = cfg.github.token();
    if require_token && token.is_none() {
        return Err(FollowbackError::missing("github.token (or --token / GITHUB_TOKEN)").into());
    }
    let api = GithubApi::new(&cfg.github.api_base, token.map(str::to_string))?
        .with_per_page(cfg.github.page_size())
        .with_timeout(cfg.github.timeout());
    Ok(api)
}

pub async fn check(args: CheckArgs, cfg: &FollowbackConfig) -> Result<()> {
    let username = subject(&args.subject, cfg)?;
    let api = github_api(cfg, false)?;
    if !api.is_authenticated() {
        tracing::info!("no token configured; using anonymous requests");
    }

    let diff = api
        .differences(username)
        .await
        .with_context(|| format!("reading the follow graph of {username}"))?;

    let mut out = std::io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &diff)?;
        writeln!(out)?;
    } else {
        write_summary(&mut out, &diff)?;
    }
    Ok(())
}

pub async fn sync(args: SyncArgs, cfg: &FollowbackConfig) -> Result<()> {
    let username = subject(&args.subject, cfg)?;
    let api = github_api(cfg, true)?;
    let delay = Duration::from_millis(args.delay_ms.unwrap_or(cfg.sync.delay_ms));
    let dry_run = args.dry_run || cfg.sync.dry_run;

    let actuator = Actuator::new(api, delay).with_dry_run(dry_run);
    let diff = actuator
        .graph()
        .differences(username)
        .await
        .with_context(|| format!("reading the follow graph of {username}"))?;

    let mut reports = Vec::new();
    if cfg.sync.unfollow && !args.no_unfollow {
        reports.push(run_batch(&actuator, Action::Unfollow, &diff.not_following_back).await);
    }
    if cfg.sync.follow && !args.no_follow {
        reports.push(run_batch(&actuator, Action::Follow, &diff.not_followed_back).await);
    }

    let mut out = std::io::stdout().lock();
    writeln!(out)?;
    write_summary(&mut out, &diff)?;
    for report in &reports {
        write_tally(&mut out, report)?;
    }
    Ok(())
}

async fn run_batch(
    actuator: &Actuator<GithubApi>,
    action: Action,
    targets: &BTreeSet<String>,
) -> ActuationReport {
    actuator
        .apply_all(action, targets, |outcome| {
            println!("{}", outcome_line(action, &outcome));
        })
        .await
}

pub async fn serve(args: ServeArgs, cfg: &FollowbackConfig) -> Result<()> {
    let bind = args.bind.as_deref().unwrap_or(&cfg.server.bind);
    let addr: SocketAddr = bind
        .parse()
        .map_err(|e| FollowbackError::Config(format!("invalid bind address `{bind}`: {e}")))?;
    if cfg.github.token().is_none() {
        tracing::warn!("no GitHub token configured; /manage_followers will answer 400");
    }
    println!("Listening on http://{addr}");
    let state = AppState::new(&cfg.github)?;
    followback_web::serve(state, addr).await
}

fn outcome_line(action: Action, outcome: &Outcome<'_>) -> String {
    let (done, verb) = match action {
        Action::Follow => ("Followed", "follow"),
        Action::Unfollow => ("Unfollowed", "unfollow"),
    };
    match outcome {
        Outcome::Done(id) => format!("{done} {id}"),
        Outcome::Planned(id) => format!("Would {verb} {id}"),
        Outcome::Failed(err) => match err.status {
            Some(status) => format!("Failed to {verb} {} ({status})", err.identifier),
            None => format!("Failed to {verb} {} ({})", err.identifier, err.detail),
        },
    }
}

fn write_list(out: &mut impl Write, ids: &BTreeSet<String>) -> std::io::Result<()> {
    if ids.is_empty() {
        return writeln!(out, "  (none)");
    }
    for id in ids {
        writeln!(out, "  {id}")?;
    }
    Ok(())
}

pub fn write_summary(out: &mut impl Write, diff: &DifferenceResult) -> std::io::Result<()> {
    writeln!(out, "Accounts you're following but not following you back:")?;
    write_list(out, &diff.not_following_back)?;
    writeln!(out)?;
    writeln!(out, "Accounts following you but you're not following back:")?;
    write_list(out, &diff.not_followed_back)
}

fn write_tally(out: &mut impl Write, report: &ActuationReport) -> std::io::Result<()> {
    let label = if report.dry_run { "planned" } else { "succeeded" };
    writeln!(
        out,
        "{}: {} {label}, {} failed",
        report.action,
        report.succeeded.len(),
        report.failed.len()
    )
}
