//! Sequential follow/unfollow driver with a fixed pause between requests.

use crate::error::ActuationError;
use crate::graph::FollowGraph;
use followback_common::Identifier;
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Follow,
    Unfollow,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Follow => write!(f, "follow"),
            Action::Unfollow => write!(f, "unfollow"),
        }
    }
}

/// What happened to one identifier, handed to the progress callback as soon
/// as it is known.
#[derive(Debug)]
pub enum Outcome<'a> {
    Done(&'a str),
    /// Dry run: the request would have been sent.
    Planned(&'a str),
    Failed(&'a ActuationError),
}

#[derive(Debug, Clone)]
pub struct ActuationReport {
    pub action: Action,
    pub dry_run: bool,
    pub succeeded: Vec<Identifier>,
    pub failed: Vec<ActuationError>,
}

impl ActuationReport {
    fn new(action: Action, dry_run: bool) -> Self {
        Self {
            action,
            dry_run,
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

pub struct Actuator<G> {
    graph: G,
    delay: Duration,
    dry_run: bool,
}

impl<G: FollowGraph> Actuator<G> {
    pub fn new(graph: G, delay: Duration) -> Self {
        Self {
            graph,
            delay,
            dry_run: false,
        }
    }

    /// Report what would be done without sending any mutating request.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub async fn apply(&self, action: Action, identifier: &str) -> Result<(), ActuationError> {
        if self.dry_run {
            return Ok(());
        }
        self.graph.apply(action, identifier).await
    }

    /// Apply `action` to every identifier in sorted order, one at a time.
    ///
    /// Failures are collected and never stop the batch. The configured delay
    /// separates consecutive requests; none is added after the last one.
    pub async fn apply_all<'a, I, F>(
        &self,
        action: Action,
        identifiers: I,
        mut on_item: F,
    ) -> ActuationReport
    where
        I: IntoIterator<Item = &'a Identifier>,
        F: FnMut(Outcome<'_>),
    {
        let ordered: BTreeSet<&Identifier> = identifiers.into_iter().collect();
        let mut report = ActuationReport::new(action, self.dry_run);

        for (idx, identifier) in ordered.into_iter().enumerate() {
            if idx > 0 && !self.dry_run && !self.delay.is_zero() {
                sleep(self.delay).await;
            }

            match self.apply(action, identifier).await {
                Ok(()) => {
                    tracing::info!(
                        target: "github.actuate",
                        %action,
                        identifier = %identifier,
                        dry_run = self.dry_run,
                        "github.actuate.ok"
                    );
                    on_item(if self.dry_run {
                        Outcome::Planned(identifier)
                    } else {
                        Outcome::Done(identifier)
                    });
                    report.succeeded.push(identifier.clone());
                }
                Err(err) => {
                    tracing::warn!(
                        target: "github.actuate",
                        %action,
                        identifier = %identifier,
                        status = ?err.status,
                        detail = %err.detail,
                        "github.actuate.failed"
                    );
                    on_item(Outcome::Failed(&err));
                    report.failed.push(err);
                }
            }
        }

        report
    }
}
