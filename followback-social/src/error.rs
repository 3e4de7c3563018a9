use crate::actuate::Action;
use followback_common::Identifier;
use followback_http::{HttpError, StatusCode};
use thiserror::Error;

/// Reading the relationship graph failed. A single failed page fails the
/// whole fetch; nothing fetched so far is returned.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("failed to fetch {url}: {status}")]
    Fetch { url: String, status: StatusCode },

    #[error(transparent)]
    Http(HttpError),

    #[error("invalid account name `{0}`")]
    InvalidIdentifier(String),
}

impl From<HttpError> for GraphError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Api { url, status, .. } => GraphError::Fetch {
                url: url.to_string(),
                status,
            },
            other => GraphError::Http(other),
        }
    }
}

/// A single follow/unfollow call failed. Reported per item, never fatal to
/// the batch.
#[derive(Debug, Clone, Error)]
#[error("failed to {action} {identifier}: {detail}")]
pub struct ActuationError {
    pub identifier: Identifier,
    pub action: Action,
    /// Status returned by the remote, `None` when no response arrived.
    pub status: Option<StatusCode>,
    pub detail: String,
}

impl ActuationError {
    pub fn from_status(action: Action, identifier: &str, status: StatusCode) -> Self {
        Self {
            identifier: identifier.to_string(),
            action,
            status: Some(status),
            detail: status.to_string(),
        }
    }

    pub fn other(action: Action, identifier: &str, detail: impl Into<String>) -> Self {
        Self {
            identifier: identifier.to_string(),
            action,
            status: None,
            detail: detail.into(),
        }
    }
}
