use crate::actuate::Action;
use crate::error::{ActuationError, GraphError};
use crate::reconcile::{DifferenceResult, RelationshipSets};
use async_trait::async_trait;

/// A remote follow graph that can be read and mutated one edge at a time.
///
/// [`crate::github::GithubApi`] is the production implementation; tests
/// substitute an in-memory graph.
#[async_trait]
pub trait FollowGraph: Send + Sync {
    /// Fetch followers and following of `username`, sequentially.
    async fn relationship_sets(&self, username: &str) -> Result<RelationshipSets, GraphError>;

    /// Follow or unfollow `identifier` on behalf of the authenticated account.
    async fn apply(&self, action: Action, identifier: &str) -> Result<(), ActuationError>;

    /// Fetch and reconcile in one go.
    async fn differences(&self, username: &str) -> Result<DifferenceResult, GraphError> {
        let sets = self.relationship_sets(username).await?;
        let diff = sets.reconcile();
        tracing::info!(
            target: "github",
            username,
            followers = sets.followers.len(),
            following = sets.following.len(),
            not_following_back = diff.not_following_back.len(),
            not_followed_back = diff.not_followed_back.len(),
            "graph.reconciled"
        );
        Ok(diff)
    }
}
