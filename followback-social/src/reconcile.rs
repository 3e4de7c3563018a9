//! Set reconciliation between followers and following.

use followback_common::Identifier;
use serde::Serialize;
use std::collections::BTreeSet;

/// Both sides of an account's follow graph, fetched fresh per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipSets {
    pub followers: BTreeSet<Identifier>,
    pub following: BTreeSet<Identifier>,
}

impl RelationshipSets {
    pub fn reconcile(&self) -> DifferenceResult {
        reconcile(&self.followers, &self.following)
    }
}

/// The two asymmetric differences. Serializes as
/// `{"not_following_back": [...], "not_followed_back": [...]}`, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DifferenceResult {
    /// Accounts we follow that don't follow us (`following \ followers`).
    pub not_following_back: BTreeSet<Identifier>,
    /// Accounts following us that we don't follow (`followers \ following`).
    pub not_followed_back: BTreeSet<Identifier>,
}

impl DifferenceResult {
    pub fn is_balanced(&self) -> bool {
        self.not_following_back.is_empty() && self.not_followed_back.is_empty()
    }
}

/// Compute both differences. Pure and deterministic.
///
/// ```
/// use followback_social::reconcile;
/// use std::collections::BTreeSet;
///
/// let followers: BTreeSet<String> = ["a", "b"].map(String::from).into();
/// let following: BTreeSet<String> = ["b", "c"].map(String::from).into();
/// let diff = reconcile(&followers, &following);
///
/// assert_eq!(diff.not_following_back, BTreeSet::from(["c".to_string()]));
/// assert_eq!(diff.not_followed_back, BTreeSet::from(["a".to_string()]));
/// ```
pub fn reconcile(
    followers: &BTreeSet<Identifier>,
    following: &BTreeSet<Identifier>,
) -> DifferenceResult {
    DifferenceResult {
        not_following_back: following.difference(followers).cloned().collect(),
        not_followed_back: followers.difference(following).cloned().collect(),
    }
}
