use serde::{Deserialize, Serialize};

/// The slice of GitHub's user object we decode; everything else is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GithubUser {
    pub login: String,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub html_url: Option<String>,
}
