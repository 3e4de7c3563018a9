//! Thin wrapper around the GitHub REST API with followback defaults.
//!
//! Reads walk the `Link: <...>; rel="next"` chain until it ends. The first
//! non-success page aborts the whole fetch with [`GraphError::Fetch`]; pages
//! fetched before it are discarded. There are no retries.
use crate::actuate::Action;
use crate::error::{ActuationError, GraphError};
use crate::github::types::GithubUser;
use crate::graph::FollowGraph;
use crate::reconcile::RelationshipSets;
use async_trait::async_trait;
use followback_common::Identifier;
use followback_http::{Auth, HttpClient, HttpError, Method, Page, RequestOpts, StatusCode, Url};
use followback_http::header::{ACCEPT, CONTENT_LENGTH, HeaderMap, HeaderValue};
use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const MAX_LOGIN_LEN: usize = 39;

/// GitHub logins: ASCII alphanumerics and single inner hyphens, at most 39 chars.
///
/// ```
/// use followback_social::github::is_valid_login;
///
/// assert!(is_valid_login("octo-cat"));
/// assert!(!is_valid_login("-octo"));
/// assert!(!is_valid_login("../admin"));
/// ```
pub fn is_valid_login(login: &str) -> bool {
    !login.is_empty()
        && login.len() <= MAX_LOGIN_LEN
        && !login.starts_with('-')
        && !login.ends_with('-')
        && !login.contains("--")
        && login.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[derive(Clone)]
pub struct GithubApi {
    http: HttpClient,
    token: Option<String>,
    per_page: u32,
}

impl GithubApi {
    /// Client for `api_base` (e.g. `https://api.github.com`), anonymous when
    /// `token` is `None`.
    pub fn new(api_base: &str, token: Option<String>) -> Result<Self, GraphError> {
        // Keep any path prefix (GitHub Enterprise `/api/v3`) when joining.
        let base = if api_base.ends_with('/') {
            api_base.to_string()
        } else {
            format!("{api_base}/")
        };
        let http = HttpClient::new(&base)?;
        Ok(Self {
            http,
            token,
            per_page: 100,
        })
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(1, 100);
        self
    }

    /// Bound each request; `None` keeps the client's default (unbounded).
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        if let Some(timeout) = timeout {
            self.http = self.http.with_timeout(timeout);
        }
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn opts(&self) -> RequestOpts<'_> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        RequestOpts {
            auth: Some(Auth::bearer_opt(self.token.as_deref())),
            headers: Some(headers),
            allow_absolute: true,
            ..Default::default()
        }
    }

    /// Fetch every page starting at `start` (relative to the API base, or
    /// absolute) and concatenate the records in server order.
    pub async fn fetch_all(&self, start: &str) -> Result<Vec<GithubUser>, GraphError> {
        let per_page = self.per_page.to_string();
        let mut records = Vec::new();
        let mut visited: HashSet<Url> = HashSet::new();

        let mut opts = self.opts();
        opts.query = Some(vec![("per_page", Cow::Borrowed(per_page.as_str()))]);
        let mut page: Page<Vec<GithubUser>> = self.http.get_page(start, opts).await?;

        loop {
            tracing::debug!(
                target: "github",
                url = %page.url,
                count = page.items.len(),
                total = records.len() + page.items.len(),
                "github.fetch.page"
            );
            records.extend(page.items);
            visited.insert(page.url);

            let Some(next) = page.next else { break };
            if visited.contains(&next) {
                tracing::warn!(target: "github", url = %next, "github.fetch.link_cycle");
                break;
            }
            page = self.http.get_page(next.as_str(), self.opts()).await?;
        }

        Ok(records)
    }

    async fn logins(&self, username: &str, edge: &str) -> Result<BTreeSet<Identifier>, GraphError> {
        if !is_valid_login(username) {
            return Err(GraphError::InvalidIdentifier(username.to_string()));
        }
        let users = self.fetch_all(&format!("users/{username}/{edge}")).await?;
        Ok(users.into_iter().map(|u| u.login).collect())
    }

    /// Logins of accounts following `username`.
    pub async fn followers(&self, username: &str) -> Result<BTreeSet<Identifier>, GraphError> {
        self.logins(username, "followers").await
    }

    /// Logins of accounts `username` follows.
    pub async fn following(&self, username: &str) -> Result<BTreeSet<Identifier>, GraphError> {
        self.logins(username, "following").await
    }

    /// `PUT`/`DELETE /user/following/{login}`; raw status back.
    ///
    /// `login` is sent as a single percent-encoded path segment, whatever it
    /// contains. Logins come back from the API and may predate today's naming
    /// rules, so they are not validated here.
    pub async fn set_following(&self, action: Action, login: &str) -> Result<StatusCode, GraphError> {
        let url = self.following_url(login)?;
        let mut opts = self.opts();
        let method = match action {
            Action::Follow => {
                // GitHub wants an explicit zero length on body-less PUTs.
                if let Some(h) = opts.headers.as_mut() {
                    h.insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
                }
                Method::PUT
            }
            Action::Unfollow => Method::DELETE,
        };
        Ok(self
            .http
            .send_status(method, url.as_str(), opts)
            .await?)
    }

    fn following_url(&self, login: &str) -> Result<Url, GraphError> {
        let mut url = self.http.base().clone();
        url.path_segments_mut()
            .map_err(|()| GraphError::Http(HttpError::Url("API base cannot carry a path".into())))?
            .pop_if_empty()
            .extend(["user", "following", login]);
        Ok(url)
    }
}

#[async_trait]
impl FollowGraph for GithubApi {
    async fn relationship_sets(&self, username: &str) -> Result<RelationshipSets, GraphError> {
        let followers = self.followers(username).await?;
        let following = self.following(username).await?;
        Ok(RelationshipSets {
            followers,
            following,
        })
    }

    async fn apply(&self, action: Action, identifier: &str) -> Result<(), ActuationError> {
        match self.set_following(action, identifier).await {
            Ok(StatusCode::NO_CONTENT) => Ok(()),
            Ok(status) => Err(ActuationError::from_status(action, identifier, status)),
            Err(err) => Err(ActuationError::other(action, identifier, err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn following_url_keeps_prefix_and_encodes_login() {
        let api = GithubApi::new("https://ghe.example.com/api/v3", None).unwrap();
        assert_eq!(
            api.following_url("old--timer-").unwrap().as_str(),
            "https://ghe.example.com/api/v3/user/following/old--timer-"
        );
        assert_eq!(
            api.following_url("a/b?c").unwrap().as_str(),
            "https://ghe.example.com/api/v3/user/following/a%2Fb%3Fc"
        );
    }
}
