//! Minimal HTTP client with safe logging, `Link` pagination, and bearer auth.
//!
//! - Request options: headers, `Auth`, query params, timeout
//! - Never logs secret values; `Authorization` is always redacted
//! - Paged GETs surface the RFC 5988 `rel="next"` link alongside the body
//! - Status-only requests for mutations whose body is irrelevant (PUT/DELETE)
//! - Optional *raw* request/response logging via `FOLLOWBACK_HTTP_RAW=1`
//!
//! There is no retry loop: a failed request is reported to the
//! caller exactly once.
//!
//! Example (no_run):
//! ```no_run
//! # async fn demo() -> Result<(), followback_http::HttpError> {
//! let client = followback_http::HttpClient::new("https://api.github.com")?;
//! let page: followback_http::Page<serde_json::Value> = client
//!     .get_page("users/octocat/followers", followback_http::RequestOpts::default())
//!     .await?;
//! println!("next page: {:?}", page.next);
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, body snippets (truncated), final errors, and (optionally)
//! raw request/response lines (target `http.raw`).

use reqwest::header::{HeaderMap, HeaderValue, LINK, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::env;
use std::time::Duration;
use thiserror::Error;

pub use reqwest::{Method, StatusCode, Url, header};

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "FOLLOWBACK_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)

const DEFAULT_USER_AGENT: &str = concat!("followback/", env!("CARGO_PKG_VERSION"));

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, val) in redact_headers(headers) {
        parts.push(format!("-H '{}: {}'", name, val.replace('\'', r"'\''")));
    }
    parts.push(format!("'{}'", url.as_str()));
    parts.join(" ")
}

/// Redact sensitive headers for logging
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let mut val = v.to_str().unwrap_or("").to_string();
            if key.eq_ignore_ascii_case("authorization") {
                val = "Bearer <redacted>".into();
            }
            (key, val)
        })
        .collect()
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("{url} returned {status}: {message}, request_id={request_id}")]
    Api {
        url: Url,
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

// ==============================
// Auth & Request Options
// ==============================

/// Authentication strategies supported by the HTTP client helpers.
///
/// ```
/// use followback_http::Auth;
///
/// let bearer = Auth::Bearer("token");
/// match bearer {
///     Auth::Bearer(value) => assert_eq!(value, "token"),
///     Auth::None => unreachable!(),
/// }
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
    None,
}

impl<'a> Auth<'a> {
    /// Bearer auth when a token is present, anonymous otherwise.
    pub fn bearer_opt(token: Option<&'a str>) -> Self {
        token.map_or(Auth::None, Auth::Bearer)
    }
}

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use followback_http::{Auth, RequestOpts};
/// use std::borrow::Cow;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     auth: Some(Auth::Bearer("demo")),
///     query: Some(vec![("per_page", Cow::Borrowed("100"))]),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert!(!opts.allow_absolute);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>, // e.g. [("per_page", "100".into())]
    /// If true and `path` is an absolute URL, use it as-is (ignore base).
    pub allow_absolute: bool,
}

/// One decoded page of a paginated collection.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// The URL that was actually requested (query included).
    pub url: Url,
    pub items: T,
    /// Resolved `rel="next"` target, if the server advertised one.
    pub next: Option<Url>,
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    /// Per-request timeout; `None` leaves requests unbounded apart from the
    /// connect timeout.
    pub default_timeout: Option<Duration>,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use followback_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.github.com")?;
    /// assert_eq!(client.default_timeout, None);
    ///
    /// let bounded = client.with_timeout(Duration::from_secs(30));
    /// assert_eq!(bounded.default_timeout, Some(Duration::from_secs(30)));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: None,
        })
    }

    /// Bound every request that does not set its own timeout.
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = Some(dur);
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve `path` against the base URL (or take it verbatim when absolute
    /// URLs are allowed and `path` is one).
    pub fn resolve(&self, path: &str, allow_absolute: bool) -> Result<Url, HttpError> {
        if allow_absolute {
            if let Ok(abs) = Url::parse(path) {
                return Ok(abs);
            }
        }
        self.base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    /// GET one page of a collection, decoding the body and the `Link` header.
    ///
    /// Any non-success status is returned as [`HttpError::Api`].
    pub async fn get_page<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<Page<T>, HttpError>
    where
        T: DeserializeOwned,
    {
        let sent = self.execute(Method::GET, path, &opts).await?;
        let snippet = snip_body(&sent.body);

        if !sent.status.is_success() {
            return Err(api_error(&sent, snippet));
        }

        let next = next_link(&sent.headers, &sent.url);
        tracing::debug!(
            req_id=%sent.req_id,
            url=%sent.url,
            next=?next.as_ref().map(Url::as_str),
            "http.response.page"
        );

        let items = serde_json::from_slice::<T>(&sent.body).map_err(|e| {
            tracing::warn!(
                req_id=%sent.req_id,
                serde_line=%e.line(),
                serde_col=%e.column(),
                serde_err=%e.to_string(),
                body_snippet=%snippet,
                "http.response.decode_error"
            );
            HttpError::Decode(e.to_string(), snippet.clone())
        })?;

        Ok(Page {
            url: sent.url,
            items,
            next,
        })
    }

    /// Send a body-less request and hand back the raw status.
    ///
    /// Non-success statuses are *not* errors here; callers decide what counts
    /// as success (e.g. `204 No Content` for follow/unfollow).
    pub async fn send_status(
        &self,
        method: Method,
        path: &str,
        opts: RequestOpts<'_>,
    ) -> Result<StatusCode, HttpError> {
        let sent = self.execute(method, path, &opts).await?;
        if !sent.status.is_success() {
            tracing::warn!(
                req_id=%sent.req_id,
                status=%sent.status,
                message=%extract_error_message(&sent.body),
                "http.error"
            );
        }
        Ok(sent.status)
    }

    // ==============================
    // Core request implementation
    // ==============================

    async fn execute(
        &self,
        method: Method,
        path: &str,
        opts: &RequestOpts<'_>,
    ) -> Result<Sent, HttpError> {
        let mut url = self.resolve(path, opts.allow_absolute)?;
        if let Some(q) = &opts.query {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in q {
                pairs.append_pair(k, v);
            }
        }

        let mut headers = opts.headers.clone().unwrap_or_default();
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));

        let timeout = opts.timeout.or(self.default_timeout);
        let mut rb = self
            .inner
            .request(method.clone(), url.clone())
            .headers(headers.clone());
        if let Some(timeout) = timeout {
            rb = rb.timeout(timeout);
        }

        let auth_kind = match &opts.auth {
            Some(Auth::Bearer(tok)) => {
                let tok = sanitize_api_key(tok)?;
                rb = rb.bearer_auth(tok);
                "bearer"
            }
            Some(Auth::None) | None => "none",
        };

        // Lightweight request id without extra deps
        let req_id = format!(
            "r{:x}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );

        let (host_path, redacted_q) = redact_query(&url);
        tracing::debug!(
            req_id=%req_id,
            method=%method,
            host_path=%host_path,
            query=?redacted_q,
            timeout_ms=?timeout.map(|t| t.as_millis() as u64),
            auth_kind,
            "http.request.start"
        );

        if raw_enabled() {
            let curl = make_curl(&method, &url, &headers);
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        let t0 = std::time::Instant::now();
        let resp = rb.send().await.map_err(|err| {
            let message = err.to_string();
            tracing::warn!(req_id=%req_id, message=%message, "http.network_error.send");
            HttpError::Network(message)
        })?;
        let status = resp.status();
        let resp_headers = resp.headers().clone();
        let body = resp.bytes().await.map_err(|err| {
            let message = err.to_string();
            tracing::warn!(req_id=%req_id, message=%message, "http.network_error.body");
            HttpError::Network(message)
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        let request_id = resp_headers
            .get("x-github-request-id")
            .or_else(|| resp_headers.get("x-request-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();
        let header_str = |name: &str| {
            resp_headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=content_len(&resp_headers, body.len()),
            x_request_id=%request_id,
            rate_limit.limit=?header_str("x-ratelimit-limit"),
            rate_limit.remaining=?header_str("x-ratelimit-remaining"),
            rate_limit.reset=?header_str("x-ratelimit-reset"),
            "http.response.headers"
        );

        if raw_enabled() {
            let hdrs = redact_headers(&resp_headers);
            let truncated = body.len() > RAW_MAX_BODY;
            let text = String::from_utf8_lossy(&body[..body.len().min(RAW_MAX_BODY)]);
            tracing::info!(
                target:"http.raw",
                %req_id,
                status=%status,
                duration_ms=dur_ms,
                headers=?hdrs,
                body=%text,
                truncated
            );
        }

        tracing::trace!(
            req_id=%req_id,
            body_snippet=%snip_body(&body),
            "http.response.body_snippet"
        );

        Ok(Sent {
            req_id,
            url,
            status,
            headers: resp_headers,
            body: body.to_vec(),
            request_id,
        })
    }
}

struct Sent {
    req_id: String,
    url: Url,
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    request_id: String,
}

fn api_error(sent: &Sent, snippet: String) -> HttpError {
    let message = extract_error_message(&sent.body);
    tracing::warn!(
        req_id=%sent.req_id,
        status=%sent.status,
        message=%message,
        x_request_id=%sent.request_id,
        body_snippet=%snippet,
        "http.error"
    );
    HttpError::Api {
        url: sent.url.clone(),
        status: sent.status,
        message,
        request_id: sent.request_id.clone(),
    }
}

// ==============================
// Link header (RFC 5988)
// ==============================

/// Find the target of the first link whose `rel` list contains `rel`.
///
/// ```
/// let header = r#"<https://api.github.com/user/1/followers?page=2>; rel="next", <https://api.github.com/user/1/followers?page=5>; rel="last""#;
/// assert_eq!(
///     followback_http::find_link(header, "next"),
///     Some("https://api.github.com/user/1/followers?page=2")
/// );
/// assert_eq!(followback_http::find_link(header, "prev"), None);
/// ```
pub fn find_link<'a>(value: &'a str, rel: &str) -> Option<&'a str> {
    let mut rest = value;
    while let Some(start) = rest.find('<') {
        let after = &rest[start + 1..];
        let end = after.find('>')?;
        let target = after[..end].trim();
        let tail = &after[end + 1..];
        let params_end = tail.find('<').unwrap_or(tail.len());

        let matched = tail[..params_end]
            .split(';')
            .filter_map(|param| {
                let (key, val) = param.split_once('=')?;
                key.trim()
                    .eq_ignore_ascii_case("rel")
                    .then(|| val.trim().trim_end_matches(',').trim().trim_matches('"'))
            })
            .any(|rels| {
                rels.split_ascii_whitespace()
                    .any(|r| r.eq_ignore_ascii_case(rel))
            });
        if matched {
            return Some(target);
        }
        rest = &tail[params_end..];
    }
    None
}

/// Resolve the `rel="next"` link of a response against the URL it came from.
pub fn next_link(headers: &HeaderMap, current: &Url) -> Option<Url> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| find_link(v, "next"))
        .and_then(|target| current.join(target).ok())
}

// ==============================
// Helpers
// ==============================

fn extract_error_message(body: &[u8]) -> String {
    // GitHub style: {"message":"Not Found","documentation_url":"..."}
    // Generic: {"detail":"..."} or {"error":"..."}
    #[derive(Deserialize)]
    struct Msg {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(m) = serde_json::from_slice::<Msg>(body) {
        if !m.message.is_empty() {
            return m.message;
        }
        if !m.detail.is_empty() {
            return m.detail;
        }
        if !m.error.is_empty() {
            return m.error;
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > 500 {
        let mut cut = 500;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}

fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    // 1) Trim outer spaces/quotes
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();

    // 2) Remove *all* ASCII whitespace (spaces, tabs, newlines, carriage returns)
    s.retain(|ch| !ch.is_ascii_whitespace());

    // 3) Ensure ASCII and no control chars
    if !s.is_ascii() {
        return Err(HttpError::Build("API key contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "API key contains control characters".into(),
        ));
    }

    // 4) Validate header value upfront for clear errors
    HeaderValue::from_str(&format!("Bearer {}", s))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}

fn redact_query(url: &Url) -> (String, Vec<(String, String)>) {
    // Return "host + path" string and redacted query list for logging
    let host_path = format!("{}{}", url.host_str().unwrap_or("-"), url.path());
    let redacted = url
        .query_pairs()
        .map(|(k, v)| {
            let k = k.to_string();
            let v = v.to_string();
            let is_secret = matches!(
                k.to_ascii_lowercase().as_str(),
                "access_token"
                    | "authorization"
                    | "auth"
                    | "key"
                    | "api_key"
                    | "token"
                    | "secret"
                    | "client_secret"
                    | "bearer"
            );
            (k, if is_secret { "<redacted>".into() } else { v })
        })
        .collect::<Vec<_>>();
    (host_path, redacted)
}

fn content_len(headers: &HeaderMap, body_len: usize) -> usize {
    headers
        .get(reqwest::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(body_len)
}
