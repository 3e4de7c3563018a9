//! Loader for followback configuration with YAML + environment overlays.
//!
//! Sources are merged in order: an optional YAML file (`followback.yaml`),
//! inline YAML (tests), then `FOLLOWBACK__SECTION__KEY` environment
//! variables. String values are finally run through `${VAR}` expansion, so a
//! file can reference `"${GITHUB_TOKEN}"` without ever storing the secret.
//!
//! ```yaml
//! github:
//!   token: "${GITHUB_TOKEN}"
//!   username: "octocat"
//!   api_base: "https://api.github.com"
//!   per_page: 100
//! sync:
//!   delay_ms: 1000
//!   dry_run: false
//! server:
//!   bind: "127.0.0.1:5000"
//! log:
//!   format: "text"
//!   stderr: true
//! ```
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
/// GitHub caps `per_page` at 100.
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FollowbackConfig {
    pub github: GithubSettings,
    pub sync: SyncSettings,
    pub server: ServerSettings,
    pub log: LogSettings,
}

/// Remote API access: where to talk to and as whom.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GithubSettings {
    #[serde(deserialize_with = "lenient_opt_string")]
    pub token: Option<String>,
    /// Default subject account for CLI commands.
    #[serde(deserialize_with = "lenient_opt_string")]
    pub username: Option<String>,
    pub api_base: String,
    pub per_page: u32,
    /// Per-request timeout. Requests are unbounded when unset.
    pub timeout_secs: Option<u64>,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            token: None,
            username: None,
            api_base: DEFAULT_API_BASE.into(),
            per_page: MAX_PER_PAGE,
            timeout_secs: None,
        }
    }
}

impl GithubSettings {
    /// The bearer token, if one is usable.
    ///
    /// Blank values and unresolved `${VAR}` placeholders count as absent.
    ///
    /// ```
    /// use followback_config::GithubSettings;
    ///
    /// let mut gh = GithubSettings::default();
    /// assert_eq!(gh.token(), None);
    /// gh.token = Some("${GITHUB_TOKEN}".into());
    /// assert_eq!(gh.token(), None);
    /// gh.token = Some(" ghp_123 ".into());
    /// assert_eq!(gh.token(), Some("ghp_123"));
    /// ```
    pub fn token(&self) -> Option<&str> {
        usable(self.token.as_deref())
    }

    pub fn username(&self) -> Option<&str> {
        usable(self.username.as_deref())
    }

    /// `per_page` clamped to what the API accepts.
    pub fn page_size(&self) -> u32 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Pacing and behavior of the follow/unfollow automation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Fixed pause between consecutive mutating requests.
    pub delay_ms: u64,
    pub dry_run: bool,
    /// Follow accounts that follow us but we don't follow.
    pub follow: bool,
    /// Unfollow accounts that don't follow us back.
    pub unfollow: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            delay_ms: 1000,
            dry_run: false,
            follow: true,
            unfollow: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `text` or `json`; text when unset.
    pub format: Option<String>,
    pub dir: Option<PathBuf>,
    pub stderr: bool,
}

fn usable(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty() && !s.contains("${"))
}

// Env overlays with `try_parsing` turn "1234" into a number; logins and
// tokens must stay strings.
fn lenient_opt_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
        Bool(bool),
    }

    Ok(Option::<Raw>::deserialize(d)?.map(|raw| match raw {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
        Raw::Bool(b) => b.to_string(),
    }))
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct FollowbackConfigLoader {
    files: Vec<(PathBuf, bool)>,
    inline: Vec<String>,
}

impl Default for FollowbackConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FollowbackConfigLoader {
    /// Start with defaults: no files, `FOLLOWBACK__` env overrides on top.
    ///
    /// ```
    /// use followback_config::FollowbackConfigLoader;
    ///
    /// let config = FollowbackConfigLoader::new()
    ///     .with_yaml_str("github:\n  username: octocat\nsync:\n  delay_ms: 250")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.github.username(), Some("octocat"));
    /// assert_eq!(config.github.api_base, "https://api.github.com");
    /// assert_eq!(config.sync.delay_ms, 250);
    /// ```
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            inline: Vec::new(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; format inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push((path.as_ref().to_path_buf(), true));
        self
    }

    /// Attach a file that is merged only when present, so env-only
    /// deployments need no file at all.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push((path.as_ref().to_path_buf(), false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.inline.push(yaml.to_string());
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// ```
    /// use followback_config::FollowbackConfigLoader;
    ///
    /// unsafe { std::env::set_var("FB_DOCTEST_TOKEN", "injected-from-env"); }
    ///
    /// let config = FollowbackConfigLoader::new()
    ///     .with_yaml_str("github:\n  token: \"${FB_DOCTEST_TOKEN}\"")
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.github.token(), Some("injected-from-env"));
    ///
    /// unsafe { std::env::remove_var("FB_DOCTEST_TOKEN"); }
    /// ```
    pub fn load(self) -> Result<FollowbackConfig, ConfigError> {
        let mut builder = Config::builder();
        for (path, required) in &self.files {
            builder = builder.add_source(File::from(path.as_path()).required(*required));
        }
        for yaml in &self.inline {
            builder = builder.add_source(File::from_str(yaml, config::FileFormat::Yaml));
        }
        // Env last so it wins over files.
        builder = builder.add_source(
            Environment::with_prefix("FOLLOWBACK")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
