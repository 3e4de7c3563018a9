use followback_config::FollowbackConfigLoader;
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

const FILE_YAML: &str = r#"
github:
  token: "${FB_TEST_GITHUB_TOKEN}"
  username: octocat
  per_page: 50
sync:
  delay_ms: 2000
  dry_run: true
server:
  bind: "0.0.0.0:8080"
"#;

#[test]
#[serial]
fn loads_file_and_expands_secrets() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "followback.yaml", FILE_YAML);

    let config = temp_env::with_var("FB_TEST_GITHUB_TOKEN", Some("ghp_from_env"), || {
        FollowbackConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load config")
    });

    assert_eq!(config.github.token(), Some("ghp_from_env"));
    assert_eq!(config.github.username(), Some("octocat"));
    assert_eq!(config.github.page_size(), 50);
    assert_eq!(config.sync.delay_ms, 2000);
    assert!(config.sync.dry_run);
    assert_eq!(config.server.bind, "0.0.0.0:8080");
}

#[test]
#[serial]
fn unresolved_token_counts_as_missing() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "followback.yaml", FILE_YAML);

    let config = temp_env::with_var_unset("FB_TEST_GITHUB_TOKEN", || {
        FollowbackConfigLoader::new().with_file(&p).load().unwrap()
    });

    assert_eq!(config.github.token(), None);
}

#[test]
#[serial]
fn environment_overrides_file() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "followback.yaml", FILE_YAML);

    let config = temp_env::with_vars(
        [
            ("FOLLOWBACK__SYNC__DELAY_MS", Some("250")),
            ("FOLLOWBACK__GITHUB__USERNAME", Some("hubot")),
        ],
        || FollowbackConfigLoader::new().with_file(&p).load().unwrap(),
    );

    assert_eq!(config.sync.delay_ms, 250);
    assert_eq!(config.github.username(), Some("hubot"));
    assert_eq!(config.github.page_size(), 50);
}

#[test]
#[serial]
fn optional_file_may_be_absent() {
    let tmp = TempDir::new().unwrap();
    let config = FollowbackConfigLoader::new()
        .with_optional_file(tmp.path().join("nope.yaml"))
        .load()
        .expect("missing optional file is fine");
    assert_eq!(config.server.bind, "127.0.0.1:5000");
}

#[test]
#[serial]
fn required_file_must_exist() {
    let tmp = TempDir::new().unwrap();
    let result = FollowbackConfigLoader::new()
        .with_file(tmp.path().join("nope.yaml"))
        .load();
    assert!(result.is_err());
}
