//! Tests for configuration loading: file, environment and validation

use std::io::Write;

use newsgrab::config::{Config, Readiness, MAX_BATCH};
use newsgrab::models::UserAgentPolicy;
use serial_test::serial;
use tempfile::NamedTempFile;

const ENV_VARS: &[&str] = &[
    "NEWSGRAB_ARTICLE_LIMIT",
    "NEWSGRAB_MAX_RETRIES",
    "NEWSGRAB_PER_HOST_INTERVAL_MS",
    "NEWSGRAB_REQUEST_TIMEOUT_MS",
    "NEWSGRAB_CONCURRENCY",
    "NEWSGRAB_USER_AGENT",
    "NEWSGRAB_MAX_RPS",
    "NEWSGRAB_DATA_DIR",
    "NEWSGRAB_WEBHOOK_URL",
    "NEWSGRAB_WEBHOOK_TOKEN",
    "NEWSGRAB_LOG_LEVEL",
    "NEWSGRAB_LOG_FORMAT",
];

fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_partial_file_keeps_defaults() {
    let file = write_config(
        r#"
[engine]
article_limit = 12
per_host_min_interval_ms = 500
"#,
    );

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.engine.article_limit, 12);
    assert_eq!(config.engine.per_host_min_interval_ms, 500);
    assert_eq!(config.engine.max_retries, 3);
    assert_eq!(config.engine.request_timeout_ms, 30_000);
    assert_eq!(config.http.user_agent, UserAgentPolicy::Rotate);
    assert_eq!(config.sources.urls.len(), 3);
    assert!(config.validate().is_ok());
}

#[test]
fn test_full_file() {
    let file = write_config(
        r#"
[engine]
article_limit = 5
max_retries = 1
concurrency = 8
summary_max_len = 280
ascii_only = true

[retry]
base_delay_ms = 250
max_delay_ms = 4000

[http]
user_agent = { mode = "fixed", value = "newsgrab/0.1" }
max_requests_per_second = 10

[classifier]
dynamic_hosts = ["spa.example.com"]
static_hosts = ["blog.example.com"]

[render]
readiness = { kind = "selector", selector = "article h2" }

[sources]
urls = ["https://a.example/feed", "https://b.example/news"]

[output]
data_dir = "/tmp/newsgrab"
webhook_url = "https://script.example.com/exec"

[logging]
level = "debug"
format = "json"
"#,
    );

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.engine.article_limit, 5);
    assert_eq!(config.engine.concurrency, 8);
    assert!(config.engine.ascii_only);
    assert_eq!(config.retry.base_delay_ms, 250);
    assert_eq!(
        config.http.user_agent,
        UserAgentPolicy::Fixed("newsgrab/0.1".to_string())
    );
    assert_eq!(config.http.max_requests_per_second, Some(10));
    assert_eq!(config.classifier.dynamic_hosts, vec!["spa.example.com"]);
    assert_eq!(
        config.render.readiness,
        Readiness::Selector("article h2".to_string())
    );
    assert_eq!(config.sources.urls.len(), 2);
    assert_eq!(
        config.output.webhook_url.as_deref(),
        Some("https://script.example.com/exec")
    );
    assert_eq!(config.logging.format, "json");
    assert!(config.validate().is_ok());

    let policy = config.retry_policy();
    assert_eq!(policy.max_retries, 1);
    assert_eq!(policy.max_attempts(), 2);

    let extraction = config.extraction_config();
    assert_eq!(extraction.article_limit, 5);
    assert_eq!(extraction.max_retries, 1);
}

#[test]
fn test_example_file_matches_defaults() {
    let config = Config::from_file(std::path::Path::new("config.example.toml")).unwrap();
    let defaults = Config::default();

    assert!(config.validate().is_ok());
    assert_eq!(config.engine.article_limit, defaults.engine.article_limit);
    assert_eq!(config.retry, defaults.retry);
    assert_eq!(config.http.user_agent, UserAgentPolicy::Rotate);
    assert_eq!(config.render.readiness, Readiness::NetworkIdle);
    assert_eq!(config.classifier.dynamic_markers, defaults.classifier.dynamic_markers);
    assert_eq!(config.sources.urls, defaults.sources.urls);
}

#[test]
fn test_malformed_file_is_an_error() {
    let file = write_config("[engine\narticle_limit = ");
    assert!(Config::from_file(file.path()).is_err());
}

#[test]
fn test_wrong_type_is_an_error() {
    let file = write_config("[engine]\narticle_limit = \"many\"\n");
    assert!(Config::from_file(file.path()).is_err());
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::from_file(&dir.path().join("absent.toml")).is_err());
}

#[test]
fn test_invalid_values_rejected() {
    let mut config = Config::default();
    config.engine.article_limit = MAX_BATCH + 1;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.engine.concurrency = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.engine.request_timeout_ms = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.http.user_agent = UserAgentPolicy::Fixed("   ".to_string());
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.render.readiness = Readiness::Selector("div[".to_string());
    assert!(config.validate().is_err());
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let file = write_config("[engine]\narticle_limit = 12\nmax_retries = 5\n");

    std::env::set_var("NEWSGRAB_ARTICLE_LIMIT", "3");
    std::env::set_var("NEWSGRAB_USER_AGENT", "env-agent/2.0");
    std::env::set_var("NEWSGRAB_DATA_DIR", "/var/lib/newsgrab");

    let config = Config::load(Some(file.path())).unwrap();
    clear_env();

    assert_eq!(config.engine.article_limit, 3);
    assert_eq!(config.engine.max_retries, 5);
    assert_eq!(
        config.http.user_agent,
        UserAgentPolicy::Fixed("env-agent/2.0".to_string())
    );
    assert_eq!(
        config.output.data_dir,
        std::path::PathBuf::from("/var/lib/newsgrab")
    );
}

#[test]
#[serial]
fn test_unparsable_env_value_is_ignored() {
    clear_env();
    std::env::set_var("NEWSGRAB_CONCURRENCY", "lots");
    std::env::set_var("NEWSGRAB_MAX_RETRIES", "0");

    let config = Config::from_env().unwrap();
    clear_env();

    assert_eq!(config.engine.concurrency, 4);
    assert_eq!(config.engine.max_retries, 0);
}

#[test]
#[serial]
fn test_load_without_file_uses_defaults() {
    clear_env();
    let config = Config::load(None).unwrap();

    assert_eq!(config.engine.article_limit, 8);
    assert_eq!(config.engine.per_host_min_interval_ms, 2000);
    assert_eq!(config.logging.level, "info");
    assert!(config.output.webhook_url.is_none());
}
