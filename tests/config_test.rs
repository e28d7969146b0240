//! Configuration loading tests

use authflow::config::{Config, ConfigError, ConfigLoader};
use serial_test::serial;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

#[test]
fn test_parse_full_config_from_yaml() {
    let yaml = r#"
target:
  base_url: "https://auth.example.com"
  timeout_seconds: 10

preflight:
  timeout_seconds: 3
  accepted_statuses: [200, 400]

run:
  step_delay_millis: 250

credentials:
  username_prefix: "ci_"
  initial_password: "first-secret"
  new_password: "second-secret"
  email_domain: "ci.example.com"
  rename_prefix: "renamed_"

metrics:
  enabled: true
  output: "/tmp/authflow.prom"
"#;

    let file = write_config(yaml);
    let config = Config::load(file.path()).unwrap();

    assert_eq!(config.target.base_url, "https://auth.example.com");
    assert_eq!(config.target.timeout_seconds, 10);
    assert_eq!(config.preflight.accepted_statuses, vec![200, 400]);
    assert_eq!(config.run.step_delay_millis, 250);
    assert_eq!(config.credentials.username_prefix, "ci_");
    assert_eq!(config.credentials.new_password, "second-secret");
    assert_eq!(config.credentials.rename_prefix, "renamed_");
    assert!(config.metrics.enabled);
}

#[test]
fn test_empty_file_yields_defaults() {
    let file = write_config("");
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.target.base_url, "http://localhost:8080");
    assert_eq!(config.run.step_delay_millis, 1000);
    assert!(!config.metrics.enabled);
}

#[test]
fn test_load_or_default_without_path() {
    let config = ConfigLoader::load_or_default::<&str>(None).unwrap();
    assert_eq!(config.credentials.initial_password, "senha123");
}

#[test]
fn test_malformed_yaml() {
    let file = write_config("target: [unclosed");
    assert!(matches!(
        Config::load(file.path()),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn test_zero_timeout_rejected() {
    let file = write_config("target:\n  timeout_seconds: 0\n");
    assert!(matches!(
        Config::load(file.path()),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
#[serial]
fn test_env_expansion_in_file() {
    std::env::set_var("AUTHFLOW_TEST_BASE_URL", "http://auth.test:9000");
    let file = write_config("target:\n  base_url: \"${AUTHFLOW_TEST_BASE_URL}\"\n");
    let config = Config::load(file.path()).unwrap();
    std::env::remove_var("AUTHFLOW_TEST_BASE_URL");

    assert_eq!(config.target.base_url, "http://auth.test:9000");
}

#[test]
#[serial]
fn test_env_expansion_default_value() {
    std::env::remove_var("AUTHFLOW_TEST_PASSWORD");
    let yaml = "credentials:\n  initial_password: \"${AUTHFLOW_TEST_PASSWORD:-fallback-pass}\"\n";
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.credentials.initial_password, "fallback-pass");
}
