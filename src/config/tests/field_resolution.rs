//! Tests for token fallbacks and settings derived from the configuration.

use rstest::rstest;

use crate::ArchaeologistConfig;
use crate::error::DigError;

#[rstest]
fn resolve_token_returns_value_when_present() {
    let config = ArchaeologistConfig {
        token: Some("my-token".to_owned()),
        ..Default::default()
    };

    let token = config.resolve_token().expect("token should resolve");

    assert_eq!(token.value(), "my-token");
}

#[rstest]
fn resolve_token_returns_error_when_none() {
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", None::<&str>)]);
    let config = ArchaeologistConfig::default();

    let result = config.resolve_token();

    assert_eq!(result.err(), Some(DigError::MissingToken));
}

#[rstest]
fn resolve_token_rejects_blank_values() {
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", None::<&str>)]);
    let config = ArchaeologistConfig {
        token: Some("   ".to_owned()),
        ..Default::default()
    };

    assert_eq!(config.resolve_token().err(), Some(DigError::MissingToken));
}

#[rstest]
fn resolve_token_falls_back_to_legacy_variable() {
    let _guard = env_lock::lock_env([("GITHUB_TOKEN", Some("legacy-token"))]);
    let config = ArchaeologistConfig::default();

    let token = config.resolve_token().expect("legacy token should resolve");

    assert_eq!(token.value(), "legacy-token");
}

#[rstest]
fn circleci_settings_require_a_token() {
    let _guard = env_lock::lock_env([("CIRCLE_TOKEN", None::<&str>)]);
    let config = ArchaeologistConfig::default();

    assert!(config.circleci_settings().is_none());
}

#[rstest]
fn circleci_settings_use_legacy_token_and_defaults() {
    let _guard = env_lock::lock_env([("CIRCLE_TOKEN", Some("circle-legacy"))]);
    let config = ArchaeologistConfig::default();

    let settings = config
        .circleci_settings()
        .expect("settings should resolve from CIRCLE_TOKEN");

    assert_eq!(settings.token, "circle-legacy");
    assert_eq!(settings.base_url, "https://circleci.com/api");
    assert_eq!(settings.branch, "master");
    assert!(settings.project.is_none());
}

#[rstest]
fn orchestrator_config_carries_report_name_and_retry_budget() {
    let config = ArchaeologistConfig {
        report_check_name: "Types Comparison".to_owned(),
        retry_attempts: 2,
        retry_delay_ms: 500,
        poll_interval_ms: 250,
        allowed_poll_failures: 1,
        ..Default::default()
    };

    let settings = config.orchestrator_config();

    assert_eq!(settings.check_name, "Types Comparison");
    assert_eq!(settings.retry_attempts, 2);
    assert_eq!(settings.retry_delay().as_millis(), 500);
    assert_eq!(settings.poll_policy().interval.as_millis(), 250);
    assert_eq!(settings.poll_policy().allowed_failures, 1);
}

#[rstest]
#[case("0.0.0.0:3000", true)]
#[case("127.0.0.1:8080", true)]
#[case("localhost", false)]
#[case("", false)]
fn listen_addr_parses_socket_addresses(#[case] listen: &str, #[case] valid: bool) {
    let config = ArchaeologistConfig {
        listen: listen.to_owned(),
        ..Default::default()
    };

    assert_eq!(config.listen_addr().is_ok(), valid, "listen = {listen:?}");
}
