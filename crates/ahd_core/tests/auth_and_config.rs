use std::cell::Cell;
use std::fs;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::tempdir;

use ahd_core::auth::{classify_app_error, AuthErrorKind, AuthSession};
use ahd_core::config::{load_config, AppConfig, SourceKind};
use ahd_core::error::AppError;
use ahd_core::ingest::health_event::{RawAffectedEntity, RawHealthEvent};
use ahd_core::source::{AppPublicSettings, EventDetail, EventQuery, EventSource, User};

/// Source whose settings and user lookups fail on demand.
struct ScriptedSource {
    settings_error: Option<AppError>,
    me_error: Option<AppError>,
    me_calls: Cell<usize>,
}

impl ScriptedSource {
    fn ok() -> Self {
        Self {
            settings_error: None,
            me_error: None,
            me_calls: Cell::new(0),
        }
    }
}

impl EventSource for ScriptedSource {
    fn get_events(&self, _query: &EventQuery) -> Result<Vec<RawHealthEvent>, AppError> {
        Ok(Vec::new())
    }

    fn get_event_details(&self, _arns: &[String]) -> Result<Vec<EventDetail>, AppError> {
        Ok(Vec::new())
    }

    fn get_affected_entities(&self, _arn: &str) -> Result<Vec<RawAffectedEntity>, AppError> {
        Ok(Vec::new())
    }

    fn me(&self) -> Result<User, AppError> {
        self.me_calls.set(self.me_calls.get() + 1);
        match &self.me_error {
            Some(err) => Err(err.clone()),
            None => Ok(User {
                id: "u-1".to_string(),
                name: "Ops".to_string(),
                email: "ops@example.com".to_string(),
            }),
        }
    }

    fn public_settings(&self) -> Result<AppPublicSettings, AppError> {
        match &self.settings_error {
            Some(err) => Err(err.clone()),
            None => Ok(AppPublicSettings {
                requires_auth: true,
                ..Default::default()
            }),
        }
    }
}

#[test]
fn forbidden_reasons_map_to_auth_kinds() {
    let forbidden = |reason: &str| {
        AppError::new("AUTH_FORBIDDEN", "Forbidden").with_details(format!("reason={reason}"))
    };
    assert_eq!(
        classify_app_error(&forbidden("auth_required")).kind,
        AuthErrorKind::AuthRequired
    );
    assert_eq!(
        classify_app_error(&forbidden("user_not_registered")).kind,
        AuthErrorKind::UserNotRegistered
    );
    assert_eq!(
        classify_app_error(&forbidden("tenant_suspended")).kind,
        AuthErrorKind::Other("tenant_suspended".to_string())
    );
    assert_eq!(
        classify_app_error(&AppError::new("AUTH_FORBIDDEN", "Forbidden")).kind,
        AuthErrorKind::Unknown
    );

    let generic = classify_app_error(&AppError::new("SOURCE_UNREACHABLE", ""));
    assert_eq!(generic.kind, AuthErrorKind::Unknown);
    assert_eq!(generic.message, "Failed to load app");
}

#[test]
fn session_authenticates_with_token() {
    let source = ScriptedSource::ok();
    let session = AuthSession::check_app_state(&source, Some("token-abc"));
    assert!(session.is_authenticated);
    assert_eq!(session.user.as_ref().map(|u| u.id.as_str()), Some("u-1"));
    assert_eq!(session.auth_error, None);
    assert_eq!(session.public_settings.map(|s| s.requires_auth), Some(true));
}

#[test]
fn session_without_token_skips_user_lookup() {
    let source = ScriptedSource::ok();
    let session = AuthSession::check_app_state(&source, Some("   "));
    assert!(!session.is_authenticated);
    assert_eq!(session.auth_error, None);
    assert_eq!(source.me_calls.get(), 0);
}

#[test]
fn rejected_token_requires_auth_but_other_failures_do_not() {
    let mut source = ScriptedSource::ok();
    source.me_error = Some(AppError::new("AUTH_UNAUTHORIZED", "Unauthorized"));
    let session = AuthSession::check_app_state(&source, Some("expired"));
    assert!(!session.is_authenticated);
    assert_eq!(
        session.auth_error.map(|e| e.kind),
        Some(AuthErrorKind::AuthRequired)
    );

    source.me_error = Some(AppError::new("SOURCE_UNREACHABLE", "connection refused"));
    let session = AuthSession::check_app_state(&source, Some("token"));
    assert!(!session.is_authenticated);
    assert_eq!(session.auth_error, None);
}

#[test]
fn settings_failure_is_classified_and_stops_the_check() {
    let mut source = ScriptedSource::ok();
    source.settings_error = Some(
        AppError::new("AUTH_FORBIDDEN", "Forbidden").with_details("reason=user_not_registered"),
    );
    let session = AuthSession::check_app_state(&source, Some("token"));
    assert_eq!(
        session.auth_error.as_ref().map(|e| e.kind.clone()),
        Some(AuthErrorKind::UserNotRegistered)
    );
    assert_eq!(session.public_settings, None);
    assert_eq!(source.me_calls.get(), 0);
}

#[test]
fn logout_clears_user() {
    let mut session = AuthSession::check_app_state(&ScriptedSource::ok(), Some("token"));
    session.logout();
    assert!(!session.is_authenticated);
    assert_eq!(session.user, None);
}

#[test]
fn toml_file_overrides_defaults() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("ahd.toml");
    fs::write(
        &path,
        r#"
source = "file"
snapshot_path = "/var/lib/ahd/events.json"
region = "eu-west-1"
poll_interval_secs = 15
"#,
    )
    .expect("write config");

    let config = load_config(Some(path.as_path())).expect("load");
    assert_eq!(config.source, SourceKind::File);
    assert_eq!(config.region.as_deref(), Some("eu-west-1"));
    assert_eq!(config.poll_interval(), Duration::from_secs(15));
    assert_eq!(config.max_results, 100);
}

#[test]
fn missing_config_file_is_reported() {
    let dir = tempdir().expect("tempdir");
    let err = load_config(Some(dir.path().join("nope.toml").as_path())).expect_err("missing");
    assert_eq!(err.code, "CONFIG_NOT_FOUND");
    assert!(err.detail("path").is_some());
}

#[test]
fn invalid_combinations_are_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("ahd.toml");
    fs::write(&path, "source = \"http\"\n").expect("write config");
    assert_eq!(load_config(Some(path.as_path())).expect_err("http").code, "CONFIG_INVALID");

    fs::write(&path, "poll_interval_secs = \"soon\"\n").expect("write config");
    assert_eq!(load_config(Some(path.as_path())).expect_err("type").code, "CONFIG_INVALID");

    let zero = AppConfig {
        max_results: 0,
        ..Default::default()
    };
    assert_eq!(zero.validate().expect_err("zero").code, "CONFIG_INVALID");
    assert!(AppConfig::default().validate().is_ok());
}
