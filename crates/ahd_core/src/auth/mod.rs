use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AppError;
use crate::source::{AppPublicSettings, EventSource, User};

pub const CODE_AUTH_REQUIRED: &str = "AUTH_REQUIRED";
pub const CODE_USER_NOT_REGISTERED: &str = "AUTH_USER_NOT_REGISTERED";
/// 403 with an application-specific `reason=<x>` in details.
pub const CODE_AUTH_FORBIDDEN: &str = "AUTH_FORBIDDEN";
/// 401 returned by the user lookup.
pub const CODE_AUTH_UNAUTHORIZED: &str = "AUTH_UNAUTHORIZED";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type", content = "reason")]
pub enum AuthErrorKind {
    AuthRequired,
    UserNotRegistered,
    Other(String),
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthError {
    pub kind: AuthErrorKind,
    pub message: String,
}

impl AuthError {
    pub fn auth_required() -> Self {
        Self {
            kind: AuthErrorKind::AuthRequired,
            message: "Authentication required".to_string(),
        }
    }
}

/// Map an app-state failure onto the auth categories the shell reacts to.
pub fn classify_app_error(err: &AppError) -> AuthError {
    match err.code.as_str() {
        CODE_AUTH_REQUIRED => AuthError::auth_required(),
        CODE_USER_NOT_REGISTERED => AuthError {
            kind: AuthErrorKind::UserNotRegistered,
            message: "User not registered for this app".to_string(),
        },
        CODE_AUTH_FORBIDDEN => match err.detail("reason") {
            Some("auth_required") => AuthError::auth_required(),
            Some("user_not_registered") => AuthError {
                kind: AuthErrorKind::UserNotRegistered,
                message: "User not registered for this app".to_string(),
            },
            Some(reason) => AuthError {
                kind: AuthErrorKind::Other(reason.to_string()),
                message: err.message.clone(),
            },
            None => AuthError {
                kind: AuthErrorKind::Unknown,
                message: err.message.clone(),
            },
        },
        _ => AuthError {
            kind: AuthErrorKind::Unknown,
            message: if err.message.is_empty() {
                "Failed to load app".to_string()
            } else {
                err.message.clone()
            },
        },
    }
}

/// True for failures of the user lookup that mean the token is missing or expired.
fn is_credential_failure(err: &AppError) -> bool {
    matches!(
        err.code.as_str(),
        CODE_AUTH_REQUIRED | CODE_AUTH_UNAUTHORIZED | CODE_AUTH_FORBIDDEN | CODE_USER_NOT_REGISTERED
    )
}

/// Authentication state for one shell session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthSession {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub auth_error: Option<AuthError>,
    pub public_settings: Option<AppPublicSettings>,
}

impl AuthSession {
    /// Load public settings, then resolve the current user when a token is present.
    ///
    /// - Settings failure: `auth_error` is set from `classify_app_error`.
    /// - User lookup rejected as unauthenticated: `auth_error` is `AuthRequired`.
    /// - Any other user lookup failure leaves the session signed out without an error.
    pub fn check_app_state<S: EventSource + ?Sized>(source: &S, token: Option<&str>) -> Self {
        let mut session = Self::default();

        let settings = match source.public_settings() {
            Ok(s) => s,
            Err(err) => {
                warn!(error = %err, "app state check failed");
                session.auth_error = Some(classify_app_error(&err));
                return session;
            }
        };
        session.public_settings = Some(settings);

        if token.map(str::trim).filter(|t| !t.is_empty()).is_none() {
            return session;
        }

        match source.me() {
            Ok(user) => {
                info!(user = %user.id, "user authenticated");
                session.user = Some(user);
                session.is_authenticated = true;
            }
            Err(err) => {
                warn!(error = %err, "user auth check failed");
                if is_credential_failure(&err) {
                    session.auth_error = Some(AuthError::auth_required());
                }
            }
        }
        session
    }

    pub fn logout(&mut self) {
        self.user = None;
        self.is_authenticated = false;
    }
}
