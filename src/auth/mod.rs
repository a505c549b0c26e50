//! Admin authentication.
//!
//! Credentials are checked with constant-time comparison to mitigate timing
//! attacks; a successful login issues an opaque bearer token held in an
//! in-memory session store with idle expiry.

use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use moka::future::Cache;
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::errors::{codes, ErrorDetails, ErrorResponse};
use crate::models::User;
use crate::AppState;

/// Sessions expire after this long without use.
const SESSION_IDLE_EXPIRY: Duration = Duration::from_secs(8 * 60 * 60);

/// In-memory bearer-token session store.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<String, User>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(64)
                .time_to_idle(SESSION_IDLE_EXPIRY)
                .build(),
        }
    }

    /// Issue a fresh token for `user`, dropping any existing sessions so a
    /// new login always starts clean.
    pub async fn create(&self, user: User) -> String {
        self.sessions.invalidate_all();
        let token = uuid::Uuid::new_v4().to_string();
        self.sessions.insert(token.clone(), user).await;
        token
    }

    pub async fn get(&self, token: &str) -> Option<User> {
        self.sessions.get(token).await
    }

    pub async fn remove(&self, token: &str) {
        self.sessions.invalidate(token).await;
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Check login credentials against the configured admin account.
///
/// Both comparisons always run; `&` avoids short-circuiting on the email.
pub fn verify_credentials(config: &Config, email: &str, password: &str) -> bool {
    let Some(expected_password) = config.admin_password.as_deref() else {
        return false;
    };
    constant_time_compare(email, &config.admin_email)
        & constant_time_compare(password, expected_password)
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Extract the bearer token from an Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
}

/// Middleware guarding admin routes: a valid session token is required, and
/// the resolved user is attached to the request for handlers.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = bearer_token(request.headers()).map(str::to_string);

    match token {
        Some(token) => match state.sessions.get(&token).await {
            Some(user) => {
                request.extensions_mut().insert(user);
                next.run(request).await
            }
            None => unauthorized_response("Session expired or invalid"),
        },
        None => unauthorized_response("Missing bearer token"),
    }
}

/// Create an unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    let body = ErrorResponse {
        success: false,
        error: ErrorDetails {
            code: codes::UNAUTHORIZED.to_string(),
            message: message.to_string(),
        },
    };

    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(password: Option<&str>) -> Config {
        Config {
            admin_email: "admin@habaru.media".to_string(),
            admin_password: password.map(str::to_string),
            admin_name: "Habaru Admin".to_string(),
            db_path: "./test.sqlite".into(),
            uploads_dir: "./uploads".into(),
            prefs_path: "./prefs.json".into(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
        }
    }

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare("test-key-123", "test-key-123"));
    }

    #[test]
    fn test_constant_time_compare_not_equal() {
        assert!(!constant_time_compare("test-key-123", "test-key-124"));
    }

    #[test]
    fn test_constant_time_compare_different_lengths() {
        assert!(!constant_time_compare("short", "much-longer-key"));
    }

    #[test]
    fn test_verify_credentials() {
        let config = test_config(Some("hunter2"));
        assert!(verify_credentials(&config, "admin@habaru.media", "hunter2"));
        assert!(!verify_credentials(&config, "admin@habaru.media", "wrong"));
        assert!(!verify_credentials(&config, "other@habaru.media", "hunter2"));
    }

    #[test]
    fn test_verify_credentials_requires_configured_password() {
        let config = test_config(None);
        assert!(!verify_credentials(&config, "admin@habaru.media", ""));
    }

    #[tokio::test]
    async fn test_session_roundtrip() {
        let store = SessionStore::new();
        let user = User {
            id: "admin".to_string(),
            email: "admin@habaru.media".to_string(),
            name: "Habaru Admin".to_string(),
        };

        let token = store.create(user.clone()).await;
        assert_eq!(store.get(&token).await.map(|u| u.email), Some(user.email));

        store.remove(&token).await;
        assert!(store.get(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_new_login_invalidates_previous_session() {
        let store = SessionStore::new();
        let user = User {
            id: "admin".to_string(),
            email: "admin@habaru.media".to_string(),
            name: "Habaru Admin".to_string(),
        };

        let first = store.create(user.clone()).await;
        let second = store.create(user).await;
        // moka removes invalidated entries lazily; sync before asserting
        store.sessions.run_pending_tasks().await;

        assert!(store.get(&first).await.is_none());
        assert!(store.get(&second).await.is_some());
    }
}
