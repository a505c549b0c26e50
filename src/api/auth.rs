//! Admin authentication endpoints.

use axum::{extract::State, http::HeaderMap, Json};

use super::{success, ApiResult};
use crate::auth::bearer_token;
use crate::errors::AppError;
use crate::models::{LoginRequest, LoginResponse, User};
use crate::AppState;

/// POST /api/auth/login - Exchange admin credentials for a session token.
///
/// The failure message is fixed regardless of which part was wrong.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    if !crate::auth::verify_credentials(&state.config, &request.email, &request.password) {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let user = User {
        id: "admin".to_string(),
        email: state.config.admin_email.clone(),
        name: state.config.admin_name.clone(),
    };
    let token = state.sessions.create(user.clone()).await;
    tracing::info!("Admin login for {}", user.email);

    success(LoginResponse { token, user })
}

/// POST /api/auth/logout - Drop the current session. Idempotent.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<()> {
    if let Some(token) = bearer_token(&headers) {
        state.sessions.remove(token).await;
    }
    success(())
}

/// GET /api/auth/me - The current user, or null without a live session.
pub async fn current_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Option<User>> {
    let user = match bearer_token(&headers) {
        Some(token) => state.sessions.get(token).await,
        None => None,
    };
    success(user)
}
