//! Theme preference endpoints.

use axum::{extract::State, Json};

use super::{success, ApiResult};
use crate::prefs::{Preferences, PreferencesUpdate};
use crate::AppState;

/// GET /api/preferences - Current theme preferences.
pub async fn get_preferences(State(state): State<AppState>) -> ApiResult<Preferences> {
    success(state.prefs.get().await)
}

/// PUT /api/preferences - Apply a partial preference update; the new state is
/// persisted before the response is sent.
pub async fn update_preferences(
    State(state): State<AppState>,
    Json(update): Json<PreferencesUpdate>,
) -> ApiResult<Preferences> {
    success(state.prefs.apply(update).await?)
}
