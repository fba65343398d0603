use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use parley_persist::UserPreferences;

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SavePreferencesRequest {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PreferencesResponse {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Get a user's preferences
///
/// A user without stored preferences gets the defaults back.
#[utoipa::path(
    get,
    path = "/preferences/{user_id}",
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Stored or default preferences", body = PreferencesResponse)
    ),
    tag = "preferences"
)]
pub async fn get_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<PreferencesResponse>> {
    let preferences = state
        .store
        .get_preferences(&user_id)
        .await?
        .unwrap_or_else(|| UserPreferences::new(&user_id));

    Ok(Json(preferences_to_response(preferences)))
}

/// Save a user's preferences (upsert)
#[utoipa::path(
    put,
    path = "/preferences/{user_id}",
    request_body = SavePreferencesRequest,
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Preferences saved", body = PreferencesResponse)
    ),
    tag = "preferences"
)]
pub async fn save_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<SavePreferencesRequest>,
) -> ApiResult<Json<PreferencesResponse>> {
    let preferences = UserPreferences {
        user_id,
        theme: req.theme,
        model: req.model,
        updated_at: Utc::now(),
    };

    state.store.upsert_preferences(preferences.clone()).await?;

    Ok(Json(preferences_to_response(preferences)))
}

fn preferences_to_response(preferences: UserPreferences) -> PreferencesResponse {
    PreferencesResponse {
        user_id: preferences.user_id,
        theme: preferences.theme,
        model: preferences.model,
        updated_at: preferences.updated_at,
    }
}
