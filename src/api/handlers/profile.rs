use crate::{
    auth::middleware::CurrentSession,
    db::CredentialStore,
    types::{AppError, Result, UpdateProfileRequest, UserProfile},
    utils::validation::is_valid_handle,
    AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};

/// The caller's own profile.
pub async fn get_profile(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<UserProfile>> {
    let user = state
        .db
        .find_user_by_id(session.subject_id())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserProfile::from(&user)))
}

/// Update the caller's profile. The subject always comes from the session,
/// never from the body.
pub async fn update_profile(
    State(state): State<AppState>,
    session: CurrentSession,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>> {
    if !session.is_approved() {
        return Err(AppError::Forbidden("Account is not approved".to_string()));
    }

    if let Some(real_name) = &payload.real_name {
        if !state.content_filter.is_allowed(real_name) {
            return Err(AppError::InvalidInput("Name is not acceptable".to_string()));
        }
    }

    let user = state
        .db
        .update_profile(session.subject_id(), &payload)
        .await?;

    Ok(Json(UserProfile::from(&user)))
}

/// Public profile by handle.
pub async fn get_public_profile(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<UserProfile>> {
    if !is_valid_handle(&handle) {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let user = state
        .db
        .find_user_by_username(&handle)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserProfile::from(&user)))
}
