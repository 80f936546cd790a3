//! Registration, login and logout.
//!
//! Every credential failure on login answers with the same 403 so callers
//! cannot tell an unknown handle from a wrong password or a closed account.

use crate::{
    auth::{
        carrier::ArtifactCarrier,
        claims::AccountStatus,
        middleware::{end_session, CurrentSession},
    },
    db::{CredentialStore, NewUser, User},
    types::{
        AppError, LoginRequest, LoginResponse, MessageResponse, RegisterRequest, Result,
        SessionStatusResponse, UserProfile,
    },
    utils::validation::{is_valid_email, is_valid_handle},
    AppState,
};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Register a new account and log it in.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response> {
    let email_address = payload.email_address.trim();
    if !is_valid_email(email_address) {
        return Err(AppError::InvalidInput("Invalid email address".to_string()));
    }

    if !is_valid_handle(&payload.username) || !state.content_filter.is_allowed(&payload.real_name)
    {
        return Err(AppError::InvalidInput(
            "Username must be 2-16 letters, digits, '_' or '-', and the name must be acceptable"
                .to_string(),
        ));
    }

    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let user = state
        .db
        .create_user(NewUser {
            username: payload.username,
            email_address: email_address.to_string(),
            password: payload.password,
            real_name: payload.real_name,
            location: payload.location.unwrap_or_default(),
            bio: payload.bio.unwrap_or_default(),
            status: AccountStatus::Approved,
        })
        .await?;

    tracing::info!(subject_id = %user.user_id, "Account registered");
    start_session(&state, &user)
}

/// Login with handle and password.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    if !is_valid_handle(&payload.username) {
        tracing::info!("Login rejected: malformed handle");
        return Err(AppError::BadCredentials);
    }

    let Some(user) = state
        .db
        .find_user_by_credentials(&payload.username, &payload.password)
        .await?
    else {
        tracing::info!("Login rejected: unknown handle or wrong password");
        return Err(AppError::BadCredentials);
    };

    if !state.db.is_account_active(&user) {
        tracing::info!(subject_id = %user.user_id, status = %user.status, "Login rejected: account inactive");
        return Err(AppError::BadCredentials);
    }

    tracing::info!(subject_id = %user.user_id, "Login succeeded");
    start_session(&state, &user)
}

/// Clear the client's artifact. Always succeeds.
///
/// Only the client copy is dropped; an artifact captured before logout is
/// still judged on its own expiry.
pub async fn logout(State(state): State<AppState>, session: Option<CurrentSession>) -> Response {
    if let Some(session) = &session {
        tracing::info!(subject_id = %session.subject_id(), "Logged out");
    }

    let mut response = Json(MessageResponse {
        message: "Logged out".to_string(),
    })
    .into_response();
    end_session(&state.carrier, &mut response);
    response
}

/// Describe the identity attached to this request, if any.
pub async fn session_status(session: Option<CurrentSession>) -> Json<SessionStatusResponse> {
    Json(match session {
        Some(session) => SessionStatusResponse {
            authenticated: true,
            subject_id: Some(session.subject_id()),
            email: Some(session.email().to_string()),
            status: Some(session.status()),
            expires_at: Some(session.claims().expires_at),
        },
        None => SessionStatusResponse {
            authenticated: false,
            subject_id: None,
            email: None,
            status: None,
            expires_at: None,
        },
    })
}

fn start_session(state: &AppState, user: &User) -> Result<Response> {
    let issued = state
        .sessions
        .issue(&user.session_subject())
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let token = match state.carrier {
        ArtifactCarrier::Bearer => Some(issued.artifact.clone()),
        ArtifactCarrier::Cookie { .. } => None,
    };

    let mut response = Json(LoginResponse {
        user: UserProfile::from(user),
        token,
        expires_at: issued.claims.expires_at,
    })
    .into_response();
    state.carrier.attach(response.headers_mut(), &issued);

    Ok(response)
}
