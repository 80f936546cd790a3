use crate::auth::carrier::ArtifactCarrier;
use crate::auth::claims::{AccountStatus, SessionClaims};
use crate::auth::error::{AuthError, FailureReason};
use crate::auth::session::ValidatedSession;
use crate::types::AppError;
use crate::AppState;
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use uuid::Uuid;

/// Rejects the request with a generic 401 unless a valid (or refreshable)
/// session artifact is presented.
pub async fn require_session(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let artifact = state.carrier.extract(req.headers());

    match authenticate(&state, artifact.as_deref()).await {
        Ok(validated) => continue_with(&state, validated, req, next).await,
        Err(err) => {
            log_failure(&err);
            let mut response = AppError::Unauthorized.into_response();
            if err.clears_artifact() {
                state.carrier.clear(response.headers_mut());
            }
            response
        }
    }
}

/// Resolves the session when one is presented; otherwise the request continues
/// anonymously. A bad artifact is still cleared from the client.
pub async fn optional_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    // Anonymous requests carry no identity, whatever ran before us.
    req.extensions_mut().remove::<CurrentSession>();

    let artifact = state.carrier.extract(req.headers());
    if artifact.is_none() {
        return next.run(req).await;
    }

    match authenticate(&state, artifact.as_deref()).await {
        Ok(validated) => continue_with(&state, validated, req, next).await,
        Err(err) => {
            log_failure(&err);
            let mut response = next.run(req).await;
            if err.clears_artifact() {
                state.carrier.clear(response.headers_mut());
            }
            response
        }
    }
}

async fn authenticate(
    state: &AppState,
    artifact: Option<&str>,
) -> Result<ValidatedSession, AuthError> {
    let artifact = artifact.ok_or(AuthError::NotAuthenticated)?;
    state
        .sessions
        .validate_and_maybe_refresh(artifact, state.refresh_policy.as_ref())
        .await
}

async fn continue_with(
    state: &AppState,
    validated: ValidatedSession,
    mut req: Request,
    next: Next,
) -> Response {
    let ValidatedSession {
        claims,
        replacement,
    } = validated;

    // Only the claims verified here may identify the request; anything placed
    // on it earlier in the stack is discarded.
    if req
        .extensions_mut()
        .insert(CurrentSession::new(claims))
        .is_some()
    {
        tracing::warn!("Discarded a session identity set before authentication");
    }

    let mut response = next.run(req).await;
    if let Some(issued) = &replacement {
        // A handler that ended the session must not be overridden by a refresh.
        if response.extensions().get::<SessionEnded>().is_none() {
            state.carrier.attach(response.headers_mut(), issued);
        }
    }
    response
}

/// Response marker set by [`end_session`].
#[derive(Debug, Clone, Copy)]
struct SessionEnded;

/// Clear the client's artifact on `response` and suppress any replacement the
/// middleware would otherwise attach on the way out.
pub fn end_session(carrier: &ArtifactCarrier, response: &mut Response) {
    carrier.clear(response.headers_mut());
    response.extensions_mut().insert(SessionEnded);
}

fn log_failure(err: &AuthError) {
    match err.reason() {
        FailureReason::Invalid => {
            tracing::warn!(reason = ?err, "Rejected invalid session artifact")
        }
        FailureReason::Expired => tracing::info!(reason = %err, "Session could not be refreshed"),
        FailureReason::NotAuthenticated => tracing::debug!("No session artifact presented"),
        FailureReason::Internal => tracing::error!(error = %err, "Session validation failed"),
    }
}

/// The identity resolved for the current request.
///
/// Only the session middleware can build one, so handlers can trust that a
/// `CurrentSession` in the request extensions came from a verified artifact.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    claims: SessionClaims,
}

impl CurrentSession {
    fn new(claims: SessionClaims) -> Self {
        Self { claims }
    }

    pub fn claims(&self) -> &SessionClaims {
        &self.claims
    }

    pub fn subject_id(&self) -> Uuid {
        self.claims.subject_id
    }

    pub fn email(&self) -> &str {
        &self.claims.subject_email
    }

    pub fn status(&self) -> AccountStatus {
        self.claims.status
    }

    /// Whether this session belongs to `user_id`. Never true for the nil id.
    pub fn is_user(&self, user_id: Uuid) -> bool {
        self.claims.is_subject(user_id)
    }

    pub fn is_approved(&self) -> bool {
        self.claims.status.is_approved()
    }
}

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

impl<S> OptionalFromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<CurrentSession>().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::SessionSubject;
    use axum::http::Request as HttpRequest;
    use chrono::{Duration, Utc};

    fn parts_with(session: Option<CurrentSession>) -> Parts {
        let (mut parts, _) = HttpRequest::builder().body(()).unwrap().into_parts();
        if let Some(session) = session {
            parts.extensions.insert(session);
        }
        parts
    }

    fn session() -> CurrentSession {
        let subject = SessionSubject {
            id: Uuid::new_v4(),
            email: "mo@showcash.io".to_string(),
            status: AccountStatus::Suspended,
        };
        CurrentSession::new(SessionClaims::issue(&subject, Utc::now(), Duration::minutes(15)))
    }

    #[tokio::test]
    async fn test_required_extractor_rejects_anonymous() {
        let mut parts = parts_with(None);
        let result =
            <CurrentSession as FromRequestParts<()>>::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_optional_extractor_allows_anonymous() {
        let mut parts = parts_with(None);
        let result =
            <CurrentSession as OptionalFromRequestParts<()>>::from_request_parts(&mut parts, &())
                .await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_extractor_reads_installed_session() {
        let expected = session();
        let mut parts = parts_with(Some(expected.clone()));

        let found = <CurrentSession as FromRequestParts<()>>::from_request_parts(&mut parts, &())
            .await
            .expect("session should be present");

        assert_eq!(found.subject_id(), expected.subject_id());
        assert!(found.is_user(expected.subject_id()));
        assert!(!found.is_user(Uuid::nil()));
        assert!(!found.is_approved());
    }

    #[tokio::test]
    async fn test_verified_identity_replaces_one_set_earlier() {
        use crate::auth::{clock::ManualClock, jwt::SignedClaimsCodec};
        use crate::db::turso::TursoClient;
        use crate::utils::toml_config::ShowcashConfig;
        use axum::{body::Body, http::header, middleware, routing::get, Router};
        use std::sync::Arc;
        use tower::ServiceExt;

        let codec = SignedClaimsCodec::new(b"middleware-test-secret-32-bytes!").unwrap();
        let state = AppState::new(
            ShowcashConfig::default(),
            Arc::new(TursoClient::new_memory().await.unwrap()),
            Arc::new(codec),
            Arc::new(ManualClock::new(Utc::now())),
        );
        let issued = state
            .sessions
            .issue(&SessionSubject {
                id: Uuid::new_v4(),
                email: "real@showcash.io".to_string(),
                status: AccountStatus::Approved,
            })
            .unwrap();

        let planted = session();
        let app = Router::new()
            .route(
                "/",
                get(|session: CurrentSession| async move { session.email().to_string() }),
            )
            .layer(middleware::from_fn_with_state(state.clone(), require_session))
            .layer(middleware::from_fn(move |mut req: Request, next: Next| {
                let planted = planted.clone();
                async move {
                    req.extensions_mut().insert(planted);
                    next.run(req).await
                }
            }))
            .with_state(state);

        let request = HttpRequest::builder()
            .uri("/")
            .header(header::COOKIE, format!("jwt-token={}", issued.artifact))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"real@showcash.io");
    }

    #[tokio::test]
    async fn test_anonymous_request_drops_identity_set_earlier() {
        use crate::auth::{clock::ManualClock, jwt::SignedClaimsCodec};
        use crate::db::turso::TursoClient;
        use crate::utils::toml_config::ShowcashConfig;
        use axum::{body::Body, middleware, routing::get, Router};
        use std::sync::Arc;
        use tower::ServiceExt;

        let codec = SignedClaimsCodec::new(b"middleware-test-secret-32-bytes!").unwrap();
        let state = AppState::new(
            ShowcashConfig::default(),
            Arc::new(TursoClient::new_memory().await.unwrap()),
            Arc::new(codec),
            Arc::new(ManualClock::new(Utc::now())),
        );

        let planted = session();
        let app = Router::new()
            .route(
                "/",
                get(|session: Option<CurrentSession>| async move {
                    session.map_or_else(|| "anonymous".to_string(), |s| s.email().to_string())
                }),
            )
            .layer(middleware::from_fn_with_state(state.clone(), optional_session))
            .layer(middleware::from_fn(move |mut req: Request, next: Next| {
                let planted = planted.clone();
                async move {
                    req.extensions_mut().insert(planted);
                    next.run(req).await
                }
            }))
            .with_state(state);

        let request = HttpRequest::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"anonymous");
    }
}
