use crate::api::handlers::{auth, health, profile};
use crate::auth::carrier::SESSION_TOKEN_HEADER;
use crate::auth::middleware::{optional_session, require_session};
use crate::AppState;
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        // Public routes (no auth required)
        .route("/healthcheck", get(health::health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/api/profile/{handle}", get(profile::get_public_profile));

    let session_routes = Router::new()
        // Best-effort auth: anonymous callers pass through
        .route("/auth/logout", get(auth::logout))
        .route("/api/session", get(auth::session_status))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            optional_session,
        ));

    let protected_routes = Router::new()
        // Protected routes (auth required)
        .route(
            "/api/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_session));

    let router = public_routes
        .merge(session_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http());

    let router = match cors_layer(&state.config.server.allowed_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.with_state(state)
}

/// CORS for the configured origins, or `None` when no origin is configured.
fn cors_layer(allowed_origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::HEAD,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
                Method::PATCH,
            ])
            .allow_headers([
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                header::ACCEPT,
                header::ORIGIN,
                HeaderName::from_static("x-requested-with"),
            ])
            .expose_headers([SESSION_TOKEN_HEADER]),
    )
}
