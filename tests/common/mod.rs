//! Shared fixtures for the HTTP integration tests.
#![allow(dead_code)]

use axum::http::{header, HeaderName, HeaderValue};
use axum_test::{TestResponse, TestServer};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;

use showcash::{
    api::routes::create_router,
    auth::{codec::TokenCodec, Clock, ManualClock, SealedSessionCodec, SignedClaimsCodec},
    utils::toml_config::{CarrierKind, SessionMode},
    AppState, ShowcashConfig, TursoClient,
};

pub const SIGNING_SECRET: &[u8] = b"integration-test-signing-secret-32b!";
pub const SEALING_KEY: [u8; 32] = [0x5a; 32];
pub const PASSWORD: &str = "password123";

pub struct TestApp {
    pub server: TestServer,
    pub clock: Arc<ManualClock>,
    pub db: Arc<TursoClient>,
    pub cookie_name: &'static str,
}

pub async fn spawn_app(config: ShowcashConfig) -> TestApp {
    let codec: Arc<dyn TokenCodec> = match config.auth.mode {
        SessionMode::Signed => {
            Arc::new(SignedClaimsCodec::new(SIGNING_SECRET).expect("should build signed codec"))
        }
        SessionMode::Sealed => {
            Arc::new(SealedSessionCodec::new(&SEALING_KEY).expect("should build sealed codec"))
        }
    };
    let cookie_name = codec.cookie_name();

    let clock = Arc::new(ManualClock::new(Utc::now()));
    let db = Arc::new(
        TursoClient::new_memory()
            .await
            .expect("should open in-memory database"),
    );

    let state = AppState::new(config, db.clone(), codec, clock.clone());
    let server = TestServer::new(create_router(state)).expect("Failed to create test server");

    TestApp {
        server,
        clock,
        db,
        cookie_name,
    }
}

pub async fn signed_app() -> TestApp {
    spawn_app(ShowcashConfig::default()).await
}

pub async fn sealed_app() -> TestApp {
    let mut config = ShowcashConfig::default();
    config.auth.mode = SessionMode::Sealed;
    spawn_app(config).await
}

pub async fn bearer_app() -> TestApp {
    let mut config = ShowcashConfig::default();
    config.auth.carrier = CarrierKind::Bearer;
    spawn_app(config).await
}

impl TestApp {
    pub fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn register(&self, username: &str) -> TestResponse {
        self.server
            .post("/auth/register")
            .json(&json!({
                "username": username,
                "email_address": format!("{}@showcash.io", username),
                "password": PASSWORD,
                "real_name": "Test User"
            }))
            .await
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.server
            .post("/auth/login")
            .json(&json!({
                "username": username,
                "password": password
            }))
            .await
    }

    /// Register `username` and return the session artifact issued at login.
    pub async fn login_new_user(&self, username: &str) -> String {
        self.register(username).await.assert_status_ok();

        let response = self.login(username, PASSWORD).await;
        response.assert_status_ok();
        issued_cookie(&response, self.cookie_name).expect("login should set a session cookie")
    }

    /// GET `path` presenting `artifact` in the session cookie.
    pub async fn get_with_cookie(&self, path: &str, artifact: &str) -> TestResponse {
        self.server
            .get(path)
            .add_header(header::COOKIE, cookie_header(self.cookie_name, artifact))
            .await
    }
}

pub fn cookie_header(name: &str, value: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("{}={}", name, value)).expect("valid cookie header")
}

pub fn bearer_header(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).expect("valid authorization header")
}

pub fn set_cookies(response: &TestResponse) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}

/// Value of a non-empty `name` cookie set by the response.
pub fn issued_cookie(response: &TestResponse, name: &str) -> Option<String> {
    set_cookies(response).into_iter().find_map(|c| {
        let pair = c.split(';').next()?;
        let value = pair.strip_prefix(name)?.strip_prefix('=')?;
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Whether the response tells the client to drop its `name` cookie.
pub fn clears_cookie(response: &TestResponse, name: &str) -> bool {
    set_cookies(response)
        .iter()
        .any(|c| c.starts_with(&format!("{}=;", name)) && c.contains("Max-Age=0"))
}

pub fn session_token_header(response: &TestResponse) -> Option<String> {
    response
        .headers()
        .get(HeaderName::from_static("x-session-token"))
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
