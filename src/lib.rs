//! # Showcash
//!
//! Backend for the Showcash social-sharing service, centred on pluggable
//! session authentication.
//!
//! ## Overview
//!
//! Sessions are carried as an opaque artifact in a cookie or bearer header.
//! Two codecs produce that artifact:
//!
//! - **signed**: HS512 JWT, claims readable by the client
//! - **sealed**: AES-256-GCM, claims hidden from the client
//!
//! Both expire after 15 minutes and are silently refreshed for up to 14 days
//! afterwards, as long as the account is still approved.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use showcash::{api::routes::create_router, auth::SystemClock, AppState, TursoClient};
//! use std::sync::Arc;
//!
//! let config = ShowcashConfig::load("showcash.toml")?;
//! let codec = config.auth.build_codec()?;
//! let db = Arc::new(TursoClient::new_local(&config.database.url).await?);
//! let state = AppState::new(config, db, codec, Arc::new(SystemClock));
//! let app = create_router(state);
//! ```
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`auth`] - session codecs, manager and middleware
//! - [`db`] - credential store (libsql)
//! - [`types`] - request/response types and error handling
//! - [`utils`] - configuration, validation and content filtering

#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Session authentication and middleware.
pub mod auth;
/// Credential store.
pub mod db;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration, validation and moderation utilities.
pub mod utils;

// Re-export commonly used types
pub use db::TursoClient;
pub use types::{AppError, Result};
pub use utils::toml_config::ShowcashConfig;

use crate::auth::carrier::ArtifactCarrier;
use crate::auth::clock::Clock;
use crate::auth::codec::TokenCodec;
use crate::auth::session::{AccountStatusRefresh, RefreshPolicy, SessionManager};
use crate::utils::filter::{AllowAll, BlockList, ContentFilter};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// TOML-based infrastructure configuration
    pub config: Arc<ShowcashConfig>,
    /// Credential store
    pub db: Arc<TursoClient>,
    /// Session issuance and validation
    pub sessions: Arc<SessionManager>,
    /// Decides whether expired sessions may be renewed
    pub refresh_policy: Arc<dyn RefreshPolicy>,
    /// Where session artifacts travel
    pub carrier: ArtifactCarrier,
    /// Moderation predicate for user-visible names
    pub content_filter: Arc<dyn ContentFilter>,
}

impl AppState {
    /// Wire the session stack from configuration. Refresh consults `db` for
    /// the live account status.
    pub fn new(
        config: ShowcashConfig,
        db: Arc<TursoClient>,
        codec: Arc<dyn TokenCodec>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let sessions = SessionManager::new(codec, clock, config.auth.session_policy());
        let carrier = config.auth.artifact_carrier(sessions.cookie_name());

        let content_filter: Arc<dyn ContentFilter> = if config.moderation.blocked_words.is_empty()
        {
            Arc::new(AllowAll)
        } else {
            Arc::new(BlockList::new(&config.moderation.blocked_words))
        };

        Self {
            refresh_policy: Arc::new(AccountStatusRefresh::new(db.clone())),
            config: Arc::new(config),
            db,
            sessions: Arc::new(sessions),
            carrier,
            content_filter,
        }
    }
}
