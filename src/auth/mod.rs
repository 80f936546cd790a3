//! Session authentication
//!
//! This module provides the session layer for the Showcash API: two
//! interchangeable artifact codecs, a codec-agnostic session manager with
//! silent refresh, and the Axum middleware that exposes the resolved identity
//! to handlers.
//!
//! # Module Structure
//!
//! - [`auth::claims`](crate::auth::claims) - session claims and account status
//! - [`auth::codec`](crate::auth::codec) - the `TokenCodec` contract
//! - [`auth::jwt`](crate::auth::jwt) - HS512 signed-claims codec (`jwt-token` cookie)
//! - [`auth::sealed`](crate::auth::sealed) - AES-256-GCM sealed codec (`showcash` cookie)
//! - [`auth::session`](crate::auth::session) - issuance, validation and refresh
//! - [`auth::carrier`](crate::auth::carrier) - cookie / bearer transport
//! - [`auth::middleware`](crate::auth::middleware) - Axum layers and the `CurrentSession` extractor
//!
//! # Security Features
//!
//! - **Password Hashing**: Argon2id with per-hash salts
//! - **Signed sessions**: HS512 over readable claims, several verification keys
//! - **Sealed sessions**: AEAD, claims hidden from the client
//! - **Refresh**: expired artifacts are renewed only inside the grace period
//!   and only while the account is still approved
//!
//! # Usage
//!
//! ```ignore
//! use showcash::auth::middleware::{require_session, CurrentSession};
//!
//! let protected = Router::new()
//!     .route("/api/profile", get(get_profile))
//!     .layer(middleware::from_fn_with_state(state.clone(), require_session));
//!
//! async fn get_profile(session: CurrentSession) -> impl IntoResponse {
//!     format!("Hello, {}!", session.email())
//! }
//! ```
//!
//! Logging out only clears the client's cookie. An artifact copied before
//! logout stays valid until it expires and is refused a refresh.

/// Session claims and account status.
pub mod claims;
/// Time source used for every validation.
pub mod clock;
/// The codec contract.
pub mod codec;
/// Failure taxonomy.
pub mod error;
/// Signed-claims codec.
pub mod jwt;
/// Password hashing.
pub mod password;
/// Sealed-session codec.
pub mod sealed;
/// Session manager and refresh policies.
pub mod session;
/// Artifact transport.
pub mod carrier;
/// Authentication middleware and extractors for protected routes.
pub mod middleware;

pub use carrier::ArtifactCarrier;
pub use claims::{AccountStatus, SessionClaims, SessionSubject};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{CodecError, TokenCodec};
pub use error::{AuthError, FailureReason, RefreshDenial};
pub use jwt::SignedClaimsCodec;
pub use middleware::CurrentSession;
pub use sealed::SealedSessionCodec;
pub use session::{AccountStatusRefresh, RefreshPolicy, SessionManager, SessionPolicy};
