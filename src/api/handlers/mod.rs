//! API request handlers.

/// Authentication handlers (register, login, logout, session status).
pub mod auth;
/// Liveness probe.
pub mod health;
/// Profile handlers; the main consumers of the request identity.
pub mod profile;
