//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for Showcash, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Authentication
//! - `POST /auth/register` - Register, then log in
//! - `POST /auth/login` - Login and receive a session artifact
//! - `GET /auth/logout` - Clear the session artifact
//! - `GET /api/session` - Describe the current session
//!
//! ## Profiles
//! - `GET /api/profile` - Caller's profile (session required)
//! - `PUT /api/profile` - Update caller's profile (approved session required)
//! - `GET /api/profile/{handle}` - Public profile
//!
//! ## Health
//! - `GET /healthcheck` - Health check endpoint
//!
//! # Authentication
//!
//! By default the session travels in an HTTP-only cookie (`jwt-token` for
//! signed sessions, `showcash` for sealed ones). Bearer deployments send
//! ```text
//! Authorization: Bearer <token>
//! ```
//! and receive refreshed tokens in the `x-session-token` response header.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;
