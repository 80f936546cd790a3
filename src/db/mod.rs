//! Account storage.
//!
//! - [`traits`] - the `CredentialStore` contract consumed by the session layer
//! - [`turso`] - libsql-backed store (local file or in-memory)

pub mod traits;
pub mod turso;

pub use traits::{CredentialStore, NewUser, User};
pub use turso::TursoClient;
