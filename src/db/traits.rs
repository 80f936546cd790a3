//! Credential store abstraction
//!
//! The session layer only needs two lookups and an activity predicate; it never
//! sees SQL. [`TursoClient`](super::turso::TursoClient) is the shipped backend.

use crate::auth::claims::{AccountStatus, SessionSubject};
use crate::types::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// A stored account.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
    pub email_address: String,
    pub password_hash: String,
    pub real_name: String,
    pub location: String,
    pub bio: String,
    pub status: AccountStatus,
}

impl User {
    pub fn session_subject(&self) -> SessionSubject {
        SessionSubject {
            id: self.user_id,
            email: self.email_address.clone(),
            status: self.status,
        }
    }
}

/// Input for account creation. The password is still plain text here and is
/// hashed by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email_address: String,
    pub password: String,
    pub real_name: String,
    pub location: String,
    pub bio: String,
    pub status: AccountStatus,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` for an unknown username or a wrong password alike.
    async fn find_user_by_credentials(&self, username: &str, password: &str)
        -> Result<Option<User>>;

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>>;

    /// Whether the account may still hold a session.
    fn is_account_active(&self, user: &User) -> bool {
        user.status.is_approved()
    }
}
