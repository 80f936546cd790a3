//! Session issuance and validation-with-refresh.
//!
//! The manager is codec-agnostic: it only talks to a [`TokenCodec`], a
//! [`Clock`] and, when an artifact has gone stale, a [`RefreshPolicy`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::claims::{SessionClaims, SessionSubject};
use super::clock::Clock;
use super::codec::{CodecError, TokenCodec};
use super::error::{AuthError, RefreshDenial};
use crate::db::traits::CredentialStore;

/// Lifetimes applied to every issued session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// How long freshly issued claims stay valid.
    pub issuance_lifetime: Duration,
    /// Window after expiry in which a silent refresh is still allowed.
    pub grace_period: Duration,
    /// Client-side cookie lifetime. Deliberately longer than the claims so the
    /// browser keeps presenting stale artifacts for refresh.
    pub cookie_lifetime: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            issuance_lifetime: Duration::minutes(15),
            grace_period: Duration::days(14),
            cookie_lifetime: Duration::days(30),
        }
    }
}

/// A newly encoded artifact and what it carries.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub artifact: String,
    pub claims: SessionClaims,
    pub cookie_expires_at: DateTime<Utc>,
}

/// Result of a successful validation.
///
/// `claims` are the claims that were presented, even when a replacement was
/// issued.
#[derive(Debug, Clone)]
pub struct ValidatedSession {
    pub claims: SessionClaims,
    pub replacement: Option<IssuedSession>,
}

/// Decides whether an expired session may be renewed, and for whom.
#[async_trait]
pub trait RefreshPolicy: Send + Sync {
    async fn refresh(&self, claims: &SessionClaims) -> Result<SessionSubject, RefreshDenial>;
}

/// Re-derives the subject from the credential store and refuses accounts that
/// are gone or no longer active.
pub struct AccountStatusRefresh {
    store: Arc<dyn CredentialStore>,
}

impl AccountStatusRefresh {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RefreshPolicy for AccountStatusRefresh {
    async fn refresh(&self, claims: &SessionClaims) -> Result<SessionSubject, RefreshDenial> {
        let user = self
            .store
            .find_user_by_id(claims.subject_id)
            .await
            .map_err(|e| RefreshDenial::Lookup(e.to_string()))?
            .ok_or(RefreshDenial::UnknownSubject)?;

        if !self.store.is_account_active(&user) {
            return Err(RefreshDenial::AccountInactive);
        }

        Ok(user.session_subject())
    }
}

pub struct SessionManager {
    codec: Arc<dyn TokenCodec>,
    clock: Arc<dyn Clock>,
    policy: SessionPolicy,
}

impl SessionManager {
    pub fn new(codec: Arc<dyn TokenCodec>, clock: Arc<dyn Clock>, policy: SessionPolicy) -> Self {
        Self {
            codec,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Cookie name used by the configured codec.
    pub fn cookie_name(&self) -> &'static str {
        self.codec.cookie_name()
    }

    /// Issue a fresh artifact for `subject`, e.g. at login.
    pub fn issue(&self, subject: &SessionSubject) -> Result<IssuedSession, AuthError> {
        self.issue_at(subject, self.clock.now())
    }

    fn issue_at(
        &self,
        subject: &SessionSubject,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, AuthError> {
        if subject.id.is_nil() {
            return Err(AuthError::UnknownSubject);
        }

        let claims = SessionClaims::issue(subject, now, self.policy.issuance_lifetime);
        let cookie_expires_at = claims
            .issued_at
            .checked_add_signed(self.policy.cookie_lifetime)
            .ok_or_else(|| AuthError::Encoding("cookie lifetime out of range".to_string()))?;
        let artifact = self.codec.encode(&claims)?;

        Ok(IssuedSession {
            artifact,
            cookie_expires_at,
            claims,
        })
    }

    /// Validate `artifact`; when it is authentic but expired and still inside
    /// the grace period, consult `refresh` and issue a replacement.
    pub async fn validate_and_maybe_refresh(
        &self,
        artifact: &str,
        refresh: &dyn RefreshPolicy,
    ) -> Result<ValidatedSession, AuthError> {
        let now = self.clock.now();

        let stale = match self.codec.decode(artifact, now) {
            Ok(claims) => {
                if !claims.has_known_subject() {
                    return Err(AuthError::UnknownSubject);
                }
                return Ok(ValidatedSession {
                    claims,
                    replacement: None,
                });
            }
            Err(CodecError::Expired(claims)) => *claims,
            Err(other) => return Err(other.into()),
        };

        if !stale.has_known_subject() {
            return Err(AuthError::UnknownSubject);
        }
        // A deadline past the representable range never elapses.
        let grace_elapsed = stale
            .expires_at
            .checked_add_signed(self.policy.grace_period)
            .is_some_and(|deadline| now >= deadline);
        if grace_elapsed {
            return Err(AuthError::RefreshDenied(RefreshDenial::GraceElapsed));
        }

        let subject = refresh
            .refresh(&stale)
            .await
            .map_err(AuthError::RefreshDenied)?;
        if subject.id != stale.subject_id {
            return Err(AuthError::RefreshDenied(RefreshDenial::SubjectChanged));
        }

        let replacement = self.issue_at(&subject, now)?;
        tracing::debug!(subject_id = %stale.subject_id, "Session refreshed");

        Ok(ValidatedSession {
            claims: stale,
            replacement: Some(replacement),
        })
    }
}
