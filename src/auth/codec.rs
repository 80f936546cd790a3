//! The token codec contract shared by the signed and sealed implementations.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::claims::SessionClaims;

/// Decode/encode failures reported by a [`TokenCodec`].
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode session claims: {0}")]
    Encoding(String),

    #[error("session artifact is malformed")]
    Malformed,

    #[error("session signature is invalid")]
    SignatureInvalid,

    #[error("session seal is invalid")]
    SealInvalid,

    /// Integrity verified, but the claims are stale. Carries the decoded claims
    /// so the session manager can decide on a refresh.
    #[error("session expired")]
    Expired(Box<SessionClaims>),
}

impl CodecError {
    /// Format or integrity failures. These are never refreshable.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            CodecError::Malformed | CodecError::SignatureInvalid | CodecError::SealInvalid
        )
    }
}

/// Turns claims into a protected wire string and back.
///
/// Implementations hold only read-only key material, so a single instance is
/// shared across every request without locking.
pub trait TokenCodec: Send + Sync {
    fn encode(&self, claims: &SessionClaims) -> Result<String, CodecError>;

    /// Decode `artifact`, judging expiry against `now`.
    fn decode(&self, artifact: &str, now: DateTime<Utc>) -> Result<SessionClaims, CodecError>;

    /// Name of the cookie this strategy is carried in.
    fn cookie_name(&self) -> &'static str;
}

/// Shared post-decode checks: structural invariant first, then expiry.
pub(crate) fn check_decoded(
    claims: SessionClaims,
    now: DateTime<Utc>,
) -> Result<SessionClaims, CodecError> {
    if !claims.is_well_formed() {
        return Err(CodecError::Malformed);
    }
    if claims.is_expired_at(now) {
        return Err(CodecError::Expired(Box::new(claims)));
    }
    Ok(claims)
}
