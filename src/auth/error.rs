use thiserror::Error;

use super::codec::CodecError;

/// Why the refresh step refused to issue a replacement artifact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshDenial {
    #[error("grace period elapsed")]
    GraceElapsed,

    #[error("subject no longer exists")]
    UnknownSubject,

    #[error("account is not active")]
    AccountInactive,

    #[error("refreshed subject does not match the expired session")]
    SubjectChanged,

    #[error("account lookup failed: {0}")]
    Lookup(String),
}

/// Precise session failure kinds. Logged server-side only; the HTTP layer
/// collapses every one of them into a generic 401.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("session artifact is malformed")]
    Malformed,

    #[error("session signature is invalid")]
    SignatureInvalid,

    #[error("session seal is invalid")]
    SealInvalid,

    #[error("session carries no subject")]
    UnknownSubject,

    #[error("session refresh denied: {0}")]
    RefreshDenied(RefreshDenial),

    #[error("no session artifact presented")]
    NotAuthenticated,

    #[error("failed to issue session: {0}")]
    Encoding(String),
}

/// Coarse classification of an [`AuthError`] used for response handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Invalid,
    Expired,
    NotAuthenticated,
    Internal,
}

impl AuthError {
    pub fn reason(&self) -> FailureReason {
        match self {
            AuthError::Malformed
            | AuthError::SignatureInvalid
            | AuthError::SealInvalid
            | AuthError::UnknownSubject => FailureReason::Invalid,
            // A store outage is not the session's fault; leave the cookie alone.
            AuthError::RefreshDenied(RefreshDenial::Lookup(_)) => FailureReason::Internal,
            AuthError::RefreshDenied(_) => FailureReason::Expired,
            AuthError::NotAuthenticated => FailureReason::NotAuthenticated,
            AuthError::Encoding(_) => FailureReason::Internal,
        }
    }

    /// Whether the client-held artifact should be cleared on this failure.
    pub fn clears_artifact(&self) -> bool {
        matches!(
            self.reason(),
            FailureReason::Invalid | FailureReason::Expired
        )
    }
}

impl From<CodecError> for AuthError {
    /// `Expired` is not mapped here: the session manager handles it before
    /// falling back to this conversion.
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Malformed | CodecError::Expired(_) => AuthError::Malformed,
            CodecError::SignatureInvalid => AuthError::SignatureInvalid,
            CodecError::SealInvalid => AuthError::SealInvalid,
            CodecError::Encoding(msg) => AuthError::Encoding(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrity_failures_clear_the_artifact() {
        for err in [
            AuthError::Malformed,
            AuthError::SignatureInvalid,
            AuthError::SealInvalid,
            AuthError::UnknownSubject,
        ] {
            assert_eq!(err.reason(), FailureReason::Invalid);
            assert!(err.clears_artifact());
        }
    }

    #[test]
    fn test_refresh_denials_are_expired() {
        let err = AuthError::RefreshDenied(RefreshDenial::GraceElapsed);
        assert_eq!(err.reason(), FailureReason::Expired);
        assert!(err.clears_artifact());

        let err = AuthError::RefreshDenied(RefreshDenial::AccountInactive);
        assert!(err.clears_artifact());
    }

    #[test]
    fn test_absence_and_internal_failures_keep_the_artifact() {
        assert!(!AuthError::NotAuthenticated.clears_artifact());
        assert!(!AuthError::Encoding("boom".into()).clears_artifact());
        assert!(!AuthError::RefreshDenied(RefreshDenial::Lookup("db down".into())).clears_artifact());
    }
}
