//! Session claims: the authenticated facts carried by every session artifact.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Account status as stored by the credential store.
///
/// Only [`AccountStatus::Approved`] authorizes privileged actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccountStatus {
    #[default]
    Unknown,
    Approved,
    ClosedByUser,
    Suspended,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Unknown => "UserStatusUnknown",
            AccountStatus::Approved => "UserApproved",
            AccountStatus::ClosedByUser => "UserAccountClosedByUser",
            AccountStatus::Suspended => "UserAccountSuspended",
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, AccountStatus::Approved)
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = std::convert::Infallible;

    /// Unrecognised values fall back to `Unknown`, which never authorizes anything.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "UserApproved" => AccountStatus::Approved,
            "UserAccountClosedByUser" => AccountStatus::ClosedByUser,
            "UserAccountSuspended" => AccountStatus::Suspended,
            _ => AccountStatus::Unknown,
        })
    }
}

/// Who a session is being issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSubject {
    pub id: Uuid,
    pub email: String,
    pub status: AccountStatus,
}

/// The claim set embedded in a session artifact.
///
/// Timestamps are whole seconds so that both codecs round-trip exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "sub")]
    pub subject_id: Uuid,
    #[serde(rename = "email")]
    pub subject_email: String,
    pub status: AccountStatus,
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl SessionClaims {
    /// Build claims for `subject`, valid from `now` for `lifetime`.
    pub fn issue(subject: &SessionSubject, now: DateTime<Utc>, lifetime: Duration) -> Self {
        let issued_at = truncate_to_seconds(now);
        Self {
            subject_id: subject.id,
            subject_email: subject.email.clone(),
            status: subject.status,
            issued_at,
            expires_at: issued_at
                .checked_add_signed(lifetime)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Structural invariant checked by every codec after decoding.
    pub fn is_well_formed(&self) -> bool {
        self.expires_at > self.issued_at
    }

    /// True only for a real (non-nil) subject that matches `user_id`.
    pub fn is_subject(&self, user_id: Uuid) -> bool {
        !self.subject_id.is_nil() && self.subject_id == user_id
    }

    pub fn has_known_subject(&self) -> bool {
        !self.subject_id.is_nil()
    }
}

fn truncate_to_seconds(instant: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(instant.timestamp(), 0).unwrap_or(instant)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> SessionSubject {
        SessionSubject {
            id: Uuid::new_v4(),
            email: "ada@showcash.io".to_string(),
            status: AccountStatus::Approved,
        }
    }

    #[test]
    fn test_issue_sets_lifetime_and_truncates() {
        let now = DateTime::parse_from_rfc3339("2026-03-01T10:00:00.750Z")
            .unwrap()
            .with_timezone(&Utc);
        let claims = SessionClaims::issue(&subject(), now, Duration::minutes(15));

        assert_eq!(claims.issued_at.timestamp_subsec_nanos(), 0);
        assert_eq!(claims.expires_at - claims.issued_at, Duration::minutes(15));
        assert!(claims.is_well_formed());
    }

    #[test]
    fn test_issue_saturates_oversized_lifetime() {
        let claims = SessionClaims::issue(&subject(), Utc::now(), Duration::MAX);

        assert_eq!(claims.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(claims.is_well_formed());
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let claims = SessionClaims::issue(&subject(), now, Duration::minutes(15));

        assert!(!claims.is_expired_at(claims.expires_at - Duration::seconds(1)));
        assert!(claims.is_expired_at(claims.expires_at));
    }

    #[test]
    fn test_nil_subject_never_matches() {
        let mut claims = SessionClaims::issue(&subject(), Utc::now(), Duration::minutes(15));
        claims.subject_id = Uuid::nil();

        assert!(!claims.is_subject(Uuid::nil()));
        assert!(!claims.has_known_subject());
    }

    #[test]
    fn test_status_storage_names() {
        for status in [
            AccountStatus::Unknown,
            AccountStatus::Approved,
            AccountStatus::ClosedByUser,
            AccountStatus::Suspended,
        ] {
            assert_eq!(status.as_str().parse::<AccountStatus>().unwrap(), status);
        }
        assert_eq!(
            "garbage".parse::<AccountStatus>().unwrap(),
            AccountStatus::Unknown
        );
    }
}
