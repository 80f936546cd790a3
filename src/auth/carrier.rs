//! Where a session artifact travels: a cookie or an `Authorization` header.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use time::OffsetDateTime;

use super::session::IssuedSession;

/// Response header carrying a refreshed artifact in bearer mode.
pub const SESSION_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-session-token");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactCarrier {
    Cookie { name: &'static str, secure: bool },
    Bearer,
}

impl ArtifactCarrier {
    /// The presented artifact, if any. Empty values count as absent.
    pub fn extract(&self, headers: &HeaderMap) -> Option<String> {
        match self {
            ArtifactCarrier::Cookie { name, .. } => CookieJar::from_headers(headers)
                .get(*name)
                .map(|cookie| cookie.value().to_string())
                .filter(|value| !value.is_empty()),
            ArtifactCarrier::Bearer => bearer_token(headers).map(str::to_string),
        }
    }

    /// Attach a newly issued artifact to outgoing response headers.
    pub fn attach(&self, headers: &mut HeaderMap, issued: &IssuedSession) {
        let value = match self {
            ArtifactCarrier::Cookie { name, secure } => HeaderValue::from_str(
                &session_cookie(*name, &issued.artifact, issued.cookie_expires_at, *secure)
                    .to_string(),
            ),
            ArtifactCarrier::Bearer => HeaderValue::from_str(&issued.artifact),
        };

        match (self, value) {
            (ArtifactCarrier::Cookie { .. }, Ok(value)) => {
                headers.append(header::SET_COOKIE, value);
            }
            (ArtifactCarrier::Bearer, Ok(value)) => {
                headers.insert(SESSION_TOKEN_HEADER, value);
            }
            (_, Err(e)) => tracing::error!(error = %e, "Session artifact is not a valid header value"),
        }
    }

    /// Tell the client to drop its artifact. Bearer clients hold their own
    /// token, so there is nothing to send.
    pub fn clear(&self, headers: &mut HeaderMap) {
        if let ArtifactCarrier::Cookie { name, secure } = self {
            if let Ok(value) = HeaderValue::from_str(&removal_cookie(*name, *secure).to_string()) {
                headers.append(header::SET_COOKIE, value);
            }
        }
    }
}

/// `Authorization: Bearer <token>`, split on single spaces into exactly two
/// parts. Anything else is treated as no header at all.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split(' ');

    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() =>
        {
            Some(token)
        }
        _ => None,
    }
}

pub fn session_cookie(
    name: &'static str,
    value: &str,
    expires_at: DateTime<Utc>,
    secure: bool,
) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, value.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build();

    if let Ok(expires) = OffsetDateTime::from_unix_timestamp(expires_at.timestamp()) {
        cookie.set_expires(expires);
    }
    cookie
}

/// Empty value, `Max-Age=0` and an epoch `Expires`.
pub fn removal_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}
