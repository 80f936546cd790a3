use crate::auth::claims::SessionClaims;
use crate::auth::codec::{check_decoded, CodecError, TokenCodec};
use crate::types::{AppError, Result};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// Cookie carrying signed-claims artifacts.
pub const SIGNED_COOKIE_NAME: &str = "jwt-token";

/// Minimum accepted HMAC secret length, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Signed-claims codec: HS512 JWTs whose claims are readable by any holder.
///
/// Expiry is not delegated to `jsonwebtoken`; the signature is verified first
/// and staleness is judged against the caller's clock so that an expired but
/// authentic artifact can still be refreshed.
pub struct SignedClaimsCodec {
    encoding_key: EncodingKey,
    verification_keys: Vec<DecodingKey>,
    validation: Validation,
}

impl SignedClaimsCodec {
    /// Creates a codec that signs and verifies with `secret`.
    ///
    /// # Arguments
    /// * `secret` - HMAC key, at least [`MIN_SECRET_LEN`] bytes
    pub fn new(secret: &[u8]) -> Result<Self> {
        ensure_secret_len(secret)?;

        let mut validation = Validation::new(Algorithm::HS512);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            verification_keys: vec![DecodingKey::from_secret(secret)],
            validation,
        })
    }

    /// Also accept artifacts signed with a retired `secret`. New artifacts are
    /// always signed with the primary key.
    pub fn with_verification_key(mut self, secret: &[u8]) -> Result<Self> {
        ensure_secret_len(secret)?;
        self.verification_keys.push(DecodingKey::from_secret(secret));
        Ok(self)
    }
}

impl TokenCodec for SignedClaimsCodec {
    fn encode(&self, claims: &SessionClaims) -> std::result::Result<String, CodecError> {
        encode(&Header::new(Algorithm::HS512), claims, &self.encoding_key)
            .map_err(|e| CodecError::Encoding(format!("Failed to sign session: {}", e)))
    }

    fn decode(
        &self,
        artifact: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<SessionClaims, CodecError> {
        for key in &self.verification_keys {
            match decode::<SessionClaims>(artifact, key, &self.validation) {
                Ok(data) => return check_decoded(data.claims, now),
                Err(e) => match map_jwt_error(&e) {
                    CodecError::SignatureInvalid => continue,
                    other => return Err(other),
                },
            }
        }
        Err(CodecError::SignatureInvalid)
    }

    fn cookie_name(&self) -> &'static str {
        SIGNED_COOKIE_NAME
    }
}

fn ensure_secret_len(secret: &[u8]) -> Result<()> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(AppError::Configuration(format!(
            "signing secret must be at least {} bytes, got {}",
            MIN_SECRET_LEN,
            secret.len()
        )));
    }
    Ok(())
}

fn map_jwt_error(err: &jsonwebtoken::errors::Error) -> CodecError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::InvalidSignature => CodecError::SignatureInvalid,
        _ => CodecError::Malformed,
    }
}
