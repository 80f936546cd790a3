//! Sealed-session codec.
//!
//! Claims are serialized to JSON and sealed with AES-256-GCM. The artifact is
//! `base64url(nonce || ciphertext || tag)`; the cookie name is bound in as
//! associated data so a sealed value cannot be replayed under another name.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Utc};

use crate::auth::claims::SessionClaims;
use crate::auth::codec::{check_decoded, CodecError, TokenCodec};
use crate::types::{AppError, Result};

/// Cookie carrying sealed-session artifacts.
pub const SEALED_COOKIE_NAME: &str = "showcash";

/// AES-256-GCM key size.
pub const SEALING_KEY_LEN: usize = 32;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

pub struct SealedSessionCodec {
    /// First entry seals; every entry is tried when opening.
    ciphers: Vec<Aes256Gcm>,
}

impl SealedSessionCodec {
    pub fn new(key: &[u8]) -> Result<Self> {
        Ok(Self {
            ciphers: vec![cipher_from(key)?],
        })
    }

    /// Build from a standard-base64 encoded 32-byte key.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        Self::new(&decode_key(encoded)?)
    }

    /// Also open artifacts sealed under a retired key.
    pub fn with_previous_key(mut self, key: &[u8]) -> Result<Self> {
        self.ciphers.push(cipher_from(key)?);
        Ok(self)
    }
}

/// Decode a standard-base64 sealing key.
pub fn decode_key(encoded: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| AppError::Configuration(format!("sealing key is not valid base64: {e}")))
}

fn cipher_from(key: &[u8]) -> Result<Aes256Gcm> {
    if key.len() != SEALING_KEY_LEN {
        return Err(AppError::Configuration(format!(
            "sealing key must be exactly {} bytes, got {}",
            SEALING_KEY_LEN,
            key.len()
        )));
    }
    Aes256Gcm::new_from_slice(key)
        .map_err(|e| AppError::Configuration(format!("AES cipher init failed: {e}")))
}

impl TokenCodec for SealedSessionCodec {
    fn encode(&self, claims: &SessionClaims) -> std::result::Result<String, CodecError> {
        let plaintext =
            serde_json::to_vec(claims).map_err(|e| CodecError::Encoding(e.to_string()))?;

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self.ciphers[0]
            .encrypt(
                &nonce,
                Payload {
                    msg: &plaintext,
                    aad: SEALED_COOKIE_NAME.as_bytes(),
                },
            )
            .map_err(|e| CodecError::Encoding(format!("AES encryption failed: {e}")))?;

        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(&combined))
    }

    fn decode(
        &self,
        artifact: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<SessionClaims, CodecError> {
        let combined = URL_SAFE_NO_PAD
            .decode(artifact)
            .map_err(|_| CodecError::Malformed)?;
        if combined.len() < NONCE_LEN + TAG_LEN {
            return Err(CodecError::Malformed);
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .ciphers
            .iter()
            .find_map(|cipher| {
                cipher
                    .decrypt(
                        nonce,
                        Payload {
                            msg: ciphertext,
                            aad: SEALED_COOKIE_NAME.as_bytes(),
                        },
                    )
                    .ok()
            })
            .ok_or(CodecError::SealInvalid)?;

        let claims: SessionClaims =
            serde_json::from_slice(&plaintext).map_err(|_| CodecError::Malformed)?;
        check_decoded(claims, now)
    }

    fn cookie_name(&self) -> &'static str {
        SEALED_COOKIE_NAME
    }
}
