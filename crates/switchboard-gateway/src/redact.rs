//! Payload protection for logs.
//!
//! Undecodable webhook bodies may hold user content, so they are never logged
//! as-is. With a key configured the body is sealed with AES-256-GCM and logged
//! as base64 (`nonce || ciphertext || tag`); otherwise only its SHA-256 digest
//! and length are logged.

use base64::{engine::general_purpose::STANDARD, Engine};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use switchboard_core::config::LoggingConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RedactError {
    #[error("redaction key must be 64 hex characters (32 bytes)")]
    BadKey,
}

/// What gets logged in place of a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedPayload {
    pub sha256: String,
    pub len: usize,
    /// Present only when a redaction key is configured.
    pub sealed: Option<String>,
}

pub struct Redactor {
    key: Option<LessSafeKey>,
    rng: SystemRandom,
}

impl Redactor {
    /// Digest-only protection.
    pub fn digest_only() -> Self {
        Self {
            key: None,
            rng: SystemRandom::new(),
        }
    }

    pub fn from_config(config: &LoggingConfig) -> Result<Self, RedactError> {
        let Some(hex_key) = config.redaction_key.as_deref() else {
            return Ok(Self::digest_only());
        };
        let bytes = hex::decode(hex_key.trim()).map_err(|_| RedactError::BadKey)?;
        let unbound = UnboundKey::new(&AES_256_GCM, &bytes).map_err(|_| RedactError::BadKey)?;
        Ok(Self {
            key: Some(LessSafeKey::new(unbound)),
            rng: SystemRandom::new(),
        })
    }

    pub fn is_sealing(&self) -> bool {
        self.key.is_some()
    }

    pub fn protect(&self, payload: &[u8]) -> ProtectedPayload {
        ProtectedPayload {
            sha256: hex::encode(Sha256::digest(payload)),
            len: payload.len(),
            sealed: self.key.as_ref().and_then(|key| self.seal(key, payload)),
        }
    }

    fn seal(&self, key: &LessSafeKey, payload: &[u8]) -> Option<String> {
        let mut nonce = [0u8; NONCE_LEN];
        self.rng.fill(&mut nonce).ok()?;

        let mut in_out = payload.to_vec();
        key.seal_in_place_append_tag(Nonce::assume_unique_for_key(nonce), Aad::empty(), &mut in_out)
            .ok()?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + in_out.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&in_out);
        Some(STANDARD.encode(sealed))
    }
}
