//! Webhook signature verification.
//!
//! GitHub signs deliveries with an HMAC of the raw body, sent as
//! `sha1=<hex>` in `X-Hub-Signature` and `sha256=<hex>` in
//! `X-Hub-Signature-256`. Digests are compared in constant time by
//! `Mac::verify_slice`.

use crate::error::{CoreError, Result};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

/// Digest algorithm named in a signature header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Digest {
    Sha1,
    Sha256,
}

impl Digest {
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }

    fn parse(name: &str) -> Result<Self> {
        match name {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            other => Err(CoreError::UnsupportedDigest(other.to_string())),
        }
    }
}

/// An inbound webhook delivery, consumed once by verification.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub payload: Vec<u8>,
    pub signature: Option<String>,
}

impl WebhookEvent {
    #[must_use]
    pub fn new(payload: impl Into<Vec<u8>>, signature: Option<String>) -> Self {
        Self {
            payload: payload.into(),
            signature,
        }
    }

    /// Check this delivery against the configured secret.
    ///
    /// # Errors
    /// See [`check_signature`].
    pub fn authenticate(&self, secret: Option<&str>) -> Result<()> {
        check_signature(&self.payload, self.signature.as_deref(), secret)
    }
}

/// Accept or reject a payload.
///
/// No secret means verification is skipped.
#[must_use]
pub fn verify(payload: &[u8], signature: Option<&str>, secret: Option<&str>) -> bool {
    check_signature(payload, signature, secret).is_ok()
}

/// Like [`verify`], but reports why a payload was rejected.
///
/// # Errors
/// - [`CoreError::MissingSignature`] if a secret is set and no signature given
/// - [`CoreError::UnsupportedDigest`] for algorithms other than sha1/sha256
/// - [`CoreError::SignatureMismatch`] for malformed or wrong digests
pub fn check_signature(payload: &[u8], signature: Option<&str>, secret: Option<&str>) -> Result<()> {
    let Some(secret) = secret else {
        return Ok(());
    };
    let signature = signature.ok_or(CoreError::MissingSignature)?;

    let (algo, hex_digest) = signature
        .split_once('=')
        .ok_or(CoreError::SignatureMismatch)?;
    let digest = Digest::parse(algo.trim())?;
    let expected = hex::decode(hex_digest.trim()).map_err(|_| CoreError::SignatureMismatch)?;

    let valid = match digest {
        Digest::Sha1 => verify_mac::<Hmac<Sha1>>(secret.as_bytes(), payload, &expected),
        Digest::Sha256 => verify_mac::<Hmac<Sha256>>(secret.as_bytes(), payload, &expected),
    };

    if valid {
        Ok(())
    } else {
        Err(CoreError::SignatureMismatch)
    }
}

/// Produce a `<algo>=<hex>` signature for a payload.
#[must_use]
pub fn sign(payload: &[u8], secret: &str, digest: Digest) -> String {
    let hex_digest = match digest {
        Digest::Sha1 => compute_mac::<Hmac<Sha1>>(secret.as_bytes(), payload),
        Digest::Sha256 => compute_mac::<Hmac<Sha256>>(secret.as_bytes(), payload),
    };
    format!("{}={hex_digest}", digest.prefix())
}

fn verify_mac<M: Mac + KeyInit>(key: &[u8], payload: &[u8], expected: &[u8]) -> bool {
    let Ok(mut mac) = <M as KeyInit>::new_from_slice(key) else {
        return false;
    };
    Mac::update(&mut mac, payload);
    mac.verify_slice(expected).is_ok()
}

fn compute_mac<M: Mac + KeyInit>(key: &[u8], payload: &[u8]) -> String {
    // HMAC accepts keys of any length.
    let Ok(mut mac) = <M as KeyInit>::new_from_slice(key) else {
        return String::new();
    };
    Mac::update(&mut mac, payload);
    hex::encode(mac.finalize().into_bytes())
}
