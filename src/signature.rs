//! # Signature Artifact Acceptance
//!
//! Server side of the signature capture contract. The signing page draws on
//! a canvas and submits the whole surface as a base64 data URI; this module
//! decides whether that payload is acceptable before the lifecycle engine
//! flips the devis to `signe`.
//!
//! Emptiness in the all-pixels-transparent sense is checked in the browser
//! (where the raw pixel data lives); here we enforce the wire contract:
//! present, well-formed, non-empty, and actually a PNG. Acceptance is
//! all-or-nothing; a rejected artifact leaves the devis untouched.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use thiserror::Error;

/// Leading bytes of every PNG stream.
const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Why a submitted signature artifact was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature artifact is required")]
    Missing,
    #[error("signature artifact must be a base64 image data URI")]
    NotADataUri,
    #[error("signature artifact payload is empty")]
    EmptyPayload,
    #[error("signature artifact payload is not valid base64")]
    InvalidBase64,
    #[error("signature artifact is not a PNG image")]
    NotPng,
    #[error("signer name is required")]
    BlankSignerName,
}

/// A validated signature artifact, kept in its inline data-URI form (the
/// devis row is the blob store in this system).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureArtifact {
    data_uri: String,
}

impl SignatureArtifact {
    /// Validates `data:image/png;base64,<payload>` and the decoded bytes.
    pub fn parse(raw: Option<&str>) -> Result<Self, SignatureError> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty());
        let Some(raw) = raw else {
            return Err(SignatureError::Missing);
        };

        let rest = raw
            .strip_prefix("data:image/")
            .ok_or(SignatureError::NotADataUri)?;
        let (_format, payload) = rest
            .split_once(";base64,")
            .ok_or(SignatureError::NotADataUri)?;

        if payload.is_empty() {
            return Err(SignatureError::EmptyPayload);
        }

        let bytes = BASE64
            .decode(payload)
            .map_err(|_| SignatureError::InvalidBase64)?;
        if bytes.is_empty() {
            return Err(SignatureError::EmptyPayload);
        }
        if bytes.len() < PNG_MAGIC.len() || bytes[..PNG_MAGIC.len()] != PNG_MAGIC {
            return Err(SignatureError::NotPng);
        }

        Ok(Self {
            data_uri: raw.to_string(),
        })
    }

    /// The artifact exactly as it will be stored on the devis row.
    pub fn as_data_uri(&self) -> &str {
        &self.data_uri
    }

    pub fn into_data_uri(self) -> String {
        self.data_uri
    }
}

/// Signer names come from a free-text input; blank is the only invalid value.
pub fn validate_signer_name(name: Option<&str>) -> Result<String, SignatureError> {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => Ok(name.to_string()),
        None => Err(SignatureError::BlankSignerName),
    }
}
