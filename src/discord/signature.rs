//! Interaction request signatures
//!
//! Every interaction POST carries `X-Signature-Ed25519` (hex) and
//! `X-Signature-Timestamp`; the signed message is `timestamp || body`.

use crate::error::{Result, TicketError};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

/// Verifies interaction requests against the application public key
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Build from the hex-encoded public key shown in the developer portal
    pub fn from_hex(public_key: &str) -> Result<Self> {
        let bytes = hex::decode(public_key.trim())
            .map_err(|e| TicketError::Config(format!("Public key is not valid hex: {}", e)))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| {
            TicketError::Config("Public key must be 32 bytes".to_string())
        })?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| TicketError::Config(format!("Invalid public key: {}", e)))?;
        Ok(Self { key })
    }

    pub fn verify(&self, timestamp: &str, body: &[u8], signature_hex: &str) -> Result<()> {
        let sig_bytes = hex::decode(signature_hex.trim())
            .map_err(|_| TicketError::Signature("signature is not valid hex".to_string()))?;
        let signature = Signature::from_slice(&sig_bytes)
            .map_err(|_| TicketError::Signature("malformed signature".to_string()))?;

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        self.key
            .verify(&message, &signature)
            .map_err(|_| TicketError::Signature("signature mismatch".to_string()))
    }
}
