//! Encrypted-value codec boundary.
//!
//! Votes and quorum thresholds never cross the wire in plaintext: an
//! external homomorphic-encryption library turns integers into opaque
//! tokens with accompanying validity proofs, and reverses the operation
//! once a reveal is authorized. This module defines the capability trait
//! only; production implementations live outside this crate.

pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use mock::MockCodec;

/// Opaque encrypted token (`0x` + hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ciphertext(pub String);

impl fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validity proof accompanying a ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof(pub String);

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Codec operation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CodecError {
    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("malformed ciphertext: {0}")]
    Malformed(String),
}

/// Encrypted-value codec abstraction.
///
/// Decryption is only meaningful once the owning proposal's quorum has
/// been reached; the registry enforces that gate and never calls
/// [`EncryptionCodec::decrypt`] before it holds.
#[async_trait]
pub trait EncryptionCodec: Send + Sync {
    /// Encrypt a plaintext integer into an opaque token plus proof.
    async fn encrypt(&self, value: u64) -> CodecResult<(Ciphertext, Proof)>;

    /// Decrypt a token back to its plaintext integer.
    async fn decrypt(&self, ciphertext: &Ciphertext) -> CodecResult<u64>;
}
