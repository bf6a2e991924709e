//! Mock encrypted-value codec for testing.
//!
//! Deterministic stand-in for the external encryption library: a value
//! becomes a 64-hex-digit token and a 128-hex-digit proof. No secrecy is
//! provided; the shape of the wire format matches what the contract
//! expects so the mock contract can tally "encrypted" votes.

use super::{Ciphertext, CodecError, CodecResult, EncryptionCodec, Proof};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Mock codec with call counters and failure injection.
#[derive(Clone, Default)]
pub struct MockCodec {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    fail_encrypt: bool,
    fail_decrypt: bool,
    encrypt_calls: u32,
    decrypt_calls: u32,
}

impl MockCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `encrypt` calls fail.
    pub fn fail_encryption(&self, fail: bool) {
        self.state.lock().unwrap().fail_encrypt = fail;
    }

    /// Make subsequent `decrypt` calls fail.
    pub fn fail_decryption(&self, fail: bool) {
        self.state.lock().unwrap().fail_decrypt = fail;
    }

    /// Number of `encrypt` calls observed.
    pub fn encrypt_calls(&self) -> u32 {
        self.state.lock().unwrap().encrypt_calls
    }

    /// Number of `decrypt` calls observed.
    pub fn decrypt_calls(&self) -> u32 {
        self.state.lock().unwrap().decrypt_calls
    }
}

#[async_trait]
impl EncryptionCodec for MockCodec {
    async fn encrypt(&self, value: u64) -> CodecResult<(Ciphertext, Proof)> {
        let mut state = self.state.lock().unwrap();
        state.encrypt_calls += 1;
        if state.fail_encrypt {
            return Err(CodecError::Encryption("injected failure".to_string()));
        }

        let token = format!("0x{:064x}", value);
        let proof = Proof(format!("0x{:0>128}", &token[2..]));
        Ok((Ciphertext(token), proof))
    }

    async fn decrypt(&self, ciphertext: &Ciphertext) -> CodecResult<u64> {
        let mut state = self.state.lock().unwrap();
        state.decrypt_calls += 1;
        if state.fail_decrypt {
            return Err(CodecError::Decryption("injected failure".to_string()));
        }
        drop(state);

        decode_token(ciphertext)
    }
}

/// Decode a mock token back to its integer value.
///
/// Shared with the mock contract, which uses it to stand in for the
/// homomorphic tally the real contract performs on-chain.
pub fn decode_token(ciphertext: &Ciphertext) -> CodecResult<u64> {
    let digits = ciphertext
        .0
        .strip_prefix("0x")
        .ok_or_else(|| CodecError::Malformed("missing 0x prefix".to_string()))?;

    if digits.len() != 64 {
        return Err(CodecError::Malformed(format!(
            "expected 64 hex digits, got {}",
            digits.len()
        )));
    }

    // Values fit in the low 16 hex digits; the rest is zero padding.
    u64::from_str_radix(&digits[48..], 16)
        .map_err(|e| CodecError::Malformed(format!("invalid hex digits: {e}")))
}
