//! Report digest computation.
//!
//! Two digest functions are offered because verifiers differ: SHA-256 is
//! the default for report content, Keccak-256 matches ledger-native
//! tooling. Both produce the registry's 256-bit [`Digest`].

use serde_json::Value;
use sha2::Sha256;
use sha3::{Digest as _, Keccak256};

use attestor_core::error::Result;
use attestor_core::types::Digest;

use crate::canonical::canonical_json;

/// Computes the SHA-256 digest of raw bytes.
pub fn sha256_digest(data: &[u8]) -> Digest {
    let hash: [u8; 32] = Sha256::digest(data).into();
    Digest::from_array(hash)
}

/// Computes the Keccak-256 digest of raw bytes.
pub fn keccak256_digest(data: &[u8]) -> Digest {
    let hash: [u8; 32] = Keccak256::digest(data).into();
    Digest::from_array(hash)
}

/// Computes the digest of a report: SHA-256 over its canonical JSON bytes.
pub fn report_digest(report: &Value) -> Result<Digest> {
    Ok(sha256_digest(&canonical_json(report)?))
}
