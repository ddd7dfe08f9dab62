//! Attestation digests.
//!
//! The governance service stores the attestation as an opaque hash. Hosts that
//! hold a hardware or build fingerprint can hash it here and pass the result as
//! the `attestation` argument of
//! [`send_telemetry`](crate::KuneoClient::send_telemetry).

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `fingerprint`.
pub fn digest(fingerprint: &[u8]) -> String {
    hex::encode(Sha256::digest(fingerprint))
}
