// Hashing helpers for session tokens and derived on-chain identifiers.

use rand::RngCore;
use sha2::{Digest, Sha256};
use sha3::Keccak256;
use uuid::Uuid;

// Domain separation constants to prevent collisions between derived identifiers.
const ADDRESS_DOMAIN: &[u8] = b"BANKA_ADDR";
const TX_DOMAIN: &[u8] = b"BANKA_TX";

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(data));
    out
}

/// Generates a fresh bearer token (32 random bytes, hex encoded).
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Sessions are stored by digest so a leaked table does not leak live tokens.
pub fn hash_session_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Derives a deterministic contract-style address (lower-case, `0x`-prefixed)
/// from a namespace and the identifiers that own it.
pub fn derive_address(namespace: &str, parts: &[&[u8]]) -> String {
    let mut hasher = Keccak256::new();
    hasher.update(ADDRESS_DOMAIN);
    hasher.update(namespace.as_bytes());
    for part in parts {
        hasher.update(part);
    }
    let digest = hasher.finalize();
    format!("0x{}", hex::encode(&digest[12..]))
}

/// Transaction hash recorded on journal entries.
pub fn derive_tx_hash(kind: &str, id: &Uuid) -> String {
    let mut hasher = Keccak256::new();
    hasher.update(TX_DOMAIN);
    hasher.update(kind.as_bytes());
    hasher.update(id.as_bytes());
    format!("0x{}", hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_of_empty_input_matches_known_digest() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn session_tokens_are_unique_and_hash_stably() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert_eq!(hash_session_token(&a), hash_session_token(&a));
        assert_ne!(hash_session_token(&a), hash_session_token(&b));
    }

    #[test]
    fn derived_addresses_depend_on_all_inputs() {
        let id = Uuid::new_v4();
        let a = derive_address("token", &[b"factory", id.as_bytes()]);
        let b = derive_address("event", &[b"factory", id.as_bytes()]);
        assert_eq!(a.len(), 42);
        assert_ne!(a, b);
        assert_eq!(a, derive_address("token", &[b"factory", id.as_bytes()]));
    }
}
