//! Custodial wallet creation for accounts registered without an external wallet.

use crate::crypto::hashing::keccak256;
use anyhow::Context;
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;

#[derive(Debug, Clone)]
pub struct Wallet {
    /// Lower-case `0x` address.
    pub address: String,
    /// `0x`-prefixed 32-byte secp256k1 secret.
    pub private_key: String,
}

impl Wallet {
    pub fn generate() -> Self {
        let key = SigningKey::random(&mut OsRng);
        Self::from_signing_key(&key)
    }

    pub fn from_private_key_hex(private_key: &str) -> anyhow::Result<Self> {
        let raw = private_key.trim();
        let raw = raw.strip_prefix("0x").unwrap_or(raw);
        let bytes = hex::decode(raw).context("private key is not hex")?;
        let key = SigningKey::from_slice(&bytes).context("invalid secp256k1 private key")?;
        Ok(Self::from_signing_key(&key))
    }

    fn from_signing_key(key: &SigningKey) -> Self {
        let point = key.verifying_key().as_affine().to_encoded_point(false);
        // Uncompressed SEC1 point: 0x04 || X || Y. The address hashes X || Y.
        let digest = keccak256(&point.as_bytes()[1..]);
        Self {
            address: format!("0x{}", hex::encode(&digest[12..])),
            private_key: format!("0x{}", hex::encode(key.to_bytes())),
        }
    }
}

/// EIP-55 mixed-case checksum encoding of a 20-byte address.
pub fn to_checksum_address(address: &str) -> String {
    let lower = address.trim().trim_start_matches("0x").to_lowercase();
    let hash = hex::encode(keccak256(lower.as_bytes()));
    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (c, h) in lower.chars().zip(hash.chars()) {
        if c.is_ascii_alphabetic() && h.to_digit(16).unwrap_or(0) >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}
