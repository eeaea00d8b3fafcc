//! Profiles and the guardian PIN gate.
//!
//! A profile's `pin` is either a legacy plaintext 4-digit string or a salted
//! digest of the form `sha256$<salt-hex>$<digest-hex>` produced by [`hash_pin`].
//! Plaintext PINs only keep a curious child out; they are not a security boundary.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const HASH_SCHEME: &str = "sha256";
const SALT_LEN: usize = 16;

/// A player whose progress is tracked separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub pin: String,
}

impl Profile {
    pub fn pin_is_hashed(&self) -> bool {
        self.pin.starts_with(&format!("{HASH_SCHEME}$"))
    }

    /// Check a PIN attempt against the stored plaintext or salted digest.
    pub fn verify_pin(&self, attempt: &str) -> bool {
        if !self.pin_is_hashed() {
            return constant_time_eq(self.pin.as_bytes(), attempt.as_bytes());
        }
        let mut parts = self.pin.splitn(3, '$').skip(1);
        let (Some(salt_hex), Some(digest_hex)) = (parts.next(), parts.next()) else {
            return false;
        };
        let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(digest_hex)) else {
            return false;
        };
        constant_time_eq(&salted_digest(&salt, attempt), &expected)
    }
}

/// Produce the salted-hash form of a PIN for storing in the config file.
pub fn hash_pin(pin: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    format!(
        "{HASH_SCHEME}${}${}",
        hex::encode(salt),
        hex::encode(salted_digest(&salt, pin))
    )
}

/// Whether a plaintext PIN has the expected 4-digit shape.
pub fn is_valid_plain_pin(pin: &str) -> bool {
    pin.len() == 4 && pin.chars().all(|c| c.is_ascii_digit())
}

fn salted_digest(salt: &[u8], pin: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(pin.as_bytes());
    hasher.finalize().to_vec()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
