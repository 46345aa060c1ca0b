//! One-way password digests.
//!
//! Passwords are stored as a SHA-256 hex digest, never as plaintext. The
//! digest is deterministic, so verification is a digest comparison against
//! the stored value.

use sha2::{Digest, Sha256};

/// Hash a plaintext password into the storable digest form.
pub fn hash_password(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a plaintext password against a stored digest.
pub fn verify_password(plaintext: &str, hashed: &str) -> bool {
    hash_password(plaintext) == hashed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_deterministic() {
        assert_eq!(hash_password("secret"), hash_password("secret"));
    }

    #[test]
    fn test_digest_is_hex_sha256() {
        let digest = hash_password("mon_mdp123");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(digest, "mon_mdp123");
    }

    #[test]
    fn test_verify_accepts_matching_password() {
        let digest = hash_password("hunter2");
        assert!(verify_password("hunter2", &digest));
    }

    #[test]
    fn test_verify_rejects_wrong_password() {
        let digest = hash_password("hunter2");
        assert!(!verify_password("hunter3", &digest));
        assert!(!verify_password("", &digest));
    }
}
