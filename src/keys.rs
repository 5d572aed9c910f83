//! API key generation and verification.
//!
//! Keys are random alphanumeric strings; only their SHA-256 hex digest is
//! persisted. The plaintext appears once in the creation response and the
//! stored prefix exists purely so the dashboard can tell keys apart.

use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Length of the generated API key string (alphanumeric characters).
pub const KEY_LENGTH: usize = 48;

/// Number of leading characters stored as a human-visible prefix.
pub const KEY_PREFIX_LENGTH: usize = 8;

/// The result of generating a new API key.
pub struct GeneratedApiKey {
    /// The plaintext key (shown to the caller exactly once, never stored).
    pub plaintext: String,
    /// The first [`KEY_PREFIX_LENGTH`] characters of the key for display.
    pub prefix: String,
    /// The SHA-256 hex digest of the plaintext key (stored in the database).
    pub hash: String,
}

/// Generate a new random API key.
pub fn generate_api_key() -> GeneratedApiKey {
    let key: String = rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(KEY_LENGTH)
        .map(char::from)
        .collect();

    let prefix = key[..KEY_PREFIX_LENGTH].to_string();
    let hash = hash_api_key(&key);

    GeneratedApiKey {
        plaintext: key,
        prefix,
        hash,
    }
}

/// Compute the SHA-256 hex digest of an API key.
///
/// Used both during key creation (to store the hash) and during
/// verification (to look up the key by hash).
pub fn hash_api_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    hex::encode(digest)
}

/// Compare a presented key against a stored digest without leaking timing.
pub fn verify_api_key(presented: &str, stored_hash: &str) -> bool {
    let presented_hash = hash_api_key(presented);
    ConstantTimeEq::ct_eq(presented_hash.as_bytes(), stored_hash.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_has_correct_length() {
        let key = generate_api_key();
        assert_eq!(key.plaintext.len(), KEY_LENGTH);
    }

    #[test]
    fn generated_key_prefix_matches_start() {
        let key = generate_api_key();
        assert_eq!(&key.plaintext[..KEY_PREFIX_LENGTH], key.prefix);
    }

    #[test]
    fn generated_key_hash_is_sha256_hex() {
        let key = generate_api_key();
        assert_eq!(key.hash.len(), 64, "SHA-256 hex digest should be 64 chars");
        assert!(
            key.hash.chars().all(|c| c.is_ascii_hexdigit()),
            "Hash should be hex characters only"
        );
    }

    #[test]
    fn generated_key_is_alphanumeric() {
        let key = generate_api_key();
        assert!(
            key.plaintext.chars().all(|c| c.is_ascii_alphanumeric()),
            "Key should be purely alphanumeric"
        );
    }

    #[test]
    fn hash_matches_regeneration() {
        let key = generate_api_key();
        let rehash = hash_api_key(&key.plaintext);
        assert_eq!(key.hash, rehash);
    }

    #[test]
    fn different_keys_produce_different_hashes() {
        let a = generate_api_key();
        let b = generate_api_key();
        assert_ne!(a.plaintext, b.plaintext);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn verify_accepts_matching_key() {
        let key = generate_api_key();
        assert!(verify_api_key(&key.plaintext, &key.hash));
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let key = generate_api_key();
        assert!(!verify_api_key("definitely-not-the-key", &key.hash));
        assert!(!verify_api_key("", &key.hash));
    }
}
