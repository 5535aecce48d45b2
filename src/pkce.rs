//! PKCE (Proof Key for Code Exchange) verifier and challenge generation.
//!
//! Binds the authorization code to a secret held by this process, so an
//! intercepted code cannot be exchanged by anyone else.

use anyhow::{ensure, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Minimum code verifier length allowed by RFC 7636
const VERIFIER_MIN_LEN: usize = 43;

/// Maximum code verifier length allowed by RFC 7636
const VERIFIER_MAX_LEN: usize = 128;

/// Generates a full-length random code verifier.
///
/// 96 random bytes encode to exactly 128 URL-safe characters, the maximum
/// RFC 7636 allows.
fn random_verifier() -> String {
    let mut bytes = [0u8; 96];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generates a cryptographically random code verifier of `length` characters.
///
/// Fails when `length` is outside the 43..=128 range RFC 7636 permits.
pub fn generate_verifier(length: usize) -> Result<String> {
    ensure!(
        (VERIFIER_MIN_LEN..=VERIFIER_MAX_LEN).contains(&length),
        "code verifier length must be between {} and {}",
        VERIFIER_MIN_LEN,
        VERIFIER_MAX_LEN
    );

    let mut verifier = random_verifier();
    verifier.truncate(length);
    Ok(verifier)
}

/// Derives the S256 code challenge: base64url(SHA-256(verifier)), unpadded.
pub fn generate_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Generates a (verifier, challenge) pair for a new login flow.
pub fn generate_pair() -> (String, String) {
    let verifier = random_verifier();
    let challenge = generate_challenge(&verifier);
    (verifier, challenge)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verifier_length() {
        let verifier = generate_verifier(43).unwrap();
        assert_eq!(verifier.len(), 43);

        let verifier = generate_verifier(128).unwrap();
        assert_eq!(verifier.len(), 128);
    }

    #[test]
    fn test_verifier_length_bounds() {
        assert!(generate_verifier(42).is_err());
        assert!(generate_verifier(129).is_err());
        assert!(generate_verifier(0).is_err());
    }

    #[test]
    fn test_verifier_is_url_safe() {
        let verifier = generate_verifier(128).unwrap();
        assert!(verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_verifiers_are_unique() {
        assert_ne!(generate_verifier(64).unwrap(), generate_verifier(64).unwrap());
    }

    #[test]
    fn test_challenge_is_sha256_of_verifier() {
        // Known vector from RFC 7636 appendix B
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        let challenge = generate_challenge(verifier);
        assert_eq!(challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn test_challenge_has_no_padding() {
        let (_, challenge) = generate_pair();
        assert!(!challenge.contains('='));
        // SHA-256 digest encodes to 43 unpadded base64url characters
        assert_eq!(challenge.len(), 43);
    }

    #[test]
    fn test_pair_is_consistent() {
        let (verifier, challenge) = generate_pair();
        assert_eq!(verifier.len(), 128);
        assert_eq!(generate_challenge(&verifier), challenge);
    }
}
