//! AES-256-GCM encryption for stored token records.
//!
//! The cipher key is derived once from the configured secret with SHA-256,
//! so operators supply an ordinary secret string rather than raw key bytes.
//! Every encryption uses a fresh random nonce.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sha2::{Digest, Sha256};

/// Size of the GCM nonce in bytes (96 bits)
const NONCE_SIZE: usize = 12;

/// Derives the 256-bit cipher key from the configured secret.
///
/// One-way: the secret itself is never kept around after startup.
pub fn derive_key(secret: &str) -> [u8; 32] {
    Sha256::digest(secret.as_bytes()).into()
}

/// Encrypts plaintext, returning `(ciphertext, nonce)` both base64-encoded.
///
/// The nonce is random per call and must be stored alongside the ciphertext
/// for decryption.
pub fn encrypt(plaintext: &str, key: &[u8; 32]) -> Result<(String, String)> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let sealed = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| anyhow!("encryption failed: {}", e))?;

    Ok((BASE64.encode(sealed), BASE64.encode(nonce)))
}

/// Decrypts base64-encoded ciphertext with its nonce.
///
/// Fails on a wrong key, a tampered ciphertext, or any encoding damage;
/// callers treat all of those as corruption.
pub fn decrypt(ciphertext: &str, nonce: &str, key: &[u8; 32]) -> Result<String> {
    let sealed = BASE64
        .decode(ciphertext)
        .context("failed to decode ciphertext")?;
    let nonce_bytes = BASE64.decode(nonce).context("failed to decode nonce")?;

    if nonce_bytes.len() != NONCE_SIZE {
        return Err(anyhow!(
            "invalid nonce size: expected {}, got {}",
            NONCE_SIZE,
            nonce_bytes.len()
        ));
    }

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), sealed.as_ref())
        .map_err(|e| anyhow!("decryption failed (wrong key or corrupted data): {}", e))?;

    String::from_utf8(plaintext).context("decrypted data is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_is_deterministic() {
        assert_eq!(derive_key("secret"), derive_key("secret"));
        assert_ne!(derive_key("secret"), derive_key("other-secret"));
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = derive_key("test-secret");
        let plaintext = "my-secret-access-token-12345";

        let (ciphertext, nonce) = encrypt(plaintext, &key).expect("encryption failed");
        assert_ne!(ciphertext, plaintext);

        let decrypted = decrypt(&ciphertext, &nonce, &key).expect("decryption failed");
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_fresh_nonce_per_encryption() {
        let key = derive_key("test-secret");

        let (ciphertext1, nonce1) = encrypt("same-plaintext", &key).unwrap();
        let (ciphertext2, nonce2) = encrypt("same-plaintext", &key).unwrap();

        assert_ne!(nonce1, nonce2);
        assert_ne!(ciphertext1, ciphertext2);
    }

    #[test]
    fn test_wrong_key_fails() {
        let (ciphertext, nonce) = encrypt("secret", &derive_key("key-one")).unwrap();
        assert!(decrypt(&ciphertext, &nonce, &derive_key("key-two")).is_err());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = derive_key("test-secret");
        let (mut ciphertext, nonce) = encrypt("secret", &key).unwrap();

        ciphertext.push('X');
        assert!(decrypt(&ciphertext, &nonce, &key).is_err());
    }

    #[test]
    fn test_wrong_nonce_fails() {
        let key = derive_key("test-secret");
        let (ciphertext, _) = encrypt("secret", &key).unwrap();
        let (_, other_nonce) = encrypt("other", &key).unwrap();

        assert!(decrypt(&ciphertext, &other_nonce, &key).is_err());
    }
}
