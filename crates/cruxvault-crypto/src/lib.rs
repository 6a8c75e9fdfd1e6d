//! Authenticated encryption for Crux Vault values.
//!
//! One type, [`Cipher`], wraps an AES-256-GCM key and does nothing else:
//! no key storage, no key rotation, no key derivation from a passphrase.
//! Those are the key collaborator's job (see the crate's parent
//! workspace); this crate only turns plaintext into an authenticated,
//! self-describing ciphertext string and back.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use cruxvault_core::Error;
use rand::RngCore;

/// Length in bytes of an AES-256-GCM key.
pub const KEY_LEN: usize = 32;

/// Length in bytes of the random nonce prepended to every ciphertext.
const NONCE_LEN: usize = 12;

/// An AES-256-GCM encryptor/decryptor bound to a single 32-byte key.
///
/// `encrypt` and `decrypt` take and return `base64(nonce ‖ ciphertext ‖ tag)`
/// strings; callers never see nonces or tags directly.
pub struct Cipher {
    key: Key<Aes256Gcm>,
}

impl Cipher {
    /// Builds a cipher from a raw 32-byte key.
    ///
    /// Fails if `key` is not exactly [`KEY_LEN`] bytes.
    pub fn new(key: &[u8]) -> Result<Self, Error> {
        if key.len() != KEY_LEN {
            return Err(Error::Cipher(format!(
                "invalid key length: expected {KEY_LEN} bytes, got {}",
                key.len()
            )));
        }
        Ok(Self {
            key: *Key::<Aes256Gcm>::from_slice(key),
        })
    }

    /// Generates a fresh random key and builds a cipher from it.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self {
            key: *Key::<Aes256Gcm>::from_slice(&bytes),
        }
    }

    /// Encodes a raw key as base64, for handoff to a key collaborator.
    pub fn key_to_string(key: &[u8]) -> Result<String, Error> {
        if key.len() != KEY_LEN {
            return Err(Error::Cipher(format!(
                "invalid key length: expected {KEY_LEN} bytes, got {}",
                key.len()
            )));
        }
        Ok(BASE64.encode(key))
    }

    /// Decodes a base64-encoded key, as produced by [`Cipher::key_to_string`].
    pub fn string_to_key(encoded: &str) -> Result<Vec<u8>, Error> {
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| Error::Cipher(format!("invalid base64 key: {e}")))?;
        if bytes.len() != KEY_LEN {
            return Err(Error::Cipher(format!(
                "invalid key length: expected {KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(bytes)
    }

    /// Encrypts `plaintext`, returning `base64(nonce ‖ ciphertext ‖ tag)`.
    ///
    /// The nonce is drawn fresh from the OS RNG on every call, so two
    /// encryptions of the same plaintext never produce the same output.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, Error> {
        let cipher = Aes256Gcm::new(&self.key);
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| Error::Cipher(format!("encryption failed: {e}")))?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(&nonce_bytes);
        payload.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(payload))
    }

    /// Decrypts a value produced by [`Cipher::encrypt`].
    ///
    /// Fails on malformed base64, an input shorter than a nonce, or a
    /// GCM tag mismatch (wrong key or corrupted ciphertext).
    pub fn decrypt(&self, encoded: &str) -> Result<String, Error> {
        let payload = BASE64
            .decode(encoded)
            .map_err(|e| Error::Cipher(format!("invalid base64 ciphertext: {e}")))?;

        if payload.len() < NONCE_LEN {
            return Err(Error::Cipher(
                "ciphertext shorter than nonce length".to_string(),
            ));
        }
        let (nonce_bytes, ciphertext) = payload.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let cipher = Aes256Gcm::new(&self.key);
        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| Error::Cipher("decryption failed: tag mismatch".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| Error::Cipher(format!("decrypted value is not valid utf-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_bytes() -> [u8; KEY_LEN] {
        let mut k = [0u8; KEY_LEN];
        for (i, b) in k.iter_mut().enumerate() {
            *b = i as u8;
        }
        k
    }

    #[test]
    fn round_trip() {
        let cipher = Cipher::new(&key_bytes()).unwrap();
        let ciphertext = cipher.encrypt("p@ss").unwrap();
        assert_eq!(cipher.decrypt(&ciphertext).unwrap(), "p@ss");
    }

    #[test]
    fn distinct_ciphertexts_for_same_plaintext() {
        let cipher = Cipher::new(&key_bytes()).unwrap();
        let a = cipher.encrypt("same-value").unwrap();
        let b = cipher.encrypt("same-value").unwrap();
        assert_ne!(a, b);
        assert_eq!(cipher.decrypt(&a).unwrap(), "same-value");
        assert_eq!(cipher.decrypt(&b).unwrap(), "same-value");
    }

    #[test]
    fn wrong_key_fails() {
        let cipher_a = Cipher::new(&key_bytes()).unwrap();
        let mut other = key_bytes();
        other[0] ^= 0xff;
        let cipher_b = Cipher::new(&other).unwrap();

        let ciphertext = cipher_a.encrypt("secret").unwrap();
        assert!(cipher_b.decrypt(&ciphertext).is_err());
    }

    #[test]
    fn invalid_key_length_rejected() {
        assert!(Cipher::new(&[0u8; 16]).is_err());
        assert!(Cipher::new(&[0u8; 33]).is_err());
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let cipher = Cipher::new(&key_bytes()).unwrap();
        assert!(cipher.decrypt(&BASE64.encode([0u8; 4])).is_err());
    }

    #[test]
    fn malformed_base64_fails() {
        let cipher = Cipher::new(&key_bytes()).unwrap();
        assert!(cipher.decrypt("not-valid-base64!!!").is_err());
    }

    #[test]
    fn key_to_string_and_back() {
        let key = key_bytes();
        let encoded = Cipher::key_to_string(&key).unwrap();
        let decoded = Cipher::string_to_key(&encoded).unwrap();
        assert_eq!(decoded, key.to_vec());
    }
}
