// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use rand::RngCore;
use sha2::{Digest, Sha256, Sha512};

use crate::error::CryptoError;

pub fn random_bytes(n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    rand::rng().fill_bytes(&mut buf);
    buf
}

pub fn random_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn hash(algo: &str, bytes: &[u8]) -> Result<String, CryptoError> {
    match algo {
        "sha256" => Ok(hex::encode(Sha256::digest(bytes))),
        "sha512" => Ok(hex::encode(Sha512::digest(bytes))),
        other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
    }
}

pub struct EncryptResult {
    pub ciphertext: Vec<u8>,
    pub iv: Vec<u8>,
    pub tag: Vec<u8>,
}

const GCM_NONCE_LEN: usize = 12;
const GCM_TAG_LEN: usize = 16;

pub fn encrypt(algo: &str, key: &[u8], data: &[u8]) -> Result<EncryptResult, CryptoError> {
    require_aes_256_gcm(algo)?;
    let cipher = build_cipher(key)?;
    let mut iv = vec![0u8; GCM_NONCE_LEN];
    rand::rng().fill_bytes(&mut iv);
    let nonce = Nonce::from_slice(&iv);
    let mut sealed = cipher
        .encrypt(nonce, data)
        .map_err(|_| CryptoError::DecryptionFailed)?;
    let tag = sealed.split_off(sealed.len() - GCM_TAG_LEN);
    Ok(EncryptResult {
        ciphertext: sealed,
        iv,
        tag,
    })
}

pub fn decrypt(
    algo: &str,
    key: &[u8],
    ciphertext: &[u8],
    iv: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    require_aes_256_gcm(algo)?;
    let cipher = build_cipher(key)?;
    let nonce = Nonce::from_slice(iv);
    let mut sealed = Vec::with_capacity(ciphertext.len() + tag.len());
    sealed.extend_from_slice(ciphertext);
    sealed.extend_from_slice(tag);
    cipher
        .decrypt(nonce, sealed.as_ref())
        .map_err(|_| CryptoError::DecryptionFailed)
}

fn require_aes_256_gcm(algo: &str) -> Result<(), CryptoError> {
    if algo == "aes-256-gcm" {
        Ok(())
    } else {
        Err(CryptoError::UnsupportedAlgorithm(algo.to_string()))
    }
}

fn build_cipher(key: &[u8]) -> Result<Aes256Gcm, CryptoError> {
    if key.len() != 32 {
        return Err(CryptoError::InvalidKeyLength {
            expected: 32,
            got: key.len(),
        });
    }
    let key = aes_gcm::Key::<Aes256Gcm>::from_slice(key);
    Ok(Aes256Gcm::new(key))
}

pub fn derive_key(password: &[u8], salt: &[u8], iterations: u32, length: usize) -> Vec<u8> {
    let mut out = vec![0u8; length];
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_sha256_matches_known_vector() {
        let digest = hash("sha256", b"hello").expect("hash");
        assert_eq!(
            digest,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let key = random_bytes(32);
        let plaintext = b"attack at dawn";
        let enc = encrypt("aes-256-gcm", &key, plaintext).expect("encrypt");
        let decrypted = decrypt("aes-256-gcm", &key, &enc.ciphertext, &enc.iv, &enc.tag)
            .expect("decrypt");
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn decrypt_with_wrong_key_fails() {
        let key = random_bytes(32);
        let wrong_key = random_bytes(32);
        let enc = encrypt("aes-256-gcm", &key, b"secret").expect("encrypt");
        assert!(decrypt("aes-256-gcm", &wrong_key, &enc.ciphertext, &enc.iv, &enc.tag).is_err());
    }

    #[test]
    fn derive_key_is_deterministic_for_same_inputs() {
        let a = derive_key(b"password", b"salt", 1000, 32);
        let b = derive_key(b"password", b"salt", 1000, 32);
        assert_eq!(a, b);
    }

    #[test]
    fn random_bytes_produces_requested_length_and_varies() {
        let a = random_bytes(16);
        let b = random_bytes(16);
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
    }

    #[test]
    fn unsupported_algorithm_is_rejected() {
        let err = hash("md5", b"x").unwrap_err();
        assert!(matches!(err, CryptoError::UnsupportedAlgorithm(_)));
    }
}
