// Rusby Wallet — Copyright (C) 2025 axpnet & Claude Opus (Anthropic)
// SPDX-License-Identifier: GPL-3.0-or-later
//
// crypto: AES-256-GCM symmetric encryption with an Argon2id (memory-hard)
// key derivation function — the encrypter envelope (D).
//
// Types:
//   EncrypterParams — KDF cost parameters + salt + cipher id, stored in plaintext
//   EncryptedBlob   — nonce + ciphertext container
// Functions:
//   encrypt() / decrypt() — as described in spec §4.4, including the
//                           empty-password no-op mode

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::{VaultError, VaultResult};

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

const CIPHER_NONE: &str = "none";
const CIPHER_AES_256_GCM: &str = "aes-256-gcm";

/// OWASP 2023 baseline for Argon2id: 19 MiB memory, 2 iterations, 1 lane.
/// Test hooks may lower these (spec §4.4's "Test hooks" note).
const DEFAULT_MEMORY_COST_KIB: u32 = 19 * 1024;
const DEFAULT_ITERATIONS: u32 = 2;
const DEFAULT_PARALLELISM: u32 = 1;

/// The encrypter's configuration, stored alongside every blob it produces.
/// Not itself secret: the salt and cost parameters are meaningless without
/// the password.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncrypterParams {
    memory_cost_kib: u32,
    iterations: u32,
    parallelism: u32,
    salt: Vec<u8>,
    cipher: String,
}

impl EncrypterParams {
    /// The no-op envelope: `encrypt` is identity-with-header, `decrypt`
    /// accepts only the empty password.
    pub fn none() -> Self {
        Self {
            memory_cost_kib: 0,
            iterations: 0,
            parallelism: 0,
            salt: Vec::new(),
            cipher: CIPHER_NONE.to_string(),
        }
    }

    /// A fresh envelope with a random salt and production-grade cost
    /// parameters.
    pub fn generate() -> Self {
        let mut salt = vec![0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        Self {
            memory_cost_kib: DEFAULT_MEMORY_COST_KIB,
            iterations: DEFAULT_ITERATIONS,
            parallelism: DEFAULT_PARALLELISM,
            salt,
            cipher: CIPHER_AES_256_GCM.to_string(),
        }
    }

    /// Same as `generate`, with KDF cost parameters low enough to make
    /// tests fast. Not a security-critical default — never use outside
    /// tests.
    pub fn fast_for_tests() -> Self {
        let mut params = Self::generate();
        params.memory_cost_kib = 8;
        params.iterations = 1;
        params.parallelism = 1;
        params
    }

    pub fn is_no_op(&self) -> bool {
        self.cipher == CIPHER_NONE
    }
}

/// An encrypted secret blob: nonce plus ciphertext (the MAC is appended to
/// the ciphertext by AES-GCM itself). Custom `Debug` redacts both fields so
/// a stray `{:?}` never leaks key material into logs.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncryptedBlob {
    nonce: Vec<u8>,
    ciphertext: Vec<u8>,
}

impl std::fmt::Debug for EncryptedBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedBlob")
            .field("nonce", &format!("[{} bytes]", self.nonce.len()))
            .field("ciphertext", &format!("[{} bytes REDACTED]", self.ciphertext.len()))
            .finish()
    }
}

/// Derive the AES-256 key from `password` via Argon2id. The returned key
/// must be zeroized by the caller after use.
fn derive_key(params: &EncrypterParams, password: &str) -> VaultResult<[u8; KEY_LEN]> {
    let argon2_params = Params::new(
        params.memory_cost_kib,
        params.iterations,
        params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|_| VaultError::InvalidPassword)?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password.as_bytes(), &params.salt, &mut key)
        .map_err(|_| VaultError::InvalidPassword)?;
    Ok(key)
}

/// Encrypt `plaintext` under `password`, per `params`.
pub fn encrypt(params: &EncrypterParams, password: &str, plaintext: &[u8]) -> VaultResult<EncryptedBlob> {
    if params.is_no_op() {
        return Ok(EncryptedBlob {
            nonce: Vec::new(),
            ciphertext: plaintext.to_vec(),
        });
    }

    let mut key = derive_key(params, password)?;
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| {
        key.zeroize();
        VaultError::InvalidPassword
    })?;
    key.zeroize();

    let mut nonce_bytes = vec![0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| VaultError::InvalidPassword)?;

    Ok(EncryptedBlob {
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Decrypt `blob` with `password`, per `params`. Any failure — wrong
/// password or tampered ciphertext — surfaces as `InvalidPassword`; the
/// caller cannot distinguish the two (spec §4.4).
pub fn decrypt(params: &EncrypterParams, password: &str, blob: &EncryptedBlob) -> VaultResult<Vec<u8>> {
    if params.is_no_op() {
        return if password.is_empty() {
            Ok(blob.ciphertext.clone())
        } else {
            Err(VaultError::InvalidPassword)
        };
    }

    let mut key = derive_key(params, password)?;
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| {
        key.zeroize();
        VaultError::InvalidPassword
    })?;
    key.zeroize();

    let nonce = Nonce::from_slice(&blob.nonce);
    cipher
        .decrypt(nonce, blob.ciphertext.as_ref())
        .map_err(|_| VaultError::InvalidPassword)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_under_correct_password() {
        let params = EncrypterParams::fast_for_tests();
        let blob = encrypt(&params, "correct horse", b"secret seed material").unwrap();
        let plaintext = decrypt(&params, "correct horse", &blob).unwrap();
        assert_eq!(plaintext, b"secret seed material");
    }

    #[test]
    fn wrong_password_is_invalid_password() {
        let params = EncrypterParams::fast_for_tests();
        let blob = encrypt(&params, "correct", b"data").unwrap();
        let err = decrypt(&params, "wrong", &blob).unwrap_err();
        assert_eq!(err, VaultError::InvalidPassword);
    }

    #[test]
    fn tampered_ciphertext_is_also_invalid_password() {
        let params = EncrypterParams::fast_for_tests();
        let mut blob = encrypt(&params, "pw", b"data").unwrap();
        let last = blob.ciphertext.len() - 1;
        blob.ciphertext[last] ^= 0xFF;
        let err = decrypt(&params, "pw", &blob).unwrap_err();
        assert_eq!(err, VaultError::InvalidPassword);
    }

    #[test]
    fn no_op_mode_round_trips_empty_password_only() {
        let params = EncrypterParams::none();
        let blob = encrypt(&params, "", b"plaintext vault seed").unwrap();
        assert_eq!(decrypt(&params, "", &blob).unwrap(), b"plaintext vault seed");
        assert_eq!(decrypt(&params, "anything", &blob).unwrap_err(), VaultError::InvalidPassword);
    }

    #[test]
    fn different_nonces_for_same_plaintext() {
        let params = EncrypterParams::fast_for_tests();
        let blob1 = encrypt(&params, "pw", b"same data").unwrap();
        let blob2 = encrypt(&params, "pw", b"same data").unwrap();
        assert_ne!(blob1.ciphertext, blob2.ciphertext);
    }
}
