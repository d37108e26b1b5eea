// Rusby Wallet — Copyright (C) 2025 axpnet & Claude Opus (Anthropic)
// SPDX-License-Identifier: GPL-3.0-or-later
//
// derivation::ed25519: SLIP-10 Ed25519 derivation, hardened-only.
// Directly generalizes bip32_utils.rs's derive_ed25519_key_from_seed — same
// domain-separated HMAC-SHA512 master key, same "every step hardened"
// discipline. Non-hardened derivation is not offered here at all: callers
// go through derivation::mod's dispatch, which turns a non-hardened index
// into `UnusableChild` before reaching this module.
//
// Functions:
//   master_key()           — seed -> (scalar, chain_code)
//   derive_child_private()  — parent scalar -> child scalar (always hardened)
//   to_public()             — scalar -> 32-byte Ed25519 public key

use ed25519_dalek::SigningKey;
use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

const DOMAIN_MASTER: &[u8] = b"ed25519 seed";

pub fn master_key(seed: &[u8; 64]) -> ([u8; 32], [u8; 32]) {
    let digest = hmac_sha512(DOMAIN_MASTER, seed);
    let mut key = [0u8; 32];
    let mut chain_code = [0u8; 32];
    key.copy_from_slice(&digest[..32]);
    chain_code.copy_from_slice(&digest[32..]);
    (key, chain_code)
}

/// `index` must already carry the hardened bit; the caller (derivation::mod)
/// is responsible for rejecting non-hardened requests before calling in.
pub fn derive_child_private(parent_key: &[u8; 32], parent_chain_code: &[u8; 32], index: u32) -> ([u8; 32], [u8; 32]) {
    let mut msg = Vec::with_capacity(37);
    msg.push(0x00);
    msg.extend_from_slice(parent_key);
    msg.extend_from_slice(&index.to_be_bytes());

    let digest = hmac_sha512(parent_chain_code, &msg);
    let mut key = [0u8; 32];
    let mut chain_code = [0u8; 32];
    key.copy_from_slice(&digest[..32]);
    chain_code.copy_from_slice(&digest[32..]);
    (key, chain_code)
}

pub fn to_public(key: &[u8; 32]) -> Vec<u8> {
    let signing_key = SigningKey::from_bytes(key);
    signing_key.verifying_key().as_bytes().to_vec()
}

fn hmac_sha512(key: &[u8], msg: &[u8]) -> [u8; 64] {
    let mut mac = HmacSha512::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(msg);
    let result = mac.finalize().into_bytes();
    let mut out = [0u8; 64];
    out.copy_from_slice(&result);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SEED: [u8; 64] = [9u8; 64];

    #[test]
    fn master_key_is_deterministic() {
        let (k1, c1) = master_key(&TEST_SEED);
        let (k2, c2) = master_key(&TEST_SEED);
        assert_eq!(k1, k2);
        assert_eq!(c1, c2);
    }

    #[test]
    fn child_derivation_is_deterministic_and_distinct_per_index() {
        let (key, chain_code) = master_key(&TEST_SEED);
        let (child0, _) = derive_child_private(&key, &chain_code, 0 | crate::path::HARDENED_OFFSET);
        let (child0_again, _) = derive_child_private(&key, &chain_code, 0 | crate::path::HARDENED_OFFSET);
        let (child1, _) = derive_child_private(&key, &chain_code, 1 | crate::path::HARDENED_OFFSET);

        assert_eq!(child0, child0_again);
        assert_ne!(child0, child1);
    }

    #[test]
    fn public_key_is_32_bytes() {
        let (key, _) = master_key(&TEST_SEED);
        assert_eq!(to_public(&key).len(), 32);
    }
}
