// Rusby Wallet — Copyright (C) 2025 axpnet & Claude Opus (Anthropic)
// SPDX-License-Identifier: GPL-3.0-or-later
//
// derivation::bls: BLS12-381 master/child key derivation, hardened and
// non-hardened, generalizing bip32_utils.rs's secp256k1 scheme onto the
// BLS12-381 scalar field via blst. The curve arithmetic itself is treated
// as an opaque primitive; only the HD composition is this crate's concern.
//
// Functions:
//   master_key()          — seed -> (scalar, chain_code)
//   derive_child_private() — parent scalar -> child scalar, hardened or not
//   derive_child_public()  — parent point  -> child point (non-hardened only)
//   to_public()            — scalar -> compressed G1 point (48 bytes)

use blst::min_pk::SecretKey;
use blst::{
    blst_bendian_from_scalar, blst_fr, blst_fr_add, blst_fr_from_scalar, blst_p1,
    blst_p1_add_or_double, blst_p1_affine, blst_p1_affine_compress, blst_p1_from_affine,
    blst_p1_to_affine, blst_p1_uncompress, blst_scalar, blst_scalar_from_be_bytes,
    blst_scalar_from_fr, blst_sk_to_pk_in_g1,
};
use hmac::{Hmac, Mac};
use sha2::Sha512;

use crate::error::{VaultError, VaultResult};

type HmacSha512 = Hmac<Sha512>;

const DOMAIN_MASTER: &[u8] = b"BLS12381 seed";

/// Derive the master (scalar, chain_code) pair from a BIP-39 seed.
pub fn master_key(seed: &[u8; 64]) -> ([u8; 32], [u8; 32]) {
    let digest = hmac_sha512(DOMAIN_MASTER, seed);
    let mut key = [0u8; 32];
    let mut chain_code = [0u8; 32];
    key.copy_from_slice(&digest[..32]);
    chain_code.copy_from_slice(&digest[32..]);
    to_valid_scalar(&mut key, 0);
    (key, chain_code)
}

/// Derive a child scalar and chain code from a parent scalar.
///
/// Hardened: `HMAC-SHA512(chain_code, 0x00 || parent_key || index)`.
/// Non-hardened: `HMAC-SHA512(chain_code, compressed_parent_pubkey || index)`.
/// Either way the left half becomes an *offset* that is added, mod the
/// BLS12-381 scalar field order, to the parent scalar — exactly the
/// `add_private_keys` pattern bip32_utils.rs uses for secp256k1.
pub fn derive_child_private(
    parent_key: &[u8; 32],
    parent_chain_code: &[u8; 32],
    index: u32,
    hardened: bool,
) -> VaultResult<([u8; 32], [u8; 32])> {
    let mut msg = Vec::with_capacity(37);
    if hardened {
        msg.push(0x00);
        msg.extend_from_slice(parent_key);
    } else {
        msg.extend_from_slice(&to_public(parent_key));
    }
    msg.extend_from_slice(&index.to_be_bytes());

    let digest = hmac_sha512(parent_chain_code, &msg);
    let mut offset = [0u8; 32];
    let mut chain_code = [0u8; 32];
    offset.copy_from_slice(&digest[..32]);
    chain_code.copy_from_slice(&digest[32..]);
    to_valid_scalar(&mut offset, 0);

    let child_key = add_scalars_mod_r(parent_key, &offset);
    Ok((child_key, chain_code))
}

/// Derive a child public key from a parent public key (non-hardened only).
/// `child_pub = parent_pub + offset * G1`, mirroring `derive_child_private`
/// but operating purely on points, enabling watch-only derivation.
pub fn derive_child_public(
    parent_point: &[u8],
    parent_chain_code: &[u8; 32],
    index: u32,
) -> VaultResult<Vec<u8>> {
    if parent_point.len() != 48 {
        return Err(VaultError::UnusableChild("malformed BLS public key"));
    }
    let mut msg = Vec::with_capacity(32 + 4);
    msg.extend_from_slice(parent_point);
    msg.extend_from_slice(&index.to_be_bytes());

    let digest = hmac_sha512(parent_chain_code, &msg);
    let mut offset = [0u8; 32];
    offset.copy_from_slice(&digest[..32]);
    to_valid_scalar(&mut offset, 0);

    let offset_point = to_public(&offset);
    Ok(add_points(parent_point, &offset_point))
}

/// Compute the compressed G1 public key (48 bytes) for a scalar.
pub fn to_public(key: &[u8; 32]) -> Vec<u8> {
    let sk = SecretKey::from_bytes(key).expect("scalar validated by to_valid_scalar");
    sk.sk_to_pk().compress().to_vec()
}

fn hmac_sha512(key: &[u8], msg: &[u8]) -> [u8; 64] {
    let mut mac = HmacSha512::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(msg);
    let result = mac.finalize().into_bytes();
    let mut out = [0u8; 64];
    out.copy_from_slice(&result);
    out
}

/// Reduce `bytes` in place until it is a valid nonzero BLS12-381 scalar
/// (`0 < sk < r`), retrying with an incrementing counter appended to the
/// input on collision with the (astronomically unlikely) invalid range —
/// the same "skip to the next candidate" convention BIP-32 uses for
/// secp256k1 master-key generation.
fn to_valid_scalar(bytes: &mut [u8; 32], mut attempt: u8) {
    loop {
        if SecretKey::from_bytes(bytes).is_ok() {
            return;
        }
        attempt = attempt.wrapping_add(1);
        let digest = hmac_sha512(b"BLS12381 retry", &[bytes.as_slice(), &[attempt]].concat());
        bytes.copy_from_slice(&digest[..32]);
    }
}

/// Add two scalars modulo the BLS12-381 group order via blst's `Fr` type.
fn add_scalars_mod_r(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    unsafe {
        let mut scalar_a = blst_scalar::default();
        let mut scalar_b = blst_scalar::default();
        blst_scalar_from_be_bytes(&mut scalar_a, a.as_ptr(), a.len());
        blst_scalar_from_be_bytes(&mut scalar_b, b.as_ptr(), b.len());

        let mut fr_a = blst_fr::default();
        let mut fr_b = blst_fr::default();
        blst_fr_from_scalar(&mut fr_a, &scalar_a);
        blst_fr_from_scalar(&mut fr_b, &scalar_b);

        let mut fr_sum = blst_fr::default();
        blst_fr_add(&mut fr_sum, &fr_a, &fr_b);

        let mut scalar_sum = blst_scalar::default();
        blst_scalar_from_fr(&mut scalar_sum, &fr_sum);

        let mut out = [0u8; 32];
        blst_bendian_from_scalar(out.as_mut_ptr(), &scalar_sum);
        out
    }
}

/// Add two compressed G1 points.
fn add_points(a: &[u8], b: &[u8]) -> Vec<u8> {
    unsafe {
        let mut affine_a = blst_p1_affine::default();
        let mut affine_b = blst_p1_affine::default();
        blst_p1_uncompress(&mut affine_a, a.as_ptr());
        blst_p1_uncompress(&mut affine_b, b.as_ptr());

        let mut proj_a = blst_p1::default();
        let mut proj_b = blst_p1::default();
        blst_p1_from_affine(&mut proj_a, &affine_a);
        blst_p1_from_affine(&mut proj_b, &affine_b);

        let mut sum = blst_p1::default();
        blst_p1_add_or_double(&mut sum, &proj_a, &proj_b);

        let mut sum_affine = blst_p1_affine::default();
        blst_p1_to_affine(&mut sum_affine, &sum);

        let mut out = vec![0u8; 48];
        blst_p1_affine_compress(out.as_mut_ptr(), &sum_affine);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SEED: [u8; 64] = [3u8; 64];

    #[test]
    fn master_key_is_deterministic() {
        let (k1, c1) = master_key(&TEST_SEED);
        let (k2, c2) = master_key(&TEST_SEED);
        assert_eq!(k1, k2);
        assert_eq!(c1, c2);
    }

    #[test]
    fn hardened_and_non_hardened_children_differ() {
        let (key, chain_code) = master_key(&TEST_SEED);
        let (hardened_child, _) = derive_child_private(&key, &chain_code, 0, true).unwrap();
        let (open_child, _) = derive_child_private(&key, &chain_code, 0, false).unwrap();
        assert_ne!(hardened_child, open_child);
    }

    #[test]
    fn non_hardened_public_derivation_matches_private() {
        let (key, chain_code) = master_key(&TEST_SEED);
        let (child_key, _) = derive_child_private(&key, &chain_code, 4, false).unwrap();
        let child_pub_from_priv = to_public(&child_key);

        let parent_pub = to_public(&key);
        let child_pub_from_pub = derive_child_public(&parent_pub, &chain_code, 4).unwrap();

        assert_eq!(child_pub_from_priv, child_pub_from_pub);
    }

    #[test]
    fn public_key_is_48_bytes_compressed() {
        let (key, _) = master_key(&TEST_SEED);
        assert_eq!(to_public(&key).len(), 48);
    }
}
