// Rusby Wallet — Copyright (C) 2025 axpnet & Claude Opus (Anthropic)
// SPDX-License-Identifier: GPL-3.0-or-later
//
// derivation: BIP32-style extended-key derivation over two curve families
//
// Types:
//   Curve               — which key family an extended key belongs to
//   ExtendedPrivateKey   — scalar + chain code + depth, curve-tagged
//   ExtendedPublicKey    — point + chain code + depth, curve-tagged
// Functions:
//   new_master()         — seed -> master xprv for a curve
//   derive_child()        — xprv -> child xprv (hardened or not, per curve)
//   derive_child_public() — xpub -> child xpub (BLS only; Ed25519 always fails)
//   to_public()           — xprv -> xpub

pub mod bls;
pub mod ed25519;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

use crate::error::{VaultError, VaultResult};
use crate::path::HARDENED_OFFSET;

/// Which curve family an extended key belongs to. Drives dispatch instead of
/// a trait-object hierarchy, per the design note: two curves, one small
/// capability set, no need for polymorphic inheritance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curve {
    Bls,
    Ed25519,
}

impl Curve {
    fn tag(self) -> &'static str {
        match self {
            Curve::Bls => "bls",
            Curve::Ed25519 => "ed25519",
        }
    }

    fn from_tag(s: &str) -> Option<Self> {
        match s {
            "bls" => Some(Curve::Bls),
            "ed25519" => Some(Curve::Ed25519),
            _ => None,
        }
    }
}

/// An extended private key: a 32-byte scalar, a 32-byte chain code, and a
/// tree depth, tagged by curve. `Drop`s its scalar material via zeroize.
#[derive(Clone)]
pub struct ExtendedPrivateKey {
    pub curve: Curve,
    key: [u8; 32],
    chain_code: [u8; 32],
    depth: u8,
}

impl Drop for ExtendedPrivateKey {
    fn drop(&mut self) {
        self.key.zeroize();
        self.chain_code.zeroize();
    }
}

impl ExtendedPrivateKey {
    pub fn key_bytes(&self) -> &[u8; 32] {
        &self.key
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Byte container used internally (e.g. as encrypter plaintext). Opaque
    /// to everything but this module.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + 32 + 32 + 1);
        out.push(match self.curve {
            Curve::Bls => 0u8,
            Curve::Ed25519 => 1u8,
        });
        out.extend_from_slice(&self.key);
        out.extend_from_slice(&self.chain_code);
        out.push(self.depth);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != 66 {
            return None;
        }
        let curve = match bytes[0] {
            0 => Curve::Bls,
            1 => Curve::Ed25519,
            _ => return None,
        };
        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes[1..33]);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&bytes[33..65]);
        let depth = bytes[65];
        Some(Self {
            curve,
            key,
            chain_code,
            depth,
        })
    }

    /// Opaque ASCII container form (§4.1): the vault never parses its
    /// interior, it only round-trips it.
    pub fn to_extended_string(&self) -> String {
        format!("xprv-{}-{}-{}", self.curve.tag(), self.depth, hex::encode(self.to_bytes()))
    }

    pub fn from_extended_string(s: &str) -> Option<Self> {
        let rest = s.strip_prefix("xprv-")?;
        let mut parts = rest.splitn(3, '-');
        let curve_tag = parts.next()?;
        let _depth = parts.next()?;
        let body = parts.next()?;
        let bytes = hex::decode(body).ok()?;
        let key = Self::from_bytes(&bytes)?;
        if key.curve.tag() != curve_tag {
            return None;
        }
        Some(key)
    }
}

/// An extended public key: a compressed curve point, chain code, and depth.
#[derive(Clone, PartialEq, Eq)]
pub struct ExtendedPublicKey {
    pub curve: Curve,
    point: Vec<u8>,
    chain_code: [u8; 32],
    depth: u8,
}

impl ExtendedPublicKey {
    pub fn point_bytes(&self) -> &[u8] {
        &self.point
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn to_extended_string(&self) -> String {
        format!(
            "xpub-{}-{}-{}-{}",
            self.curve.tag(),
            self.depth,
            hex::encode(self.chain_code),
            hex::encode(&self.point)
        )
    }

    pub fn from_extended_string(s: &str) -> Option<Self> {
        let rest = s.strip_prefix("xpub-")?;
        let mut parts = rest.splitn(4, '-');
        let curve = Curve::from_tag(parts.next()?)?;
        let depth: u8 = parts.next()?.parse().ok()?;
        let chain_code_hex = parts.next()?;
        let point_hex = parts.next()?;
        let chain_code_bytes = hex::decode(chain_code_hex).ok()?;
        if chain_code_bytes.len() != 32 {
            return None;
        }
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&chain_code_bytes);
        let point = hex::decode(point_hex).ok()?;
        Some(Self {
            curve,
            point,
            chain_code,
            depth,
        })
    }
}

/// Extended public keys are not secret, so they serialize as their opaque
/// string form directly — no enclosing envelope needed.
impl Serialize for ExtendedPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_extended_string())
    }
}

impl<'de> Deserialize<'de> for ExtendedPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_extended_string(&s).ok_or_else(|| DeError::custom("malformed extended public key"))
    }
}

/// Derive the master extended private key for a curve from a BIP-39 seed.
pub fn new_master(seed: &[u8; 64], curve: Curve) -> ExtendedPrivateKey {
    let (key, chain_code) = match curve {
        Curve::Bls => bls::master_key(seed),
        Curve::Ed25519 => ed25519::master_key(seed),
    };
    ExtendedPrivateKey {
        curve,
        key,
        chain_code,
        depth: 0,
    }
}

/// Derive a child extended private key at `index`. `index` should already
/// carry the hardening bit (`HARDENED_OFFSET`) when a hardened child is
/// wanted; Ed25519 rejects anything else.
pub fn derive_child(parent: &ExtendedPrivateKey, index: u32) -> VaultResult<ExtendedPrivateKey> {
    let hardened = index & HARDENED_OFFSET != 0;
    let (key, chain_code) = match parent.curve {
        Curve::Bls => bls::derive_child_private(&parent.key, &parent.chain_code, index, hardened)?,
        Curve::Ed25519 => {
            if !hardened {
                return Err(VaultError::UnusableChild(
                    "Ed25519 derivation requires a hardened index",
                ));
            }
            ed25519::derive_child_private(&parent.key, &parent.chain_code, index)
        }
    };
    Ok(ExtendedPrivateKey {
        curve: parent.curve,
        key,
        chain_code,
        depth: parent.depth.saturating_add(1),
    })
}

/// Derive a child extended public key from a public-only parent. Only the
/// BLS variant supports this; Ed25519 always returns `UnusableChild`.
pub fn derive_child_public(parent: &ExtendedPublicKey, index: u32) -> VaultResult<ExtendedPublicKey> {
    if index & HARDENED_OFFSET != 0 {
        return Err(VaultError::UnusableChild(
            "hardened derivation requires the private key",
        ));
    }
    match parent.curve {
        Curve::Bls => {
            let point = bls::derive_child_public(&parent.point, &parent.chain_code, index)?;
            Ok(ExtendedPublicKey {
                curve: Curve::Bls,
                point,
                chain_code: parent.chain_code,
                depth: parent.depth.saturating_add(1),
            })
        }
        Curve::Ed25519 => Err(VaultError::UnusableChild(
            "Ed25519 does not support non-hardened derivation",
        )),
    }
}

/// Neuter a single extended key: compute its public counterpart.
pub fn to_public(xprv: &ExtendedPrivateKey) -> ExtendedPublicKey {
    let point = match xprv.curve {
        Curve::Bls => bls::to_public(&xprv.key),
        Curve::Ed25519 => ed25519::to_public(&xprv.key),
    };
    ExtendedPublicKey {
        curve: xprv.curve,
        point,
        chain_code: xprv.chain_code,
        depth: xprv.depth,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SEED: [u8; 64] = [7u8; 64];

    #[test]
    fn master_derivation_is_deterministic() {
        let a = new_master(&TEST_SEED, Curve::Bls);
        let b = new_master(&TEST_SEED, Curve::Bls);
        assert_eq!(a.key_bytes(), b.key_bytes());
        assert_eq!(a.chain_code(), b.chain_code());
    }

    #[test]
    fn bls_and_ed25519_masters_differ() {
        let bls = new_master(&TEST_SEED, Curve::Bls);
        let ed = new_master(&TEST_SEED, Curve::Ed25519);
        assert_ne!(bls.key_bytes(), ed.key_bytes());
    }

    #[test]
    fn ed25519_non_hardened_child_is_unusable() {
        let master = new_master(&TEST_SEED, Curve::Ed25519);
        let err = derive_child(&master, 0).unwrap_err();
        assert!(matches!(err, VaultError::UnusableChild(_)));
    }

    #[test]
    fn bls_non_hardened_child_matches_public_derivation() {
        let master = new_master(&TEST_SEED, Curve::Bls);
        let child = derive_child(&master, 0).unwrap();
        let child_pub_from_priv = to_public(&child);

        let master_pub = to_public(&master);
        let child_pub_from_pub = derive_child_public(&master_pub, 0).unwrap();

        assert_eq!(child_pub_from_priv.point_bytes(), child_pub_from_pub.point_bytes());
    }

    #[test]
    fn extended_key_string_round_trips() {
        let master = new_master(&TEST_SEED, Curve::Bls);
        let s = master.to_extended_string();
        let back = ExtendedPrivateKey::from_extended_string(&s).unwrap();
        assert_eq!(master.key_bytes(), back.key_bytes());

        let xpub = to_public(&master);
        let s = xpub.to_extended_string();
        let back = ExtendedPublicKey::from_extended_string(&s).unwrap();
        assert_eq!(xpub.point_bytes(), back.point_bytes());
    }
}
