// Rusby Wallet — Copyright (C) 2025 axpnet & Claude Opus (Anthropic)
// SPDX-License-Identifier: GPL-3.0-or-later
//
// vault: the HD key vault itself — address creation, signing-key retrieval,
// password rotation, and neutering. Generalizes wallet.rs's single secp256k1
// account tree into two curve-tagged branches (BLS12-381 validator/account,
// Ed25519 account) plus an imported-key side table, all behind one encrypter.
//
// Types:
//   Vault        — the whole persisted structure (E)
//   AddressInfo  — one address's public bookkeeping record
// See spec §3 for the invariants every public method here must uphold.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::crypto::{self, EncryptedBlob, EncrypterParams};
use crate::derivation::{self, Curve, ExtendedPrivateKey, ExtendedPublicKey};
use crate::error::{VaultError, VaultResult};
use crate::mnemonic;
use crate::path::{AddressPath, AddressType, Purpose, HARDENED_OFFSET};

const HRP_VALIDATOR: &str = "plv";
const HRP_ACCOUNT: &str = "pc";

/// One address's public bookkeeping record. Never contains secret material.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddressInfo {
    pub address: String,
    pub public_key: String,
    pub label: String,
    pub path: String,
}

/// One curve family's account-level key material, encrypted at rest.
/// Stored at depth 2 (`m/purpose'/coin'`); subtype and leaf index are
/// derived at request time (spec §6's depth-2 storage alternative).
#[derive(Clone, Serialize, Deserialize)]
struct PurposeBranch {
    xpub_account: ExtendedPublicKey,
    xprv_account_encrypted: Option<EncryptedBlob>,
}

#[derive(Clone, Serialize, Deserialize)]
struct Purposes {
    bls: PurposeBranch,
    bip44: PurposeBranch,
}

/// The vault: a fixed coin type, two HD branches, an imported-key side
/// table, and the address book built from both. See spec §3 for the full
/// invariant list; `Neuter` and `UpdatePassword` are the two operations
/// that touch every encrypted field at once.
#[derive(Clone, Serialize, Deserialize)]
pub struct Vault {
    coin_type: u32,
    purposes: Purposes,
    encrypter: EncrypterParams,
    mnemonic_encrypted: Option<EncryptedBlob>,
    addresses: HashMap<String, AddressInfo>,
    imported_keys: HashMap<u32, EncryptedBlob>,
    next_validator_index: u32,
    next_account_index: u32,
    next_ed25519_index: u32,
    next_imported_index: u32,
}

impl Vault {
    /// Create a fresh, unencrypted vault from a BIP-39 mnemonic. The caller
    /// owns the mnemonic string's lifetime; the seed derived from it is
    /// zeroized as soon as both branches are built.
    pub fn create_from_mnemonic(phrase: &str, coin_type: u32) -> VaultResult<Self> {
        let seed = mnemonic::to_seed(phrase)?;

        let bls_depth2 = derive_account_branch(&seed, Curve::Bls, Purpose::Bls.value(), coin_type)?;
        let bip44_depth2 = derive_account_branch(&seed, Curve::Ed25519, Purpose::Bip44.value(), coin_type)?;

        let encrypter = EncrypterParams::none();
        let bls_blob = crypto::encrypt(&encrypter, "", &bls_depth2.to_bytes())?;
        let bip44_blob = crypto::encrypt(&encrypter, "", &bip44_depth2.to_bytes())?;
        let mnemonic_blob = crypto::encrypt(&encrypter, "", phrase.as_bytes())?;

        Ok(Self {
            coin_type,
            purposes: Purposes {
                bls: PurposeBranch {
                    xpub_account: derivation::to_public(&bls_depth2),
                    xprv_account_encrypted: Some(bls_blob),
                },
                bip44: PurposeBranch {
                    xpub_account: derivation::to_public(&bip44_depth2),
                    xprv_account_encrypted: Some(bip44_blob),
                },
            },
            encrypter,
            mnemonic_encrypted: Some(mnemonic_blob),
            addresses: HashMap::new(),
            imported_keys: HashMap::new(),
            next_validator_index: 0,
            next_account_index: 0,
            next_ed25519_index: 0,
            next_imported_index: 0,
        })
    }

    /// Whether the vault's secret material has been stripped by `neuter`.
    pub fn is_neutered(&self) -> bool {
        self.purposes.bls.xprv_account_encrypted.is_none()
    }

    pub fn is_encrypted(&self) -> bool {
        !self.encrypter.is_no_op()
    }

    pub fn coin_type(&self) -> u32 {
        self.coin_type
    }

    /// A new BLS validator address. Needs only the stored public branch key,
    /// so this works even on a neutered vault.
    pub fn new_validator_address(&mut self, label: &str) -> VaultResult<AddressInfo> {
        let index = self.next_validator_index;
        let info = self.bls_address_info(AddressType::Validator, index, label)?;
        self.addresses.insert(info.address.clone(), info.clone());
        self.next_validator_index += 1;
        Ok(info)
    }

    /// A new BLS account address. Same public-only derivation as validator
    /// addresses, distinguished by subtype.
    pub fn new_bls_account_address(&mut self, label: &str) -> VaultResult<AddressInfo> {
        let index = self.next_account_index;
        let info = self.bls_address_info(AddressType::Account, index, label)?;
        self.addresses.insert(info.address.clone(), info.clone());
        self.next_account_index += 1;
        Ok(info)
    }

    /// A new Ed25519 account address. Ed25519 derivation is hardened-only,
    /// so this needs the password and fails on a neutered vault.
    pub fn new_ed25519_account_address(&mut self, password: &str, label: &str) -> VaultResult<AddressInfo> {
        let branch_xprv = self.decrypt_branch(&self.purposes.bip44, password)?;
        let index = self.next_ed25519_index;

        let subtype_node = derivation::derive_child(&branch_xprv, AddressType::Ed25519Account.value() as u32 | HARDENED_OFFSET)?;
        let leaf = derivation::derive_child(&subtype_node, index | HARDENED_OFFSET)?;
        let public_key = derivation::to_public(&leaf);

        let path = AddressPath::new(Purpose::Bip44, self.coin_type, AddressType::Ed25519Account, index);
        let address = encode_address(HRP_ACCOUNT, public_key.point_bytes());
        if self.addresses.contains_key(&address) {
            return Err(VaultError::AddressExists);
        }

        let info = AddressInfo {
            address: address.clone(),
            public_key: hex::encode(public_key.point_bytes()),
            label: label.to_string(),
            path: path.to_string(),
        };
        self.addresses.insert(address, info.clone());
        self.next_ed25519_index += 1;
        Ok(info)
    }

    /// Import a raw BLS12-381 private key, producing a validator and an
    /// account address that share it. Requires the current password even
    /// when the vault has no other secrets yet to validate against.
    pub fn import_bls_private_key(&mut self, password: &str, private_key: &[u8; 32]) -> VaultResult<(AddressInfo, AddressInfo)> {
        // Validate the password against an existing secret before touching
        // anything else; a neutered vault has none to check against.
        let _ = self.decrypt_branch(&self.purposes.bls, password)?;

        let public_key = derivation::bls::to_public(private_key);
        let index = self.next_imported_index;

        let validator_path = AddressPath::new(Purpose::Imported, self.coin_type, AddressType::Validator, index);
        let account_path = AddressPath::new(Purpose::Imported, self.coin_type, AddressType::Account, index);
        let validator_address = encode_address(HRP_VALIDATOR, &public_key);
        let account_address = encode_address(HRP_ACCOUNT, &public_key);

        if self.addresses.contains_key(&validator_address) || self.addresses.contains_key(&account_address) {
            return Err(VaultError::AddressExists);
        }

        let blob = crypto::encrypt(&self.encrypter, password, private_key)?;

        let validator_info = AddressInfo {
            address: validator_address.clone(),
            public_key: hex::encode(&public_key),
            label: String::new(),
            path: validator_path.to_string(),
        };
        let account_info = AddressInfo {
            address: account_address.clone(),
            public_key: hex::encode(&public_key),
            label: String::new(),
            path: account_path.to_string(),
        };

        self.addresses.insert(validator_address, validator_info.clone());
        self.addresses.insert(account_address, account_info.clone());
        self.imported_keys.insert(index, blob);
        self.next_imported_index += 1;

        Ok((validator_info, account_info))
    }

    /// Retrieve the signing private keys for a set of addresses, in the
    /// same order as requested. All-or-nothing: if any address is missing,
    /// unknown to HD material, or the password is wrong, no keys are
    /// returned at all.
    pub fn private_keys(&self, password: &str, addresses: &[String]) -> VaultResult<Vec<Vec<u8>>> {
        if self.is_neutered() {
            return Err(VaultError::Neutered);
        }

        let mut paths = Vec::with_capacity(addresses.len());
        for address in addresses {
            let info = self
                .addresses
                .get(address)
                .ok_or_else(|| VaultError::AddressNotFound(address.clone()))?;
            let path = AddressPath::parse(&info.path).ok_or_else(|| VaultError::AddressNotFound(address.clone()))?;
            paths.push((address, path));
        }

        let needs_bls = paths.iter().any(|(_, p)| p.purpose() == Purpose::Bls.value());
        let needs_bip44 = paths.iter().any(|(_, p)| p.purpose() == Purpose::Bip44.value());

        let bls_branch = if needs_bls {
            Some(self.decrypt_branch(&self.purposes.bls, password)?)
        } else {
            None
        };
        let bip44_branch = if needs_bip44 {
            Some(self.decrypt_branch(&self.purposes.bip44, password)?)
        } else {
            None
        };

        let mut out = Vec::with_capacity(paths.len());
        for (address, path) in &paths {
            let key = if path.purpose() == Purpose::Bls.value() {
                let branch = bls_branch.as_ref().expect("requested above");
                let subtype_node = derivation::derive_child(branch, path.address_type() as u32)?;
                let leaf = derivation::derive_child(&subtype_node, path.index())?;
                leaf.key_bytes().to_vec()
            } else if path.purpose() == Purpose::Bip44.value() {
                let branch = bip44_branch.as_ref().expect("requested above");
                let subtype_node = derivation::derive_child(branch, path.address_type() as u32 | HARDENED_OFFSET)?;
                let leaf = derivation::derive_child(&subtype_node, path.address_index())?;
                leaf.key_bytes().to_vec()
            } else {
                let blob = self
                    .imported_keys
                    .get(&path.index())
                    .ok_or_else(|| VaultError::AddressNotFound((*address).clone()))?;
                crypto::decrypt(&self.encrypter, password, blob)?
            };
            out.push(key);
        }
        Ok(out)
    }

    /// Rotate the vault's password, re-encrypting every secret blob under
    /// the new one. Atomic: either every blob is re-encrypted and swapped
    /// in together, or the vault is left completely untouched.
    pub fn update_password(&mut self, old_password: &str, new_password: &str, kdf_opts: Option<EncrypterParams>) -> VaultResult<()> {
        if self.is_neutered() {
            return Err(VaultError::Neutered);
        }

        let bls_plain = self.decrypt_branch_bytes(&self.purposes.bls, old_password)?;
        let bip44_plain = self.decrypt_branch_bytes(&self.purposes.bip44, old_password)?;
        let mnemonic_blob = self.mnemonic_encrypted.as_ref().expect("checked not neutered above");
        let mnemonic_plain = crypto::decrypt(&self.encrypter, old_password, mnemonic_blob)?;

        let mut imported_plain = HashMap::with_capacity(self.imported_keys.len());
        for (index, blob) in &self.imported_keys {
            imported_plain.insert(*index, crypto::decrypt(&self.encrypter, old_password, blob)?);
        }

        let new_encrypter = if new_password.is_empty() {
            EncrypterParams::none()
        } else {
            kdf_opts.unwrap_or_else(EncrypterParams::generate)
        };

        let new_bls_blob = crypto::encrypt(&new_encrypter, new_password, &bls_plain)?;
        let new_bip44_blob = crypto::encrypt(&new_encrypter, new_password, &bip44_plain)?;
        let new_mnemonic_blob = crypto::encrypt(&new_encrypter, new_password, &mnemonic_plain)?;
        let mut new_imported = HashMap::with_capacity(imported_plain.len());
        for (index, plain) in &imported_plain {
            new_imported.insert(*index, crypto::encrypt(&new_encrypter, new_password, plain)?);
        }

        self.encrypter = new_encrypter;
        self.purposes.bls.xprv_account_encrypted = Some(new_bls_blob);
        self.purposes.bip44.xprv_account_encrypted = Some(new_bip44_blob);
        self.mnemonic_encrypted = Some(new_mnemonic_blob);
        self.imported_keys = new_imported;
        Ok(())
    }

    /// Recover the original BIP-39 phrase.
    pub fn mnemonic(&self, password: &str) -> VaultResult<String> {
        let blob = self.mnemonic_encrypted.as_ref().ok_or(VaultError::Neutered)?;
        let plain = crypto::decrypt(&self.encrypter, password, blob)?;
        String::from_utf8(plain).map_err(|_| VaultError::InvalidPassword)
    }

    pub fn set_label(&mut self, address: &str, label: &str) -> VaultResult<()> {
        let info = self
            .addresses
            .get_mut(address)
            .ok_or_else(|| VaultError::AddressNotFound(address.to_string()))?;
        info.label = label.to_string();
        Ok(())
    }

    pub fn label(&self, address: &str) -> String {
        self.addresses.get(address).map(|info| info.label.clone()).unwrap_or_default()
    }

    pub fn address_info(&self, address: &str) -> Option<AddressInfo> {
        self.addresses.get(address).cloned()
    }

    pub fn address_from_path(&self, path: &str) -> Option<AddressInfo> {
        self.addresses.values().find(|info| info.path == path).cloned()
    }

    /// Every address in the vault, ordered by purpose (44 < 12381 < 65535),
    /// then subtype, then index ascending.
    pub fn address_infos(&self) -> Vec<AddressInfo> {
        let mut infos: Vec<AddressInfo> = self.addresses.values().cloned().collect();
        infos.sort_by_key(|info| sort_key(&info.path));
        infos
    }

    pub fn all_validator_addresses(&self) -> Vec<AddressInfo> {
        self.filtered_addresses(|path| path.purpose() == Purpose::Bls.value() && path.address_type() == AddressType::Validator.value())
    }

    /// Account-role addresses from HD derivation: BLS accounts and Ed25519
    /// accounts both count, since both represent "an account", just under
    /// different curves. Imported addresses are reported separately.
    pub fn all_account_addresses(&self) -> Vec<AddressInfo> {
        self.filtered_addresses(|path| {
            (path.purpose() == Purpose::Bls.value() && path.address_type() == AddressType::Account.value())
                || (path.purpose() == Purpose::Bip44.value() && path.address_type() == AddressType::Ed25519Account.value())
        })
    }

    pub fn all_imported_private_keys_addresses(&self) -> Vec<AddressInfo> {
        self.filtered_addresses(|path| path.purpose() == Purpose::Imported.value())
    }

    pub fn address_count(&self) -> usize {
        self.addresses.len()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.addresses.contains_key(address)
    }

    /// Produce a neutered copy: structurally identical, with every secret
    /// slot emptied. There is no mutable "neutered" flag — a vault either
    /// has its secret slots or it doesn't.
    pub fn neuter(&self) -> Self {
        let mut copy = self.clone();
        copy.purposes.bls.xprv_account_encrypted = None;
        copy.purposes.bip44.xprv_account_encrypted = None;
        copy.mnemonic_encrypted = None;
        copy.imported_keys.clear();
        copy
    }

    fn filtered_addresses(&self, pred: impl Fn(&AddressPath) -> bool) -> Vec<AddressInfo> {
        let mut infos: Vec<AddressInfo> = self
            .addresses
            .values()
            .filter(|info| AddressPath::parse(&info.path).map(|p| pred(&p)).unwrap_or(false))
            .cloned()
            .collect();
        infos.sort_by_key(|info| sort_key(&info.path));
        infos
    }

    /// Non-hardened BLS public derivation from the stored account xpub;
    /// works whether or not the vault is neutered.
    fn bls_address_info(&self, address_type: AddressType, index: u32, label: &str) -> VaultResult<AddressInfo> {
        let subtype_node = derivation::derive_child_public(&self.purposes.bls.xpub_account, address_type.value() as u32)?;
        let leaf = derivation::derive_child_public(&subtype_node, index)?;

        let path = AddressPath::new(Purpose::Bls, self.coin_type, address_type, index);
        let hrp = match address_type {
            AddressType::Validator => HRP_VALIDATOR,
            _ => HRP_ACCOUNT,
        };
        let address = encode_address(hrp, leaf.point_bytes());
        if self.addresses.contains_key(&address) {
            return Err(VaultError::AddressExists);
        }

        Ok(AddressInfo {
            address,
            public_key: hex::encode(leaf.point_bytes()),
            label: label.to_string(),
            path: path.to_string(),
        })
    }

    fn decrypt_branch(&self, branch: &PurposeBranch, password: &str) -> VaultResult<ExtendedPrivateKey> {
        let bytes = self.decrypt_branch_bytes(branch, password)?;
        ExtendedPrivateKey::from_bytes(&bytes).ok_or(VaultError::InvalidPassword)
    }

    fn decrypt_branch_bytes(&self, branch: &PurposeBranch, password: &str) -> VaultResult<Vec<u8>> {
        let blob = branch.xprv_account_encrypted.as_ref().ok_or(VaultError::Neutered)?;
        crypto::decrypt(&self.encrypter, password, blob)
    }
}

/// Sort key for address ordering: purpose rank, then subtype, then index.
fn sort_key(path: &str) -> (u8, u8, u32) {
    let Some(parsed) = AddressPath::parse(path) else {
        return (u8::MAX, u8::MAX, u32::MAX);
    };
    let purpose_rank = match parsed.purpose() {
        44 => 0,
        12381 => 1,
        65535 => 2,
        _ => 3,
    };
    (purpose_rank, parsed.address_type(), parsed.index())
}

/// Derive the depth-2 account key `m/purpose'/coin_type'` from a seed.
fn derive_account_branch(seed: &[u8; 64], curve: Curve, purpose: u32, coin_type: u32) -> VaultResult<ExtendedPrivateKey> {
    let master = derivation::new_master(seed, curve);
    let purpose_node = derivation::derive_child(&master, purpose | HARDENED_OFFSET)?;
    derivation::derive_child(&purpose_node, coin_type | HARDENED_OFFSET)
}

fn encode_address(hrp: &str, payload: &[u8]) -> String {
    let hrp = bech32::Hrp::parse(hrp).expect("static HRP is valid");
    bech32::encode::<bech32::Bech32m>(hrp, payload).expect("bech32m encoding never fails for valid HRPs")
}
