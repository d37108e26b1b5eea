// Rusby Wallet — Pure Rust HD key vault for a single blockchain wallet
// Copyright (C) 2025 axpnet & Claude Opus (Anthropic)
// SPDX-License-Identifier: GPL-3.0-or-later
//
// vault-core: crypto library with zero UI dependencies
//
// Modules:
//   error      — closed set of vault failure kinds
//   mnemonic   — BIP-39 generation, validation, seed derivation
//   path       — `m/purpose'/coin'/type'/index(')` address path grammar
//   crypto     — AES-256-GCM encrypt/decrypt with Argon2id (the encrypter envelope)
//   derivation — BIP32-style extended-key derivation over BLS12-381 and Ed25519
//   vault      — the vault itself: addresses, signing keys, password rotation, neutering

pub mod crypto;
pub mod derivation;
pub mod error;
pub mod mnemonic;
pub mod path;
pub mod vault;

pub use error::{VaultError, VaultResult};
pub use vault::{AddressInfo, Vault};
