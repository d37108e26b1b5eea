// Rusby Wallet — Copyright (C) 2025 axpnet & Claude Opus (Anthropic)
// SPDX-License-Identifier: GPL-3.0-or-later
//
// error: the closed set of failure kinds a vault operation can raise.
//
// Types:
//   VaultError  — one variant per failure kind, stable error-code friendly
//   VaultResult — Result<T, VaultError> alias

use thiserror::Error as ThisError;

pub type VaultResult<T> = std::result::Result<T, VaultError>;

/// Every way a vault operation can fail, closed over spec'd error kinds.
///
/// No operation reports anything outside this set: callers can match
/// exhaustively and map each variant to a stable RPC error code.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("invalid BIP-39 mnemonic")]
    InvalidMnemonic,

    #[error("invalid password")]
    InvalidPassword,

    #[error("address not found: {0}")]
    AddressNotFound(String),

    #[error("address already exists")]
    AddressExists,

    #[error("vault is neutered: no secret material available")]
    Neutered,

    #[error("unusable child derivation: {0}")]
    UnusableChild(&'static str),
}
