// Rusby Wallet — Copyright (C) 2025 axpnet & Claude Opus (Anthropic)
// SPDX-License-Identifier: GPL-3.0-or-later
//
// mnemonic: BIP-39 mnemonic validation and seed derivation
//
// Functions:
//   generate()        — generate a new mnemonic phrase
//   validate()         — validate a mnemonic phrase against the English wordlist
//   to_seed()          — mnemonic + empty BIP-39 passphrase -> 64-byte seed

use bip39::Mnemonic;
use zeroize::Zeroize;

use crate::error::{VaultError, VaultResult};

/// Word count options for mnemonic generation.
#[derive(Debug, Clone, Copy)]
pub enum WordCount {
    W12 = 12,
    W15 = 15,
    W18 = 18,
    W21 = 21,
    W24 = 24,
}

/// Generate a new BIP-39 mnemonic phrase (English wordlist).
pub fn generate(word_count: WordCount) -> String {
    Mnemonic::generate_in(bip39::Language::English, word_count as usize)
        .expect("valid word count")
        .to_string()
}

/// Validate a BIP-39 mnemonic phrase against the English wordlist and checksum.
pub fn validate(phrase: &str) -> bool {
    Mnemonic::parse_in(bip39::Language::English, phrase).is_ok()
}

/// Derive the 64-byte BIP-39 seed from a mnemonic, using an empty passphrase
/// as required by spec §4.5 (`CreateVaultFromMnemonic`).
///
/// The mnemonic is never stored in cleartext beyond this call; the caller
/// of the vault owns wiping its own copy.
pub fn to_seed(phrase: &str) -> VaultResult<[u8; 64]> {
    let mnemonic = Mnemonic::parse_in(bip39::Language::English, phrase)
        .map_err(|_| VaultError::InvalidMnemonic)?;
    let mut seed = mnemonic.to_seed("");
    let out = seed;
    seed.zeroize();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_MNEMONIC: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn generates_requested_word_count() {
        let phrase = generate(WordCount::W12);
        assert_eq!(phrase.split_whitespace().count(), 12);
        assert!(validate(&phrase));

        let phrase = generate(WordCount::W24);
        assert_eq!(phrase.split_whitespace().count(), 24);
        assert!(validate(&phrase));
    }

    #[test]
    fn rejects_invalid_phrase() {
        assert!(!validate("invalid mnemonic phrase"));
    }

    #[test]
    fn seed_is_deterministic() {
        let seed1 = to_seed(TEST_MNEMONIC).unwrap();
        let seed2 = to_seed(TEST_MNEMONIC).unwrap();
        assert_eq!(seed1, seed2);
        assert_eq!(seed1.len(), 64);
    }

    #[test]
    fn invalid_mnemonic_is_rejected() {
        let err = to_seed("not a real mnemonic at all here").unwrap_err();
        assert_eq!(err, VaultError::InvalidMnemonic);
    }
}
