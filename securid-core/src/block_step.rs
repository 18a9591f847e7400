// File:    block_step.rs
// Author:  apezoo
// Date:    2026-10-19
//
// Description: Single-block AES-128 encryption used by each derivation round.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! One AES-128 block encryption (ECB, no padding).

use aes::Aes128;
use aes::cipher::{BlockEncrypt, KeyInit};

use crate::error::{Result, SecurIdError};

/// AES block length in bytes.
pub const BLOCK_LEN: usize = 16;

/// Encrypts one 16-byte block under a 16-byte AES key.
///
/// # Errors
///
/// Returns [`SecurIdError::CipherFailure`] if `key` is not a valid AES-128 key.
pub fn encrypt_block(plaintext: &[u8; BLOCK_LEN], key: &[u8]) -> Result<[u8; BLOCK_LEN]> {
    let cipher =
        Aes128::new_from_slice(key).map_err(|e| SecurIdError::CipherFailure(e.to_string()))?;

    let mut block = aes::Block::clone_from_slice(plaintext);
    cipher.encrypt_block(&mut block);

    let mut out = [0u8; BLOCK_LEN];
    out.copy_from_slice(&block);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fips_197_vector() {
        let key = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let mut plaintext = [0u8; BLOCK_LEN];
        hex::decode_to_slice("00112233445566778899aabbccddeeff", &mut plaintext).unwrap();

        let ciphertext = encrypt_block(&plaintext, &key).unwrap();
        assert_eq!(hex::encode(ciphertext), "69c4e0d86a7b0430d8cdb78070b4c55a");
    }

    #[test]
    fn test_rejects_short_key() {
        let result = encrypt_block(&[0u8; BLOCK_LEN], &[0u8; 15]);
        assert!(matches!(result, Err(SecurIdError::CipherFailure(_))));
    }
}
