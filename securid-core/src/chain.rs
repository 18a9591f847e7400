// File:    chain.rs
// Author:  apezoo
// Date:    2026-10-19
//
// Description: Drives the five chained key-derivation rounds that produce the quad block.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! The five-round derivation chain.
//!
//! Each round builds fresh key material from the time record and serial, then
//! encrypts it under the running chain state. The seed is the state for the
//! first round; every later round uses the previous round's output.

use crate::block_step::{self, BLOCK_LEN};
use crate::error::Result;
use crate::key_material::{self, ROUND_PREFIX_LENGTHS};
use crate::time_encoder::BcdRecord;
use crate::token::TokenCredential;

/// The final 16-byte derivation output: four big-endian 32-bit code candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadBlock([u8; BLOCK_LEN]);

impl QuadBlock {
    /// The raw block bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; BLOCK_LEN] {
        &self.0
    }

    /// The candidate starting at byte `offset`. Offsets are reduced to 0, 4, 8 or 12.
    #[must_use]
    pub const fn candidate(&self, offset: usize) -> u32 {
        let i = offset & 0b1100;
        u32::from_be_bytes([self.0[i], self.0[i + 1], self.0[i + 2], self.0[i + 3]])
    }
}

impl From<[u8; BLOCK_LEN]> for QuadBlock {
    fn from(bytes: [u8; BLOCK_LEN]) -> Self {
        Self(bytes)
    }
}

/// Runs the derivation chain for `credential` over the time record `bcd`.
///
/// # Errors
///
/// Returns [`crate::SecurIdError::CipherFailure`] if the block cipher fails.
pub fn derive_block(credential: &TokenCredential, bcd: &BcdRecord) -> Result<QuadBlock> {
    let serial = credential.serial();
    let mut state = *credential.seed().as_bytes();

    for (round, prefix_len) in ROUND_PREFIX_LENGTHS.into_iter().enumerate() {
        let material = key_material::build_key(bcd, prefix_len, serial);
        state = block_step::encrypt_block(&material, &state)?;
        log::trace!("derivation round {round} used a {prefix_len}-byte time prefix");
    }

    Ok(QuadBlock(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_encoder::{Interval, TimeContext, encode};
    use chrono::{TimeZone, Utc};

    const SEED: &str = "e0:c9:5e:9c:79:a5:d9:66:61:6b:8e:3a:2a:0b:05:2a";

    fn block_at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> QuadBlock {
        let credential = TokenCredential::parse("000154434212", SEED).unwrap();
        let time = TimeContext::from(Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap());
        derive_block(&credential, &encode(&time, credential.interval())).unwrap()
    }

    #[test]
    fn test_known_quad_block() {
        let block = block_at(2024, 3, 14, 15, 9);
        assert_eq!(
            hex::encode(block.as_bytes()),
            "d1f181fc54f098502d2adc793b963bd9"
        );
        assert_eq!(block.candidate(0), 0xd1f1_81fc);
        assert_eq!(block.candidate(12), 0x3b96_3bd9);
    }

    #[test]
    fn test_one_block_per_minute_group() {
        assert_eq!(block_at(2024, 3, 14, 15, 8), block_at(2024, 3, 14, 15, 11));
        assert_ne!(block_at(2024, 3, 14, 15, 11), block_at(2024, 3, 14, 15, 12));
        assert_eq!(
            hex::encode(block_at(2024, 3, 14, 15, 12).as_bytes()),
            "072e9de21dcc4c03614a5b35ab319da6"
        );
    }

    #[test]
    fn test_year_rollover_blocks() {
        assert_eq!(
            hex::encode(block_at(2023, 12, 31, 23, 59).as_bytes()),
            "bf4d4b7c31649e50c14d4f2970228fef"
        );
        assert_eq!(
            hex::encode(block_at(2024, 1, 1, 0, 0).as_bytes()),
            "a4a97285939ecc46f9c03d672779fb24"
        );
    }

    #[test]
    fn test_thirty_second_token_shares_record_alignment() {
        let credential = TokenCredential::parse("000154434212", SEED)
            .unwrap()
            .with_flags(17368);
        assert_eq!(credential.interval(), Interval::ThirtySeconds);
        let time = TimeContext::from(Utc.with_ymd_and_hms(2024, 3, 14, 15, 9, 40).unwrap());
        let block = derive_block(&credential, &encode(&time, credential.interval())).unwrap();
        assert_eq!(block, block_at(2024, 3, 14, 15, 9));
    }

    #[test]
    fn test_candidate_offset_is_reduced() {
        let block = QuadBlock::from([
            0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 4,
        ]);
        assert_eq!(block.candidate(4), 2);
        assert_eq!(block.candidate(16 + 8), 3);
    }
}
