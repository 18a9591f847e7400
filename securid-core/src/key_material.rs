// File:    key_material.rs
// Author:  apezoo
// Date:    2026-10-19
//
// Description: Builds the per-round 16-byte key material from the BCD time record and the serial number.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Key material for one derivation round.

use crate::time_encoder::BcdRecord;
use crate::token::Serial;

/// Length of the key material in bytes.
pub const KEY_LEN: usize = 16;

/// BCD prefix length used by each of the five derivation rounds, in order.
pub const ROUND_PREFIX_LENGTHS: [usize; 5] = [2, 3, 4, 5, 8];

const TIME_FILL: u8 = 0xaa;
const SERIAL_FILL: u8 = 0xbb;

/// Builds the key material for one round.
///
/// Layout: bytes 0..8 hold the first `prefix_len` bytes of the time record
/// padded with `0xaa`, bytes 8..12 the packed last eight serial digits and
/// bytes 12..16 are `0xbb`.
#[must_use]
pub fn build_key(bcd: &BcdRecord, prefix_len: usize, serial: &Serial) -> [u8; KEY_LEN] {
    let mut key = [TIME_FILL; KEY_LEN];
    key[8..].fill(SERIAL_FILL);

    let prefix = bcd.prefix(prefix_len);
    key[..prefix.len()].copy_from_slice(prefix);
    key[8..12].copy_from_slice(&serial.packed_tail());
    key
}
