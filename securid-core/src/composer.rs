// File:    composer.rs
// Author:  apezoo
// Date:    2026-10-19
//
// Description: Picks the sub-interval candidate from the quad block and turns it into PIN-folded digits.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Passcode digit composition.

use crate::chain::QuadBlock;
use crate::error::{Result, SecurIdError};
use crate::time_encoder::{Interval, TimeContext};
use crate::token::Pin;

const FLD_DIGIT_SHIFT: u16 = 6;
const FLD_DIGIT_MASK: u16 = 0b111 << FLD_DIGIT_SHIFT;
const DIGIT_COUNT_BIAS: usize = 2;

/// Largest digit count any flag word can select.
pub const MAX_DIGITS: usize = 0b111 + DIGIT_COUNT_BIAS;

/// Number of digits produced before truncation, decoded from flag bits 6 to 8.
#[must_use]
pub fn digit_count(flags: u16) -> usize {
    usize::from((flags & FLD_DIGIT_MASK) >> FLD_DIGIT_SHIFT) + DIGIT_COUNT_BIAS
}

/// Byte offset into the quad block of the candidate for the sub-interval containing `time`.
///
/// 60-second tokens select by the two low minute bits. 30-second tokens combine
/// the minute parity with the half-minute.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn candidate_offset(time: &TimeContext, interval: Interval) -> usize {
    let offset = match interval {
        Interval::SixtySeconds => (time.minute & 0b11) << 2,
        Interval::ThirtySeconds => {
            let half = if time.second >= 30 { 0b100 } else { 0 };
            ((time.minute & 0b01) << 3) | half
        }
    };
    // At most 12.
    offset as usize
}

/// Expands `value` into `digit_count` decimal digits, adding PIN digits from the
/// least significant end modulo 10 with no carry.
///
/// PIN digits beyond `digit_count` are never consulted.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn fold_digits(mut value: u32, digit_count: usize, pin: &[u8]) -> String {
    let digit_count = digit_count.min(MAX_DIGITS);
    let mut digits = [0u8; MAX_DIGITS];

    for (i, slot) in digits[..digit_count].iter_mut().rev().enumerate() {
        let raw = (value % 10) as u8;
        value /= 10;
        let pin_digit = pin.len().checked_sub(i + 1).map_or(0, |j| pin[j]);
        *slot = (raw + pin_digit) % 10;
    }

    digits[..digit_count]
        .iter()
        .map(|d| char::from(b'0' + d))
        .collect()
}

/// Keeps the last `output_length` characters of `digits`.
#[must_use]
pub fn truncate(digits: &str, output_length: usize) -> &str {
    &digits[digits.len().saturating_sub(output_length)..]
}

/// Builds the visible passcode for `time` from a derived quad block.
///
/// # Errors
///
/// Returns [`SecurIdError::InvalidCredential`] for a zero `output_length` and
/// [`SecurIdError::Configuration`] if `output_length` exceeds the digit count
/// selected by `flags`.
pub fn compose(
    block: &QuadBlock,
    time: &TimeContext,
    interval: Interval,
    flags: u16,
    pin: &Pin,
    output_length: usize,
) -> Result<String> {
    let digit_count = digit_count(flags);
    if output_length == 0 {
        return Err(SecurIdError::invalid("length", "must be at least 1"));
    }
    if output_length > digit_count {
        return Err(SecurIdError::Configuration {
            output_length,
            digit_count,
        });
    }

    let offset = candidate_offset(time, interval);
    let digits = fold_digits(block.candidate(offset), digit_count, pin.digits());
    log::debug!("composed {digit_count} digits from candidate at offset {offset}");

    Ok(truncate(&digits, output_length).to_owned())
}
