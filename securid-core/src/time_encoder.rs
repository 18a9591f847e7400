// File:    time_encoder.rs
// Author:  apezoo
// Date:    2026-10-19
//
// Description: Packs a UTC instant into the BCD calendar record that seeds every key derivation round.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! UTC time decomposition and packed-BCD encoding.

use chrono::{DateTime, Datelike, Timelike, Utc};

const FLD_NUMSECONDS_SHIFT: u16 = 0;
const FLD_NUMSECONDS_MASK: u16 = 0b11 << FLD_NUMSECONDS_SHIFT;

/// Length in bytes of an encoded [`BcdRecord`].
pub const BCD_RECORD_LEN: usize = 8;

/// The reporting interval after which a token shows a new code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    /// A new code every 30 seconds.
    ThirtySeconds,
    /// A new code every 60 seconds.
    SixtySeconds,
}

impl Interval {
    /// Decodes the interval from the low bits of a token flag word.
    #[must_use]
    pub const fn from_flags(flags: u16) -> Self {
        if (flags & FLD_NUMSECONDS_MASK) >> FLD_NUMSECONDS_SHIFT == 0 {
            Self::ThirtySeconds
        } else {
            Self::SixtySeconds
        }
    }

    /// The interval length in seconds.
    #[must_use]
    pub const fn seconds(self) -> u32 {
        match self {
            Self::ThirtySeconds => 30,
            Self::SixtySeconds => 60,
        }
    }

    /// Mask applied to the minute before encoding. One record covers the four
    /// candidates of a quad block: two minutes of 30-second codes or four
    /// minutes of 60-second codes.
    const fn minute_mask(self) -> u32 {
        match self {
            Self::ThirtySeconds => !0b01,
            Self::SixtySeconds => !0b11,
        }
    }
}

/// A UTC instant broken down into calendar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeContext {
    /// Four-digit year.
    pub year: u32,
    /// Month, 1 to 12.
    pub month: u32,
    /// Day of month, 1 to 31.
    pub day: u32,
    /// Hour, 0 to 23.
    pub hour: u32,
    /// Minute, 0 to 59.
    pub minute: u32,
    /// Second, 0 to 59.
    pub second: u32,
}

impl From<&DateTime<Utc>> for TimeContext {
    fn from(time: &DateTime<Utc>) -> Self {
        Self {
            year: time.year().unsigned_abs(),
            month: time.month(),
            day: time.day(),
            hour: time.hour(),
            minute: time.minute(),
            second: time.second(),
        }
    }
}

impl From<DateTime<Utc>> for TimeContext {
    fn from(time: DateTime<Utc>) -> Self {
        Self::from(&time)
    }
}

/// The 8-byte packed-decimal calendar record.
///
/// Layout: year (2 bytes), month, day, hour, interval-aligned minute, and two
/// reserved zero bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BcdRecord([u8; BCD_RECORD_LEN]);

impl BcdRecord {
    /// The raw record bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; BCD_RECORD_LEN] {
        &self.0
    }

    /// The first `len` bytes of the record, clamped to the record length.
    #[must_use]
    pub fn prefix(&self, len: usize) -> &[u8] {
        &self.0[..len.min(BCD_RECORD_LEN)]
    }
}

/// Encodes `time` as a BCD record aligned to the start of its reporting interval group.
#[must_use]
pub fn encode(time: &TimeContext, interval: Interval) -> BcdRecord {
    let mut bytes = [0u8; BCD_RECORD_LEN];
    bcd_write(&mut bytes[0..2], time.year);
    bcd_write(&mut bytes[2..3], time.month);
    bcd_write(&mut bytes[3..4], time.day);
    bcd_write(&mut bytes[4..5], time.hour);
    bcd_write(&mut bytes[5..6], time.minute & interval.minute_mask());
    log::trace!("encoded {time:?} as BCD record {bytes:02x?}");
    BcdRecord(bytes)
}

/// Writes the low `2 * out.len()` decimal digits of `val`, most significant byte first.
#[allow(clippy::cast_possible_truncation)]
fn bcd_write(out: &mut [u8], mut val: u32) {
    for byte in out.iter_mut().rev() {
        let low = val % 10;
        val /= 10;
        let high = val % 10;
        val /= 10;
        // Both nibbles are below 10.
        *byte = ((high << 4) | low) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> TimeContext {
        TimeContext::from(Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap())
    }

    #[test]
    fn test_interval_from_flags() {
        assert_eq!(Interval::from_flags(17369), Interval::SixtySeconds);
        assert_eq!(Interval::from_flags(17368), Interval::ThirtySeconds);
        assert_eq!(Interval::from_flags(0b10), Interval::SixtySeconds);
        assert_eq!(Interval::SixtySeconds.seconds(), 60);
        assert_eq!(Interval::ThirtySeconds.seconds(), 30);
    }

    #[test]
    fn test_encode_packs_calendar_fields() {
        let record = encode(&at(2024, 3, 14, 15, 9, 26), Interval::SixtySeconds);
        assert_eq!(
            record.as_bytes(),
            &[0x20, 0x24, 0x03, 0x14, 0x15, 0x08, 0x00, 0x00]
        );
    }

    #[test]
    fn test_encode_matches_legacy_record() {
        let record = encode(&at(2020, 1, 9, 23, 23, 0), Interval::SixtySeconds);
        assert_eq!(record.as_bytes(), &[32, 32, 1, 9, 35, 32, 0, 0]);
    }

    #[test]
    fn test_minute_alignment_per_interval() {
        let time = at(2024, 3, 14, 15, 11, 45);
        assert_eq!(encode(&time, Interval::SixtySeconds).as_bytes()[5], 0x08);
        assert_eq!(encode(&time, Interval::ThirtySeconds).as_bytes()[5], 0x10);

        let time = at(2024, 3, 14, 15, 59, 0);
        assert_eq!(encode(&time, Interval::SixtySeconds).as_bytes()[5], 0x56);
        assert_eq!(encode(&time, Interval::ThirtySeconds).as_bytes()[5], 0x58);
    }

    #[test]
    fn test_year_rollover() {
        let before = encode(&at(2023, 12, 31, 23, 59, 30), Interval::SixtySeconds);
        let after = encode(&at(2024, 1, 1, 0, 0, 0), Interval::SixtySeconds);
        assert_eq!(
            before.as_bytes(),
            &[0x20, 0x23, 0x12, 0x31, 0x23, 0x56, 0x00, 0x00]
        );
        assert_eq!(
            after.as_bytes(),
            &[0x20, 0x24, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_prefix_is_clamped() {
        let record = encode(&at(2024, 3, 14, 15, 9, 26), Interval::SixtySeconds);
        assert_eq!(record.prefix(2), &[0x20, 0x24]);
        assert_eq!(record.prefix(12).len(), BCD_RECORD_LEN);
    }
}
