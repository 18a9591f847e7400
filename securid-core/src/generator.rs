// File:    generator.rs
// Author:  apezoo
// Date:    2026-10-19
//
// Description: Entry points tying the encoder, derivation chain and composer into token codes.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Passcode computation for a credential at a given instant.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::chain;
use crate::composer;
use crate::error::{Result, SecurIdError};
use crate::time_encoder::{self, Interval, TimeContext};
use crate::token::TokenCredential;

/// Computes the passcode shown by the token at `now`.
///
/// # Errors
///
/// Returns [`SecurIdError::InvalidCredential`] or [`SecurIdError::Configuration`]
/// if the credential fails validation, and [`SecurIdError::CipherFailure`] if the
/// block cipher fails.
pub fn compute_passcode(credential: &TokenCredential, now: &DateTime<Utc>) -> Result<String> {
    credential.validate()?;

    let interval = credential.interval();
    let time = TimeContext::from(now);
    let bcd = time_encoder::encode(&time, interval);
    let block = chain::derive_block(credential, &bcd)?;

    composer::compose(
        &block,
        &time,
        interval,
        credential.flags(),
        credential.pin(),
        credential.output_length(),
    )
}

/// Start of the reporting interval containing `at`.
#[must_use]
pub fn interval_start(at: &DateTime<Utc>, interval: Interval) -> DateTime<Utc> {
    let secs = at.timestamp();
    let start = secs - secs.rem_euclid(i64::from(interval.seconds()));
    DateTime::from_timestamp(start, 0).unwrap_or(*at)
}

/// A passcode together with the window in which the token displays it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Passcode {
    /// The visible passcode digits.
    pub code: String,
    /// Length of the reporting interval in seconds.
    pub interval_seconds: u32,
    /// First instant at which the code is shown.
    pub valid_from: DateTime<Utc>,
    /// First instant at which the next code is shown.
    pub valid_until: DateTime<Utc>,
}

impl Passcode {
    /// Whole seconds left before the code changes, zero once it has expired.
    #[must_use]
    pub fn seconds_remaining(&self, now: &DateTime<Utc>) -> i64 {
        (self.valid_until - *now).num_seconds().max(0)
    }
}

/// Non-secret description of a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    /// Serial number with all but the last four digits hidden.
    pub serial: String,
    /// Reporting interval in seconds.
    pub interval_seconds: u32,
    /// Digits produced before truncation.
    pub digit_count: usize,
    /// Visible passcode length.
    pub output_length: usize,
    /// Whether a PIN is folded into the code.
    pub has_pin: bool,
    /// Short SHA-256 fingerprint of the seed.
    pub seed_fingerprint: String,
}

impl From<&TokenCredential> for TokenInfo {
    fn from(credential: &TokenCredential) -> Self {
        Self {
            serial: credential.serial().masked(),
            interval_seconds: credential.interval().seconds(),
            digit_count: credential.digit_count(),
            output_length: credential.output_length(),
            has_pin: !credential.pin().is_empty(),
            seed_fingerprint: credential.seed().fingerprint(),
        }
    }
}

/// Produces passcodes for one validated credential.
#[derive(Debug, Clone)]
pub struct TokenGenerator {
    credential: TokenCredential,
}

impl TokenGenerator {
    /// Wraps a credential after validating it.
    ///
    /// # Errors
    ///
    /// Returns the validation error of [`TokenCredential::validate`].
    pub fn new(credential: TokenCredential) -> Result<Self> {
        credential.validate()?;
        log::debug!(
            "token generator ready for serial {} ({}s interval, {} digits)",
            credential.serial().masked(),
            credential.interval().seconds(),
            credential.output_length()
        );
        Ok(Self { credential })
    }

    /// The wrapped credential.
    #[must_use]
    pub const fn credential(&self) -> &TokenCredential {
        &self.credential
    }

    /// Non-secret details of the token.
    #[must_use]
    pub fn info(&self) -> TokenInfo {
        TokenInfo::from(&self.credential)
    }

    /// The passcode shown at `at`, with its validity window.
    ///
    /// # Errors
    ///
    /// Returns [`SecurIdError::CipherFailure`] if the block cipher fails.
    pub fn passcode_at(&self, at: &DateTime<Utc>) -> Result<Passcode> {
        let interval = self.credential.interval();
        let valid_from = interval_start(at, interval);
        let next = valid_from.timestamp() + i64::from(interval.seconds());
        let valid_until =
            DateTime::from_timestamp(next, 0).ok_or(SecurIdError::TimeOutOfRange(next))?;

        Ok(Passcode {
            code: compute_passcode(&self.credential, at)?,
            interval_seconds: interval.seconds(),
            valid_from,
            valid_until,
        })
    }

    /// The passcode shown right now.
    ///
    /// # Errors
    ///
    /// See [`TokenGenerator::passcode_at`].
    pub fn current(&self) -> Result<Passcode> {
        self.passcode_at(&Utc::now())
    }

    /// Passcodes for `count` consecutive reporting intervals, starting with the one containing `from`.
    ///
    /// # Errors
    ///
    /// Returns [`SecurIdError::TimeOutOfRange`] if an interval falls outside the
    /// calendar range, or any error of [`TokenGenerator::passcode_at`].
    pub fn upcoming(&self, from: &DateTime<Utc>, count: usize) -> Result<Vec<Passcode>> {
        let step = i64::from(self.credential.interval().seconds());
        let mut at = interval_start(from, self.credential.interval()).timestamp();
        let mut codes = Vec::with_capacity(count);

        for _ in 0..count {
            let instant = DateTime::from_timestamp(at, 0).ok_or(SecurIdError::TimeOutOfRange(at))?;
            codes.push(self.passcode_at(&instant)?);
            at += step;
        }
        Ok(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SEED: &str = "e0:c9:5e:9c:79:a5:d9:66:61:6b:8e:3a:2a:0b:05:2a";

    fn credential(pin: &str) -> TokenCredential {
        TokenCredential::parse("000154434212", SEED)
            .unwrap()
            .with_pin(pin.parse().unwrap())
    }

    fn at(h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 14, h, mi, s).unwrap()
    }

    #[test]
    fn test_known_vector() {
        let code = compute_passcode(&credential("111111"), &at(15, 9, 26)).unwrap();
        assert_eq!(code, "164887");
    }

    #[test]
    fn test_interval_start() {
        assert_eq!(interval_start(&at(15, 9, 26), Interval::SixtySeconds), at(15, 9, 0));
        assert_eq!(interval_start(&at(15, 9, 26), Interval::ThirtySeconds), at(15, 9, 0));
        assert_eq!(interval_start(&at(15, 9, 31), Interval::ThirtySeconds), at(15, 9, 30));
    }

    #[test]
    fn test_passcode_window() {
        let generator = TokenGenerator::new(credential("")).unwrap();
        let passcode = generator.passcode_at(&at(15, 9, 26)).unwrap();
        assert_eq!(passcode.code, "053776");
        assert_eq!(passcode.interval_seconds, 60);
        assert_eq!(passcode.valid_from, at(15, 9, 0));
        assert_eq!(passcode.valid_until, at(15, 10, 0));
        assert_eq!(passcode.seconds_remaining(&at(15, 9, 26)), 34);
        assert_eq!(passcode.seconds_remaining(&at(15, 11, 0)), 0);
    }

    #[test]
    fn test_upcoming_codes() {
        let generator = TokenGenerator::new(credential("111111")).unwrap();
        let codes: Vec<String> = generator
            .upcoming(&at(15, 9, 26), 4)
            .unwrap()
            .into_iter()
            .map(|p| p.code)
            .collect();
        assert_eq!(codes, vec!["164887", "894784", "812576", "506697"]);
    }

    #[test]
    fn test_generator_rejects_invalid_credential() {
        let result = TokenGenerator::new(credential("").with_output_length(10));
        assert!(matches!(result, Err(SecurIdError::Configuration { .. })));
    }

    #[test]
    fn test_info_hides_secrets() {
        let info = TokenGenerator::new(credential("1234")).unwrap().info();
        assert_eq!(info.serial, "********4212");
        assert_eq!(info.interval_seconds, 60);
        assert_eq!(info.digit_count, 9);
        assert!(info.has_pin);
        assert_eq!(info.seed_fingerprint.len(), 8);
    }
}
