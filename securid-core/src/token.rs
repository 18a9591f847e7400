// File:    token.rs
// Author:  apezoo
// Date:    2026-10-19
//
// Description: Token credential types and their validation from caller-supplied text.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Token credentials: serial number, seed, PIN, flag word and output length.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::composer;
use crate::error::{Result, SecurIdError};
use crate::time_encoder::Interval;

/// Number of decimal digits in a token serial number.
pub const SERIAL_DIGITS: usize = 12;
/// Length in bytes of a decrypted token seed.
pub const SEED_LEN: usize = 16;
/// Length of a seed written as colon-separated hex octets.
pub const SEED_TEXT_LEN: usize = SEED_LEN * 3 - 1;
/// Flag word of a standard 60-second token.
pub const DEFAULT_FLAGS: u16 = 17369;
/// Default number of visible passcode digits.
pub const DEFAULT_OUTPUT_LENGTH: usize = 6;

/// A 12-digit token serial number.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Serial([u8; SERIAL_DIGITS]);

impl Serial {
    /// The serial digits as numeric values (0 to 9).
    #[must_use]
    pub const fn digits(&self) -> &[u8; SERIAL_DIGITS] {
        &self.0
    }

    /// Packed-BCD encoding of the last eight serial digits, in order.
    #[must_use]
    pub fn packed_tail(&self) -> [u8; 4] {
        let mut out = [0u8; 4];
        for (byte, pair) in out.iter_mut().zip(self.0[4..].chunks_exact(2)) {
            *byte = (pair[0] << 4) | pair[1];
        }
        out
    }

    /// The serial with all but the last four digits hidden.
    #[must_use]
    pub fn masked(&self) -> String {
        let tail: String = self.0[SERIAL_DIGITS - 4..]
            .iter()
            .map(|d| char::from(b'0' + d))
            .collect();
        format!("{}{tail}", "*".repeat(SERIAL_DIGITS - 4))
    }
}

impl FromStr for Serial {
    type Err = SecurIdError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != SERIAL_DIGITS {
            return Err(SecurIdError::invalid(
                "serial",
                format!("expected {SERIAL_DIGITS} digits, got {} characters", s.len()),
            ));
        }
        let mut digits = [0u8; SERIAL_DIGITS];
        for (slot, byte) in digits.iter_mut().zip(s.bytes()) {
            if !byte.is_ascii_digit() {
                return Err(SecurIdError::invalid("serial", "must contain digits only"));
            }
            *slot = byte - b'0';
        }
        Ok(Self(digits))
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.0 {
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Serial({self})")
    }
}

/// The 16-byte decrypted token seed.
///
/// The seed is never printed; `Debug` shows a short SHA-256 fingerprint instead.
#[derive(Clone, PartialEq, Eq)]
pub struct Seed([u8; SEED_LEN]);

impl Seed {
    /// The raw seed bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.0
    }

    /// First eight hex characters of the SHA-256 digest of the seed.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0);
        hex::encode(&digest[..4])
    }
}

impl From<[u8; SEED_LEN]> for Seed {
    fn from(bytes: [u8; SEED_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Seed {
    type Error = SecurIdError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        <[u8; SEED_LEN]>::try_from(bytes)
            .map(Self)
            .map_err(|_| {
                SecurIdError::invalid(
                    "seed",
                    format!("expected {SEED_LEN} bytes, got {}", bytes.len()),
                )
            })
    }
}

impl FromStr for Seed {
    type Err = SecurIdError;

    /// Parses 16 colon-separated two-digit hex octets, e.g. `e0:c9:...:2a`.
    fn from_str(s: &str) -> Result<Self> {
        if s.len() != SEED_TEXT_LEN {
            return Err(SecurIdError::invalid(
                "seed",
                format!(
                    "expected {SEED_LEN} octets separated by ':' ({SEED_TEXT_LEN} characters), got {} characters",
                    s.len()
                ),
            ));
        }
        let mut bytes = [0u8; SEED_LEN];
        let mut octets = s.split(':');
        for slot in &mut bytes {
            let octet = octets
                .next()
                .filter(|o| o.len() == 2)
                .ok_or_else(|| SecurIdError::invalid("seed", "octets must be separated by ':'"))?;
            hex::decode_to_slice(octet, std::slice::from_mut(slot))
                .map_err(|e| SecurIdError::invalid("seed", format!("bad octet '{octet}': {e}")))?;
        }
        if octets.next().is_some() {
            return Err(SecurIdError::invalid("seed", "too many octets"));
        }
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed(sha256:{})", self.fingerprint())
    }
}

/// A numeric PIN folded into the token code. May be empty.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Pin(Vec<u8>);

impl Pin {
    /// The PIN digits as numeric values, most significant first.
    #[must_use]
    pub fn digits(&self) -> &[u8] {
        &self.0
    }

    /// Number of PIN digits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no PIN was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for Pin {
    type Err = SecurIdError;

    fn from_str(s: &str) -> Result<Self> {
        s.bytes()
            .map(|b| {
                if b.is_ascii_digit() {
                    Ok(b - b'0')
                } else {
                    Err(SecurIdError::invalid("pin", "must contain digits only"))
                }
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Pin(<none>)")
        } else {
            f.write_str("Pin(***)")
        }
    }
}

/// Everything needed to compute a token code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCredential {
    serial: Serial,
    seed: Seed,
    pin: Pin,
    flags: u16,
    output_length: usize,
}

impl TokenCredential {
    /// Creates a credential with no PIN, the default flags and the default output length.
    #[must_use]
    pub fn new(serial: Serial, seed: Seed) -> Self {
        Self {
            serial,
            seed,
            pin: Pin::default(),
            flags: DEFAULT_FLAGS,
            output_length: DEFAULT_OUTPUT_LENGTH,
        }
    }

    /// Parses a serial and a colon-separated seed into a default credential.
    ///
    /// # Errors
    ///
    /// Returns [`SecurIdError::InvalidCredential`] if either field is malformed.
    pub fn parse(serial: &str, seed: &str) -> Result<Self> {
        Ok(Self::new(serial.parse()?, seed.parse()?))
    }

    /// Sets the PIN.
    #[must_use]
    pub fn with_pin(mut self, pin: Pin) -> Self {
        self.pin = pin;
        self
    }

    /// Sets the flag word.
    #[must_use]
    pub fn with_flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the number of visible passcode digits.
    #[must_use]
    pub fn with_output_length(mut self, output_length: usize) -> Self {
        self.output_length = output_length;
        self
    }

    /// The token serial number.
    #[must_use]
    pub const fn serial(&self) -> &Serial {
        &self.serial
    }

    /// The token seed.
    #[must_use]
    pub const fn seed(&self) -> &Seed {
        &self.seed
    }

    /// The PIN, possibly empty.
    #[must_use]
    pub const fn pin(&self) -> &Pin {
        &self.pin
    }

    /// The raw flag word.
    #[must_use]
    pub const fn flags(&self) -> u16 {
        self.flags
    }

    /// The requested number of visible passcode digits.
    #[must_use]
    pub const fn output_length(&self) -> usize {
        self.output_length
    }

    /// The reporting interval selected by the flags.
    #[must_use]
    pub const fn interval(&self) -> Interval {
        Interval::from_flags(self.flags)
    }

    /// Number of digits the derivation produces before truncation.
    #[must_use]
    pub fn digit_count(&self) -> usize {
        composer::digit_count(self.flags)
    }

    /// Checks the constraints that span several fields.
    ///
    /// # Errors
    ///
    /// Returns [`SecurIdError::InvalidCredential`] for a zero output length or a
    /// PIN longer than the output, and [`SecurIdError::Configuration`] when the
    /// output length exceeds the digit count implied by the flags.
    pub fn validate(&self) -> Result<()> {
        if self.output_length == 0 {
            return Err(SecurIdError::invalid("length", "must be at least 1"));
        }
        let digit_count = self.digit_count();
        if self.output_length > digit_count {
            return Err(SecurIdError::Configuration {
                output_length: self.output_length,
                digit_count,
            });
        }
        if self.pin.len() > self.output_length {
            return Err(SecurIdError::invalid(
                "pin",
                format!(
                    "{} digits is longer than the {}-digit passcode",
                    self.pin.len(),
                    self.output_length
                ),
            ));
        }
        Ok(())
    }
}

/// Text form of a credential as received from JSON bodies, query strings and token files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    /// 12-digit serial number.
    pub serial: String,
    /// Seed as 16 colon-separated hex octets.
    #[serde(alias = "seed")]
    pub seed_octets: String,
    /// Optional numeric PIN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    /// Optional flag word, defaults to [`DEFAULT_FLAGS`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<u16>,
    /// Optional passcode length, defaults to [`DEFAULT_OUTPUT_LENGTH`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
}

impl TryFrom<TokenRecord> for TokenCredential {
    type Error = SecurIdError;

    fn try_from(record: TokenRecord) -> Result<Self> {
        Self::try_from(&record)
    }
}

impl TryFrom<&TokenRecord> for TokenCredential {
    type Error = SecurIdError;

    fn try_from(record: &TokenRecord) -> Result<Self> {
        let pin = record.pin.as_deref().unwrap_or_default().parse()?;
        let credential = Self::parse(&record.serial, &record.seed_octets)?
            .with_pin(pin)
            .with_flags(record.flags.unwrap_or(DEFAULT_FLAGS))
            .with_output_length(record.length.unwrap_or(DEFAULT_OUTPUT_LENGTH));
        credential.validate()?;
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = "e0:c9:5e:9c:79:a5:d9:66:61:6b:8e:3a:2a:0b:05:2a";

    #[test]
    fn test_serial_parsing() {
        let serial: Serial = "000154434212".parse().unwrap();
        assert_eq!(serial.to_string(), "000154434212");
        assert_eq!(serial.packed_tail(), [0x54, 0x43, 0x42, 0x12]);
        assert_eq!(serial.masked(), "********4212");

        assert!(matches!(
            "00015443421".parse::<Serial>(),
            Err(SecurIdError::InvalidCredential { field: "serial", .. })
        ));
        assert!("00015443421x".parse::<Serial>().is_err());
    }

    #[test]
    fn test_seed_parsing() {
        let seed: Seed = SEED.parse().unwrap();
        assert_eq!(seed.as_bytes()[0], 0xe0);
        assert_eq!(seed.as_bytes()[15], 0x2a);

        let upper: Seed = SEED.to_uppercase().parse().unwrap();
        assert_eq!(upper, seed);

        assert!(SEED[..44].parse::<Seed>().is_err());
        assert!(SEED.replace(':', "-").parse::<Seed>().is_err());
        assert!(SEED.replacen("e0", "g0", 1).parse::<Seed>().is_err());
        assert!("e0c:9:5e:9c:79:a5:d9:66:61:6b:8e:3a:2a:0b:05:2a".parse::<Seed>().is_err());
    }

    #[test]
    fn test_seed_from_raw_bytes() {
        let raw = [7u8; SEED_LEN];
        assert_eq!(Seed::try_from(&raw[..]).unwrap(), Seed::from(raw));
        assert!(Seed::try_from(&raw[..15]).is_err());
    }

    #[test]
    fn test_seed_debug_hides_bytes() {
        let seed: Seed = SEED.parse().unwrap();
        let shown = format!("{seed:?}");
        assert!(!shown.contains("e0"));
        assert!(shown.contains(&seed.fingerprint()));
        assert_eq!(seed.fingerprint().len(), 8);
    }

    #[test]
    fn test_pin_parsing() {
        let pin: Pin = "1234".parse().unwrap();
        assert_eq!(pin.digits(), &[1, 2, 3, 4]);
        assert!("".parse::<Pin>().unwrap().is_empty());
        assert!("12a4".parse::<Pin>().is_err());
        assert_eq!(format!("{pin:?}"), "Pin(***)");
    }

    #[test]
    fn test_validate() {
        let credential = TokenCredential::parse("000154434212", SEED).unwrap();
        assert_eq!(credential.digit_count(), 9);
        assert_eq!(credential.interval(), Interval::SixtySeconds);
        assert!(credential.validate().is_ok());

        let too_long = credential.clone().with_output_length(10);
        assert_eq!(
            too_long.validate(),
            Err(SecurIdError::Configuration {
                output_length: 10,
                digit_count: 9
            })
        );

        assert!(credential.clone().with_output_length(0).validate().is_err());

        let long_pin = credential.with_pin("1234567".parse().unwrap());
        assert!(matches!(
            long_pin.validate(),
            Err(SecurIdError::InvalidCredential { field: "pin", .. })
        ));
    }

    #[test]
    fn test_record_conversion() {
        let json = format!(
            r#"{{"serial":"000154434212","seedOctets":"{SEED}","pin":"111111"}}"#
        );
        let record: TokenRecord = serde_json::from_str(&json).unwrap();
        let credential = TokenCredential::try_from(record).unwrap();
        assert_eq!(credential.flags(), DEFAULT_FLAGS);
        assert_eq!(credential.output_length(), DEFAULT_OUTPUT_LENGTH);
        assert_eq!(credential.pin().len(), 6);

        let aliased: TokenRecord = serde_json::from_str(&format!(
            r#"{{"serial":"000154434212","seed":"{SEED}","length":8}}"#
        ))
        .unwrap();
        assert_eq!(TokenCredential::try_from(&aliased).unwrap().output_length(), 8);
    }
}
