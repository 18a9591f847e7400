// File:    lib.rs
// Author:  apezoo
// Date:    2026-10-19
//
// Description: The main library crate for securid-core, computing SecurID-compatible token codes.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! # SecurID Core Library
//!
//! This library computes the time-based token codes of SecurID-compatible
//! hardware and software tokens from a serial number, a 16-byte seed, an
//! optional PIN and the token flag word.
//!
//! The computation is a straight pipeline: the UTC time is packed into a BCD
//! record, five AES-128 rounds derive a quad block of four code candidates,
//! and the candidate for the current sub-interval is expanded into decimal
//! digits with the PIN folded in.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use securid_core::{TokenCredential, compute_passcode};
//!
//! let credential = TokenCredential::parse(
//!     "000154434212",
//!     "e0:c9:5e:9c:79:a5:d9:66:61:6b:8e:3a:2a:0b:05:2a",
//! )?;
//! let at = Utc.with_ymd_and_hms(2024, 3, 14, 15, 9, 26).unwrap();
//! assert_eq!(compute_passcode(&credential, &at)?, "053776");
//! # Ok::<(), securid_core::SecurIdError>(())
//! ```

/// Single-block AES-128 encryption.
pub mod block_step;
/// The five-round derivation chain.
pub mod chain;
/// Candidate selection and PIN-folded digit composition.
pub mod composer;
/// Error types.
pub mod error;
/// Passcode entry points and the token generator.
pub mod generator;
/// Per-round key material.
pub mod key_material;
/// UTC time decomposition and BCD encoding.
pub mod time_encoder;
/// Credential types and parsing.
pub mod token;

pub use error::{Result, SecurIdError};
pub use generator::{Passcode, TokenGenerator, TokenInfo, compute_passcode, interval_start};
pub use time_encoder::{Interval, TimeContext};
pub use token::{
    DEFAULT_FLAGS, DEFAULT_OUTPUT_LENGTH, Pin, Seed, Serial, TokenCredential, TokenRecord,
};
