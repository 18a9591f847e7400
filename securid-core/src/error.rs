// File:    error.rs
// Author:  apezoo
// Date:    2026-10-19
//
// Description: Error types shared by every stage of the token code computation.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Error types for token code computation.

use thiserror::Error;

/// Errors that can occur while parsing a credential or computing a token code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SecurIdError {
    /// A credential field is malformed.
    #[error("invalid credential field '{field}': {reason}")]
    InvalidCredential {
        /// The name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The requested output length exceeds what the token flags can produce.
    #[error(
        "requested passcode length {output_length} exceeds the {digit_count} digits produced by the token flags"
    )]
    Configuration {
        /// The requested visible passcode length.
        output_length: usize,
        /// The number of digits implied by the flag word.
        digit_count: usize,
    },

    /// A timestamp fell outside the representable calendar range.
    #[error("timestamp {0} is out of range")]
    TimeOutOfRange(i64),

    /// The block cipher rejected its key or block.
    #[error("block cipher failure: {0}")]
    CipherFailure(String),
}

impl SecurIdError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidCredential {
            field,
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SecurIdError>;
