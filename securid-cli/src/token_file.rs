// File:    token_file.rs
// Author:  apezoo
// Date:    2026-10-19
//
// Description: Loads token credentials from a JSON token file and merges command-line overrides.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use clap::Args;
use securid_core::{TokenCredential, TokenRecord};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

/// Where the token credential comes from.
#[derive(Args, Debug)]
pub(crate) struct TokenArgs {
    /// Path to a JSON token file with serial, seedOctets, pin, flags and length
    #[arg(long, value_name = "FILE")]
    token_file: Option<PathBuf>,

    /// The 12-digit token serial number
    #[arg(long, env = "RSA_AUTH_SERIAL")]
    serial: Option<String>,

    /// The token seed as 16 colon-separated hex octets
    #[arg(long, env = "RSA_AUTH_SEED", hide_env_values = true)]
    seed: Option<String>,

    /// The numeric PIN folded into the code
    #[arg(long, env = "RSA_AUTH_PIN", hide_env_values = true)]
    pin: Option<String>,

    /// The token flag word [default: 17369]
    #[arg(long, env = "RSA_AUTH_FLAGS")]
    flags: Option<u16>,

    /// Number of passcode digits to show [default: 6]
    #[arg(short, long, env = "RSA_AUTH_LENGTH")]
    length: Option<usize>,
}

impl TokenArgs {
    /// Builds the credential, with explicit arguments taking precedence over the token file.
    pub(crate) fn load(&self) -> Result<TokenCredential, Box<dyn Error>> {
        let mut record = match &self.token_file {
            Some(path) => load_record(path)?,
            None => TokenRecord::default(),
        };

        if let Some(serial) = &self.serial {
            record.serial.clone_from(serial);
        }
        if let Some(seed) = &self.seed {
            record.seed_octets.clone_from(seed);
        }
        if self.pin.is_some() {
            record.pin.clone_from(&self.pin);
        }
        if self.flags.is_some() {
            record.flags = self.flags;
        }
        if self.length.is_some() {
            record.length = self.length;
        }

        if record.serial.is_empty() {
            return Err("no serial given; use --serial, RSA_AUTH_SERIAL or --token-file".into());
        }
        if record.seed_octets.is_empty() {
            return Err("no seed given; use --seed, RSA_AUTH_SEED or --token-file".into());
        }

        Ok(TokenCredential::try_from(record)?)
    }
}

/// Reads a token record from a JSON file.
fn load_record(path: &Path) -> Result<TokenRecord, Box<dyn Error>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("failed to read token file '{}': {e}", path.display()))?;
    let record: TokenRecord = serde_json::from_str(&contents)
        .map_err(|e| format!("failed to parse token file '{}': {e}", path.display()))?;
    Ok(record)
}
