#![deny(missing_docs)]
//! A command-line interface for computing SecurID-compatible token codes.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use log::{debug, error};
use securid_core::{TokenGenerator, TokenInfo};

mod token_file;

use token_file::TokenArgs;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(
    after_help = "EXAMPLES:\n  \n# Show the current code\nsecurid-cli code --serial 000154434212 --seed e0:c9:5e:9c:79:a5:d9:66:61:6b:8e:3a:2a:0b:05:2a\n\n# Fold a PIN into the code and show the next three codes\nsecurid-cli code --token-file ./token.json --pin 1234 --next 3\n\n# Compute the code for a fixed instant\nsecurid-cli code --token-file ./token.json --time 2024-03-14T15:09:26Z\n\n# Describe a token without revealing its seed\nsecurid-cli info --token-file ./token.json"
)]
struct Cli {
    /// Print machine-readable JSON instead of plain text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the token code
    Code {
        #[command(flatten)]
        token: TokenArgs,

        /// Compute the code for this UTC instant (RFC 3339) instead of now
        #[arg(short, long, value_name = "RFC3339")]
        time: Option<DateTime<Utc>>,

        /// Number of consecutive codes to print, starting with the current one
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..))]
        next: u8,

        /// Also print how long each code stays valid
        #[arg(short, long)]
        verbose: bool,
    },
    /// Describe the token without revealing its seed or PIN
    Info {
        #[command(flatten)]
        token: TokenArgs,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Code {
            token,
            time,
            next,
            verbose,
        } => {
            let generator = load_generator(token);
            let now = Utc::now();
            let at = time.unwrap_or(now);
            debug!("computing {next} code(s) from {at}");

            let passcodes = generator
                .upcoming(&at, usize::from(*next))
                .unwrap_or_else(|e| {
                    error!("Failed to compute token code: {e}");
                    std::process::exit(1);
                });

            if cli.json {
                print_json(&passcodes);
                return;
            }
            for passcode in &passcodes {
                if *verbose {
                    println!(
                        "{}  valid {} - {} ({}s left)",
                        passcode.code,
                        passcode.valid_from.format("%H:%M:%S"),
                        passcode.valid_until.format("%H:%M:%S"),
                        passcode.seconds_remaining(&at)
                    );
                } else {
                    println!("{}", passcode.code);
                }
            }
        }
        Commands::Info { token } => {
            let info = load_generator(token).info();
            if cli.json {
                print_json(&info);
            } else {
                print_info(&info);
            }
        }
    }
}

/// Loads and validates the credential, exiting on failure.
fn load_generator(token: &TokenArgs) -> TokenGenerator {
    token
        .load()
        .and_then(|credential| Ok(TokenGenerator::new(credential)?))
        .unwrap_or_else(|e| {
            error!("Invalid token: {e}");
            std::process::exit(1);
        })
}

fn print_info(info: &TokenInfo) {
    println!("Token: {}", info.serial);
    println!("{:-<40}", "");
    println!("Interval: {} seconds", info.interval_seconds);
    println!(
        "Digits: {} (showing {})",
        info.digit_count, info.output_length
    );
    println!("PIN: {}", if info.has_pin { "set" } else { "none" });
    println!("Seed fingerprint: {}", info.seed_fingerprint);
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            error!("Failed to serialize output: {e}");
            std::process::exit(1);
        }
    }
}
