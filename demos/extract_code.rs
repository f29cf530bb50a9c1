//! Example: Extracting a verification code from a raw email.
//!
//! Reads an RFC 5322 message from the file given as the first argument, or
//! from stdin, and prints the code together with the strategy that found it.
//!
//! # Usage
//!
//! ```bash
//! # Set log level (trace shows every rejected candidate)
//! export RUST_LOG=otp_extract=trace
//!
//! cargo run --example extract_code -- message.eml
//! cat message.eml | cargo run --example extract_code
//! ```

use otp_extract::{parse_email, preview, VerificationCodeExtractor};
use std::env;
use std::io::Read;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("otp_extract=info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let raw = match env::args().nth(1) {
        Some(path) => std::fs::read(path)?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };

    let email = parse_email(&raw)?;

    tracing::info!(
        subject = email.subject.as_deref().unwrap_or(""),
        from = email.from_address.as_deref().unwrap_or(""),
        "Parsed message"
    );

    let extractor = VerificationCodeExtractor::new();
    match extractor.extract_detailed(email.text.as_deref(), email.html.as_deref()) {
        Some(found) => {
            println!("{} (via {})", found.code, found.strategy);
        }
        None => {
            println!("No verification code found");
            println!("Preview: {}", preview(email.text.as_deref(), email.html.as_deref()));
        }
    }

    Ok(())
}
