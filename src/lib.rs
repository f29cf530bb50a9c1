//! # otp-extract
//!
//! Heuristic extraction of one-time verification codes from email bodies.
//!
//! This crate provides:
//! - A strategy pipeline that finds the code in a text and/or HTML body while
//!   rejecting look-alike numbers (order numbers, dates, phone numbers, prices)
//! - A MIME front end that turns raw messages into extractable bodies
//! - Mailbox lookups: "latest code sent to this address in the last N seconds"
//!
//! ## Quick Start
//!
//! ```
//! use otp_extract::extract_verification_code;
//!
//! let code = extract_verification_code(Some("您的验证码是：123456，有效期10分钟。"), None);
//! assert_eq!(code.as_deref(), Some("123456"));
//!
//! // HTML-only bodies work too
//! let code = extract_verification_code(None, Some("<p>您的验证码是 <strong>567890</strong></p>"));
//! assert_eq!(code.as_deref(), Some("567890"));
//!
//! // Numbers that only look like codes are rejected
//! assert_eq!(extract_verification_code(Some("订单号：1234567890"), None), None);
//! ```
//!
//! ## Which Strategy Matched
//!
//! ```
//! use otp_extract::{Strategy, VerificationCodeExtractor};
//!
//! let extractor = VerificationCodeExtractor::new();
//! let found = extractor
//!     .extract_detailed(Some("Your verification code is: 789012"), None)
//!     .unwrap();
//!
//! assert_eq!(found.code, "789012");
//! assert_eq!(found.strategy, Strategy::StrictKeyword);
//! ```
//!
//! ## From Raw Email to Code
//!
//! ```
//! use otp_extract::{parse_email, VerificationCodeExtractor};
//!
//! let raw = b"From: noreply@service.test\r\n\
//!             Subject: Your code\r\n\
//!             Content-Type: text/html\r\n\
//!             \r\n\
//!             <p>Verification code: <b>48A2K9</b></p>";
//!
//! let email = parse_email(raw)?;
//! let code = VerificationCodeExtractor::new().extract_body(&email.body());
//! assert_eq!(code.as_deref(), Some("48A2K9"));
//! # Ok::<(), otp_extract::Error>(())
//! ```
//!
//! ## Custom Pattern Matching
//!
//! Lookups accept any [`matcher::Matcher`]; use a [`matcher::RegexMatcher`]
//! when a sender's format is known exactly:
//!
//! ```
//! use otp_extract::matcher::{Matcher, RegexMatcher};
//! use otp_extract::MessageBody;
//!
//! let matcher = RegexMatcher::new(r"token=([a-f0-9]{8})").unwrap();
//! let body = MessageBody::text("Open https://service.test/?token=deadbeef");
//! assert_eq!(matcher.find_match(&body).as_deref(), Some("deadbeef"));
//! ```
//!
//! ## Error Handling
//!
//! Extraction never fails; a body without a code yields `None`. Fallible
//! edges (configuration, custom patterns, MIME parsing, lookup arguments)
//! return [`Error`], which can be bucketed with [`Error::category`]:
//!
//! ```
//! use otp_extract::{Error, ErrorCategory};
//!
//! fn handle_error(error: &Error) {
//!     match error.category() {
//!         ErrorCategory::Configuration => println!("Bad input: {}", error),
//!         ErrorCategory::Parse => println!("Unreadable message: {}", error),
//!     }
//! }
//! ```
//!
//! ## Observability
//!
//! The crate uses `tracing` and installs no subscriber.
//!
//! - `debug` - a strategy accepted a code (`strategy`, `code_len`)
//! - `trace` - a candidate was rejected (`strategy`, `reason`)
//! - `warn` - a MIME part failed to decode
//!
//! Lookups run inside the `lookup::find_code` and `lookup::search_codes`
//! spans, carrying `mailbox` and `window_secs`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
pub mod config;
pub mod error;
pub mod exclusion;
pub mod lookup;
pub mod matcher;
pub mod parser;
pub mod rules;

// Internal modules
mod extractor;
mod message;
mod strategy;
mod text;

// Re-exports for ergonomic API
pub use config::{ExtractorConfig, ExtractorConfigBuilder, LookupConfig, LookupConfigBuilder};
pub use error::{Error, ErrorCategory, Result};
pub use extractor::{extract_verification_code, Extraction, VerificationCodeExtractor};
pub use lookup::{find_code, search_codes, CodeLookup, SearchQuery, SearchReport};
pub use message::{MessageBody, StoredEmail};
pub use parser::{parse_email, ParsedEmail};
pub use strategy::Strategy;
pub use text::preview;
