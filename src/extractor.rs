//! The verification-code extractor.
//!
//! [`VerificationCodeExtractor`] runs the strategy pipeline over one message
//! body and returns the first accepted code. It holds only configuration, so
//! one instance can be shared freely between threads.
//!
//! # Example
//!
//! ```
//! use otp_extract::{extract_verification_code, Strategy, VerificationCodeExtractor};
//!
//! assert_eq!(
//!     extract_verification_code(Some("Your verification code is: 789012"), None).as_deref(),
//!     Some("789012")
//! );
//!
//! let extractor = VerificationCodeExtractor::new();
//! let found = extractor
//!     .extract_detailed(Some("@example.com #482913"), None)
//!     .unwrap();
//! assert_eq!(found.strategy, Strategy::OtpAnchor);
//! ```

use crate::config::ExtractorConfig;
use crate::message::MessageBody;
use crate::strategy::{ExtractionContext, Strategy, PIPELINE};
use serde::Serialize;
use tracing::debug;

/// A code together with the strategy that found it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    /// The accepted code, upper-cased.
    pub code: String,
    /// The strategy that produced it.
    pub strategy: Strategy,
}

/// Heuristic one-time code extractor.
#[derive(Debug, Clone, Default)]
pub struct VerificationCodeExtractor {
    config: ExtractorConfig,
}

impl VerificationCodeExtractor {
    /// Creates an extractor with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an extractor with a custom configuration.
    #[must_use]
    pub fn with_config(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extracts a code from the given text and/or HTML body.
    ///
    /// Returns `None` when no strategy yields an accepted candidate, including
    /// when both inputs are absent or empty.
    #[must_use]
    pub fn extract(&self, text: Option<&str>, html: Option<&str>) -> Option<String> {
        self.extract_detailed(text, html).map(|found| found.code)
    }

    /// Same as [`extract`](Self::extract) for a [`MessageBody`].
    #[must_use]
    pub fn extract_body(&self, body: &MessageBody<'_>) -> Option<String> {
        self.extract(body.text, body.html)
    }

    /// Like [`extract`](Self::extract), also reporting which strategy matched.
    #[must_use]
    pub fn extract_detailed(&self, text: Option<&str>, html: Option<&str>) -> Option<Extraction> {
        let ctx = ExtractionContext::new(text, html, self.config.max_content_chars)?;

        PIPELINE.iter().find_map(|&(strategy, run)| {
            let code = run(&ctx)?;
            debug!(strategy = %strategy, code_len = code.len(), "Verification code found");
            Some(Extraction { code, strategy })
        })
    }
}

/// Extracts a verification code using the default configuration.
///
/// ```
/// use otp_extract::extract_verification_code;
///
/// assert_eq!(
///     extract_verification_code(Some("您的验证码是：482913，有效期10分钟。"), None).as_deref(),
///     Some("482913")
/// );
/// assert_eq!(extract_verification_code(Some("订单号：1234567890"), None), None);
/// assert_eq!(extract_verification_code(None, None), None);
/// ```
#[must_use]
pub fn extract_verification_code(text: Option<&str>, html: Option<&str>) -> Option<String> {
    VerificationCodeExtractor::new().extract(text, html)
}
