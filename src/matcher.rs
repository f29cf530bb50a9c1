//! Pluggable matching over message bodies.
//!
//! The [`Matcher`] trait is the seam the [`lookup`](crate::lookup) functions
//! call. [`VerificationCodeExtractor`] implements it with the heuristic
//! pipeline; [`RegexMatcher`] covers senders whose format is known exactly.
//!
//! # Example
//!
//! ```
//! use otp_extract::matcher::{Matcher, RegexMatcher};
//! use otp_extract::{MessageBody, VerificationCodeExtractor};
//!
//! let body = MessageBody::text("Your verification code is: 789012");
//!
//! // Using the built-in heuristics
//! let extractor = VerificationCodeExtractor::new();
//! assert_eq!(extractor.find_match(&body).as_deref(), Some("789012"));
//!
//! // Using a custom regex
//! let custom = RegexMatcher::new(r"code is: (\d+)").unwrap();
//! assert_eq!(custom.find_match(&body).as_deref(), Some("789012"));
//! ```

use crate::error::{Error, Result};
use crate::extractor::VerificationCodeExtractor;
use crate::message::MessageBody;
use crate::text;
use regex::Regex;
use std::borrow::Cow;

/// Trait for matching and extracting a value from a message body.
///
/// # Example
///
/// ```
/// use otp_extract::matcher::Matcher;
/// use otp_extract::MessageBody;
/// use std::borrow::Cow;
///
/// struct PinLine;
///
/// impl Matcher for PinLine {
///     fn find_match<'a>(&self, body: &MessageBody<'a>) -> Option<Cow<'a, str>> {
///         body.text?
///             .lines()
///             .find_map(|line| line.strip_prefix("PIN "))
///             .map(Cow::Borrowed)
///     }
///
///     fn description(&self) -> &str {
///         "PIN line"
///     }
/// }
///
/// let body = MessageBody::text("Hello\nPIN 4821\nBye");
/// assert_eq!(PinLine.find_match(&body).as_deref(), Some("4821"));
/// ```
pub trait Matcher: Send + Sync {
    /// Attempts to find and extract a value from the body.
    ///
    /// Uses `Cow<str>` so implementations can borrow straight from the body.
    fn find_match<'a>(&self, body: &MessageBody<'a>) -> Option<Cow<'a, str>>;

    /// Returns a human-readable description of what this matcher looks for.
    ///
    /// Used in logging.
    fn description(&self) -> &str;
}

impl Matcher for VerificationCodeExtractor {
    fn find_match<'a>(&self, body: &MessageBody<'a>) -> Option<Cow<'a, str>> {
        self.extract_body(body).map(Cow::Owned)
    }

    fn description(&self) -> &str {
        "verification code heuristics"
    }
}

/// Regex-based matcher that extracts the first capture group.
///
/// Runs over the plain-text body, or over the tag-stripped HTML body when
/// there is no text.
///
/// # Example
///
/// ```
/// use otp_extract::matcher::{Matcher, RegexMatcher};
/// use otp_extract::MessageBody;
///
/// let matcher = RegexMatcher::new(r"PIN:\s*(\d+)").unwrap();
/// let body = MessageBody::html("<p>PIN: <b>42</b></p>");
/// assert_eq!(matcher.find_match(&body).as_deref(), Some("42"));
/// ```
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: Regex,
    description: String,
}

impl RegexMatcher {
    /// Creates a new regex matcher.
    ///
    /// The pattern should contain at least one capture group; the first one is
    /// the match result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if the pattern does not compile.
    pub fn new(pattern: &str) -> Result<Self> {
        Self::with_description(pattern, format!("regex pattern: {pattern}"))
    }

    /// Creates a new regex matcher with a custom description.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if the pattern does not compile.
    ///
    /// # Example
    ///
    /// ```
    /// use otp_extract::matcher::{Matcher, RegexMatcher};
    ///
    /// let matcher = RegexMatcher::with_description(r"(\d{6})", "6-digit code").unwrap();
    /// assert_eq!(matcher.description(), "6-digit code");
    /// ```
    pub fn with_description(pattern: &str, description: impl Into<String>) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_owned(),
            source,
        })?;
        Ok(Self {
            regex,
            description: description.into(),
        })
    }
}

impl Matcher for RegexMatcher {
    fn find_match<'a>(&self, body: &MessageBody<'a>) -> Option<Cow<'a, str>> {
        match text::content_of(body.text, body.html) {
            Cow::Borrowed(content) => self
                .regex
                .captures(content)
                .and_then(|caps| caps.get(1))
                .map(|m| Cow::Borrowed(m.as_str())),
            Cow::Owned(content) => self
                .regex
                .captures(&content)
                .and_then(|caps| caps.get(1))
                .map(|m| Cow::Owned(m.as_str().to_owned())),
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_matcher() {
        let matcher = RegexMatcher::new(r"code:\s*(\d+)").unwrap();
        assert_eq!(
            matcher.find_match(&MessageBody::text("Your code: 12345")).as_deref(),
            Some("12345")
        );
        assert_eq!(matcher.find_match(&MessageBody::text("No code here")), None);
        assert_eq!(matcher.find_match(&MessageBody::default()), None);
    }

    #[test]
    fn test_regex_matcher_invalid_pattern() {
        let result = RegexMatcher::new("(unclosed");
        assert!(matches!(result, Err(Error::InvalidPattern { .. })));
    }

    #[test]
    fn test_regex_matcher_returns_borrowed() {
        // Plain-text bodies are matched in place, without allocation
        let matcher = RegexMatcher::new(r"code:\s*(\d+)").unwrap();
        let result = matcher.find_match(&MessageBody::text("Your code: 12345"));
        assert!(matches!(result, Some(Cow::Borrowed(_))));
    }

    #[test]
    fn test_regex_matcher_html_fallback() {
        let matcher = RegexMatcher::new(r"token=([a-f0-9]+)").unwrap();
        let body = MessageBody::html(r#"<a href="x">token=abc123</a>"#);
        let result = matcher.find_match(&body);
        assert!(matches!(result, Some(Cow::Owned(_))));
        assert_eq!(result.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_extractor_as_matcher() {
        let matcher: &dyn Matcher = &VerificationCodeExtractor::new();
        let body = MessageBody::text("验证码：4567");
        assert_eq!(matcher.find_match(&body).as_deref(), Some("4567"));
        assert_eq!(matcher.description(), "verification code heuristics");
    }
}
