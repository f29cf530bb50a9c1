//! The shared exclusion filter.
//!
//! Every strategy except the OTP anchor runs its candidate through
//! [`check`] before accepting it. The filter looks at two windows of text
//! around the candidate: a wide *full* context for patterns and words, and a
//! tighter *near* context for proximity to email addresses and URLs.
//!
//! # Example
//!
//! ```
//! use otp_extract::exclusion::{self, ExclusionReason};
//!
//! assert!(!exclusion::should_exclude("482913", "验证码：482913", "验证码：482913"));
//! assert_eq!(
//!     exclusion::check("111111", "code: 111111", "code: 111111"),
//!     Some(ExclusionReason::RepeatedDigit)
//! );
//! ```

use crate::rules::{self, EXCLUDED_CONTEXT_WORDS};
use once_cell::sync::Lazy;
use regex::Regex;

/// Candidates closer than this many characters to an `@` are treated as part
/// of an address.
pub const EMAIL_PROXIMITY: usize = 30;

/// Shortest sequential digit run that is rejected.
pub const MIN_SEQUENTIAL_LEN: usize = 5;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9_.\-]+@[A-Za-z0-9_.\-]+\.[A-Za-z0-9_]+").expect("valid regex")
});
static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S*").expect("valid regex"));

/// How firmly a candidate is tied to its keyword.
///
/// A code written right after `验证码：` or `code is:` is explicit enough that
/// the sequential-digit rule is waived for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// The candidate follows a keyword and a `:`/`是`/`为` separator.
    Separator,
    /// The candidate was found by proximity or markup only.
    Proximity,
}

/// Why a candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    /// The full context matched a named exclusion pattern.
    Pattern(&'static str),
    /// The candidate is one digit repeated (`111111`).
    RepeatedDigit,
    /// The candidate is an ascending or descending digit run (`123456`).
    SequentialDigits,
    /// The candidate sits next to an email address.
    NearEmailAddress,
    /// The full context contains a disqualifying word.
    ContextWord(&'static str),
    /// The candidate is shorter than 4 or longer than 8 characters.
    Length,
    /// The candidate is part of a URL.
    InsideUrl,
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExclusionReason::Pattern(name) => write!(f, "pattern:{name}"),
            ExclusionReason::RepeatedDigit => write!(f, "repeated_digit"),
            ExclusionReason::SequentialDigits => write!(f, "sequential_digits"),
            ExclusionReason::NearEmailAddress => write!(f, "near_email_address"),
            ExclusionReason::ContextWord(word) => write!(f, "context_word:{word}"),
            ExclusionReason::Length => write!(f, "length"),
            ExclusionReason::InsideUrl => write!(f, "inside_url"),
        }
    }
}

/// Returns `true` if the candidate must be rejected.
#[must_use]
pub fn should_exclude(candidate: &str, full_context: &str, near_context: &str) -> bool {
    check(candidate, full_context, near_context).is_some()
}

/// Runs every exclusion rule and returns the first one that fires.
#[must_use]
pub fn check(candidate: &str, full_context: &str, near_context: &str) -> Option<ExclusionReason> {
    check_anchored(candidate, full_context, near_context, Anchor::Proximity)
}

/// Like [`check`], with the sequential-digit rule waived for
/// [`Anchor::Separator`] candidates.
#[must_use]
pub fn check_anchored(
    candidate: &str,
    full_context: &str,
    near_context: &str,
    anchor: Anchor,
) -> Option<ExclusionReason> {
    if let Some(pattern) = rules::first_exclusion(full_context) {
        return Some(ExclusionReason::Pattern(pattern.name()));
    }

    if is_repeated_digit(candidate) {
        return Some(ExclusionReason::RepeatedDigit);
    }

    if anchor == Anchor::Proximity
        && candidate.len() >= MIN_SEQUENTIAL_LEN
        && is_sequential(candidate)
    {
        return Some(ExclusionReason::SequentialDigits);
    }

    if email_distance(candidate, near_context).is_some_and(|d| d < EMAIL_PROXIMITY) {
        return Some(ExclusionReason::NearEmailAddress);
    }

    let lower = full_context.to_lowercase();
    if let Some(word) = EXCLUDED_CONTEXT_WORDS.iter().find(|w| lower.contains(**w)) {
        return Some(ExclusionReason::ContextWord(*word));
    }

    if !(4..=8).contains(&candidate.chars().count()) {
        return Some(ExclusionReason::Length);
    }

    if URL.is_match(near_context) && near_context.contains(candidate) {
        return Some(ExclusionReason::InsideUrl);
    }

    None
}

/// Whether `s` is a single digit repeated at least twice.
#[must_use]
pub fn is_repeated_digit(s: &str) -> bool {
    let mut bytes = s.bytes();
    match bytes.next() {
        Some(first) if first.is_ascii_digit() && s.len() >= 2 => bytes.all(|b| b == first),
        _ => false,
    }
}

/// Whether `s` is all digits, each one more (or each one less) than the last.
#[must_use]
pub fn is_sequential(s: &str) -> bool {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let digits = s.as_bytes();
    let ascending = digits.windows(2).all(|w| w[1] == w[0] + 1);
    let descending = digits.windows(2).all(|w| w[0] == w[1] + 1);
    ascending || descending
}

/// Character distance between the first `@` in `near_context` and the first
/// occurrence of `candidate`, when the context contains an email address.
fn email_distance(candidate: &str, near_context: &str) -> Option<usize> {
    if !EMAIL.is_match(near_context) {
        return None;
    }
    let at = near_context.find('@')?;
    let code = near_context.find(candidate)?;
    let at = near_context[..at].chars().count();
    let code = near_context[..code].chars().count();
    Some(at.abs_diff(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_digit() {
        assert!(is_repeated_digit("111111"));
        assert!(is_repeated_digit("0000"));
        assert!(!is_repeated_digit("1"));
        assert!(!is_repeated_digit("111112"));
        assert!(!is_repeated_digit("AAAA"));
    }

    #[test]
    fn test_sequential() {
        assert!(is_sequential("123456"));
        assert!(is_sequential("654321"));
        assert!(is_sequential("3456789"));
        assert!(!is_sequential("123457"));
        assert!(!is_sequential("12AB56"));
        assert!(!is_sequential("901234"));
    }

    #[test]
    fn test_clean_candidate_passes() {
        let ctx = "Your verification code is: 789012";
        assert_eq!(check("789012", ctx, ctx), None);
    }

    #[test]
    fn test_pattern_reason_comes_first() {
        let ctx = "验证码 111111，发送时间：2024年12月14日";
        assert_eq!(check("111111", ctx, ctx), Some(ExclusionReason::Pattern("date")));
    }

    #[test]
    fn test_sequential_rule_respects_anchor() {
        let ctx = "验证码：123456";
        assert_eq!(check("123456", ctx, ctx), Some(ExclusionReason::SequentialDigits));
        assert_eq!(check_anchored("123456", ctx, ctx, Anchor::Separator), None);
        assert_eq!(check("1234", ctx, ctx), None);
    }

    #[test]
    fn test_near_email_address() {
        let ctx = "Your code: 482913 sent to ab@x.io";
        assert_eq!(check("482913", ctx, ctx), Some(ExclusionReason::NearEmailAddress));

        let far = format!("Your code: 482913{}ab@x.io", " ".repeat(40));
        assert_eq!(check("482913", &far, &far), None);
    }

    #[test]
    fn test_context_word() {
        let ctx = "验证码 482913 请在电话中告知";
        assert_eq!(check("482913", ctx, ctx), Some(ExclusionReason::ContextWord("电话")));

        let ctx = "Security code 482913, valid for a short time";
        assert_eq!(check("482913", ctx, ctx), Some(ExclusionReason::ContextWord("time")));
    }

    #[test]
    fn test_length_bounds() {
        assert_eq!(check("482", "", ""), Some(ExclusionReason::Length));
        assert_eq!(check("482913571", "", ""), Some(ExclusionReason::Length));
        assert_eq!(check("4829", "", ""), None);
    }

    #[test]
    fn test_inside_url() {
        assert_eq!(
            check("AB12", "", "see https://x.io/AB12"),
            Some(ExclusionReason::InsideUrl)
        );
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(ExclusionReason::Pattern("date").to_string(), "pattern:date");
        assert_eq!(ExclusionReason::ContextWord("tel").to_string(), "context_word:tel");
        assert_eq!(ExclusionReason::Length.to_string(), "length");
    }
}
