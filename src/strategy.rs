//! The ordered extraction strategies.
//!
//! Each strategy is a plain function from the prepared [`ExtractionContext`]
//! to an optional code. [`PIPELINE`] lists them from the most to the least
//! precise; the extractor walks it and stops at the first hit.

use crate::exclusion::{self, Anchor};
use crate::rules;
use crate::text;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use tracing::trace;

/// Characters after a strict keyword searched for a code.
const STRICT_SEARCH_CHARS: usize = 50;
/// Characters after a medium keyword searched for a code.
const MEDIUM_SEARCH_CHARS: usize = 40;
/// Characters of HTML on each side of an emphasized code.
const HTML_CONTEXT_CHARS: usize = 300;

static OTP_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@[A-Za-z0-9_.\-]+\s+#([0-9]{4,8})(?:[^A-Za-z0-9_]|$)").expect("valid regex")
});

// Runs are captured greedily and length-checked afterwards, which is what a
// `{4,8}` quantifier followed by a "no more alphanumerics" lookahead accepts.
static SEPARATED_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[:：是为]\s*([A-Za-z0-9]+)").expect("valid regex"));
static SPACED_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([A-Za-z0-9]+)").expect("valid regex"));
static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

static EMPHASIS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i:<(?:strong|b|em|mark)\s*[^>]*>)\s*([A-Za-z0-9]{4,8})\s*(?i:</(?:strong|b|em|mark)>)",
        r"(?i:<span[^>]*(?:font-size:\s*(?:[2-9]|[1-9][0-9])|font-weight:\s*(?:bold|[6-9]00))[^>]*>)\s*([A-Za-z0-9]{4,8})\s*(?i:</span>)",
        r"(?i:<(?:h[1-6]|p)\s*[^>]*>)\s*([A-Za-z0-9]{5,8})\s*(?i:</(?:h[1-6]|p)>)",
        r"(?i:<div[^>]*>)\s*([A-Za-z0-9]{6})\s*(?i:</div>)",
    ]
    .iter()
    .map(|source| Regex::new(source).expect("emphasis patterns are valid"))
    .collect()
});

static STANDALONE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{2,}([A-Za-z0-9]{5,7})\n{2,}").expect("valid regex"));

/// Identifies the strategy that produced a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// `user@example.com #123456`, the Apple-style one-time code suffix.
    OtpAnchor,
    /// A code right after a high-confidence keyword.
    StrictKeyword,
    /// A code wrapped in emphasis markup near a keyword.
    HtmlEmphasis,
    /// A 5–8 digit number right after a lower-confidence keyword.
    MediumKeyword,
    /// A code alone on its own paragraph near a keyword.
    StandaloneLine,
}

impl Strategy {
    /// Stable snake-case name, used in logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Strategy::OtpAnchor => "otp_anchor",
            Strategy::StrictKeyword => "strict_keyword",
            Strategy::HtmlEmphasis => "html_emphasis",
            Strategy::MediumKeyword => "medium_keyword",
            Strategy::StandaloneLine => "standalone_line",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Inputs shared by every strategy for one extraction call.
#[derive(Debug)]
pub(crate) struct ExtractionContext<'a> {
    content: Cow<'a, str>,
    html: Option<&'a str>,
}

impl<'a> ExtractionContext<'a> {
    /// Prepares the working content, or `None` when there is nothing to scan.
    pub(crate) fn new(text: Option<&'a str>, html: Option<&'a str>, max_chars: usize) -> Option<Self> {
        let text = text.map(|t| text::truncate_chars(t, max_chars));
        let html = html
            .filter(|h| !h.is_empty())
            .map(|h| text::truncate_chars(h, max_chars));

        let content = text::content_of(text, html);
        if content.is_empty() {
            return None;
        }

        Some(Self { content, html })
    }

    pub(crate) fn content(&self) -> &str {
        &self.content
    }
}

type StrategyFn = fn(&ExtractionContext<'_>) -> Option<String>;

/// Strategies in priority order.
pub(crate) const PIPELINE: &[(Strategy, StrategyFn)] = &[
    (Strategy::OtpAnchor, otp_anchor),
    (Strategy::StrictKeyword, strict_keyword),
    (Strategy::HtmlEmphasis, html_emphasis),
    (Strategy::MediumKeyword, medium_keyword),
    (Strategy::StandaloneLine, standalone_line),
];

fn accept(strategy: Strategy, code: &str, full: &str, near: &str, anchor: Anchor) -> bool {
    match exclusion::check_anchored(code, full, near, anchor) {
        Some(reason) => {
            trace!(strategy = %strategy, %reason, "Candidate rejected");
            false
        }
        None => true,
    }
}

fn otp_anchor(ctx: &ExtractionContext<'_>) -> Option<String> {
    OTP_ANCHOR
        .captures(ctx.content())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// First `[:：是为]`-separated run of 4–8 alphanumerics in `search`.
fn separated_candidate(search: &str) -> Option<&str> {
    SEPARATED_RUN
        .captures_iter(search)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .find(|run| (4..=8).contains(&run.len()))
}

/// First whitespace-led run of 4–8 alphanumerics not followed by `@` or `.`.
fn spaced_candidate(search: &str) -> Option<&str> {
    SPACED_RUN
        .captures_iter(search)
        .filter_map(|caps| caps.get(1))
        .find(|m| {
            (4..=8).contains(&m.len()) && !matches!(search[m.end()..].chars().next(), Some('@' | '.'))
        })
        .map(|m| m.as_str())
}

fn strict_keyword(ctx: &ExtractionContext<'_>) -> Option<String> {
    let content = ctx.content();

    rules::strict_keywords().iter().find_map(|keyword| {
        let idx = text::char_index(content, keyword.find(content)?);
        let search = text::window(content, idx, idx + STRICT_SEARCH_CHARS);

        let finders: [(fn(&str) -> Option<&str>, Anchor); 2] = [
            (separated_candidate, Anchor::Separator),
            (spaced_candidate, Anchor::Proximity),
        ];

        finders.into_iter().find_map(|(find, anchor)| {
            let raw = find(search).filter(|c| text::has_digit(c))?;
            let code = raw.to_ascii_uppercase();
            let full = text::window(content, idx.saturating_sub(100), idx + 150);
            let near = text::window(content, idx.saturating_sub(30), idx + 80);
            accept(Strategy::StrictKeyword, &code, full, near, anchor).then_some(code)
        })
    })
}

fn html_emphasis(ctx: &ExtractionContext<'_>) -> Option<String> {
    let html = ctx.html?;

    EMPHASIS.iter().find_map(|pattern| {
        pattern.captures_iter(html).find_map(|caps| {
            let whole = caps.get(0)?;
            let raw = caps.get(1)?.as_str();
            if !text::has_digit(raw) {
                return None;
            }

            let code = raw.to_ascii_uppercase();
            let start = text::char_index(html, whole.start());
            let surrounding = text::window(
                html,
                start.saturating_sub(HTML_CONTEXT_CHARS),
                start + HTML_CONTEXT_CHARS,
            );

            (rules::has_any_keyword(surrounding)
                && accept(Strategy::HtmlEmphasis, &code, surrounding, surrounding, Anchor::Proximity))
            .then_some(code)
        })
    })
}

/// First 5–8 digit number in `search` standing on ASCII word boundaries.
fn bounded_digits(search: &str) -> Option<&str> {
    let is_word = |c: Option<char>| c.is_some_and(text::is_ascii_word);

    DIGIT_RUN
        .find_iter(search)
        .find(|m| {
            let before = search[..m.start()].chars().next_back();
            let after = search[m.end()..].chars().next();
            (5..=8).contains(&m.len()) && !is_word(before) && !is_word(after)
        })
        .map(|m| m.as_str())
}

fn medium_keyword(ctx: &ExtractionContext<'_>) -> Option<String> {
    let content = ctx.content();

    rules::medium_keywords().iter().find_map(|keyword| {
        let idx = text::char_index(content, keyword.find(content)?);
        let after = text::window(content, idx, idx + MEDIUM_SEARCH_CHARS);
        let code = bounded_digits(after)?.to_owned();
        let full = text::window(content, idx.saturating_sub(80), idx + 100);
        let near = text::window(content, idx.saturating_sub(20), idx + 60);
        accept(Strategy::MediumKeyword, &code, full, near, Anchor::Proximity).then_some(code)
    })
}

fn standalone_line(ctx: &ExtractionContext<'_>) -> Option<String> {
    let content = text::normalize_newlines(ctx.content());
    let content = content.as_ref();

    STANDALONE_LINE.captures_iter(content).find_map(|caps| {
        let whole = caps.get(0)?;
        let raw = caps.get(1)?.as_str();
        if !text::has_digit(raw) {
            return None;
        }

        let code = raw.to_ascii_uppercase();
        let start = text::char_index(content, whole.start());
        let end = start + whole.as_str().chars().count();
        let surrounding = text::window(content, start.saturating_sub(150), end + 50);

        (rules::has_strict_keyword(surrounding)
            && accept(Strategy::StandaloneLine, &code, surrounding, surrounding, Anchor::Proximity))
        .then_some(code)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(text: Option<&'a str>, html: Option<&'a str>) -> ExtractionContext<'a> {
        ExtractionContext::new(text, html, usize::MAX).unwrap()
    }

    #[test]
    fn test_context_empty_inputs() {
        assert!(ExtractionContext::new(None, None, 100).is_none());
        assert!(ExtractionContext::new(Some(""), Some(""), 100).is_none());
    }

    #[test]
    fn test_context_truncates() {
        let long = "a".repeat(500);
        let c = ExtractionContext::new(Some(&long), None, 10).unwrap();
        assert_eq!(c.content().len(), 10);
    }

    #[test]
    fn test_otp_anchor() {
        assert_eq!(otp_anchor(&ctx(Some("@example.com #123456"), None)).as_deref(), Some("123456"));
        assert_eq!(otp_anchor(&ctx(Some("@example.com #123456789"), None)), None);
        assert_eq!(otp_anchor(&ctx(Some("example.com #123456"), None)), None);
    }

    #[test]
    fn test_separated_candidate_length_bounds() {
        assert_eq!(separated_candidate("验证码：4567"), Some("4567"));
        assert_eq!(separated_candidate("验证码：123"), None);
        assert_eq!(separated_candidate("验证码：123456789"), None);
        assert_eq!(separated_candidate("验证码为：AB12CD，"), Some("AB12CD"));
    }

    #[test]
    fn test_spaced_candidate_skips_addresses() {
        assert_eq!(spaced_candidate("code 4821 please"), Some("4821"));
        assert_eq!(spaced_candidate("code 4821@x.io"), None);
        assert_eq!(spaced_candidate("code is ab12 now"), Some("ab12"));
        assert_eq!(spaced_candidate("x 48213.5"), None);
    }

    #[test]
    fn test_strict_keyword() {
        let c = ctx(Some("您的验证码是：482913，有效期10分钟。"), None);
        assert_eq!(strict_keyword(&c).as_deref(), Some("482913"));

        let c = ctx(Some("验证码: ab12cd"), None);
        assert_eq!(strict_keyword(&c).as_deref(), Some("AB12CD"));
    }

    #[test]
    fn test_strict_keyword_rejected_by_context() {
        let c = ctx(Some("验证码：482913，订单号：99812"), None);
        assert_eq!(strict_keyword(&c), None);
    }

    #[test]
    fn test_html_emphasis() {
        let html = "<p>Your verification code</p><div><strong>a1b2c3</strong></div>";
        let c = ctx(None, Some(html));
        assert_eq!(html_emphasis(&c).as_deref(), Some("A1B2C3"));
    }

    #[test]
    fn test_html_emphasis_needs_keyword() {
        let html = "<p>Welcome aboard</p><strong>A1B2C3</strong>";
        assert_eq!(html_emphasis(&ctx(None, Some(html))), None);
    }

    #[test]
    fn test_html_emphasis_styled_span() {
        let html = r#"<p>Security code</p><span style="font-size: 24px">X7Y8Z9</span>"#;
        assert_eq!(html_emphasis(&ctx(None, Some(html))).as_deref(), Some("X7Y8Z9"));
    }

    #[test]
    fn test_html_emphasis_heading_and_paragraph() {
        let html = "<p>Verification code</p><h2>A1B2C3</h2>";
        assert_eq!(html_emphasis(&ctx(None, Some(html))).as_deref(), Some("A1B2C3"));

        // Headings and paragraphs need at least 5 characters
        let html = "<p>Verification code</p><p>A1B2</p>";
        assert_eq!(html_emphasis(&ctx(None, Some(html))), None);
    }

    #[test]
    fn test_html_emphasis_div_exactly_six() {
        let html = "<p>Verification code</p><div>A1B2C3</div>";
        assert_eq!(html_emphasis(&ctx(None, Some(html))).as_deref(), Some("A1B2C3"));

        let html = "<p>Verification code</p><div>A1B2C</div>";
        assert_eq!(html_emphasis(&ctx(None, Some(html))), None);
    }

    #[test]
    fn test_html_emphasis_medium_keyword_suffices() {
        let html = "<p>Your passcode</p><strong>98a7b6</strong>";
        assert_eq!(html_emphasis(&ctx(None, Some(html))).as_deref(), Some("98A7B6"));
    }

    #[test]
    fn test_bounded_digits() {
        assert_eq!(bounded_digits("access code 482913 now"), Some("482913"));
        assert_eq!(bounded_digits("access code A482913 now"), None);
        assert_eq!(bounded_digits("code 4821 or 48213"), Some("48213"));
        assert_eq!(bounded_digits("code 4821"), None);
        assert_eq!(bounded_digits("码是482913"), Some("482913"));
    }

    #[test]
    fn test_medium_keyword() {
        let c = ctx(Some("Use access code 482913 to sign in"), None);
        assert_eq!(medium_keyword(&c).as_deref(), Some("482913"));
    }

    #[test]
    fn test_standalone_line() {
        let body = "Please use the verification code below to complete your sign in to the dashboard.\n\n7G4K2Q\n\nThanks";
        assert_eq!(standalone_line(&ctx(Some(body), None)).as_deref(), Some("7G4K2Q"));

        let crlf = body.replace('\n', "\r\n");
        assert_eq!(standalone_line(&ctx(Some(&crlf), None)).as_deref(), Some("7G4K2Q"));
    }

    #[test]
    fn test_standalone_line_needs_keyword() {
        let body = "感谢您的订单\n\n订单详情：\n\n482913\n\n商品已发货";
        assert_eq!(standalone_line(&ctx(Some(body), None)), None);
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(Strategy::OtpAnchor.to_string(), "otp_anchor");
        assert_eq!(PIPELINE.len(), 5);
        assert_eq!(PIPELINE[0].0, Strategy::OtpAnchor);
        assert_eq!(PIPELINE[4].0, Strategy::StandaloneLine);
    }
}
