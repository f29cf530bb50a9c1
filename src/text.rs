//! Internal text helpers: character windows, tag stripping, previews.
//!
//! All offsets handed around by the strategies are character indices, so a
//! 50-character window means 50 characters of Chinese text as well as of
//! ASCII, never 50 bytes.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

const PREVIEW_CHARS: usize = 100;

/// Byte offset of the character at `char_idx`, clamped to the end of `s`.
pub(crate) fn byte_offset(s: &str, char_idx: usize) -> usize {
    s.char_indices().nth(char_idx).map_or(s.len(), |(b, _)| b)
}

/// Character index of the byte offset `byte_idx` (must be a char boundary).
pub(crate) fn char_index(s: &str, byte_idx: usize) -> usize {
    s[..byte_idx].chars().count()
}

/// Slice of `s` covering characters `[start, end)`, clamped to the string.
pub(crate) fn window(s: &str, start: usize, end: usize) -> &str {
    if start >= end {
        return "";
    }
    let from = byte_offset(s, start);
    let to = from + byte_offset(&s[from..], end - start);
    &s[from..to]
}

/// The first `max` characters of `s`.
pub(crate) fn truncate_chars(s: &str, max: usize) -> &str {
    &s[..byte_offset(s, max)]
}

/// Replaces every tag with a single space and `&nbsp;` with a space.
pub(crate) fn strip_tags(html: &str) -> String {
    TAG.replace_all(html, " ").replace("&nbsp;", " ")
}

/// Deletes every tag, leaving entities and surrounding text untouched.
pub(crate) fn remove_tags(html: &str) -> Cow<'_, str> {
    TAG.replace_all(html, "")
}

/// Rewrites CRLF and lone CR line endings as LF.
pub(crate) fn normalize_newlines(s: &str) -> Cow<'_, str> {
    if s.contains('\r') {
        Cow::Owned(s.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(s)
    }
}

/// Text the strategies scan: the plain-text body if present, else stripped HTML.
pub(crate) fn content_of<'a>(text: Option<&'a str>, html: Option<&'a str>) -> Cow<'a, str> {
    match (text, html) {
        (Some(text), _) if !text.is_empty() => Cow::Borrowed(text),
        (_, Some(html)) if !html.is_empty() => Cow::Owned(strip_tags(html)),
        _ => Cow::Borrowed(""),
    }
}

pub(crate) fn has_digit(s: &str) -> bool {
    s.bytes().any(|b| b.is_ascii_digit())
}

/// Whether `c` counts as a word character for ASCII `\b` semantics.
pub(crate) fn is_ascii_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Short single-line preview of a message body.
///
/// Whitespace is collapsed, the result is trimmed and cut to 100 characters
/// followed by `...`. HTML bodies are used only when there is no text body.
///
/// ```
/// use otp_extract::preview;
///
/// assert_eq!(preview(Some("Hello\n\n  world"), None), "Hello world");
/// assert_eq!(preview(None, Some("<p>Hi <b>there</b></p>")), "Hi there");
/// assert_eq!(preview(None, None), "(no content)");
/// ```
#[must_use]
pub fn preview(text: Option<&str>, html: Option<&str>) -> String {
    let collapsed = match (text, html) {
        (Some(text), _) if !text.is_empty() => collapse_whitespace(text),
        (_, Some(html)) if !html.is_empty() => collapse_whitespace(&remove_tags(html)),
        _ => return "(no content)".to_owned(),
    };

    if collapsed.chars().count() <= PREVIEW_CHARS {
        collapsed
    } else {
        format!("{}...", truncate_chars(&collapsed, PREVIEW_CHARS))
    }
}

fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_owned()
}
