//! Verification-code lookups over stored mail.
//!
//! [`find_code`] answers "what is the latest code sent to this mailbox in the
//! last N seconds"; [`search_codes`] runs the same question over several
//! mailboxes with optional sender and subject filters. Both take the emails
//! as a slice so the caller decides where they come from.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use otp_extract::lookup::{find_code, CodeLookup};
//! use otp_extract::{LookupConfig, StoredEmail, VerificationCodeExtractor};
//!
//! let now = Utc::now();
//! let emails = vec![StoredEmail {
//!     id: "m1".into(),
//!     mailbox: "box@example.com".into(),
//!     from_address: "noreply@service.test".into(),
//!     from_name: None,
//!     subject: Some("Sign in".into()),
//!     text: Some("Your verification code is: 789012".into()),
//!     html: None,
//!     received_at: now,
//! }];
//!
//! let result = find_code(
//!     &emails,
//!     "box@example.com",
//!     &LookupConfig::default(),
//!     now,
//!     &VerificationCodeExtractor::new(),
//! )
//! .unwrap();
//!
//! assert_eq!(result.code(), Some("789012"));
//! ```

use crate::config::LookupConfig;
use crate::error::{Error, Result};
use crate::matcher::Matcher;
use crate::message::StoredEmail;
use crate::text;
use chrono::{DateTime, Utc};
use email_address::EmailAddress;
use serde::Serialize;
use std::borrow::Cow;
use tracing::{debug, instrument};

const SNIPPET_CHARS: usize = 200;

/// Metadata of a stored email, as returned with a lookup result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailSummary {
    /// Store identifier.
    pub id: String,
    /// Subject line.
    pub subject: Option<String>,
    /// Sender address.
    pub sender: String,
    /// Sender display name.
    pub sender_name: Option<String>,
    /// When the email was received.
    pub received_at: DateTime<Utc>,
    /// Start of the body, only set on the "latest email" of a miss.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_snippet: Option<String>,
}

impl EmailSummary {
    fn of(email: &StoredEmail) -> Self {
        Self {
            id: email.id.clone(),
            subject: email.subject.clone(),
            sender: email.from_address.clone(),
            sender_name: email.from_name.clone(),
            received_at: email.received_at,
            text_snippet: None,
        }
    }

    fn with_snippet(email: &StoredEmail) -> Self {
        Self {
            text_snippet: snippet(email),
            ..Self::of(email)
        }
    }
}

/// First characters of the text body, else of the HTML body with tags removed.
fn snippet(email: &StoredEmail) -> Option<String> {
    let raw = match (email.text.as_deref(), email.html.as_deref()) {
        (Some(text), _) if !text.is_empty() => Cow::Borrowed(text),
        (_, Some(html)) => text::remove_tags(html),
        _ => return None,
    };
    let cut = text::truncate_chars(&raw, SNIPPET_CHARS);
    (!cut.trim().is_empty()).then(|| cut.to_owned())
}

/// Outcome of [`find_code`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CodeLookup {
    /// A code was extracted from a recent email.
    Found {
        /// The extracted code.
        code: String,
        /// The email it came from.
        email: EmailSummary,
    },
    /// No recent email carried a code.
    NotFound {
        /// The newest email of the mailbox, inside the window or not.
        latest: Option<EmailSummary>,
    },
}

impl CodeLookup {
    /// The code, if one was found.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            CodeLookup::Found { code, .. } => Some(code),
            CodeLookup::NotFound { .. } => None,
        }
    }
}

/// Finds the newest verification code sent to `mailbox`.
///
/// Looks at the mailbox's newest `per_mailbox_limit` emails and stops at the
/// first one received before `now - window`.
///
/// # Errors
///
/// - [`Error::InvalidMailbox`] if `mailbox` is not a valid address
/// - [`Error::InvalidConfig`] if the window cannot be applied to `now`
#[instrument(
    name = "lookup::find_code",
    skip_all,
    fields(mailbox = %mailbox, window_secs = config.window.as_secs())
)]
pub fn find_code(
    emails: &[StoredEmail],
    mailbox: &str,
    config: &LookupConfig,
    now: DateTime<Utc>,
    matcher: &dyn Matcher,
) -> Result<CodeLookup> {
    validate_mailbox(mailbox)?;
    let since = cutoff(now, config)?;
    let recent = newest_first(emails, mailbox, config.per_mailbox_limit);

    for email in recent.iter().take_while(|email| email.received_at >= since) {
        if let Some(code) = matcher.find_match(&email.body()) {
            debug!(email_id = %email.id, matcher = %matcher.description(), "Code found");
            return Ok(CodeLookup::Found {
                code: code.into_owned(),
                email: EmailSummary::of(email),
            });
        }
    }

    debug!(checked = recent.len(), "No code in recent emails");

    Ok(CodeLookup::NotFound {
        latest: recent.first().map(|email| EmailSummary::with_snippet(email)),
    })
}

/// Mailboxes and filters for [`search_codes`].
///
/// # Example
///
/// ```
/// use otp_extract::lookup::SearchQuery;
///
/// let query = SearchQuery::new(["a@example.com", "b@example.com"])
///     .sender("github")
///     .subject("verify");
/// assert_eq!(query.mailboxes.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Mailboxes to search, must not be empty.
    pub mailboxes: Vec<String>,
    /// Case-insensitive substring of the sender address or name.
    pub sender: Option<String>,
    /// Case-insensitive substring of the subject.
    pub subject: Option<String>,
}

impl SearchQuery {
    /// Creates a query over the given mailboxes.
    #[must_use]
    pub fn new<I, S>(mailboxes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mailboxes: mailboxes.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Only consider emails whose sender contains `sender`.
    #[must_use]
    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Only consider emails whose subject contains `subject`.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    fn accepts(&self, email: &StoredEmail) -> bool {
        let sender_ok = self.sender.as_deref().map_or(true, |needle| {
            let needle = needle.to_lowercase();
            email.from_address.to_lowercase().contains(&needle)
                || email
                    .from_name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&needle))
        });

        let subject_ok = self.subject.as_deref().map_or(true, |needle| {
            email
                .subject
                .as_deref()
                .is_some_and(|subject| subject.to_lowercase().contains(&needle.to_lowercase()))
        });

        sender_ok && subject_ok
    }
}

/// Per-mailbox entry of a [`SearchReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailboxResult {
    /// The mailbox as given in the query.
    pub mailbox: String,
    /// The first code found.
    pub code: Option<String>,
    /// The email the code came from.
    pub email: Option<EmailSummary>,
    /// Emails that passed the window and filters.
    pub emails_checked: usize,
    /// Why this mailbox could not be searched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Totals of a [`SearchReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchSummary {
    /// Number of mailboxes queried.
    pub total: usize,
    /// Mailboxes with a code.
    pub found: usize,
    /// Mailboxes without a code, including failed ones.
    pub not_found: usize,
}

/// Result of [`search_codes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    /// One entry per queried mailbox, in query order.
    pub results: Vec<MailboxResult>,
    /// Totals.
    pub summary: SearchSummary,
}

/// Searches several mailboxes for verification codes.
///
/// Each mailbox contributes its newest `batch_limit` emails inside the window
/// that pass the query filters; the first code among them wins. An invalid
/// mailbox address is reported in its [`MailboxResult::error`] and does not
/// fail the batch.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] if the query lists no mailboxes or the
/// window cannot be applied to `now`.
#[instrument(
    name = "lookup::search_codes",
    skip_all,
    fields(mailboxes = query.mailboxes.len(), window_secs = config.window.as_secs())
)]
pub fn search_codes(
    emails: &[StoredEmail],
    query: &SearchQuery,
    config: &LookupConfig,
    now: DateTime<Utc>,
    matcher: &dyn Matcher,
) -> Result<SearchReport> {
    if query.mailboxes.is_empty() {
        return Err(Error::InvalidConfig {
            message: "mailboxes must not be empty".into(),
        });
    }

    let since = cutoff(now, config)?;

    let results: Vec<MailboxResult> = query
        .mailboxes
        .iter()
        .map(|mailbox| search_mailbox(emails, mailbox, query, config, since, matcher))
        .collect();

    let found = results.iter().filter(|r| r.code.is_some()).count();
    let summary = SearchSummary {
        total: results.len(),
        found,
        not_found: results.len() - found,
    };

    debug!(found = summary.found, total = summary.total, "Search finished");

    Ok(SearchReport { results, summary })
}

fn search_mailbox(
    emails: &[StoredEmail],
    mailbox: &str,
    query: &SearchQuery,
    config: &LookupConfig,
    since: DateTime<Utc>,
    matcher: &dyn Matcher,
) -> MailboxResult {
    if let Err(e) = validate_mailbox(mailbox) {
        return MailboxResult {
            mailbox: mailbox.to_owned(),
            code: None,
            email: None,
            emails_checked: 0,
            error: Some(e.to_string()),
        };
    }

    let candidates: Vec<&StoredEmail> = newest_first(emails, mailbox, config.batch_limit)
        .into_iter()
        .filter(|email| email.received_at >= since && query.accepts(email))
        .collect();

    let hit = candidates.iter().find_map(|email| {
        matcher
            .find_match(&email.body())
            .map(|code| (code.into_owned(), EmailSummary::of(email)))
    });

    let (code, email) = hit.unzip();

    MailboxResult {
        mailbox: mailbox.to_owned(),
        code,
        email,
        emails_checked: candidates.len(),
        error: None,
    }
}

fn validate_mailbox(mailbox: &str) -> Result<()> {
    EmailAddress::parse_with_options(mailbox, email_address::Options::default())
        .map(|_| ())
        .map_err(|_| Error::InvalidMailbox {
            address: mailbox.to_owned(),
        })
}

fn cutoff(now: DateTime<Utc>, config: &LookupConfig) -> Result<DateTime<Utc>> {
    chrono::Duration::from_std(config.window)
        .ok()
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| Error::InvalidConfig {
            message: format!("window of {}s is out of range", config.window.as_secs()),
        })
}

/// The mailbox's emails, newest first, at most `limit` of them.
fn newest_first<'e>(emails: &'e [StoredEmail], mailbox: &str, limit: usize) -> Vec<&'e StoredEmail> {
    let mut own: Vec<&StoredEmail> = emails
        .iter()
        .filter(|email| email.mailbox.eq_ignore_ascii_case(mailbox))
        .collect();
    own.sort_by(|a, b| b.received_at.cmp(&a.received_at));
    own.truncate(limit);
    own
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::VerificationCodeExtractor;
    use crate::matcher::RegexMatcher;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    fn email(id: &str, mailbox: &str, secs_ago: i64, text: &str) -> StoredEmail {
        StoredEmail {
            id: id.into(),
            mailbox: mailbox.into(),
            from_address: "noreply@service.test".into(),
            from_name: Some("Service".into()),
            subject: Some(format!("Message {id}")),
            text: Some(text.into()),
            html: None,
            received_at: now() - chrono::Duration::seconds(secs_ago),
        }
    }

    fn lookup(emails: &[StoredEmail], mailbox: &str, config: &LookupConfig) -> CodeLookup {
        find_code(emails, mailbox, config, now(), &VerificationCodeExtractor::new()).unwrap()
    }

    #[test]
    fn test_find_code_newest_wins() {
        let emails = vec![
            email("old", "box@example.com", 300, "验证码：111222"),
            email("new", "box@example.com", 60, "Your verification code is: 789012"),
            email("other", "else@example.com", 10, "验证码：482913"),
        ];

        match lookup(&emails, "box@example.com", &LookupConfig::default()) {
            CodeLookup::Found { code, email } => {
                assert_eq!(code, "789012");
                assert_eq!(email.id, "new");
                assert_eq!(email.sender, "noreply@service.test");
                assert_eq!(email.text_snippet, None);
            }
            other => panic!("expected a code, got {other:?}"),
        }
    }

    #[test]
    fn test_find_code_skips_emails_without_code() {
        let emails = vec![
            email("a", "box@example.com", 30, "Welcome aboard"),
            email("b", "box@example.com", 120, "验证码：482913"),
        ];
        let result = lookup(&emails, "box@example.com", &LookupConfig::default());
        assert_eq!(result.code(), Some("482913"));
    }

    #[test]
    fn test_find_code_mailbox_case_insensitive() {
        let emails = vec![email("a", "box@example.com", 30, "验证码：482913")];
        let result = lookup(&emails, "Box@Example.COM", &LookupConfig::default());
        assert_eq!(result.code(), Some("482913"));
    }

    #[test]
    fn test_find_code_outside_window() {
        let emails = vec![
            email("a", "box@example.com", 700, "验证码：482913"),
            email("b", "box@example.com", 900, "验证码：735102"),
        ];

        let result = lookup(&emails, "box@example.com", &LookupConfig::default());
        let CodeLookup::NotFound { latest: Some(latest) } = result else {
            panic!("expected a miss with the latest email");
        };
        assert_eq!(latest.id, "a");
        assert_eq!(latest.text_snippet.as_deref(), Some("验证码：482913"));
    }

    #[test]
    fn test_find_code_window_boundary_inclusive() {
        let emails = vec![email("a", "box@example.com", 600, "验证码：482913")];
        let result = lookup(&emails, "box@example.com", &LookupConfig::default());
        assert_eq!(result.code(), Some("482913"));
    }

    #[test]
    fn test_find_code_respects_limit() {
        let emails = vec![
            email("a", "box@example.com", 10, "Welcome"),
            email("b", "box@example.com", 20, "Hello again"),
            email("c", "box@example.com", 30, "验证码：482913"),
        ];
        let config = LookupConfig::builder().per_mailbox_limit(2).build().unwrap();
        assert_eq!(lookup(&emails, "box@example.com", &config).code(), None);
    }

    #[test]
    fn test_find_code_empty_mailbox() {
        let result = lookup(&[], "box@example.com", &LookupConfig::default());
        assert_eq!(result, CodeLookup::NotFound { latest: None });
    }

    #[test]
    fn test_find_code_invalid_mailbox() {
        let result = find_code(
            &[],
            "not-an-address",
            &LookupConfig::default(),
            now(),
            &VerificationCodeExtractor::new(),
        );
        assert!(matches!(result, Err(Error::InvalidMailbox { .. })));
    }

    #[test]
    fn test_find_code_custom_matcher() {
        let emails = vec![email("a", "box@example.com", 10, "PIN: 42")];
        let matcher = RegexMatcher::new(r"PIN:\s*(\d+)").unwrap();
        let result = find_code(
            &emails,
            "box@example.com",
            &LookupConfig::default(),
            now(),
            &matcher,
        )
        .unwrap();
        assert_eq!(result.code(), Some("42"));
    }

    #[test]
    fn test_snippet_falls_back_to_html() {
        let mut mail = email("a", "box@example.com", 10, "");
        mail.html = Some("<p>Hello <b>there</b>&nbsp;</p>".into());
        assert_eq!(snippet(&mail).as_deref(), Some("Hello there&nbsp;"));

        mail.html = None;
        assert_eq!(snippet(&mail), None);
    }

    #[test]
    fn test_snippet_truncated() {
        let mail = email("a", "box@example.com", 10, &"x".repeat(500));
        assert_eq!(snippet(&mail).map(|s| s.chars().count()), Some(200));
    }

    #[test]
    fn test_search_codes_mixed() {
        let emails = vec![
            email("a", "one@example.com", 30, "验证码：482913"),
            email("b", "two@example.com", 30, "Welcome"),
        ];
        let query = SearchQuery::new(["one@example.com", "two@example.com", "broken"]);

        let report = search_codes(
            &emails,
            &query,
            &LookupConfig::default(),
            now(),
            &VerificationCodeExtractor::new(),
        )
        .unwrap();

        assert_eq!(
            report.summary,
            SearchSummary {
                total: 3,
                found: 1,
                not_found: 2
            }
        );
        assert_eq!(report.results[0].code.as_deref(), Some("482913"));
        assert_eq!(report.results[0].emails_checked, 1);
        assert_eq!(report.results[1].code, None);
        assert_eq!(report.results[1].error, None);
        assert!(report.results[2].error.is_some());
    }

    #[test]
    fn test_search_codes_filters() {
        let mut github = email("gh", "box@example.com", 20, "验证码：735102");
        github.from_address = "noreply@github.com".into();
        github.subject = Some("Verify your device".into());
        let emails = vec![email("svc", "box@example.com", 10, "验证码：482913"), github];

        let extractor = VerificationCodeExtractor::new();
        let config = LookupConfig::default();

        let query = SearchQuery::new(["box@example.com"]).sender("GitHub");
        let report = search_codes(&emails, &query, &config, now(), &extractor).unwrap();
        assert_eq!(report.results[0].code.as_deref(), Some("735102"));
        assert_eq!(report.results[0].emails_checked, 1);

        let query = SearchQuery::new(["box@example.com"]).subject("VERIFY");
        let report = search_codes(&emails, &query, &config, now(), &extractor).unwrap();
        assert_eq!(report.results[0].email.as_ref().map(|e| e.id.as_str()), Some("gh"));

        let query = SearchQuery::new(["box@example.com"]).sender("service");
        let report = search_codes(&emails, &query, &config, now(), &extractor).unwrap();
        assert_eq!(report.results[0].code.as_deref(), Some("482913"));
    }

    #[test]
    fn test_search_codes_requires_mailboxes() {
        let result = search_codes(
            &[],
            &SearchQuery::default(),
            &LookupConfig::default(),
            now(),
            &VerificationCodeExtractor::new(),
        );
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }
}
