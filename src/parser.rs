//! MIME front end: raw message bytes to the fields the extractor consumes.
//!
//! # Example
//!
//! ```
//! use otp_extract::{extract_verification_code, parse_email};
//!
//! let raw = b"From: Service <noreply@service.test>\r\n\
//!             Subject: Sign in\r\n\
//!             \r\n\
//!             Your verification code is: 789012";
//!
//! let email = parse_email(raw).unwrap();
//! assert_eq!(email.subject.as_deref(), Some("Sign in"));
//! assert_eq!(
//!     extract_verification_code(email.text.as_deref(), email.html.as_deref()).as_deref(),
//!     Some("789012")
//! );
//! ```

use crate::error::{Error, Result};
use crate::message::{MessageBody, StoredEmail};
use chrono::{DateTime, Utc};
use mailparse::{DispositionType, MailHeaderMap, ParsedMail};
use tracing::{debug, warn};

/// The parts of an inbound message the service keeps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEmail {
    /// Sender address from the `From` header.
    pub from_address: Option<String>,
    /// Sender display name from the `From` header.
    pub from_name: Option<String>,
    /// Decoded subject line.
    pub subject: Option<String>,
    /// First non-empty `text/plain` part.
    pub text: Option<String>,
    /// First non-empty `text/html` part.
    pub html: Option<String>,
    /// `Message-ID` header value.
    pub message_id: Option<String>,
    /// `Date` header, when it parses.
    pub date: Option<DateTime<Utc>>,
}

impl ParsedEmail {
    /// Borrowed body view for extraction.
    #[must_use]
    pub fn body(&self) -> MessageBody<'_> {
        MessageBody::new(self.text.as_deref(), self.html.as_deref())
    }

    /// Turns the parsed message into a store record.
    ///
    /// The mailbox is lower-cased. When the `From` header carried no usable
    /// address, the SMTP envelope sender is used instead.
    #[must_use]
    pub fn into_stored(
        self,
        id: impl Into<String>,
        mailbox: &str,
        envelope_from: &str,
        received_at: DateTime<Utc>,
    ) -> StoredEmail {
        StoredEmail {
            id: id.into(),
            mailbox: mailbox.to_lowercase(),
            from_address: self
                .from_address
                .unwrap_or_else(|| envelope_from.to_owned()),
            from_name: self.from_name,
            subject: self.subject,
            text: self.text,
            html: self.html,
            received_at,
        }
    }
}

/// Parses raw RFC 5322 bytes.
///
/// Parts that fail to decode are logged and skipped; only a structurally
/// broken message is an error.
///
/// # Errors
///
/// Returns [`Error::ParseEmail`] if the message cannot be parsed at all.
pub fn parse_email(raw: &[u8]) -> Result<ParsedEmail> {
    let parsed = mailparse::parse_mail(raw).map_err(|source| Error::ParseEmail { source })?;

    let (from_address, from_name) = parsed
        .headers
        .get_first_value("From")
        .map(|value| parse_from(&value))
        .unwrap_or_default();

    let mut email = ParsedEmail {
        from_address,
        from_name,
        subject: non_empty(parsed.headers.get_first_value("Subject")),
        message_id: non_empty(parsed.headers.get_first_value("Message-ID")),
        date: parsed
            .headers
            .get_first_value("Date")
            .and_then(|value| mailparse::dateparse(&value).ok())
            .and_then(|ts| DateTime::from_timestamp(ts, 0)),
        ..ParsedEmail::default()
    };

    collect_bodies(&parsed, &mut email);

    debug!(
        has_text = email.text.is_some(),
        has_html = email.html.is_some(),
        "Parsed email"
    );

    Ok(email)
}

/// Walks the MIME tree depth-first, keeping the first text and HTML leaves.
fn collect_bodies(part: &ParsedMail<'_>, email: &mut ParsedEmail) {
    if !part.subparts.is_empty() {
        for sub in &part.subparts {
            collect_bodies(sub, email);
        }
        return;
    }

    if part.get_content_disposition().disposition == DispositionType::Attachment {
        return;
    }

    let slot = match part.ctype.mimetype.to_ascii_lowercase().as_str() {
        "text/plain" => &mut email.text,
        "text/html" => &mut email.html,
        _ => return,
    };

    if slot.is_some() {
        return;
    }

    match part.get_body() {
        Ok(body) if !body.trim().is_empty() => *slot = Some(body),
        Ok(_) => {}
        Err(e) => warn!(
            mimetype = %part.ctype.mimetype,
            error = %e,
            "Failed to decode body part, skipping"
        ),
    }
}

/// Splits a `From` value into address and display name.
fn parse_from(value: &str) -> (Option<String>, Option<String>) {
    match mailparse::addrparse(value)
        .ok()
        .and_then(|list| list.extract_single_info())
    {
        Some(info) => (non_empty(Some(info.addr)), non_empty(info.display_name)),
        None => (non_empty(Some(value.trim().to_owned())), None),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
