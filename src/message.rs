//! Message values handed to the extractor and the lookup.

use chrono::{DateTime, Utc};

/// Borrowed view of a message body: the parsed plain-text and HTML parts.
///
/// Either part may be absent; extraction needs at least one non-empty part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageBody<'a> {
    /// Plain-text body.
    pub text: Option<&'a str>,
    /// HTML body.
    pub html: Option<&'a str>,
}

impl<'a> MessageBody<'a> {
    /// Creates a body view from optional text and HTML parts.
    #[must_use]
    pub fn new(text: Option<&'a str>, html: Option<&'a str>) -> Self {
        Self { text, html }
    }

    /// Body with only a plain-text part.
    #[must_use]
    pub fn text(text: &'a str) -> Self {
        Self::new(Some(text), None)
    }

    /// Body with only an HTML part.
    #[must_use]
    pub fn html(html: &'a str) -> Self {
        Self::new(None, Some(html))
    }

    /// Whether both parts are absent or empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.map_or(true, str::is_empty) && self.html.map_or(true, str::is_empty)
    }
}

/// An email as kept by the mailbox store, handed to [`lookup`](crate::lookup).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEmail {
    /// Store identifier.
    pub id: String,
    /// Recipient mailbox address.
    pub mailbox: String,
    /// Sender address.
    pub from_address: String,
    /// Sender display name.
    pub from_name: Option<String>,
    /// Subject line.
    pub subject: Option<String>,
    /// Plain-text body.
    pub text: Option<String>,
    /// HTML body.
    pub html: Option<String>,
    /// When the message was stored.
    pub received_at: DateTime<Utc>,
}

impl StoredEmail {
    /// Borrowed body view for extraction.
    #[must_use]
    pub fn body(&self) -> MessageBody<'_> {
        MessageBody::new(self.text.as_deref(), self.html.as_deref())
    }
}
