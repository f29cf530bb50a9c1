//! Configuration for extraction and mailbox lookups.
//!
//! Both configurations have sensible defaults and a builder that validates:
//!
//! ```
//! use otp_extract::{ExtractorConfig, LookupConfig};
//! use std::time::Duration;
//!
//! let extractor = ExtractorConfig::builder()
//!     .max_content_chars(16 * 1024)
//!     .build()
//!     .expect("valid config");
//!
//! let lookup = LookupConfig::builder()
//!     .window(Duration::from_secs(300))
//!     .build()
//!     .expect("valid config");
//! # let _ = (extractor, lookup);
//! ```

use crate::error::{Error, Result};
use std::time::Duration;

/// Default number of characters of a body considered per call.
pub const DEFAULT_MAX_CONTENT_CHARS: usize = 64 * 1024;

/// Upper bound for [`LookupConfig::window`] (one day).
pub const MAX_LOOKUP_WINDOW: Duration = Duration::from_secs(86_400);

/// Configuration for [`VerificationCodeExtractor`](crate::VerificationCodeExtractor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// Text and HTML bodies are truncated to this many characters before matching.
    pub max_content_chars: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_content_chars: DEFAULT_MAX_CONTENT_CHARS,
        }
    }
}

impl ExtractorConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ExtractorConfigBuilder {
        ExtractorConfigBuilder::default()
    }
}

/// Builder for [`ExtractorConfig`].
#[derive(Debug, Default)]
pub struct ExtractorConfigBuilder {
    max_content_chars: Option<usize>,
}

impl ExtractorConfigBuilder {
    /// Sets how many characters of each body are inspected.
    #[must_use]
    pub fn max_content_chars(mut self, max: usize) -> Self {
        self.max_content_chars = Some(max);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the content limit is zero.
    pub fn build(self) -> Result<ExtractorConfig> {
        let max_content_chars = self
            .max_content_chars
            .unwrap_or(DEFAULT_MAX_CONTENT_CHARS);

        if max_content_chars == 0 {
            return Err(Error::InvalidConfig {
                message: "max_content_chars must be > 0".into(),
            });
        }

        Ok(ExtractorConfig { max_content_chars })
    }
}

/// Configuration for mailbox lookups (see [`lookup`](crate::lookup)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupConfig {
    /// Only emails received within this window before "now" are inspected.
    pub window: Duration,
    /// Maximum number of recent emails inspected by a single-mailbox lookup.
    pub per_mailbox_limit: usize,
    /// Maximum number of recent emails inspected per mailbox in a batch search.
    pub batch_limit: usize,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(600), // 10 minutes
            per_mailbox_limit: 10,
            batch_limit: 20,
        }
    }
}

impl LookupConfig {
    /// Creates a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use otp_extract::LookupConfig;
    ///
    /// let config = LookupConfig::builder()
    ///     .window_secs(120)
    ///     .per_mailbox_limit(5)
    ///     .build()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.window.as_secs(), 120);
    /// ```
    #[must_use]
    pub fn builder() -> LookupConfigBuilder {
        LookupConfigBuilder::default()
    }
}

/// Builder for [`LookupConfig`].
#[derive(Debug, Default)]
pub struct LookupConfigBuilder {
    window: Option<Duration>,
    per_mailbox_limit: Option<usize>,
    batch_limit: Option<usize>,
}

impl LookupConfigBuilder {
    /// Sets the lookup window.
    #[must_use]
    pub fn window(mut self, window: Duration) -> Self {
        self.window = Some(window);
        self
    }

    /// Sets the lookup window in seconds.
    #[must_use]
    pub fn window_secs(self, seconds: u64) -> Self {
        self.window(Duration::from_secs(seconds))
    }

    /// Sets how many recent emails a single-mailbox lookup inspects.
    #[must_use]
    pub fn per_mailbox_limit(mut self, limit: usize) -> Self {
        self.per_mailbox_limit = Some(limit);
        self
    }

    /// Sets how many recent emails per mailbox a batch search inspects.
    #[must_use]
    pub fn batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = Some(limit);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the window exceeds
    /// [`MAX_LOOKUP_WINDOW`] or a limit is zero.
    pub fn build(self) -> Result<LookupConfig> {
        let defaults = LookupConfig::default();
        let window = self.window.unwrap_or(defaults.window);
        let per_mailbox_limit = self.per_mailbox_limit.unwrap_or(defaults.per_mailbox_limit);
        let batch_limit = self.batch_limit.unwrap_or(defaults.batch_limit);

        if window > MAX_LOOKUP_WINDOW {
            return Err(Error::InvalidConfig {
                message: format!(
                    "window must be at most {} seconds, got {}",
                    MAX_LOOKUP_WINDOW.as_secs(),
                    window.as_secs()
                ),
            });
        }

        if per_mailbox_limit == 0 || batch_limit == 0 {
            return Err(Error::InvalidConfig {
                message: "email limits must be > 0".into(),
            });
        }

        Ok(LookupConfig {
            window,
            per_mailbox_limit,
            batch_limit,
        })
    }
}
