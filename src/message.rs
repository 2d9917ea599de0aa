//! Transcript message type.
//!
//! This module provides [`Message`], one logical entry of a WhatsApp chat
//! export. The transcript parser produces these; the block segmenter consumes
//! them.
//!
//! A message is created from a line matching the header grammar
//! (`DD/MM/YYYY HH:MM - Author: Content`). Trailing lines that match no header
//! are appended as continuation lines until the next header or end of input.
//!
//! # Examples
//!
//! ```
//! use chatblock::Message;
//! use chrono::NaiveDate;
//!
//! let ts = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap().and_hms_opt(10, 30, 0).unwrap();
//! let msg = Message::new("Ana", "2025010203 quadro").with_timestamp(ts);
//!
//! assert_eq!(msg.author(), "Ana");
//! assert!(msg.timestamp().is_some());
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One logical transcript entry.
///
/// # Fields
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | `author` | `String` | Raw sender label, not yet sanitized for filesystem use |
/// | `content` | `String` | Text on the header line after the author |
/// | `timestamp` | `Option<NaiveDateTime>` | Header date-time; `None` is the "no-date" sentinel |
/// | `continuation_lines` | `Vec<String>` | Trailing non-header lines belonging to this message |
///
/// Timestamps are local calendar fields taken verbatim from the transcript;
/// no timezone conversion is performed. An unparseable or impossible date
/// (e.g. 31/02) collapses to `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Raw sender label.
    pub author: String,

    /// Text content on the header line.
    ///
    /// For attachment messages this is the attachment marker, e.g.
    /// `IMG-0001.jpg (arquivo anexado)`.
    pub content: String,

    /// When the message was sent, if the header date parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,

    /// Trailing unmatched lines attached to this message, in transcript order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub continuation_lines: Vec<String>,
}

impl Message {
    /// Creates a new message with only author and content.
    ///
    /// # Example
    ///
    /// ```rust
    /// use chatblock::Message;
    ///
    /// let msg = Message::new("Ana", "bom dia");
    /// assert_eq!(msg.author(), "Ana");
    /// assert!(msg.timestamp().is_none());
    /// ```
    pub fn new(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            content: content.into(),
            timestamp: None,
            continuation_lines: Vec::new(),
        }
    }

    /// Builder method to set the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, ts: NaiveDateTime) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// Builder method to append a continuation line.
    #[must_use]
    pub fn with_continuation(mut self, line: impl Into<String>) -> Self {
        self.continuation_lines.push(line.into());
        self
    }

    /// Returns the author label.
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Returns the header-line content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the timestamp, if the header date parsed.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamp
    }

    /// Returns the continuation lines in transcript order.
    pub fn continuation_lines(&self) -> &[String] {
        &self.continuation_lines
    }

    /// Returns `true` if the content is empty or whitespace-only.
    ///
    /// Under the blank-line grouping policies such a message acts as an
    /// explicit block divider.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Timestamp rendered the way alert messages reference it.
    ///
    /// `01/02/2025 10:30` for a parsed date, `sem-data` otherwise.
    pub fn timestamp_label(&self) -> String {
        match self.timestamp {
            Some(ts) => ts.format("%d/%m/%Y %H:%M").to_string(),
            None => "sem-data".to_string(),
        }
    }
}
