//! WhatsApp TXT transcript parser.
//!
//! Turns the raw export text into an ordered [`Message`] sequence. A line
//! opens a new message only when it matches the header grammar:
//!
//! ```text
//! DD/MM/YYYY HH:MM - Author: Content
//! ```
//!
//! Any non-matching, non-blank line is attached to the currently open message
//! as a continuation line; with no message open yet it is dropped. The parser
//! performs no chronological validation — out-of-order timestamps pass
//! through as-is, and the grouping stage decides what they imply.

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::Message;
use crate::error::Result;

/// Header grammar for one transcript entry.
///
/// Date and time are fixed-width; the author is any text up to the first
/// colon; the content is the remainder and may be empty.
const HEADER_PATTERN: &str = r"^(\d{2})/(\d{2})/(\d{4})\s+(\d{2}):(\d{2})\s+-\s+([^:]+):\s*(.*)$";

/// Parser for WhatsApp TXT exports in the `DD/MM/YYYY HH:MM` format.
///
/// # Example
///
/// ```rust
/// use chatblock::TranscriptParser;
///
/// let parser = TranscriptParser::new();
/// let messages = parser.parse_str("01/02/2025 10:30 - Ana: bom dia");
/// assert_eq!(messages.len(), 1);
/// assert_eq!(messages[0].author(), "Ana");
/// ```
pub struct TranscriptParser {
    header: Regex,
}

impl TranscriptParser {
    /// Creates a new parser. The header regex is compiled once here.
    pub fn new() -> Self {
        Self {
            // The pattern is a literal; it cannot fail to compile.
            header: Regex::new(HEADER_PATTERN).unwrap(),
        }
    }

    /// Reads and parses a transcript file.
    pub fn parse(&self, path: &Path) -> Result<Vec<Message>> {
        let content = fs::read_to_string(path)?;
        Ok(self.parse_str(&content))
    }

    /// Parses transcript text into an ordered message sequence.
    ///
    /// This never fails: lines that fit nowhere are dropped, and unparseable
    /// dates become the no-date sentinel (`timestamp = None`).
    pub fn parse_str(&self, content: &str) -> Vec<Message> {
        let mut messages: Vec<Message> = Vec::new();
        let mut current: Option<Message> = None;

        for line in content.lines() {
            if let Some(caps) = self.header.captures(line) {
                if let Some(open) = current.take() {
                    messages.push(open);
                }

                let author = caps.get(6).map_or("", |m| m.as_str()).trim();
                let msg_content = caps.get(7).map_or("", |m| m.as_str()).trim();

                let timestamp = build_timestamp(
                    caps.get(3).map_or("", |m| m.as_str()),
                    caps.get(2).map_or("", |m| m.as_str()),
                    caps.get(1).map_or("", |m| m.as_str()),
                    caps.get(4).map_or("", |m| m.as_str()),
                    caps.get(5).map_or("", |m| m.as_str()),
                );

                let mut msg = Message::new(author, msg_content);
                msg.timestamp = timestamp;
                current = Some(msg);
            } else if !line.trim().is_empty() {
                // Continuation of the open message; orphan lines are dropped.
                if let Some(open) = current.as_mut() {
                    open.continuation_lines.push(line.trim().to_string());
                }
            }
        }

        if let Some(open) = current {
            messages.push(open);
        }

        messages
    }
}

impl Default for TranscriptParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a timestamp from the captured calendar fields.
///
/// Impossible dates (31/02, hour 25, ...) collapse to `None` rather than
/// rolling over.
fn build_timestamp(
    year: &str,
    month: &str,
    day: &str,
    hour: &str,
    minute: &str,
) -> Option<NaiveDateTime> {
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
}
