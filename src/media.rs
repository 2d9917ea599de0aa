//! Media classification for message contents.
//!
//! Decides whether a message references an attached file, a hidden
//! (non-exported) attachment, or no media at all.
//!
//! The attachment marker carries a filename with an accepted media extension
//! followed by the `(arquivo anexado)` phrase, optionally preceded by the
//! left-to-right mark WhatsApp sprinkles into exports. The hidden marker is
//! the `Mídia oculta` phrase with no recoverable filename.

use regex::Regex;

/// Filename-bearing attachment marker. Case-insensitive; the leading
/// `\u{200E}` is the LRM character present in some exports.
const ATTACHMENT_PATTERN: &str = r"(?i)\u{200E}?(.+\.(jpg|jpeg|png|mp4))\s*\(arquivo anexado\)";

/// Exact system text for a retracted message.
pub const DELETED_MESSAGE: &str = "Mensagem apagada";

/// Result of classifying a message's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRef {
    /// An exported attachment; carries the filename verbatim.
    Attached(String),
    /// A `Mídia oculta` marker — the file was not exported.
    Hidden,
}

/// Classifier for attachment and hidden-media markers.
///
/// # Example
///
/// ```rust
/// use chatblock::{MediaClassifier, MediaRef};
///
/// let classifier = MediaClassifier::new();
/// let media = classifier.classify("IMG-0001.jpg (arquivo anexado)");
/// assert_eq!(media, Some(MediaRef::Attached("IMG-0001.jpg".to_string())));
/// ```
pub struct MediaClassifier {
    attachment: Regex,
}

impl MediaClassifier {
    /// Creates a new classifier. The marker regex is compiled once here.
    pub fn new() -> Self {
        Self {
            // The pattern is a literal; it cannot fail to compile.
            attachment: Regex::new(ATTACHMENT_PATTERN).unwrap(),
        }
    }

    /// Classifies a message's content.
    ///
    /// Returns `None` for ordinary text. The attachment check runs first, so
    /// a line carrying both a filename marker and stray text still classifies
    /// as attached.
    pub fn classify(&self, content: &str) -> Option<MediaRef> {
        if let Some(caps) = self.attachment.captures(content) {
            let filename = caps.get(1).map_or("", |m| m.as_str()).trim();
            return Some(MediaRef::Attached(filename.to_string()));
        }

        if content.contains("Mídia oculta") {
            return Some(MediaRef::Hidden);
        }

        None
    }
}

impl Default for MediaClassifier {
    fn default() -> Self {
        Self::new()
    }
}
