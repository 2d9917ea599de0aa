//! Caption token extraction and protocol validation.
//!
//! Captions identify which destination a block of media belongs to. A caption
//! token is the maximal run of decimal digits anchored at the start of the
//! trimmed fragment; whatever follows is residual free text. A token is a
//! valid protocol number iff it is exactly 10 digits and begins with `2025`
//! or `2026`.
//!
//! Tokens failing validation are never silently dropped — the placement stage
//! routes their media into an isolation folder and raises an alert.

use regex::Regex;

/// Protocol grammar: 10 digits beginning with 2025 or 2026.
const PROTOCOL_PATTERN: &str = r"^202[56]\d{6}$";

/// Protocol mentioned anywhere in free text (word-bounded). Used by the
/// protocol-merge policy, where a collaborator may quote the protocol inside
/// a longer sentence.
const PROTOCOL_ANYWHERE_PATTERN: &str = r"\b(202[56]\d{6})\b";

/// A caption split into its leading numeric token and residual text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionSplit {
    /// Leading digit run, if the fragment starts with one.
    pub token: Option<String>,
    /// Remainder after the digits, trimmed. Empty when the fragment was
    /// purely numeric.
    pub residual: String,
}

/// Classifier for caption tokens and protocol numbers.
///
/// # Example
///
/// ```rust
/// use chatblock::CaptionClassifier;
///
/// let captions = CaptionClassifier::new();
/// assert!(captions.is_valid_protocol("2025010203"));
/// assert!(!captions.is_valid_protocol("2024010203"));
/// assert!(!captions.is_valid_protocol("12345"));
///
/// let split = captions.split("100 quadro");
/// assert_eq!(split.token.as_deref(), Some("100"));
/// assert_eq!(split.residual, "quadro");
/// ```
pub struct CaptionClassifier {
    protocol: Regex,
    protocol_anywhere: Regex,
}

impl CaptionClassifier {
    /// Creates a new classifier. Regexes are compiled once here.
    pub fn new() -> Self {
        Self {
            // Patterns are literals; they cannot fail to compile.
            protocol: Regex::new(PROTOCOL_PATTERN).unwrap(),
            protocol_anywhere: Regex::new(PROTOCOL_ANYWHERE_PATTERN).unwrap(),
        }
    }

    /// Extracts the leading digit run of the trimmed fragment, if any.
    ///
    /// Digits elsewhere in the text are not captions.
    pub fn leading_number(&self, text: &str) -> Option<String> {
        let trimmed = text.trim();
        let digits: String = trimmed.chars().take_while(char::is_ascii_digit).collect();
        if digits.is_empty() { None } else { Some(digits) }
    }

    /// Splits a fragment into its leading numeric token and residual text.
    pub fn split(&self, text: &str) -> CaptionSplit {
        let trimmed = text.trim();
        match self.leading_number(trimmed) {
            Some(token) => {
                let residual = trimmed[token.len()..].trim().to_string();
                CaptionSplit {
                    token: Some(token),
                    residual,
                }
            }
            None => CaptionSplit {
                token: None,
                residual: trimmed.to_string(),
            },
        }
    }

    /// Returns `true` iff the token is a well-formed protocol number.
    pub fn is_valid_protocol(&self, token: &str) -> bool {
        self.protocol.is_match(token)
    }

    /// Finds a protocol number anywhere in the fragment.
    ///
    /// Unlike [`leading_number`](Self::leading_number) this is not anchored;
    /// the protocol-merge policy accepts a protocol quoted mid-sentence.
    pub fn find_protocol(&self, text: &str) -> Option<String> {
        self.protocol_anywhere
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

impl Default for CaptionClassifier {
    fn default() -> Self {
        Self::new()
    }
}
