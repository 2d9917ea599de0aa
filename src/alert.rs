//! Typed anomaly alerts and their collector.
//!
//! Every stage of the pipeline reports anomalies as data instead of failing:
//! hidden media, invalid caption tokens, suspicious time gaps, reused
//! folders. Alerts accumulate in an [`AlertRecorder`] threaded through the
//! segmenter and planner — never global state — so segmentation stays a pure
//! function and is re-entrant across transcripts.
//!
//! Ordering is chronological (transcript order) and the report stage consumes
//! it verbatim.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The anomaly taxonomy.
///
/// Codes are the stable identifiers the end-of-run report keys on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// A `Mídia oculta` marker: the attachment was not exported.
    HiddenMedia,
    /// A destination folder received files from more than one block.
    SharedFolder,
    /// One block carried several distinct valid protocol tokens.
    MultipleCaptions,
    /// Free text dropped from a block that already has a valid caption.
    IgnoredText,
    /// A numeric caption that is not a well-formed protocol number.
    InvalidProtocol,
    /// A merge or continuation spanned more than the configured interval.
    LargeInterval,
    /// A block closed without any protocol number (protocol-merge policy).
    MissingProtocol,
    /// A valid-protocol folder accumulated fewer photos than expected.
    FewPhotos,
}

impl AlertKind {
    /// Stable report code for this kind.
    pub fn code(self) -> &'static str {
        match self {
            AlertKind::HiddenMedia => "midia_oculta",
            AlertKind::SharedFolder => "pasta_unida",
            AlertKind::MultipleCaptions => "multiplas_legendas",
            AlertKind::IgnoredText => "texto_ignorado",
            AlertKind::InvalidProtocol => "protocolo_invalido",
            AlertKind::LargeInterval => "intervalo_grande",
            AlertKind::MissingProtocol => "sem_os",
            AlertKind::FewPhotos => "poucas_fotos",
        }
    }

    /// Icon the report stage prints next to this kind.
    pub fn icon(self) -> &'static str {
        match self {
            AlertKind::HiddenMedia => "⚠️",
            AlertKind::SharedFolder => "📁",
            AlertKind::MultipleCaptions => "📂",
            AlertKind::IgnoredText => "ℹ️",
            AlertKind::InvalidProtocol => "🔢",
            AlertKind::LargeInterval => "⏰",
            AlertKind::MissingProtocol => "❓",
            AlertKind::FewPhotos => "📷",
        }
    }
}

/// One diagnostic produced during segmentation or placement planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Anomaly category.
    pub kind: AlertKind,
    /// Human-readable description, already formatted for the report.
    pub message: String,
}

impl Alert {
    /// Creates a new alert.
    pub fn new(kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.icon(), self.message)
    }
}

/// Ordered, append-only sink of alerts.
///
/// # Example
///
/// ```rust
/// use chatblock::{AlertKind, AlertRecorder};
///
/// let mut recorder = AlertRecorder::new();
/// recorder.push(AlertKind::HiddenMedia, "Mídia oculta: 01/02/2025 10:30 - Ana");
/// assert_eq!(recorder.alerts().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecorder {
    alerts: Vec<Alert>,
}

impl AlertRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one alert.
    pub fn push(&mut self, kind: AlertKind, message: impl Into<String>) {
        self.alerts.push(Alert::new(kind, message));
    }

    /// All alerts recorded so far, in insertion order.
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// Number of alerts of a given kind.
    pub fn count(&self, kind: AlertKind) -> usize {
        self.alerts.iter().filter(|a| a.kind == kind).count()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Consumes the recorder, yielding the alert sequence.
    pub fn into_alerts(self) -> Vec<Alert> {
        self.alerts
    }
}
