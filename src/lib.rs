//! # Chatblock
//!
//! A Rust library for segmenting WhatsApp transcript exports into media
//! blocks and planning their destination folders.
//!
//! ## Overview
//!
//! Field teams send batches of photos and videos over WhatsApp, captioned
//! with a 10-digit protocol number. Chatblock parses the exported `.txt`
//! transcript, groups consecutive attachments into [`Block`]s under one of
//! three grouping policies, and plans where each file belongs:
//!
//! - **Continuity** — media from the same author within a tolerance window
//!   stays together; time or author gaps split blocks.
//! - **Blank-line** — an empty message is an explicit divider between blocks.
//! - **Protocol-merge** — divider-delimited blocks keyed by protocol number,
//!   with same-protocol blocks fused across time and authors.
//!
//! Segmentation is a pure function: no I/O, no global state, and anomalies
//! (hidden media, invalid captions, suspicious gaps) come back as a typed
//! [`Alert`] sequence instead of failures.
//!
//! ## Quick Start
//!
//! ```rust
//! use chatblock::prelude::*;
//!
//! let text = "\
//! 01/02/2025 10:00 - Ana: IMG-20250201-WA0001.jpg (arquivo anexado)
//! 01/02/2025 10:01 - Ana: 2025010203";
//!
//! let messages = TranscriptParser::new().parse_str(text);
//! let segmenter = BlockSegmenter::new(GroupingConfig::continuity());
//! let result = segmenter.segment(&messages);
//!
//! assert_eq!(result.blocks.len(), 1);
//! assert_eq!(result.blocks[0].captions, ["2025010203"]);
//!
//! let planner = PlacementPlanner::new(PlacementConfig::default());
//! let plan = planner.plan(&result.blocks, GroupingPolicy::Continuity);
//! assert_eq!(plan.tasks[0].dest_dir.to_str(), Some("2025010203"));
//! ```
//!
//! ## Module Structure
//!
//! - [`parser`] — transcript text to [`Message`] sequence
//! - [`media`] — attachment / hidden-media classification
//! - [`caption`] — caption token extraction and protocol validation
//! - [`segmenter`] — the policy-parameterized [`BlockSegmenter`]
//! - [`merge`] — protocol-keyed block fusion post-pass
//! - [`placement`] — destination planning ([`PlacementPlanner`])
//! - [`alert`] — the anomaly taxonomy and [`AlertRecorder`]
//! - [`config`] — [`GroupingConfig`] and [`PlacementConfig`]
//! - [`error`] — [`ChatblockError`] and the crate [`Result`]
//! - [`prelude`] — convenient re-exports

pub mod alert;
pub mod caption;
pub mod config;
pub mod error;
pub mod media;
pub mod merge;
pub mod message;
pub mod parser;
pub mod placement;
pub mod segmenter;

// Re-export the main types at the crate root for convenience
pub use alert::{Alert, AlertKind, AlertRecorder};
pub use caption::{CaptionClassifier, CaptionSplit};
pub use config::{GroupingConfig, GroupingPolicy, PlacementConfig};
pub use error::{ChatblockError, Result};
pub use media::{MediaClassifier, MediaRef};
pub use message::Message;
pub use parser::TranscriptParser;
pub use placement::{CopyTask, PlacementPlan, PlacementPlanner};
pub use segmenter::{Block, BlockSegmenter, MediaItem, Segmentation};

/// Convenient re-exports for common usage.
///
/// Import everything you need with a single line:
///
/// ```rust
/// use chatblock::prelude::*;
/// ```
pub mod prelude {
    // Pipeline stages
    pub use crate::parser::TranscriptParser;
    pub use crate::placement::{CopyTask, PlacementPlan, PlacementPlanner};
    pub use crate::segmenter::{Block, BlockSegmenter, MediaItem, Segmentation};

    // Data model
    pub use crate::Message;
    pub use crate::alert::{Alert, AlertKind, AlertRecorder};

    // Configuration
    pub use crate::config::{GroupingConfig, GroupingPolicy, PlacementConfig};

    // Error types
    pub use crate::error::{ChatblockError, Result};
}
