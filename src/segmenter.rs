//! Message-to-block segmentation.
//!
//! The segmenter scans the ordered [`Message`] sequence once and groups media
//! attachments into [`Block`]s, applying one of the three interchangeable
//! policies from [`GroupingPolicy`]. The scan carries an explicit state value
//! — no block open, or one block open — with transitions per message kind, so
//! the edge cases are enumerable and testable in isolation.
//!
//! Segmentation is a pure function of `(messages, config)`: identical input
//! yields byte-identical blocks and alerts. No I/O happens here; anomalies
//! are recorded as data, never raised.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::Message;
use crate::alert::{Alert, AlertKind, AlertRecorder};
use crate::caption::CaptionClassifier;
use crate::config::{GroupingConfig, GroupingPolicy};
use crate::media::{DELETED_MESSAGE, MediaClassifier, MediaRef};
use crate::merge::merge_by_protocol;

/// One media attachment inside a block, in transcript order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Filename exactly as it appears in the attachment marker.
    pub filename: String,
    /// Timestamp of the carrying message; `None` is the no-date sentinel.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
}

/// A group of media attachments sharing an author/caption context.
///
/// Blocks are the unit handed to the placement stage: each maps to one
/// destination folder (or folder set). A block only ever reaches the output
/// sequence with at least one media item; caption-only chatter is discarded.
///
/// Media order is insertion order and is load-bearing — downstream renaming
/// reconstructs the original send order from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// First contributor. Later contributors never overwrite this; they land
    /// in [`extra_authors`](Self::extra_authors).
    pub author: String,

    /// Additional contributors recorded by the protocol-merge pass.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub extra_authors: Vec<String>,

    /// Timestamp of the message that opened the block.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub first_timestamp: Option<NaiveDateTime>,

    /// Timestamp of the latest contribution, updated monotonically.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub last_timestamp: Option<NaiveDateTime>,

    /// Ordered media attachments.
    pub media: Vec<MediaItem>,

    /// Distinct numeric caption tokens in first-occurrence order.
    ///
    /// Filled by the continuity and blank-line policies; validity is decided
    /// by the placement stage.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub captions: Vec<String>,

    /// The single validated protocol number (protocol-merge policy). When
    /// several protocols appear over a block's lifetime, the last one wins.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub protocol: Option<String>,

    /// Numeric tokens that failed protocol validation (protocol-merge
    /// policy). Retained for the isolation folder name and diagnostics.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub invalid_captions: Vec<String>,

    /// Caption-unrelated text fragments, for diagnostics.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub free_text: Vec<String>,
}

impl Block {
    /// Opens a block for the message's author at its timestamp.
    fn open(msg: &Message) -> Self {
        Self {
            author: msg.author.clone(),
            extra_authors: Vec::new(),
            first_timestamp: msg.timestamp,
            last_timestamp: msg.timestamp,
            media: Vec::new(),
            captions: Vec::new(),
            protocol: None,
            invalid_captions: Vec::new(),
            free_text: Vec::new(),
        }
    }

    fn push_media(&mut self, filename: String, timestamp: Option<NaiveDateTime>) {
        self.media.push(MediaItem {
            filename,
            timestamp,
        });
    }

    /// Records a caption token, collapsing duplicates while preserving
    /// first-occurrence order.
    fn push_caption(&mut self, token: String) {
        if !self.captions.contains(&token) {
            self.captions.push(token);
        }
    }

    fn push_invalid_caption(&mut self, token: String) {
        if !self.invalid_captions.contains(&token) {
            self.invalid_captions.push(token);
        }
    }

    fn touch(&mut self, timestamp: Option<NaiveDateTime>) {
        if timestamp.is_some() {
            self.last_timestamp = timestamp;
        }
    }

    /// Returns `true` if the block carries at least one attachment.
    pub fn has_media(&self) -> bool {
        !self.media.is_empty()
    }
}

/// Result of a segmentation run: the retained blocks plus every alert raised
/// along the way, both in transcript order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segmentation {
    /// Retained blocks; every one has non-empty media.
    pub blocks: Vec<Block>,
    /// Chronological alert sequence.
    pub alerts: Vec<Alert>,
}

/// The scan accumulator: either no block is open, or exactly one is.
enum ScanState {
    Idle,
    Open(Block),
}

impl ScanState {
    fn open_block(&mut self) -> Option<&mut Block> {
        match self {
            ScanState::Idle => None,
            ScanState::Open(block) => Some(block),
        }
    }

    /// Closes the open block, retaining it only when it carries media.
    fn close_into(&mut self, blocks: &mut Vec<Block>) {
        if let ScanState::Open(block) = std::mem::replace(self, ScanState::Idle) {
            if block.has_media() {
                blocks.push(block);
            }
        }
    }
}

/// Groups a message sequence into media blocks under a configured policy.
///
/// # Example
///
/// ```rust
/// use chatblock::{BlockSegmenter, TranscriptParser};
/// use chatblock::config::GroupingConfig;
///
/// let text = "\
/// 01/02/2025 10:00 - Ana: IMG-1.jpg (arquivo anexado)
/// 01/02/2025 10:01 - Ana: 2025010203";
///
/// let messages = TranscriptParser::new().parse_str(text);
/// let segmenter = BlockSegmenter::new(GroupingConfig::continuity());
/// let result = segmenter.segment(&messages);
///
/// assert_eq!(result.blocks.len(), 1);
/// assert_eq!(result.blocks[0].captions, ["2025010203"]);
/// ```
pub struct BlockSegmenter {
    config: GroupingConfig,
    media: MediaClassifier,
    captions: CaptionClassifier,
}

impl BlockSegmenter {
    /// Creates a segmenter for the given configuration.
    pub fn new(config: GroupingConfig) -> Self {
        Self {
            config,
            media: MediaClassifier::new(),
            captions: CaptionClassifier::new(),
        }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &GroupingConfig {
        &self.config
    }

    /// Runs the scan and, for the protocol-merge policy, the merge post-pass.
    pub fn segment(&self, messages: &[Message]) -> Segmentation {
        let mut recorder = AlertRecorder::new();
        let mut blocks = self.scan(messages, &mut recorder);

        if self.config.policy == GroupingPolicy::ProtocolMerge {
            blocks = merge_by_protocol(
                blocks,
                self.config.interval_alert_minutes,
                &mut recorder,
            );
        }

        Segmentation {
            blocks,
            alerts: recorder.into_alerts(),
        }
    }

    fn scan(&self, messages: &[Message], recorder: &mut AlertRecorder) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut state = ScanState::Idle;

        for msg in messages {
            // Retracted messages and author-less entries never reach
            // classification.
            if msg.content == DELETED_MESSAGE || msg.author.trim().is_empty() {
                continue;
            }

            let media = self.media.classify(&msg.content);

            // Rule 1: hidden media only alerts; the message contributes
            // nothing to any block.
            if media == Some(MediaRef::Hidden) {
                recorder.push(
                    AlertKind::HiddenMedia,
                    format!("Mídia oculta: {} - {}", msg.timestamp_label(), msg.author),
                );
                continue;
            }

            match self.config.policy {
                GroupingPolicy::Continuity => {
                    self.step_continuity(msg, media, &mut state, &mut blocks);
                }
                GroupingPolicy::BlankLine => {
                    self.step_blank_line(msg, media, &mut state, &mut blocks);
                }
                GroupingPolicy::ProtocolMerge => {
                    self.step_protocol_merge(msg, media, &mut state, &mut blocks, recorder);
                }
            }
        }

        state.close_into(&mut blocks);
        blocks
    }

    /// Continuity policy: only author changes and time gaps close blocks.
    fn step_continuity(
        &self,
        msg: &Message,
        media: Option<MediaRef>,
        state: &mut ScanState,
        blocks: &mut Vec<Block>,
    ) {
        if let Some(MediaRef::Attached(filename)) = media {
            let mut block = match std::mem::replace(state, ScanState::Idle) {
                ScanState::Open(block)
                    if block.author == msg.author
                        && self.within_tolerance(block.last_timestamp, msg.timestamp) =>
                {
                    block
                }
                ScanState::Open(closed) => {
                    if closed.has_media() {
                        blocks.push(closed);
                    }
                    Block::open(msg)
                }
                ScanState::Idle => Block::open(msg),
            };

            block.touch(msg.timestamp);
            block.push_media(filename, msg.timestamp);
            for line in &msg.continuation_lines {
                self.absorb_caption_fragment(&mut block, line);
            }
            *state = ScanState::Open(block);
            return;
        }

        // Plain text. Only the open block's author gets to caption it, and
        // only within the tolerance window; a larger gap closes the block
        // without opening a new one.
        if let Some(block) = state.open_block() {
            if block.author == msg.author {
                if self.within_tolerance(block.last_timestamp, msg.timestamp) {
                    self.absorb_caption_fragment(block, &msg.content);
                    for line in &msg.continuation_lines {
                        self.absorb_caption_fragment(block, line);
                    }
                    block.touch(msg.timestamp);
                } else {
                    state.close_into(blocks);
                }
            }
        }
    }

    /// Blank-line policy: the divider does the segmentation work; attached
    /// media simply lands in whatever block is open.
    fn step_blank_line(
        &self,
        msg: &Message,
        media: Option<MediaRef>,
        state: &mut ScanState,
        blocks: &mut Vec<Block>,
    ) {
        // Rule 2: an empty-content message unconditionally closes the open
        // block and opens a fresh one for that author.
        if msg.is_blank() {
            state.close_into(blocks);
            *state = ScanState::Open(Block::open(msg));
            return;
        }

        if let Some(MediaRef::Attached(filename)) = media {
            let mut block = match std::mem::replace(state, ScanState::Idle) {
                ScanState::Open(block) => block,
                ScanState::Idle => Block::open(msg),
            };

            block.touch(msg.timestamp);
            block.push_media(filename, msg.timestamp);
            for line in &msg.continuation_lines {
                self.absorb_caption_fragment(&mut block, line);
            }
            *state = ScanState::Open(block);
            return;
        }

        if let Some(block) = state.open_block() {
            if block.author == msg.author {
                if self.within_tolerance(block.last_timestamp, msg.timestamp) {
                    self.absorb_caption_fragment(block, &msg.content);
                    for line in &msg.continuation_lines {
                        self.absorb_caption_fragment(block, line);
                    }
                    block.touch(msg.timestamp);
                } else {
                    state.close_into(blocks);
                }
            }
        }
    }

    /// Protocol-merge policy: dividers and author changes segment; a single
    /// protocol number keys each block and the post-pass fuses equal keys.
    fn step_protocol_merge(
        &self,
        msg: &Message,
        media: Option<MediaRef>,
        state: &mut ScanState,
        blocks: &mut Vec<Block>,
        recorder: &mut AlertRecorder,
    ) {
        if msg.is_blank() {
            state.close_into(blocks);
            *state = ScanState::Open(Block::open(msg));
            return;
        }

        // Any author change closes the open block.
        let author_changed =
            matches!(&*state, ScanState::Open(block) if block.author != msg.author);
        if author_changed {
            state.close_into(blocks);
        }

        if let Some(MediaRef::Attached(filename)) = media {
            let mut block = match std::mem::replace(state, ScanState::Idle) {
                ScanState::Open(block) => block,
                ScanState::Idle => Block::open(msg),
            };

            // The continuation is performed regardless; a wide gap between
            // consecutive media in one block is informational only.
            if let Some(gap) = minutes_between(block.last_timestamp, msg.timestamp) {
                if gap > f64::from(self.config.interval_alert_minutes) {
                    let key = block.protocol.as_deref().unwrap_or("sem-os");
                    recorder.push(
                        AlertKind::LargeInterval,
                        format!(
                            "Bloco OS {} ({}): intervalo de {} entre mídias",
                            key,
                            block.author,
                            format_interval(gap)
                        ),
                    );
                }
            }

            block.touch(msg.timestamp);
            block.push_media(filename, msg.timestamp);
            for line in &msg.continuation_lines {
                self.absorb_protocol_fragment(&mut block, line);
            }
            *state = ScanState::Open(block);
            return;
        }

        match state {
            // Same author guaranteed here; no tolerance window under this
            // policy.
            ScanState::Open(block) => {
                self.absorb_protocol_fragment(block, &msg.content);
                for line in &msg.continuation_lines {
                    self.absorb_protocol_fragment(block, line);
                }
                block.touch(msg.timestamp);
            }
            // Forward reference: a collaborator announces the protocol
            // before any media arrives. Open a block speculatively; it is
            // discarded unless media follows.
            ScanState::Idle => {
                if let Some(protocol) = self.captions.find_protocol(&msg.content) {
                    let mut block = Block::open(msg);
                    block.protocol = Some(protocol);
                    *state = ScanState::Open(block);
                }
            }
        }
    }

    /// Token-set caption handling (continuity and blank-line policies): the
    /// leading digit run is the caption, the remainder is free text, and a
    /// fragment without digits is free text wholesale.
    fn absorb_caption_fragment(&self, block: &mut Block, text: &str) {
        let split = self.captions.split(text);
        match split.token {
            Some(token) => {
                block.push_caption(token);
                if !split.residual.is_empty() {
                    block.free_text.push(split.residual);
                }
            }
            None => {
                if !split.residual.is_empty() && !split.residual.contains(DELETED_MESSAGE) {
                    block.free_text.push(split.residual);
                }
            }
        }
    }

    /// Single-protocol caption handling (protocol-merge policy): a protocol
    /// anywhere in the fragment keys the block (last one wins); a leading
    /// digit run that is not a protocol is kept as an invalid caption.
    fn absorb_protocol_fragment(&self, block: &mut Block, text: &str) {
        if let Some(protocol) = self.captions.find_protocol(text) {
            block.protocol = Some(protocol);
        } else if let Some(token) = self.captions.leading_number(text) {
            if !self.captions.is_valid_protocol(&token) {
                block.push_invalid_caption(token);
            }
        }
    }

    /// Continuity gap check. A missing timestamp on either side counts as an
    /// infinite gap.
    fn within_tolerance(
        &self,
        last: Option<NaiveDateTime>,
        next: Option<NaiveDateTime>,
    ) -> bool {
        match minutes_between(last, next) {
            Some(gap) => gap <= f64::from(self.config.tolerance_minutes),
            None => false,
        }
    }
}

/// Absolute gap between two timestamps in minutes. `None` when either side
/// carries the no-date sentinel.
pub(crate) fn minutes_between(
    a: Option<NaiveDateTime>,
    b: Option<NaiveDateTime>,
) -> Option<f64> {
    let (a, b) = (a?, b?);
    let seconds = (b - a).num_seconds().abs();
    Some(seconds as f64 / 60.0)
}

/// Renders a gap the way alert messages expect: `45min` or `2h15min`.
pub(crate) fn format_interval(minutes: f64) -> String {
    let hours = (minutes / 60.0).floor() as i64;
    let mins = (minutes % 60.0).round() as i64;
    if hours > 0 {
        format!("{hours}h{mins}min")
    } else {
        format!("{mins}min")
    }
}
