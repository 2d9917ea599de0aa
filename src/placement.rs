//! Destination planning for segmented blocks.
//!
//! The planner maps a closed [`Block`] sequence to an ordered list of copy
//! tasks with relative destination paths, plus the alerts the placement
//! decisions raise. It performs no filesystem work; the caller executes the
//! plan (or renders it for a dry run) against whatever output root it owns.
//!
//! Two flavors exist, keyed by the grouping policy that produced the blocks:
//!
//! - **Token-set** (continuity and blank-line policies): a block carries zero
//!   or more caption tokens; exactly one valid protocol gives the ideal
//!   dedicated folder, several fan out into per-token subfolders, anything
//!   else lands in the isolation folder.
//! - **Single-protocol** (protocol-merge policy): a block carries at most one
//!   validated protocol; blocks without one go to the isolation folder with a
//!   `sem_os` alert.
//!
//! Planning is deterministic for the same block sequence and configuration.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use deunicode::deunicode;

use crate::alert::{Alert, AlertKind, AlertRecorder};
use crate::caption::CaptionClassifier;
use crate::config::{GroupingPolicy, PlacementConfig};
use crate::segmenter::Block;

/// Extensions counted as photos by the minimum-count check.
const PHOTO_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Maximum length of a caption-derived filename slug.
const SLUG_MAX_CHARS: usize = 50;

/// One planned copy: which source file goes where, under what name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyTask {
    /// Source filename exactly as it appeared in the transcript.
    pub source: String,
    /// Destination directory, relative to the caller's output root.
    pub dest_dir: PathBuf,
    /// Final filename inside `dest_dir`.
    pub dest_name: String,
}

/// The full plan for a block sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementPlan {
    /// Copy tasks in block order, preserving each block's media order.
    pub tasks: Vec<CopyTask>,
    /// Empty marker directories to create (one per token in a
    /// multiple-caption block).
    pub extra_dirs: Vec<PathBuf>,
    /// Alerts raised by placement decisions, in block order.
    pub alerts: Vec<Alert>,
}

/// Maps blocks to destination paths and file names.
///
/// # Example
///
/// ```rust
/// use chatblock::{BlockSegmenter, PlacementPlanner, TranscriptParser};
/// use chatblock::config::{GroupingConfig, PlacementConfig};
///
/// let text = "\
/// 01/02/2025 10:00 - Ana: IMG-1.jpg (arquivo anexado)
/// 01/02/2025 10:01 - Ana: 2025010203";
///
/// let messages = TranscriptParser::new().parse_str(text);
/// let result = BlockSegmenter::new(GroupingConfig::continuity()).segment(&messages);
///
/// let planner = PlacementPlanner::new(PlacementConfig::default());
/// let plan = planner.plan(&result.blocks, chatblock::config::GroupingPolicy::Continuity);
///
/// assert_eq!(plan.tasks[0].dest_dir.to_str(), Some("2025010203"));
/// ```
pub struct PlacementPlanner {
    config: PlacementConfig,
    captions: CaptionClassifier,
}

impl PlacementPlanner {
    /// Creates a planner for the given configuration.
    pub fn new(config: PlacementConfig) -> Self {
        Self {
            config,
            captions: CaptionClassifier::new(),
        }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Plans destinations for the block sequence produced under `policy`.
    pub fn plan(&self, blocks: &[Block], policy: GroupingPolicy) -> PlacementPlan {
        let mut recorder = AlertRecorder::new();
        let mut tasks = Vec::new();
        let mut extra_dirs = Vec::new();
        // Protocol folders already claimed by an earlier block.
        let mut used_folders: Vec<String> = Vec::new();
        // Photo tally per valid-protocol folder, in first-use order.
        let mut photos_per_protocol: Vec<(String, usize)> = Vec::new();

        for block in blocks {
            match policy {
                GroupingPolicy::Continuity | GroupingPolicy::BlankLine => {
                    self.plan_token_set_block(
                        block,
                        &mut tasks,
                        &mut extra_dirs,
                        &mut used_folders,
                        &mut photos_per_protocol,
                        &mut recorder,
                    );
                }
                GroupingPolicy::ProtocolMerge => {
                    self.plan_single_protocol_block(
                        block,
                        &mut tasks,
                        &mut used_folders,
                        &mut photos_per_protocol,
                        &mut recorder,
                    );
                }
            }
        }

        for (protocol, count) in &photos_per_protocol {
            if *count < self.config.min_photos_per_protocol {
                recorder.push(
                    AlertKind::FewPhotos,
                    format!(
                        "Pasta {} tem apenas {} foto(s) (mínimo esperado: {})",
                        protocol, count, self.config.min_photos_per_protocol
                    ),
                );
            }
        }

        PlacementPlan {
            tasks,
            extra_dirs,
            alerts: recorder.into_alerts(),
        }
    }

    /// Token-set flavor: the block's caption tokens decide between a
    /// dedicated protocol folder, a multi-caption fan-out, and isolation.
    fn plan_token_set_block(
        &self,
        block: &Block,
        tasks: &mut Vec<CopyTask>,
        extra_dirs: &mut Vec<PathBuf>,
        used_folders: &mut Vec<String>,
        photos_per_protocol: &mut Vec<(String, usize)>,
        recorder: &mut AlertRecorder,
    ) {
        let (valid, invalid): (Vec<&String>, Vec<&String>) = block
            .captions
            .iter()
            .partition(|token| self.captions.is_valid_protocol(token));

        for token in &invalid {
            recorder.push(
                AlertKind::InvalidProtocol,
                format!(
                    "Protocolo \"{}\" inválido (esperado 2025/2026 + 6 dígitos) - {} - enviado para {}",
                    token, block.author, self.config.isolation_folder
                ),
            );
        }

        let author = sanitize_author(&block.author);

        if valid.len() == 1 {
            let protocol = valid[0];
            if used_folders.contains(protocol) {
                recorder.push(
                    AlertKind::SharedFolder,
                    format!("Pasta {protocol} recebeu arquivos de múltiplos blocos"),
                );
            } else {
                used_folders.push(protocol.clone());
            }

            for text in &block.free_text {
                recorder.push(
                    AlertKind::IgnoredText,
                    format!(
                        "Texto \"{}\" ignorado no bloco {}",
                        truncate_chars(text, SLUG_MAX_CHARS),
                        protocol
                    ),
                );
            }

            let dest_dir = PathBuf::from(protocol);
            for item in &block.media {
                tasks.push(CopyTask {
                    source: item.filename.clone(),
                    dest_dir: dest_dir.clone(),
                    dest_name: format!(
                        "{}_{}_{}",
                        file_timestamp(item.timestamp),
                        author,
                        item.filename
                    ),
                });
            }

            tally_photos(photos_per_protocol, protocol, &block.media);
            return;
        }

        if valid.len() > 1 {
            let joined: Vec<&str> = valid.iter().map(|t| t.as_str()).collect();
            let dest_dir = PathBuf::from(&self.config.isolation_folder)
                .join(&author)
                .join(joined.join("_"));

            // One empty subfolder per token so a human can drag the files
            // into the right one later.
            for token in &valid {
                extra_dirs.push(dest_dir.join(token.as_str()));
            }

            recorder.push(
                AlertKind::MultipleCaptions,
                format!(
                    "Bloco com {} legendas ({}) - {} - subpastas criadas",
                    valid.len(),
                    joined.join(", "),
                    block.author
                ),
            );

            for (index, item) in block.media.iter().enumerate() {
                tasks.push(CopyTask {
                    source: item.filename.clone(),
                    dest_dir: dest_dir.clone(),
                    dest_name: format!(
                        "{:02}_{}_{}",
                        index + 1,
                        file_timestamp(item.timestamp),
                        item.filename
                    ),
                });
            }
            return;
        }

        // No valid token. Isolation, keyed by the invalid tokens when any
        // exist.
        let mut dest_dir = PathBuf::from(&self.config.isolation_folder).join(&author);
        if !invalid.is_empty() {
            let joined: Vec<&str> = invalid.iter().map(|t| t.as_str()).collect();
            dest_dir = dest_dir.join(joined.join("_"));
        }

        // The first free-text fragment doubles as a human-readable slug in
        // the filename, when there is one.
        let slug = block
            .free_text
            .first()
            .map(|text| sanitize_caption_text(text))
            .filter(|slug| !slug.is_empty());

        for item in &block.media {
            let timestamp = file_timestamp(item.timestamp);
            let dest_name = match &slug {
                Some(slug) => format!("{}_{}_{}", timestamp, slug, item.filename),
                None => format!("{}_{}", timestamp, item.filename),
            };
            tasks.push(CopyTask {
                source: item.filename.clone(),
                dest_dir: dest_dir.clone(),
                dest_name,
            });
        }
    }

    /// Single-protocol flavor: the block either has its validated protocol
    /// folder or goes to isolation with a `sem_os` alert.
    fn plan_single_protocol_block(
        &self,
        block: &Block,
        tasks: &mut Vec<CopyTask>,
        used_folders: &mut Vec<String>,
        photos_per_protocol: &mut Vec<(String, usize)>,
        recorder: &mut AlertRecorder,
    ) {
        let author = sanitize_author(&block.author);

        let dest_dir = match &block.protocol {
            Some(protocol) => {
                if used_folders.contains(protocol) {
                    recorder.push(
                        AlertKind::SharedFolder,
                        format!("Pasta {protocol} recebeu arquivos de múltiplos blocos"),
                    );
                } else {
                    used_folders.push(protocol.clone());
                }
                tally_photos(photos_per_protocol, protocol, &block.media);
                PathBuf::from(protocol)
            }
            None if !block.invalid_captions.is_empty() => {
                let joined = block.invalid_captions.join("_");
                recorder.push(
                    AlertKind::MissingProtocol,
                    format!(
                        "Bloco com legenda inválida ({}): {} - {} ({} mídias)",
                        block.invalid_captions.join(", "),
                        block.author,
                        timestamp_label(block.first_timestamp),
                        block.media.len()
                    ),
                );
                PathBuf::from(&self.config.isolation_folder)
                    .join(&author)
                    .join(joined)
            }
            None => {
                recorder.push(
                    AlertKind::MissingProtocol,
                    format!(
                        "Bloco sem OS: {} - {} ({} mídias)",
                        block.author,
                        timestamp_label(block.first_timestamp),
                        block.media.len()
                    ),
                );
                PathBuf::from(&self.config.isolation_folder).join(&author)
            }
        };

        for (index, item) in block.media.iter().enumerate() {
            tasks.push(CopyTask {
                source: item.filename.clone(),
                dest_dir: dest_dir.clone(),
                dest_name: format!(
                    "{:02}_{}_{}_{}",
                    index + 1,
                    file_timestamp(item.timestamp),
                    author,
                    item.filename
                ),
            });
        }
    }
}

/// Makes an author label safe for use as a directory or filename component.
///
/// Phone-number authors collapse to their digits and hyphens; anything else
/// loses the filesystem-hostile characters. Empty labels become
/// `desconhecido`.
pub fn sanitize_author(author: &str) -> String {
    let trimmed = author.trim();
    if trimmed.is_empty() {
        return "desconhecido".to_string();
    }

    if trimmed.starts_with('+') {
        return trimmed
            .chars()
            .filter(|c| *c != '+' && !c.is_whitespace())
            .collect();
    }

    trimmed
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Turns caption free text into a lowercase ASCII hyphen-joined slug,
/// truncated to 50 characters.
pub fn sanitize_caption_text(text: &str) -> String {
    let ascii = deunicode(text).to_lowercase();
    let filtered: String = ascii
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ' || *c == '-')
        .collect();

    let joined = filtered
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");

    truncate_chars(&joined, SLUG_MAX_CHARS)
        .trim_matches('-')
        .to_string()
}

/// Filename-safe timestamp prefix, or the no-date sentinel.
pub fn file_timestamp(timestamp: Option<NaiveDateTime>) -> String {
    match timestamp {
        Some(ts) => ts.format("%Y-%m-%d_%H-%M").to_string(),
        None => "sem-data".to_string(),
    }
}

/// Human-readable timestamp for alert messages.
fn timestamp_label(timestamp: Option<NaiveDateTime>) -> String {
    match timestamp {
        Some(ts) => ts.format("%d/%m/%Y %H:%M").to_string(),
        None => "sem-data".to_string(),
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

fn tally_photos(
    photos_per_protocol: &mut Vec<(String, usize)>,
    protocol: &str,
    media: &[crate::segmenter::MediaItem],
) {
    let count = media
        .iter()
        .filter(|item| {
            item.filename
                .rsplit('.')
                .next()
                .is_some_and(|ext| PHOTO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        })
        .count();

    match photos_per_protocol
        .iter_mut()
        .find(|(key, _)| key == protocol)
    {
        Some((_, total)) => *total += count,
        None => photos_per_protocol.push((protocol.to_string(), count)),
    }
}
