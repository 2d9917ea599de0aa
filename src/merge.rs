//! Protocol-keyed block fusion (protocol-merge policy post-pass).
//!
//! Fuses closed blocks that carry the same validated protocol number, even
//! when separated in time or authorship. Media is concatenated in
//! block-discovery order, preserving each block's internal send order.
//!
//! A block with no protocol number is never a merge candidate and passes
//! through unchanged. A wide gap between fused blocks raises an
//! `intervalo_grande` alert naming both contributing authors; the merge
//! proceeds regardless.

use std::collections::HashMap;

use crate::alert::{AlertKind, AlertRecorder};
use crate::segmenter::{Block, format_interval, minutes_between};

/// Fuses blocks sharing a protocol number into one.
///
/// The merged block keeps the first block's author; later contributors land
/// in `extra_authors`. `last_timestamp` widens to the latest fused
/// contribution.
pub fn merge_by_protocol(
    blocks: Vec<Block>,
    interval_alert_minutes: u32,
    recorder: &mut AlertRecorder,
) -> Vec<Block> {
    let mut merged: Vec<Block> = Vec::new();
    let mut by_protocol: HashMap<String, usize> = HashMap::new();

    for block in blocks {
        let Some(protocol) = block.protocol.clone() else {
            merged.push(block);
            continue;
        };

        match by_protocol.get(&protocol) {
            Some(&idx) => {
                let target = &mut merged[idx];

                if let Some(gap) =
                    minutes_between(target.last_timestamp, block.first_timestamp)
                {
                    if gap > f64::from(interval_alert_minutes) {
                        recorder.push(
                            AlertKind::LargeInterval,
                            format!(
                                "OS {}: blocos separados por {} foram unidos (autores: {}, {})",
                                protocol,
                                format_interval(gap),
                                target.author,
                                block.author
                            ),
                        );
                    }
                }

                target.media.extend(block.media);
                for token in block.invalid_captions {
                    if !target.invalid_captions.contains(&token) {
                        target.invalid_captions.push(token);
                    }
                }
                if block.last_timestamp.is_some() {
                    target.last_timestamp = block.last_timestamp;
                }

                // Primary author is never overwritten; it drives downstream
                // file names.
                if block.author != target.author
                    && !target.extra_authors.contains(&block.author)
                {
                    target.extra_authors.push(block.author);
                }
            }
            None => {
                by_protocol.insert(protocol, merged.len());
                merged.push(block);
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    use crate::segmenter::MediaItem;

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 2, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn block(author: &str, protocol: Option<&str>, files: &[&str], open: (u32, u32), close: (u32, u32)) -> Block {
        Block {
            author: author.to_string(),
            extra_authors: Vec::new(),
            first_timestamp: Some(ts(open.0, open.1)),
            last_timestamp: Some(ts(close.0, close.1)),
            media: files
                .iter()
                .map(|f| MediaItem {
                    filename: (*f).to_string(),
                    timestamp: Some(ts(open.0, open.1)),
                })
                .collect(),
            captions: Vec::new(),
            protocol: protocol.map(String::from),
            invalid_captions: Vec::new(),
            free_text: Vec::new(),
        }
    }

    #[test]
    fn test_same_protocol_blocks_fuse_in_discovery_order() {
        let mut rec = AlertRecorder::new();
        let blocks = vec![
            block("Bob", Some("2025000111"), &["a.jpg"], (10, 0), (10, 0)),
            block("Eve", Some("2025000111"), &["b.jpg"], (10, 10), (10, 10)),
        ];
        let merged = merge_by_protocol(blocks, 30, &mut rec);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].author, "Bob");
        assert_eq!(merged[0].extra_authors, ["Eve"]);
        let names: Vec<&str> = merged[0].media.iter().map(|m| m.filename.as_str()).collect();
        assert_eq!(names, ["a.jpg", "b.jpg"]);
        assert_eq!(merged[0].last_timestamp, Some(ts(10, 10)));
        assert!(rec.is_empty());
    }

    #[test]
    fn test_wide_gap_alerts_but_merges_anyway() {
        let mut rec = AlertRecorder::new();
        let blocks = vec![
            block("Bob", Some("2025000111"), &["a.jpg"], (10, 0), (10, 0)),
            block("Eve", Some("2025000111"), &["b.jpg"], (10, 50), (10, 50)),
        ];
        let merged = merge_by_protocol(blocks, 30, &mut rec);

        assert_eq!(merged.len(), 1);
        assert_eq!(rec.count(AlertKind::LargeInterval), 1);
        let alert = &rec.alerts()[0];
        assert!(alert.message.contains("2025000111"));
        assert!(alert.message.contains("Bob"));
        assert!(alert.message.contains("Eve"));
        assert!(alert.message.contains("50min"));
    }

    #[test]
    fn test_block_without_protocol_passes_through() {
        let mut rec = AlertRecorder::new();
        let blocks = vec![
            block("Bob", None, &["a.jpg"], (10, 0), (10, 0)),
            block("Bob", None, &["b.jpg"], (10, 1), (10, 1)),
        ];
        let merged = merge_by_protocol(blocks, 30, &mut rec);

        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_distinct_protocols_stay_separate() {
        let mut rec = AlertRecorder::new();
        let blocks = vec![
            block("Bob", Some("2025000111"), &["a.jpg"], (10, 0), (10, 0)),
            block("Bob", Some("2025000222"), &["b.jpg"], (10, 1), (10, 1)),
        ];
        let merged = merge_by_protocol(blocks, 30, &mut rec);

        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_same_author_not_recorded_as_extra() {
        let mut rec = AlertRecorder::new();
        let blocks = vec![
            block("Bob", Some("2025000111"), &["a.jpg"], (10, 0), (10, 0)),
            block("Bob", Some("2025000111"), &["b.jpg"], (10, 5), (10, 5)),
        ];
        let merged = merge_by_protocol(blocks, 30, &mut rec);

        assert_eq!(merged.len(), 1);
        assert!(merged[0].extra_authors.is_empty());
    }
}
