//! End-to-end pipeline tests: transcript text through parsing, segmentation
//! and placement planning.

use std::io::Write;
use std::path::PathBuf;

use chatblock::prelude::*;
use tempfile::NamedTempFile;

fn run(text: &str, config: GroupingConfig) -> Segmentation {
    let messages = TranscriptParser::new().parse_str(text);
    BlockSegmenter::new(config).segment(&messages)
}

// =========================================================================
// Continuity policy
// =========================================================================

#[test]
fn test_continuity_gap_and_invalid_caption_scenario() {
    // Two attachments three minutes apart with tolerance two, then a caption
    // line. The gap splits the blocks and the short token is not a protocol.
    let text = "\
01/02/2025 10:00 - Ana: IMG-0001.jpg (arquivo anexado)
01/02/2025 10:03 - Ana: IMG-0002.jpg (arquivo anexado)
01/02/2025 10:04 - Ana: 100 quadro";
    let result = run(text, GroupingConfig::continuity().with_tolerance_minutes(2));

    assert_eq!(result.blocks.len(), 2);
    assert!(result.blocks[0].captions.is_empty());
    assert_eq!(result.blocks[1].captions, ["100"]);

    let planner = PlacementPlanner::new(PlacementConfig::default());
    let plan = planner.plan(&result.blocks, GroupingPolicy::Continuity);

    // The second block routes to isolation under its invalid token.
    assert_eq!(
        plan.tasks[1].dest_dir,
        PathBuf::from("sem_legenda").join("Ana").join("100")
    );
    assert_eq!(plan.alerts.iter().filter(|a| a.kind == AlertKind::InvalidProtocol).count(), 1);
    // Neither block has a valid caption, so nothing is "ignored text".
    assert!(plan.alerts.iter().all(|a| a.kind != AlertKind::IgnoredText));
}

#[test]
fn test_continuity_full_pipeline_to_protocol_folder() {
    let text = "\
01/02/2025 10:00 - Ana: IMG-0001.jpg (arquivo anexado)
01/02/2025 10:01 - Ana: IMG-0002.jpg (arquivo anexado)
01/02/2025 10:02 - Ana: IMG-0003.jpg (arquivo anexado)
01/02/2025 10:03 - Ana: 2025010203";
    let result = run(text, GroupingConfig::continuity());

    assert_eq!(result.blocks.len(), 1);

    let planner = PlacementPlanner::new(PlacementConfig::default());
    let plan = planner.plan(&result.blocks, GroupingPolicy::Continuity);

    assert_eq!(plan.tasks.len(), 3);
    for task in &plan.tasks {
        assert_eq!(task.dest_dir, PathBuf::from("2025010203"));
        assert!(task.dest_name.starts_with("2025-02-01_10-0"));
        assert!(task.dest_name.contains("_Ana_"));
    }
    assert!(plan.alerts.is_empty());
}

// =========================================================================
// Blank-line policy
// =========================================================================

#[test]
fn test_blank_line_divider_scenario() {
    // Divider, attachment, divider, attachment: two blocks even though the
    // author and window would otherwise merge them.
    let text = "\
01/02/2025 10:00 - Ana:
01/02/2025 10:00 - Ana: IMG-0001.jpg (arquivo anexado)
01/02/2025 10:01 - Ana:
01/02/2025 10:01 - Ana: IMG-0002.jpg (arquivo anexado)";
    let result = run(text, GroupingConfig::blank_line());

    assert_eq!(result.blocks.len(), 2);
    assert_eq!(result.blocks[0].media.len(), 1);
    assert_eq!(result.blocks[1].media.len(), 1);
}

// =========================================================================
// Protocol-merge policy
// =========================================================================

#[test]
fn test_merge_scenario_two_authors_one_protocol() {
    let text = "\
01/02/2025 09:58 - Bob: IMG-A.jpg (arquivo anexado)
01/02/2025 10:00 - Bob: OS 2025000111
01/02/2025 10:50 - Eve: segue tambem 2025000111
01/02/2025 10:50 - Eve: IMG-B.jpg (arquivo anexado)";
    let result = run(
        text,
        GroupingConfig::protocol_merge().with_interval_alert_minutes(30),
    );

    assert_eq!(result.blocks.len(), 1);
    let block = &result.blocks[0];
    assert_eq!(block.author, "Bob");
    assert_eq!(block.extra_authors, ["Eve"]);
    assert_eq!(block.protocol.as_deref(), Some("2025000111"));

    let names: Vec<&str> = block.media.iter().map(|m| m.filename.as_str()).collect();
    assert_eq!(names, ["IMG-A.jpg", "IMG-B.jpg"]);

    let gaps: Vec<_> = result
        .alerts
        .iter()
        .filter(|a| a.kind == AlertKind::LargeInterval)
        .collect();
    assert_eq!(gaps.len(), 1);
    assert!(gaps[0].message.contains("Bob"));
    assert!(gaps[0].message.contains("Eve"));
}

#[test]
fn test_merge_pipeline_names_files_after_primary_author() {
    let text = "\
01/02/2025 09:58 - Bob: IMG-A.jpg (arquivo anexado)
01/02/2025 10:00 - Bob: 2025000111
01/02/2025 10:10 - Eve: 2025000111
01/02/2025 10:10 - Eve: IMG-B.jpg (arquivo anexado)";
    let result = run(text, GroupingConfig::protocol_merge());

    let planner = PlacementPlanner::new(PlacementConfig::default());
    let plan = planner.plan(&result.blocks, GroupingPolicy::ProtocolMerge);

    assert_eq!(plan.tasks.len(), 2);
    assert_eq!(plan.tasks[0].dest_dir, PathBuf::from("2025000111"));
    assert_eq!(plan.tasks[0].dest_name, "01_2025-02-01_09-58_Bob_IMG-A.jpg");
    // Eve's file is still named after the block's primary author.
    assert_eq!(plan.tasks[1].dest_name, "02_2025-02-01_10-10_Bob_IMG-B.jpg");
}

// =========================================================================
// Alerts
// =========================================================================

#[test]
fn test_hidden_media_scenario() {
    let text = "\
01/02/2025 10:30 - Ana: <Mídia oculta>
01/02/2025 10:31 - Ana: IMG-0001.jpg (arquivo anexado)";
    let result = run(text, GroupingConfig::continuity());

    let hidden: Vec<_> = result
        .alerts
        .iter()
        .filter(|a| a.kind == AlertKind::HiddenMedia)
        .collect();
    assert_eq!(hidden.len(), 1);
    assert!(hidden[0].message.contains("01/02/2025 10:30"));
    assert!(hidden[0].message.contains("Ana"));

    let total_media: usize = result.blocks.iter().map(|b| b.media.len()).sum();
    assert_eq!(total_media, 1);
}

#[test]
fn test_alert_report_rendering() {
    let text = "01/02/2025 10:30 - Ana: <Mídia oculta>";
    let result = run(text, GroupingConfig::continuity());

    let rendered = result.alerts[0].to_string();
    assert!(rendered.starts_with("⚠️"));
    assert_eq!(result.alerts[0].kind.code(), "midia_oculta");
}

// =========================================================================
// File input and serialization
// =========================================================================

#[test]
fn test_parse_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "01/02/2025 10:00 - Ana: IMG-0001.jpg (arquivo anexado)").unwrap();
    writeln!(file, "2025010203").unwrap();
    file.flush().unwrap();

    let messages = TranscriptParser::new().parse(file.path()).unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].continuation_lines(), ["2025010203"]);

    let result = BlockSegmenter::new(GroupingConfig::continuity()).segment(&messages);
    assert_eq!(result.blocks[0].captions, ["2025010203"]);
}

#[test]
fn test_parse_missing_file_is_io_error() {
    let err = TranscriptParser::new()
        .parse("/definitely/not/here.txt".as_ref())
        .unwrap_err();
    assert!(matches!(err, ChatblockError::Io(_)));
}

#[test]
fn test_segmentation_serializes_round_trip() {
    let text = "\
01/02/2025 10:00 - Ana: IMG-0001.jpg (arquivo anexado)
01/02/2025 10:01 - Ana: 2025010203 quadro";
    let result = run(text, GroupingConfig::continuity());

    let json = serde_json::to_string(&result).unwrap();
    let parsed: Segmentation = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, result);
}

// =========================================================================
// Determinism
// =========================================================================

#[test]
fn test_pipeline_is_deterministic_across_policies() {
    let text = "\
01/02/2025 10:00 - Ana: IMG-0001.jpg (arquivo anexado)
2025010203
01/02/2025 10:05 - Bob: <Mídia oculta>
01/02/2025 10:06 - Bob: IMG-0002.jpg (arquivo anexado)
01/02/2025 10:07 - Bob: 2025000111

01/02/2025 11:00 - Eve: IMG-0003.jpg (arquivo anexado)";

    for (config, policy) in [
        (GroupingConfig::continuity(), GroupingPolicy::Continuity),
        (GroupingConfig::blank_line(), GroupingPolicy::BlankLine),
        (GroupingConfig::protocol_merge(), GroupingPolicy::ProtocolMerge),
    ] {
        let first = run(text, config.clone());
        let second = run(text, config);
        assert_eq!(first, second);

        let planner = PlacementPlanner::new(PlacementConfig::default());
        assert_eq!(
            planner.plan(&first.blocks, policy),
            planner.plan(&second.blocks, policy)
        );
    }
}
