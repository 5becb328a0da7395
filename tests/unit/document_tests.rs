/*!
 * Tests for document readers and writers
 */

use anyhow::Result;
use std::fs;

use doctrans::document::{
    Alignment, DocumentFormat, OutputDocumentModel, OutputPair, UnitKind, read_document,
    write_document,
};
use doctrans::errors::DocumentError;

use crate::common;

/// Test that JSON units are returned in document order regardless of file order
#[test]
fn test_readDocument_withUnorderedJson_shouldSortByOrderIndex() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "units.json",
        r##"[
            {"id": "b", "order_index": 1, "source_text": "二番目",
             "format_attributes": {"style_name": "Body", "alignment": "center"}},
            {"id": "fig", "order_index": 2, "source_text": "figure", "kind": "placeholder"},
            {"id": "a", "order_index": 0, "source_text": "一番目"}
        ]"##,
    )?;

    let units = read_document(&path, DocumentFormat::Json)?;

    let ids: Vec<&str> = units.iter().map(|u| u.id()).collect();
    assert_eq!(ids, vec!["a", "b", "fig"]);
    assert_eq!(units[1].format_attributes().alignment, Some(Alignment::Center));
    assert_eq!(units[0].kind(), UnitKind::Text);
    assert!(units[2].is_placeholder());
    Ok(())
}

/// Test that broken JSON input is reported with the file path
#[test]
fn test_readDocument_withInvalidJson_shouldReturnParseError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "broken.json", "[{\"id\": ")?;

    let result = read_document(&path, DocumentFormat::Json);

    match result {
        Err(DocumentError::Parse { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected parse error, got {:?}", other),
    }
    Ok(())
}

/// Test that Word documents must be converted before reading
#[test]
fn test_readDocument_withDocx_shouldBeUnsupported() {
    let result = read_document(std::path::Path::new("report.docx"), DocumentFormat::Docx);
    assert!(matches!(result, Err(DocumentError::Unsupported(_))));
}

/// Test that a missing input file surfaces as an I/O error
#[test]
fn test_readDocument_withMissingFile_shouldReturnIoError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let result = read_document(&temp_dir.path().join("missing.txt"), DocumentFormat::Text);
    assert!(matches!(result, Err(DocumentError::Io { .. })));
    Ok(())
}

/// Test that text documents split into paragraph and placeholder units
#[test]
fn test_readDocument_withSampleText_shouldProduceOrderedUnits() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_sample_document(temp_dir.path(), "sample.txt")?;

    let units = read_document(&path, DocumentFormat::Text)?;

    assert_eq!(units.len(), 4);
    assert_eq!(units[0].source_text(), "日本語のテストです。");
    assert!(units[1].is_placeholder());
    for (i, unit) in units.iter().enumerate() {
        assert_eq!(unit.order_index(), i);
        assert_eq!(unit.id(), format!("p{}", i + 1));
    }
    Ok(())
}

/// Test that the JSON writer emits the output model unchanged
#[test]
fn test_writeDocument_withJson_shouldRoundTripModel() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("out.json");
    let model = OutputDocumentModel {
        pairs: vec![
            OutputPair {
                format_attributes: None,
                text: "你好".to_string(),
                kind: UnitKind::Text,
            },
            OutputPair {
                format_attributes: None,
                text: String::new(),
                kind: UnitKind::Placeholder,
            },
        ],
    };

    write_document(&model, &path, DocumentFormat::Json)?;

    let written: OutputDocumentModel = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(written, model);
    Ok(())
}

/// Test that a text model without attributes renders placeholders as empty paragraphs
#[test]
fn test_writeDocument_withTextAndNoAttributes_shouldLeavePlaceholderEmpty() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("out.txt");
    let model = OutputDocumentModel {
        pairs: vec![
            OutputPair {
                format_attributes: None,
                text: "第一".to_string(),
                kind: UnitKind::Text,
            },
            OutputPair {
                format_attributes: None,
                text: String::new(),
                kind: UnitKind::Placeholder,
            },
            OutputPair {
                format_attributes: None,
                text: "第三".to_string(),
                kind: UnitKind::Text,
            },
        ],
    };

    write_document(&model, &path, DocumentFormat::Text)?;

    assert_eq!(fs::read_to_string(&path)?, "第一\n\n\n\n第三\n");
    Ok(())
}
