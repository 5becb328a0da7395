/*!
 * Document readers and writers.
 *
 * Binary Word/PDF handling lives outside this crate; the readers here cover
 * plain text and the JSON unit format that external converters emit.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

use crate::errors::DocumentError;

use super::model::{FormatAttributes, OutputDocumentModel, StructuralUnit, UnitKind};

/// A paragraph consisting of a single `[[name]]` token stands in for an image or table
static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[\[[^\[\]]+\]\]$").expect("placeholder pattern is valid"));

/// Attribute key under which the text reader keeps a placeholder's token
pub const PLACEHOLDER_TOKEN_KEY: &str = "placeholder_token";

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Text,
    Json,
    Docx,
    Pdf,
}

impl DocumentFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "txt" | "text" | "md" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "docx" => Ok(Self::Docx),
            "pdf" => Ok(Self::Pdf),
            other => Err(DocumentError::Unsupported(format!(
                "unknown extension '{}' for {:?}",
                other, path
            ))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Json => "json",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }
}

/// Produces the ordered unit sequence of a document
pub trait DocumentReader {
    fn read(&self, path: &Path) -> Result<Vec<StructuralUnit>, DocumentError>;
}

/// Persists an output model
pub trait DocumentWriter {
    fn write(&self, model: &OutputDocumentModel, path: &Path) -> Result<(), DocumentError>;
}

/// Paragraph-per-blank-line text documents
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextDocument;

impl PlainTextDocument {
    /// Split text into units; exposed separately so it can run without a file
    pub fn parse(content: &str) -> Vec<StructuralUnit> {
        let mut units = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        for line in content.lines() {
            if line.trim().is_empty() {
                Self::flush_paragraph(&mut current, &mut units);
            } else {
                current.push(line);
            }
        }
        Self::flush_paragraph(&mut current, &mut units);

        units
    }

    fn flush_paragraph(current: &mut Vec<&str>, units: &mut Vec<StructuralUnit>) {
        if current.is_empty() {
            return;
        }
        let paragraph = current.join("\n");
        current.clear();

        let index = units.len();
        let id = format!("p{}", index + 1);
        let trimmed = paragraph.trim();
        let unit = if PLACEHOLDER_PATTERN.is_match(trimmed) {
            let mut attributes = FormatAttributes::default();
            attributes
                .extra
                .insert(PLACEHOLDER_TOKEN_KEY.to_string(), serde_json::Value::from(trimmed));
            StructuralUnit::placeholder(id, index, trimmed, attributes)
        } else {
            StructuralUnit::text(id, index, paragraph.clone(), FormatAttributes::default())
        };
        units.push(unit);
    }

    /// Render a model as text, one paragraph per pair.
    ///
    /// Placeholder pairs carry no text; their token is restored from the
    /// attributes when formatting was preserved.
    pub fn render(model: &OutputDocumentModel) -> String {
        let mut out = String::new();
        for pair in &model.pairs {
            if !out.is_empty() {
                out.push_str("\n\n");
            }
            let text = match pair.kind {
                UnitKind::Text => pair.text.as_str(),
                UnitKind::Placeholder => pair
                    .format_attributes
                    .as_ref()
                    .and_then(|attrs| attrs.extra.get(PLACEHOLDER_TOKEN_KEY))
                    .and_then(|token| token.as_str())
                    .unwrap_or(""),
            };
            out.push_str(text);
        }
        out.push('\n');
        out
    }
}

impl DocumentReader for PlainTextDocument {
    fn read(&self, path: &Path) -> Result<Vec<StructuralUnit>, DocumentError> {
        let content = fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&content))
    }
}

impl DocumentWriter for PlainTextDocument {
    fn write(&self, model: &OutputDocumentModel, path: &Path) -> Result<(), DocumentError> {
        fs::write(path, Self::render(model)).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// JSON documents: a unit array as input, the output model as output
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDocument;

impl DocumentReader for JsonDocument {
    fn read(&self, path: &Path) -> Result<Vec<StructuralUnit>, DocumentError> {
        let content = fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut units: Vec<StructuralUnit> =
            serde_json::from_str(&content).map_err(|e| DocumentError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        units.sort_by_key(|u| u.order_index());
        Ok(units)
    }
}

impl DocumentWriter for JsonDocument {
    fn write(&self, model: &OutputDocumentModel, path: &Path) -> Result<(), DocumentError> {
        let json = serde_json::to_string_pretty(model).map_err(|e| DocumentError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs::write(path, json).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Read a document, dispatching on its format
pub fn read_document(path: &Path, format: DocumentFormat) -> Result<Vec<StructuralUnit>, DocumentError> {
    match format {
        DocumentFormat::Text => PlainTextDocument.read(path),
        DocumentFormat::Json => JsonDocument.read(path),
        DocumentFormat::Docx | DocumentFormat::Pdf => Err(DocumentError::Unsupported(format!(
            "{} documents must be converted to JSON units first",
            format.extension()
        ))),
    }
}

/// Write an output model, dispatching on the requested format
pub fn write_document(
    model: &OutputDocumentModel,
    path: &Path,
    format: DocumentFormat,
) -> Result<(), DocumentError> {
    match format {
        DocumentFormat::Text => PlainTextDocument.write(model, path),
        DocumentFormat::Json => JsonDocument.write(model, path),
        DocumentFormat::Docx | DocumentFormat::Pdf => Err(DocumentError::Unsupported(format!(
            "writing {} is handled by an external writer",
            format.extension()
        ))),
    }
}
