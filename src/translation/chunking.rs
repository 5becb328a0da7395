/*!
 * Partitioning of translatable units into request-sized chunks.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::document::StructuralUnit;

/// What `max_chunk_size` counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChunkLimit {
    /// Number of units per chunk
    #[default]
    Units,
    /// Total source characters per chunk
    Characters,
}

impl fmt::Display for ChunkLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Units => write!(f, "units"),
            Self::Characters => write!(f, "characters"),
        }
    }
}

impl FromStr for ChunkLimit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "units" | "unit" => Ok(Self::Units),
            "characters" | "chars" => Ok(Self::Characters),
            _ => Err(anyhow::anyhow!("Invalid chunk limit: {}", s)),
        }
    }
}

/// A contiguous group of units sent in one request.
///
/// Units keep their document order; `index` is the chunk's position in the run.
#[derive(Debug, Clone)]
pub struct Chunk<'a> {
    pub index: usize,
    pub units: Vec<&'a StructuralUnit>,
}

impl<'a> Chunk<'a> {
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Source texts in order
    pub fn texts(&self) -> Vec<String> {
        self.units.iter().map(|u| u.source_text().to_string()).collect()
    }

    /// Source texts joined for glossary matching
    pub fn joined_text(&self) -> String {
        self.units
            .iter()
            .map(|u| u.source_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Split the units that need translation into chunks.
///
/// A unit larger than the character budget still forms a chunk on its own.
pub fn partition_units(units: &[StructuralUnit], max_chunk_size: usize, limit: ChunkLimit) -> Vec<Chunk<'_>> {
    let max_chunk_size = max_chunk_size.max(1);
    let mut chunks: Vec<Chunk<'_>> = Vec::new();
    let mut current: Vec<&StructuralUnit> = Vec::new();
    let mut current_size = 0usize;

    for unit in units.iter().filter(|u| u.needs_translation()) {
        let unit_size = match limit {
            ChunkLimit::Units => 1,
            ChunkLimit::Characters => unit.char_len(),
        };

        if !current.is_empty() && current_size + unit_size > max_chunk_size {
            chunks.push(Chunk {
                index: chunks.len(),
                units: std::mem::take(&mut current),
            });
            current_size = 0;
        }

        current.push(unit);
        current_size += unit_size;
    }

    if !current.is_empty() {
        chunks.push(Chunk {
            index: chunks.len(),
            units: current,
        });
    }

    chunks
}
