/*!
 * Per-unit translation outcomes.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::document::StructuralUnit;

/// How a unit's output text was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationStatus {
    /// Translated by the backend
    Ok,
    /// The backend never produced a usable translation; the source text is kept
    FallbackOriginal,
    /// Recorded only for diagnostics; never returned by a successful run
    Failed,
    /// Placeholder or blank unit, never sent to the backend
    Passthrough,
}

impl fmt::Display for TranslationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::FallbackOriginal => write!(f, "fallback_original"),
            Self::Failed => write!(f, "failed"),
            Self::Passthrough => write!(f, "passthrough"),
        }
    }
}

/// Translation of one structural unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub unit_id: String,
    pub order_index: usize,
    pub translated_text: String,
    pub status: TranslationStatus,
}

impl TranslationResult {
    pub fn translated(unit: &StructuralUnit, text: String) -> Self {
        Self {
            unit_id: unit.id().to_string(),
            order_index: unit.order_index(),
            translated_text: text,
            status: TranslationStatus::Ok,
        }
    }

    /// Keep the source text because translation failed
    pub fn fallback(unit: &StructuralUnit) -> Self {
        Self {
            unit_id: unit.id().to_string(),
            order_index: unit.order_index(),
            translated_text: unit.source_text().to_string(),
            status: TranslationStatus::FallbackOriginal,
        }
    }

    /// Carry a unit through untouched
    pub fn passthrough(unit: &StructuralUnit) -> Self {
        Self {
            unit_id: unit.id().to_string(),
            order_index: unit.order_index(),
            translated_text: unit.source_text().to_string(),
            status: TranslationStatus::Passthrough,
        }
    }
}
