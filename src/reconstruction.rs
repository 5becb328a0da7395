/*!
 * Reassembly of translated text with the source document's formatting.
 */

use log::debug;

use crate::document::{OutputDocumentModel, OutputPair, StructuralUnit};
use crate::errors::ReconstructionError;
use crate::translation::TranslationResult;

/// Pairs each unit's formatting with its translated text
#[derive(Debug, Clone, Copy)]
pub struct FormatReconstructor {
    preserve_format: bool,
}

impl FormatReconstructor {
    /// `preserve_format` applies to every `reconstruct` call on this value;
    /// `FormatReconstructor::new(flag).reconstruct(units, results)` is the
    /// one-shot form of reconstructing with that flag.
    pub fn new(preserve_format: bool) -> Self {
        Self { preserve_format }
    }

    /// Build the output model.
    ///
    /// `results` must be index-aligned with `units`. Formatting attributes are
    /// copied unchanged, or dropped entirely when formatting is not preserved.
    /// Placeholders become blank text so the writer can put the original
    /// content back in their place.
    pub fn reconstruct(
        &self,
        units: &[StructuralUnit],
        results: &[TranslationResult],
    ) -> Result<OutputDocumentModel, ReconstructionError> {
        if units.len() != results.len() {
            return Err(ReconstructionError::CountMismatch {
                units: units.len(),
                results: results.len(),
            });
        }

        let mut pairs = Vec::with_capacity(units.len());
        for (index, (unit, result)) in units.iter().zip(results).enumerate() {
            if unit.id() != result.unit_id {
                return Err(ReconstructionError::IdMismatch {
                    index,
                    unit_id: unit.id().to_string(),
                    result_id: result.unit_id.clone(),
                });
            }

            let text = if unit.is_placeholder() {
                String::new()
            } else {
                result.translated_text.clone()
            };

            pairs.push(OutputPair {
                format_attributes: self.preserve_format.then(|| unit.format_attributes().clone()),
                text,
                kind: unit.kind(),
            });
        }

        debug!("Reconstructed {} units (preserve_format: {})", pairs.len(), self.preserve_format);
        Ok(OutputDocumentModel { pairs })
    }
}

impl Default for FormatReconstructor {
    fn default() -> Self {
        Self::new(true)
    }
}
