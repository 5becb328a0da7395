/*!
 * Document model and document I/O.
 *
 * - `model`: structural units, formatting attributes and the output model
 * - `io`: reader/writer contracts plus text and JSON implementations
 */

pub mod io;
pub mod model;

pub use self::io::{
    DocumentFormat, DocumentReader, DocumentWriter, JsonDocument, PlainTextDocument, read_document,
    write_document,
};
pub use self::model::{
    Alignment, FormatAttributes, OutputDocumentModel, OutputPair, Position, StructuralUnit, UnitKind,
};
