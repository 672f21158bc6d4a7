//! The document data model: frontmatter, messages, segments, diagnostics, and the
//! evaluated/generic-part representations that the processor and pipeline produce.

mod diagnostic;
mod document;
mod evaluated_part;
mod generic_part;
mod message;
mod position;
mod segment;

pub use diagnostic::{Diagnostic, DiagnosticType, Severity};
pub use document::{Document, Frontmatter};
pub use evaluated_part::{EvaluatedPart, EvaluatedPartKind};
pub use generic_part::{to_generic_parts, GenericPart};
pub use message::Message;
pub use position::{Position, Span};
pub use segment::{Role, Segment};
