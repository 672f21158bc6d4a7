use serde_json::Value;

/// The payload of an [`EvaluatedPart`] produced by the processor, one per message segment
/// after expression evaluation and file materialization.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluatedPartKind {
    Text(String),
    /// A materialized `include()` result. `data` is the raw file bytes; the mime decides how
    /// [`to_generic_parts`](super::to_generic_parts) renders them.
    File { mime: String, data: Vec<u8>, filename: String },
    Thinking { content: String, signature: Option<String>, redacted: Option<bool> },
    ToolUse { id: String, name: String, input: Value },
    ToolResult { tool_use_id: String, content: String, is_error: bool },
}

/// One evaluated segment. `aborted` marks a part produced by a response that was cancelled
/// mid-stream; the pipeline resolves these before generic-part conversion (spec'd in the
/// prompt pipeline's abort-resolution step).
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedPart {
    pub kind: EvaluatedPartKind,
    pub aborted: bool,
}

impl EvaluatedPart {
    pub fn new(kind: EvaluatedPartKind) -> Self {
        Self { kind, aborted: false }
    }

    pub fn aborted(kind: EvaluatedPartKind) -> Self {
        Self { kind, aborted: true }
    }

    pub fn is_blank_text(&self) -> bool {
        matches!(&self.kind, EvaluatedPartKind::Text(t) if t.trim().is_empty())
    }
}
