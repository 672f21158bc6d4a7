use super::{Role, Segment, Span};

/// A role-prefixed span of the document: one `@Role:` marker and the segments that follow it
/// up to the next marker (or EOF).
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub segments: Vec<Segment>,
    pub span: Span,
}

impl Message {
    pub fn new(role: Role, span: Span) -> Self {
        Self { role, segments: Vec::new(), span }
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn tool_use_ids(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::ToolUse { id, .. } => Some(id.as_str()),
            _ => None,
        })
    }

    pub fn resolved_tool_result_ids(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::ToolResult { tool_use_id, status: None, .. } => Some(tool_use_id.as_str()),
            _ => None,
        })
    }
}
