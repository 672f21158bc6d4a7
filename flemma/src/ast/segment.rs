use super::Position;
use serde_json::Value;

/// The role a message was authored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Role {
    You,
    Assistant,
    System,
    /// Any other `@<Role>:` marker the document uses; scanned with segment-level rules only.
    Other(String),
}

impl Role {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "You" => Role::You,
            "Assistant" => Role::Assistant,
            "System" => Role::System,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn history_role(&self) -> Option<&'static str> {
        match self {
            Role::You => Some("user"),
            Role::Assistant => Some("assistant"),
            Role::System | Role::Other(_) => None,
        }
    }
}

/// A tagged fragment inside a message.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    Expression {
        code: String,
        position: Position,
    },
    Thinking {
        content: String,
        position: Position,
        signature: Option<String>,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
        position: Position,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        is_error: bool,
        position: Position,
        /// Present iff this is an unresolved placeholder, not yet executed by the tool executor.
        status: Option<String>,
    },
}

impl Segment {
    pub fn position(&self) -> Option<Position> {
        match self {
            Segment::Text(_) => None,
            Segment::Expression { position, .. }
            | Segment::Thinking { position, .. }
            | Segment::ToolUse { position, .. }
            | Segment::ToolResult { position, .. } => Some(*position),
        }
    }

    pub fn is_unresolved_tool_result(&self) -> bool {
        matches!(self, Segment::ToolResult { status: Some(_), .. })
    }
}
