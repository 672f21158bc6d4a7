use super::Position;
use std::fmt;

/// What part of the pipeline produced a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticType {
    Frontmatter,
    Expression,
    File,
    ToolUse,
    ToolResult,
    Parse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A structured error or warning. Diagnostics never stop parsing or evaluation; they are
/// additive and, once emitted, never mutated.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    #[serde(rename = "type")]
    pub kind: DiagnosticType,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_role: Option<String>,
    /// Always set to the document's filename (or "N/A") before the diagnostic leaves the pipeline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticType, severity: Severity) -> Self {
        Self {
            kind,
            severity,
            message: None,
            position: None,
            language: None,
            expression: None,
            filename: None,
            raw: None,
            message_role: None,
            source_file: None,
        }
    }

    pub fn warning(kind: DiagnosticType, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Warning).with_message(message)
    }

    pub fn error(kind: DiagnosticType, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Error).with_message(message)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    pub fn with_message_role(mut self, role: impl Into<String>) -> Self {
        self.message_role = Some(role.into());
        self
    }

    /// Stamps `source_file`, defaulting to `"N/A"` when the document has no filename.
    pub fn with_source_file(mut self, filename: Option<&str>) -> Self {
        self.source_file = Some(filename.unwrap_or("N/A").to_string());
        self
    }
}

/// Renders as `source_file:line:col: severity: message`, omitting the position when unset.
/// Editor-agnostic: no ANSI color, no terminal-specific formatting.
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source_file.as_deref().unwrap_or("N/A"))?;
        if let Some(position) = self.position {
            write!(f, ":{}:{}", position.line, position.column)?;
        }
        write!(f, ": {}", self.severity)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_file_defaults_to_na() {
        let d = Diagnostic::warning(DiagnosticType::File, "missing").with_source_file(None);
        assert_eq!(d.source_file.as_deref(), Some("N/A"));
    }

    #[test]
    fn source_file_uses_filename_when_present() {
        let d = Diagnostic::warning(DiagnosticType::File, "missing")
            .with_source_file(Some("notes.md"));
        assert_eq!(d.source_file.as_deref(), Some("notes.md"));
    }

    #[test]
    fn builder_chains_apply_all_fields() {
        let pos = Position::new(3, 1);
        let d = Diagnostic::error(DiagnosticType::ToolUse, "bad json")
            .with_position(pos)
            .with_language("json")
            .with_filename("x.md");
        assert_eq!(d.position, Some(pos));
        assert_eq!(d.language.as_deref(), Some("json"));
        assert_eq!(d.filename.as_deref(), Some("x.md"));
        assert_eq!(d.severity, Severity::Error);
    }

    #[test]
    fn display_includes_position_when_present() {
        let d = Diagnostic::error(DiagnosticType::Expression, "undefined variable")
            .with_position(Position::new(4, 9))
            .with_source_file(Some("notes.md"));
        assert_eq!(d.to_string(), "notes.md:4:9: error: undefined variable");
    }

    #[test]
    fn display_omits_position_when_absent() {
        let d = Diagnostic::warning(DiagnosticType::File, "missing").with_source_file(None);
        assert_eq!(d.to_string(), "N/A: warning: missing");
    }
}
