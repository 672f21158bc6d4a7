use super::{Diagnostic, Message, Span};

/// At most one per document; must begin at line 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter {
    pub language: String,
    pub source: String,
    pub span: Span,
}

/// The root AST node produced by the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub frontmatter: Option<Frontmatter>,
    pub messages: Vec<Message>,
    pub diagnostics: Vec<Diagnostic>,
    pub span: Span,
}

impl Document {
    pub fn new(span: Span) -> Self {
        Self { frontmatter: None, messages: Vec::new(), diagnostics: Vec::new(), span }
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
