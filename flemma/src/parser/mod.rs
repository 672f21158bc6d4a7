//! Tolerant, line-oriented parser from raw text to [`Document`] (§4.3). Never fails:
//! structural anomalies become diagnostics rather than parse errors.

mod cache;
mod fence;
mod frontmatter;
mod inline;
mod message;

pub use cache::{get_parsed_document, AstCache};

use crate::ast::{Document, Span};
use crate::codeblock::CodeblockRegistry;

/// Parses raw source text (no trailing newline assumed) into a [`Document`].
pub fn parse(source: &str, registry: &CodeblockRegistry) -> Document {
    let lines: Vec<&str> = source.lines().collect();
    let (fm, body_start) = frontmatter::extract(&lines);
    let (messages, diagnostics) = message::parse_messages(&lines, body_start, registry);

    let end_line = lines.len().max(1);
    let mut doc = Document::new(Span::new(1, end_line));
    doc.frontmatter = fm;
    doc.messages = messages;
    doc.diagnostics = diagnostics;
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Role, Segment};

    fn registry() -> CodeblockRegistry {
        CodeblockRegistry::with_defaults()
    }

    #[test]
    fn plain_message_scenario() {
        let doc = parse("@You: hello\n", &registry());
        assert!(doc.frontmatter.is_none());
        assert_eq!(doc.messages.len(), 1);
        assert_eq!(doc.messages[0].role, Role::You);
        assert_eq!(doc.messages[0].segments, vec![Segment::Text("hello".to_string())]);
        assert!(doc.diagnostics.is_empty());
    }

    #[test]
    fn frontmatter_and_message() {
        let src = "```json\n{\"name\":\"Ada\"}\n```\n@You: Hi {{name}}!\n";
        let doc = parse(src, &registry());
        let fm = doc.frontmatter.as_ref().unwrap();
        assert_eq!(fm.language, "json");
        assert_eq!(doc.messages.len(), 1);
        assert!(matches!(doc.messages[0].segments[1], Segment::Expression { .. }));
    }

    #[test]
    fn unresolved_tool_call_scenario() {
        let src = "@Assistant:\n**Tool Use:** `bash` (`t_1`)\n```json\n{\"cmd\":\"ls\"}\n```\n";
        let doc = parse(src, &registry());
        assert_eq!(doc.messages.len(), 1);
        assert!(doc.diagnostics.is_empty());
        assert!(matches!(doc.messages[0].segments[0], Segment::ToolUse { .. }));
    }
}
