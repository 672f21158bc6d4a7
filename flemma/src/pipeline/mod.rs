//! Processor → canonical prompt (§4.6): maps roles, assembles history, validates
//! tool_use/tool_result pairing, and threads per-document options.

use crate::ast::{
    to_generic_parts, Diagnostic, DiagnosticType, Document, EvaluatedPart, EvaluatedPartKind,
    GenericPart, Role, Segment, Severity,
};
use crate::codeblock::CodeblockRegistry;
use crate::context::{Context, ResolvedOpts};
use crate::processor::{self, EvaluatedResult};
use std::collections::HashSet;

#[derive(Debug, Clone, serde::Serialize)]
pub struct HistoryEntry {
    pub role: &'static str,
    pub parts: Vec<GenericPart>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PendingToolCall {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Prompt {
    pub history: Vec<HistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub pending_tool_calls: Vec<PendingToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opts: Option<ResolvedOpts>,
}

fn aborted_comment(kind: &EvaluatedPartKind) -> String {
    match kind {
        EvaluatedPartKind::Text(t) => format!("[response truncated: {t}]"),
        _ => "[response truncated]".to_string(),
    }
}

/// Resolves `aborted` parts on assistant messages per §4.6 step 3, and strips trailing
/// whitespace-only text parts.
fn resolve_aborts(messages: &mut [(Role, Vec<EvaluatedPart>)]) {
    let last_assistant_idx = messages.iter().rposition(|(role, _)| *role == Role::Assistant);

    for (idx, (role, parts)) in messages.iter_mut().enumerate() {
        if *role != Role::Assistant {
            continue;
        }
        let is_last = Some(idx) == last_assistant_idx;
        let has_tool_use = parts.iter().any(|p| matches!(p.kind, EvaluatedPartKind::ToolUse { .. }));

        if is_last && !has_tool_use {
            for part in parts.iter_mut() {
                if part.aborted {
                    part.kind = EvaluatedPartKind::Text(aborted_comment(&part.kind));
                    part.aborted = false;
                }
            }
        } else {
            parts.retain(|p| !p.aborted);
        }

        while matches!(parts.last(), Some(p) if p.is_blank_text()) {
            parts.pop();
        }
    }
}

/// Runs the processor, resolves aborted assistant parts, converts to generic parts, and
/// validates tool_use/tool_result pairing against the original AST.
pub fn run(
    doc: &Document,
    context: Context,
    pre_evaluated_frontmatter: Option<serde_json::Map<String, serde_json::Value>>,
    registry: &CodeblockRegistry,
) -> (Prompt, EvaluatedResult) {
    let source_file = context.filename.clone();
    let mut result = processor::evaluate(doc, context, pre_evaluated_frontmatter, registry);

    let mut staged: Vec<(Role, Vec<EvaluatedPart>)> =
        result.messages.drain(..).map(|m| (m.role, m.parts)).collect();
    resolve_aborts(&mut staged);

    let mut history = Vec::new();
    let mut system_chunks: Vec<String> = Vec::new();

    for (role, parts) in &staged {
        let (generic, diags) = to_generic_parts(parts, source_file.as_deref());
        result.diagnostics.extend(diags);

        match role {
            Role::System => {
                for part in &generic {
                    match part {
                        GenericPart::Text { text } => system_chunks.push(text.clone()),
                        GenericPart::TextFile { text, .. } => system_chunks.push(text.clone()),
                        _ => {}
                    }
                }
            }
            Role::You => history.push(HistoryEntry { role: "user", parts: generic }),
            Role::Assistant => history.push(HistoryEntry { role: "assistant", parts: generic }),
            Role::Other(_) => {}
        }
    }

    let system = if system_chunks.is_empty() {
        None
    } else {
        let joined = system_chunks.join("\n");
        let trimmed = joined.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    };

    let (pending_tool_calls, pairing_diags) = validate_tool_pairing(doc, source_file.as_deref());
    result.diagnostics.extend(pairing_diags);

    let prompt = Prompt { history, system, pending_tool_calls, opts: result.opts.clone() };
    (prompt, result)
}

fn validate_tool_pairing(
    doc: &Document,
    source_file: Option<&str>,
) -> (Vec<PendingToolCall>, Vec<Diagnostic>) {
    let mut resolved_ids: HashSet<&str> = HashSet::new();
    for message in &doc.messages {
        resolved_ids.extend(message.resolved_tool_result_ids());
    }

    let mut pending = Vec::new();
    let mut diagnostics = Vec::new();
    for message in &doc.messages {
        for segment in &message.segments {
            if let Segment::ToolUse { id, name, position, .. } = segment {
                if !resolved_ids.contains(id.as_str()) {
                    pending.push(PendingToolCall { id: id.clone(), name: name.clone() });
                    diagnostics.push(
                        Diagnostic::new(DiagnosticType::ToolUse, Severity::Warning)
                            .with_message(format!(
                                "Tool call '{name}' ({id}) has no matching tool result. A synthetic 'No result provided' error response will be sent to the API."
                            ))
                            .with_position(*position)
                            .with_source_file(source_file),
                    );
                }
            }
        }
    }
    (pending, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn registry() -> CodeblockRegistry {
        CodeblockRegistry::with_defaults()
    }

    #[test]
    fn plain_message_scenario() {
        let doc = parser::parse("@You: hello\n", &registry());
        let (prompt, result) = run(&doc, Context::new(None), None, &registry());
        assert_eq!(prompt.history.len(), 1);
        assert_eq!(prompt.history[0].role, "user");
        assert_eq!(prompt.history[0].parts, vec![GenericPart::Text { text: "hello".to_string() }]);
        assert!(prompt.system.is_none());
        assert!(prompt.pending_tool_calls.is_empty());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn history_length_matches_you_and_assistant_message_count() {
        let src = "@System: be nice\n@You: hi\n@Assistant: hello\n";
        let doc = parser::parse(src, &registry());
        let (prompt, _) = run(&doc, Context::new(None), None, &registry());
        let non_system = doc.messages.iter().filter(|m| m.role != Role::System).count();
        assert_eq!(prompt.history.len(), non_system);
    }

    #[test]
    fn every_diagnostic_carries_the_document_source_file() {
        let doc = parser::parse("@You: {{bogus}}\n", &registry());
        let ctx = Context::new(Some("doc.md".to_string()));
        let (_, result) = run(&doc, ctx, None, &registry());
        assert!(!result.diagnostics.is_empty());
        for d in &result.diagnostics {
            assert_eq!(d.source_file.as_deref(), Some("doc.md"));
        }
    }

    #[test]
    fn tool_use_without_result_becomes_pending() {
        let src = "@Assistant:\n**Tool Use:** `bash` (`t_1`)\n```json\n{\"cmd\":\"ls\"}\n```\n";
        let doc = parser::parse(src, &registry());
        let (prompt, result) = run(&doc, Context::new(None), None, &registry());
        assert_eq!(prompt.pending_tool_calls.len(), 1);
        assert_eq!(prompt.pending_tool_calls[0].id, "t_1");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].kind, DiagnosticType::ToolUse);
    }

    #[test]
    fn tool_use_with_matching_result_has_no_pending_calls() {
        let src = "@Assistant:\n**Tool Use:** `bash` (`t_1`)\n```json\n{\"cmd\":\"ls\"}\n```\n@You:\n**Tool Result:** `t_1`\n```\na\nb\n```\n";
        let doc = parser::parse(src, &registry());
        let (prompt, result) = run(&doc, Context::new(None), None, &registry());
        assert!(prompt.pending_tool_calls.is_empty());
        assert!(result.diagnostics.is_empty());
        assert_eq!(prompt.history.len(), 2);
        match &prompt.history[0].parts[0] {
            GenericPart::ToolUse { id, .. } => assert_eq!(id, "t_1"),
            other => panic!("{other:?}"),
        }
        match &prompt.history[1].parts[0] {
            GenericPart::ToolResult { tool_use_id, content, .. } => {
                assert_eq!(tool_use_id, "t_1");
                assert_eq!(content, "a\nb");
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn aborted_parts_on_non_last_assistant_message_are_dropped() {
        let mut messages = vec![
            (
                Role::Assistant,
                vec![EvaluatedPart::aborted(EvaluatedPartKind::Text("stale".to_string()))],
            ),
            (Role::You, vec![EvaluatedPart::new(EvaluatedPartKind::Text("hi".to_string()))]),
            (
                Role::Assistant,
                vec![EvaluatedPart::new(EvaluatedPartKind::Text("final".to_string()))],
            ),
        ];
        resolve_aborts(&mut messages);
        assert!(messages[0].1.is_empty());
    }

    #[test]
    fn aborted_parts_on_last_assistant_message_become_comments_when_no_tool_use() {
        let mut messages = vec![(
            Role::Assistant,
            vec![EvaluatedPart::aborted(EvaluatedPartKind::Text("partial".to_string()))],
        )];
        resolve_aborts(&mut messages);
        match &messages[0].1[0].kind {
            EvaluatedPartKind::Text(t) => assert!(t.contains("partial")),
            other => panic!("{other:?}"),
        }
        assert!(!messages[0].1[0].aborted);
    }

    #[test]
    fn aborted_parts_on_last_assistant_message_are_dropped_when_tool_use_present() {
        let mut messages = vec![(
            Role::Assistant,
            vec![
                EvaluatedPart::aborted(EvaluatedPartKind::Text("partial".to_string())),
                EvaluatedPart::new(EvaluatedPartKind::ToolUse {
                    id: "t_1".to_string(),
                    name: "bash".to_string(),
                    input: serde_json::json!({}),
                }),
            ],
        )];
        resolve_aborts(&mut messages);
        assert_eq!(messages[0].1.len(), 1);
        assert!(matches!(messages[0].1[0].kind, EvaluatedPartKind::ToolUse { .. }));
    }
}
