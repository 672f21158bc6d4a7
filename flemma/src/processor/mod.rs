//! AST → evaluated messages (§4.5): runs frontmatter once, evaluates expressions, materializes
//! file references, preserves thinking/tool segments verbatim, and collects diagnostics. The
//! processor never performs I/O itself; file reads happen through `include()` inside the
//! evaluator.

use crate::ast::{
    Diagnostic, DiagnosticType, Document, EvaluatedPart, EvaluatedPartKind, Role, Segment,
    Severity,
};
use crate::codeblock::CodeblockRegistry;
use crate::context::{Context, ResolvedOpts};
use crate::eval::{self, EvalError, EvalOutcome};

/// One message's role plus its evaluated parts.
#[derive(Debug, Clone)]
pub struct EvaluatedMessage {
    pub role: Role,
    pub parts: Vec<EvaluatedPart>,
}

#[derive(Debug, Clone, Default)]
pub struct EvaluatedResult {
    pub messages: Vec<EvaluatedMessage>,
    pub diagnostics: Vec<Diagnostic>,
    pub opts: Option<ResolvedOpts>,
}

fn stringify_scalar(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => String::new(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Runs frontmatter (unless a pre-evaluated result is supplied) and evaluates every message's
/// segments, per §4.5.
pub fn evaluate(
    doc: &Document,
    base_context: Context,
    pre_evaluated_frontmatter: Option<serde_json::Map<String, serde_json::Value>>,
    registry: &CodeblockRegistry,
) -> EvaluatedResult {
    let mut diagnostics = Vec::new();
    let source_file = base_context.filename.clone();

    let (effective_ctx, opts) = if let Some(map) = pre_evaluated_frontmatter {
        let opts = ResolvedOpts::from_map(map.clone());
        (base_context.extended_with(map.into_iter().collect()), Some(opts))
    } else if let Some(fm) = &doc.frontmatter {
        match registry.parse(&fm.language, &fm.source, &base_context) {
            Ok(serde_json::Value::Object(map)) => {
                let opts = ResolvedOpts::from_map(map.clone());
                (base_context.extended_with(map.into_iter().collect()), Some(opts))
            }
            Ok(_) => {
                diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticType::Frontmatter,
                        "frontmatter did not evaluate to a key-value map; ignoring",
                    )
                    .with_language(fm.language.clone())
                    .with_position(crate::ast::Position::new(fm.span.start_line, 1))
                    .with_source_file(source_file.as_deref()),
                );
                (base_context.clone(), None)
            }
            Err(e) => {
                diagnostics.push(
                    Diagnostic::error(DiagnosticType::Frontmatter, e)
                        .with_language(fm.language.clone())
                        .with_position(crate::ast::Position::new(fm.span.start_line, 1))
                        .with_source_file(source_file.as_deref()),
                );
                (base_context.clone(), None)
            }
        }
    } else {
        (base_context.clone(), None)
    };

    let env = eval::build_environment(&effective_ctx);

    let mut messages = Vec::with_capacity(doc.messages.len());
    for message in &doc.messages {
        let mut parts = Vec::with_capacity(message.segments.len());
        for segment in &message.segments {
            match segment {
                Segment::Text(t) => {
                    if !t.is_empty() {
                        parts.push(EvaluatedPart::new(EvaluatedPartKind::Text(t.clone())));
                    }
                }
                Segment::Thinking { content, signature, .. } => {
                    parts.push(EvaluatedPart::new(EvaluatedPartKind::Thinking {
                        content: content.clone(),
                        signature: signature.clone(),
                        redacted: None,
                    }));
                }
                Segment::Expression { code, position } => {
                    match eval::eval_expression(code, &env) {
                        Ok(EvalOutcome::Scalar(value)) => {
                            let text = stringify_scalar(&value);
                            if !text.is_empty() {
                                parts.push(EvaluatedPart::new(EvaluatedPartKind::Text(text)));
                            }
                        }
                        Ok(EvalOutcome::File(f)) => {
                            parts.push(EvaluatedPart::new(EvaluatedPartKind::File {
                                mime: f.mime,
                                data: f.data,
                                filename: f.filename,
                            }));
                        }
                        Ok(EvalOutcome::FileError(_)) => unreachable!(
                            "eval_expression converts FileError into Err(EvalError::Include)"
                        ),
                        Err(EvalError::Eval(msg)) => {
                            diagnostics.push(
                                Diagnostic::warning(DiagnosticType::Expression, msg)
                                    .with_expression(code.clone())
                                    .with_position(*position)
                                    .with_source_file(source_file.as_deref()),
                            );
                            parts.push(EvaluatedPart::new(EvaluatedPartKind::Text(format!(
                                "{{{{{code}}}}}"
                            ))));
                        }
                        Err(EvalError::Include { filename, raw, error }) => {
                            diagnostics.push(
                                Diagnostic::new(DiagnosticType::File, Severity::Warning)
                                    .with_message(error)
                                    .with_filename(filename)
                                    .with_raw(raw)
                                    .with_position(*position)
                                    .with_source_file(source_file.as_deref()),
                            );
                            parts.push(EvaluatedPart::new(EvaluatedPartKind::Text(format!(
                                "{{{{{code}}}}}"
                            ))));
                        }
                    }
                }
                Segment::ToolUse { id, name, input, .. } => {
                    parts.push(EvaluatedPart::new(EvaluatedPartKind::ToolUse {
                        id: id.clone(),
                        name: name.clone(),
                        input: input.clone(),
                    }));
                }
                Segment::ToolResult { tool_use_id, content, is_error, status, .. } => {
                    if status.is_none() {
                        parts.push(EvaluatedPart::new(EvaluatedPartKind::ToolResult {
                            tool_use_id: tool_use_id.clone(),
                            content: content.clone(),
                            is_error: *is_error,
                        }));
                    }
                }
            }
        }
        messages.push(EvaluatedMessage { role: message.role.clone(), parts });
    }

    EvaluatedResult { messages, diagnostics, opts }
}
