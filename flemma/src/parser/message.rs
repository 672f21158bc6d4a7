use super::fence;
use super::inline;
use crate::ast::{Diagnostic, DiagnosticType, Message, Position, Role, Segment, Span};
use crate::codeblock::CodeblockRegistry;
use crate::context::Context;

fn match_role_marker(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix('@')?;
    let end = rest.find(':')?;
    let tag = &rest[..end];
    if tag.is_empty() || !tag.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some((tag, &rest[end + 1..]))
}

fn match_thinking_open(line: &str) -> Option<(Option<String>, bool)> {
    let line = line.trim();
    if line == "<thinking>" {
        return Some((None, false));
    }
    let after = line.strip_prefix("<thinking")?;
    if !after.starts_with(char::is_whitespace) {
        return None;
    }
    let after = after.trim_start();
    let sig_marker = ":signature=\"";
    let colon_idx = after.find(sig_marker)?;
    let provider = &after[..colon_idx];
    if provider.is_empty() || !provider.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    let after_sig = &after[colon_idx + sig_marker.len()..];
    let quote_end = after_sig.find('"')?;
    let signature = after_sig[..quote_end].to_string();
    let tail = after_sig[quote_end + 1..].trim_start();
    match tail {
        ">" => Some((Some(signature), false)),
        "/>" => Some((Some(signature), true)),
        _ => None,
    }
}

fn match_thinking_close(line: &str) -> bool {
    line.trim() == "</thinking>"
}

fn match_tool_use_header(line: &str) -> Option<(String, String)> {
    let rest = line.trim().strip_prefix("**Tool Use:**")?.trim_start();
    let rest = rest.strip_prefix('`')?;
    let name_end = rest.find('`')?;
    let name = rest[..name_end].to_string();
    let rest = rest[name_end + 1..].trim_start();
    let rest = rest.strip_prefix('(')?;
    let rest = rest.strip_prefix('`')?;
    let id_end = rest.find('`')?;
    let id = rest[..id_end].to_string();
    let rest = rest[id_end + 1..].trim();
    (rest == ")").then_some((name, id))
}

fn match_tool_result_header(line: &str) -> Option<(String, bool)> {
    let rest = line.trim().strip_prefix("**Tool Result:**")?.trim_start();
    let rest = rest.strip_prefix('`')?;
    let id_end = rest.find('`')?;
    let id = rest[..id_end].to_string();
    let rest = rest[id_end + 1..].trim();
    match rest {
        "" => Some((id, false)),
        "(error)" => Some((id, true)),
        _ => None,
    }
}

/// Finds the index of the next line matching a role marker, or `lines.len()` (EOF).
fn next_marker(lines: &[&str], from: usize) -> usize {
    ((from)..lines.len()).find(|&k| match_role_marker(lines[k]).is_some()).unwrap_or(lines.len())
}

fn parse_assistant_segments(
    lines: &[&str],
    content_start: usize,
    end_idx: usize,
    first_line_text: &str,
    registry: &CodeblockRegistry,
    dummy_ctx: &Context,
) -> (Vec<Segment>, Vec<Diagnostic>) {
    let mut segments = Vec::new();
    let mut diagnostics = Vec::new();
    let mut text_buf: Vec<String> = Vec::new();
    let mut line_no = content_start;
    let mut idx = content_start;
    // virtual line array: first line is `first_line_text`, rest come from `lines[content_start+1..end_idx]`.
    let get_line = |i: usize| -> &str {
        if i == content_start {
            first_line_text
        } else {
            lines[i]
        }
    };

    macro_rules! flush_text {
        () => {
            if !text_buf.is_empty() {
                let joined = text_buf.join("\n");
                let start_col = 1;
                segments.extend(inline::scan(&joined, line_no - (text_buf.len() - 1), start_col));
                text_buf.clear();
            }
        };
    }

    while idx < end_idx {
        let raw = get_line(idx);

        if let Some((signature, self_closing)) = match_thinking_open(raw) {
            flush_text!();
            let pos = Position::new(idx + 1, 1);
            if self_closing {
                segments.push(Segment::Thinking { content: String::new(), position: pos, signature });
                idx += 1;
                line_no = idx;
                continue;
            }
            let mut body = Vec::new();
            let mut j = idx + 1;
            let mut closed = false;
            while j < end_idx {
                if match_thinking_close(get_line(j)) {
                    closed = true;
                    break;
                }
                body.push(get_line(j).to_string());
                j += 1;
            }
            let content = body.join("\n");
            segments.push(Segment::Thinking { content, position: pos, signature });
            idx = if closed { j + 1 } else { j };
            line_no = idx;
            continue;
        }

        if let Some((name, id)) = match_tool_use_header(raw) {
            flush_text!();
            let pos = Position::new(idx + 1, 1);
            let mut j = idx + 1;
            while j < end_idx && get_line(j).trim().is_empty() {
                j += 1;
            }
            if j >= end_idx {
                diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticType::ToolUse,
                        "tool use requires a fenced code block with JSON input",
                    )
                    .with_position(pos),
                );
                idx = end_idx;
                line_no = idx;
                continue;
            }
            let body_lines: Vec<&str> = (idx + 1..end_idx).map(get_line).collect();
            let rel = j - (idx + 1);
            match fence::parse_fence(&body_lines, rel) {
                Some(Ok(block)) => {
                    let language = block.language.unwrap_or_else(|| "json".to_string());
                    match registry.parse(&language, &block.content, dummy_ctx) {
                        Ok(value) => {
                            segments.push(Segment::ToolUse { id, name, input: value, position: pos });
                        }
                        Err(e) => {
                            diagnostics.push(
                                Diagnostic::warning(DiagnosticType::ToolUse, e)
                                    .with_position(pos)
                                    .with_language(language),
                            );
                        }
                    }
                    idx = idx + 1 + block.close_idx + 1;
                }
                _ => {
                    diagnostics.push(
                        Diagnostic::warning(DiagnosticType::ToolUse, "unclosed fenced code block")
                            .with_position(pos),
                    );
                    idx = end_idx;
                }
            }
            line_no = idx;
            continue;
        }

        text_buf.push(raw.to_string());
        idx += 1;
        line_no = idx;
    }
    flush_text!();

    (segments, diagnostics)
}

fn parse_you_segments(
    lines: &[&str],
    content_start: usize,
    end_idx: usize,
    first_line_text: &str,
    registry: &CodeblockRegistry,
    dummy_ctx: &Context,
) -> (Vec<Segment>, Vec<Diagnostic>) {
    let mut segments = Vec::new();
    let mut diagnostics = Vec::new();
    let mut text_buf: Vec<String> = Vec::new();
    let mut line_no = content_start;
    let mut idx = content_start;
    let get_line = |i: usize| -> &str {
        if i == content_start {
            first_line_text
        } else {
            lines[i]
        }
    };

    macro_rules! flush_text {
        () => {
            if !text_buf.is_empty() {
                let joined = text_buf.join("\n");
                segments.extend(inline::scan(&joined, line_no - (text_buf.len() - 1), 1));
                text_buf.clear();
            }
        };
    }

    while idx < end_idx {
        let raw = get_line(idx);

        if let Some((id, is_error)) = match_tool_result_header(raw) {
            flush_text!();
            let pos = Position::new(idx + 1, 1);
            let mut j = idx + 1;
            while j < end_idx && get_line(j).trim().is_empty() {
                j += 1;
            }
            if j >= end_idx {
                diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticType::ToolResult,
                        "tool result requires a fenced code block",
                    )
                    .with_position(pos),
                );
                idx = end_idx;
                line_no = idx;
                continue;
            }
            let body_lines: Vec<&str> = (idx + 1..end_idx).map(get_line).collect();
            let rel = j - (idx + 1);
            match fence::parse_fence(&body_lines, rel) {
                Some(Ok(block)) => {
                    let content = match &block.language {
                        Some(lang) => match registry.parse(lang, &block.content, dummy_ctx) {
                            Ok(v @ (serde_json::Value::Object(_) | serde_json::Value::Array(_))) => {
                                serde_json::to_string(&v).unwrap_or_else(|_| block.content.clone())
                            }
                            Ok(v) => v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()),
                            Err(e) => {
                                diagnostics.push(
                                    Diagnostic::warning(DiagnosticType::ToolResult, e)
                                        .with_position(pos)
                                        .with_language(lang.clone()),
                                );
                                block.content.clone()
                            }
                        },
                        None => block.content.clone(),
                    };
                    segments.push(Segment::ToolResult {
                        tool_use_id: id,
                        content,
                        is_error,
                        position: pos,
                        status: None,
                    });
                    idx = idx + 1 + block.close_idx + 1;
                }
                _ => {
                    diagnostics.push(
                        Diagnostic::warning(DiagnosticType::ToolResult, "unclosed fenced code block")
                            .with_position(pos),
                    );
                    idx = end_idx;
                }
            }
            line_no = idx;
            continue;
        }

        text_buf.push(raw.to_string());
        idx += 1;
        line_no = idx;
    }
    flush_text!();

    (segments, diagnostics)
}

/// Scans the body starting at `body_start` (0-based index into `lines`) into messages, per
/// §4.3 steps 2-3.
pub fn parse_messages(
    lines: &[&str],
    body_start: usize,
    registry: &CodeblockRegistry,
) -> (Vec<Message>, Vec<Diagnostic>) {
    let dummy_ctx = Context::new(None);
    let mut messages = Vec::new();
    let mut diagnostics = Vec::new();
    let mut i = body_start;

    while i < lines.len() {
        let Some((tag, rest)) = match_role_marker(lines[i]) else {
            i += 1;
            continue;
        };
        let role = Role::from_tag(tag);
        let end_idx = next_marker(lines, i + 1);
        let first_line_text = rest.trim_start();
        let span = Span::new(i + 1, end_idx.max(i + 1));

        let (segments, diags) = match role {
            Role::Assistant => parse_assistant_segments(
                lines, i, end_idx, first_line_text, registry, &dummy_ctx,
            ),
            Role::You => parse_you_segments(lines, i, end_idx, first_line_text, registry, &dummy_ctx),
            Role::System | Role::Other(_) => {
                let mut text_lines = vec![first_line_text.to_string()];
                text_lines.extend(lines[(i + 1)..end_idx].iter().map(|l| l.to_string()));
                let joined = text_lines.join("\n");
                (inline::scan(&joined, i + 1, 1), Vec::new())
            }
        };

        let mut message = Message::new(role, span);
        message.segments = segments;
        diagnostics.extend(diags);
        messages.push(message);
        i = end_idx;
    }

    (messages, diagnostics)
}
