use super::{Diagnostic, DiagnosticType, EvaluatedPart, EvaluatedPartKind, Severity};
use base64::Engine;
use serde_json::Value;

/// The canonical representation a provider consumes, per §4.1.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenericPart {
    Text { text: String },
    Image { mime: String, data: String, data_url: String, filename: String },
    Pdf { mime: String, data: String, data_url: String, filename: String },
    TextFile { mime: String, text: String, filename: String },
    UnsupportedFile { filename: String },
    Thinking { content: String, signature: Option<String> },
    ToolUse { id: String, name: String, input: Value },
    ToolResult { tool_use_id: String, content: String, is_error: bool },
}

fn data_url(mime: &str, encoded: &str) -> String {
    format!("data:{mime};base64,{encoded}")
}

/// Converts a message's evaluated parts into the generic parts a provider transport consumes,
/// per the conversion rules in §4.1. `source_file` stamps every emitted diagnostic.
pub fn to_generic_parts(
    evaluated_parts: &[EvaluatedPart],
    source_file: Option<&str>,
) -> (Vec<GenericPart>, Vec<Diagnostic>) {
    let mut parts = Vec::with_capacity(evaluated_parts.len());
    let mut diagnostics = Vec::new();

    for part in evaluated_parts {
        match &part.kind {
            EvaluatedPartKind::Text(t) => {
                if !t.is_empty() {
                    parts.push(GenericPart::Text { text: t.clone() });
                }
            }
            EvaluatedPartKind::File { mime, data, filename } => {
                if mime.starts_with("image/") {
                    let encoded = base64::engine::general_purpose::STANDARD.encode(data);
                    let url = data_url(mime, &encoded);
                    parts.push(GenericPart::Image {
                        mime: mime.clone(),
                        data: encoded,
                        data_url: url,
                        filename: filename.clone(),
                    });
                } else if mime == "application/pdf" {
                    let encoded = base64::engine::general_purpose::STANDARD.encode(data);
                    let url = data_url(mime, &encoded);
                    parts.push(GenericPart::Pdf {
                        mime: mime.clone(),
                        data: encoded,
                        data_url: url,
                        filename: filename.clone(),
                    });
                } else if mime.starts_with("text/") {
                    let text = String::from_utf8_lossy(data).into_owned();
                    parts.push(GenericPart::TextFile {
                        mime: mime.clone(),
                        text,
                        filename: filename.clone(),
                    });
                } else {
                    parts.push(GenericPart::UnsupportedFile { filename: filename.clone() });
                    diagnostics.push(
                        Diagnostic::new(DiagnosticType::File, Severity::Warning)
                            .with_message(format!("unsupported file type: {mime}"))
                            .with_filename(filename.clone())
                            .with_source_file(source_file),
                    );
                }
            }
            EvaluatedPartKind::Thinking { content, signature, .. } => {
                parts.push(GenericPart::Thinking {
                    content: content.clone(),
                    signature: signature.clone(),
                });
            }
            EvaluatedPartKind::ToolUse { id, name, input } => {
                parts.push(GenericPart::ToolUse {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                });
            }
            EvaluatedPartKind::ToolResult { tool_use_id, content, is_error } => {
                parts.push(GenericPart::ToolResult {
                    tool_use_id: tool_use_id.clone(),
                    content: content.clone(),
                    is_error: *is_error,
                });
            }
        }
    }

    (parts, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_part_dropped_when_empty() {
        let parts = vec![EvaluatedPart::new(EvaluatedPartKind::Text(String::new()))];
        let (generic, diags) = to_generic_parts(&parts, None);
        assert!(generic.is_empty());
        assert!(diags.is_empty());
    }

    #[test]
    fn image_file_is_base64_encoded_with_data_url() {
        let parts = vec![EvaluatedPart::new(EvaluatedPartKind::File {
            mime: "image/png".into(),
            data: vec![1, 2, 3],
            filename: "a.png".into(),
        })];
        let (generic, diags) = to_generic_parts(&parts, None);
        assert!(diags.is_empty());
        match &generic[0] {
            GenericPart::Image { data_url, .. } => {
                assert!(data_url.starts_with("data:image/png;base64,"));
            }
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[test]
    fn text_file_is_not_encoded() {
        let parts = vec![EvaluatedPart::new(EvaluatedPartKind::File {
            mime: "text/plain".into(),
            data: b"hello".to_vec(),
            filename: "notes.txt".into(),
        })];
        let (generic, _) = to_generic_parts(&parts, None);
        match &generic[0] {
            GenericPart::TextFile { text, .. } => assert_eq!(text, "hello"),
            other => panic!("expected text_file, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_mime_emits_warning_diagnostic() {
        let parts = vec![EvaluatedPart::new(EvaluatedPartKind::File {
            mime: "application/octet-stream".into(),
            data: vec![],
            filename: "blob.bin".into(),
        })];
        let (generic, diags) = to_generic_parts(&parts, Some("doc.md"));
        assert!(matches!(generic[0], GenericPart::UnsupportedFile { .. }));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(diags[0].source_file.as_deref(), Some("doc.md"));
    }

    #[test]
    fn tool_use_and_tool_result_pass_through_verbatim() {
        let parts = vec![
            EvaluatedPart::new(EvaluatedPartKind::ToolUse {
                id: "t_1".into(),
                name: "bash".into(),
                input: serde_json::json!({"cmd": "ls"}),
            }),
            EvaluatedPart::new(EvaluatedPartKind::ToolResult {
                tool_use_id: "t_1".into(),
                content: "a\nb".into(),
                is_error: false,
            }),
        ];
        let (generic, _) = to_generic_parts(&parts, None);
        assert_eq!(generic.len(), 2);
        assert!(matches!(generic[0], GenericPart::ToolUse { .. }));
        assert!(matches!(generic[1], GenericPart::ToolResult { .. }));
    }
}
