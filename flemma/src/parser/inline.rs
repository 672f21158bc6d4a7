use crate::ast::{Position, Segment};

struct Cursor {
    line: usize,
    column: usize,
}

impl Cursor {
    fn advance(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

fn strip_trailing_punct(s: &str) -> (&str, &str) {
    let end = s
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_punctuation())
        .last()
        .map(|(i, _)| i);
    match end {
        Some(i) => (&s[..i], &s[i..]),
        None => (s, ""),
    }
}

struct FileRef {
    path: String,
    mime: Option<String>,
    trailing: String,
    /// Byte length of the raw `@...` token consumed from the source text.
    consumed: usize,
}

fn parse_file_ref(raw: &str) -> FileRef {
    let consumed = raw.len();
    if let Some(idx) = raw.find(";type=") {
        let path_part = &raw[..idx];
        let after = &raw[idx + ";type=".len()..];
        let (mime, trailing) = strip_trailing_punct(after);
        FileRef {
            path: path_part.to_string(),
            mime: Some(mime.to_string()),
            trailing: trailing.to_string(),
            consumed,
        }
    } else {
        let (path, trailing) = strip_trailing_punct(raw);
        FileRef { path: path.to_string(), mime: None, trailing: trailing.to_string(), consumed }
    }
}

/// True at byte offset `i` in `text` iff a file reference token (`@./...` or `@../...`) starts
/// there.
fn is_file_ref_start(text: &str, i: usize) -> bool {
    let rest = &text[i..];
    rest.starts_with("@./") || rest.starts_with("@../")
}

fn escape_double_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Scans a text buffer for `{{...}}` expressions and file references, per §4.3.2. Produces
/// text and expression segments; at each position the earliest match of the two kinds wins,
/// and any text preceding a match is emitted as its own text segment.
pub fn scan(text: &str, start_line: usize, start_column: usize) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = Cursor { line: start_line, column: start_column };
    let mut rest = text;

    loop {
        if rest.is_empty() {
            break;
        }

        let expr_at = rest.find("{{");
        let file_at = (0..rest.len())
            .find(|&i| rest.is_char_boundary(i) && rest.as_bytes()[i] == b'@' && is_file_ref_start(rest, i));

        let next = match (expr_at, file_at) {
            (Some(e), Some(f)) => {
                if e <= f {
                    Some((e, true))
                } else {
                    Some((f, false))
                }
            }
            (Some(e), None) => Some((e, true)),
            (None, Some(f)) => Some((f, false)),
            (None, None) => None,
        };

        let Some((idx, is_expr)) = next else {
            if !rest.is_empty() {
                segments.push(Segment::Text(rest.to_string()));
            }
            break;
        };

        if idx > 0 {
            segments.push(Segment::Text(rest[..idx].to_string()));
            cursor.advance(&rest[..idx]);
        }
        rest = &rest[idx..];

        if is_expr {
            match rest[2..].find("}}") {
                Some(close_rel) => {
                    let code = rest[2..2 + close_rel].to_string();
                    let pos = cursor.position();
                    let consumed = 2 + close_rel + 2;
                    segments.push(Segment::Expression { code, position: pos });
                    cursor.advance(&rest[..consumed]);
                    rest = &rest[consumed..];
                }
                None => {
                    // Unterminated `{{`: treat the rest of the buffer as text, mirroring the
                    // parser's tolerant-diagnostics-over-panics policy.
                    segments.push(Segment::Text(rest.to_string()));
                    break;
                }
            }
        } else {
            let token_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let token = &rest[..token_end];
            let file_ref = parse_file_ref(token);
            let escaped = escape_double_quotes(&file_ref.path);
            let code = match &file_ref.mime {
                Some(mime) => {
                    let mime = escape_double_quotes(mime);
                    format!("include((\"{escaped}\", \"{mime}\"))")
                }
                None => format!("include((\"{escaped}\",))"),
            };
            let pos = cursor.position();
            segments.push(Segment::Expression { code, position: pos });
            cursor.advance(&rest[..file_ref.consumed]);
            if !file_ref.trailing.is_empty() {
                segments.push(Segment::Text(file_ref.trailing.clone()));
            }
            rest = &rest[file_ref.consumed..];
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_single_segment() {
        let segs = scan("hello world", 1, 1);
        assert_eq!(segs, vec![Segment::Text("hello world".to_string())]);
    }

    #[test]
    fn expression_is_extracted() {
        let segs = scan("Hi {{name}}!", 1, 1);
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[0], Segment::Text("Hi ".to_string()));
        match &segs[1] {
            Segment::Expression { code, .. } => assert_eq!(code, "name"),
            other => panic!("expected expression, got {other:?}"),
        }
        assert_eq!(segs[2], Segment::Text("!".to_string()));
    }

    #[test]
    fn multiline_expression_is_matched_non_greedy() {
        let segs = scan("{{a\nb}} and {{c}}", 1, 1);
        let exprs: Vec<&str> = segs
            .iter()
            .filter_map(|s| match s {
                Segment::Expression { code, .. } => Some(code.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(exprs, vec!["a\nb", "c"]);
    }

    #[test]
    fn file_reference_with_trailing_punctuation() {
        let segs = scan("See @./notes.txt.", 1, 1);
        assert_eq!(segs.len(), 2);
        match &segs[0] {
            Segment::Text(t) => assert_eq!(t, "See "),
            other => panic!("{other:?}"),
        }
        match &segs[1] {
            Segment::Expression { code, .. } => {
                assert_eq!(code, "include((\"./notes.txt\",))");
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn file_reference_trailing_text_segment_follows() {
        let segs = scan("@./notes.txt.", 1, 1);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[1], Segment::Text(".".to_string()));
    }

    #[test]
    fn file_reference_with_mime_override() {
        let segs = scan("@./a.bin;type=application/octet-stream", 1, 1);
        match &segs[0] {
            Segment::Expression { code, .. } => {
                assert!(code.contains("\"application/octet-stream\""));
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn earliest_match_of_the_two_kinds_wins() {
        let segs = scan("{{x}} @./a.txt", 1, 1);
        assert!(matches!(segs[0], Segment::Expression { .. }));
    }
}
