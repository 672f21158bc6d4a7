/// An opening fence line: a run of backticks optionally followed by a language tag, and
/// nothing else on the line.
pub struct FenceOpen {
    pub ticks: usize,
    pub language: Option<String>,
}

/// Matches `^(`+)([\w:._-]*)\s*$`. Returns `None` if the line isn't a bare fence line.
pub fn match_open(line: &str) -> Option<FenceOpen> {
    let trimmed_end = line.trim_end();
    let ticks = trimmed_end.chars().take_while(|&c| c == '`').count();
    if ticks == 0 {
        return None;
    }
    let rest = &trimmed_end[ticks..];
    if rest.is_empty() {
        return Some(FenceOpen { ticks, language: None });
    }
    let is_tag_char = |c: char| c.is_alphanumeric() || matches!(c, '_' | ':' | '.' | '-');
    if rest.chars().all(is_tag_char) {
        Some(FenceOpen { ticks, language: Some(rest.to_string()) })
    } else {
        None
    }
}

/// Matches `^(`+)\s*$` with at least `min_ticks` backticks.
pub fn match_close(line: &str, min_ticks: usize) -> bool {
    let trimmed_end = line.trim_end();
    let ticks = trimmed_end.chars().take_while(|&c| c == '`').count();
    ticks >= min_ticks && trimmed_end.len() == ticks
}

pub struct FenceBlock {
    pub language: Option<String>,
    pub content: String,
    /// Index (within the scanned slice) of the closing fence line.
    pub close_idx: usize,
}

/// Parses a fenced block starting at `lines[start_idx]`. Returns `None` if `start_idx` is not
/// an opening fence line, or if no closing fence is found (caller emits the "unclosed"
/// diagnostic in that case, per §4.3).
pub fn parse_fence(lines: &[&str], start_idx: usize) -> Option<Result<FenceBlock, ()>> {
    let open = match_open(lines.get(start_idx)?)?;
    let mut body = Vec::new();
    let mut idx = start_idx + 1;
    while idx < lines.len() {
        if match_close(lines[idx], open.ticks) {
            return Some(Ok(FenceBlock {
                language: open.language,
                content: body.join("\n"),
                close_idx: idx,
            }));
        }
        body.push(lines[idx]);
        idx += 1;
    }
    Some(Err(()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_plain_triple_backtick_open() {
        let open = match_open("```").unwrap();
        assert_eq!(open.ticks, 3);
        assert_eq!(open.language, None);
    }

    #[test]
    fn matches_open_with_language() {
        let open = match_open("```json").unwrap();
        assert_eq!(open.ticks, 3);
        assert_eq!(open.language.as_deref(), Some("json"));
    }

    #[test]
    fn rejects_non_fence_lines() {
        assert!(match_open("hello world").is_none());
        assert!(match_open("``` not a tag!").is_none());
    }

    #[test]
    fn closing_fence_requires_at_least_opener_ticks() {
        assert!(match_close("```", 3));
        assert!(match_close("````", 3));
        assert!(!match_close("``", 3));
    }

    #[test]
    fn parses_simple_fenced_block() {
        let lines = vec!["```json", "{\"a\":1}", "```", "next"];
        let block = parse_fence(&lines, 0).unwrap().unwrap();
        assert_eq!(block.language.as_deref(), Some("json"));
        assert_eq!(block.content, "{\"a\":1}");
        assert_eq!(block.close_idx, 2);
    }

    #[test]
    fn unclosed_fence_is_an_error() {
        let lines = vec!["```json", "{\"a\":1}"];
        let result = parse_fence(&lines, 0).unwrap();
        assert!(result.is_err());
    }
}
