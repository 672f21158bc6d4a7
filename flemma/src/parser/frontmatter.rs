use super::fence;
use crate::ast::{Frontmatter, Span};

/// If `lines[0]` opens a fence with a language tag, scans forward for the matching close.
/// Returns `(frontmatter, body_start_idx)`. If line 1 isn't a tagged fence open, or the fence
/// never closes, there is no frontmatter and the whole input is the body (§4.3 step 1).
pub fn extract(lines: &[&str]) -> (Option<Frontmatter>, usize) {
    let Some(first) = lines.first() else {
        return (None, 0);
    };
    let Some(open) = fence::match_open(first) else {
        return (None, 0);
    };
    let Some(language) = open.language else {
        return (None, 0);
    };

    let mut idx = 1;
    while idx < lines.len() {
        if fence::match_close(lines[idx], open.ticks) {
            let content: Vec<&str> = lines[1..idx].to_vec();
            let frontmatter = Frontmatter {
                language,
                source: content.join("\n"),
                span: Span::new(1, idx + 1),
            };
            return (Some(frontmatter), idx + 1);
        }
        idx += 1;
    }
    (None, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_frontmatter_with_language_tag() {
        let lines = vec!["```json", "{\"a\":1}", "```", "@You: hi"];
        let (fm, body_start) = extract(&lines);
        let fm = fm.unwrap();
        assert_eq!(fm.language, "json");
        assert_eq!(fm.source, "{\"a\":1}");
        assert_eq!(fm.span, Span::new(1, 3));
        assert_eq!(body_start, 3);
    }

    #[test]
    fn no_frontmatter_when_first_line_is_plain_text() {
        let lines = vec!["@You: hi"];
        let (fm, body_start) = extract(&lines);
        assert!(fm.is_none());
        assert_eq!(body_start, 0);
    }

    #[test]
    fn unclosed_fence_yields_no_frontmatter() {
        let lines = vec!["```json", "{\"a\":1}"];
        let (fm, body_start) = extract(&lines);
        assert!(fm.is_none());
        assert_eq!(body_start, 0);
    }

    #[test]
    fn untagged_fence_is_not_frontmatter() {
        let lines = vec!["```", "plain", "```"];
        let (fm, body_start) = extract(&lines);
        assert!(fm.is_none());
        assert_eq!(body_start, 0);
    }
}
