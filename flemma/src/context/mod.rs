//! Per-document evaluation context: filename, user variables, and resolved options.
//!
//! Modeled as the spec's design notes prescribe: a structurally-shared, copy-on-extend record
//! rather than a deep-cloned plain map. `variables` and `opts` live behind an [`Arc`] so that
//! cloning a `Context` (cheap) and extending it (one shallow map clone, no value cloning beyond
//! that) keeps sibling evaluations isolated without paying for a full deep copy per expression.

mod resolved_opts;

pub use resolved_opts::{AutoApprove, ResolvedOpts};

use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Context {
    pub filename: Option<String>,
    pub variables: Arc<HashMap<String, Value>>,
    pub opts: Arc<ResolvedOpts>,
}

impl Context {
    pub fn new(filename: Option<String>) -> Self {
        Self { filename, variables: Arc::new(HashMap::new()), opts: Arc::new(ResolvedOpts::default()) }
    }

    pub fn dirname(&self) -> Option<PathBuf> {
        self.filename.as_ref().and_then(|f| {
            std::path::Path::new(f).parent().map(|p| {
                if p.as_os_str().is_empty() {
                    PathBuf::from(".")
                } else {
                    p.to_path_buf()
                }
            })
        })
    }

    /// Returns a new context with `additions` merged over the current variables. The current
    /// context is left untouched; sibling clones never observe each other's extensions.
    pub fn extended_with(&self, additions: HashMap<String, Value>) -> Self {
        let mut merged = (*self.variables).clone();
        merged.extend(additions);
        Self { filename: self.filename.clone(), variables: Arc::new(merged), opts: self.opts.clone() }
    }

    pub fn with_opts(&self, opts: ResolvedOpts) -> Self {
        Self { filename: self.filename.clone(), variables: self.variables.clone(), opts: Arc::new(opts) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extending_does_not_mutate_the_source_context() {
        let base = Context::new(Some("doc.md".to_string()));
        let mut additions = HashMap::new();
        additions.insert("name".to_string(), Value::String("Ada".to_string()));
        let extended = base.extended_with(additions);

        assert!(base.variables.is_empty());
        assert_eq!(extended.variables.get("name"), Some(&Value::String("Ada".to_string())));
    }

    #[test]
    fn dirname_derives_from_filename() {
        let ctx = Context::new(Some("notes/doc.md".to_string()));
        assert_eq!(ctx.dirname(), Some(PathBuf::from("notes")));
    }

    #[test]
    fn dirname_is_none_for_unnamed_document() {
        let ctx = Context::new(None);
        assert_eq!(ctx.dirname(), None);
    }
}
