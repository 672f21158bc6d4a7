//! Sandboxed evaluator for inline `{{…}}` expressions and frontmatter code (§4.4).
//!
//! The environment is a fixed, enumerated set of bindings (`include`, `__filename`,
//! `__dirname`, user-defined variables) built fresh for every evaluation pass by
//! [`environment::build_environment`]. There is no mechanism for evaluated code to reach
//! anything outside that set.

mod environment;
mod error;
mod mime;
mod value;

pub use environment::{build_environment, Environment};
pub use error::EvalError;
pub use value::{eval_to_json, EvalOutcome, FileInclude, IncludeFailure};

use evalexpr::IterateVariablesContext;

/// Evaluates one `{{code}}` expression. Never panics; evaluation failures surface as
/// [`EvalError::Eval`], and `include()` failures as [`EvalError::Include`].
pub fn eval_expression(code: &str, env: &Environment) -> Result<EvalOutcome, EvalError> {
    let result = evalexpr::eval_with_context(code, &env.inner)?;
    match value::decode_outcome(result) {
        value::EvalOutcome::FileError(f) => Err(EvalError::Include {
            filename: f.filename,
            raw: f.raw,
            error: f.error,
        }),
        other => Ok(other),
    }
}

/// Runs frontmatter source code and returns the resulting key-value map, per §4.4: "frontmatter
/// execution produces a key→value map that is merged into the context's variables." Any
/// variable assigned during execution becomes one entry in the returned map; `__filename` and
/// `__dirname` (pre-seeded bindings) are excluded since they are not user-authored.
pub fn eval_frontmatter(
    code: &str,
    env: &mut Environment,
) -> Result<serde_json::Map<String, serde_json::Value>, EvalError> {
    evalexpr::eval_empty_with_context_mut(code, &mut env.inner)?;

    let mut map = serde_json::Map::new();
    for (name, val) in env.inner.iter_variables() {
        if name == "__filename" || name == "__dirname" {
            continue;
        }
        map.insert(name, value::eval_to_json(val));
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    #[test]
    fn evaluates_arithmetic() {
        let ctx = Context::new(None);
        let env = build_environment(&ctx);
        let outcome = eval_expression("1 + 2", &env).unwrap();
        assert_eq!(outcome, EvalOutcome::Scalar(serde_json::json!(3)));
    }

    #[test]
    fn evaluates_bound_variable() {
        let mut vars = std::collections::HashMap::new();
        vars.insert("name".to_string(), serde_json::json!("Ada"));
        let ctx = Context::new(None).extended_with(vars);
        let env = build_environment(&ctx);
        let outcome = eval_expression("name", &env).unwrap();
        assert_eq!(outcome, EvalOutcome::Scalar(serde_json::json!("Ada")));
    }

    #[test]
    fn unknown_identifier_is_an_eval_error() {
        let ctx = Context::new(None);
        let env = build_environment(&ctx);
        assert!(eval_expression("nonexistent_var", &env).is_err());
    }

    #[test]
    fn include_missing_file_is_an_include_error() {
        let ctx = Context::new(Some("doc.md".to_string()));
        let env = build_environment(&ctx);
        let err = eval_expression("include((\"does-not-exist.txt\",))", &env).unwrap_err();
        match err {
            EvalError::Include { filename, .. } => assert_eq!(filename, "does-not-exist.txt"),
            other => panic!("expected Include error, got {other:?}"),
        }
    }

    #[test]
    fn include_reads_existing_text_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        let ctx = Context::new(Some(dir.path().join("doc.md").to_string_lossy().into_owned()));
        let env = build_environment(&ctx);
        let outcome = eval_expression("include((\"notes.txt\",))", &env).unwrap();
        match outcome {
            EvalOutcome::File(f) => {
                assert_eq!(f.mime, "text/plain");
                assert_eq!(f.data, b"hello");
            }
            other => panic!("expected File, got {other:?}"),
        }
    }

    #[test]
    fn frontmatter_eval_collects_assigned_variables() {
        let ctx = Context::new(None);
        let mut env = build_environment(&ctx);
        let map = eval_frontmatter("name = \"Ada\"; age = 30", &mut env).unwrap();
        assert_eq!(map.get("name"), Some(&serde_json::json!("Ada")));
        assert_eq!(map.get("age"), Some(&serde_json::json!(30)));
    }
}
