use super::mime;
use super::value::{encode_include_err, encode_include_ok, json_to_eval};
use crate::context::Context;
use evalexpr::{Context as _, ContextWithMutableVariables, Function, HashMapContext, Value as EValue};
use std::path::PathBuf;

/// The "safe env": a fixed, enumerated set of bindings built from the document's context.
/// There is no way to reach outside this set from evaluated code; `include()` is the only
/// host function exposed, and it only performs small local reads rooted at the document's
/// directory.
pub struct Environment {
    pub(super) inner: HashMapContext,
}

fn resolve_include_path(dir: &Option<PathBuf>, path: &str) -> PathBuf {
    let p = std::path::Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        match dir {
            Some(d) => d.join(p),
            None => p.to_path_buf(),
        }
    }
}

fn do_include(dir: Option<PathBuf>, path: &str, mime_override: Option<&str>) -> EValue {
    let resolved = resolve_include_path(&dir, path);
    let raw = match mime_override {
        Some(m) => format!("include(\"{path}\", \"{m}\")"),
        None => format!("include(\"{path}\")"),
    };
    match std::fs::read(&resolved) {
        Ok(data) => {
            let detected = mime_override
                .map(str::to_string)
                .unwrap_or_else(|| mime::sniff(&resolved).to_string());
            encode_include_ok(&detected, &data, path)
        }
        Err(e) => encode_include_err(path, &raw, &e.to_string()),
    }
}

/// Builds the evaluator environment for one evaluation pass: binds scalar/array context
/// variables, `__filename`, `__dirname`, and the `include` host function.
pub fn build_environment(ctx: &Context) -> Environment {
    let mut inner = HashMapContext::new();

    if let Some(filename) = &ctx.filename {
        let _ = inner.set_value("__filename".to_string(), EValue::String(filename.clone()));
    }
    if let Some(dir) = ctx.dirname() {
        let _ = inner.set_value(
            "__dirname".to_string(),
            EValue::String(dir.to_string_lossy().into_owned()),
        );
    }

    for (name, value) in ctx.variables.iter() {
        if let Some(ev) = json_to_eval(value) {
            let _ = inner.set_value(name.clone(), ev);
        }
    }

    let dir = ctx.dirname();
    let include_fn = Function::new(move |argument| {
        let tuple = argument.as_tuple().unwrap_or_else(|_| vec![argument.clone()]);
        let path = tuple
            .first()
            .and_then(|v| v.as_string().ok())
            .ok_or_else(|| evalexpr::EvalexprError::expected_string(argument.clone()))?;
        let mime_override = tuple.get(1).and_then(|v| v.as_string().ok());
        Ok(do_include(dir.clone(), &path, mime_override.as_deref()))
    });
    let _ = inner.set_function("include".to_string(), include_fn);

    Environment { inner }
}
