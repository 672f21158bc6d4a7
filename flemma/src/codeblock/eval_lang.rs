use crate::context::Context;
use crate::eval;
use serde_json::Value;

/// The evaluator-language codeblock parser: executes `code` as a sequence of assignments and
/// returns the resulting variable table, per §4.2 ("source code → table").
pub fn parse(code: &str, context: &Context) -> Result<Value, String> {
    let mut env = eval::build_environment(context);
    let map = eval::eval_frontmatter(code, &mut env).map_err(|e| e.to_string())?;
    Ok(Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_become_table_entries() {
        let ctx = Context::new(None);
        let v = parse("name = \"Ada\"", &ctx).unwrap();
        assert_eq!(v["name"], "Ada");
    }

    #[test]
    fn syntax_error_is_a_string_error_not_a_panic() {
        let ctx = Context::new(None);
        assert!(parse("name = ", &ctx).is_err());
    }
}
