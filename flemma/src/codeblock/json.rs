use serde_json::Value;

/// Strict JSON parser: the default registration for tool-use inputs and any fenced block
/// tagged `json`.
pub fn parse(code: &str) -> Result<Value, String> {
    serde_json::from_str(code).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_object() {
        let v = parse(r#"{"cmd":"ls"}"#).unwrap();
        assert_eq!(v["cmd"], "ls");
    }

    #[test]
    fn invalid_json_is_an_error_not_a_panic() {
        assert!(parse("{not json").is_err());
    }
}
