use evalexpr::Value as EValue;
use serde_json::Value as JValue;

/// A successfully materialized `include()` result, ready for the processor's emit step.
#[derive(Debug, Clone, PartialEq)]
pub struct FileInclude {
    pub mime: String,
    pub data: Vec<u8>,
    pub filename: String,
}

/// An `include()` failure, carrying the context the processor needs to build a `file`
/// diagnostic (§4.4).
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeFailure {
    pub filename: String,
    pub raw: String,
    pub error: String,
}

/// What a single evaluated expression produced.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalOutcome {
    Scalar(JValue),
    File(FileInclude),
    FileError(IncludeFailure),
}

const INCLUDE_OK_TAG: &str = "__flemma_include_ok__";
const INCLUDE_ERR_TAG: &str = "__flemma_include_err__";

pub(super) fn encode_include_ok(mime: &str, data: &[u8], filename: &str) -> EValue {
    use base64::Engine;
    let encoded = base64::engine::general_purpose::STANDARD.encode(data);
    EValue::Tuple(vec![
        EValue::String(INCLUDE_OK_TAG.to_string()),
        EValue::String(mime.to_string()),
        EValue::String(encoded),
        EValue::String(filename.to_string()),
    ])
}

pub(super) fn encode_include_err(filename: &str, raw: &str, error: &str) -> EValue {
    EValue::Tuple(vec![
        EValue::String(INCLUDE_ERR_TAG.to_string()),
        EValue::String(filename.to_string()),
        EValue::String(raw.to_string()),
        EValue::String(error.to_string()),
    ])
}

/// Decodes the sentinel tuple produced by the `include()` host function, or falls back to a
/// plain scalar conversion for every other evaluation result.
pub(super) fn decode_outcome(value: EValue) -> EvalOutcome {
    if let EValue::Tuple(ref items) = value {
        if items.len() == 4 {
            if let EValue::String(tag) = &items[0] {
                if tag == INCLUDE_OK_TAG {
                    if let (EValue::String(mime), EValue::String(b64), EValue::String(filename)) =
                        (&items[1], &items[2], &items[3])
                    {
                        use base64::Engine;
                        if let Ok(data) = base64::engine::general_purpose::STANDARD.decode(b64) {
                            return EvalOutcome::File(FileInclude {
                                mime: mime.clone(),
                                data,
                                filename: filename.clone(),
                            });
                        }
                    }
                } else if tag == INCLUDE_ERR_TAG {
                    if let (EValue::String(filename), EValue::String(raw), EValue::String(error)) =
                        (&items[1], &items[2], &items[3])
                    {
                        return EvalOutcome::FileError(IncludeFailure {
                            filename: filename.clone(),
                            raw: raw.clone(),
                            error: error.clone(),
                        });
                    }
                }
            }
        }
    }
    EvalOutcome::Scalar(eval_to_json(value))
}

/// Converts an evalexpr scalar/tuple into its JSON equivalent for stringification.
pub fn eval_to_json(value: EValue) -> JValue {
    match value {
        EValue::String(s) => JValue::String(s),
        EValue::Float(f) => serde_json::Number::from_f64(f)
            .map(JValue::Number)
            .unwrap_or(JValue::Null),
        EValue::Int(i) => JValue::Number(i.into()),
        EValue::Boolean(b) => JValue::Bool(b),
        EValue::Tuple(items) => JValue::Array(items.into_iter().map(eval_to_json).collect()),
        EValue::Empty => JValue::Null,
    }
}

/// Converts a JSON scalar into an evalexpr value for binding into the evaluator context.
/// Arrays of scalars become tuples; objects and nested arrays are not bound (the expression
/// language only exposes scalar and flat-array context variables, see `eval::environment`).
pub fn json_to_eval(value: &JValue) -> Option<EValue> {
    match value {
        JValue::Null => Some(EValue::Empty),
        JValue::Bool(b) => Some(EValue::Boolean(*b)),
        JValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(EValue::Int(i))
            } else {
                n.as_f64().map(EValue::Float)
            }
        }
        JValue::String(s) => Some(EValue::String(s.clone())),
        JValue::Array(items) => {
            let converted: Option<Vec<EValue>> = items.iter().map(json_to_eval).collect();
            converted.map(EValue::Tuple)
        }
        JValue::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_ok_round_trips_through_sentinel() {
        let encoded = encode_include_ok("text/plain", b"hi", "a.txt");
        match decode_outcome(encoded) {
            EvalOutcome::File(f) => {
                assert_eq!(f.mime, "text/plain");
                assert_eq!(f.data, b"hi");
                assert_eq!(f.filename, "a.txt");
            }
            other => panic!("expected File, got {other:?}"),
        }
    }

    #[test]
    fn include_err_round_trips_through_sentinel() {
        let encoded = encode_include_err("missing.txt", "include('missing.txt')", "not found");
        match decode_outcome(encoded) {
            EvalOutcome::FileError(f) => {
                assert_eq!(f.filename, "missing.txt");
                assert_eq!(f.error, "not found");
            }
            other => panic!("expected FileError, got {other:?}"),
        }
    }

    #[test]
    fn plain_tuple_is_not_mistaken_for_a_sentinel() {
        let v = EValue::Tuple(vec![EValue::Int(1), EValue::Int(2), EValue::Int(3), EValue::Int(4)]);
        assert!(matches!(decode_outcome(v), EvalOutcome::Scalar(_)));
    }

    #[test]
    fn scalar_conversion_round_trips() {
        assert_eq!(eval_to_json(EValue::String("hi".into())), JValue::String("hi".into()));
        assert_eq!(eval_to_json(EValue::Int(5)), JValue::Number(5.into()));
        assert_eq!(eval_to_json(EValue::Boolean(true)), JValue::Bool(true));
    }

    #[test]
    fn object_is_not_bindable() {
        let v = serde_json::json!({"a": 1});
        assert!(json_to_eval(&v).is_none());
    }
}
