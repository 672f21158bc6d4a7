use serde_json::Value;

/// Auto-approve policy as resolved from frontmatter or config: either an explicit list of
/// tool names, or `all`/`none`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum AutoApprove {
    Names(Vec<String>),
    All(bool),
}

/// Per-document options resolved from frontmatter, per §4.8.1 and §6. Threaded through the
/// pipeline as an opaque record with a handful of well-known fields plus passthrough
/// provider-parameter overrides.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResolvedOpts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autopilot: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_approve: Option<AutoApprove>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<Value>,
    #[serde(flatten)]
    pub provider_params: serde_json::Map<String, Value>,
}

impl ResolvedOpts {
    /// Builds options from a frontmatter-evaluated JSON object, pulling well-known keys and
    /// leaving everything else as passthrough provider parameters.
    pub fn from_map(mut map: serde_json::Map<String, Value>) -> Self {
        let autopilot = map.remove("autopilot").and_then(|v| v.as_bool());
        let tools = map.remove("tools").and_then(|v| v.as_array().map(|arr| {
            arr.iter().filter_map(|e| e.as_str().map(str::to_string)).collect()
        }));
        let auto_approve = map.remove("auto_approve").and_then(|v| match v {
            Value::Bool(b) => Some(AutoApprove::All(b)),
            Value::Array(arr) => Some(AutoApprove::Names(
                arr.iter().filter_map(|e| e.as_str().map(str::to_string)).collect(),
            )),
            _ => None,
        });
        let sandbox = map.remove("sandbox");
        Self { autopilot, tools, auto_approve, sandbox, provider_params: map }
    }
}
