use super::{eval_lang, json, text};
use crate::context::Context;
use serde_json::Value;
use std::collections::HashMap;

/// A pluggable parser for a fenced code block, keyed by case-insensitive language tag.
/// Contract (§4.2): parsers must not perform I/O; parse errors return a diagnostic message,
/// never a panic.
pub trait CodeblockParser: Send + Sync {
    fn parse(&self, code: &str, context: &Context) -> Result<Value, String>;
}

struct JsonParser;
impl CodeblockParser for JsonParser {
    fn parse(&self, code: &str, _context: &Context) -> Result<Value, String> {
        json::parse(code)
    }
}

struct EvalLangParser;
impl CodeblockParser for EvalLangParser {
    fn parse(&self, code: &str, context: &Context) -> Result<Value, String> {
        eval_lang::parse(code, context)
    }
}

struct TextParser;
impl CodeblockParser for TextParser {
    fn parse(&self, code: &str, _context: &Context) -> Result<Value, String> {
        text::parse(code)
    }
}

/// Maps language tags to parsers. Queried by the parser for tool-use inputs (default `json`)
/// and tool-result bodies (tag from the fence), and by the processor for frontmatter.
pub struct CodeblockRegistry {
    parsers: HashMap<String, Box<dyn CodeblockParser>>,
}

impl CodeblockRegistry {
    /// Registry with the default registrations: `json`, the evaluator language, and plain `text`.
    pub fn with_defaults() -> Self {
        let mut registry = Self { parsers: HashMap::new() };
        registry.register("json", Box::new(JsonParser));
        registry.register("eval", Box::new(EvalLangParser));
        registry.register("text", Box::new(TextParser));
        registry
    }

    pub fn register(&mut self, language: &str, parser: Box<dyn CodeblockParser>) {
        self.parsers.insert(language.to_ascii_lowercase(), parser);
    }

    pub fn get(&self, language: &str) -> Option<&dyn CodeblockParser> {
        self.parsers.get(&language.to_ascii_lowercase()).map(|b| b.as_ref())
    }

    pub fn parse(&self, language: &str, code: &str, context: &Context) -> Result<Value, String> {
        match self.get(language) {
            Some(parser) => parser.parse(code, context),
            None => Err(format!("no codeblock parser registered for language '{language}'")),
        }
    }
}

impl Default for CodeblockRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
