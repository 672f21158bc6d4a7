//! Pluggable parsers for fenced code blocks, keyed by language tag (§4.2).

mod eval_lang;
mod json;
mod registry;
mod text;

pub use registry::{CodeblockParser, CodeblockRegistry};
