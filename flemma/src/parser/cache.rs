use crate::ast::Document;

/// `{version, document}` per §3: the cached AST is valid iff `version` matches the document's
/// current change counter.
pub struct AstCache {
    pub version: u64,
    pub document: Document,
}

/// Returns the cached document iff `cache`'s version matches `current_version`; otherwise
/// parses fresh with `parse_fn` and replaces the cache entry (§4.3.3).
pub fn get_parsed_document<'a>(
    cache: &'a mut Option<AstCache>,
    current_version: u64,
    parse_fn: impl FnOnce() -> Document,
) -> &'a Document {
    let stale = !matches!(cache, Some(c) if c.version == current_version);
    if stale {
        *cache = Some(AstCache { version: current_version, document: parse_fn() });
    }
    &cache.as_ref().expect("just populated").document
}
