/// Errors raised by [`eval_expression`](super::eval_expression) and
/// [`eval_frontmatter`](super::eval_frontmatter).
#[derive(Debug, Clone, thiserror::Error)]
pub enum EvalError {
    #[error("{0}")]
    Eval(String),

    /// Raised by `include()`; the processor converts this into a `file` diagnostic carrying
    /// the segment's position.
    #[error("include '{filename}' failed: {error}")]
    Include { filename: String, raw: String, error: String },
}

impl From<evalexpr::EvalexprError> for EvalError {
    fn from(e: evalexpr::EvalexprError) -> Self {
        EvalError::Eval(e.to_string())
    }
}
