//! Top-level error type for operations that span multiple core components.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlemmaError {
    #[error("evaluation error: {0}")]
    Eval(#[from] crate::eval::EvalError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(#[from] flemma_config::LoadError),
}
