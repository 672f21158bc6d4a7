//! # Flemma
//!
//! The core runtime for a plain-text, line-oriented chat document format: parse it into a
//! structured AST, evaluate its `{{...}}` expressions and frontmatter in a sandboxed language,
//! fold the result into a provider-agnostic prompt, and drive the autopilot/approval machinery
//! that automates the "respond → execute tools → resend" loop.
//!
//! ## Design principles
//!
//! - **Tolerant parsing**: the parser never fails outright; structural anomalies become
//!   diagnostics attached to the document rather than thrown errors.
//! - **Sandboxed evaluation**: `{{...}}` expressions and frontmatter code run in a fixed,
//!   enumerated environment (see [`eval`]) — there is no way to reach outside it except through
//!   the `include()` host function, and that only performs small local file reads.
//! - **Single-threaded cooperative concurrency**: components never recurse inline; deferred work
//!   goes through [`state::Scheduler`] so state machines stay totally ordered within one
//!   event-loop turn.
//!
//! ## Main modules
//!
//! - [`ast`]: [`ast::Document`], [`ast::Message`], [`ast::Segment`], [`ast::Diagnostic`],
//!   [`ast::GenericPart`] — the document data model and the evaluated/generic-part conversions.
//! - [`parser`]: [`parser::parse`], [`parser::AstCache`] — raw text to [`ast::Document`].
//! - [`codeblock`]: [`codeblock::CodeblockRegistry`] — pluggable fenced-code-block languages
//!   (`json`, `eval`) used for frontmatter and tool payloads.
//! - [`context`]: [`context::Context`], [`context::ResolvedOpts`] — per-document evaluation
//!   context, copy-on-extend.
//! - [`eval`]: [`eval::eval_expression`], [`eval::eval_frontmatter`] — the sandboxed expression
//!   evaluator and its `include()` host function.
//! - [`processor`]: [`processor::evaluate`] — AST to evaluated messages.
//! - [`pipeline`]: [`pipeline::run`] — evaluated messages to a canonical [`pipeline::Prompt`].
//! - [`sink`]: [`sink::Sink`] — the lazy, line-framed streaming accumulator.
//! - [`autopilot`]: [`autopilot::AutopilotState`], [`autopilot::on_response_complete`],
//!   [`autopilot::on_tools_complete`] — the respond/tools/resend state machine.
//! - [`approval`]: [`approval::ApprovalChain`] — the priority-ordered tool approval resolver.
//! - [`state`]: [`state::State`], [`state::DocumentState`], [`state::Scheduler`] — process-wide
//!   and per-document runtime state.
//! - [`notify`]: [`notify::NotificationQueue`] — per-document, visibility-deferred notifications.
//! - [`error`]: [`error::FlemmaError`].

pub mod approval;
pub mod ast;
pub mod autopilot;
pub mod codeblock;
pub mod context;
pub mod error;
pub mod eval;
pub mod notify;
pub mod parser;
pub mod pipeline;
pub mod processor;
pub mod sink;
pub mod state;

pub use approval::{ApprovalChain, Decision};
pub use ast::{Diagnostic, DiagnosticType, Document, GenericPart, Message, Role, Segment, Severity};
pub use autopilot::AutopilotState;
pub use codeblock::CodeblockRegistry;
pub use context::{AutoApprove, Context, ResolvedOpts};
pub use error::FlemmaError;
pub use notify::{Notification, NotificationLevel, NotificationQueue};
pub use pipeline::Prompt;
pub use sink::Sink;
pub use state::{Config, DocumentState, ImmediateScheduler, Scheduler, State, TokioScheduler};

/// When running `cargo test -p flemma`, initializes tracing from `RUST_LOG` so that unit tests
/// can print logs with `--nocapture`.
#[cfg(test)]
mod test_logging {
    use ctor::ctor;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::Layer;

    #[ctor]
    fn init() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_test_writer().with_filter(filter))
            .try_init();
    }
}
