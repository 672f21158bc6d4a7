//! Process-wide and per-document state (§3, §5).
//!
//! Scheduling is single-threaded cooperative: every component that needs to defer work to the
//! next event-loop turn takes a [`Scheduler`] rather than recursing inline. Per-document state is
//! keyed by document id in a [`DashMap`](dashmap::DashMap); because the host is single-threaded,
//! no further locking is needed once an entry is fetched.

mod config;
mod session;

pub use config::Config;
pub use session::{RequestRecord, Session};

use crate::approval::{self, ApprovalChain};
use crate::autopilot::AutopilotState;
use crate::codeblock::CodeblockRegistry;
use crate::error::FlemmaError;
use crate::parser::AstCache;
use dashmap::DashMap;
use std::path::Path;
use std::sync::Arc;

/// Defers a closure to the next event-loop tick, per §5's `schedule(fn)` vocabulary. Guarantees
/// that state-machine transitions (autopilot, sink batching) never recurse within one turn.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, job: Box<dyn FnOnce() + Send>);
}

/// Runs the job on a fresh tokio task — the production scheduler. Satisfies "never recurse
/// inline" by handing the closure to the runtime instead of calling it in place.
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, job: Box<dyn FnOnce() + Send>) {
        tokio::task::spawn_blocking(job);
    }
}

/// Runs the job immediately, in place. Only for tests where ordering must be deterministic and
/// there's no real event loop to yield to.
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    fn schedule(&self, job: Box<dyn FnOnce() + Send>) {
        job();
    }
}

/// Per-document runtime state: in-flight request bookkeeping, the parsed-AST cache, and the
/// autopilot state machine.
#[derive(Default)]
pub struct DocumentState {
    pub current_request_id: Option<String>,
    pub request_cancelled: bool,
    pub inflight_usage: Option<RequestRecord>,
    pub locked: bool,
    pub waiting_for_tools: bool,
    pub ast_cache: Option<AstCache>,
    pub autopilot: AutopilotState,
}

impl DocumentState {
    pub fn lock_buffer(&mut self) {
        self.locked = true;
    }

    pub fn unlock_buffer(&mut self) {
        self.locked = false;
    }

    /// Cancels the in-flight request and drops autopilot back to idle, per §5's cancellation
    /// rule.
    pub fn cancel(&mut self) {
        self.request_cancelled = true;
        self.autopilot = AutopilotState::default();
    }
}

/// Process-wide state: owned by the host, holds the config, the session ledger, and every
/// open document's per-document state. Mutation is confined to explicit setters called from the
/// event loop; there is no preemption.
pub struct State {
    pub config: Arc<Config>,
    pub session: Session,
    pub codeblocks: Arc<CodeblockRegistry>,
    pub approvals: Arc<ApprovalChain>,
    documents: DashMap<String, DocumentState>,
}

impl State {
    pub fn new(config: Arc<Config>) -> Self {
        let mut approvals = ApprovalChain::new();
        approval::install_builtins(&mut approvals, &config);
        Self {
            config,
            session: Session::default(),
            codeblocks: Arc::new(CodeblockRegistry::with_defaults()),
            approvals: Arc::new(approvals),
            documents: DashMap::new(),
        }
    }

    /// Process startup: loads XDG/.env configuration into the environment, then builds a
    /// ready-to-use `State` with the built-in codeblock parsers and approval resolvers
    /// registered. Initialization order: load config → register codeblock parsers → register
    /// approval resolvers → ready.
    pub fn bootstrap(config: Arc<Config>, override_dir: Option<&Path>) -> Result<Self, FlemmaError> {
        flemma_config::load_and_apply("flemma", override_dir)?;
        Ok(Self::new(config))
    }

    /// Returns the document's state, creating a default entry on first access.
    pub fn document(&self, doc_id: &str) -> dashmap::mapref::one::RefMut<'_, String, DocumentState> {
        self.documents.entry(doc_id.to_string()).or_default()
    }

    pub fn has_document(&self, doc_id: &str) -> bool {
        self.documents.contains_key(doc_id)
    }

    /// Tears down a closed document's timers, jobs, and notification queues deterministically.
    pub fn close_document(&self, doc_id: &str) {
        self.documents.remove(doc_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_state_is_created_lazily_on_first_access() {
        let state = State::new(Arc::new(Config::default()));
        assert!(!state.has_document("doc-1"));
        let _ = state.document("doc-1");
        assert!(state.has_document("doc-1"));
    }

    #[test]
    fn close_document_removes_its_state() {
        let state = State::new(Arc::new(Config::default()));
        let _ = state.document("doc-1");
        state.close_document("doc-1");
        assert!(!state.has_document("doc-1"));
    }

    #[test]
    fn cancel_unsets_autopilot_and_sets_cancelled_flag() {
        let mut doc = DocumentState::default();
        doc.autopilot = AutopilotState { iteration: 3, ..Default::default() };
        doc.cancel();
        assert!(doc.request_cancelled);
        assert_eq!(doc.autopilot.iteration, 0);
    }

    #[test]
    fn new_installs_default_codeblock_parsers_and_approval_resolvers() {
        let state = State::new(Arc::new(Config::default()));
        assert!(state.codeblocks.get("json").is_some());
        assert!(state.codeblocks.get("eval").is_some());
        assert!(state.codeblocks.get("text").is_some());
    }

    #[test]
    fn bootstrap_loads_config_then_builds_a_ready_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = State::bootstrap(Arc::new(Config::default()), Some(dir.path())).unwrap();
        assert!(state.codeblocks.get("json").is_some());
        assert!(!state.has_document("doc-1"));
    }

    #[test]
    fn immediate_scheduler_runs_synchronously() {
        let flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag_clone = flag.clone();
        ImmediateScheduler.schedule(Box::new(move || {
            flag_clone.store(true, std::sync::atomic::Ordering::SeqCst);
        }));
        assert!(flag.load(std::sync::atomic::Ordering::SeqCst));
    }
}
