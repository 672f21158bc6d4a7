//! Autopilot (§4.8): the per-document state machine driving "respond → tools → resend".
//!
//! Transitions to `Armed` or `Sending` never call the follow-up step inline; they hand it to a
//! [`Scheduler`](crate::state::Scheduler) so the state machine never recurses within one
//! event-loop turn (§5).

use crate::ast::{Document, Segment};
use crate::state::Scheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Armed,
    Sending,
    Paused,
}

impl Default for State {
    fn default() -> Self {
        State::Idle
    }
}

/// `{state, iteration}` per document, per §4.8.
#[derive(Debug, Clone, Default)]
pub struct AutopilotState {
    pub state: State,
    pub iteration: u32,
}

fn last_assistant_has_tool_use(doc: &Document) -> bool {
    doc.messages
        .iter()
        .rev()
        .find(|m| m.role == crate::ast::Role::Assistant)
        .is_some_and(|m| m.segments.iter().any(|s| matches!(s, Segment::ToolUse { .. })))
}

fn has_unresolved_tool_use(doc: &Document) -> bool {
    let mut used = std::collections::HashSet::new();
    let mut resolved = std::collections::HashSet::new();
    for message in &doc.messages {
        used.extend(message.tool_use_ids());
        resolved.extend(message.resolved_tool_result_ids());
    }
    used.iter().any(|id| !resolved.contains(id))
}

fn has_placeholder_tool_result(doc: &Document) -> bool {
    doc.messages
        .iter()
        .flat_map(|m| &m.segments)
        .any(|s| s.is_unresolved_tool_result())
}

/// Resolves whether autopilot is enabled for a document: frontmatter opt overrides the global
/// config default (§4.8.1).
pub fn is_enabled(frontmatter_opt: Option<bool>, config_default: bool) -> bool {
    frontmatter_opt.unwrap_or(config_default)
}

/// Called when the provider signals end-of-stream on an assistant message.
pub fn on_response_complete(
    autopilot: &mut AutopilotState,
    doc: &Document,
    enabled: bool,
    max_turns: u32,
    scheduler: &dyn Scheduler,
    mut notify_max_turns_exceeded: impl FnMut(u32),
    schedule_send_or_execute: impl FnOnce() + Send + 'static,
) {
    if !enabled {
        return;
    }
    if !last_assistant_has_tool_use(doc) {
        return;
    }

    autopilot.iteration += 1;
    if autopilot.iteration > max_turns {
        notify_max_turns_exceeded(max_turns);
        *autopilot = AutopilotState::default();
        return;
    }

    autopilot.state = State::Armed;
    scheduler.schedule(Box::new(schedule_send_or_execute));
}

/// Called when all pending tool executions for the document finish.
pub fn on_tools_complete(
    autopilot: &mut AutopilotState,
    doc: &Document,
    scheduler: &dyn Scheduler,
    schedule_send: impl FnOnce() + Send + 'static,
) {
    if autopilot.state != State::Armed {
        return;
    }
    if has_unresolved_tool_use(doc) {
        return;
    }
    if has_placeholder_tool_result(doc) {
        autopilot.state = State::Paused;
        return;
    }
    autopilot.state = State::Sending;
    scheduler.schedule(Box::new(schedule_send));
}

pub fn arm(autopilot: &mut AutopilotState) {
    autopilot.state = State::Armed;
}

pub fn disarm(autopilot: &mut AutopilotState) {
    *autopilot = AutopilotState::default();
}
