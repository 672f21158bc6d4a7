//! Approval resolver chain (§4.9): a priority-ordered list of named policies deciding, per tool
//! call, whether it may run without user confirmation.

use crate::context::{AutoApprove, Context};
use crate::state::Config;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    RequireApproval,
    Deny,
}

type ResolverFn = dyn Fn(&str, &Value, &Context) -> Result<Option<Decision>, String> + Send + Sync;

struct Resolver {
    name: String,
    priority: i32,
    func: Arc<ResolverFn>,
}

/// Holds the registered resolvers and dispatches `resolve()` calls, per §4.9.
#[derive(Default)]
pub struct ApprovalChain {
    resolvers: Vec<Resolver>,
}

impl ApprovalChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces, if `name` is already registered) a named resolver.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        priority: i32,
        func: impl Fn(&str, &Value, &Context) -> Result<Option<Decision>, String> + Send + Sync + 'static,
    ) {
        let name = name.into();
        self.unregister(&name);
        self.resolvers.push(Resolver { name, priority, func: Arc::new(func) });
    }

    pub fn unregister(&mut self, name: &str) {
        self.resolvers.retain(|r| r.name != name);
    }

    /// Evaluates resolvers in descending priority (ties broken by name, ascending). The first
    /// non-nil result wins; if all return nil, the default is `require_approval`.
    pub fn resolve(&self, tool_name: &str, input: &Value, context: &Context) -> Decision {
        let mut ordered: Vec<&Resolver> = self.resolvers.iter().collect();
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)));

        for resolver in ordered {
            match (resolver.func)(tool_name, input, context) {
                Ok(Some(decision)) => return decision,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(resolver = %resolver.name, error = %e, "approval resolver failed; treating as nil");
                    continue;
                }
            }
        }
        Decision::RequireApproval
    }
}

fn apply_auto_approve_policy(policy: &AutoApprove, tool_name: &str) -> Option<Decision> {
    match policy {
        AutoApprove::All(true) => Some(Decision::Approve),
        AutoApprove::All(false) => None,
        AutoApprove::Names(names) => {
            names.iter().any(|n| n == tool_name).then_some(Decision::Approve)
        }
    }
}

/// Installs the three built-in resolvers from §4.9's table, reading policy from `config`.
pub fn install_builtins(chain: &mut ApprovalChain, config: &Config) {
    let config_policy = config.auto_approve.clone();
    chain.register("config:auto_approve", 100, move |tool_name, _input, _ctx| {
        Ok(config_policy.as_ref().and_then(|p| apply_auto_approve_policy(p, tool_name)))
    });

    chain.register("frontmatter:auto_approve", 90, |tool_name, _input, ctx| {
        Ok(ctx.opts.auto_approve.as_ref().and_then(|p| apply_auto_approve_policy(p, tool_name)))
    });

    if !config.require_approval {
        chain.register("config:catch_all_approve", 0, |_tool_name, _input, _ctx| {
            Ok(Some(Decision::Approve))
        });
    }
}
