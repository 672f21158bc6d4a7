use crate::context::AutoApprove;

/// Process-wide application config (distinct from `flemma-config`, which only loads XDG/.env
/// values into the process environment). Populated once at startup from the host's own settings
/// surface and handed to [`super::State`].
#[derive(Debug, Clone)]
pub struct Config {
    /// `tools.autopilot.enabled` default, overridable per document by frontmatter.
    pub autopilot_enabled: bool,
    pub max_turns: u32,
    /// `config:auto_approve` resolver policy (§4.9).
    pub auto_approve: Option<AutoApprove>,
    /// Installs `config:catch_all_approve` when `false`.
    pub require_approval: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { autopilot_enabled: true, max_turns: 25, auto_approve: None, require_approval: true }
    }
}
