//! Branch topology classification.

use std::sync::OnceLock;

use regex::Regex;

fn support_branch_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+\.[0-9]+\.x$").expect("support branch regex is valid"))
}

/// Where a branch sits in the repository topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchKind {
    /// The configured trunk (`master`).
    Trunk,
    /// A long-lived release line such as `4.2.x`.
    SupportBranch,
    /// Feature and pull-request branches.
    Transient,
}

impl BranchKind {
    /// Only transient branches are filtered by their change set; trunk and
    /// support branches receive reviewed merges and always run everything.
    pub fn uses_change_set(&self) -> bool {
        matches!(self, BranchKind::Transient)
    }
}

/// Classify `branch` against the configured trunk name.
///
/// Support branches are `MAJOR.MINOR.x` with ASCII digits only.
pub fn classify(branch: &str, trunk_name: &str) -> BranchKind {
    if branch == trunk_name {
        BranchKind::Trunk
    } else if support_branch_regex().is_match(branch) {
        BranchKind::SupportBranch
    } else {
        BranchKind::Transient
    }
}
