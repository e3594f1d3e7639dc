#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What to do with a dependency edge that would close a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum CyclePolicy {
    /// Skip the edge and keep projecting.
    #[default]
    Drop,
    /// Fail the sentence with `ProjectionError::Cycle`.
    Raise,
}

/// Placement of target words no link reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum OrphanPolicy {
    /// Leave them out of the projected tree.
    #[default]
    Discard,
    /// Hang them as leaves directly under the root.
    AttachToRoot,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProjectionConfig {
    /// Minimum fraction of aligned source words; `0.0` disables the check.
    pub completeness_requirement: f64,
    pub cycle_policy: CyclePolicy,
    pub orphan_policy: OrphanPolicy,
    /// Reject dependency projections with more than one root-attached word.
    pub require_single_root: bool,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            completeness_requirement: 0.0,
            cycle_policy: CyclePolicy::Drop,
            orphan_policy: OrphanPolicy::Discard,
            require_single_root: false,
        }
    }
}

impl ProjectionConfig {
    pub fn with_completeness(mut self, requirement: f64) -> Self {
        self.completeness_requirement = requirement;
        self
    }

    pub fn with_cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.cycle_policy = policy;
        self
    }

    pub fn with_orphan_policy(mut self, policy: OrphanPolicy) -> Self {
        self.orphan_policy = policy;
        self
    }

    pub fn with_single_root(mut self, required: bool) -> Self {
        self.require_single_root = required;
        self
    }
}
