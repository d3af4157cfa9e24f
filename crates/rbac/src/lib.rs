//! csvgen rbac: derive cluster permissions from custom resources and let
//! hand-written role fragments override them per API group.

#![forbid(unsafe_code)]

use csvgen_core::{GroupMetadata, OwnedResource, PermissionBlock};

mod accumulate;
mod index;
mod reconcile;

pub use accumulate::{find_rule, Accumulated, RuleAccumulator, RuleLocation};
pub use index::GroupIndex;
pub use reconcile::{strip_groups, OverrideReconciler};

/// Partially built manifest for one operator group. Created on the first
/// descriptor that targets the group and mutated until assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestDraft {
    pub name: String,
    pub metadata: GroupMetadata,
    pub owned: Vec<OwnedResource>,
    pub cluster_permissions: Vec<PermissionBlock>,
}

impl ManifestDraft {
    pub fn new(name: impl Into<String>, metadata: GroupMetadata) -> Self {
        Self { name: name.into(), metadata, owned: Vec::new(), cluster_permissions: Vec::new() }
    }

    /// Number of rules across every cluster permission block that mention `group`.
    pub fn rules_for(&self, group: &str) -> usize {
        self.cluster_permissions.iter().flat_map(|b| b.rules.iter()).filter(|r| r.covers(group)).count()
    }
}
