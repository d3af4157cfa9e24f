use csvgen_core::{PermissionBlock, RoleFragment};
use tracing::{debug, info};

use crate::{GroupIndex, ManifestDraft};

/// Removes every group in `groups` from the rules of `blocks`.
///
/// Rules left without API groups are dropped; blocks emptied by those drops are
/// dropped too. Everything else keeps its original order.
pub fn strip_groups(blocks: &[PermissionBlock], groups: &[&str]) -> Vec<PermissionBlock> {
    let mut emptied: Vec<usize> = Vec::new();
    let mut rebuilt: Vec<PermissionBlock> = Vec::with_capacity(blocks.len());
    for (i, block) in blocks.iter().enumerate() {
        let mut dropped = 0usize;
        let mut rules = Vec::with_capacity(block.rules.len());
        for rule in &block.rules {
            let mut kept = Some(rule.clone());
            for g in groups {
                kept = match kept {
                    Some(r) if r.covers(g) => r.without_group(g),
                    other => other,
                };
            }
            match kept {
                Some(r) => rules.push(r),
                None => dropped += 1,
            }
        }
        if dropped > 0 && rules.is_empty() { emptied.push(i); }
        rebuilt.push(PermissionBlock { service_account_name: block.service_account_name.clone(), rules });
    }
    rebuilt
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !emptied.contains(i))
        .map(|(_, b)| b)
        .collect()
}

/// Applies a hand-written cluster role fragment to a draft: any API group the
/// fragment names wins over the auto-derived rule for that group.
pub struct OverrideReconciler<'a> {
    fragment: &'a RoleFragment,
    service_account: &'a str,
}

impl<'a> OverrideReconciler<'a> {
    pub fn new(fragment: &'a RoleFragment, service_account: &'a str) -> Self {
        Self { fragment, service_account }
    }

    /// Known API groups that the fragment also covers. Groups that only appear in
    /// the fragment are not listed; their rules arrive with the fragment block.
    pub fn overridden_groups<'i>(&self, index: &'i GroupIndex) -> Vec<&'i str> {
        index.groups().filter(|g| self.fragment.covers(g)).collect()
    }

    /// Strips overridden groups from the draft's cluster permissions, then appends
    /// the fragment verbatim as one block bound to the service account.
    pub fn reconcile(&self, draft: &mut ManifestDraft, index: &GroupIndex) {
        let groups = self.overridden_groups(index);
        if !groups.is_empty() {
            let before = draft.cluster_permissions.len();
            draft.cluster_permissions = strip_groups(&draft.cluster_permissions, &groups);
            info!(
                manifest = %draft.name,
                groups = ?groups,
                blocks_removed = before - draft.cluster_permissions.len(),
                "cluster role fragment overrides generated rules"
            );
        }
        draft.cluster_permissions.push(self.fragment.bind(self.service_account));
        debug!(manifest = %draft.name, rules = self.fragment.rules.len(), "appended cluster role fragment");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csvgen_core::AccessRule;

    fn block(rules: Vec<AccessRule>) -> PermissionBlock {
        PermissionBlock { service_account_name: "gen".into(), rules }
    }

    fn rule(groups: &[&str], resources: &[&str]) -> AccessRule {
        let mut r = AccessRule::for_group(groups[0]);
        r.api_groups = groups.iter().map(|g| g.to_string()).collect();
        for res in resources { r.add_resource(res); }
        r
    }

    #[test]
    fn strip_drops_emptied_rules_and_blocks() {
        let blocks = vec![
            block(vec![rule(&["a.io"], &["foos"])]),
            block(vec![rule(&["b.io"], &["bars"]), rule(&["a.io", "c.io"], &["shared"])]),
            block(vec![rule(&["c.io"], &["cats"])]),
        ];
        let out = strip_groups(&blocks, &["a.io"]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].rules.len(), 2);
        assert_eq!(out[0].rules[0].api_groups, vec!["b.io"]);
        assert_eq!(out[0].rules[1].api_groups, vec!["c.io"]);
        assert_eq!(out[0].rules[1].resources, vec!["shared"]);
        assert_eq!(out[1].rules[0].resources, vec!["cats"]);
    }

    #[test]
    fn strip_multiple_groups_from_one_block() {
        let blocks = vec![block(vec![rule(&["a.io"], &["foos"]), rule(&["b.io"], &["bars"])])];
        assert!(strip_groups(&blocks, &["a.io", "b.io"]).is_empty());
        assert_eq!(strip_groups(&blocks, &["z.io"]), blocks);
    }

    #[test]
    fn untouched_empty_block_is_kept() {
        let blocks = vec![block(vec![]), block(vec![rule(&["a.io"], &["foos"])])];
        let out = strip_groups(&blocks, &["a.io"]);
        assert_eq!(out.len(), 1);
        assert!(out[0].rules.is_empty());
    }

    #[test]
    fn reconcile_appends_fragment_even_without_overlap() {
        let fragment = RoleFragment::new(vec![rule(&["other.io"], &["things"])]);
        let mut draft = ManifestDraft::new("op", Default::default());
        draft.cluster_permissions.push(block(vec![rule(&["a.io"], &["foos"])]));
        let index = GroupIndex::new();
        OverrideReconciler::new(&fragment, "sa1").reconcile(&mut draft, &index);
        assert_eq!(draft.cluster_permissions.len(), 2);
        assert_eq!(draft.cluster_permissions[1].service_account_name, "sa1");
        assert_eq!(draft.cluster_permissions[1].rules, fragment.rules);
        assert_eq!(draft.rules_for("a.io"), 1);
    }
}
