use std::collections::btree_map::{BTreeMap, Entry};

use csvgen_core::{AccessRule, MetadataTable, PermissionBlock, ResourceDescriptor, Result};
use metrics::counter;
use tracing::debug;

use crate::{GroupIndex, ManifestDraft};

/// Position of a rule inside a manifest's cluster permission blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleLocation {
    pub block: usize,
    pub rule: usize,
}

/// First rule (scanning blocks, then rules, in order) whose API groups contain `group`.
pub fn find_rule(blocks: &[PermissionBlock], group: &str) -> Option<RuleLocation> {
    blocks.iter().enumerate().find_map(|(block, b)| {
        b.rules.iter().position(|r| r.covers(group)).map(|rule| RuleLocation { block, rule })
    })
}

/// Output of [`RuleAccumulator::finish`].
#[derive(Debug, Clone)]
pub struct Accumulated {
    /// Drafts keyed by operator-group name.
    pub drafts: BTreeMap<String, ManifestDraft>,
    pub index: GroupIndex,
}

/// Streams resource descriptors into per-operator-group drafts, keeping one
/// auto-derived rule per API group.
pub struct RuleAccumulator<'m> {
    metadata: &'m MetadataTable,
    service_account: String,
    drafts: BTreeMap<String, ManifestDraft>,
    index: GroupIndex,
}

impl<'m> RuleAccumulator<'m> {
    /// `service_account` is bound to every cluster permission block created here.
    pub fn new(metadata: &'m MetadataTable, service_account: impl Into<String>) -> Self {
        Self { metadata, service_account: service_account.into(), drafts: BTreeMap::new(), index: GroupIndex::new() }
    }

    pub fn add(&mut self, d: &ResourceDescriptor) -> Result<()> {
        let draft = match self.drafts.entry(d.operator_group.clone()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                let metadata = self.metadata.require(&d.operator_group)?.clone();
                debug!(operator_group = %d.operator_group, "new manifest draft");
                e.insert(ManifestDraft::new(d.operator_group.clone(), metadata))
            }
        };
        self.index.insert(d);
        draft.owned.push(d.owned());

        match find_rule(&draft.cluster_permissions, &d.group) {
            Some(loc) => {
                let rule = &mut draft.cluster_permissions[loc.block].rules[loc.rule];
                for res in d.rule_resources() { rule.add_resource(&res); }
                counter!("csv_rules_merged_total", 1u64);
                debug!(group = %d.group, plural = %d.plural, block = loc.block, rule = loc.rule, "merged into existing rule");
            }
            None => {
                let mut rule = AccessRule::for_group(&d.group);
                for res in d.rule_resources() { rule.add_resource(&res); }
                let mut block = PermissionBlock::new(self.service_account.clone());
                block.rules.push(rule);
                draft.cluster_permissions.push(block);
                counter!("csv_rules_created_total", 1u64);
                debug!(group = %d.group, plural = %d.plural, "created rule");
            }
        }
        Ok(())
    }

    pub fn extend<'d>(&mut self, descriptors: impl IntoIterator<Item = &'d ResourceDescriptor>) -> Result<()> {
        for d in descriptors { self.add(d)?; }
        Ok(())
    }

    pub fn finish(self) -> Accumulated {
        Accumulated { drafts: self.drafts, index: self.index }
    }
}
