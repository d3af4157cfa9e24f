use std::collections::{BTreeMap, BTreeSet};

use csvgen_core::ResourceDescriptor;

/// Resource descriptors grouped by API group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupIndex {
    by_group: BTreeMap<String, BTreeSet<ResourceDescriptor>>,
}

impl GroupIndex {
    pub fn new() -> Self { Self::default() }

    pub fn index<'a>(descriptors: impl IntoIterator<Item = &'a ResourceDescriptor>) -> Self {
        let mut idx = Self::new();
        for d in descriptors { idx.insert(d); }
        idx
    }

    pub fn insert(&mut self, d: &ResourceDescriptor) {
        self.by_group.entry(d.group.clone()).or_default().insert(d.clone());
    }

    /// API groups in lexical order.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.by_group.keys().map(|g| g.as_str())
    }

    pub fn len(&self) -> usize { self.by_group.len() }
    pub fn is_empty(&self) -> bool { self.by_group.is_empty() }
}
