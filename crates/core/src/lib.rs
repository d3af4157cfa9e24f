//! csvgen core types: resource descriptors, group metadata, access rules and errors.

#![forbid(unsafe_code)]

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

mod error;
mod rule;

pub use error::{Error, Result};
pub use rule::{AccessRule, PermissionBlock, RoleFragment, AUTO_VERBS};

/// One custom resource kind, as produced by whatever discovered it.
///
/// `name` is the owning CRD name (`<plural>.<group>`); `operator_group` selects
/// which manifest the resource lands in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub name: String,
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
    #[serde(default)]
    pub has_status: bool,
    pub operator_group: String,
}

impl ResourceDescriptor {
    /// Resource names this kind contributes to an access rule: the plural, plus
    /// its `/status` subresource when present.
    pub fn rule_resources(&self) -> Vec<String> {
        let mut out = vec![self.plural.clone()];
        if self.has_status { out.push(format!("{}/status", self.plural)); }
        out
    }

    pub fn owned(&self) -> OwnedResource {
        OwnedResource { name: self.name.clone(), version: self.version.clone(), kind: self.kind.clone() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maintainer {
    pub name: String,
    pub email: String,
}

/// Descriptive metadata for one operator group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupMetadata {
    pub description: Option<String>,
    pub display_name: Option<String>,
    pub keywords: Vec<String>,
    pub maintainers: Vec<Maintainer>,
    #[serde(rename = "providerName")]
    pub provider_name: Option<String>,
    #[serde(rename = "providerURL", alias = "providerUrl")]
    pub provider_url: Option<String>,
    pub version: Option<String>,
    pub replaces: Option<String>,
    pub maturity: Option<String>,
}

/// Read-only lookup from operator-group name to its metadata.
#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    by_group: FxHashMap<String, GroupMetadata>,
}

impl MetadataTable {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, group: impl Into<String>, metadata: GroupMetadata) {
        self.by_group.insert(group.into(), metadata);
    }

    /// Metadata for `group`; a missing entry is a configuration error.
    pub fn require(&self, group: &str) -> Result<&GroupMetadata> {
        self.by_group.get(group).ok_or_else(|| Error::MissingMetadata { group: group.to_string() })
    }

    pub fn len(&self) -> usize { self.by_group.len() }
    pub fn is_empty(&self) -> bool { self.by_group.is_empty() }
}

impl FromIterator<(String, GroupMetadata)> for MetadataTable {
    fn from_iter<I: IntoIterator<Item = (String, GroupMetadata)>>(iter: I) -> Self {
        Self { by_group: iter.into_iter().collect() }
    }
}

/// Entry of `spec.customresourcedefinitions.owned`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedResource {
    pub name: String,
    pub version: String,
    pub kind: String,
}

/// Deployment the operator is installed with: its name and pod template spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRef {
    pub name: String,
    pub spec: k8s_openapi::api::apps::v1::DeploymentSpec,
}

impl DeploymentRef {
    pub fn from_deployment(deployment: k8s_openapi::api::apps::v1::Deployment) -> Result<Self> {
        let name = deployment.metadata.name.filter(|n| !n.is_empty()).ok_or_else(|| Error::InvalidInput {
            message: "deployment is missing metadata.name".into(),
        })?;
        let spec = deployment.spec.ok_or_else(|| Error::InvalidInput {
            message: format!("deployment {} has no spec", name),
        })?;
        Ok(Self { name, spec })
    }
}

pub mod prelude {
    pub use super::{
        AccessRule, DeploymentRef, Error, GroupMetadata, Maintainer, MetadataTable, OwnedResource,
        PermissionBlock, ResourceDescriptor, Result, RoleFragment, AUTO_VERBS,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foo() -> ResourceDescriptor {
        ResourceDescriptor {
            name: "foos.example.io".into(),
            group: "example.io".into(),
            version: "v1".into(),
            kind: "Foo".into(),
            plural: "foos".into(),
            has_status: true,
            operator_group: "foo-operator".into(),
        }
    }

    #[test]
    fn rule_resources_include_status_subresource() {
        assert_eq!(foo().rule_resources(), vec!["foos".to_string(), "foos/status".to_string()]);
        let mut d = foo();
        d.has_status = false;
        assert_eq!(d.rule_resources(), vec!["foos".to_string()]);
    }

    #[test]
    fn require_missing_metadata_is_configuration_error() {
        let mut table = MetadataTable::new();
        table.insert("foo-operator", GroupMetadata::default());
        assert!(table.require("foo-operator").is_ok());
        let err = table.require("bar-operator").unwrap_err();
        assert!(matches!(err, Error::MissingMetadata { ref group } if group == "bar-operator"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn descriptor_reads_camel_case_yaml() {
        let y = "name: foos.example.io\ngroup: example.io\nversion: v1\nkind: Foo\nplural: foos\nhasStatus: true\noperatorGroup: foo-operator\n";
        let d: ResourceDescriptor = serde_yaml::from_str(y).unwrap();
        assert_eq!(d, foo());
    }

    #[test]
    fn metadata_accepts_provider_url_spelling() {
        let y = "displayName: Foo\nproviderName: Acme\nproviderURL: https://acme.example\nkeywords: [a, b]\n";
        let m: GroupMetadata = serde_yaml::from_str(y).unwrap();
        assert_eq!(m.display_name.as_deref(), Some("Foo"));
        assert_eq!(m.provider_url.as_deref(), Some("https://acme.example"));
        assert_eq!(m.keywords, vec!["a".to_string(), "b".to_string()]);
        assert!(m.maintainers.is_empty());
    }

    #[test]
    fn deployment_without_name_is_rejected() {
        let dep = k8s_openapi::api::apps::v1::Deployment::default();
        let err = DeploymentRef::from_deployment(dep).unwrap_err();
        assert!(err.to_string().contains("metadata.name"), "err={}", err);
    }
}
