//! Serialized shape of a `ClusterServiceVersion`.

use csvgen_core::{DeploymentRef, Maintainer, OwnedResource, PermissionBlock};
use serde::{Deserialize, Serialize};

pub const API_VERSION: &str = "operators.coreos.com/v1alpha1";
pub const KIND: &str = "ClusterServiceVersion";
pub const ICON_MEDIA_TYPE: &str = "image/png";
pub const INSTALL_STRATEGY: &str = "deployment";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorManifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: ManifestMeta,
    pub spec: CsvSpec,
}

impl OperatorManifest {
    pub fn name(&self) -> &str { &self.metadata.name }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestMeta {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvSpec {
    pub description: Option<String>,
    pub display_name: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub maintainers: Vec<Maintainer>,
    pub provider: Option<Provider>,
    pub version: Option<String>,
    pub replaces: Option<String>,
    pub maturity: Option<String>,
    /// At most one entry; the platform schema models icons as a list.
    #[serde(default)]
    pub icon: Vec<Icon>,
    pub customresourcedefinitions: CustomResourceDefinitions,
    pub install: NamedInstallStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icon {
    pub base64data: String,
    pub mediatype: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomResourceDefinitions {
    #[serde(default)]
    pub owned: Vec<OwnedResource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedInstallStrategy {
    pub strategy: String,
    pub spec: InstallSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallSpec {
    #[serde(default)]
    pub cluster_permissions: Vec<PermissionBlock>,
    #[serde(default)]
    pub permissions: Vec<PermissionBlock>,
    #[serde(default)]
    pub deployments: Vec<DeploymentRef>,
}
