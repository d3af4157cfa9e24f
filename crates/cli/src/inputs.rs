//! Loading of generator inputs from YAML files.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use csvgen_core::{DeploymentRef, GroupMetadata, MetadataTable, ResourceDescriptor, RoleFragment};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::rbac::v1::{ClusterRole, Role};
use serde::de::DeserializeOwned;

fn read_yaml<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {} from {}", what, path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("parsing {} in {}", what, path.display()))
}

/// A YAML sequence of resource descriptors.
pub fn load_descriptors(path: &Path) -> Result<Vec<ResourceDescriptor>> {
    read_yaml(path, "resource descriptors")
}

/// A YAML mapping from operator-group name to its metadata.
pub fn load_metadata(path: &Path) -> Result<MetadataTable> {
    let by_group: BTreeMap<String, GroupMetadata> = read_yaml(path, "group metadata")?;
    Ok(by_group.into_iter().collect())
}

pub fn load_cluster_role(path: &Path) -> Result<RoleFragment> {
    let role: ClusterRole = read_yaml(path, "cluster role")?;
    Ok(role.into())
}

pub fn load_role(path: &Path) -> Result<RoleFragment> {
    let role: Role = read_yaml(path, "role")?;
    Ok(role.into())
}

pub fn load_deployment(path: &Path) -> Result<DeploymentRef> {
    let dep: Deployment = read_yaml(path, "deployment")?;
    DeploymentRef::from_deployment(dep).with_context(|| format!("deployment in {}", path.display()))
}
