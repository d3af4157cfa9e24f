use base64::{engine::general_purpose::STANDARD, Engine as _};
use csvgen_core::{DeploymentRef, GroupMetadata, OwnedResource, PermissionBlock, Result, RoleFragment};
use csvgen_rbac::ManifestDraft;
use tracing::debug;

use crate::document::*;
use crate::icon::IconSource;

/// Builds the `install.spec` level.
#[derive(Debug, Default)]
pub struct InstallSpecBuilder {
    cluster_permissions: Vec<PermissionBlock>,
    permissions: Vec<PermissionBlock>,
    deployments: Vec<DeploymentRef>,
}

impl InstallSpecBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn cluster_permissions(mut self, blocks: Vec<PermissionBlock>) -> Self {
        self.cluster_permissions = blocks;
        self
    }

    pub fn permission(mut self, block: PermissionBlock) -> Self {
        self.permissions.push(block);
        self
    }

    pub fn deployment(mut self, deployment: DeploymentRef) -> Self {
        self.deployments.push(deployment);
        self
    }

    pub fn build(self) -> InstallSpec {
        InstallSpec {
            cluster_permissions: self.cluster_permissions,
            permissions: self.permissions,
            deployments: self.deployments,
        }
    }
}

/// Builds the `spec` level from group metadata.
#[derive(Debug)]
pub struct SpecBuilder {
    metadata: GroupMetadata,
    icon: Option<Icon>,
    owned: Vec<OwnedResource>,
    install: InstallSpec,
}

impl SpecBuilder {
    pub fn new(metadata: GroupMetadata) -> Self {
        Self { metadata, icon: None, owned: Vec::new(), install: InstallSpec::default() }
    }

    /// Attach a PNG icon; bytes are base64-encoded here.
    pub fn icon_png(mut self, bytes: &[u8]) -> Self {
        self.icon = Some(Icon { base64data: STANDARD.encode(bytes), mediatype: ICON_MEDIA_TYPE.to_string() });
        self
    }

    pub fn owned(mut self, owned: Vec<OwnedResource>) -> Self {
        self.owned = owned;
        self
    }

    pub fn install(mut self, install: InstallSpec) -> Self {
        self.install = install;
        self
    }

    pub fn build(self) -> CsvSpec {
        let m = self.metadata;
        let provider = m.provider_name.map(|name| Provider { name, url: m.provider_url });
        CsvSpec {
            description: m.description,
            display_name: m.display_name,
            keywords: m.keywords,
            maintainers: m.maintainers,
            provider,
            version: m.version,
            replaces: m.replaces,
            maturity: m.maturity,
            icon: self.icon.into_iter().collect(),
            customresourcedefinitions: CustomResourceDefinitions { owned: self.owned },
            install: NamedInstallStrategy { strategy: INSTALL_STRATEGY.to_string(), spec: self.install },
        }
    }
}

/// Builds the top-level document.
#[derive(Debug)]
pub struct ManifestBuilder {
    name: String,
    spec: CsvSpec,
}

impl ManifestBuilder {
    pub fn new(name: impl Into<String>, spec: CsvSpec) -> Self {
        Self { name: name.into(), spec }
    }

    pub fn build(self) -> OperatorManifest {
        OperatorManifest {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMeta { name: self.name },
            spec: self.spec,
        }
    }
}

/// Turns a reconciled draft into the final manifest value.
pub struct ManifestAssembler<'a> {
    service_account: &'a str,
    role: Option<&'a RoleFragment>,
    deployment: Option<&'a DeploymentRef>,
    icons: &'a dyn IconSource,
}

impl<'a> ManifestAssembler<'a> {
    pub fn new(service_account: &'a str, icons: &'a dyn IconSource) -> Self {
        Self { service_account, role: None, deployment: None, icons }
    }

    /// Namespaced role fragment bound to the service account under `permissions`.
    pub fn with_role(mut self, role: Option<&'a RoleFragment>) -> Self {
        self.role = role;
        self
    }

    pub fn with_deployment(mut self, deployment: Option<&'a DeploymentRef>) -> Self {
        self.deployment = deployment;
        self
    }

    /// Fails only when the icon source reports an error other than "not found".
    pub fn assemble(&self, draft: ManifestDraft) -> Result<OperatorManifest> {
        let mut install = InstallSpecBuilder::new().cluster_permissions(draft.cluster_permissions);
        if let Some(role) = self.role {
            install = install.permission(role.bind(self.service_account));
        }
        if let Some(dep) = self.deployment {
            install = install.deployment(dep.clone());
        }

        let mut spec = SpecBuilder::new(draft.metadata).owned(draft.owned).install(install.build());
        if let Some(bytes) = self.icons.load(&draft.name)? {
            debug!(manifest = %draft.name, bytes = bytes.len(), "attaching icon");
            spec = spec.icon_png(&bytes);
        }
        Ok(ManifestBuilder::new(draft.name, spec.build()).build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon::NoIcons;
    use csvgen_core::{AccessRule, Maintainer};
    use rustc_hash::FxHashMap;

    fn draft() -> ManifestDraft {
        let metadata = GroupMetadata {
            description: Some("Manages foos".into()),
            display_name: Some("Foo Operator".into()),
            keywords: vec!["foo".into()],
            maintainers: vec![Maintainer { name: "Jo".into(), email: "jo@example.io".into() }],
            provider_name: Some("Acme".into()),
            provider_url: Some("https://acme.example".into()),
            version: Some("0.1.0".into()),
            replaces: None,
            maturity: Some("alpha".into()),
        };
        let mut d = ManifestDraft::new("foo-operator", metadata);
        d.owned.push(OwnedResource { name: "foos.example.io".into(), version: "v1".into(), kind: "Foo".into() });
        let mut block = PermissionBlock::new("sa1");
        let mut rule = AccessRule::for_group("example.io");
        rule.add_resource("foos");
        block.rules.push(rule);
        d.cluster_permissions.push(block);
        d
    }

    #[test]
    fn assembles_metadata_and_permissions() {
        let icons = NoIcons;
        let role = RoleFragment::new(vec![AccessRule {
            api_groups: vec!["".into()],
            resources: vec!["configmaps".into()],
            verbs: vec!["get".into()],
            ..AccessRule::default()
        }]);
        let m = ManifestAssembler::new("sa1", &icons).with_role(Some(&role)).assemble(draft()).unwrap();
        assert_eq!(m.api_version, API_VERSION);
        assert_eq!(m.kind, KIND);
        assert_eq!(m.name(), "foo-operator");
        assert_eq!(m.spec.display_name.as_deref(), Some("Foo Operator"));
        assert_eq!(m.spec.provider, Some(Provider { name: "Acme".into(), url: Some("https://acme.example".into()) }));
        assert!(m.spec.icon.is_empty());
        assert_eq!(m.spec.customresourcedefinitions.owned.len(), 1);
        assert_eq!(m.spec.install.strategy, INSTALL_STRATEGY);
        assert_eq!(m.spec.install.spec.cluster_permissions.len(), 1);
        assert_eq!(m.spec.install.spec.permissions, vec![role.bind("sa1")]);
        assert!(m.spec.install.spec.deployments.is_empty());
    }

    #[test]
    fn provider_is_omitted_without_name() {
        let mut d = draft();
        d.metadata.provider_name = None;
        let m = ManifestAssembler::new("sa1", &NoIcons).assemble(d).unwrap();
        assert!(m.spec.provider.is_none());
    }

    #[test]
    fn icon_is_base64_png() {
        let mut icons: FxHashMap<String, Vec<u8>> = FxHashMap::default();
        icons.insert("foo-operator".into(), vec![0x89, b'P', b'N', b'G']);
        let m = ManifestAssembler::new("sa1", &icons).assemble(draft()).unwrap();
        assert_eq!(m.spec.icon, vec![Icon { base64data: "iVBORw==".into(), mediatype: "image/png".into() }]);
    }
}
