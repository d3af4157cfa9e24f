use k8s_openapi::api::rbac::v1::{ClusterRole, PolicyRule, Role};
use serde::{Deserialize, Serialize};

/// Verbs granted on every auto-derived rule, in emission order.
pub const AUTO_VERBS: [&str; 7] = ["get", "list", "watch", "create", "delete", "patch", "update"];

/// One RBAC rule. `api_groups` and `resources` behave as sets (insertion
/// ordered, no duplicates); `verbs` keeps its authored order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRule {
    #[serde(default)]
    pub api_groups: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_names: Vec<String>,
    #[serde(default, rename = "nonResourceURLs", skip_serializing_if = "Vec::is_empty")]
    pub non_resource_urls: Vec<String>,
    #[serde(default)]
    pub verbs: Vec<String>,
}

impl AccessRule {
    /// Fresh auto-derived rule for `group` with no resources yet.
    pub fn for_group(group: &str) -> Self {
        Self {
            api_groups: vec![group.to_string()],
            verbs: AUTO_VERBS.iter().map(|v| v.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn covers(&self, group: &str) -> bool {
        self.api_groups.iter().any(|g| g == group)
    }

    /// Adds `resource` unless already present. Returns whether it was new.
    pub fn add_resource(&mut self, resource: &str) -> bool {
        if self.resources.iter().any(|r| r == resource) { return false; }
        self.resources.push(resource.to_string());
        true
    }

    /// Copy of this rule with `group` removed from its API groups, or `None` when
    /// nothing would be left.
    pub fn without_group(&self, group: &str) -> Option<AccessRule> {
        let api_groups: Vec<String> = self.api_groups.iter().filter(|g| *g != group).cloned().collect();
        if api_groups.is_empty() { return None; }
        Some(AccessRule { api_groups, ..self.clone() })
    }
}

impl From<PolicyRule> for AccessRule {
    fn from(r: PolicyRule) -> Self {
        Self {
            api_groups: r.api_groups.unwrap_or_default(),
            resources: r.resources.unwrap_or_default(),
            resource_names: r.resource_names.unwrap_or_default(),
            non_resource_urls: r.non_resource_urls.unwrap_or_default(),
            verbs: r.verbs,
        }
    }
}

/// Rules bound to a service account. Used for both `clusterPermissions` and
/// the namespaced `permissions` list of the install strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionBlock {
    pub service_account_name: String,
    #[serde(default)]
    pub rules: Vec<AccessRule>,
}

impl PermissionBlock {
    pub fn new(service_account_name: impl Into<String>) -> Self {
        Self { service_account_name: service_account_name.into(), rules: Vec::new() }
    }
}

/// Hand-written role rules supplied next to the generated ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleFragment {
    pub rules: Vec<AccessRule>,
}

impl RoleFragment {
    pub fn new(rules: Vec<AccessRule>) -> Self { Self { rules } }

    /// True when any rule of the fragment names `group`.
    pub fn covers(&self, group: &str) -> bool {
        self.rules.iter().any(|r| r.covers(group))
    }

    pub fn bind(&self, service_account_name: &str) -> PermissionBlock {
        PermissionBlock { service_account_name: service_account_name.to_string(), rules: self.rules.clone() }
    }
}

impl From<ClusterRole> for RoleFragment {
    fn from(role: ClusterRole) -> Self {
        Self::new(role.rules.unwrap_or_default().into_iter().map(AccessRule::from).collect())
    }
}

impl From<Role> for RoleFragment {
    fn from(role: Role) -> Self {
        Self::new(role.rules.unwrap_or_default().into_iter().map(AccessRule::from).collect())
    }
}
