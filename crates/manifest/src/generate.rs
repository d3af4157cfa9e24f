use std::path::{Path, PathBuf};
use std::time::Instant;

use csvgen_core::{DeploymentRef, Error, MetadataTable, ResourceDescriptor, Result, RoleFragment};
use csvgen_rbac::{Accumulated, OverrideReconciler, RuleAccumulator};
use metrics::{counter, histogram};
use tracing::{info, warn};

use crate::assemble::ManifestAssembler;
use crate::document::OperatorManifest;
use crate::icon::IconSource;
use crate::yaml::{render, YamlOptions};

pub const MANIFEST_EXTENSION: &str = "csv.yml";

pub fn manifest_file_name(operator_group: &str) -> String {
    format!("{}.{}", operator_group, MANIFEST_EXTENSION)
}

/// Everything one generation run needs, already loaded into memory.
pub struct GenerateRequest<'a> {
    pub descriptors: &'a [ResourceDescriptor],
    pub metadata: &'a MetadataTable,
    pub service_account: &'a str,
    /// Hand-written cluster role; overrides generated rules for the groups it names.
    pub cluster_role: Option<&'a RoleFragment>,
    /// Hand-written namespaced role.
    pub role: Option<&'a RoleFragment>,
    pub deployment: Option<&'a DeploymentRef>,
    pub icons: &'a dyn IconSource,
}

#[derive(Debug, Default)]
pub struct GenerateReport {
    pub written: Vec<PathBuf>,
    /// Operator groups that were not written, with the reason.
    pub skipped: Vec<(String, Error)>,
}

impl GenerateReport {
    pub fn is_complete(&self) -> bool { self.skipped.is_empty() }
}

/// Accumulates rules for every descriptor and applies the cluster role
/// fragment, if any. Missing group metadata aborts the whole run.
pub fn build_drafts(req: &GenerateRequest<'_>) -> Result<Accumulated> {
    let mut acc = RuleAccumulator::new(req.metadata, req.service_account);
    acc.extend(req.descriptors)?;
    let mut out = acc.finish();
    if let Some(fragment) = req.cluster_role {
        let reconciler = OverrideReconciler::new(fragment, req.service_account);
        for draft in out.drafts.values_mut() { reconciler.reconcile(draft, &out.index); }
    }
    Ok(out)
}

/// Builds every manifest in memory without touching the filesystem beyond icon lookups.
pub fn assemble_all(req: &GenerateRequest<'_>) -> Result<Vec<OperatorManifest>> {
    let assembler = assembler_for(req);
    build_drafts(req)?.drafts.into_values().map(|d| assembler.assemble(d)).collect()
}

/// Writes one manifest per operator group into `out_dir`.
///
/// Configuration errors abort the run; I/O and render failures only skip the
/// affected group and are listed in the report.
pub fn generate(out_dir: &Path, req: &GenerateRequest<'_>, opts: &YamlOptions) -> Result<GenerateReport> {
    let t0 = Instant::now();
    let drafts = build_drafts(req)?.drafts;
    let assembler = assembler_for(req);
    let mut report = GenerateReport::default();
    for (group, draft) in drafts {
        let res = assembler.assemble(draft).and_then(|m| write_manifest(out_dir, &m, opts));
        match res {
            Ok(path) => {
                counter!("csv_manifests_written_total", 1u64);
                info!(group = %group, path = %path.display(), "generated manifest");
                report.written.push(path);
            }
            Err(e) if e.is_recoverable() => {
                counter!("csv_manifests_failed_total", 1u64);
                warn!(group = %group, error = %e, "skipping manifest");
                report.skipped.push((group, e));
            }
            Err(e) => return Err(e),
        }
    }
    histogram!("csv_generate_ms", t0.elapsed().as_secs_f64() * 1000.0);
    Ok(report)
}

/// Renders `manifest` fully, stages it next to its destination and renames it
/// into place.
pub fn write_manifest(out_dir: &Path, manifest: &OperatorManifest, opts: &YamlOptions) -> Result<PathBuf> {
    let body = render(manifest, opts).map_err(|e| Error::Serialize { group: manifest.name().to_string(), message: e.to_string() })?;
    let path = out_dir.join(manifest_file_name(manifest.name()));
    let staged = out_dir.join(format!(".{}.tmp", manifest_file_name(manifest.name())));
    if let Err(e) = std::fs::write(&staged, body.as_bytes()) {
        let _ = std::fs::remove_file(&staged);
        return Err(Error::io(staged, e));
    }
    if let Err(e) = std::fs::rename(&staged, &path) {
        let _ = std::fs::remove_file(&staged);
        return Err(Error::io(path, e));
    }
    Ok(path)
}

fn assembler_for<'a>(req: &GenerateRequest<'a>) -> ManifestAssembler<'a> {
    ManifestAssembler::new(req.service_account, req.icons)
        .with_role(req.role)
        .with_deployment(req.deployment)
}
