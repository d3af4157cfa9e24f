use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use csvgen_core::{DeploymentRef, RoleFragment};
use csvgen_manifest::{GenerateRequest, IconDir, IconSource, NoIcons, YamlOptions};
use csvgen_rbac::ManifestDraft;
use tracing::{error, info};

mod inputs;

#[derive(Parser, Debug)]
#[command(name = "csvgenctl", version, about = "Generate ClusterServiceVersion manifests")]
struct Cli {
    /// Output format for reports
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write one <operator-group>.csv.yml per operator group
    Generate {
        #[command(flatten)]
        inputs: InputArgs,
        /// Output directory
        #[arg(long = "out", env = "CSVGEN_OUT_DIR", default_value = ".")]
        out: PathBuf,
        /// Start every document with `---`
        #[arg(long = "doc-start-marker", env = "CSVGEN_DOC_START_MARKER", action = ArgAction::SetTrue)]
        doc_start_marker: bool,
        /// Keep null fields and empty lists in the output
        #[arg(long = "keep-empty", env = "CSVGEN_KEEP_EMPTY", action = ArgAction::SetTrue)]
        keep_empty: bool,
    },
    /// Show the cluster permissions each operator group would get, without writing
    Plan {
        #[command(flatten)]
        inputs: InputArgs,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// YAML list of custom resource descriptors
    #[arg(long = "descriptors", env = "CSVGEN_DESCRIPTORS")]
    descriptors: PathBuf,
    /// YAML mapping of operator group -> metadata
    #[arg(long = "metadata", env = "CSVGEN_METADATA")]
    metadata: PathBuf,
    /// Service account the permissions are bound to
    #[arg(long = "service-account", env = "CSVGEN_SERVICE_ACCOUNT")]
    service_account: String,
    /// ClusterRole whose rules override generated ones for the API groups it names
    #[arg(long = "cluster-role", env = "CSVGEN_CLUSTER_ROLE")]
    cluster_role: Option<PathBuf>,
    /// Role added as namespaced permissions
    #[arg(long = "role", env = "CSVGEN_ROLE")]
    role: Option<PathBuf>,
    /// Deployment the operator is installed with
    #[arg(long = "deployment", env = "CSVGEN_DEPLOYMENT")]
    deployment: Option<PathBuf>,
    /// Directory holding <operator-group>.icon.png files
    #[arg(long = "icons", env = "CSVGEN_ICONS")]
    icons: Option<PathBuf>,
}

/// Inputs loaded into memory; borrowed by [`GenerateRequest`].
struct Loaded {
    descriptors: Vec<csvgen_core::ResourceDescriptor>,
    metadata: csvgen_core::MetadataTable,
    service_account: String,
    cluster_role: Option<RoleFragment>,
    role: Option<RoleFragment>,
    deployment: Option<DeploymentRef>,
    icons: Box<dyn IconSource>,
}

impl Loaded {
    fn load(args: &InputArgs) -> Result<Self> {
        if args.service_account.trim().is_empty() { bail!("--service-account must not be empty"); }
        let descriptors = inputs::load_descriptors(&args.descriptors)?;
        let metadata = inputs::load_metadata(&args.metadata)?;
        let cluster_role = args.cluster_role.as_deref().map(inputs::load_cluster_role).transpose()?;
        let role = args.role.as_deref().map(inputs::load_role).transpose()?;
        let deployment = args.deployment.as_deref().map(inputs::load_deployment).transpose()?;
        let icons: Box<dyn IconSource> = match &args.icons {
            Some(dir) => Box::new(IconDir::new(dir)),
            None => Box::new(NoIcons),
        };
        info!(descriptors = descriptors.len(), groups = metadata.len(), "inputs loaded");
        Ok(Self { descriptors, metadata, service_account: args.service_account.clone(), cluster_role, role, deployment, icons })
    }

    fn request(&self) -> GenerateRequest<'_> {
        GenerateRequest {
            descriptors: &self.descriptors,
            metadata: &self.metadata,
            service_account: &self.service_account,
            cluster_role: self.cluster_role.as_ref(),
            role: self.role.as_ref(),
            deployment: self.deployment.as_ref(),
            icons: &*self.icons,
        }
    }
}

/// Human-readable plan: one header per operator group, one line per rule.
fn plan_lines(drafts: &BTreeMap<String, ManifestDraft>) -> Vec<String> {
    let mut out = Vec::new();
    for (name, draft) in drafts {
        out.push(format!("{} ({} owned)", name, draft.owned.len()));
        for block in &draft.cluster_permissions {
            for rule in &block.rules {
                out.push(format!(
                    "  {} • [{}] • {} • {}",
                    block.service_account_name,
                    rule.api_groups.join(","),
                    rule.resources.join(","),
                    rule.verbs.join(",")
                ));
            }
        }
    }
    out
}

fn init_tracing() {
    let env = std::env::var("CSVGEN_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { inputs, out, doc_start_marker, keep_empty } => {
            let loaded = Loaded::load(&inputs)?;
            let opts = YamlOptions { skip_nulls: !keep_empty, skip_empty_sequences: !keep_empty, doc_start_marker };
            std::fs::create_dir_all(&out).with_context(|| format!("creating output directory {}", out.display()))?;
            let report = csvgen_manifest::generate(&out, &loaded.request(), &opts)?;
            match cli.output {
                Output::Human => {
                    for p in &report.written { println!("wrote {}", p.display()); }
                    for (group, e) in &report.skipped { println!("skipped {}: {}", group, e); }
                }
                Output::Json => {
                    let skipped: Vec<serde_json::Value> = report
                        .skipped
                        .iter()
                        .map(|(group, e)| serde_json::json!({ "group": group, "error": e.to_string() }))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "written": report.written, "skipped": skipped }))?);
                }
            }
            if !report.is_complete() {
                error!(skipped = report.skipped.len(), "some manifests were not generated");
                bail!("{} operator group(s) skipped", report.skipped.len());
            }
        }
        Commands::Plan { inputs } => {
            let loaded = Loaded::load(&inputs)?;
            let drafts: BTreeMap<String, ManifestDraft> = csvgen_manifest::build_drafts(&loaded.request())?.drafts;
            match cli.output {
                Output::Human => {
                    for line in plan_lines(&drafts) { println!("{}", line); }
                }
                Output::Json => {
                    let plan: serde_json::Map<String, serde_json::Value> = drafts
                        .iter()
                        .map(|(name, d)| -> Result<(String, serde_json::Value)> {
                            Ok((name.clone(), serde_json::to_value(&d.cluster_permissions)?))
                        })
                        .collect::<Result<_>>()?;
                    println!("{}", serde_json::to_string_pretty(&plan)?);
                }
            }
        }
    }
    Ok(())
}
