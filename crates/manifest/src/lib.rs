//! csvgen manifest: assemble reconciled drafts into `ClusterServiceVersion`
//! documents and write one YAML file per operator group.

#![forbid(unsafe_code)]

mod assemble;
pub mod document;
mod generate;
mod icon;
pub mod yaml;

pub use assemble::{InstallSpecBuilder, ManifestAssembler, ManifestBuilder, SpecBuilder};
pub use document::OperatorManifest;
pub use generate::{
    assemble_all, build_drafts, generate, manifest_file_name, write_manifest, GenerateReport, GenerateRequest,
    MANIFEST_EXTENSION,
};
pub use icon::{IconDir, IconSource, NoIcons};
pub use yaml::{render, RenderError, YamlOptions};
