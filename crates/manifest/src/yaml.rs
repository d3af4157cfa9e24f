//! YAML rendering with explicit output options.

use serde::Serialize;
use serde_json::Value as Json;
use thiserror::Error;

/// Options applied when rendering a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YamlOptions {
    /// Drop mapping entries whose value is null.
    pub skip_nulls: bool,
    /// Drop mapping entries whose value is an empty sequence.
    pub skip_empty_sequences: bool,
    /// Start the document with `---`.
    pub doc_start_marker: bool,
}

impl Default for YamlOptions {
    fn default() -> Self {
        Self { skip_nulls: true, skip_empty_sequences: true, doc_start_marker: false }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("to json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("to yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub fn render<T: Serialize>(value: &T, opts: &YamlOptions) -> Result<String, RenderError> {
    let mut json = serde_json::to_value(value)?;
    prune(&mut json, opts);
    let body = serde_yaml::to_string(&json)?;
    if opts.doc_start_marker { Ok(format!("---\n{}", body)) } else { Ok(body) }
}

fn prune(v: &mut Json, opts: &YamlOptions) {
    match v {
        Json::Object(map) => {
            for (_k, vv) in map.iter_mut() { prune(vv, opts); }
            map.retain(|_k, vv| match vv {
                Json::Null => !opts.skip_nulls,
                Json::Array(a) if a.is_empty() => !opts.skip_empty_sequences,
                _ => true,
            });
        }
        Json::Array(arr) => {
            for vv in arr.iter_mut() { prune(vv, opts); }
        }
        _ => {}
    }
}
