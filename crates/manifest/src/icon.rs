use std::collections::HashMap;
use std::hash::BuildHasher;
use std::io::ErrorKind;
use std::path::PathBuf;

use csvgen_core::{Error, Result};

/// Looks up raw icon bytes for an operator group.
pub trait IconSource {
    /// `Ok(None)` means the group has no icon.
    fn load(&self, operator_group: &str) -> Result<Option<Vec<u8>>>;
}

/// Icon source that never has an icon.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIcons;

impl IconSource for NoIcons {
    fn load(&self, _operator_group: &str) -> Result<Option<Vec<u8>>> { Ok(None) }
}

/// Reads `<dir>/<operator_group>.icon.png`.
#[derive(Debug, Clone)]
pub struct IconDir {
    dir: PathBuf,
}

impl IconDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

    pub fn path_for(&self, operator_group: &str) -> PathBuf {
        self.dir.join(format!("{}.icon.png", operator_group))
    }
}

impl IconSource for IconDir {
    fn load(&self, operator_group: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(operator_group);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(path, e)),
        }
    }
}

impl<S: BuildHasher> IconSource for HashMap<String, Vec<u8>, S> {
    fn load(&self, operator_group: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.get(operator_group).cloned())
    }
}
