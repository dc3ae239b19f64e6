//! Page-under-test resolution

use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{VerifyError, VerifyResult};

/// The local HTML document a run is pointed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDocument {
    path: PathBuf,
    uri: Url,
}

impl TargetDocument {
    /// Resolve `path` against the current working directory.
    pub fn resolve(path: &Path) -> VerifyResult<Self> {
        let cwd = std::env::current_dir()?;
        Self::resolve_from(&cwd, path)
    }

    /// Resolve `path` against `base` when it is relative.
    pub fn resolve_from(base: &Path, path: &Path) -> VerifyResult<Self> {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        };

        if !joined.is_file() {
            return Err(VerifyError::TargetNotFound(joined));
        }

        // Collapses `..` segments and symlinks so the URI is stable.
        let path = joined.canonicalize()?;
        let uri = Url::from_file_path(&path)
            .map_err(|_| VerifyError::TargetNotFound(path.clone()))?;

        Ok(Self { path, uri })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }
}
