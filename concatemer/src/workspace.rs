//! Scoped temporary directories for the external tools.
//! Every read gets its own uniquely named directory, removed when the workspace is dropped.
use crate::error::Result;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    /// Create a workspace under `root`. The name of the directory starts with the read id.
    pub fn new_in<P: AsRef<Path>>(root: P, read_id: &str) -> Result<Self> {
        let prefix = format!("{}.", sanitize(read_id));
        let dir = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir_in(root.as_ref())?;
        trace!("WORKSPACE\t{read_id}\t{:?}", dir.path());
        Ok(Self { dir })
    }
    /// Create a workspace under the system temporary directory.
    pub fn new(read_id: &str) -> Result<Self> {
        Self::new_in(std::env::temp_dir(), read_id)
    }
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
    /// Path of a file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

fn sanitize(id: &str) -> String {
    id.chars()
        .take(64)
        .map(|c| match c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            true => c,
            false => '_',
        })
        .collect()
}
