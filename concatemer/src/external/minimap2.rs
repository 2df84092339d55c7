//! Long read mapping by minimap2.
use super::ToolRunner;
use crate::consensus::ReadMapper;
use crate::error::Result;
use crate::workspace::Workspace;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Arguments before the target and the query.
pub const MAP_ARGS: [&str; 3] = ["--secondary=no", "-ax", "map-ont"];

#[derive(Debug, Clone)]
pub struct Minimap2 {
    runner: ToolRunner,
}

impl Minimap2 {
    pub fn new(runner: ToolRunner) -> Self {
        Self { runner }
    }
    /// Invoke minimap2 with `args`, `target` and `query`, writing the standard output into `out`.
    pub fn minimap2_args(&self, target: &Path, query: &Path, args: &[&str], out: &Path, ws: &Workspace) -> Result<()> {
        let mut args: Vec<&OsStr> = args.iter().map(|x| OsStr::new(*x)).collect();
        args.push(target.as_os_str());
        args.push(query.as_os_str());
        self.runner.run(args, ws, Some(out))
    }
}

impl ReadMapper for Minimap2 {
    fn map(&self, draft: &Path, reads: &Path, ws: &Workspace) -> Result<PathBuf> {
        let sam = ws.file("overlaps.sam");
        self.minimap2_args(draft, reads, &MAP_ARGS, &sam, ws)?;
        Ok(sam)
    }
}
