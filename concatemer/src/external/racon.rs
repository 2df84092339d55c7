//! Consensus polishing by racon.
use super::ToolRunner;
use crate::consensus::Polisher;
use crate::error::{ConcatemerError, Result, ToolFailure};
use crate::io;
use crate::workspace::Workspace;
use std::ffi::OsStr;
use std::path::Path;

/// Arguments before the reads, the alignments and the draft.
pub const POLISH_ARGS: [&str; 5] = ["--sam", "--bq", "0", "-t", "1"];

#[derive(Debug, Clone)]
pub struct Racon {
    runner: ToolRunner,
}

impl Racon {
    pub fn new(runner: ToolRunner) -> Self {
        Self { runner }
    }
}

impl Polisher for Racon {
    fn polish(&self, reads: &Path, alignments: &Path, draft: &Path, ws: &Workspace) -> Result<Vec<u8>> {
        let corrected = ws.file("corrected.fa");
        let mut args: Vec<&OsStr> = POLISH_ARGS.iter().map(|x| OsStr::new(*x)).collect();
        args.extend([reads.as_os_str(), alignments.as_os_str(), draft.as_os_str()]);
        self.runner.run(args, ws, Some(&corrected))?;
        last_sequence(&corrected)
    }
}

/// The sequence of the last record of a FASTA file.
pub fn last_sequence(path: &Path) -> Result<Vec<u8>> {
    match io::read_fasta(path)?.pop() {
        Some((_, seq)) if !seq.is_empty() => Ok(seq),
        _ => Err(ConcatemerError::tool("racon", ToolFailure::EmptyOutput, format!("{:?}", path))),
    }
}
