//! Smith-Waterman local alignment by a modified EMBOSS `water`, which dumps the best score
//! of each diagonal into `SW_PARSE.txt`.
use super::ToolRunner;
use crate::diagonal::LocalAligner;
use crate::error::{ConcatemerError, Result, ToolFailure};
use crate::io;
use crate::workspace::Workspace;
use std::ffi::OsStr;
use std::path::Path;

pub const SCORE_FILE: &str = "SW_PARSE.txt";

#[derive(Debug, Clone)]
pub struct Water {
    runner: ToolRunner,
}

impl Water {
    pub fn new(runner: ToolRunner) -> Self {
        Self { runner }
    }
}

impl LocalAligner for Water {
    fn diagonal_scores(
        &self,
        target: &[u8],
        probe: &[u8],
        skip_main_diagonal: bool,
        ws: &Workspace,
    ) -> Result<Vec<(i64, i64)>> {
        let (target_path, probe_path) = (ws.file("target.fa"), ws.file("probe.fa"));
        io::write_fasta(&target_path, &[("target", target)])?;
        io::write_fasta(&probe_path, &[("probe", probe)])?;
        let (xlen, ylen) = (target.len().to_string(), probe.len().to_string());
        let diagonal = match skip_main_diagonal {
            true => "yes",
            false => "no",
        };
        let args = [
            OsStr::new("-asequence"),
            target_path.as_os_str(),
            OsStr::new("-bsequence"),
            probe_path.as_os_str(),
            OsStr::new("-datafile"),
            OsStr::new("EDNAFULL"),
            OsStr::new("-gapopen"),
            OsStr::new("25"),
            OsStr::new("-outfile"),
            OsStr::new("align.whatever"),
            OsStr::new("-gapextend"),
            OsStr::new("1"),
            OsStr::new(diagonal),
            OsStr::new(&xlen),
            OsStr::new(&ylen),
        ];
        self.runner.run(args, ws, None)?;
        let scores = ws.file(SCORE_FILE);
        // No file means no diagonal scored.
        if !scores.exists() {
            return Ok(vec![]);
        }
        let parsed = parse_scores(&scores);
        std::fs::remove_file(&scores)?;
        parsed
    }
}

/// Parse `diagonal:score` lines.
pub fn parse_scores(path: &Path) -> Result<Vec<(i64, i64)>> {
    let text = std::fs::read_to_string(path)?;
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let malformed = || ConcatemerError::tool("water", ToolFailure::MalformedOutput, line);
            let (diagonal, score) = line.trim().split_once(':').ok_or_else(malformed)?;
            let diagonal = diagonal.trim().parse().map_err(|_| malformed())?;
            let score = score.trim().parse().map_err(|_| malformed())?;
            Ok((diagonal, score))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SCORE_FILE);
        std::fs::write(&path, "-3:10\n0:25\n\n12:4\n").unwrap();
        assert_eq!(parse_scores(&path).unwrap(), vec![(-3, 10), (0, 25), (12, 4)]);
        std::fs::write(&path, "-3:10\n0;25\n").unwrap();
        let err = parse_scores(&path).unwrap_err();
        assert_eq!(err.tool_failure(), Some(ToolFailure::MalformedOutput));
    }
    #[cfg(unix)]
    #[test]
    fn missing_score_file_is_empty() {
        let ws = Workspace::new("test").unwrap();
        let water = Water::new(ToolRunner::new("water", "true", None));
        let scores = water.diagonal_scores(b"ACGT", b"ACGT", true, &ws).unwrap();
        assert!(scores.is_empty());
        assert!(ws.file("target.fa").exists());
    }
}
