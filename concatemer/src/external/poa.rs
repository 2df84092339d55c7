//! Partial order alignment by `poa`, in progressive mode with heaviest bundling.
use super::ToolRunner;
use crate::consensus::{MultipleAligner, MultipleAlignment};
use crate::error::{ConcatemerError, Result, ToolFailure};
use crate::io;
use crate::workspace::Workspace;
use definitions::Subread;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Poa {
    runner: ToolRunner,
    matrix: PathBuf,
}

impl Poa {
    /// `matrix` is the score matrix file given to `-do_progressive`.
    pub fn new<P: AsRef<Path>>(runner: ToolRunner, matrix: P) -> Self {
        Self {
            runner,
            matrix: matrix.as_ref().to_path_buf(),
        }
    }
}

impl MultipleAligner for Poa {
    fn align(&self, units: &[Subread], ws: &Workspace) -> Result<MultipleAlignment> {
        let (units_path, msa_path) = (ws.file("units.fa"), ws.file("msa.pir"));
        let names: Vec<_> = units.iter().map(|u| u.index.to_string()).collect();
        let records: Vec<_> = names
            .iter()
            .zip(units.iter())
            .map(|(name, u)| (name.as_str(), u.seq()))
            .collect();
        io::write_fasta(&units_path, &records)?;
        let args = [
            OsStr::new("-read_fasta"),
            units_path.as_os_str(),
            OsStr::new("-hb"),
            OsStr::new("-pir"),
            msa_path.as_os_str(),
            OsStr::new("-do_progressive"),
            self.matrix.as_os_str(),
        ];
        self.runner.run(args, ws, None)?;
        let msa = read_alignment(&msa_path)?;
        debug!("MSA\t{}\t{}", units.len(), msa.rows.len());
        Ok(msa)
    }
}

/// Read the rows of an alignment in PIR format.
pub fn read_alignment(path: &Path) -> Result<MultipleAlignment> {
    if !path.exists() {
        let detail = format!("{:?}", path);
        return Err(ConcatemerError::tool("poa", ToolFailure::MissingOutput, detail));
    }
    let rows = io::read_fasta(path)?;
    if rows.is_empty() {
        return Err(ConcatemerError::tool("poa", ToolFailure::MalformedOutput, "no rows"));
    }
    Ok(MultipleAlignment::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use definitions::SubreadKind;
    #[test]
    fn alignment_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("msa.pir");
        std::fs::write(&path, ">1\nAC-GT\n>2\nACGGT\n>CONSENS0\nAC-GT\n").unwrap();
        let msa = read_alignment(&path).unwrap();
        assert_eq!(msa.rows.len(), 3);
        assert_eq!(msa.sequence_rows().count(), 2);
        assert_eq!(msa.first_consensus(), Some(b"ACGT".to_vec()));
        std::fs::write(&path, "").unwrap();
        let err = read_alignment(&path).unwrap_err();
        assert_eq!(err.tool_failure(), Some(ToolFailure::MalformedOutput));
    }
    #[cfg(unix)]
    #[test]
    fn missing_alignment() {
        let ws = Workspace::new("test").unwrap();
        let poa = Poa::new(ToolRunner::new("poa", "true", None), "blosum80.mat");
        let units = vec![
            Subread::new(1, SubreadKind::Interior, b"ACGT", b"IIII"),
            Subread::new(2, SubreadKind::Interior, b"ACGGT", b"IIIII"),
        ];
        let err = poa.align(&units, &ws).unwrap_err();
        assert_eq!(err.tool_failure(), Some(ToolFailure::MissingOutput));
        let written = io::read_fasta(ws.file("units.fa")).unwrap();
        assert_eq!(written[1], ("2".to_string(), b"ACGGT".to_vec()));
    }
}
