//! Configuration of a consensus calling run.
//!
//! This struct is a comprehensive list of the parameters that can be set by a user.
//! All the other parameters are fixed constants in the modules that use them.
use crate::error::{ConcatemerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which local aligner produces the self-similarity signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlignerBackend {
    /// The in-process ungapped diagonal scorer.
    #[default]
    Builtin,
    /// The modified EMBOSS `water`.
    Water,
}

impl std::str::FromStr for AlignerBackend {
    type Err = ConcatemerError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "builtin" => Ok(AlignerBackend::Builtin),
            "water" => Ok(AlignerBackend::Water),
            _ => Err(ConcatemerError::Config(format!("unknown aligner {s}"))),
        }
    }
}

/// Executables of the external tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub water: PathBuf,
    pub poa: PathBuf,
    /// Score matrix of poa.
    pub poa_matrix: PathBuf,
    pub minimap2: PathBuf,
    pub racon: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            water: PathBuf::from("water"),
            poa: PathBuf::from("poa"),
            poa_matrix: PathBuf::from("NUC.4.4.mat"),
            minimap2: PathBuf::from("minimap2"),
            racon: PathBuf::from("racon"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallerConfig {
    /// The path to the input FASTQ file.
    pub input_file: PathBuf,
    /// The path to the output directory.
    pub out_dir: PathBuf,
    /// Consensus sequences go to `<out_dir>/<prefix>.fasta`.
    pub prefix: String,
    /// Subreads go to `<out_dir>/<subread_file>`.
    pub subread_file: String,
    /// Workspaces of the reads are created here. The system temporary directory if not set.
    pub temp_root: Option<PathBuf>,
    pub threads: usize,
    /// Number of reads processed in parallel before the outputs are flushed.
    pub batch_size: usize,
    pub resume: bool,
    pub verbose: usize,
    /// External tools are killed after this many seconds.
    pub tool_timeout_secs: Option<u64>,
    pub aligner: AlignerBackend,
    pub tools: ToolPaths,
}

impl Default for CallerConfig {
    fn default() -> Self {
        Self {
            input_file: PathBuf::new(),
            out_dir: PathBuf::from("."),
            prefix: "R2C2_Consensus".to_string(),
            subread_file: "subreads.fastq".to_string(),
            temp_root: None,
            threads: 1,
            batch_size: 1_000,
            resume: false,
            verbose: 0,
            tool_timeout_secs: None,
            aligner: AlignerBackend::Builtin,
            tools: ToolPaths::default(),
        }
    }
}

impl CallerConfig {
    pub fn new<P: AsRef<Path>>(input_file: P, out_dir: P) -> Self {
        Self {
            input_file: input_file.as_ref().to_path_buf(),
            out_dir: out_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }
    /// Parse a TOML profile. Missing fields take their default values.
    pub fn from_toml(profile: &str) -> Result<Self> {
        let config: Self = toml::from_str(profile).map_err(|e| ConcatemerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
    pub fn validate(&self) -> Result<()> {
        if self.input_file.as_os_str().is_empty() {
            return Err(ConcatemerError::Config("input_file is not set".to_string()));
        }
        if self.threads == 0 {
            return Err(ConcatemerError::Config("threads should be positive".to_string()));
        }
        if self.batch_size == 0 {
            return Err(ConcatemerError::Config("batch_size should be positive".to_string()));
        }
        if self.prefix.is_empty() || self.subread_file.is_empty() {
            return Err(ConcatemerError::Config("output names should not be empty".to_string()));
        }
        Ok(())
    }
    pub fn consensus_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}.fasta", self.prefix))
    }
    pub fn subread_path(&self) -> PathBuf {
        self.out_dir.join(&self.subread_file)
    }
    pub fn temp_root(&self) -> PathBuf {
        self.temp_root.clone().unwrap_or_else(std::env::temp_dir)
    }
    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn profile() {
        let profile = r#"
input_file = "reads.fq"
out_dir = "result"
threads = 4
tool_timeout_secs = 600
aligner = "water"

[tools]
racon = "/opt/racon/bin/racon"
"#;
        let config = CallerConfig::from_toml(profile).unwrap();
        assert_eq!(config.threads, 4);
        assert_eq!(config.aligner, AlignerBackend::Water);
        assert_eq!(config.tools.racon, PathBuf::from("/opt/racon/bin/racon"));
        assert_eq!(config.tools.poa, PathBuf::from("poa"));
        assert_eq!(config.tool_timeout(), Some(Duration::from_secs(600)));
        assert_eq!(config.consensus_path(), PathBuf::from("result/R2C2_Consensus.fasta"));
        assert_eq!(config.subread_path(), PathBuf::from("result/subreads.fastq"));
        assert!(!config.resume);
    }
    #[test]
    fn invalid_profiles() {
        assert!(CallerConfig::from_toml("threads = 2").is_err());
        assert!(CallerConfig::from_toml("input_file = \"a.fq\"\nthreads = 0").is_err());
        assert!(CallerConfig::from_toml("input_file = \"a.fq\"\naligner = \"blast\"").is_err());
        assert!(CallerConfig::from_toml("input_file = \"a.fq\"").is_ok());
    }
    #[test]
    fn example_profile() {
        let config = CallerConfig::from_toml(include_str!("../../example.toml")).unwrap();
        assert_eq!(config.threads, 8);
        assert_eq!(config.temp_root(), PathBuf::from("/tmp"));
        assert_eq!(config.tools, ToolPaths::default());
    }
    #[test]
    fn backend_names() {
        assert_eq!("water".parse::<AlignerBackend>().unwrap(), AlignerBackend::Water);
        assert!("smith".parse::<AlignerBackend>().is_err());
    }
}
