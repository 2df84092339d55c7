//! Error types of the concatemer crate.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConcatemerError>;

/// How an external tool failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolFailure {
    /// The executable could not be started.
    Spawn,
    /// The process exited with a non-zero status.
    NonZeroExit,
    /// The process exceeded its time budget and was killed.
    TimedOut,
    /// The expected output file was not produced.
    MissingOutput,
    /// The output could not be parsed.
    MalformedOutput,
    /// The output was well formed but held no sequence.
    EmptyOutput,
}

impl std::fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let desc = match self {
            ToolFailure::Spawn => "could not be started",
            ToolFailure::NonZeroExit => "exited with non-zero status",
            ToolFailure::TimedOut => "timed out",
            ToolFailure::MissingOutput => "produced no output",
            ToolFailure::MalformedOutput => "produced malformed output",
            ToolFailure::EmptyOutput => "produced an empty sequence",
        };
        write!(f, "{desc}")
    }
}

#[derive(Debug, Error)]
pub enum ConcatemerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid FASTQ record {id}: {msg}")]
    InvalidRecord { id: String, msg: String },

    #[error("FASTQ parse error: {0}")]
    Fastq(#[from] bio::io::fastq::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{tool} {kind}: {detail}")]
    Tool {
        tool: String,
        kind: ToolFailure,
        detail: String,
    },
}

impl ConcatemerError {
    pub fn tool(tool: &str, kind: ToolFailure, detail: impl Into<String>) -> Self {
        ConcatemerError::Tool {
            tool: tool.to_string(),
            kind,
            detail: detail.into(),
        }
    }
    pub fn tool_failure(&self) -> Option<ToolFailure> {
        match self {
            ConcatemerError::Tool { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
