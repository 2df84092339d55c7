//! Consensus calling for concatemeric reads.
//!
//! A read holding several tandem copies of a template is aligned against itself, the copy boundaries are
//! called as peaks of the self-similarity signal, and the copies are merged into a polished consensus.
pub mod config;
pub mod consensus;
pub mod diagonal;
pub mod error;
pub mod external;
pub mod io;
pub mod pairwise;
pub mod peak;
pub mod period;
pub mod pipeline;
pub mod segment;
pub mod seq;
pub mod smoothing;
pub mod workspace;
#[macro_use]
extern crate log;

pub use config::CallerConfig;
pub use consensus::{ConsensusOrchestrator, ConsensusOutcome};
pub use diagonal::{DiagonalScorer, ScoreSignal};
pub use error::{ConcatemerError, Result};
pub use peak::PeakDetector;
pub use period::PeriodEstimate;
pub use smoothing::SavitzkyGolay;
