//! Consensus calling from the repeat units of a read.
//!
//! The orchestrator first decides whether the peaks of a read can be trusted. If they can,
//! the read is cut into subreads, a draft consensus is built from the interior subreads,
//! the subreads are mapped back to the draft, and the draft is polished with the alignments.
//! The draft is built by a dedicated two-sequence consensus when there are exactly two interior
//! subreads, and by a multiple sequence alignment otherwise.
use crate::error::{ConcatemerError, Result, ToolFailure};
use crate::io;
use crate::period::PeriodEstimate;
use crate::segment::{self, SubreadSink};
use crate::workspace::Workspace;
use definitions::{Read, Subread};
use std::path::{Path, PathBuf};

/// Reads with a period less than or equal to this are rejected.
pub const MIN_PERIOD: f64 = 500f64;
/// Row names containing this are consensus rows of a multiple alignment.
pub const CONSENSUS_ROW: &str = "CONSENS";

/// Rows of a multiple sequence alignment, in the order reported by the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipleAlignment {
    pub rows: Vec<(String, Vec<u8>)>,
}

impl MultipleAlignment {
    pub fn new(rows: Vec<(String, Vec<u8>)>) -> Self {
        Self { rows }
    }
    /// Aligned rows of the input sequences.
    pub fn sequence_rows(&self) -> impl Iterator<Item = &[u8]> {
        self.rows
            .iter()
            .filter(|(name, _)| !name.contains(CONSENSUS_ROW))
            .map(|(_, row)| row.as_slice())
    }
    /// The first consensus row, without gaps.
    pub fn first_consensus(&self) -> Option<Vec<u8>> {
        self.rows
            .iter()
            .find(|(name, _)| name.contains(CONSENSUS_ROW))
            .map(|(_, row)| crate::seq::ungap(row))
    }
}

/// Multiple sequence alignment engine, run in progressive mode.
pub trait MultipleAligner: Sync {
    fn align(&self, units: &[Subread], ws: &Workspace) -> Result<MultipleAlignment>;
}

/// Consensus of exactly two sequences.
pub trait PairwiseConsensus: Sync {
    fn consensus(&self, first: &Subread, second: &Subread, ws: &Workspace) -> Result<Vec<u8>>;
}

/// Long read mapper. Maps `reads` (FASTQ) to `draft` (FASTA) and returns the path to the alignments.
pub trait ReadMapper: Sync {
    fn map(&self, draft: &Path, reads: &Path, ws: &Workspace) -> Result<PathBuf>;
}

/// Consensus polisher. Refines `draft` by `reads` aligned to it.
pub trait Polisher: Sync {
    fn polish(&self, reads: &Path, alignments: &Path, draft: &Path, ws: &Workspace) -> Result<Vec<u8>>;
}

/// The external engines the orchestrator drives.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub msa: &'a dyn MultipleAligner,
    pub pairwise: &'a dyn PairwiseConsensus,
    pub mapper: &'a dyn ReadMapper,
    pub polisher: &'a dyn Polisher,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConsensusOutcome {
    /// Not enough evidence of a tandem repeat.
    Rejected,
    /// The draft came from the two-sequence consensus.
    PairwiseBuilt { consensus: Vec<u8>, repeat_count: usize },
    /// The draft came from the multiple sequence alignment.
    MultiBuilt { consensus: Vec<u8>, repeat_count: usize },
}

impl ConsensusOutcome {
    pub fn consensus(&self) -> &[u8] {
        match self {
            ConsensusOutcome::Rejected => &[],
            ConsensusOutcome::PairwiseBuilt { consensus, .. } => consensus,
            ConsensusOutcome::MultiBuilt { consensus, .. } => consensus,
        }
    }
    pub fn repeat_count(&self) -> usize {
        match self {
            ConsensusOutcome::Rejected => 0,
            ConsensusOutcome::PairwiseBuilt { repeat_count, .. } => *repeat_count,
            ConsensusOutcome::MultiBuilt { repeat_count, .. } => *repeat_count,
        }
    }
    pub fn is_rejected(&self) -> bool {
        matches!(self, ConsensusOutcome::Rejected)
    }
}

pub struct ConsensusOrchestrator<'a> {
    tools: Collaborators<'a>,
    min_period: f64,
}

impl<'a> ConsensusOrchestrator<'a> {
    pub fn new(tools: Collaborators<'a>) -> Self {
        Self {
            tools,
            min_period: MIN_PERIOD,
        }
    }
    /// Build the consensus of `read`. Interior subreads are pushed into `sink`
    /// whenever the read is segmented, even if a collaborator fails afterwards.
    pub fn determine_consensus<S: SubreadSink + ?Sized>(
        &self,
        read: &Read,
        estimate: &PeriodEstimate,
        sink: &mut S,
        ws: &Workspace,
    ) -> Result<ConsensusOutcome> {
        if !estimate.is_trustworthy(self.min_period) {
            debug!("REJECT\t{}\t{:?}\t{}", read.id, estimate.period, estimate.peaks.len());
            return Ok(ConsensusOutcome::Rejected);
        }
        let segmentation = segment::segment(read, &estimate.peaks, sink)?;
        let repeat_count = segmentation.repeat_count();
        let (draft, is_pairwise) = match segmentation.interior.as_slice() {
            [] => {
                debug!("REJECT\t{}\tNo interior subread", read.id);
                return Ok(ConsensusOutcome::Rejected);
            }
            [first, second] => (self.tools.pairwise.consensus(first, second, ws)?, true),
            units => {
                let msa = self.tools.msa.align(units, ws)?;
                let draft = msa.first_consensus().ok_or_else(|| {
                    ConcatemerError::tool("msa", ToolFailure::MissingOutput, "no consensus row")
                })?;
                (draft, false)
            }
        };
        if draft.is_empty() {
            return Err(ConcatemerError::tool("draft", ToolFailure::EmptyOutput, &read.id));
        }
        let draft_path = ws.file("draft.fa");
        io::write_fasta(&draft_path, &[(read.id.as_str(), draft.as_slice())])?;
        let reads_path = ws.file("subreads.fq");
        let subreads: Vec<_> = segmentation.subreads().collect();
        io::write_subreads(&reads_path, &subreads)?;
        let alignments = self.tools.mapper.map(&draft_path, &reads_path, ws)?;
        let consensus = self
            .tools
            .polisher
            .polish(&reads_path, &alignments, &draft_path, ws)?;
        if consensus.is_empty() {
            return Err(ConcatemerError::tool("polisher", ToolFailure::EmptyOutput, &read.id));
        }
        debug!("CONSENSUS\t{}\t{}\t{}\t{}", read.id, repeat_count, draft.len(), consensus.len());
        Ok(match is_pairwise {
            true => ConsensusOutcome::PairwiseBuilt {
                consensus,
                repeat_count,
            },
            false => ConsensusOutcome::MultiBuilt {
                consensus,
                repeat_count,
            },
        })
    }
}
