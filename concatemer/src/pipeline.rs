//! Pipelines -- from a FASTQ file of concatemeric reads to consensus sequences.
//!
//! Reads are processed batch by batch. The reads of a batch are called in parallel, each in its own
//! workspace, and the results are written in input order. After a batch is flushed, the ids of its reads
//! are appended to the checkpoint so that an interrupted run can be resumed.
use crate::config::{AlignerBackend, CallerConfig};
use crate::consensus::{Collaborators, ConsensusOrchestrator, ConsensusOutcome, MultipleAligner};
use crate::diagonal::{DiagonalScorer, LocalAligner, UngappedDiagonals};
use crate::error::{ConcatemerError, Result};
use crate::external::{Minimap2, Poa, Racon, ToolRunner, Water};
use crate::io::{self, Checkpoint, ConsensusWriter};
use crate::pairwise::QualityVote;
use crate::peak::PeakDetector;
use crate::period::PeriodEstimate;
use crate::segment::{FastqSink, SubreadSink};
use crate::workspace::Workspace;
use definitions::{ConsensusRecord, PeakReport, Read, Subread};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Reads of this length or shorter are skipped.
pub const MIN_READ_LEN: usize = 1_000;

/// The engines behind the collaborators, built from the configuration.
pub struct Toolbox {
    aligner: Box<dyn LocalAligner>,
    poa: Poa,
    minimap2: Minimap2,
    racon: Racon,
}

impl Toolbox {
    pub fn new(config: &CallerConfig) -> Self {
        let (tools, timeout) = (&config.tools, config.tool_timeout());
        let aligner: Box<dyn LocalAligner> = match config.aligner {
            AlignerBackend::Builtin => Box::new(UngappedDiagonals),
            AlignerBackend::Water => Box::new(Water::new(ToolRunner::new("water", &tools.water, timeout))),
        };
        let poa = Poa::new(ToolRunner::new("poa", &tools.poa, timeout), &tools.poa_matrix);
        let minimap2 = Minimap2::new(ToolRunner::new("minimap2", &tools.minimap2, timeout));
        let racon = Racon::new(ToolRunner::new("racon", &tools.racon, timeout));
        Self {
            aligner,
            poa,
            minimap2,
            racon,
        }
    }
    pub fn aligner(&self) -> &dyn LocalAligner {
        self.aligner.as_ref()
    }
    pub fn msa(&self) -> &dyn MultipleAligner {
        &self.poa
    }
    pub fn collaborators<'a>(&'a self, pairwise: &'a QualityVote<'a>) -> Collaborators<'a> {
        Collaborators {
            msa: &self.poa,
            pairwise,
            mapper: &self.minimap2,
            polisher: &self.racon,
        }
    }
}

/// Everything known about a read after calling.
#[derive(Debug, Clone)]
pub struct CallResult {
    pub estimate: PeriodEstimate,
    pub outcome: ConsensusOutcome,
    /// Interior subreads, tagged with the read id.
    pub subreads: Vec<(String, Subread)>,
}

/// Calls the consensus of a single read.
pub struct Caller<'a> {
    scorer: DiagonalScorer<'a>,
    forward: PeakDetector,
    reverse: PeakDetector,
    orchestrator: ConsensusOrchestrator<'a>,
    temp_root: PathBuf,
}

impl<'a> Caller<'a> {
    pub fn new<P: AsRef<Path>>(aligner: &'a dyn LocalAligner, tools: Collaborators<'a>, temp_root: P) -> Result<Self> {
        Ok(Self {
            scorer: DiagonalScorer::new(aligner),
            forward: PeakDetector::forward()?,
            reverse: PeakDetector::reverse()?,
            orchestrator: ConsensusOrchestrator::new(tools),
            temp_root: temp_root.as_ref().to_path_buf(),
        })
    }
    /// Peaks and period of `read`.
    pub fn estimate(&self, read: &Read, ws: &Workspace) -> Result<PeriodEstimate> {
        let (forward, reverse) = self.scorer.score_around(read.seq(), read.seed, ws)?;
        let forward = self.forward.call(&forward);
        let reverse = self.reverse.call(&reverse);
        let estimate = PeriodEstimate::new(read.seed, &forward, &reverse);
        debug!("PEAKS\t{}\t{}\t{:?}\t{:?}", read.id, read.len(), estimate.peaks, estimate.period);
        Ok(estimate)
    }
    pub fn call(&self, read: &Read) -> Result<CallResult> {
        debug!("START\t{}\t{}", read.id, read.len());
        let ws = Workspace::new_in(&self.temp_root, &read.id)?;
        let estimate = self.estimate(read, &ws)?;
        let mut subreads: Vec<(String, Subread)> = vec![];
        let outcome = self
            .orchestrator
            .determine_consensus(read, &estimate, &mut subreads, &ws)?;
        debug!("END\t{}\t{}", read.id, outcome.repeat_count());
        Ok(CallResult {
            estimate,
            outcome,
            subreads,
        })
    }
    pub fn report(&self, read: &Read) -> Result<PeakReport> {
        let ws = Workspace::new_in(&self.temp_root, &read.id)?;
        let estimate = self.estimate(read, &ws)?;
        Ok(PeakReport {
            id: read.id.clone(),
            length: read.len(),
            peaks: estimate.peaks,
            period: estimate.period,
        })
    }
}

/// Counts of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Reads listed in the checkpoint of a previous run.
    pub resumed: usize,
    /// Reads of length at most [MIN_READ_LEN].
    pub short: usize,
    pub rejected: usize,
    pub pairwise: usize,
    pub multi: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn built(&self) -> usize {
        self.pairwise + self.multi
    }
}

/// Run the whole pipeline with the external tools given in `config`.
pub fn run(config: &CallerConfig) -> Result<RunSummary> {
    config.validate()?;
    let toolbox = Toolbox::new(config);
    let pairwise = QualityVote::new(toolbox.msa());
    let caller = Caller::new(toolbox.aligner(), toolbox.collaborators(&pairwise), config.temp_root())?;
    run_with(config, &caller)
}

/// Run the pipeline with `caller`.
pub fn run_with(config: &CallerConfig, caller: &Caller) -> Result<RunSummary> {
    std::fs::create_dir_all(&config.out_dir)?;
    let consensus_path = config.consensus_path();
    let mut checkpoint = Checkpoint::open(&consensus_path, config.resume)?;
    let mut consensus = ConsensusWriter::new(io::open_output(&consensus_path, config.resume)?);
    let mut subreads = FastqSink::new(io::open_output(config.subread_path(), config.resume)?);
    let mut summary = RunSummary::default();
    let mut reads = io::open_reads(&config.input_file)?;
    loop {
        let batch: Vec<Read> = reads.by_ref().take(config.batch_size).collect::<Result<_>>()?;
        if batch.is_empty() {
            break;
        }
        let (todo, short): (Vec<_>, Vec<_>) = batch
            .iter()
            .filter(|read| !checkpoint.contains(&read.id))
            .partition(|read| MIN_READ_LEN < read.len());
        summary.resumed += batch.len() - todo.len() - short.len();
        summary.short += short.len();
        debug!("BATCH\t{}\t{}\t{}", batch.len(), todo.len(), short.len());
        let results: Vec<_> = todo.par_iter().map(|read| caller.call(read)).collect();
        for (read, result) in todo.iter().zip(results) {
            let result = match result {
                Ok(result) => result,
                Err(why) => {
                    warn!("FAILED\t{}\t{}", read.id, why);
                    summary.failed += 1;
                    continue;
                }
            };
            for (id, subread) in result.subreads.iter() {
                subreads.push(id, subread)?;
            }
            match &result.outcome {
                ConsensusOutcome::Rejected => summary.rejected += 1,
                ConsensusOutcome::PairwiseBuilt { .. } => summary.pairwise += 1,
                ConsensusOutcome::MultiBuilt { .. } => summary.multi += 1,
            }
            if !result.outcome.is_rejected() {
                let seq = result.outcome.consensus().to_vec();
                consensus.write(&ConsensusRecord::new(read, result.outcome.repeat_count(), seq))?;
            }
        }
        consensus.flush()?;
        subreads.flush()?;
        let ids = batch.iter().map(|read| read.id.as_str());
        let ids: Vec<_> = ids.filter(|id| !checkpoint.contains(id)).collect();
        checkpoint.append(ids)?;
    }
    info!("SUMMARY\t{}", serde_json::json!(summary));
    Ok(summary)
}

/// Write the peaks and the period of each read as JSON lines. Returns the number of reads reported.
pub fn report_peaks<W: Write>(config: &CallerConfig, caller: &Caller, wtr: &mut W) -> Result<usize> {
    let mut reads = io::open_reads(&config.input_file)?;
    let mut reported = 0;
    loop {
        let batch: Vec<Read> = reads.by_ref().take(config.batch_size).collect::<Result<_>>()?;
        if batch.is_empty() {
            break;
        }
        let reports: Vec<_> = batch
            .par_iter()
            .filter(|read| MIN_READ_LEN < read.len())
            .map(|read| caller.report(read))
            .collect();
        for report in reports {
            match report {
                Ok(report) => {
                    let line = serde_json::to_string(&report).map_err(std::io::Error::from)?;
                    writeln!(wtr, "{line}")?;
                    reported += 1;
                }
                Err(why) => warn!("FAILED\t{}", why),
            }
        }
    }
    wtr.flush()?;
    Ok(reported)
}

/// Consensus records with a zero repeat count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZeroRepeat {
    pub records: usize,
    pub zero: usize,
}

impl ZeroRepeat {
    /// Percentage of the records with zero repeats. `None` if there is no record.
    pub fn percentage(&self) -> Option<f64> {
        (0 < self.records).then(|| 100f64 * self.zero as f64 / self.records as f64)
    }
}

/// Count the records of a consensus FASTA with a zero repeat count.
pub fn zero_repeat<P: AsRef<Path>>(path: P) -> Result<ZeroRepeat> {
    let mut stats = ZeroRepeat::default();
    for (header, _) in io::read_fasta(path)? {
        let count = ConsensusRecord::repeat_count_of(&header).ok_or_else(|| ConcatemerError::InvalidRecord {
            id: header.clone(),
            msg: "no repeat count in the header".to_string(),
        })?;
        stats.records += 1;
        stats.zero += (count == 0) as usize;
    }
    Ok(stats)
}
