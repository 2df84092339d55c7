//! Self-similarity signals.
//!
//! A region of a read is cut into windows of [WINDOW_SIZE] bases, each window is aligned
//! against the first [WINDOW_SIZE] bases of the region, and the per-diagonal scores are summed up
//! at `|diagonal + window start|`. A tandem copy starting `p` bases after the start of the region
//! shows up as a high score at offset `p`.
use crate::error::Result;
use crate::workspace::Workspace;
use std::collections::BTreeMap;

/// Length of the windows and of the probe.
pub const WINDOW_SIZE: usize = 1_000;
/// EDNAFULL scores of a match, a mismatch, and a comparison involving N.
pub const EDNAFULL: (i64, i64, i64) = (5, -4, -2);
/// Ungapped segments scoring less than this are reported as zero.
/// Thirty matching bases in a row, which random sequences of a few kilobases virtually never share.
pub const MIN_SEGMENT_SCORE: i64 = 150;

/// The local alignment engine. It reports, for each diagonal `target position - probe position`,
/// the score of the local alignment on that diagonal.
pub trait LocalAligner: Sync {
    fn diagonal_scores(
        &self,
        target: &[u8],
        probe: &[u8],
        skip_main_diagonal: bool,
        ws: &Workspace,
    ) -> Result<Vec<(i64, i64)>>;
}

/// Aggregated alignment score, ordered by offset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreSignal {
    offsets: Vec<usize>,
    scores: Vec<i64>,
}

impl ScoreSignal {
    pub fn from_map(map: BTreeMap<usize, i64>) -> Self {
        let (offsets, scores) = map.into_iter().unzip();
        Self { offsets, scores }
    }
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }
    pub fn scores(&self) -> &[i64] {
        &self.scores
    }
    /// Offset of the `idx`-th sample.
    pub fn offset(&self, idx: usize) -> Option<usize> {
        self.offsets.get(idx).copied()
    }
    pub fn len(&self) -> usize {
        self.scores.len()
    }
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (usize, i64)> + '_ {
        self.offsets.iter().copied().zip(self.scores.iter().copied())
    }
}

pub struct DiagonalScorer<'a> {
    aligner: &'a dyn LocalAligner,
    window: usize,
}

impl<'a> DiagonalScorer<'a> {
    pub fn new(aligner: &'a dyn LocalAligner) -> Self {
        Self {
            aligner,
            window: WINDOW_SIZE,
        }
    }
    /// Score `target` against the first window of `probe`.
    /// The first window is the probe itself, so its main diagonal is skipped.
    pub fn score(&self, target: &[u8], probe: &[u8], ws: &Workspace) -> Result<ScoreSignal> {
        let probe = &probe[..probe.len().min(self.window)];
        let mut signal: BTreeMap<usize, i64> = BTreeMap::new();
        if probe.is_empty() {
            return Ok(ScoreSignal::default());
        }
        for start in (0..target.len()).step_by(self.window) {
            let end = (start + self.window).min(target.len());
            let diagonals = self
                .aligner
                .diagonal_scores(&target[start..end], probe, start == 0, ws)?;
            trace!("WINDOW\t{start}\t{end}\t{}", diagonals.len());
            for (diagonal, score) in diagonals {
                let offset = (diagonal + start as i64).unsigned_abs() as usize;
                *signal.entry(offset).or_default() += score;
            }
        }
        Ok(ScoreSignal::from_map(signal))
    }
    /// The forward and the reverse signals of a read around its seed.
    /// The reverse signal is computed on the reverse complement of the sequence before the seed.
    pub fn score_around(&self, seq: &[u8], seed: usize, ws: &Workspace) -> Result<(ScoreSignal, ScoreSignal)> {
        let seed = seed.min(seq.len());
        let forward = &seq[seed..];
        let forward = self.score(forward, forward, ws)?;
        let reverse = crate::seq::revcmp(&seq[..seed]);
        let reverse = self.score(&reverse, &reverse, ws)?;
        Ok((forward, reverse))
    }
}

/// In-process local aligner. For each diagonal, it reports the best score of an ungapped
/// local alignment along the diagonal, with EDNAFULL match and mismatch scores.
/// Every diagonal is reported, zero scored ones included. Segments under [MIN_SEGMENT_SCORE]
/// count as zero, so that unrelated sequences give a flat signal, as the gapped aligner does.
/// It approximates `water` well on tandem copies with few indels; noisy copies are better
/// scored by `water`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UngappedDiagonals;

impl UngappedDiagonals {
    fn score(x: u8, y: u8) -> i64 {
        let (x, y) = (x.to_ascii_uppercase(), y.to_ascii_uppercase());
        let (mat, mism, n) = EDNAFULL;
        if x == b'N' || y == b'N' {
            n
        } else if x == y {
            mat
        } else {
            mism
        }
    }
    fn best_on_diagonal(target: &[u8], probe: &[u8], diagonal: i64) -> i64 {
        let (tstart, pstart) = match diagonal >= 0 {
            true => (diagonal as usize, 0),
            false => (0, (-diagonal) as usize),
        };
        let (mut best, mut current) = (0, 0);
        for (&x, &y) in target[tstart..].iter().zip(probe[pstart..].iter()) {
            current = (current + Self::score(x, y)).max(0);
            best = best.max(current);
        }
        match MIN_SEGMENT_SCORE <= best {
            true => best,
            false => 0,
        }
    }
}

impl LocalAligner for UngappedDiagonals {
    fn diagonal_scores(
        &self,
        target: &[u8],
        probe: &[u8],
        skip_main_diagonal: bool,
        _ws: &Workspace,
    ) -> Result<Vec<(i64, i64)>> {
        if target.is_empty() || probe.is_empty() {
            return Ok(vec![]);
        }
        let lower = -(probe.len() as i64 - 1);
        let upper = target.len() as i64 - 1;
        let scores = (lower..=upper)
            .filter(|&d| !(skip_main_diagonal && d == 0))
            .map(|d| (d, Self::best_on_diagonal(target, probe, d)))
            .collect();
        Ok(scores)
    }
}
