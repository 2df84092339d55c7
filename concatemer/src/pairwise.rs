//! Consensus of two subreads by quality voting on their alignment.
use crate::consensus::{MultipleAligner, PairwiseConsensus};
use crate::error::{ConcatemerError, Result, ToolFailure};
use crate::seq::is_gap;
use crate::workspace::Workspace;
use definitions::Subread;

/// Aligns the two subreads with a multiple aligner, then decides each column.
/// A mismatch goes to the base with the higher quality (the first on ties).
/// A base aligned to a gap is kept if its quality is at least the quality of the gap,
/// which is the lower quality of the two bases around the gap.
pub struct QualityVote<'a> {
    aligner: &'a dyn MultipleAligner,
}

impl<'a> QualityVote<'a> {
    pub fn new(aligner: &'a dyn MultipleAligner) -> Self {
        Self { aligner }
    }
}

impl PairwiseConsensus for QualityVote<'_> {
    fn consensus(&self, first: &Subread, second: &Subread, ws: &Workspace) -> Result<Vec<u8>> {
        let units = [first.clone(), second.clone()];
        let msa = self.aligner.align(&units, ws)?;
        let rows: Vec<_> = msa.sequence_rows().collect();
        let malformed = |msg: &str| ConcatemerError::tool("pairwise", ToolFailure::MalformedOutput, msg);
        let (row1, row2) = match rows.as_slice() {
            [row1, row2] => (*row1, *row2),
            _ => return Err(malformed("the alignment should have two rows")),
        };
        if row1.len() != row2.len() {
            return Err(malformed("rows differ in length"));
        }
        let row1 = AlignedRow::new(row1, first.qual()).ok_or_else(|| malformed("row does not match the subread"))?;
        let row2 = AlignedRow::new(row2, second.qual()).ok_or_else(|| malformed("row does not match the subread"))?;
        Ok(vote(&row1, &row2))
    }
}

/// Quality of each column of an aligned row. Gap columns get the quality of the gap.
#[derive(Debug, Clone)]
struct AlignedRow<'a> {
    row: &'a [u8],
    quals: Vec<u8>,
}

impl<'a> AlignedRow<'a> {
    fn new(row: &'a [u8], qual: &[u8]) -> Option<Self> {
        if row.iter().filter(|&&b| !is_gap(b)).count() != qual.len() {
            return None;
        }
        let mut quals = vec![0; row.len()];
        let mut bases = 0;
        for (q, &b) in quals.iter_mut().zip(row.iter()) {
            if !is_gap(b) {
                *q = qual[bases];
                bases += 1;
            }
        }
        // Quality of the base before each gap column, then the minimum with the base after it.
        let mut prev = None;
        for (q, &b) in quals.iter_mut().zip(row.iter()) {
            match is_gap(b) {
                true => *q = prev.unwrap_or(u8::MAX),
                false => prev = Some(*q),
            }
        }
        let mut next = None;
        for (q, &b) in quals.iter_mut().zip(row.iter()).rev() {
            match is_gap(b) {
                true => *q = (*q).min(next.unwrap_or(u8::MAX)),
                false => next = Some(*q),
            }
        }
        Some(Self { row, quals })
    }
}

fn vote(row1: &AlignedRow, row2: &AlignedRow) -> Vec<u8> {
    let columns = row1.row.iter().zip(row1.quals.iter());
    let columns = columns.zip(row2.row.iter().zip(row2.quals.iter()));
    columns
        .filter_map(|((&b1, &q1), (&b2, &q2))| match (is_gap(b1), is_gap(b2)) {
            (true, true) => None,
            (false, false) if b1 == b2 || q2 <= q1 => Some(b1),
            (false, false) => Some(b2),
            (false, true) => (q2 <= q1).then_some(b1),
            (true, false) => (q1 <= q2).then_some(b2),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::MultipleAlignment;
    use definitions::SubreadKind;
    struct Fixed(Vec<&'static [u8]>);
    impl MultipleAligner for Fixed {
        fn align(&self, _: &[Subread], _: &Workspace) -> Result<MultipleAlignment> {
            let mut rows: Vec<_> = self
                .0
                .iter()
                .enumerate()
                .map(|(i, row)| (i.to_string(), row.to_vec()))
                .collect();
            rows.push(("CONSENS0".to_string(), b"NNNN".to_vec()));
            Ok(MultipleAlignment::new(rows))
        }
    }
    fn subread(seq: &[u8], qual: &[u8]) -> Subread {
        Subread::new(1, SubreadKind::Interior, seq, qual)
    }
    #[test]
    fn mismatch_goes_to_higher_quality() {
        let ws = Workspace::new("test").unwrap();
        let aligner = Fixed(vec![b"ACGT", b"ACTT"]);
        let voter = QualityVote::new(&aligner);
        let (first, second) = (subread(b"ACGT", b"IIII"), subread(b"ACTT", b"II+I"));
        assert_eq!(voter.consensus(&first, &second, &ws).unwrap(), b"ACGT");
        let (first, second) = (subread(b"ACGT", b"II+I"), subread(b"ACTT", b"IIII"));
        assert_eq!(voter.consensus(&first, &second, &ws).unwrap(), b"ACTT");
        // Ties go to the first subread.
        let (first, second) = (subread(b"ACGT", b"IIII"), subread(b"ACTT", b"IIII"));
        assert_eq!(voter.consensus(&first, &second, &ws).unwrap(), b"ACGT");
    }
    #[test]
    fn insertions_are_judged_by_the_gap() {
        let ws = Workspace::new("test").unwrap();
        let aligner = Fixed(vec![b"AC-GT", b"ACAGT"]);
        let voter = QualityVote::new(&aligner);
        // The inserted base is poorer than the bases around the gap.
        let (first, second) = (subread(b"ACGT", b"IIII"), subread(b"ACAGT", b"II+II"));
        assert_eq!(voter.consensus(&first, &second, &ws).unwrap(), b"ACGT");
        // The inserted base is as good as the poorer base around the gap.
        let (first, second) = (subread(b"ACGT", b"I5II"), subread(b"ACAGT", b"II5II"));
        assert_eq!(voter.consensus(&first, &second, &ws).unwrap(), b"ACAGT");
    }
    #[test]
    fn malformed_alignment() {
        let ws = Workspace::new("test").unwrap();
        let (first, second) = (subread(b"ACGT", b"IIII"), subread(b"ACGT", b"IIII"));
        let aligner = Fixed(vec![b"ACGT"]);
        let err = QualityVote::new(&aligner)
            .consensus(&first, &second, &ws)
            .unwrap_err();
        assert_eq!(err.tool_failure(), Some(ToolFailure::MalformedOutput));
        let aligner = Fixed(vec![b"ACGT", b"ACG"]);
        assert!(QualityVote::new(&aligner).consensus(&first, &second, &ws).is_err());
        let aligner = Fixed(vec![b"ACGTA", b"ACGT-"]);
        assert!(QualityVote::new(&aligner).consensus(&first, &second, &ws).is_err());
    }
}
