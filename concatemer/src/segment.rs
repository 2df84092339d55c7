//! Cutting a read into repeat units.
use crate::error::Result;
use definitions::{Read, Subread, SubreadKind};
use std::io::Write;

/// Interior subreads should be longer than this.
pub const MIN_INTERIOR_LEN: usize = 30;
/// Flanking fragments should be longer than this.
pub const MIN_FLANK_LEN: usize = 50;

/// Destination of the interior subreads.
pub trait SubreadSink {
    fn push(&mut self, read_id: &str, subread: &Subread) -> Result<()>;
}

impl SubreadSink for Vec<(String, Subread)> {
    fn push(&mut self, read_id: &str, subread: &Subread) -> Result<()> {
        Vec::push(self, (read_id.to_string(), subread.clone()));
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SubreadSink for NullSink {
    fn push(&mut self, _: &str, _: &Subread) -> Result<()> {
        Ok(())
    }
}

/// Writes subreads as FASTQ records named `<read-id>_<index>`.
pub struct FastqSink<W: Write> {
    wtr: bio::io::fastq::Writer<W>,
}

impl<W: Write> FastqSink<W> {
    pub fn new(wtr: W) -> Self {
        Self {
            wtr: bio::io::fastq::Writer::new(wtr),
        }
    }
    pub fn flush(&mut self) -> Result<()> {
        self.wtr.flush()?;
        Ok(())
    }
}

impl<W: Write> SubreadSink for FastqSink<W> {
    fn push(&mut self, read_id: &str, subread: &Subread) -> Result<()> {
        let id = format!("{}_{}", read_id, subread.index);
        self.wtr.write(&id, None, subread.seq(), subread.qual())?;
        Ok(())
    }
}

/// Subreads of a read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segmentation {
    pub interior: Vec<Subread>,
    pub flanks: Vec<Subread>,
}

impl Segmentation {
    /// The number of interior subreads.
    pub fn repeat_count(&self) -> usize {
        self.interior.len()
    }
    /// Interior subreads, then the flanks.
    pub fn subreads(&self) -> impl Iterator<Item = &Subread> {
        self.interior.iter().chain(self.flanks.iter())
    }
}

/// Cut `read` at `peaks` (ascending, in read coordinates).
/// A slice between two consecutive peaks is kept if it is longer than [MIN_INTERIOR_LEN].
/// The fragments before the first peak and after the last peak are kept only if
/// both of them are longer than [MIN_FLANK_LEN].
/// Interior subreads are also pushed into `sink`.
pub fn segment<S: SubreadSink + ?Sized>(read: &Read, peaks: &[usize], sink: &mut S) -> Result<Segmentation> {
    let (seq, qual) = (read.seq(), read.qual());
    let peaks: Vec<_> = peaks.iter().copied().filter(|&p| p <= seq.len()).collect();
    let mut segmentation = Segmentation::default();
    let (first, last) = match (peaks.first(), peaks.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return Ok(segmentation),
    };
    for (i, w) in peaks.windows(2).enumerate() {
        let (start, end) = (w[0], w[1]);
        if MIN_INTERIOR_LEN < end - start {
            let subread = Subread::new(i + 1, SubreadKind::Interior, &seq[start..end], &qual[start..end]);
            sink.push(&read.id, &subread)?;
            segmentation.interior.push(subread);
        }
    }
    if MIN_FLANK_LEN < first && MIN_FLANK_LEN < seq.len() - last {
        let intervals = peaks.len() - 1;
        let head = Subread::new(0, SubreadKind::Flank, &seq[..first], &qual[..first]);
        let tail = Subread::new(intervals + 1, SubreadKind::Flank, &seq[last..], &qual[last..]);
        segmentation.flanks.push(head);
        segmentation.flanks.push(tail);
    }
    debug!(
        "SEGMENT\t{}\t{}\t{}",
        read.id,
        segmentation.interior.len(),
        segmentation.flanks.len()
    );
    Ok(segmentation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_xoshiro::Xoroshiro128PlusPlus;
    fn gen_read(seed: u64, len: usize) -> Read {
        let mut rng: Xoroshiro128PlusPlus = SeedableRng::seed_from_u64(seed);
        let seq: Vec<u8> = (0..len).map(|_| *b"ACGT".choose(&mut rng).unwrap()).collect();
        let qual: Vec<u8> = (0..len).map(|_| rng.gen_range(b'+'..b'J')).collect();
        Read::new("read".to_string(), 0, seq, qual)
    }
    #[test]
    fn interior_and_flanks() {
        let read = gen_read(1, 3_300);
        let mut sink: Vec<(String, Subread)> = vec![];
        let seg = segment(&read, &[100, 1_100, 2_100, 3_100], &mut sink).unwrap();
        assert_eq!(seg.repeat_count(), 3);
        assert_eq!(seg.flanks.len(), 2);
        assert_eq!(seg.interior[0].seq(), &read.seq()[100..1_100]);
        assert_eq!(seg.interior[2].qual(), &read.qual()[2_100..3_100]);
        let indices: Vec<_> = seg.subreads().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 0, 4]);
        assert_eq!(seg.flanks[1].seq(), &read.seq()[3_100..]);
        // Only interior subreads go to the sink.
        assert_eq!(sink.len(), 3);
        assert!(sink.iter().all(|(id, s)| id == "read" && s.is_interior()));
    }
    #[test]
    fn short_pieces_are_dropped() {
        let read = gen_read(2, 1_000);
        let mut sink: Vec<(String, Subread)> = vec![];
        let seg = segment(&read, &[40, 70, 101, 600, 950], &mut sink).unwrap();
        // 30 bases is not enough, 31 bases is.
        let lens: Vec<_> = seg.interior.iter().map(|s| s.len()).collect();
        assert_eq!(lens, vec![31, 499, 350]);
        let indices: Vec<_> = seg.interior.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![2, 3, 4]);
        // The head is 40 bases, so neither flank is kept.
        assert!(seg.flanks.is_empty());
    }
    #[test]
    fn flanks_need_both_sides() {
        let read = gen_read(3, 1_000);
        let seg = segment(&read, &[51, 500, 949], &mut NullSink).unwrap();
        assert_eq!(seg.flanks.len(), 2);
        let seg = segment(&read, &[51, 500, 950], &mut NullSink).unwrap();
        assert!(seg.flanks.is_empty());
        let seg = segment(&read, &[50, 500, 900], &mut NullSink).unwrap();
        assert!(seg.flanks.is_empty());
    }
    #[test]
    fn random_peaks_respect_the_thresholds() {
        let read = gen_read(4, 2_000);
        let mut rng: Xoroshiro128PlusPlus = SeedableRng::seed_from_u64(49);
        for _ in 0..200 {
            let mut peaks: Vec<usize> = (0..rng.gen_range(1..20))
                .map(|_| rng.gen_range(0..=2_000))
                .collect();
            peaks.sort_unstable();
            peaks.dedup();
            let seg = segment(&read, &peaks, &mut NullSink).unwrap();
            assert!(seg.interior.iter().all(|s| s.len() > MIN_INTERIOR_LEN));
            assert!(seg.flanks.iter().all(|s| s.len() > MIN_FLANK_LEN));
            assert!(seg.flanks.is_empty() || seg.flanks.len() == 2);
        }
    }
    #[test]
    fn no_peaks() {
        let read = gen_read(5, 500);
        let seg = segment(&read, &[], &mut NullSink).unwrap();
        assert_eq!(seg, Segmentation::default());
    }
    #[test]
    fn fastq_sink() {
        let read = gen_read(6, 300);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subreads.fq");
        {
            let mut sink = FastqSink::new(std::fs::File::create(&path).unwrap());
            segment(&read, &[0, 100, 200], &mut sink).unwrap();
            sink.flush().unwrap();
        }
        let text = std::fs::read_to_string(&path).unwrap();
        let headers: Vec<_> = text.lines().step_by(4).collect();
        assert_eq!(headers, vec!["@read_1", "@read_2"]);
        let seqs: Vec<_> = text.lines().skip(1).step_by(4).collect();
        assert_eq!(seqs[1].as_bytes(), &read.seq()[100..200]);
    }
}
