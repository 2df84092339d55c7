//! Definitions -- A tiny interface for concatemeric read consensus calling.
//! Every other crate in this workspace passes reads, subreads, and consensus records around
//! through the structures defined here. They are plain data; all the algorithms live in `concatemer`.

use serde::{Deserialize, Serialize};

/// A concatemeric read. It is immutable once parsed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Read {
    /// Name of the read, without the trailing seed field.
    pub id: String,
    /// 0-based position of the first occurrence of the adapter.
    pub seed: usize,
    /// Sequence. It is a string on an alphabet of A,C,G,T,N (lowercase included).
    pub seq: Vec<u8>,
    /// Phred+33 encoded quality. Same length as `seq`.
    pub qual: Vec<u8>,
}

impl Read {
    pub fn new(id: String, seed: usize, seq: Vec<u8>, qual: Vec<u8>) -> Self {
        Self { id, seed, seq, qual }
    }
    /// Split a FASTQ identifier of the form `<read-id>_<seed-offset>`.
    /// The split is at the last underscore, so read ids may contain underscores.
    pub fn parse_header(header: &str) -> Option<(&str, usize)> {
        let (id, seed) = header.rsplit_once('_')?;
        let seed = seed.parse().ok()?;
        (!id.is_empty()).then_some((id, seed))
    }
    pub fn seq(&self) -> &[u8] {
        &self.seq
    }
    pub fn qual(&self) -> &[u8] {
        &self.qual
    }
    pub fn len(&self) -> usize {
        self.seq.len()
    }
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
    /// Mean Phred score of the read. Zero for an empty read.
    pub fn average_quality(&self) -> f64 {
        if self.qual.is_empty() {
            return 0f64;
        }
        let sum: u64 = self.qual.iter().map(|&q| q.saturating_sub(33) as u64).sum();
        sum as f64 / self.qual.len() as f64
    }
}

impl std::fmt::Display for Read {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let seq = String::from_utf8_lossy(&self.seq);
        let qual = String::from_utf8_lossy(&self.qual);
        write!(f, "@{}_{}\n{}\n+\n{}", self.id, self.seed, seq, qual)
    }
}

/// Where a subread came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SubreadKind {
    /// A slice between two consecutive peaks.
    Interior,
    /// The fragment before the first peak or after the last peak.
    Flank,
}

/// A contiguous slice of a read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subread {
    /// Ordinal index. Interior subreads are numbered from 1 by their interval,
    /// the leading flank is 0 and the trailing flank is the number of intervals + 1.
    pub index: usize,
    pub kind: SubreadKind,
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
}

impl Subread {
    pub fn new(index: usize, kind: SubreadKind, seq: &[u8], qual: &[u8]) -> Self {
        Self {
            index,
            kind,
            seq: seq.to_vec(),
            qual: qual.to_vec(),
        }
    }
    pub fn seq(&self) -> &[u8] {
        &self.seq
    }
    pub fn qual(&self) -> &[u8] {
        &self.qual
    }
    pub fn len(&self) -> usize {
        self.seq.len()
    }
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
    pub fn is_interior(&self) -> bool {
        self.kind == SubreadKind::Interior
    }
}

/// The corrected consensus of a read, with the annotation written into its header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsensusRecord {
    pub id: String,
    pub average_quality: f64,
    pub read_length: usize,
    pub repeat_count: usize,
    pub seq: Vec<u8>,
}

impl ConsensusRecord {
    pub fn new(read: &Read, repeat_count: usize, seq: Vec<u8>) -> Self {
        Self {
            id: read.id.clone(),
            average_quality: read.average_quality(),
            read_length: read.len(),
            repeat_count,
            seq,
        }
    }
    /// `<read-id>_<avg-quality>_<original-length>_<repeat-count>_<corrected-length>`
    pub fn header(&self) -> String {
        format!(
            "{}_{:.2}_{}_{}_{}",
            self.id,
            self.average_quality,
            self.read_length,
            self.repeat_count,
            self.seq.len()
        )
    }
    /// Repeat count field of a consensus header. The read id may contain underscores,
    /// so the fields are counted from the right.
    pub fn repeat_count_of(header: &str) -> Option<usize> {
        header.rsplit('_').nth(1).and_then(|x| x.parse().ok())
    }
    /// Read id of a consensus header.
    pub fn id_of(header: &str) -> Option<&str> {
        let mut fields = header.rsplitn(5, '_');
        (0..4).try_for_each(|_| fields.next().map(|_| ()))?;
        fields.next()
    }
}

impl std::fmt::Display for ConsensusRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let seq = String::from_utf8_lossy(&self.seq);
        write!(f, ">{}\n{}", self.header(), seq)
    }
}

/// Peak calling summary of a read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeakReport {
    pub id: String,
    pub length: usize,
    pub peaks: Vec<usize>,
    pub period: Option<f64>,
}
