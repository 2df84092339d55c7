//! File formats: FASTQ input, FASTA and FASTQ files for the external tools, and the consensus output.
use crate::error::{ConcatemerError, Result};
use bio::io::{fasta, fastq};
use definitions::{ConsensusRecord, Read, Subread};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Convert a FASTQ record with an identifier `<read-id>_<seed-offset>` into a read.
pub fn parse_record(record: &fastq::Record) -> Result<Read> {
    let invalid = |msg: &str| ConcatemerError::InvalidRecord {
        id: record.id().to_string(),
        msg: msg.to_string(),
    };
    let (id, seed) = Read::parse_header(record.id())
        .ok_or_else(|| invalid("the identifier should be <read-id>_<seed-offset>"))?;
    if record.seq().len() != record.qual().len() {
        return Err(invalid("sequence and quality differ in length"));
    }
    if record.seq().len() < seed {
        return Err(invalid("the seed is beyond the end of the read"));
    }
    Ok(Read::new(
        id.to_string(),
        seed,
        record.seq().to_vec(),
        record.qual().to_vec(),
    ))
}

/// Stream the reads of a FASTQ file.
pub fn open_reads<P: AsRef<Path>>(path: P) -> Result<impl Iterator<Item = Result<Read>>> {
    let reader = fastq::Reader::new(File::open(path)?);
    let reads = reader.records().map(|record| parse_record(&record?));
    Ok(reads)
}

/// All the reads of a FASTQ file.
pub fn read_reads<P: AsRef<Path>>(path: P) -> Result<Vec<Read>> {
    open_reads(path)?.collect()
}

/// Raw FASTQ records, without interpreting the identifiers.
pub fn read_fastq_records<P: AsRef<Path>>(path: P) -> Result<Vec<fastq::Record>> {
    let reader = fastq::Reader::new(File::open(path)?);
    let records: std::result::Result<Vec<_>, _> = reader.records().collect();
    Ok(records?)
}

/// `(name, sequence)` of each record of a FASTA file.
pub fn read_fasta<P: AsRef<Path>>(path: P) -> Result<Vec<(String, Vec<u8>)>> {
    let reader = fasta::Reader::new(File::open(path)?);
    reader
        .records()
        .map(|record| {
            let record = record?;
            Ok((record.id().to_string(), record.seq().to_vec()))
        })
        .collect()
}

pub fn write_fasta<P: AsRef<Path>, S: AsRef<[u8]>>(path: P, records: &[(&str, S)]) -> Result<()> {
    let mut wtr = fasta::Writer::new(BufWriter::new(File::create(path)?));
    for (id, seq) in records {
        wtr.write(id, None, seq.as_ref())?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write subreads as FASTQ, named by their indices.
pub fn write_subreads<P: AsRef<Path>>(path: P, subreads: &[&Subread]) -> Result<()> {
    let mut wtr = fastq::Writer::new(BufWriter::new(File::create(path)?));
    for subread in subreads {
        wtr.write(&subread.index.to_string(), None, subread.seq(), subread.qual())?;
    }
    wtr.flush()?;
    Ok(())
}

/// Open an output file, truncating it unless `append` is set.
pub fn open_output<P: AsRef<Path>>(path: P, append: bool) -> Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    Ok(BufWriter::new(file))
}

/// Consensus records in FASTA.
pub struct ConsensusWriter<W: Write> {
    wtr: fasta::Writer<W>,
}

impl<W: Write> ConsensusWriter<W> {
    pub fn new(wtr: W) -> Self {
        Self {
            wtr: fasta::Writer::new(wtr),
        }
    }
    pub fn write(&mut self, record: &ConsensusRecord) -> Result<()> {
        self.wtr.write(&record.header(), None, &record.seq)?;
        Ok(())
    }
    pub fn flush(&mut self) -> Result<()> {
        self.wtr.flush()?;
        Ok(())
    }
}

/// The ids of the reads already processed, one per line in `<output>.done`.
#[derive(Debug)]
pub struct Checkpoint {
    path: PathBuf,
    done: HashSet<String>,
}

impl Checkpoint {
    /// Path of the checkpoint of `output`.
    pub fn path_of<P: AsRef<Path>>(output: P) -> PathBuf {
        let mut path = output.as_ref().as_os_str().to_owned();
        path.push(".done");
        PathBuf::from(path)
    }
    /// Load the checkpoint of `output` if `resume` is set, otherwise start afresh.
    pub fn open<P: AsRef<Path>>(output: P, resume: bool) -> Result<Self> {
        let path = Self::path_of(output);
        let done = match resume && path.exists() {
            true => BufReader::new(File::open(&path)?)
                .lines()
                .filter(|line| line.as_ref().map(|l| !l.is_empty()).unwrap_or(true))
                .collect::<std::io::Result<HashSet<_>>>()?,
            false => {
                File::create(&path)?;
                HashSet::new()
            }
        };
        debug!("CHECKPOINT\t{:?}\t{}", path, done.len());
        Ok(Self { path, done })
    }
    pub fn contains(&self, id: &str) -> bool {
        self.done.contains(id)
    }
    pub fn len(&self) -> usize {
        self.done.len()
    }
    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }
    /// Record `ids` as processed. Call this only after the outputs of these reads are flushed.
    pub fn append<'a, I: IntoIterator<Item = &'a str>>(&mut self, ids: I) -> Result<()> {
        let mut wtr = open_output(&self.path, true)?;
        for id in ids {
            writeln!(wtr, "{id}")?;
            self.done.insert(id.to_string());
        }
        wtr.flush()?;
        Ok(())
    }
}
