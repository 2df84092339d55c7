const fn revcmp_table() -> [u8; 256] {
    let mut table = [0; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = i as u8;
        i += 1;
    }
    table[b'A' as usize] = b'T';
    table[b'C' as usize] = b'G';
    table[b'G' as usize] = b'C';
    table[b'T' as usize] = b'A';
    table[b'a' as usize] = b't';
    table[b'c' as usize] = b'g';
    table[b'g' as usize] = b'c';
    table[b't' as usize] = b'a';
    table
}
// N and gaps map onto themselves.
const REVCMP: [u8; 256] = revcmp_table();

/// Reverse complement of a sequence.
pub fn revcmp(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&x| REVCMP[x as usize]).collect()
}

/// True if `x` is a gap symbol of a POA/MSA row.
pub fn is_gap(x: u8) -> bool {
    x == b'-' || x == b'.'
}

/// Remove gap symbols from an aligned row.
pub fn ungap(row: &[u8]) -> Vec<u8> {
    row.iter().copied().filter(|&x| !is_gap(x)).collect()
}
