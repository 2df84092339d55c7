//! Repeat period from the spacing of the peaks.

/// Gaps between peaks are rounded to a multiple of this value.
pub const ROUNDING_BASE: usize = 50;

/// Peaks of a read (in read coordinates) and the estimated repeat period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodEstimate {
    /// Strictly ascending, always containing the seed.
    pub peaks: Vec<usize>,
    /// `None` if there are less than two peaks.
    pub period: Option<f64>,
}

impl PeriodEstimate {
    /// Merge the forward peaks (after the seed) and the reverse peaks (before the seed)
    /// with the seed itself, and estimate the period.
    pub fn new(seed: usize, forward: &[usize], reverse: &[usize]) -> Self {
        let peaks = peak_set(seed, forward, reverse);
        let gaps: Vec<_> = peaks
            .windows(2)
            .map(|w| round_to_base(w[1] - w[0], ROUNDING_BASE))
            .collect();
        let period = median(&gaps);
        Self { peaks, period }
    }
    /// True if the period is defined and larger than `min_period`, with at least two peaks.
    pub fn is_trustworthy(&self, min_period: f64) -> bool {
        self.peaks.len() > 1 && self.period.map(|p| min_period < p).unwrap_or(false)
    }
}

/// Sorted and deduplicated union of the seed, `seed + forward` and `seed - reverse`.
pub fn peak_set(seed: usize, forward: &[usize], reverse: &[usize]) -> Vec<usize> {
    let mut peaks = vec![seed];
    peaks.extend(forward.iter().map(|&f| seed + f));
    peaks.extend(reverse.iter().map(|&r| seed.saturating_sub(r)));
    peaks.sort_unstable();
    peaks.dedup();
    peaks
}

/// Round `x` to the nearest multiple of `base`. Ties go to the even multiple.
pub fn round_to_base(x: usize, base: usize) -> usize {
    let (quot, rem) = (x / base, x % base);
    let up = match (2 * rem).cmp(&base) {
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Equal => quot % 2 == 1,
    };
    (quot + up as usize) * base
}

/// Median of `xs`. The mean of the two middle values if the length is even.
pub fn median(xs: &[usize]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    let mut xs = xs.to_vec();
    xs.sort_unstable();
    let len = xs.len();
    match len % 2 {
        1 => Some(xs[len / 2] as f64),
        _ => Some((xs[len / 2 - 1] + xs[len / 2]) as f64 / 2f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_xoshiro::Xoroshiro128PlusPlus;
    #[test]
    fn rounding() {
        assert_eq!(round_to_base(0, 50), 0);
        assert_eq!(round_to_base(24, 50), 0);
        assert_eq!(round_to_base(26, 50), 50);
        assert_eq!(round_to_base(999, 50), 1_000);
        assert_eq!(round_to_base(1_024, 50), 1_000);
        assert_eq!(round_to_base(25, 50), 0);
        assert_eq!(round_to_base(975, 50), 1_000);
        assert_eq!(round_to_base(1_025, 50), 1_000);
        assert_eq!(round_to_base(1_075, 50), 1_100);
    }
    #[test]
    fn median_values() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3]), Some(3f64));
        assert_eq!(median(&[1_000, 950]), Some(975f64));
        assert_eq!(median(&[5, 1, 3]), Some(3f64));
    }
    #[test]
    fn evenly_spaced_peaks() {
        let estimate = PeriodEstimate::new(0, &[1_000, 2_000, 3_000], &[]);
        assert_eq!(estimate.peaks, vec![0, 1_000, 2_000, 3_000]);
        assert_eq!(estimate.period, Some(1_000f64));
        let estimate = PeriodEstimate::new(1_500, &[1_010, 1_990], &[1_005]);
        assert_eq!(estimate.peaks, vec![495, 1_500, 2_510, 3_490]);
        assert_eq!(estimate.period, Some(1_000f64));
        assert!(estimate.is_trustworthy(500f64));
    }
    #[test]
    fn single_peak() {
        let estimate = PeriodEstimate::new(120, &[], &[]);
        assert_eq!(estimate.peaks, vec![120]);
        assert_eq!(estimate.period, None);
        assert!(!estimate.is_trustworthy(500f64));
        let estimate = PeriodEstimate::new(120, &[0], &[0]);
        assert_eq!(estimate.peaks, vec![120]);
        assert_eq!(estimate.period, None);
    }
    #[test]
    fn short_period_is_not_trustworthy() {
        let estimate = PeriodEstimate::new(0, &[400, 800], &[]);
        assert_eq!(estimate.period, Some(400f64));
        assert!(!estimate.is_trustworthy(500f64));
    }
    #[test]
    fn peak_set_is_strictly_ascending() {
        let mut rng: Xoroshiro128PlusPlus = SeedableRng::seed_from_u64(942);
        for _ in 0..100 {
            let seed = rng.gen_range(0..3_000);
            let forward: Vec<usize> = (0..rng.gen_range(0..10))
                .map(|_| rng.gen_range(0..2_000))
                .collect();
            let mut reverse: Vec<usize> = (0..rng.gen_range(0..10))
                .map(|_| rng.gen_range(0..=seed))
                .collect();
            reverse.extend(forward.iter().filter(|&&f| f <= seed));
            let peaks = peak_set(seed, &forward, &reverse);
            assert!(peaks.windows(2).all(|w| w[0] < w[1]), "{peaks:?}");
            assert!(peaks.contains(&seed));
            assert!(forward.iter().all(|f| peaks.contains(&(seed + f))));
            assert!(reverse.iter().all(|r| peaks.contains(&(seed - r))));
        }
    }
}
