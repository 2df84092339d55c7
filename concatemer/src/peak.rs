//! Peak calling on self-similarity signals.
use crate::diagonal::ScoreSignal;
use crate::error::Result;
use crate::smoothing::SavitzkyGolay;

/// Window and order of the first smoothing pass.
pub const FIRST_PASS: (usize, usize) = (51, 2);
/// Window and order of the later smoothing passes.
pub const LATER_PASS: (usize, usize) = (71, 2);
pub const LATER_PASS_NUM: usize = 3;
/// A peak should be followed by this many declining samples.
pub const LOOK_AHEAD: usize = 50;
/// Near the end of a signal, a shorter decline is enough.
pub const LOOK_AHEAD_AT_END: usize = 45;
/// Value given to the samples under the noise level.
const FLOOR: f64 = 1f64;

/// Parameters of the noise suppression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakConfig {
    /// The noise level is the maximum of the first `noise_window` samples.
    pub noise_window: usize,
    /// Samples less than or equal to `noise level * noise_multiplier` are suppressed.
    pub noise_multiplier: f64,
}

impl PeakConfig {
    /// For the signal after the seed.
    pub const FORWARD: Self = Self {
        noise_window: 500,
        noise_multiplier: 1.25,
    };
    /// For the signal before the seed.
    pub const REVERSE: Self = Self {
        noise_window: 100,
        noise_multiplier: 1.15,
    };
}

#[derive(Debug, Clone)]
pub struct PeakDetector {
    config: PeakConfig,
    first: SavitzkyGolay,
    later: SavitzkyGolay,
}

impl PeakDetector {
    pub fn new(config: PeakConfig) -> Result<Self> {
        let first = SavitzkyGolay::new(FIRST_PASS.0, FIRST_PASS.1, 0)?;
        let later = SavitzkyGolay::new(LATER_PASS.0, LATER_PASS.1, 0)?;
        Ok(Self {
            config,
            first,
            later,
        })
    }
    pub fn forward() -> Result<Self> {
        Self::new(PeakConfig::FORWARD)
    }
    pub fn reverse() -> Result<Self> {
        Self::new(PeakConfig::REVERSE)
    }
    /// Suppress the baseline, then smooth the signal. The first pass uses a window of 51,
    /// the three later passes a window of 71.
    /// A signal shorter than the noise window has no baseline to measure and is smoothed as is.
    pub fn smoothed(&self, scores: &[f64]) -> Vec<f64> {
        if scores.is_empty() {
            return vec![];
        }
        let suppressed = match scores.get(..self.config.noise_window) {
            Some(baseline) => {
                let noise = baseline.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let thr = noise * self.config.noise_multiplier;
                scores.iter().map(|&x| if x <= thr { FLOOR } else { x }).collect()
            }
            None => scores.to_vec(),
        };
        let mut smoothed = self.first.smooth(&suppressed);
        for _ in 0..LATER_PASS_NUM {
            smoothed = self.later.smooth(&smoothed);
        }
        smoothed
    }
    /// Indices of the peaks in `scores`.
    pub fn peak_indices(&self, scores: &[f64]) -> Vec<usize> {
        let smoothed = self.smoothed(scores);
        let slopes: Vec<_> = smoothed.windows(2).map(|w| w[1] - w[0]).collect();
        (0..slopes.len())
            .filter(|&i| 0f64 < slopes[i])
            .filter(|&i| {
                let look_ahead = match i + LOOK_AHEAD <= slopes.len() {
                    true => LOOK_AHEAD,
                    false => LOOK_AHEAD_AT_END,
                };
                i + look_ahead <= slopes.len()
                    && slopes[i + 1..i + look_ahead].iter().all(|&s| s < 0f64)
            })
            .collect()
    }
    /// Offsets of the peaks in `signal`.
    pub fn call(&self, signal: &ScoreSignal) -> Vec<usize> {
        let scores: Vec<_> = signal.scores().iter().map(|&x| x as f64).collect();
        self.peak_indices(&scores)
            .into_iter()
            .filter_map(|idx| signal.offset(idx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_xoshiro::Xoroshiro128PlusPlus;
    use std::collections::BTreeMap;
    fn noisy(seed: u64, len: usize, max: f64) -> Vec<f64> {
        let mut rng: Xoroshiro128PlusPlus = SeedableRng::seed_from_u64(seed);
        (0..len).map(|_| rng.gen_range(0f64..max)).collect()
    }
    #[test]
    fn empty() {
        let detector = PeakDetector::forward().unwrap();
        assert!(detector.peak_indices(&[]).is_empty());
        assert!(detector.call(&ScoreSignal::default()).is_empty());
    }
    #[test]
    fn flat_signal() {
        let detector = PeakDetector::forward().unwrap();
        assert!(detector.peak_indices(&vec![40f64; 3_000]).is_empty());
        let detector = PeakDetector::reverse().unwrap();
        assert!(detector.peak_indices(&vec![0f64; 800]).is_empty());
    }
    #[test]
    fn noise_only() {
        // The first samples carry the highest noise, so everything is suppressed.
        let mut scores = noisy(4, 3_000, 100f64);
        scores[10] = 120f64;
        let detector = PeakDetector::forward().unwrap();
        assert!(detector.peak_indices(&scores).is_empty());
        let detector = PeakDetector::reverse().unwrap();
        assert!(detector.peak_indices(&scores).is_empty());
    }
    #[test]
    fn isolated_spikes() {
        let mut scores = noisy(2, 3_500, 100f64);
        scores[10] = 120f64;
        for &pos in &[1_000, 2_000, 3_000] {
            scores[pos] = 5_000f64;
        }
        let detector = PeakDetector::forward().unwrap();
        let peaks = detector.peak_indices(&scores);
        assert_eq!(peaks, vec![999, 1_999, 2_999]);
    }
    #[test]
    fn broad_peaks() {
        let scores: Vec<f64> = (0..2_500)
            .map(|i| {
                let d = (i as f64 - 1_200f64) / 30f64;
                1f64 + 1_000f64 * (-d * d).exp()
            })
            .collect();
        let detector = PeakDetector::forward().unwrap();
        let peaks = detector.peak_indices(&scores);
        assert_eq!(peaks.len(), 1);
        assert!((1_190..=1_210).contains(&peaks[0]), "{peaks:?}");
    }
    #[test]
    fn short_signal() {
        // Shorter than the noise window of 500, so the bump is kept as is.
        let scores: Vec<f64> = (0..400)
            .map(|i| {
                let d = (i as f64 - 200f64) / 30f64;
                1f64 + 1_000f64 * (-d * d).exp()
            })
            .collect();
        let detector = PeakDetector::forward().unwrap();
        let peaks = detector.peak_indices(&scores);
        assert_eq!(peaks.len(), 1);
        assert!((190..=210).contains(&peaks[0]), "{peaks:?}");
        assert_eq!(detector.smoothed(&scores).len(), 400);
        // The same bump is the noise level of a longer signal.
        let mut longer = scores.clone();
        longer.extend(std::iter::repeat(1f64).take(600));
        assert!(detector.peak_indices(&longer).is_empty());
    }
    #[test]
    fn deterministic() {
        let mut scores = noisy(10, 2_000, 50f64);
        scores[700] = 900f64;
        scores[1_400] = 1_000f64;
        let detector = PeakDetector::forward().unwrap();
        assert_eq!(detector.peak_indices(&scores), detector.peak_indices(&scores));
    }
    #[test]
    fn offsets_of_signal() {
        let mut map: BTreeMap<usize, i64> = (1..2_000).map(|x| (x, 3)).collect();
        map.insert(1_000, 4_000);
        let detector = PeakDetector::forward().unwrap();
        let signal = ScoreSignal::from_map(map);
        // Offset 0 is absent, so index 998 is offset 999.
        assert_eq!(detector.call(&signal), vec![999]);
    }
}
