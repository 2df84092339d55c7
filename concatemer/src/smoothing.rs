//! Savitzky-Golay smoothing, scoped to the peak calling of self-similarity signals.
//!
//! The filter fits a polynomial of a given order to every window by least squares and evaluates
//! it (or its derivative) at the center of the window. As the fit only depends on the shape
//! of the window, the fit reduces to a fixed set of convolution coefficients,
//! which are the rows of the pseudo-inverse of the Vandermonde matrix of the window.
use crate::error::{ConcatemerError, Result};
use nalgebra::DMatrix;

const PINV_EPS: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    window: usize,
    coefficients: Vec<f64>,
}

impl SavitzkyGolay {
    /// Create a filter. `window` should be an odd number larger than `order + 1`,
    /// and `deriv` should not exceed `order`.
    pub fn new(window: usize, order: usize, deriv: usize) -> Result<Self> {
        if window % 2 != 1 {
            let msg = format!("window size must be a positive odd number, got {window}");
            return Err(ConcatemerError::InvalidParameter(msg));
        }
        if window < order + 2 {
            let msg = format!("window size {window} is too small for the polynomial order {order}");
            return Err(ConcatemerError::InvalidParameter(msg));
        }
        if order < deriv {
            let msg = format!("derivative order {deriv} exceeds polynomial order {order}");
            return Err(ConcatemerError::InvalidParameter(msg));
        }
        let half = (window / 2) as i64;
        let vandermonde = DMatrix::from_fn(window, order + 1, |row, col| {
            let k = row as i64 - half;
            (k as f64).powi(col as i32)
        });
        let pinv = vandermonde
            .pseudo_inverse(PINV_EPS)
            .map_err(|why| ConcatemerError::InvalidParameter(why.to_string()))?;
        // rate is always 1, so only deriv! remains.
        let scale: f64 = (1..=deriv).map(|x| x as f64).product();
        let coefficients: Vec<_> = pinv.row(deriv).iter().map(|c| c * scale).collect();
        Ok(Self { window, coefficients })
    }
    /// Smooth `ys`. The output has the same length as the input.
    /// The signal is extended at both ends by reflecting it about its boundary values.
    pub fn smooth(&self, ys: &[f64]) -> Vec<f64> {
        if ys.is_empty() {
            return vec![];
        }
        let half = self.window / 2;
        let len = ys.len();
        let (first, last) = (ys[0], ys[len - 1]);
        let mut padded = Vec::with_capacity(len + 2 * half);
        padded.extend((1..=half).rev().map(|k| first - (ys[k.min(len - 1)] - first).abs()));
        padded.extend_from_slice(ys);
        padded.extend((1..=half).map(|k| last + (ys[len - 1 - k.min(len - 1)] - last).abs()));
        padded
            .windows(self.window)
            .map(|w| w.iter().zip(self.coefficients.iter()).map(|(y, c)| y * c).sum::<f64>())
            .collect()
    }
}

/// Smooth `ys` by a Savitzky-Golay filter with the given window size, polynomial order, and derivative order.
pub fn savitzky_golay(ys: &[f64], window: usize, order: usize, deriv: usize) -> Result<Vec<f64>> {
    SavitzkyGolay::new(window, order, deriv).map(|filter| filter.smooth(ys))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_xoshiro::Xoroshiro128PlusPlus;
    fn is_invalid(res: Result<SavitzkyGolay>) -> bool {
        matches!(res, Err(ConcatemerError::InvalidParameter(_)))
    }
    #[test]
    fn invalid_parameters() {
        assert!(is_invalid(SavitzkyGolay::new(0, 0, 0)));
        assert!(is_invalid(SavitzkyGolay::new(50, 2, 0)));
        assert!(is_invalid(SavitzkyGolay::new(3, 2, 0)));
        assert!(is_invalid(SavitzkyGolay::new(5, 2, 3)));
        assert!(is_invalid(SavitzkyGolay::new(1, 0, 0)));
        assert!(SavitzkyGolay::new(3, 1, 0).is_ok());
        assert!(SavitzkyGolay::new(51, 2, 0).is_ok());
    }
    #[test]
    fn coefficients_sum_to_one() {
        for (window, order) in [(5, 2), (51, 2), (71, 2), (51, 1), (9, 4)] {
            let filter = SavitzkyGolay::new(window, order, 0).unwrap();
            let sum: f64 = filter.coefficients.iter().sum();
            assert!((sum - 1f64).abs() < 1e-9, "{window},{order},{sum}");
        }
    }
    #[test]
    fn known_coefficients() {
        // The classic 5-point quadratic smoother, (-3, 12, 17, 12, -3) / 35.
        let filter = SavitzkyGolay::new(5, 2, 0).unwrap();
        let answer = [-3f64, 12., 17., 12., -3.].map(|x| x / 35f64);
        for (c, a) in filter.coefficients.iter().zip(answer.iter()) {
            assert!((c - a).abs() < 1e-9, "{c},{a}");
        }
    }
    #[test]
    fn constant_is_preserved() {
        for len in [1, 2, 10, 60, 500] {
            let ys = vec![7.5; len];
            for (window, order) in [(3, 1), (5, 2), (51, 2), (71, 2), (51, 1)] {
                let smoothed = savitzky_golay(&ys, window, order, 0).unwrap();
                assert_eq!(smoothed.len(), len);
                assert!(smoothed.iter().all(|x| (x - 7.5).abs() < 1e-6));
            }
        }
    }
    #[test]
    fn quadratic_is_preserved_inside() {
        let ys: Vec<f64> = (0..200).map(|x| x as f64).map(|x| 0.5 * x * x - 3. * x + 1.).collect();
        let smoothed = savitzky_golay(&ys, 21, 2, 0).unwrap();
        for (y, s) in ys.iter().zip(smoothed.iter()).skip(10).take(180) {
            assert!((y - s).abs() < 1e-5, "{y},{s}");
        }
    }
    #[test]
    fn first_derivative_of_line() {
        let ys: Vec<f64> = (0..100).map(|x| 3. * x as f64 + 2.).collect();
        let slope = savitzky_golay(&ys, 11, 2, 1).unwrap();
        for s in slope.iter().skip(5).take(90) {
            assert!((s - 3.).abs() < 1e-6, "{s}");
        }
    }
    #[test]
    fn same_length_and_reduces_noise() {
        let mut rng: Xoroshiro128PlusPlus = SeedableRng::seed_from_u64(3290);
        let ys: Vec<f64> = (0..1_000).map(|_| 10. + rng.gen_range(-1f64..1f64)).collect();
        let smoothed = savitzky_golay(&ys, 51, 2, 0).unwrap();
        assert_eq!(smoothed.len(), ys.len());
        let var = |xs: &[f64]| xs.iter().map(|x| (x - 10.).powi(2)).sum::<f64>();
        assert!(var(&smoothed) < var(&ys) / 4.);
    }
    #[test]
    fn empty_input() {
        assert!(savitzky_golay(&[], 51, 2, 0).unwrap().is_empty());
    }
}
