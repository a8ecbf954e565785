use itertools::Itertools;
use ndarray::ArrayView2;

use crate::types::camera::ContrastRange;

/// Percentile `q` (0..=100) of `values`, interpolating linearly between order statistics.
pub fn percentile(values: impl IntoIterator<Item = u16>, q: f64) -> Option<f64> {
    let sorted = values.into_iter().sorted_unstable().collect_vec();
    percentile_sorted(&sorted, q)
}

fn percentile_sorted(sorted: &[u16], q: f64) -> Option<f64> {
    if sorted.is_empty() || q.is_nan() {
        return None;
    }
    let rank = q.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let (lo, hi) = (rank.floor() as usize, rank.ceil() as usize);
    let (a, b) = (f64::from(sorted[lo]), f64::from(sorted[hi]));
    Some(a + (b - a) * (rank - lo as f64))
}

/// Auto-contrast limits from the `(low, high)` percentiles of a frame.
pub fn contrast_range(frame: ArrayView2<'_, u16>, percentiles: (f64, f64)) -> Option<ContrastRange> {
    let sorted = frame.iter().copied().sorted_unstable().collect_vec();
    Some(ContrastRange {
        low: percentile_sorted(&sorted, percentiles.0)?,
        high: percentile_sorted(&sorted, percentiles.1)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_percentile_interpolates() {
        let values = [10u16, 0, 30, 20];
        assert_eq!(percentile(values, 0.0), Some(0.0));
        assert_eq!(percentile(values, 100.0), Some(30.0));
        assert_eq!(percentile(values, 50.0), Some(15.0));
        assert_eq!(percentile(values, 25.0), Some(7.5));
        assert_eq!(percentile(Vec::new(), 50.0), None);
    }

    #[test]
    fn test_contrast_range_of_ramp() {
        let frame = Array2::from_shape_fn((10, 101), |(r, c)| if r == 0 { c as u16 } else { 50u16 });
        let range = contrast_range(frame.view(), (0.0, 100.0)).unwrap();
        assert_eq!((range.low, range.high), (0.0, 100.0));

        let ramp = Array2::from_shape_fn((1, 1001), |(_, c)| c as u16);
        let range = contrast_range(ramp.view(), (1.0, 99.9)).unwrap();
        assert!((range.low - 10.0).abs() < 1e-9);
        assert!((range.high - 999.0).abs() < 1e-9);
    }
}
