//! Small descriptive statistics over `f64` series

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation around a precomputed mean
pub fn population_std(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Ordinary least-squares slope of `(index, value)` pairs
pub fn ols_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values)?;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }

    Some(num / den)
}

/// Absolute step-to-step differences
pub fn abs_deltas(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| (w[1] - w[0]).abs()).collect()
}

/// Percentile `p` in [0, 1] of an ascending-sorted slice.
///
/// Linear interpolation between closest ranks.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let p = p.clamp(0.0, 1.0);
    let rank = p * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let m = mean(&v).unwrap();
        assert_eq!(m, 5.0);
        assert_eq!(population_std(&v, m), 2.0);
        assert!(mean(&[]).is_none());
    }

    #[test]
    fn test_ols_slope() {
        assert_eq!(ols_slope(&[1.0, 3.0, 5.0, 7.0]), Some(2.0));
        assert_eq!(ols_slope(&[4.0, 4.0, 4.0]), Some(0.0));
        assert!(ols_slope(&[1.0]).is_none());

        let noisy = ols_slope(&[0.0, 1.2, 1.8, 3.1]).unwrap();
        assert!(noisy > 0.9 && noisy < 1.1);
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [0.0, 10.0, 20.0, 30.0, 40.0];
        assert_eq!(percentile(&sorted, 0.0), Some(0.0));
        assert_eq!(percentile(&sorted, 1.0), Some(40.0));
        assert_eq!(percentile(&sorted, 0.5), Some(20.0));
        assert!((percentile(&sorted, 0.9).unwrap() - 36.0).abs() < 1e-9);
        assert!(percentile(&[], 0.5).is_none());
    }

    #[test]
    fn test_abs_deltas() {
        assert_eq!(abs_deltas(&[1.0, 3.0, 2.0]), vec![2.0, 1.0]);
        assert!(abs_deltas(&[1.0]).is_empty());
    }
}
