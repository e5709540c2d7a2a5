/// Percentile `q` (0–100) of an ascending slice, linearly interpolating between ranks.
///
/// Uses the `rank = q/100 · (n − 1)` convention, so `q = 50` is the usual median and the
/// result is monotone in `q` for a fixed sample.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    assert!(!sorted.is_empty(), "percentile of an empty sample");
    debug_assert!((0.0..=100.0).contains(&q), "percentile level {q} out of range");

    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }

    let weight = rank - lower as f64;
    let (a, b) = (sorted[lower], sorted[upper]);
    a + (b - a) * weight
}

pub fn median(sorted: &[f64]) -> f64 {
    percentile(sorted, 50.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_even_sample_averages_middle_pair() {
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_eq!(median(&[1.0, 2.0, 3.0]), 2.0);
    }

    #[test]
    fn interpolates_like_linear_method() {
        let sample: Vec<f64> = (0..=10).map(f64::from).collect();
        assert_eq!(percentile(&sample, 0.0), 0.0);
        assert_eq!(percentile(&sample, 100.0), 10.0);
        assert!((percentile(&sample, 5.0) - 0.5).abs() < 1e-12);
        assert!((percentile(&sample, 95.0) - 9.5).abs() < 1e-12);
    }

    #[test]
    fn single_sample_is_every_percentile() {
        assert_eq!(percentile(&[7.0], 5.0), 7.0);
        assert_eq!(percentile(&[7.0], 95.0), 7.0);
    }

    #[test]
    fn monotone_in_level() {
        let sample = [0.3, 0.9, 1.4, 2.2, 2.3, 5.0, 8.1];
        let mut previous = f64::NEG_INFINITY;
        for q in 0..=100 {
            let value = percentile(&sample, q as f64);
            assert!(value >= previous);
            previous = value;
        }
    }
}
