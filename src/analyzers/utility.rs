use std::collections::HashMap;

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator) given a pre-computed mean.
/// Returns `None` for fewer than two values.
pub fn sample_stddev(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;

    Some(variance.sqrt())
}

/// Population central moments `(m2, m3, m4)` about `mean`.
pub fn central_moments(values: &[f64], mean: f64) -> (f64, f64, f64) {
    let n = values.len() as f64;
    let (s2, s3, s4) = values.iter().fold((0.0, 0.0, 0.0), |(s2, s3, s4), v| {
        let d = v - mean;
        let d2 = d * d;
        (s2 + d2, s3 + d2 * d, s4 + d2 * d2)
    });
    (s2 / n, s3 / n, s4 / n)
}

/// Median of an already sorted slice. Returns `None` for empty input.
pub fn median_sorted(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2]),
        _ => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
    }
}

/// Most frequent value; ties go to the value seen first.
pub fn mode(values: &[f64]) -> Option<f64> {
    // -0.0 and 0.0 are the same value.
    let bits = |v: f64| if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() };

    let mut counts: HashMap<u64, (usize, usize)> = HashMap::new();
    for (i, v) in values.iter().enumerate() {
        counts.entry(bits(*v)).or_insert((0, i)).0 += 1;
    }

    counts
        .into_values()
        .max_by(|(ca, ia), (cb, ib)| ca.cmp(cb).then(ib.cmp(ia)))
        .map(|(_, first)| values[first])
}

/// Rounds to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Percentage of `part` in `total`, 0.0 when the total is zero.
pub fn pct(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        (part / total) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    }

    #[test]
    fn test_sample_stddev() {
        assert_eq!(sample_stddev(&[4.0], 4.0), None);
        let sd = sample_stddev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 5.0).unwrap();
        assert!((sd - 2.138089935).abs() < 1e-9);
    }

    #[test]
    fn test_central_moments() {
        let (m2, m3, m4) = central_moments(&[1.0, 2.0, 3.0, 4.0, 5.0], 3.0);
        assert_eq!(m2, 2.0);
        assert_eq!(m3, 0.0);
        assert!((m4 - 6.8).abs() < 1e-12);
    }

    #[test]
    fn test_median_sorted() {
        assert_eq!(median_sorted(&[]), None);
        assert_eq!(median_sorted(&[1.0, 3.0, 9.0]), Some(3.0));
        assert_eq!(median_sorted(&[1.0, 3.0, 5.0, 9.0]), Some(4.0));
    }

    #[test]
    fn test_mode_first_occurrence_wins_ties() {
        assert_eq!(mode(&[]), None);
        assert_eq!(mode(&[3.0, 1.0, 1.0, 3.0, 2.0]), Some(3.0));
        assert_eq!(mode(&[5.0, 2.0, 2.0, 7.0]), Some(2.0));
        assert_eq!(mode(&[-0.0, 0.0, 1.0]), Some(-0.0));
    }

    #[test]
    fn test_round_and_pct() {
        assert_eq!(round_to(33.33333, 2), 33.33);
        assert_eq!(round_to(66.666, 2), 66.67);
        assert_eq!(pct(1.0, 4.0), 25.0);
        assert_eq!(pct(10.0, 0.0), 0.0);
    }
}
