/// Quantile with linear interpolation between the closest ranks: for sorted
/// values `v` the result sits at position `(n - 1) * q`. Returns `None` for an
/// empty input; `q` is clamped to `[0, 1]`.
///
/// Matches the default quantile of common dataframe libraries, which keeps
/// thresholds reproducible on small months.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q = q.clamp(0.0, 1.0);
    let position = (sorted.len() - 1) as f64 * q;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(actual: Option<f64>, expected: f64) {
        let actual = actual.unwrap();
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn interpolates_between_ranks() {
        let values = [1.0, 2.0, 3.0, 4.0];
        approx(quantile(&values, 0.75), 3.25);
        approx(quantile(&values, 0.25), 1.75);
        approx(quantile(&values, 0.5), 2.5);
    }

    #[test]
    fn unsorted_input_and_extremes() {
        let values = [10.0, 0.0, 40.0, 20.0, 30.0];
        approx(quantile(&values, 0.75), 30.0);
        approx(quantile(&values, 0.25), 10.0);
        approx(quantile(&values, 0.0), 0.0);
        approx(quantile(&values, 1.0), 40.0);
    }

    #[test]
    fn small_inputs() {
        approx(quantile(&[7.0], 0.75), 7.0);
        approx(quantile(&[100.0, 0.0], 0.75), 75.0);
        assert!(quantile(&[], 0.5).is_none());
    }
}
