use statrs::distribution::{DiscreteCDF, Poisson};

///
/// Upper tail p-values `P(X > count)` for every count, with `X` Poisson
/// distributed around the mean of all the counts.
///
/// When every count is zero there is nothing to stand out from, and every
/// p-value is `1.0`.
///
pub fn poisson_upper_tail(counts: &[u64]) -> Vec<f64> {
    if counts.is_empty() {
        return Vec::new();
    }

    let mean = counts.iter().sum::<u64>() as f64 / counts.len() as f64;
    let Ok(poisson) = Poisson::new(mean) else {
        return vec![1.0; counts.len()];
    };

    counts.iter().map(|&count| poisson.sf(count)).collect()
}

///
/// Benjamini-Hochberg adjusted p-values, returned in the order of `p_values`.
///
/// The `i`-th smallest p-value is scaled by `n / i`; each adjusted value is
/// then the minimum over itself and every larger one, capped at `1.0`.
///
pub fn benjamini_hochberg(p_values: &[f64]) -> Vec<f64> {
    let n = p_values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));

    let mut adjusted = vec![1.0; n];
    let mut running_min = 1.0_f64;
    for (rank, &idx) in order.iter().enumerate().rev() {
        let scaled = p_values[idx] * n as f64 / (rank + 1) as f64;
        running_min = running_min.min(scaled);
        adjusted[idx] = running_min;
    }

    adjusted
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-10, "{actual:?} != {expected:?}");
        }
    }

    #[rstest]
    fn test_poisson_upper_tail_against_closed_form() {
        // mean 1: P(X > k) = 1 - e^-1 * sum_{i<=k} 1/i!
        let e = (-1.0_f64).exp();
        let p = poisson_upper_tail(&[0, 1, 2, 1]);
        assert_close(&p, &[1.0 - e, 1.0 - 2.0 * e, 1.0 - 2.5 * e, 1.0 - 2.0 * e]);
        assert_close(&p[2..3], &[0.08030139707139416]);
    }

    #[rstest]
    fn test_poisson_upper_tail_fractional_mean() {
        // mean 0.5: P(X > 0) = 1 - e^-0.5
        let p = poisson_upper_tail(&[0, 1]);
        assert_close(&p, &[1.0 - (-0.5_f64).exp(), 1.0 - 1.5 * (-0.5_f64).exp()]);
    }

    #[rstest]
    fn test_poisson_upper_tail_degenerate() {
        assert_eq!(poisson_upper_tail(&[]), Vec::<f64>::new());
        assert_eq!(poisson_upper_tail(&[0, 0, 0]), vec![1.0, 1.0, 1.0]);
    }

    #[rstest]
    fn test_benjamini_hochberg_by_hand() {
        // sorted 0.01, 0.03, 0.04, 0.2 scale to 0.04, 0.06, 0.0533.., 0.2
        let q = benjamini_hochberg(&[0.01, 0.04, 0.03, 0.2]);
        assert_close(&q, &[0.04, 0.04 * 4.0 / 3.0, 0.04 * 4.0 / 3.0, 0.2]);
    }

    #[rstest]
    fn test_benjamini_hochberg_caps_at_one() {
        let q = benjamini_hochberg(&[0.9, 0.8, 0.95]);
        assert_close(&q, &[0.95, 0.95, 0.95]);

        let q = benjamini_hochberg(&[1.0, 0.6]);
        assert_close(&q, &[1.0, 1.0]);
    }

    #[rstest]
    fn test_benjamini_hochberg_ties_share_a_value() {
        let q = benjamini_hochberg(&[0.02, 0.02, 0.5]);
        assert_close(&q, &[0.03, 0.03, 0.5]);
        assert_eq!(benjamini_hochberg(&[]).is_empty(), true);
    }
}
