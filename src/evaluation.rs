use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionMetrics {
    pub samples: usize,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

/// Running mean updated as `m += v/k - m/k`; finite for any finite inputs.
pub fn stable_mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut mean = 0.0_f64;
    let mut count = 0usize;
    for v in values {
        count += 1;
        let k = count as f64;
        mean += v / k - mean / k;
    }
    (count > 0).then_some(mean)
}

pub fn regression_metrics(actual: &[f64], predicted: &[f64]) -> RegressionMetrics {
    if actual.is_empty() || actual.len() != predicted.len() {
        return RegressionMetrics {
            samples: 0,
            rmse: 0.0,
            mae: 0.0,
            r2: 0.0,
        };
    }

    let n = actual.len() as f64;
    let mean = stable_mean(actual.iter().copied()).unwrap_or(0.0);
    let mut sse = 0.0_f64;
    let mut sae = 0.0_f64;
    let mut sst = 0.0_f64;
    for (a, p) in actual.iter().zip(predicted) {
        sse += (a - p).powi(2);
        sae += (a - p).abs();
        sst += (a - mean).powi(2);
    }

    // Constant targets: R² is 1 for a perfect fit, 0 otherwise.
    let r2 = if sst > 0.0 {
        1.0 - sse / sst
    } else if sse == 0.0 {
        1.0
    } else {
        0.0
    };

    RegressionMetrics {
        samples: actual.len(),
        rmse: (sse / n).sqrt(),
        mae: sae / n,
        r2,
    }
}

/// Seeded shuffle split. Returns (train, holdout) row indices, holdout sorted.
pub fn holdout_split(rows: usize, fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let holdout = ((rows as f64) * fraction.clamp(0.0, 1.0)).round() as usize;
    // Keep at least one training row.
    let holdout = holdout.min(rows.saturating_sub(1));

    let mut order: Vec<usize> = (0..rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let mut test = order.split_off(rows - holdout);
    order.sort_unstable();
    test.sort_unstable();
    (order, test)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions() {
        let m = regression_metrics(&[0.1, 0.2, 0.7], &[0.1, 0.2, 0.7]);
        assert_eq!(m.samples, 3);
        assert!(m.rmse < 1e-12);
        assert!((m.r2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mean_predictor_has_zero_r2() {
        let m = regression_metrics(&[0.0, 1.0], &[0.5, 0.5]);
        assert!(m.r2.abs() < 1e-12);
        assert!((m.mae - 0.5).abs() < 1e-12);
    }

    #[test]
    fn split_is_disjoint_and_deterministic() {
        let (train, test) = holdout_split(50, 0.2, 7);
        assert_eq!(test.len(), 10);
        assert_eq!(train.len(), 40);
        assert!(test.iter().all(|i| !train.contains(i)));
        assert_eq!(holdout_split(50, 0.2, 7), (train, test));
    }

    #[test]
    fn split_never_empties_training() {
        let (train, test) = holdout_split(1, 0.9, 1);
        assert_eq!(train, vec![0]);
        assert!(test.is_empty());
        let (train, test) = holdout_split(0, 0.5, 1);
        assert!(train.is_empty() && test.is_empty());
    }
}
