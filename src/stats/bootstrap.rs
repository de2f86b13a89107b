use super::distribution::std_dev;
use super::fit::linear_fit_through_origin;
use rayon::prelude::*;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapParams {
    pub n_boot: usize,
    pub batch: usize,
    /// Column spacing handed to the slope fit.
    pub step: f64,
    /// Columns the slope is fitted on.
    pub range: Range<usize>,
    pub seed: Option<u64>,
}

/// Spread of the origin-constrained slope of the mean row under resampling
/// of rows with replacement.
///
/// Batch `b` draws from `seed + b`, so the result does not depend on how
/// batches are scheduled. Returns `None` when fewer than two resamples
/// produced a finite slope.
pub fn bootstrap_slope_std(rows: &[Vec<f64>], params: &BootstrapParams) -> Option<f64> {
    let nt = rows.len();
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if nt == 0 || width == 0 || params.n_boot == 0 {
        return None;
    }
    let batch = params.batch.max(1);
    let n_batches = params.n_boot.div_ceil(batch);

    let slopes: Vec<f64> = (0..n_batches)
        .into_par_iter()
        .flat_map_iter(|b| {
            let mut rng = match params.seed {
                Some(s) => fastrand::Rng::with_seed(s.wrapping_add(b as u64)),
                None => fastrand::Rng::new(),
            };
            let size = batch.min(params.n_boot - b * batch);
            let mut sums = vec![0.0; width];
            let mut counts = vec![0usize; width];
            let mut out = Vec::with_capacity(size);

            for _ in 0..size {
                sums.iter_mut().for_each(|s| *s = 0.0);
                counts.iter_mut().for_each(|c| *c = 0);
                for _ in 0..nt {
                    let row = &rows[rng.usize(..nt)];
                    for (k, &v) in row.iter().enumerate() {
                        if v.is_finite() {
                            sums[k] += v;
                            counts[k] += 1;
                        }
                    }
                }
                let means: Vec<f64> = sums
                    .iter()
                    .zip(&counts)
                    .map(|(&s, &c)| if c > 0 { s / c as f64 } else { f64::NAN })
                    .collect();
                if let Some(slope) =
                    linear_fit_through_origin(&means, params.step, params.range.clone())
                {
                    if slope.is_finite() {
                        out.push(slope);
                    }
                }
            }
            out
        })
        .collect();

    if slopes.len() < 2 {
        return None;
    }
    std_dev(&slopes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(seed: u64) -> BootstrapParams {
        BootstrapParams {
            n_boot: 50,
            batch: 7,
            step: 1.0,
            range: 0..10,
            seed: Some(seed),
        }
    }

    #[test]
    fn test_identical_rows_have_no_spread() {
        let row: Vec<f64> = (0..10).map(|k| 2.0 * k as f64).collect();
        let rows = vec![row; 20];
        let std = bootstrap_slope_std(&rows, &params(1)).unwrap();
        assert!(std.abs() < 1e-12);
    }

    #[test]
    fn test_seeded_bootstrap_is_reproducible() {
        let rows: Vec<Vec<f64>> = (0..30)
            .map(|i| (0..10).map(|k| (k * (i % 4 + 1)) as f64).collect())
            .collect();
        let a = bootstrap_slope_std(&rows, &params(9));
        let b = bootstrap_slope_std(&rows, &params(9));
        assert_eq!(a, b);
        assert!(a.unwrap() > 0.0);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(bootstrap_slope_std(&[], &params(1)), None);
    }
}
