use super::bootstrap::{bootstrap_slope_std, BootstrapParams};
use super::distribution::column_stats;
use super::fit::linear_fit_through_origin;
use crate::output::{RecordFields, ResultRecord};

/// Ensemble curves of the dense displacement rows and the velocities
/// fitted on them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MainResults {
    pub mean: Vec<f64>,
    pub median: Vec<f64>,
    pub std: Vec<f64>,
    pub v_mean: Option<f64>,
    pub v_med: Option<f64>,
    pub err_v_mean: Option<f64>,
    pub alpha_0: f64,
}

impl MainResults {
    pub fn compute(
        rows: &[Vec<f64>],
        dt: f64,
        alpha_0: f64,
        boot: Option<&BootstrapParams>,
    ) -> Self {
        let cols = column_stats(rows);
        let len = cols.mean.len();
        let v_mean = linear_fit_through_origin(&cols.mean, dt, 0..len).map(|v| v * alpha_0);
        let v_med = linear_fit_through_origin(&cols.median, dt, 0..len).map(|v| v * alpha_0);
        let err_v_mean = boot
            .and_then(|params| bootstrap_slope_std(rows, params))
            .map(|e| e * alpha_0);
        Self {
            mean: cols.mean,
            median: cols.median,
            std: cols.std,
            v_mean,
            v_med,
            err_v_mean,
            alpha_0,
        }
    }
}

impl RecordFields for MainResults {
    fn write_fields(&self, record: &mut ResultRecord) {
        record.vector("results_mean", &self.mean);
        record.vector("results_med", &self.median);
        record.vector("results_std", &self.std);
        record.optional("v_mean", self.v_mean);
        record.optional("v_med", self.v_med);
        record.optional("err_v_mean", self.err_v_mean);
        record.float("alpha_0", self.alpha_0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_rows_give_their_slope() {
        let rows: Vec<Vec<f64>> = (0..4)
            .map(|_| (0..20).map(|k| 3.0 * k as f64).collect())
            .collect();
        let main = MainResults::compute(&rows, 1.0, 1.0, None);
        assert!((main.v_mean.unwrap() - 3.0).abs() < 1e-12);
        assert!((main.v_med.unwrap() - 3.0).abs() < 1e-12);
        assert_eq!(main.err_v_mean, None);
        assert!(main.std.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_missing_tail_is_skipped() {
        let rows = vec![vec![0.0, 2.0, 4.0, f64::NAN], vec![0.0, 2.0, 4.0, 6.0]];
        let main = MainResults::compute(&rows, 0.5, 1.0, None);
        assert_eq!(main.mean[3], 6.0);
        assert!((main.v_mean.unwrap() - 4.0).abs() < 1e-12);
    }
}
