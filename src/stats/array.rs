use super::bootstrap::{bootstrap_slope_std, BootstrapParams};
use super::distribution::{column_stats, normalize_counts, BinGrid};
use crate::output::{RecordFields, ResultRecord};

/// First-passage statistics across an obstacle array, computed from rows of
/// arrival times indexed by site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayResults {
    pub fpt_mean: Vec<f64>,
    /// One normalized arrival-time histogram per site.
    pub fpt_2d: Vec<Vec<f64>>,
    pub fpt_xmax_distrib: Vec<f64>,
    /// Probability of not having crossed `x_max` yet, per time bin.
    pub p_tau: Vec<f64>,
    pub v_marcand: Option<f64>,
    pub delay: Vec<f64>,
    pub err_fpt_slope: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrayWindow {
    /// First site of the array.
    pub x_min: usize,
    /// Last site of the array.
    pub x_max: usize,
    pub mu: f64,
    pub hist_width: f64,
    pub hist_max: f64,
}

impl ArrayResults {
    pub fn compute(
        rows: &[Vec<f64>],
        window: &ArrayWindow,
        boot: Option<&BootstrapParams>,
    ) -> Self {
        let fpt_mean = column_stats(rows).mean;
        let grid = BinGrid::new(0.0, window.hist_max + 2.0, window.hist_width);

        let fpt_2d: Vec<Vec<f64>> = (0..fpt_mean.len())
            .map(|k| {
                let counts = grid.histogram(rows.iter().filter_map(|r| r.get(k).copied()));
                normalize_counts(&counts)
            })
            .collect();
        let fpt_xmax_distrib = fpt_2d.last().cloned().unwrap_or_default();
        let p_tau = fpt_xmax_distrib
            .iter()
            .scan(0.0, |acc, p| {
                *acc += p;
                Some(1.0 - *acc)
            })
            .collect();

        let free_min = window.x_min as f64 / window.mu;
        let free_max = window.x_max as f64 / window.mu;
        let v_marcand = fpt_mean
            .get(window.x_max)
            .filter(|v| v.is_finite() && free_max > free_min)
            .map(|&t| (t - free_min) / (free_max - free_min));

        let n = fpt_mean.len();
        let baseline = if n > 0 {
            (0..n).map(|k| k as f64 / window.mu).sum::<f64>() / n as f64
        } else {
            0.0
        };
        let delay = fpt_mean.iter().map(|t| t - baseline).collect();

        let err_fpt_slope = boot.and_then(|params| bootstrap_slope_std(rows, params));

        Self {
            fpt_mean,
            fpt_2d,
            fpt_xmax_distrib,
            p_tau,
            v_marcand,
            delay,
            err_fpt_slope,
        }
    }
}

impl RecordFields for ArrayResults {
    fn write_fields(&self, record: &mut ResultRecord) {
        record.vector("fpt_mean", &self.fpt_mean);
        record.matrix("fpt_2D", &self.fpt_2d);
        record.vector("fpt_x_max_distrib", &self.fpt_xmax_distrib);
        record.vector("p_tau", &self.p_tau);
        record.optional("v_marcand", self.v_marcand);
        record.vector("delay", &self.delay);
        record.optional("err_fpt_slope", self.err_fpt_slope);
    }
}
