use crate::engine::Trajectory;
use crate::output::{RecordFields, ResultRecord};

/// First-passage counts binned on both axes.
///
/// Row `r` holds trajectories whose running maximum first passed a position
/// bin during time slot `r` (time floored, clamped to `horizon`). The last
/// row counts trajectories that never passed the bin, so every column sums
/// to the number of trajectories.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FptMatrix {
    pub bin: usize,
    pub horizon: usize,
    pub nt: usize,
    pub counts: Vec<Vec<u64>>,
}

impl FptMatrix {
    pub fn compute(trajectories: &[Trajectory], horizon: usize, bin: usize) -> Self {
        let bin = bin.max(1);
        let nt = trajectories.len();
        let x_max = trajectories
            .iter()
            .map(Trajectory::max_displacement)
            .max()
            .unwrap_or(0);
        let n_bins = x_max.div_ceil(bin);
        let mut counts = vec![vec![0u64; n_bins]; horizon + 2];

        for traj in trajectories {
            let mut passed = 0usize;
            for (&t, &disp) in traj.times.iter().zip(&traj.positions) {
                let reached = (disp / bin).min(n_bins);
                if reached <= passed {
                    continue;
                }
                let slot = if t.is_finite() {
                    (t.floor().max(0.0) as usize).min(horizon)
                } else {
                    horizon
                };
                for c in &mut counts[slot][passed..reached] {
                    *c += 1;
                }
                passed = reached;
            }
        }

        let mut matrix = Self {
            bin,
            horizon,
            nt,
            counts,
        };
        let arrived = matrix.arrivals();
        if let Some(missing) = matrix.counts.last_mut() {
            for (m, a) in missing.iter_mut().zip(arrived) {
                *m = nt as u64 - a;
            }
        }
        matrix
    }

    pub fn n_bins(&self) -> usize {
        self.counts.first().map_or(0, Vec::len)
    }

    /// Trajectories that passed each bin within the horizon.
    pub fn arrivals(&self) -> Vec<u64> {
        let mut out = vec![0u64; self.n_bins()];
        for row in &self.counts[..self.counts.len().saturating_sub(1)] {
            for (o, c) in out.iter_mut().zip(row) {
                *o += c;
            }
        }
        out
    }

    pub fn density(&self) -> Vec<Vec<f64>> {
        let nt = self.nt.max(1) as f64;
        self.counts
            .iter()
            .map(|row| row.iter().map(|&c| c as f64 / nt).collect())
            .collect()
    }
}

impl RecordFields for FptMatrix {
    fn write_fields(&self, record: &mut ResultRecord) {
        record.int("bin_fpt", self.bin as i64);
        record.matrix("fpt_distrib_2D", &self.density());
        record.counts("fpt_number", &self.arrivals());
    }
}
