use super::distribution::{distribution, mean, median, Distribution};
use crate::engine::{Trajectory, SENTINEL_TIME};
use crate::output::{RecordFields, ResultRecord};

/// Distribution of the time between consecutive events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaitingTimes(pub Distribution);

impl WaitingTimes {
    pub fn compute(trajectories: &[Trajectory], last_bin: f64) -> Self {
        let waits = trajectories
            .iter()
            .flat_map(|t| t.times.windows(2).map(|w| w[1] - w[0]));
        Self(distribution(waits, 0.0, last_bin, 1.0))
    }
}

impl RecordFields for WaitingTimes {
    fn write_fields(&self, record: &mut ResultRecord) {
        record.vector("tbj_points", &self.0.points);
        record.vector("tbj_distrib", &self.0.probs);
    }
}

/// A distribution with its location summaries. Empty samples summarise to 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summarized {
    pub dist: Distribution,
    pub mean: f64,
    pub median: f64,
    pub most_probable: f64,
}

impl Summarized {
    fn new(mut samples: Vec<f64>, last_bin: f64, width: f64) -> Self {
        samples.retain(|v| v.is_finite());
        let dist = distribution(samples.iter().copied(), 0.0, last_bin, width);
        Self {
            mean: mean(&samples).unwrap_or(0.0),
            median: median(&mut samples).unwrap_or(0.0),
            most_probable: dist.most_probable().unwrap_or(0.0),
            dist,
        }
    }

    fn write(&self, prefix: &str, record: &mut ResultRecord) {
        record.vector(&format!("{prefix}_points"), &self.dist.points);
        record.vector(&format!("{prefix}_distrib"), &self.dist.probs);
        record.float(&format!("{prefix}_mean"), self.mean);
        record.float(&format!("{prefix}_med"), self.median);
        record.float(&format!("{prefix}_mp"), self.most_probable);
    }
}

/// Jump sizes, waiting times and their ratio over every recorded interval.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstantaneousStats {
    pub dx: Summarized,
    pub dt: Summarized,
    pub vi: Summarized,
}

impl InstantaneousStats {
    pub fn compute(trajectories: &[Trajectory], last_bin: f64, width: f64) -> Self {
        let mut dx = Vec::new();
        let mut dt = Vec::new();
        let mut vi = Vec::new();
        for traj in trajectories {
            for k in 1..traj.len() {
                let span = traj.times[k] - traj.times[k - 1];
                if traj.times[k] >= SENTINEL_TIME || !(span > 0.0) {
                    continue;
                }
                let step = traj.positions[k] as f64 - traj.positions[k - 1] as f64;
                dx.push(step);
                dt.push(span);
                vi.push(step / span);
            }
        }
        Self {
            dx: Summarized::new(dx, last_bin, width),
            dt: Summarized::new(dt, last_bin, width),
            vi: Summarized::new(vi, last_bin, width),
        }
    }
}

impl RecordFields for InstantaneousStats {
    fn write_fields(&self, record: &mut ResultRecord) {
        self.dx.write("dx", record);
        self.dt.write("dt", record);
        self.vi.write("vi", record);
    }
}
