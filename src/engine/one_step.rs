use super::dense::{fill_span, time_index, DenseAxis};
use super::{exponential_wait, propensity, reach, select_jump};
use super::{MotorModel, Termination, Trajectory, SENTINEL_TIME};
use crate::kernel::JumpKernel;

/// Single-draw Gillespie walker.
///
/// At site `x` the total rate is the stall propensity plus every reachable
/// jump weighted by the landing site. One uniform picks the waiting time,
/// a second one picks stall or jump length.
#[derive(Debug, Clone)]
pub struct OneStep<'k> {
    pub kernel: &'k JumpKernel,
    pub beta: f64,
    pub tmax: f64,
    pub dt: f64,
    /// Absolute site whose crossing ends the trajectory.
    pub track_end: usize,
}

impl MotorModel for OneStep<'_> {
    fn axis(&self) -> DenseAxis {
        DenseAxis::Time { dt: self.dt }
    }

    fn dense_len(&self) -> usize {
        (self.tmax / self.dt).floor() as usize
    }

    fn run(
        &self,
        row: &[f64],
        start: usize,
        rng: &mut fastrand::Rng,
        dense: &mut [f64],
    ) -> Trajectory {
        let mut traj = Trajectory::new(start);
        let mut t = 0.0;
        let mut x = start;
        let mut i0 = 0;

        while t < self.tmax {
            let displacement = x - start;
            let span = reach(self.kernel, row.len(), x);
            let rate = propensity(self.kernel, row, x, span, self.beta);

            let wait = exponential_wait(rng, rate);
            if !wait.is_finite() {
                traj.record(SENTINEL_TIME, displacement);
                traj.termination = Termination::Blocked;
                fill_span(dense, i0, usize::MAX, displacement as f64);
                return traj;
            }
            t += wait;

            let target = rng.f64() * rate;
            if self.beta > 0.0 && target <= self.beta {
                traj.record(t, displacement);
                traj.termination = Termination::Absorbed;
                fill_span(dense, i0, usize::MAX, displacement as f64);
                return traj;
            }

            let d = select_jump(self.kernel, row, x, span, target, self.beta);
            i0 = fill_span(dense, i0, time_index(t, self.dt), displacement as f64);
            x += d;
            traj.record(t, x - start);

            if x >= self.track_end {
                traj.termination = Termination::OutOfRange;
                return traj;
            }
        }

        traj.termination = Termination::Horizon;
        traj
    }
}
