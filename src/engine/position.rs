use super::dense::{fill_span, DenseAxis};
use super::{exponential_wait, propensity, reach, select_jump};
use super::{MotorModel, Termination, Trajectory, SENTINEL_TIME};
use crate::kernel::JumpKernel;

/// One-step kinetics that records when each site is first passed, up to
/// `x_max`. Sites at or behind the start are reached at time 0.
#[derive(Debug, Clone)]
pub struct PositionWalk<'k> {
    pub kernel: &'k JumpKernel,
    pub beta: f64,
    pub x_max: usize,
}

impl MotorModel for PositionWalk<'_> {
    fn axis(&self) -> DenseAxis {
        DenseAxis::Position
    }

    fn dense_len(&self) -> usize {
        self.x_max + 1
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
        let mut i0 = fill_span(dense, 0, start.min(self.x_max), 0.0);

        while x < self.x_max {
            let span = reach(self.kernel, row.len(), x);
            let rate = propensity(self.kernel, row, x, span, self.beta);

            let wait = exponential_wait(rng, rate);
            if !wait.is_finite() {
                traj.record(SENTINEL_TIME, x - start);
                traj.termination = Termination::Blocked;
                return traj;
            }
            t += wait;

            let target = rng.f64() * rate;
            if self.beta > 0.0 && target <= self.beta {
                traj.record(t, x - start);
                traj.termination = Termination::Absorbed;
                return traj;
            }

            x += select_jump(self.kernel, row, x, span, target, self.beta);
            traj.record(t, x - start);
            i0 = fill_span(dense, i0, x.min(self.x_max), t);
        }

        traj.termination = Termination::OutOfRange;
        traj
    }
}
