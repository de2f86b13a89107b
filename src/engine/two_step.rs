use super::dense::{fill_span, time_index, DenseAxis};
use super::exponential_wait;
use super::{MotorModel, Termination, Trajectory, SENTINEL_TIME};
use crate::kernel::JumpKernel;

/// Bind-then-rest cycle.
///
/// Each cycle draws a jump from the kernel regardless of the landscape,
/// waits for a binding attempt, and keeps the new site with probability
/// `a[x] * (1 - lambda)` at the price of an extra rest. A failed attempt
/// sends the motor back where it was. Both sub-events are recorded.
#[derive(Debug, Clone)]
pub struct TwoStep<'k> {
    pub kernel: &'k JumpKernel,
    pub lambda: f64,
    pub k_bind: f64,
    pub k_rest: f64,
    pub tmax: f64,
    pub dt: f64,
    pub track_end: usize,
}

impl MotorModel for TwoStep<'_> {
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
            let target = x + self.kernel.sample(rng.f64());
            if target >= self.track_end {
                fill_span(dense, i0, time_index(t, self.dt), (x - start) as f64);
                traj.termination = Termination::OutOfRange;
                return traj;
            }

            t += exponential_wait(rng, self.k_bind);
            if !t.is_finite() || t >= SENTINEL_TIME {
                return blocked(traj, dense, i0, x - start);
            }
            traj.record(t, target - start);

            let prev = x;
            if rng.f64() < row[target] * (1.0 - self.lambda) {
                t += exponential_wait(rng, self.k_rest);
                if !t.is_finite() || t >= SENTINEL_TIME {
                    return blocked(traj, dense, i0, target - start);
                }
                x = target;
            }
            traj.record(t, x - start);
            i0 = fill_span(dense, i0, time_index(t, self.dt), (prev - start) as f64);
        }

        traj.termination = Termination::Horizon;
        traj
    }
}

fn blocked(mut traj: Trajectory, dense: &mut [f64], i0: usize, displacement: usize) -> Trajectory {
    traj.record(SENTINEL_TIME, displacement);
    traj.termination = Termination::Blocked;
    fill_span(dense, i0, usize::MAX, displacement as f64);
    traj
}
