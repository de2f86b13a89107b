pub mod dense;
pub mod folding;
pub mod one_step;
pub mod position;
pub mod two_step;

pub use dense::{fill_span, time_index, DenseAxis};
pub use folding::fold_origin;
pub use one_step::OneStep;
pub use position::PositionWalk;
pub use two_step::TwoStep;

use crate::error::{LfResult, LoopForgeError};
use crate::kernel::JumpKernel;
use crate::landscape::Landscape;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use tracing::debug;

/// Time recorded when the propensity vanishes and the next event never comes.
pub const SENTINEL_TIME: f64 = 1e308;

#[derive(
    Debug, Clone, Copy, EnumIter, EnumString, Display, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Algorithm {
    /// Jump and landing decided in one Gillespie draw, time-indexed output.
    #[strum(to_string = "one_step")]
    #[serde(rename = "one_step")]
    OneStep,
    /// Unconditional jump, then a bind attempt and a rest, time-indexed output.
    #[strum(to_string = "two_steps", serialize = "two_step")]
    #[serde(rename = "two_steps", alias = "two_step")]
    TwoStep,
    /// One-step kinetics recorded as first arrival time per site.
    #[strum(to_string = "position")]
    #[serde(rename = "position")]
    Position,
}

#[derive(
    Debug, Clone, Copy, EnumIter, EnumString, Display, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The stall reaction fired.
    Absorbed,
    /// The motor passed the end of the track.
    OutOfRange,
    /// Zero propensity; the last event sits at `SENTINEL_TIME`.
    Blocked,
    /// The observation window closed.
    Horizon,
}

/// Recorded events of one motor. Positions are displacements from `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub start: usize,
    pub times: Vec<f64>,
    pub positions: Vec<usize>,
    pub termination: Termination,
}

impl Trajectory {
    pub fn new(start: usize) -> Self {
        Self {
            start,
            times: vec![0.0],
            positions: vec![0],
            termination: Termination::Horizon,
        }
    }

    #[inline]
    pub fn record(&mut self, t: f64, displacement: usize) {
        self.times.push(t);
        self.positions.push(displacement);
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Events after the initial sample.
    pub fn events(&self) -> usize {
        self.times.len().saturating_sub(1)
    }

    pub fn final_time(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }

    pub fn final_position(&self) -> usize {
        self.positions.last().copied().unwrap_or(0)
    }

    pub fn max_displacement(&self) -> usize {
        self.positions.iter().copied().max().unwrap_or(0)
    }
}

/// A kinetic scheme that advances one motor on one landscape row.
pub trait MotorModel: Send + Sync {
    fn axis(&self) -> DenseAxis;

    /// Length of the dense row each trajectory fills.
    fn dense_len(&self) -> usize;

    fn run(
        &self,
        row: &[f64],
        start: usize,
        rng: &mut fastrand::Rng,
        dense: &mut [f64],
    ) -> Trajectory;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    pub nt: usize,
    pub origin: usize,
    pub fold_radius: usize,
    pub seed: Option<u64>,
}

/// All trajectories of one parameter combination and their dense rows.
#[derive(Debug, Clone)]
pub struct Ensemble {
    pub axis: DenseAxis,
    pub trajectories: Vec<Trajectory>,
    pub dense: Vec<Vec<f64>>,
}

impl Ensemble {
    pub fn nt(&self) -> usize {
        self.trajectories.len()
    }

    pub fn count(&self, termination: Termination) -> usize {
        self.trajectories
            .iter()
            .filter(|t| t.termination == termination)
            .count()
    }
}

/// Trajectory `i` draws from `seed + i`, independent of scheduling.
pub fn trajectory_rng(seed: Option<u64>, i: usize) -> fastrand::Rng {
    match seed {
        Some(s) => fastrand::Rng::with_seed(s.wrapping_add(i as u64)),
        None => fastrand::Rng::new(),
    }
}

/// Exponential waiting time; `u` is taken in `(0, 1]` so a finite rate never
/// produces an infinite wait.
#[inline]
pub(crate) fn exponential_wait(rng: &mut fastrand::Rng, rate: f64) -> f64 {
    -(1.0 - rng.f64()).ln() / rate
}

/// `beta + sum_{d=1..=reach} p[d] * a[x + d]`.
#[inline]
pub(crate) fn propensity(kernel: &JumpKernel, row: &[f64], x: usize, reach: usize, beta: f64) -> f64 {
    if reach == 0 {
        return beta;
    }
    let jumps: f64 = kernel.probs()[1..=reach]
        .iter()
        .zip(&row[x + 1..=x + reach])
        .map(|(p, a)| p * a)
        .sum();
    beta + jumps
}

/// Walks the cumulative propensity from `d = 1` until it reaches `target`.
#[inline]
pub(crate) fn select_jump(
    kernel: &JumpKernel,
    row: &[f64],
    x: usize,
    reach: usize,
    target: f64,
    beta: f64,
) -> usize {
    let mut d = 1;
    let mut acc = beta + kernel.p(1) * row[x + 1];
    while acc < target && d < reach {
        d += 1;
        acc += kernel.p(d) * row[x + d];
    }
    d
}

/// Longest jump reachable from `x` without leaving the row.
#[inline]
pub(crate) fn reach(kernel: &JumpKernel, sites: usize, x: usize) -> usize {
    kernel
        .support_end()
        .min(sites.saturating_sub(x + 1))
        .min(kernel.len().saturating_sub(1))
}

/// Runs `params.nt` independent trajectories of `model` in parallel.
///
/// Trajectory `i` uses landscape row `i` (rows are cycled if fewer) and its
/// own seeded generator, so a fixed seed reproduces the ensemble exactly.
pub fn simulate(
    model: &dyn MotorModel,
    landscape: &Landscape,
    params: &SimulationParams,
) -> LfResult<Ensemble> {
    let rows = landscape.rows();
    if rows == 0 || landscape.sites() == 0 {
        return Err(LoopForgeError::Validation(
            "cannot simulate on an empty landscape".to_string(),
        ));
    }
    let dense_len = model.dense_len();

    let runs: Vec<(Trajectory, Vec<f64>)> = (0..params.nt)
        .into_par_iter()
        .map(|i| -> LfResult<(Trajectory, Vec<f64>)> {
            let mut rng = trajectory_rng(params.seed, i);
            let row = landscape.row(i % rows);
            let start = fold_origin(row, landscape, params.origin, params.fold_radius, &mut rng)?;
            let mut dense = vec![f64::NAN; dense_len];
            let trajectory = model.run(row, start, &mut rng, &mut dense);
            Ok((trajectory, dense))
        })
        .collect::<LfResult<Vec<_>>>()?;

    let (trajectories, dense): (Vec<_>, Vec<_>) = runs.into_iter().unzip();
    let ensemble = Ensemble {
        axis: model.axis(),
        trajectories,
        dense,
    };

    debug!(
        "Simulated {} trajectories: {} absorbed, {} out of range, {} blocked, {} horizon",
        ensemble.nt(),
        ensemble.count(Termination::Absorbed),
        ensemble.count(Termination::OutOfRange),
        ensemble.count(Termination::Blocked),
        ensemble.count(Termination::Horizon)
    );
    Ok(ensemble)
}
