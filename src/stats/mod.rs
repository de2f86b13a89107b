//! Reductions from raw trajectories to the statistic families written per
//! parameter combination.

pub mod array;
pub mod bootstrap;
pub mod distribution;
pub mod dwell;
pub mod events;
pub mod fit;
pub mod fpt;
pub mod main_results;

pub use array::{ArrayResults, ArrayWindow};
pub use bootstrap::{bootstrap_slope_std, BootstrapParams};
pub use distribution::{distribution, normalize_counts, BinGrid, Distribution};
pub use dwell::{theoretical_speed, DwellBins, DwellTimes, SpeedInputs};
pub use events::{InstantaneousStats, WaitingTimes};
pub use fit::{fit_exp_decay, linear_fit_through_origin, linregress, two_regime_fit, TwoRegimeFit};
pub use fpt::FptMatrix;
pub use main_results::MainResults;
