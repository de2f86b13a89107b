use crate::config::Config;
use crate::engine::Algorithm;
use crate::landscape::LandscapeMode;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Parameter sweeps of the chromatin and array studies.
#[derive(
    Debug, Clone, Copy, EnumIter, EnumString, Display, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum KnownGrid {
    /// Obstacle architectures against the full kernel map.
    Nu,
    /// Minimum accessible linker sizes.
    Bp,
    /// Short linkers.
    Lslow,
    /// Long linkers.
    Lshigh,
    Test,
    Map,
    ArrayData,
    ArrayTest,
}

/// Axes of a chromatin sweep, expanded as a Cartesian product.
struct ChromatinAxes {
    modes: Vec<LandscapeMode>,
    s: Vec<usize>,
    l: Vec<usize>,
    bpmin: Vec<usize>,
    mu: Vec<f64>,
    theta: Vec<f64>,
    nt: usize,
}

struct ArrayAxes {
    gap: Vec<usize>,
    bpmin: Vec<usize>,
    mu: Vec<f64>,
    theta: Vec<f64>,
    nt: usize,
}

fn stepped(first: usize, last: usize, step: usize) -> Vec<f64> {
    (first..=last).step_by(step).map(|v| v as f64).collect()
}

fn full_kernel_map(modes: Vec<LandscapeMode>, s: usize, l: Vec<usize>, bpmin: Vec<usize>) -> ChromatinAxes {
    ChromatinAxes {
        modes,
        s: vec![s],
        l,
        bpmin,
        mu: stepped(100, 600, 5),
        theta: stepped(1, 100, 1),
        nt: 10_000,
    }
}

impl KnownGrid {
    /// Output directory stem; each task appends `_<task_id>`.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Nu => "ncl_nu",
            Self::Bp => "ncl_bp",
            Self::Lslow => "ncl_lslow",
            Self::Lshigh => "ncl_lshigh",
            Self::Test => "ncl_test",
            Self::Map => "ncl_map",
            Self::ArrayData => "mrc_data",
            Self::ArrayTest => "mrc_test",
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::ArrayData | Self::ArrayTest)
    }

    /// Every combination of the grid, layered over `base`.
    ///
    /// Chromatin grids share `alphao = 0`, `alphaf = 1`, `beta = 0`,
    /// `lambda = 0.2` and `k_bind = k_rest = 1/6`.
    pub fn expand(&self, base: &Config) -> Vec<Config> {
        use LandscapeMode::*;
        match self {
            Self::Nu => chromatin(base, full_kernel_map(vec![NtRandom, Periodic, ConstantMean], 150, vec![10], vec![0])),
            Self::Bp => chromatin(base, full_kernel_map(vec![NtRandom], 150, vec![10], vec![5, 10, 15])),
            Self::Lslow => chromatin(base, full_kernel_map(vec![NtRandom], 150, vec![5, 15, 20, 25], vec![0])),
            Self::Lshigh => chromatin(base, full_kernel_map(vec![NtRandom], 150, vec![50, 100, 150], vec![0])),
            Self::Test => chromatin(
                base,
                ChromatinAxes {
                    modes: vec![ConstantMean],
                    s: vec![75],
                    l: vec![150],
                    bpmin: vec![5],
                    mu: vec![300.0],
                    theta: vec![50.0],
                    nt: 2,
                },
            ),
            Self::Map => chromatin(
                base,
                ChromatinAxes {
                    modes: vec![ConstantMean],
                    s: vec![0],
                    l: vec![150],
                    bpmin: vec![0],
                    mu: vec![300.0],
                    theta: vec![50.0],
                    nt: 1_000,
                },
            ),
            Self::ArrayData => array(
                base,
                ArrayAxes {
                    gap: (5..=35).step_by(5).collect(),
                    bpmin: vec![0, 2],
                    mu: stepped(1, 199, 2),
                    theta: stepped(1, 99, 2),
                    nt: 10_000,
                },
            ),
            Self::ArrayTest => array(
                base,
                ArrayAxes {
                    gap: vec![35],
                    bpmin: vec![0],
                    mu: vec![100.0],
                    theta: vec![50.0],
                    nt: 10_000,
                },
            ),
        }
    }
}

fn chromatin(base: &Config, axes: ChromatinAxes) -> Vec<Config> {
    let mut template = base.clone();
    template.landscape.alphao = 0.0;
    template.landscape.alphaf = 1.0;
    template.kinetics.beta = 0.0;
    template.kinetics.lambda = 0.2;
    template.kinetics.k_bind = 1.0 / 6.0;
    template.kinetics.k_rest = 1.0 / 6.0;
    template.run.nt = axes.nt;

    let mut out = Vec::with_capacity(
        axes.modes.len() * axes.s.len() * axes.l.len() * axes.bpmin.len() * axes.mu.len() * axes.theta.len(),
    );
    for &mode in &axes.modes {
        for &s in &axes.s {
            for &l in &axes.l {
                for &bpmin in &axes.bpmin {
                    for &mu in &axes.mu {
                        for &theta in &axes.theta {
                            let mut config = template.clone();
                            config.landscape.alpha_choice = mode;
                            config.landscape.obstacle_size = s;
                            config.landscape.linker_size = l;
                            config.landscape.bpmin = bpmin;
                            config.jump.mu = mu;
                            config.jump.theta = theta;
                            out.push(config);
                        }
                    }
                }
            }
        }
    }
    out
}

fn array(base: &Config, axes: ArrayAxes) -> Vec<Config> {
    let mut template = base.clone();
    template.landscape.alpha_choice = LandscapeMode::Array;
    template.landscape.alphao = 0.0;
    template.landscape.alphaf = 1.0;
    template.kinetics.algorithm = Algorithm::Position;
    template.kinetics.beta = 0.0;
    template.track.origin = 0;
    template.time.dt = 1.0;
    template.run.nt = axes.nt;

    let mut out =
        Vec::with_capacity(axes.bpmin.len() * axes.gap.len() * axes.mu.len() * axes.theta.len());
    for &bpmin in &axes.bpmin {
        for &gap in &axes.gap {
            for &mu in &axes.mu {
                for &theta in &axes.theta {
                    let mut config = template.clone();
                    config.landscape.bpmin = bpmin;
                    config.landscape.gap = gap;
                    config.jump.mu = mu;
                    config.jump.theta = theta;
                    out.push(config);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_grid_sizes() {
        let base = Config::default();
        assert_eq!(KnownGrid::Nu.expand(&base).len(), 3 * 101 * 100);
        assert_eq!(KnownGrid::Bp.expand(&base).len(), 3 * 101 * 100);
        assert_eq!(KnownGrid::ArrayData.expand(&base).len(), 7 * 2 * 100 * 50);
        assert_eq!(KnownGrid::Test.expand(&base).len(), 1);
    }

    #[test]
    fn test_names_round_trip() {
        for grid in KnownGrid::iter() {
            assert_eq!(KnownGrid::from_str(&grid.to_string()).unwrap(), grid);
        }
        assert_eq!(KnownGrid::from_str("ARRAY_TEST").unwrap(), KnownGrid::ArrayTest);
    }

    #[test]
    fn test_array_grid_uses_position_walk() {
        let configs = KnownGrid::ArrayTest.expand(&Config::default());
        assert_eq!(configs[0].kinetics.algorithm, Algorithm::Position);
        assert_eq!(configs[0].track.origin, 0);
        assert_eq!(configs[0].landscape.gap, 35);
    }
}
