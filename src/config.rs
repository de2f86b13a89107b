use crate::engine::Algorithm;
use crate::error::{LfResult, LoopForgeError};
use crate::landscape::LandscapeMode;
use crate::output::SavingMode;
use clap::Args;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything one parameter combination needs, from track geometry to analysis bins.
#[derive(Args, Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub track: TrackParams,
    #[command(flatten)]
    pub landscape: LandscapeParams,
    #[command(flatten)]
    pub jump: JumpParams,
    #[command(flatten)]
    pub kinetics: KineticParams,
    #[command(flatten)]
    pub time: TimeParams,
    #[command(flatten)]
    pub run: RunParams,
    #[command(flatten)]
    pub analysis: AnalysisParams,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackParams {
    #[arg(long, default_value_t = 0)]
    pub lmin: usize,
    #[arg(long, default_value_t = 50_000)]
    pub lmax: usize,
    /// Base pairs per lattice site.
    #[arg(long, default_value_t = 1)]
    pub bps: usize,
    /// Nominal start site, folded onto the nearest free run when it lands on an obstacle.
    #[arg(long, default_value_t = 10_000)]
    pub origin: usize,
    /// Absolute site at which a trajectory leaves the track. Defaults to `sites - origin`.
    #[arg(long)]
    pub track_end: Option<usize>,
}

impl Default for TrackParams {
    fn default() -> Self {
        Self {
            lmin: 0,
            lmax: 50_000,
            bps: 1,
            origin: 10_000,
            track_end: None,
        }
    }
}

impl TrackParams {
    /// Number of lattice sites for the chromatin generators.
    pub fn sites(&self) -> usize {
        if self.bps == 0 || self.lmax <= self.lmin {
            return 0;
        }
        (self.lmax - self.lmin) / self.bps
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LandscapeParams {
    #[arg(long, default_value_t = LandscapeMode::Periodic)]
    pub alpha_choice: LandscapeMode,
    /// Obstacle (nucleosome) block size, in sites.
    #[arg(long, default_value_t = 150)]
    pub obstacle_size: usize,
    /// Free (linker) block size, in sites.
    #[arg(long, default_value_t = 10)]
    pub linker_size: usize,
    /// Free runs shorter than this become obstacle.
    #[arg(long, default_value_t = 0)]
    pub bpmin: usize,
    #[arg(long, default_value_t = 0.0)]
    pub alphao: f64,
    #[arg(long, default_value_t = 1.0)]
    pub alphaf: f64,

    // === ARRAY ARCHITECTURE ===
    #[arg(long, default_value_t = 35)]
    pub gap: usize,
    #[arg(long, default_value_t = 14)]
    pub rap1_len: usize,
    #[arg(long, default_value_t = 24)]
    pub laco_len: usize,
    /// Number of paired-obstacle domains in the array.
    #[arg(long, default_value_t = 8)]
    pub n_domains: usize,
    /// Free sites before and after the array.
    #[arg(long, default_value_t = 2_000)]
    pub array_padding: usize,
}

impl Default for LandscapeParams {
    fn default() -> Self {
        Self {
            alpha_choice: LandscapeMode::Periodic,
            obstacle_size: 150,
            linker_size: 10,
            bpmin: 0,
            alphao: 0.0,
            alphaf: 1.0,
            gap: 35,
            rap1_len: 14,
            laco_len: 24,
            n_domains: 8,
            array_padding: 2_000,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JumpParams {
    /// Mean jump length of the Gamma kernel.
    #[arg(long, default_value_t = 300.0)]
    pub mu: f64,
    /// Spread of the Gamma kernel.
    #[arg(long, default_value_t = 50.0)]
    pub theta: f64,
}

impl Default for JumpParams {
    fn default() -> Self {
        Self {
            mu: 300.0,
            theta: 50.0,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KineticParams {
    #[arg(long, default_value_t = Algorithm::TwoStep)]
    pub algorithm: Algorithm,
    /// Stall (unhooking) propensity.
    #[arg(long, default_value_t = 0.0)]
    pub beta: f64,
    /// Leakage: probability that a bind on a free site is still rejected.
    #[arg(long, default_value_t = 0.2)]
    pub lambda: f64,
    #[arg(long, default_value_t = 1.0 / 6.0)]
    pub k_bind: f64,
    #[arg(long, default_value_t = 1.0 / 6.0)]
    pub k_rest: f64,
}

impl Default for KineticParams {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::TwoStep,
            beta: 0.0,
            lambda: 0.2,
            k_bind: 1.0 / 6.0,
            k_rest: 1.0 / 6.0,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimeParams {
    #[arg(long, default_value_t = 100.0)]
    pub tmax: f64,
    #[arg(long, default_value_t = 1.0)]
    pub dt: f64,
}

impl Default for TimeParams {
    fn default() -> Self {
        Self {
            tmax: 100.0,
            dt: 1.0,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunParams {
    /// Number of trajectories.
    #[arg(long, default_value_t = 1_000)]
    pub nt: usize,
    #[arg(long)]
    pub seed: Option<u64>,
    /// Maximum backward search when folding the origin off an obstacle.
    #[arg(long, default_value_t = 10_000)]
    pub fold_radius: usize,
    #[arg(long, default_value_t = SavingMode::Data)]
    pub saving: SavingMode,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            nt: 1_000,
            seed: None,
            fold_radius: 10_000,
            saving: SavingMode::Data,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisParams {
    /// Multiplier applied to fitted velocities.
    #[arg(long, default_value_t = 1.0)]
    pub alpha_0: f64,

    // === FIRST PASSAGE ===
    #[arg(long, default_value_t = 10)]
    pub fpt_bin: usize,
    #[arg(long, default_value_t = 1_000)]
    pub array_fpt_horizon: usize,
    #[arg(long, default_value_t = 1)]
    pub array_fpt_bin: usize,
    #[arg(long, default_value_t = 10.0)]
    pub fpt_hist_width: f64,
    #[arg(long, default_value_t = 10_000.0)]
    pub fpt_hist_max: f64,

    // === DISTRIBUTIONS ===
    #[arg(long, default_value_t = 100_000.0)]
    pub waiting_last_bin: f64,
    #[arg(long, default_value_t = 100_000.0)]
    pub speed_last_bin: f64,
    #[arg(long, default_value_t = 1.0)]
    pub speed_bin_width: f64,
    #[arg(long, default_value_t = 10)]
    pub run_length_step: usize,
    #[arg(long, default_value_t = 10_000)]
    pub linker_view_size: usize,
    #[arg(long, default_value_t = 10_000)]
    pub linker_view_threshold: usize,

    // === DWELL TIMES ===
    #[arg(long, default_value_t = 100.0)]
    pub dwell_last_bin: f64,
    #[arg(long, default_value_t = 0.2)]
    pub dwell_bin_width: f64,
    #[arg(long, default_value_t = 100.0)]
    pub dwell_fit_xmax: f64,

    // === FITS ===
    #[arg(long, default_value_t = 5)]
    pub fit_bound_low: usize,
    #[arg(long, default_value_t = 80)]
    pub fit_bound_high: usize,
    #[arg(long, default_value_t = 1_000)]
    pub n_boot: usize,
    #[arg(long, default_value_t = 100)]
    pub boot_batch: usize,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            alpha_0: 1.0,
            fpt_bin: 10,
            array_fpt_horizon: 1_000,
            array_fpt_bin: 1,
            fpt_hist_width: 10.0,
            fpt_hist_max: 10_000.0,
            waiting_last_bin: 100_000.0,
            speed_last_bin: 100_000.0,
            speed_bin_width: 1.0,
            run_length_step: 10,
            linker_view_size: 10_000,
            linker_view_threshold: 10_000,
            dwell_last_bin: 100.0,
            dwell_bin_width: 0.2,
            dwell_fit_xmax: 100.0,
            fit_bound_low: 5,
            fit_bound_high: 80,
            n_boot: 1_000,
            boot_batch: 100,
        }
    }
}

fn invalid(msg: String) -> LoopForgeError {
    LoopForgeError::InvalidConfiguration(msg)
}

fn check_probability(name: &str, value: f64) -> LfResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(format!(
            "{} must be between 0 and 1, got {}",
            name, value
        )));
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> LfResult<()> {
    if !(value > 0.0 && value.is_finite()) {
        return Err(invalid(format!("{} must be positive, got {}", name, value)));
    }
    Ok(())
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> LfResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Fails fast on anything the generators or the engine cannot honour.
    pub fn validate(&self) -> LfResult<()> {
        let lp = &self.landscape;
        let tp = &self.track;
        let kp = &self.kinetics;

        check_probability("alphao", lp.alphao)?;
        check_probability("alphaf", lp.alphaf)?;
        check_probability("beta", kp.beta)?;
        check_probability("lambda", kp.lambda)?;

        check_positive("mu", self.jump.mu)?;
        check_positive("theta", self.jump.theta)?;
        check_positive("dt", self.time.dt)?;
        check_positive("tmax", self.time.tmax)?;
        if kp.algorithm == Algorithm::TwoStep {
            check_positive("k_bind", kp.k_bind)?;
            check_positive("k_rest", kp.k_rest)?;
        }

        if self.run.nt == 0 {
            return Err(invalid("nt must be at least 1".to_string()));
        }

        if lp.alpha_choice.is_array_architecture() {
            if lp.n_domains == 0 {
                return Err(invalid("n_domains must be at least 1".to_string()));
            }
        } else {
            if tp.bps == 0 {
                return Err(invalid("bps must be positive".to_string()));
            }
            if tp.lmax <= tp.lmin {
                return Err(invalid(format!(
                    "lmax must be greater than lmin, got lmax={}, lmin={}",
                    tp.lmax, tp.lmin
                )));
            }
            let sites = tp.sites();
            if tp.origin >= sites {
                return Err(invalid(format!(
                    "origin must lie in [0, {}), got {}",
                    sites, tp.origin
                )));
            }
            if lp.obstacle_size + lp.linker_size == 0 {
                return Err(invalid(
                    "obstacle_size + linker_size must be positive".to_string(),
                ));
            }
            if lp.obstacle_size > sites {
                return Err(invalid(format!(
                    "obstacle_size {} exceeds the track length {}",
                    lp.obstacle_size, sites
                )));
            }
            if let Some(end) = tp.track_end {
                if end > sites || end <= tp.origin {
                    return Err(invalid(format!(
                        "track_end must lie in ({}, {}], got {}",
                        tp.origin, sites, end
                    )));
                }
            }
        }

        if kp.algorithm == Algorithm::Position && !lp.alpha_choice.is_array_architecture() {
            return Err(invalid(format!(
                "the position algorithm needs an array landscape, got '{}'",
                lp.alpha_choice
            )));
        }

        let ap = &self.analysis;
        if ap.fpt_bin == 0 || ap.array_fpt_bin == 0 {
            return Err(invalid("FPT bin sizes must be positive".to_string()));
        }
        if ap.run_length_step == 0 || ap.boot_batch == 0 {
            return Err(invalid(
                "run_length_step and boot_batch must be positive".to_string(),
            ));
        }
        check_positive("fpt_hist_width", ap.fpt_hist_width)?;
        check_positive("speed_bin_width", ap.speed_bin_width)?;
        check_positive("dwell_bin_width", ap.dwell_bin_width)?;

        Ok(())
    }
}
