use crate::config::Config;
use crate::engine::{self, Algorithm, DenseAxis, Ensemble, OneStep, PositionWalk, TwoStep};
use crate::error::{LfResult, LoopForgeError};
use crate::kernel::JumpKernel;
use crate::landscape::{self, summary, Landscape};
use crate::output::{write_record, Field, ResultRecord, SavingMode};
use crate::stats::{
    theoretical_speed, two_regime_fit, ArrayResults, ArrayWindow, BootstrapParams, DwellBins,
    DwellTimes, FptMatrix, InstantaneousStats, MainResults, SpeedInputs, WaitingTimes,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// Keeps the landscape and bootstrap streams apart from the trajectory
// streams, which use `seed + i`.
const LANDSCAPE_SEED_OFFSET: u64 = 0x9E37_79B9_7F4A_7C15;
const BOOTSTRAP_SEED_OFFSET: u64 = 0xD1B5_4A32_D192_ED03;

/// Directory name of one combination, stable across runs.
pub fn run_title(config: &Config) -> String {
    let lp = &config.landscape;
    let jp = &config.jump;
    if lp.alpha_choice.is_array_architecture() {
        format!(
            "alphachoice={}_gap={}_mu={}_theta={}_nt={}",
            lp.alpha_choice, lp.gap, jp.mu, jp.theta, config.run.nt
        )
    } else {
        let kp = &config.kinetics;
        format!(
            "alphachoice={}_s={}_l={}_bpmin={}_mu={}_theta={}_lmbda={:.2e}_rtotbind={:.2e}_rtotrest={:.2e}_nt={}",
            lp.alpha_choice,
            lp.obstacle_size,
            lp.linker_size,
            lp.bpmin,
            jp.mu,
            jp.theta,
            kp.lambda,
            kp.k_bind,
            kp.k_rest,
            config.run.nt
        )
    }
}

/// Service: Build the landscape and kernel, run the ensemble and reduce it.
///
/// The landscape is dropped as soon as the trajectories exist and the
/// ensemble once the record is assembled.
pub fn run_combination(config: &Config) -> LfResult<ResultRecord> {
    config.validate()?;
    let title = run_title(config);
    debug!("[{}] Building landscape", title);

    let lp = &config.landscape;
    let seed = config.run.seed;
    let landscape = landscape::build(
        lp,
        &config.track,
        config.run.nt,
        seed.map(|s| s.wrapping_add(LANDSCAPE_SEED_OFFSET)),
    )?;
    let view = summary::summarize(&landscape, lp.alpha_choice, &config.analysis);

    let sites = landscape.sites();
    let kernel = JumpKernel::gamma(config.jump.mu, config.jump.theta, sites)?;
    debug!(
        "[{}] Kernel ready: {} lengths, support up to {}",
        title,
        kernel.len(),
        kernel.support_end()
    );

    let ensemble = simulate(config, &landscape, &kernel)?;
    let array_region = landscape.array_region();
    drop(landscape);

    let mut record = ResultRecord::new();
    write_parameters(config, sites, &mut record);
    if config.run.saving == SavingMode::Data {
        record.add(&view);
    }
    drop(view);

    match ensemble.axis {
        DenseAxis::Time { dt } => analyse_time_axis(config, &ensemble, dt, &mut record),
        DenseAxis::Position => {
            let (x_min, x_max) = array_region.ok_or_else(|| {
                LoopForgeError::Validation("position output needs an array region".to_string())
            })?;
            analyse_position_axis(config, &ensemble, x_min, x_max, &kernel, &mut record)
        }
    }

    if config.run.saving == SavingMode::Data {
        record.push("results", Field::Matrix(ensemble.dense));
    }
    info!(
        "[{}] Done: v_mean = {}",
        title,
        record
            .scalar("v_mean")
            .or_else(|| record.scalar("v_marcand"))
            .map_or_else(|| "n/a".to_string(), |v| format!("{:.3}", v))
    );
    Ok(record)
}

/// Service: Run one combination and write its record under
/// `<base>/<title>/results.json`.
pub fn run_and_write(config: &Config, base: &Path) -> LfResult<PathBuf> {
    let record = run_combination(config)?;
    write_record(&base.join(run_title(config)), &record)
}

/// Resolves the kinetic scheme from the configuration and runs it.
pub fn simulate(config: &Config, landscape: &Landscape, kernel: &JumpKernel) -> LfResult<Ensemble> {
    let sites = landscape.sites();
    let origin = config.track.origin;
    if origin >= sites {
        return Err(LoopForgeError::InvalidConfiguration(format!(
            "origin {} lies outside a landscape of {} sites",
            origin, sites
        )));
    }
    let track_end = config
        .track
        .track_end
        .unwrap_or(sites - origin)
        .clamp(origin + 1, sites);

    let params = engine::SimulationParams {
        nt: config.run.nt,
        origin,
        fold_radius: config.run.fold_radius,
        seed: config.run.seed,
    };
    let kp = &config.kinetics;
    let tp = &config.time;

    match kp.algorithm {
        Algorithm::OneStep => {
            let model = OneStep {
                kernel,
                beta: kp.beta,
                tmax: tp.tmax,
                dt: tp.dt,
                track_end,
            };
            engine::simulate(&model, landscape, &params)
        }
        Algorithm::TwoStep => {
            let model = TwoStep {
                kernel,
                lambda: kp.lambda,
                k_bind: kp.k_bind,
                k_rest: kp.k_rest,
                tmax: tp.tmax,
                dt: tp.dt,
                track_end,
            };
            engine::simulate(&model, landscape, &params)
        }
        Algorithm::Position => {
            let (_, x_max) = landscape.array_region().ok_or_else(|| {
                LoopForgeError::InvalidConfiguration(
                    "the position algorithm needs an array landscape".to_string(),
                )
            })?;
            let model = PositionWalk {
                kernel,
                beta: kp.beta,
                x_max,
            };
            engine::simulate(&model, landscape, &params)
        }
    }
}

fn write_parameters(config: &Config, sites: usize, record: &mut ResultRecord) {
    let lp = &config.landscape;
    let kp = &config.kinetics;
    let tp = &config.track;

    record.text("alpha_choice", lp.alpha_choice.to_string());
    record.text("algorithm", kp.algorithm.to_string());
    if lp.alpha_choice.is_array_architecture() {
        record.int("gap", lp.gap as i64);
        record.int("N", lp.n_domains as i64);
        record.int("total_lenght", sites as i64);
    } else {
        record.int("s", lp.obstacle_size as i64);
        record.int("l", lp.linker_size as i64);
        record.int("Lmin", tp.lmin as i64);
        record.int("Lmax", tp.lmax as i64);
    }
    record.int("bpmin", lp.bpmin as i64);
    record.float("mu", config.jump.mu);
    record.float("theta", config.jump.theta);
    record.float("alphao", lp.alphao);
    record.float("alphaf", lp.alphaf);
    record.float("beta", kp.beta);
    record.float("lmbda", kp.lambda);
    record.float("rtot_bind", kp.k_bind);
    record.float("rtot_rest", kp.k_rest);
    record.int("bps", tp.bps as i64);
    record.int("origin", tp.origin as i64);
    record.float("tmax", config.time.tmax);
    record.float("dt", config.time.dt);
    record.int("nt", config.run.nt as i64);
}

fn bootstrap_params(config: &Config, step: f64, columns: usize) -> BootstrapParams {
    BootstrapParams {
        n_boot: config.analysis.n_boot,
        batch: config.analysis.boot_batch,
        step,
        range: 0..columns,
        seed: config
            .run
            .seed
            .map(|s| s.wrapping_add(BOOTSTRAP_SEED_OFFSET)),
    }
}

fn analyse_time_axis(config: &Config, ensemble: &Ensemble, dt: f64, record: &mut ResultRecord) {
    let ap = &config.analysis;
    let lp = &config.landscape;
    let kp = &config.kinetics;
    let data = config.run.saving == SavingMode::Data;
    let trajectories = &ensemble.trajectories;

    let columns = ensemble.dense.first().map_or(0, Vec::len);
    let boot = bootstrap_params(config, dt, columns);
    let main = MainResults::compute(&ensemble.dense, dt, ap.alpha_0, data.then_some(&boot));
    debug!("Main results: v_mean = {:?}, v_med = {:?}", main.v_mean, main.v_med);

    let dwell = DwellTimes::compute(
        trajectories,
        DwellBins {
            last: ap.dwell_last_bin,
            width: ap.dwell_bin_width,
            fit_xmax: ap.dwell_fit_xmax,
        },
    );
    let speed = SpeedInputs {
        alphao: lp.alphao,
        alphaf: lp.alphaf,
        s: lp.obstacle_size as f64,
        l: lp.linker_size as f64,
        mu: config.jump.mu,
        lambda: kp.lambda,
    };
    let v_th = theoretical_speed(&speed, kp.k_bind, kp.k_rest);
    let v_fit = dwell
        .fitted_rates()
        .map(|(k_bind, k_rest)| theoretical_speed(&speed, k_bind, k_rest));

    if !data {
        record.optional("v_mean", main.v_mean);
        record.float("v_th", v_th);
        record.optional("v_fit", v_fit);
        record.optional("tau_forwards", dwell.forwards_fit.tau);
        record.optional("tau_reverses", dwell.reverses_fit.tau);
        return;
    }

    let times: Vec<f64> = (0..main.mean.len()).map(|k| k as f64 * dt).collect();
    let regimes = two_regime_fit(&times, &main.mean, ap.fit_bound_low, ap.fit_bound_high);
    let horizon = config.time.tmax.max(0.0).floor() as usize;
    let fpt = FptMatrix::compute(trajectories, horizon, ap.fpt_bin);
    let waiting = WaitingTimes::compute(trajectories, ap.waiting_last_bin);
    let instant = InstantaneousStats::compute(trajectories, ap.speed_last_bin, ap.speed_bin_width);

    record.add(&main);
    record.add(&regimes);
    record.add(&fpt);
    record.add(&waiting);
    record.add(&instant);
    record.add(&dwell);
    record.float("v_th", v_th);
    record.optional("v_fit", v_fit);
}

fn analyse_position_axis(
    config: &Config,
    ensemble: &Ensemble,
    x_min: usize,
    x_max: usize,
    kernel: &JumpKernel,
    record: &mut ResultRecord,
) {
    let ap = &config.analysis;
    let trajectories = &ensemble.trajectories;
    let window = ArrayWindow {
        x_min,
        x_max,
        mu: config.jump.mu,
        hist_width: ap.fpt_hist_width,
        hist_max: ap.fpt_hist_max,
    };
    let boot = bootstrap_params(config, 1.0, x_max + 1);
    let data = config.run.saving == SavingMode::Data;
    let array = ArrayResults::compute(&ensemble.dense, &window, Some(&boot));
    debug!("Array results: v_marcand = {:?}", array.v_marcand);

    if !data {
        record.optional("v_marcand", array.v_marcand);
        record.optional("err_fpt_slope", array.err_fpt_slope);
        return;
    }

    let fpt = FptMatrix::compute(trajectories, ap.array_fpt_horizon, ap.array_fpt_bin);
    let waiting = WaitingTimes::compute(trajectories, ap.waiting_last_bin);
    let instant = InstantaneousStats::compute(trajectories, ap.speed_last_bin, ap.speed_bin_width);

    record.vector("p", kernel.probs());
    record.add(&array);
    record.add(&fpt);
    record.add(&waiting);
    record.add(&instant);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chromatin_title() {
        let mut config = Config::default();
        config.run.nt = 100;
        assert_eq!(
            run_title(&config),
            "alphachoice=periodic_s=150_l=10_bpmin=0_mu=300_theta=50_lmbda=2.00e-1_rtotbind=1.67e-1_rtotrest=1.67e-1_nt=100"
        );
    }

    #[test]
    fn test_array_title() {
        let mut config = Config::default();
        config.landscape.alpha_choice = crate::landscape::LandscapeMode::Array;
        config.jump.mu = 100.0;
        config.run.nt = 100;
        assert_eq!(
            run_title(&config),
            "alphachoice=array_gap=35_mu=100_theta=50_nt=100"
        );
    }
}
