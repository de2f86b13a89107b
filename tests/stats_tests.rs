use loopforge::engine::{simulate, PositionWalk, SimulationParams, TwoStep};
use loopforge::kernel::JumpKernel;
use loopforge::landscape::Landscape;
use loopforge::output::ResultRecord;
use loopforge::stats::{
    bootstrap_slope_std, two_regime_fit, ArrayResults, ArrayWindow, BootstrapParams, DwellBins,
    DwellTimes, InstantaneousStats, MainResults, WaitingTimes,
};

// --- Helpers ---

/// Rows `x_i(k) = v_i * k` with per-row speeds spread around 1.
fn linear_rows(nt: usize, width: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..nt)
        .map(|_| {
            let v = 0.5 + rng.f64();
            (0..width).map(|k| v * k as f64).collect()
        })
        .collect()
}

fn boot(width: usize) -> BootstrapParams {
    BootstrapParams {
        n_boot: 200,
        batch: 50,
        step: 1.0,
        range: 0..width,
        seed: Some(17),
    }
}

fn params(nt: usize, seed: u64) -> SimulationParams {
    SimulationParams {
        nt,
        origin: 0,
        fold_radius: 0,
        seed: Some(seed),
    }
}

// --- Bootstrap ---

#[test]
fn test_bootstrap_error_shrinks_with_ensemble_size() {
    let small = bootstrap_slope_std(&linear_rows(20, 30, 1), &boot(30)).unwrap();
    let large = bootstrap_slope_std(&linear_rows(500, 30, 1), &boot(30)).unwrap();
    assert!(small > 0.0);
    assert!(
        large < small,
        "expected {} < {} for the larger ensemble",
        large,
        small
    );
}

#[test]
fn test_bootstrap_is_reproducible_with_seed() {
    let rows = linear_rows(50, 20, 3);
    let a = bootstrap_slope_std(&rows, &boot(20));
    let b = bootstrap_slope_std(&rows, &boot(20));
    assert_eq!(a, b);
}

#[test]
fn test_bootstrap_of_identical_rows_has_no_spread() {
    let rows = vec![vec![0.0, 2.0, 4.0, 6.0]; 10];
    let err = bootstrap_slope_std(&rows, &boot(4)).unwrap();
    assert!(err.abs() < 1e-12);
}

// --- Main results and regimes ---

#[test]
fn test_main_results_with_bootstrap() {
    let rows = linear_rows(100, 40, 5);
    let main = MainResults::compute(&rows, 0.5, 2.0, Some(&boot(40)));

    // Mean speed is ~1 site per column, so ~2 per unit time, scaled by alpha_0.
    let v = main.v_mean.unwrap();
    assert!((v - 4.0).abs() < 0.4, "v_mean = {}", v);
    assert!(main.err_v_mean.unwrap() > 0.0);
    assert_eq!(main.mean.len(), 40);
}

#[test]
fn test_two_regime_fit_on_ballistic_curve() {
    let times: Vec<f64> = (0..120).map(|k| k as f64).collect();
    let positions: Vec<f64> = times.iter().map(|t| 2.0 * t).collect();
    let fit = two_regime_fit(&times, &positions, 5, 80);

    assert_eq!(fit.vf, Some(2.0));
    assert_eq!(fit.vf_std, Some(0.0));
    assert_eq!(fit.wf, Some(1.0));
    assert_eq!(fit.cf, Some(2.0));
    assert_eq!(fit.xt_over_t.len(), 119);
    assert!(fit.g.iter().all(|g| (g - 1.0).abs() < 1e-9));
}

#[test]
fn test_two_regime_fit_on_short_curve_is_empty() {
    let times = [0.0, 1.0, 2.0];
    let positions = [0.0, 1.0, 2.0];
    let fit = two_regime_fit(&times, &positions, 5, 80);
    assert_eq!(fit.vf, None);
    assert_eq!(fit.wf, None);
    assert!(fit.xt_over_t.is_empty());
}

// --- Event statistics on a simulated ensemble ---

#[test]
fn test_two_step_dwell_fits_recover_rates() {
    let kernel = JumpKernel::deterministic(1, 10).unwrap();
    let landscape = Landscape::shared(vec![1.0; 5_000], 300, 0.0, 1.0);
    let model = TwoStep {
        kernel: &kernel,
        lambda: 0.0,
        k_bind: 1.0,
        k_rest: 0.5,
        tmax: 200.0,
        dt: 1.0,
        track_end: 5_000,
    };
    let ensemble = simulate(&model, &landscape, &params(300, 21)).unwrap();

    let dwell = DwellTimes::compute(
        &ensemble.trajectories,
        DwellBins {
            last: 30.0,
            width: 0.2,
            fit_xmax: 30.0,
        },
    );
    // Every bind is accepted, so only the forward families are populated.
    assert!(dwell.rb.probs.iter().all(|&p| p == 0.0));
    let tau_bind = dwell.fb_fit.tau.unwrap();
    let tau_rest = dwell.fr_fit.tau.unwrap();
    assert!((tau_bind - 1.0).abs() < 0.2, "tau_bind = {}", tau_bind);
    assert!((tau_rest - 2.0).abs() < 0.4, "tau_rest = {}", tau_rest);
    // Reverse families are empty, so the rates cannot be combined.
    assert_eq!(dwell.fitted_rates(), None);
}

#[test]
fn test_event_families_fill_their_keys() {
    let kernel = JumpKernel::gamma(5.0, 2.0, 2_000).unwrap();
    let landscape = Landscape::shared(vec![1.0; 2_000], 50, 0.0, 1.0);
    let model = TwoStep {
        kernel: &kernel,
        lambda: 0.5,
        k_bind: 1.0,
        k_rest: 1.0,
        tmax: 50.0,
        dt: 1.0,
        track_end: 2_000,
    };
    let ensemble = simulate(&model, &landscape, &params(50, 2)).unwrap();
    let trajectories = &ensemble.trajectories;

    let mut record = ResultRecord::new();
    record.add(&WaitingTimes::compute(trajectories, 100.0));
    record.add(&InstantaneousStats::compute(trajectories, 100.0, 1.0));

    for key in ["tbj_points", "tbj_distrib", "dx_mean", "dt_med", "vi_mp"] {
        assert!(record.get(key).is_some(), "missing {}", key);
    }
    // Rejected binds fall back at the same instant and are not counted.
    let instant = InstantaneousStats::compute(trajectories, 100.0, 1.0);
    assert!(instant.dt.mean > 0.0);
    assert!(instant.dx.mean > 0.0);
}

// --- Array first passage ---

#[test]
fn test_array_results_on_free_track() {
    let kernel = JumpKernel::deterministic(1, 10).unwrap();
    let landscape = Landscape::shared(vec![1.0; 80], 40, 0.0, 1.0).with_array_region(10, 60);
    let model = PositionWalk {
        kernel: &kernel,
        beta: 0.0,
        x_max: 60,
    };
    let ensemble = simulate(&model, &landscape, &params(40, 6)).unwrap();

    let window = ArrayWindow {
        x_min: 10,
        x_max: 60,
        mu: 1.0,
        hist_width: 1.0,
        hist_max: 200.0,
    };
    let array = ArrayResults::compute(&ensemble.dense, &window, Some(&boot(61)));

    assert_eq!(array.fpt_mean.len(), 61);
    assert_eq!(array.fpt_2d.len(), 61);
    // Unit steps at unit rate: crossing 50 sites takes ~50 time units.
    let v = array.v_marcand.unwrap();
    assert!((v - 1.0).abs() < 0.3, "v_marcand = {}", v);
    assert!(array.p_tau.windows(2).all(|w| w[1] <= w[0] + 1e-12));
    assert!(array.err_fpt_slope.is_some());
}
