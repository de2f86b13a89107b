use loopforge::engine::{
    simulate, Ensemble, OneStep, PositionWalk, SimulationParams, Termination, TwoStep,
    SENTINEL_TIME,
};
use loopforge::kernel::JumpKernel;
use loopforge::landscape::Landscape;

// --- Helpers ---

/// `[o, o, f, f, f]` repeated four times: 20 sites, origin 2 is free.
fn striped(alphao: f64) -> Vec<f64> {
    (0..4)
        .flat_map(|_| [alphao, alphao, 1.0, 1.0, 1.0])
        .collect()
}

fn params(nt: usize, origin: usize, seed: u64) -> SimulationParams {
    SimulationParams {
        nt,
        origin,
        fold_radius: 100,
        seed: Some(seed),
    }
}

fn run_one_step(row: Vec<f64>, kernel: &JumpKernel, beta: f64, origin: usize) -> Ensemble {
    let sites = row.len();
    let landscape = Landscape::shared(row, 4, 0.3, 1.0);
    let model = OneStep {
        kernel,
        beta,
        tmax: 1e9,
        dt: 1e6,
        track_end: sites - origin,
    };
    simulate(&model, &landscape, &params(4, origin, 42)).unwrap()
}

// --- One step ---

#[test]
fn test_unit_steps_cross_the_track() {
    let kernel = JumpKernel::deterministic(1, 10).unwrap();
    let ensemble = run_one_step(striped(0.3), &kernel, 0.0, 2);

    for traj in &ensemble.trajectories {
        assert_eq!(traj.start, 2);
        assert_eq!(traj.termination, Termination::OutOfRange);
        // 2 -> 18 in unit steps.
        assert_eq!(traj.events(), 16);
        assert_eq!(traj.final_position(), 16);
        assert!(traj.times.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn test_out_of_range_row_is_nan_after_crossing() {
    let kernel = JumpKernel::deterministic(1, 10).unwrap();
    let ensemble = run_one_step(striped(0.3), &kernel, 0.0, 2);

    for row in &ensemble.dense {
        assert_eq!(row.len(), 1000);
        // Sixteen fast jumps all fall inside the first 1e6-wide slot.
        assert_eq!(row[0], 0.0);
        assert!(row[1..].iter().all(|v| v.is_nan()));
    }
}

#[test]
fn test_stall_fires_when_nothing_ahead_is_accessible() {
    let kernel = JumpKernel::deterministic(1, 10).unwrap();
    let mut row = vec![0.0; 20];
    row[0] = 1.0;
    let ensemble = run_one_step(row, &kernel, 1.0, 0);

    for traj in &ensemble.trajectories {
        assert_eq!(traj.termination, Termination::Absorbed);
        assert_eq!(traj.events(), 1);
        assert_eq!(traj.final_position(), 0);
        assert!(traj.final_time() < SENTINEL_TIME);
    }
    // Absorbed rows hold the last displacement to the end of the window.
    assert!(ensemble.dense[0].iter().all(|&v| v == 0.0));
}

#[test]
fn test_zero_propensity_is_blocked() {
    let kernel = JumpKernel::deterministic(1, 10).unwrap();
    let mut row = vec![0.0; 20];
    row[0] = 1.0;
    let ensemble = run_one_step(row, &kernel, 0.0, 0);

    assert_eq!(ensemble.count(Termination::Blocked), ensemble.nt());
    for traj in &ensemble.trajectories {
        assert_eq!(traj.final_time(), SENTINEL_TIME);
        assert_eq!(traj.final_position(), 0);
    }
    assert!(ensemble.dense.iter().flatten().all(|&v| v == 0.0));
}

#[test]
fn test_obstacle_origin_is_folded_into_free_run() {
    let kernel = JumpKernel::deterministic(1, 10).unwrap();
    let landscape = Landscape::shared(striped(0.0), 32, 0.0, 1.0);
    let model = OneStep {
        kernel: &kernel,
        beta: 0.0,
        tmax: 10.0,
        dt: 1.0,
        track_end: 20,
    };
    // Site 6 is an obstacle; the nearest free run behind it is 2..5.
    let ensemble = simulate(&model, &landscape, &params(32, 6, 3)).unwrap();
    for traj in &ensemble.trajectories {
        assert!((2..=4).contains(&traj.start), "start {}", traj.start);
    }
}

#[test]
fn test_missing_free_site_fails() {
    let kernel = JumpKernel::deterministic(1, 10).unwrap();
    let landscape = Landscape::shared(vec![0.0; 20], 2, 0.0, 1.0);
    let model = OneStep {
        kernel: &kernel,
        beta: 0.0,
        tmax: 10.0,
        dt: 1.0,
        track_end: 20,
    };
    assert!(simulate(&model, &landscape, &params(2, 10, 1)).is_err());
}

#[test]
fn test_same_seed_reproduces_ensemble() {
    let kernel = JumpKernel::gamma(4.0, 2.0, 200).unwrap();
    let row: Vec<f64> = (0..200).map(|x| if x % 7 < 3 { 0.1 } else { 1.0 }).collect();
    let landscape = Landscape::shared(row, 16, 0.1, 1.0);
    let model = OneStep {
        kernel: &kernel,
        beta: 0.01,
        tmax: 50.0,
        dt: 1.0,
        track_end: 190,
    };

    let a = simulate(&model, &landscape, &params(16, 10, 99)).unwrap();
    let b = simulate(&model, &landscape, &params(16, 10, 99)).unwrap();
    assert_eq!(a.trajectories, b.trajectories);

    let c = simulate(&model, &landscape, &params(16, 10, 100)).unwrap();
    assert_ne!(a.trajectories, c.trajectories);
}

#[test]
fn test_horizon_rows_are_fully_filled() {
    let kernel = JumpKernel::gamma(3.0, 1.0, 2_000).unwrap();
    let landscape = Landscape::shared(vec![1.0; 2_000], 8, 0.0, 1.0);
    let model = OneStep {
        kernel: &kernel,
        beta: 0.0,
        tmax: 20.0,
        dt: 0.5,
        track_end: 2_000,
    };
    let ensemble = simulate(&model, &landscape, &params(8, 0, 5)).unwrap();

    for (traj, row) in ensemble.trajectories.iter().zip(&ensemble.dense) {
        assert_eq!(traj.termination, Termination::Horizon);
        assert_eq!(row.len(), 40);
        assert!(row.iter().all(|v| v.is_finite()));
        assert!(row.windows(2).all(|w| w[0] <= w[1]));
    }
}

// --- Two step ---

#[test]
fn test_two_step_records_bind_and_rest() {
    let kernel = JumpKernel::deterministic(1, 10).unwrap();
    let landscape = Landscape::shared(vec![1.0; 1_000], 4, 0.0, 1.0);
    let model = TwoStep {
        kernel: &kernel,
        lambda: 0.0,
        k_bind: 1.0,
        k_rest: 1.0,
        tmax: 30.0,
        dt: 1.0,
        track_end: 1_000,
    };
    let ensemble = simulate(&model, &landscape, &params(4, 0, 8)).unwrap();

    for traj in &ensemble.trajectories {
        assert_eq!(traj.termination, Termination::Horizon);
        // Initial sample plus two records per cycle.
        assert_eq!(traj.len() % 2, 1);
        // Every bind lands one site ahead and is kept.
        for pair in traj.positions[1..].chunks_exact(2) {
            assert_eq!(pair[0], pair[1]);
        }
        assert!(traj.positions.windows(2).all(|w| w[0] <= w[1]));
    }
}

#[test]
fn test_two_step_rejected_binds_go_back() {
    let kernel = JumpKernel::deterministic(2, 10).unwrap();
    let landscape = Landscape::shared(vec![0.0; 100], 2, 0.0, 1.0);
    let model = TwoStep {
        kernel: &kernel,
        lambda: 0.0,
        k_bind: 1.0,
        k_rest: 1.0,
        tmax: 20.0,
        dt: 1.0,
        track_end: 100,
    };
    let ensemble = simulate(&model, &landscape, &params(2, 0, 8)).unwrap();

    for traj in &ensemble.trajectories {
        for pair in traj.positions[1..].chunks_exact(2) {
            assert_eq!(pair, &[2, 0]);
        }
        assert_eq!(traj.final_position(), 0);
    }
}

// --- Position walk ---

#[test]
fn test_position_walk_records_first_arrivals() {
    let kernel = JumpKernel::deterministic(1, 10).unwrap();
    let landscape = Landscape::shared(vec![1.0; 40], 3, 0.0, 1.0);
    let model = PositionWalk {
        kernel: &kernel,
        beta: 0.0,
        x_max: 30,
    };
    let ensemble = simulate(&model, &landscape, &params(3, 5, 13)).unwrap();

    for (traj, row) in ensemble.trajectories.iter().zip(&ensemble.dense) {
        assert_eq!(traj.termination, Termination::OutOfRange);
        assert_eq!(row.len(), 31);
        assert!(row[..=5].iter().all(|&t| t == 0.0));
        assert!(row[6..].iter().all(|&t| t > 0.0));
        assert!(row.windows(2).all(|w| w[0] <= w[1]));
    }
}
