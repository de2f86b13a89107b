use loopforge::config::Config;
use loopforge::engine::Algorithm;
use loopforge::error::LoopForgeError;
use loopforge::landscape::LandscapeMode;
use rstest::rstest;
use std::fs;

fn base() -> Config {
    Config::default()
}

#[test]
fn test_default_config_is_valid() {
    base().validate().unwrap();
    assert_eq!(base().track.sites(), 50_000);
}

#[rstest]
#[case::alphao_above_one(|c: &mut Config| c.landscape.alphao = 2.0, "alphao")]
#[case::negative_beta(|c: &mut Config| c.kinetics.beta = -0.1, "beta")]
#[case::lambda_above_one(|c: &mut Config| c.kinetics.lambda = 1.5, "lambda")]
#[case::zero_mu(|c: &mut Config| c.jump.mu = 0.0, "mu")]
#[case::nan_theta(|c: &mut Config| c.jump.theta = f64::NAN, "theta")]
#[case::zero_dt(|c: &mut Config| c.time.dt = 0.0, "dt")]
#[case::zero_nt(|c: &mut Config| c.run.nt = 0, "nt")]
#[case::origin_off_track(|c: &mut Config| c.track.origin = 50_000, "origin")]
#[case::inverted_track(|c: &mut Config| c.track.lmax = 0, "lmax")]
#[case::track_end_behind_origin(|c: &mut Config| c.track.track_end = Some(5_000), "track_end")]
#[case::oversized_obstacle(|c: &mut Config| c.landscape.obstacle_size = 60_000, "obstacle_size")]
#[case::zero_rest_rate(|c: &mut Config| c.kinetics.k_rest = 0.0, "k_rest")]
#[case::zero_fpt_bin(|c: &mut Config| c.analysis.fpt_bin = 0, "FPT")]
fn test_invalid_parameters_are_rejected(#[case] tweak: fn(&mut Config), #[case] needle: &str) {
    let mut config = base();
    tweak(&mut config);
    match config.validate() {
        Err(LoopForgeError::InvalidConfiguration(msg)) => {
            assert!(msg.contains(needle), "'{}' does not mention {}", msg, needle)
        }
        other => panic!("expected an invalid configuration, got {:?}", other),
    }
}

#[test]
fn test_one_step_ignores_two_step_rates() {
    let mut config = base();
    config.kinetics.algorithm = Algorithm::OneStep;
    config.kinetics.k_bind = 0.0;
    config.validate().unwrap();
}

#[test]
fn test_position_algorithm_needs_array() {
    let mut config = base();
    config.kinetics.algorithm = Algorithm::Position;
    assert!(config.validate().is_err());

    config.landscape.alpha_choice = LandscapeMode::Array;
    config.track.origin = 0;
    config.validate().unwrap();
}

#[test]
fn test_array_ignores_chromatin_track() {
    let mut config = base();
    config.landscape.alpha_choice = LandscapeMode::Laci;
    config.track.lmax = 0;
    config.validate().unwrap();
}

#[test]
fn test_partial_file_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("params.json");
    fs::write(
        &path,
        r#"{
            "landscape": { "alpha_choice": "ntrandom", "alphao": 0.3 },
            "kinetics": { "algorithm": "one_step", "beta": 0.01 },
            "run": { "nt": 25, "seed": 7 }
        }"#,
    )
    .unwrap();

    let config = Config::load_from_file(&path).unwrap();
    assert_eq!(config.landscape.alpha_choice, LandscapeMode::NtRandom);
    assert_eq!(config.landscape.alphao, 0.3);
    assert_eq!(config.kinetics.algorithm, Algorithm::OneStep);
    assert_eq!(config.run.nt, 25);
    assert_eq!(config.run.seed, Some(7));
    // Untouched sections fall back to their defaults.
    assert_eq!(config.jump, base().jump);
    assert_eq!(config.landscape.obstacle_size, 150);
    config.validate().unwrap();
}

#[test]
fn test_saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.json");
    let mut config = base();
    config.landscape.alpha_choice = LandscapeMode::Array;
    config.kinetics.algorithm = Algorithm::Position;
    config.track.track_end = Some(20_000);
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    assert_eq!(Config::load_from_file(&path).unwrap(), config);
}

#[test]
fn test_malformed_file_is_a_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        Config::load_from_file(&path),
        Err(LoopForgeError::Json(_))
    ));
    assert!(matches!(
        Config::load_from_file(dir.path().join("missing.json")),
        Err(LoopForgeError::Io(_))
    ));
}
