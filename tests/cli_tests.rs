use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct TestContext {
    dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    fn out(&self) -> PathBuf {
        self.dir.path().join("outputs")
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_loopforge"))
            .args(args)
            .output()
            .expect("Failed to execute binary")
    }
}

/// A small chromatin combination that finishes in well under a second.
const SMALL_RUN: &[&str] = &[
    "--alpha-choice",
    "periodic",
    "--lmax",
    "2000",
    "--origin",
    "500",
    "--alphao",
    "0.1",
    "--mu",
    "20",
    "--theta",
    "5",
    "--tmax",
    "30",
    "--nt",
    "8",
    "--seed",
    "11",
    "--n-boot",
    "10",
    "--boot-batch",
    "5",
    "--waiting-last-bin",
    "100",
    "--speed-last-bin",
    "100",
    "--linker-view-size",
    "100",
    "--linker-view-threshold",
    "100",
];

fn single_result(dir: &Path) -> PathBuf {
    let entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(entries.len(), 1, "expected one run directory in {:?}", dir);
    entries[0].join("results.json")
}

#[test]
fn test_cli_lists_grids() {
    let ctx = TestContext::new();
    let output = ctx.run(&["grids"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let row = Regex::new(r"\|\s*nu\s*\|\s*ncl_nu\s*\|\s*chromatin\s*\|\s*30300\s*\|").unwrap();
    assert!(row.is_match(&stdout), "grid table:\n{}", stdout);
    let array = Regex::new(r"\|\s*array_data\s*\|\s*mrc_data\s*\|\s*array\s*\|\s*70000\s*\|").unwrap();
    assert!(array.is_match(&stdout), "grid table:\n{}", stdout);
}

#[test]
fn test_cli_run_writes_record() {
    let ctx = TestContext::new();
    let out = ctx.out();
    let mut args = vec!["run", "--output-dir", out.to_str().unwrap()];
    args.extend_from_slice(SMALL_RUN);

    let output = ctx.run(&args);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}\nstdout: {}", stderr, stdout);

    let title = Regex::new(r"alphachoice=periodic_s=150_l=10_bpmin=0_mu=20_theta=5_.*_nt=8").unwrap();
    assert!(title.is_match(&stdout), "stdout: {}", stdout);
    assert!(stdout.contains("Mean velocity"));

    let json = std::fs::read_to_string(single_result(&out)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["mu"], 20.0);
    assert_eq!(value["nt"], 8);
}

#[test]
fn test_cli_config_file_replaces_flags() {
    let ctx = TestContext::new();
    let out = ctx.out();
    let config = ctx.dir.path().join("params.json");
    std::fs::write(
        &config,
        r#"{
            "track": { "lmax": 1500, "origin": 200 },
            "landscape": { "alpha_choice": "constantmean", "alphao": 0.3 },
            "jump": { "mu": 12.0, "theta": 3.0 },
            "time": { "tmax": 20.0 },
            "run": { "nt": 4, "seed": 2, "saving": "map" },
            "analysis": { "n_boot": 10, "boot_batch": 5 }
        }"#,
    )
    .unwrap();

    let output = ctx.run(&[
        "run",
        "--config-file",
        config.to_str().unwrap(),
        "--output-dir",
        out.to_str().unwrap(),
        "--mu",
        "999",
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json = std::fs::read_to_string(single_result(&out)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["mu"], 12.0);
    assert_eq!(value["alpha_choice"], "constantmean");
    assert!(value.get("results").is_none());
}

#[test]
fn test_cli_invalid_parameters_exit_with_error() {
    let ctx = TestContext::new();
    let out = ctx.out();
    let mut args = vec!["run", "--output-dir", out.to_str().unwrap()];
    args.extend_from_slice(SMALL_RUN);
    args.extend_from_slice(&["--beta", "1.5"]);

    let output = ctx.run(&args);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    assert!(!out.exists());
}

#[test]
fn test_cli_unknown_landscape_is_rejected_by_parser() {
    let ctx = TestContext::new();
    let output = ctx.run(&["run", "--alpha-choice", "spiral"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("spiral"), "stderr: {}", stderr);
}
