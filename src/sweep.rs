use crate::api;
use crate::config::Config;
use crate::error::{LfResult, LoopForgeError};
use crate::output::write_record;
use rayon::prelude::*;
use serde::Serialize;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::Instant;
use strum_macros::Display;
use tracing::{error, info};

pub const SUMMARY_FILE: &str = "summary.csv";

#[derive(Debug, Clone, PartialEq)]
pub struct SweepOptions {
    pub workers: usize,
    pub task_id: usize,
    pub num_tasks: usize,
    pub output_dir: PathBuf,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            task_id: 0,
            num_tasks: 1,
            output_dir: PathBuf::from("outputs"),
        }
    }
}

/// Contiguous share of `len` items for one task. The last task also takes
/// the remainder.
pub fn slice_for_task(len: usize, task_id: usize, num_tasks: usize) -> Range<usize> {
    let num_tasks = num_tasks.max(1);
    let chunk = len / num_tasks;
    let start = (task_id * chunk).min(len);
    let end = if task_id + 1 >= num_tasks {
        len
    } else {
        (start + chunk).min(len)
    };
    start..end
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinationOutcome {
    #[serde(skip)]
    pub index: usize,
    pub title: String,
    pub status: Status,
    pub file: Option<PathBuf>,
    pub v_mean: Option<f64>,
    pub error: Option<String>,
}

/// Receives each finished combination on the collecting thread.
/// Returning `false` stops scheduling new combinations.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, done: usize, total: usize, outcome: &CombinationOutcome) -> bool;
}

/// Callback that never interrupts.
pub struct Silent;

impl ProgressCallback for Silent {
    fn on_progress(&self, _: usize, _: usize, _: &CombinationOutcome) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
pub struct SweepReport {
    pub task_dir: PathBuf,
    pub summary: PathBuf,
    pub outcomes: Vec<CombinationOutcome>,
    pub elapsed_secs: f64,
}

impl SweepReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status == Status::Ok).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

fn run_one(index: usize, config: &Config, task_dir: &Path) -> CombinationOutcome {
    let title = api::run_title(config);
    let result = api::run_combination(config).and_then(|record| {
        let v_mean = record.scalar("v_mean").or_else(|| record.scalar("v_marcand"));
        let file = write_record(&task_dir.join(&title), &record)?;
        Ok((file, v_mean))
    });
    match result {
        Ok((file, v_mean)) => CombinationOutcome {
            index,
            title,
            status: Status::Ok,
            file: Some(file),
            v_mean,
            error: None,
        },
        Err(e) => {
            error!("❌ Combination '{}' failed: {}", title, e);
            CombinationOutcome {
                index,
                title,
                status: Status::Failed,
                file: None,
                v_mean: None,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Runs this task's share of `configs` on a dedicated pool of
/// `options.workers` threads and writes one record per combination under
/// `<output_dir>/<grid_dir>_<task_id>/`.
///
/// Workers send outcomes over a channel; the calling thread collects them,
/// reports progress and writes `summary.csv` at the end. A failing
/// combination is logged and recorded, never fatal.
pub fn run_sweep<CB: ProgressCallback>(
    grid_dir: &str,
    configs: &[Config],
    options: &SweepOptions,
    callback: CB,
) -> LfResult<SweepReport> {
    if options.num_tasks == 0 || options.task_id >= options.num_tasks {
        return Err(LoopForgeError::InvalidConfiguration(format!(
            "task id {} is outside 0..{}",
            options.task_id, options.num_tasks
        )));
    }
    if options.workers == 0 {
        return Err(LoopForgeError::InvalidConfiguration(
            "at least one worker is required".to_string(),
        ));
    }

    let range = slice_for_task(configs.len(), options.task_id, options.num_tasks);
    let offset = range.start;
    let share = &configs[range];
    let total = share.len();
    let task_dir = options
        .output_dir
        .join(format!("{}_{}", grid_dir, options.task_id));
    std::fs::create_dir_all(&task_dir)?;

    info!(
        "🚀 Task {}/{}: {} of {} combinations into {}",
        options.task_id,
        options.num_tasks,
        total,
        configs.len(),
        task_dir.display()
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .build()
        .map_err(|e| LoopForgeError::InvalidConfiguration(e.to_string()))?;

    let start = Instant::now();
    let stop = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel::<CombinationOutcome>();
    let mut outcomes = Vec::with_capacity(total);

    std::thread::scope(|scope| {
        let stop = &stop;
        let pool = &pool;
        let task_dir = &task_dir;
        scope.spawn(move || {
            pool.install(|| {
                share
                    .par_iter()
                    .enumerate()
                    .for_each_with(tx, |tx, (i, config)| {
                        if stop.load(Ordering::Relaxed) {
                            return;
                        }
                        // The receiver only goes away once collection is over.
                        let _ = tx.send(run_one(offset + i, config, task_dir));
                    });
            });
        });

        for outcome in rx {
            let keep_going = callback.on_progress(outcomes.len() + 1, total, &outcome);
            outcomes.push(outcome);
            if !keep_going {
                stop.store(true, Ordering::Relaxed);
            }
        }
    });

    outcomes.sort_by_key(|o| o.index);
    let summary = task_dir.join(SUMMARY_FILE);
    let mut writer = csv::Writer::from_path(&summary)?;
    for outcome in &outcomes {
        writer.serialize(outcome)?;
    }
    writer.flush()?;

    let report = SweepReport {
        task_dir,
        summary,
        outcomes,
        elapsed_secs: start.elapsed().as_secs_f64(),
    };
    info!(
        "✅ Task {} finished: {} ok, {} failed in {:.1}s",
        options.task_id,
        report.succeeded(),
        report.failed(),
        report.elapsed_secs
    );
    Ok(report)
}
