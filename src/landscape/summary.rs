use super::runs::runs_of_value;
use super::{Landscape, LandscapeMode};
use crate::config::AnalysisParams;
use crate::output::{RecordFields, ResultRecord};
use crate::stats::distribution::{distribution, Distribution};
use tracing::warn;

/// What the motor sees before it moves: mean profile, block statistics and
/// the average neighbourhood of a linker.
#[derive(Debug, Clone, PartialEq)]
pub struct LandscapeSummary {
    pub alpha_mean: Vec<f64>,
    pub obstacles: Distribution,
    pub linkers: Distribution,
    pub linker_view: Vec<f64>,
}

pub fn summarize(
    landscape: &Landscape,
    mode: LandscapeMode,
    analysis: &AnalysisParams,
) -> LandscapeSummary {
    let step = analysis.run_length_step;
    let (obstacles, linkers) = match landscape.distinct_rows().first() {
        Some(row) => (
            run_length_distribution(row, landscape.alphao, step),
            run_length_distribution(row, landscape.alphaf, step),
        ),
        None => (Distribution::default(), Distribution::default()),
    };

    LandscapeSummary {
        alpha_mean: landscape.mean_profile(),
        obstacles,
        linkers,
        linker_view: linker_view(
            landscape,
            mode,
            analysis.linker_view_size,
            analysis.linker_view_threshold,
        ),
    }
}

/// Distribution of the lengths of runs equal to `value`, in bins of `step`.
pub fn run_length_distribution(row: &[f64], value: f64, step: usize) -> Distribution {
    let lengths: Vec<f64> = runs_of_value(row, value)
        .into_iter()
        .map(|r| r.len() as f64)
        .collect();
    let Some(longest) = lengths.iter().copied().reduce(f64::max) else {
        return Distribution::default();
    };
    let step = step as f64;
    distribution(lengths, 0.0, longest + step, step)
}

/// Mean window of `view_size` sites starting at every linker that lies at
/// least `threshold` sites away from both track ends.
pub fn linker_view(
    landscape: &Landscape,
    mode: LandscapeMode,
    view_size: usize,
    threshold: usize,
) -> Vec<f64> {
    let sites = landscape.sites();
    let rows = landscape.distinct_rows();
    let Some(first) = rows.first() else {
        return Vec::new();
    };

    if mode.is_flat() {
        let start = threshold.min(sites);
        let end = (threshold + view_size).min(sites);
        return first[start..end].to_vec();
    }

    let Some(upper) = sites.checked_sub(threshold + view_size) else {
        warn!(
            "⚠️  Linker view skipped: window {} + margin {} exceeds {} sites",
            view_size, threshold, sites
        );
        return Vec::new();
    };
    if view_size == 0 || threshold > upper {
        return Vec::new();
    }

    let mut acc = vec![0.0; view_size];
    let mut counted = 0usize;
    for row in rows {
        let starts: Vec<usize> = runs_of_value(row, landscape.alphaf)
            .into_iter()
            .map(|r| r.start)
            .filter(|&s| s >= threshold && s <= upper)
            .collect();
        if starts.is_empty() {
            continue;
        }
        let n = starts.len() as f64;
        for s in starts {
            for (a, v) in acc.iter_mut().zip(&row[s..s + view_size]) {
                *a += v / n;
            }
        }
        counted += 1;
    }

    if counted == 0 {
        return Vec::new();
    }
    acc.iter_mut().for_each(|a| *a /= counted as f64);
    acc
}

impl RecordFields for LandscapeSummary {
    fn write_fields(&self, record: &mut ResultRecord) {
        record.vector("alpha_mean", &self.alpha_mean);
        record.vector("obs_points", &self.obstacles.points);
        record.vector("obs_distrib", &self.obstacles.probs);
        record.vector("link_points", &self.linkers.points);
        record.vector("link_distrib", &self.linkers.probs);
        record.vector("link_view", &self.linker_view);
    }
}
