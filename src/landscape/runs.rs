use super::ALPHA_TOLERANCE;
use std::iter;
use std::ops::Range;

/// Maximal runs of `true` in `mask`.
///
/// The mask is padded with `false` on both sides and every transition is an
/// edge: rising edges open a run, falling edges close it, so edges always
/// come in pairs.
pub fn find_runs(mask: &[bool]) -> Vec<Range<usize>> {
    let padded = iter::once(false)
        .chain(mask.iter().copied())
        .chain(iter::once(false));

    let edges: Vec<usize> = padded
        .clone()
        .zip(padded.skip(1))
        .enumerate()
        .filter(|(_, (prev, next))| prev != next)
        .map(|(i, _)| i)
        .collect();

    edges.chunks_exact(2).map(|e| e[0]..e[1]).collect()
}

/// Runs of sites whose value matches `value`.
pub fn runs_of_value(row: &[f64], value: f64) -> Vec<Range<usize>> {
    let mask: Vec<bool> = row
        .iter()
        .map(|v| (v - value).abs() <= ALPHA_TOLERANCE)
        .collect();
    find_runs(&mask)
}

/// Turns every free run shorter than `min_run` into obstacle.
/// Returns the number of sites converted.
pub fn enforce_min_run(row: &mut [f64], alphao: f64, alphaf: f64, min_run: usize) -> usize {
    if min_run <= 1 {
        return 0;
    }
    let mut converted = 0;
    for run in runs_of_value(row, alphaf) {
        if run.len() < min_run {
            converted += run.len();
            row[run].fill(alphao);
        }
    }
    converted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_runs_edges() {
        assert!(find_runs(&[]).is_empty());
        assert!(find_runs(&[false, false]).is_empty());
        assert_eq!(find_runs(&[true]), vec![0..1]);
        assert_eq!(
            find_runs(&[true, true, false, true, false, false, true]),
            vec![0..2, 3..4, 6..7]
        );
    }

    #[test]
    fn test_min_run_of_one_is_noop() {
        let mut row = vec![1.0, 0.0, 1.0];
        assert_eq!(enforce_min_run(&mut row, 0.0, 1.0, 1), 0);
        assert_eq!(row, vec![1.0, 0.0, 1.0]);
    }
}
