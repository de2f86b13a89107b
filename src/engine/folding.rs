use crate::error::{LfResult, LoopForgeError};
use crate::landscape::Landscape;

/// Resolves the nominal origin into the first site of a trajectory.
///
/// Free and intermediate sites are kept as is. On an obstacle, the search
/// walks back at most `radius` sites to the nearest free site, then to the
/// start of that free run, and draws the start uniformly inside the run.
pub fn fold_origin(
    row: &[f64],
    landscape: &Landscape,
    origin: usize,
    radius: usize,
    rng: &mut fastrand::Rng,
) -> LfResult<usize> {
    if origin == 0 {
        return Ok(0);
    }
    if origin >= row.len() {
        return Err(LoopForgeError::InvalidConfiguration(format!(
            "origin {} lies outside a landscape of {} sites",
            origin,
            row.len()
        )));
    }
    if !landscape.is_obstacle(row[origin]) {
        return Ok(origin);
    }

    let lowest = origin.saturating_sub(radius);
    let nearest = (lowest..origin)
        .rev()
        .find(|&x| landscape.is_free(row[x]))
        .ok_or(LoopForgeError::NoAccessibleOrigin { origin, radius })?;

    let run_start = (0..nearest)
        .rev()
        .find(|&x| !landscape.is_free(row[x]))
        .map_or(0, |x| x + 1);

    Ok(rng.usize(run_start..=nearest))
}
