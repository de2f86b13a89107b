use super::{enforce_min_run, Landscape, LandscapeMode};
use crate::config::{LandscapeParams, TrackParams};
use crate::error::{LfResult, LoopForgeError};
use tracing::debug;

/// Builds the landscape for `nt` trajectories.
pub fn build(
    params: &LandscapeParams,
    track: &TrackParams,
    nt: usize,
    seed: Option<u64>,
) -> LfResult<Landscape> {
    let mut rng = match seed {
        Some(s) => fastrand::Rng::with_seed(s),
        None => fastrand::Rng::new(),
    };
    build_with_rng(params, track, nt, &mut rng)
}

pub fn build_with_rng(
    params: &LandscapeParams,
    track: &TrackParams,
    nt: usize,
    rng: &mut fastrand::Rng,
) -> LfResult<Landscape> {
    let (ao, af) = (params.alphao, params.alphaf);
    let mode = params.alpha_choice;

    let landscape = match mode {
        LandscapeMode::Periodic => {
            let mut row = periodic_row(params, track.sites())?;
            enforce_min_run(&mut row, ao, af, params.bpmin);
            Landscape::shared(row, nt, ao, af)
        }
        LandscapeMode::OneRandom => {
            let mut row = random_row(params, track.sites(), rng)?;
            enforce_min_run(&mut row, ao, af, params.bpmin);
            Landscape::shared(row, nt, ao, af)
        }
        LandscapeMode::NtRandom => {
            let sites = track.sites();
            let rows = (0..nt)
                .map(|_| {
                    let mut row = random_row(params, sites, rng)?;
                    enforce_min_run(&mut row, ao, af, params.bpmin);
                    Ok(row)
                })
                .collect::<LfResult<Vec<_>>>()?;
            Landscape::from_rows(rows, ao, af)?
        }
        LandscapeMode::ConstantMean => {
            let sites = track.sites();
            check_blocks(params, sites)?;
            let (s, l) = (params.obstacle_size as f64, params.linker_size as f64);
            let value = (ao * s + af * l) / (l + s);
            Landscape::shared(vec![value; sites], nt, ao, af)
        }
        LandscapeMode::Array | LandscapeMode::Laci => {
            let mut row = array_row(params, mode == LandscapeMode::Laci)?;
            enforce_min_run(&mut row, ao, af, params.bpmin);
            with_region(row, params, nt)
        }
        LandscapeMode::ArrayMean => {
            let unit = array_row(params, false)?;
            let mean = unit.iter().sum::<f64>() / unit.len() as f64;
            with_region(vec![mean; unit.len()], params, nt)
        }
        LandscapeMode::ArrayMax => {
            let len = array_row(params, false)?.len();
            with_region(vec![af; len], params, nt)
        }
    };

    debug!(
        "Landscape '{}' built: {} rows x {} sites ({} distinct)",
        mode,
        landscape.rows(),
        landscape.sites(),
        landscape.distinct_rows().len()
    );
    Ok(landscape)
}

fn with_region(row: Vec<f64>, params: &LandscapeParams, nt: usize) -> Landscape {
    let len = row.len();
    let pad = params.array_padding;
    Landscape::shared(row, nt, params.alphao, params.alphaf).with_array_region(pad, len - pad)
}

fn check_blocks(params: &LandscapeParams, sites: usize) -> LfResult<()> {
    let unit = params.obstacle_size + params.linker_size;
    if unit == 0 {
        return Err(LoopForgeError::InvalidConfiguration(
            "obstacle_size + linker_size must be positive".to_string(),
        ));
    }
    if params.obstacle_size > sites {
        return Err(LoopForgeError::InvalidConfiguration(format!(
            "obstacle_size {} exceeds the track length {}",
            params.obstacle_size, sites
        )));
    }
    Ok(())
}

fn push_n(row: &mut Vec<f64>, value: f64, n: usize) {
    row.resize(row.len() + n, value);
}

/// `linker` free sites then `obstacle` blocked sites, repeated; the
/// remainder of the track is free.
pub fn periodic_row(params: &LandscapeParams, sites: usize) -> LfResult<Vec<f64>> {
    check_blocks(params, sites)?;
    let (s, l) = (params.obstacle_size, params.linker_size);
    let repeats = sites / (l + s);

    let mut row = Vec::with_capacity(sites);
    for _ in 0..repeats {
        push_n(&mut row, params.alphaf, l);
        push_n(&mut row, params.alphao, s);
    }
    row.resize(sites, params.alphaf);
    Ok(row)
}

/// Non-overlapping obstacle blocks at uniformly drawn positions.
///
/// `T = sites / (l + s)` starts are drawn in `[0, sites - T*s]`, sorted, and
/// the k-th one shifted right by `k*s` so consecutive blocks cannot overlap.
pub fn random_row(
    params: &LandscapeParams,
    sites: usize,
    rng: &mut fastrand::Rng,
) -> LfResult<Vec<f64>> {
    check_blocks(params, sites)?;
    let s = params.obstacle_size;
    let blocks = sites / (s + params.linker_size);
    let max_pos = sites - blocks * s;

    let mut starts: Vec<usize> = (0..blocks).map(|_| rng.usize(0..=max_pos)).collect();
    starts.sort_unstable();

    let mut row = vec![params.alphaf; sites];
    for (k, p) in starts.into_iter().enumerate() {
        let start = p + k * s;
        row[start..start + s].fill(params.alphao);
    }
    Ok(row)
}

/// Paired Rap1 obstacles separated by `gap` free sites, or by a LacO block
/// when `laci` is set, padded with free DNA on both sides.
pub fn array_row(params: &LandscapeParams, laci: bool) -> LfResult<Vec<f64>> {
    if params.n_domains == 0 {
        return Err(LoopForgeError::InvalidConfiguration(
            "n_domains must be at least 1".to_string(),
        ));
    }
    let (o, f) = (params.alphao, params.alphaf);
    let r = params.rap1_len;

    let pair = |row: &mut Vec<f64>| {
        push_n(row, o, r);
        row.push(f);
        push_n(row, o, r);
    };

    let mut row = Vec::new();
    push_n(&mut row, f, params.array_padding);
    for _ in 0..params.n_domains - 1 {
        pair(&mut row);
        if laci {
            push_n(&mut row, f, 3);
            push_n(&mut row, o, params.laco_len);
            push_n(&mut row, f, 8);
        } else {
            push_n(&mut row, f, params.gap);
        }
    }
    pair(&mut row);
    push_n(&mut row, f, params.array_padding);
    Ok(row)
}
