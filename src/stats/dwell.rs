use super::distribution::{distribution, Distribution};
use super::fit::{fit_exp_decay, FitError};
use crate::engine::Trajectory;
use crate::output::{RecordFields, ResultRecord};
use tracing::warn;

/// Inter-event durations split by the position-equality pattern around
/// them. An interval is forward when either of its neighbouring pairs of
/// samples holds the same position; even intervals are bind attempts and odd
/// ones are rests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JumpTimes {
    pub forward_bind: Vec<f64>,
    pub forward_rest: Vec<f64>,
    pub reverse_bind: Vec<f64>,
    pub reverse_rest: Vec<f64>,
}

pub fn find_jumps(trajectories: &[Trajectory]) -> JumpTimes {
    let mut out = JumpTimes::default();
    for traj in trajectories {
        let x = &traj.positions;
        let t = &traj.times;
        let m = x.len().min(t.len());
        let same = |k: usize| k + 1 < m && x[k] == x[k + 1];

        for j in 0..m.saturating_sub(1) {
            let duration = t[j + 1] - t[j];
            if !duration.is_finite() || duration == 0.0 {
                continue;
            }
            let forward = same(j) || same(j + 1);
            let bucket = match (forward, j % 2 == 0) {
                (true, true) => &mut out.forward_bind,
                (true, false) => &mut out.forward_rest,
                (false, true) => &mut out.reverse_bind,
                (false, false) => &mut out.reverse_rest,
            };
            bucket.push(duration);
        }
    }
    out
}

/// Periods between consecutive samples that repeat the previous position,
/// counted from `t = 0`.
pub fn forward_times(trajectories: &[Trajectory]) -> Vec<f64> {
    let mut out = Vec::new();
    for traj in trajectories {
        let marks = std::iter::once(0.0).chain(
            (1..traj.positions.len())
                .filter(|&j| traj.positions[j] == traj.positions[j - 1])
                .map(|j| traj.times[j])
                .filter(|&t| t != 0.0 && t.is_finite()),
        );
        let marks: Vec<f64> = marks.collect();
        out.extend(
            marks
                .windows(2)
                .map(|w| w[1] - w[0])
                .filter(|&d| d > 0.0),
        );
    }
    out
}

/// Dwell measured on bind samples: time since the last bind sample whose
/// position changed.
pub fn reverse_dwells(trajectories: &[Trajectory]) -> Vec<f64> {
    let mut out = Vec::new();
    for traj in trajectories {
        let mut anchor = 0.0;
        for j in (0..traj.positions.len()).step_by(2) {
            let repeated = j > 0 && traj.positions[j] == traj.positions[j - 1];
            if repeated {
                out.push(traj.times[j] - anchor);
            } else {
                anchor = traj.times[j];
            }
        }
    }
    out
}

/// Fitted `y0 * exp(-t / tau)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Decay {
    pub y0: Option<f64>,
    pub tau: Option<f64>,
}

impl Decay {
    fn from_fit(name: &str, fit: Result<(f64, f64), FitError>) -> Self {
        match fit {
            Ok((y0, tau)) if y0.is_finite() && tau.is_finite() => Self {
                y0: Some(y0),
                tau: Some(tau),
            },
            Ok(_) => {
                warn!("⚠️  Decay fit for {} produced non-finite parameters", name);
                Self::default()
            }
            Err(e) => {
                warn!("⚠️  Decay fit for {} failed: {}", name, e);
                Self::default()
            }
        }
    }
}

/// Fits the tail of `dist` from its peak up to `xmax`.
pub fn fit_tail(name: &str, dist: &Distribution, xmax: f64, tau0: f64) -> Decay {
    let Some(peak) = dist.most_probable() else {
        return Decay::default();
    };
    let (t, y): (Vec<f64>, Vec<f64>) = dist
        .points
        .iter()
        .zip(&dist.probs)
        .filter(|&(&x, _)| x >= peak && x <= xmax)
        .map(|(&x, &p)| (x, p))
        .unzip();
    let Some(&y_first) = y.first() else {
        return Decay::default();
    };
    Decay::from_fit(name, fit_exp_decay(&t, &y, (y_first, tau0)))
}

fn fit_whole(name: &str, dist: &Distribution) -> Decay {
    match dist.probs.first() {
        Some(&y_first) if dist.probs.iter().any(|&p| p > 0.0) => {
            Decay::from_fit(name, fit_exp_decay(&dist.points, &dist.probs, (y_first, 1.0)))
        }
        _ => Decay::default(),
    }
}

/// Bin layout and fit window for the dwell families.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DwellBins {
    pub last: f64,
    pub width: f64,
    pub fit_xmax: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DwellTimes {
    pub fb: Distribution,
    pub fr: Distribution,
    pub rb: Distribution,
    pub rr: Distribution,
    pub fb_fit: Decay,
    pub fr_fit: Decay,
    pub rb_fit: Decay,
    pub rr_fit: Decay,
    pub forwards: Distribution,
    pub reverses: Distribution,
    pub forwards_fit: Decay,
    pub reverses_fit: Decay,
}

impl DwellTimes {
    pub fn compute(trajectories: &[Trajectory], bins: DwellBins) -> Self {
        let dist = |data: Vec<f64>| distribution(data, 0.0, bins.last, bins.width);
        let jumps = find_jumps(trajectories);

        let fb = dist(jumps.forward_bind);
        let fr = dist(jumps.forward_rest);
        let rb = dist(jumps.reverse_bind);
        let rr = dist(jumps.reverse_rest);
        let forwards = dist(forward_times(trajectories));
        let reverses = dist(reverse_dwells(trajectories));

        Self {
            fb_fit: fit_whole("forward bind", &fb),
            fr_fit: fit_whole("forward rest", &fr),
            rb_fit: fit_whole("reverse bind", &rb),
            rr_fit: fit_whole("reverse rest", &rr),
            forwards_fit: fit_tail("forwards", &forwards, bins.fit_xmax, 10.0),
            reverses_fit: fit_tail("reverses", &reverses, bins.fit_xmax, 10.0),
            fb,
            fr,
            rb,
            rr,
            forwards,
            reverses,
        }
    }

    /// Rates implied by the fitted decays, `(k_bind, k_rest)`.
    pub fn fitted_rates(&self) -> Option<(f64, f64)> {
        let bind = (self.fb_fit.tau? + self.rb_fit.tau?) / 2.0;
        let rest = (self.fr_fit.tau? + self.rr_fit.tau?) / 2.0;
        Some((1.0 / bind, 1.0 / rest))
    }
}

impl RecordFields for DwellTimes {
    fn write_fields(&self, record: &mut ResultRecord) {
        for (key, dist, fit) in [
            ("fb", &self.fb, &self.fb_fit),
            ("fr", &self.fr, &self.fr_fit),
            ("rb", &self.rb, &self.rb_fit),
            ("rr", &self.rr, &self.rr_fit),
            ("forwards", &self.forwards, &self.forwards_fit),
            ("reverses", &self.reverses, &self.reverses_fit),
        ] {
            record.vector(&format!("{key}_points"), &dist.points);
            record.vector(&format!("{key}_distrib"), &dist.probs);
            record.optional(&format!("tau_{key}"), fit.tau);
            record.optional(&format!("y0_{key}"), fit.y0);
        }
    }
}

/// Inputs of the mean-field speed estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedInputs {
    pub alphao: f64,
    pub alphaf: f64,
    pub s: f64,
    pub l: f64,
    pub mu: f64,
    pub lambda: f64,
}

/// Mean landing probability over jump cycle duration times mean jump.
pub fn theoretical_speed(inputs: &SpeedInputs, k_bind: f64, k_rest: f64) -> f64 {
    let landing = (inputs.s * inputs.alphao + inputs.l * inputs.alphaf) / (inputs.l + inputs.s)
        * (1.0 - inputs.lambda);
    let cycle = 1.0 / k_bind + 1.0 / k_rest;
    landing / cycle * inputs.mu
}
