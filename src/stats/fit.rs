use crate::output::{RecordFields, ResultRecord};
use nalgebra::{Matrix2, Vector2};
use std::ops::Range;
use thiserror::Error;

const LM_MAX_ITER: usize = 600;
const LM_TOLERANCE: f64 = 1e-10;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("Need at least {needed} points, got {got}")]
    InsufficientData { needed: usize, got: usize },
    #[error("Normal equations are singular")]
    Singular,
    #[error("No convergence after {0} iterations")]
    NotConverged(usize),
}

/// Least-squares slope of `values[k]` against `k * step` over `range`,
/// constrained through the origin. NaN entries are skipped.
pub fn linear_fit_through_origin(values: &[f64], step: f64, range: Range<usize>) -> Option<f64> {
    let end = range.end.min(values.len());
    let (mut sxy, mut sxx, mut n) = (0.0, 0.0, 0usize);
    for k in range.start.min(end)..end {
        let y = values[k];
        if !y.is_finite() {
            continue;
        }
        let x = k as f64 * step;
        sxy += x * y;
        sxx += x * x;
        n += 1;
    }
    (n >= 2 && sxx > 0.0).then(|| sxy / sxx)
}

/// Ordinary least squares with the usual summary statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
    /// Standard error of the slope.
    pub stderr: f64,
}

pub fn linregress(x: &[f64], y: &[f64]) -> Result<Regression, FitError> {
    let n = x.len().min(y.len());
    if n < 3 {
        return Err(FitError::InsufficientData { needed: 3, got: n });
    }
    let nf = n as f64;
    let xm = x[..n].iter().sum::<f64>() / nf;
    let ym = y[..n].iter().sum::<f64>() / nf;

    let (mut ssxm, mut ssym, mut ssxym) = (0.0, 0.0, 0.0);
    for (xi, yi) in x[..n].iter().zip(&y[..n]) {
        ssxm += (xi - xm).powi(2);
        ssym += (yi - ym).powi(2);
        ssxym += (xi - xm) * (yi - ym);
    }
    if ssxm == 0.0 {
        return Err(FitError::Singular);
    }

    let r = if ssym == 0.0 {
        0.0
    } else {
        (ssxym / (ssxm * ssym).sqrt()).clamp(-1.0, 1.0)
    };
    let slope = ssxym / ssxm;
    let stderr = ((1.0 - r * r) * ssym / ssxm / (nf - 2.0)).max(0.0).sqrt();
    Ok(Regression {
        slope,
        intercept: ym - slope * xm,
        r,
        stderr,
    })
}

/// Fits `y = y0 * exp(-t / tau)` with Levenberg-Marquardt, starting from `p0`.
/// Returns `(y0, tau)`.
pub fn fit_exp_decay(t: &[f64], y: &[f64], p0: (f64, f64)) -> Result<(f64, f64), FitError> {
    let n = t.len().min(y.len());
    if n < 2 {
        return Err(FitError::InsufficientData { needed: 2, got: n });
    }
    let (t, y) = (&t[..n], &y[..n]);

    let cost = |p: &Vector2<f64>| -> f64 {
        t.iter()
            .zip(y)
            .map(|(ti, yi)| (yi - p[0] * (-ti / p[1]).exp()).powi(2))
            .sum()
    };

    let mut p = Vector2::new(p0.0, p0.1);
    let mut current = cost(&p);
    let mut damping = 1e-3;

    for _ in 0..LM_MAX_ITER {
        let mut jtj = Matrix2::zeros();
        let mut jtr = Vector2::zeros();
        for (ti, yi) in t.iter().zip(y) {
            let e = (-ti / p[1]).exp();
            let jac = Vector2::new(e, p[0] * e * ti / (p[1] * p[1]));
            jtj += jac * jac.transpose();
            jtr += jac * (yi - p[0] * e);
        }
        if !jtj.iter().all(|v| v.is_finite()) {
            return Err(FitError::Singular);
        }

        let mut scaled = jtj;
        for k in 0..2 {
            scaled[(k, k)] += damping * jtj[(k, k)].max(1e-12);
        }
        let Some(step) = scaled.lu().solve(&jtr) else {
            return Err(FitError::Singular);
        };

        let candidate = p + step;
        let next = if candidate[1] > 0.0 {
            cost(&candidate)
        } else {
            f64::INFINITY
        };

        if next.is_finite() && next <= current {
            let small_step = step.norm() <= LM_TOLERANCE * (p.norm() + LM_TOLERANCE);
            let small_gain = current - next <= LM_TOLERANCE * current.max(f64::MIN_POSITIVE);
            p = candidate;
            current = next;
            damping = (damping / 10.0).max(1e-12);
            if small_step || small_gain {
                return Ok((p[0], p[1]));
            }
        } else {
            damping *= 10.0;
            if damping > 1e16 {
                // No direction lowers the cost any more.
                return Ok((p[0], p[1]));
            }
        }
    }
    Err(FitError::NotConverged(LM_MAX_ITER))
}

/// Early and late regimes of a mean displacement curve: a plateau of
/// `x / t` at short times and a power law `x ~ Cf * t^wf` at long times.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TwoRegimeFit {
    pub bound_low: usize,
    pub bound_high: usize,
    /// `x / t` after the first sample.
    pub xt_over_t: Vec<f64>,
    /// Local log-log slope `d ln x / d ln t`.
    pub g: Vec<f64>,
    pub vf: Option<f64>,
    pub vf_std: Option<f64>,
    pub cf: Option<f64>,
    pub cf_std: Option<f64>,
    pub wf: Option<f64>,
    pub wf_std: Option<f64>,
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// `times` and `positions` are aligned; the first sample (t = 0) is dropped.
pub fn two_regime_fit(
    times: &[f64],
    positions: &[f64],
    bound_low: usize,
    bound_high: usize,
) -> TwoRegimeFit {
    let points: Vec<(f64, f64)> = times
        .iter()
        .zip(positions)
        .map(|(&t, &x)| (t, x))
        .filter(|(t, x)| t.is_finite() && x.is_finite())
        .collect();
    let mut fit = TwoRegimeFit {
        bound_low,
        bound_high,
        ..Default::default()
    };
    if points.len() < bound_high.max(bound_low + 2) || bound_low == 0 {
        return fit;
    }
    let points = &points[1..];

    fit.xt_over_t = points.iter().map(|(t, x)| x / t).collect();
    fit.g = points
        .windows(2)
        .map(|w| (w[1].1.ln() - w[0].1.ln()) / (w[1].0.ln() - w[0].0.ln()))
        .collect();

    let early = &fit.xt_over_t[..bound_low];
    fit.vf = super::distribution::mean(early).map(round3);
    fit.vf_std = super::distribution::std_dev(early).map(round3);

    if points.len() <= bound_high + 1 {
        return fit;
    }

    let late = &points[bound_high..];
    let log_t: Vec<f64> = late.iter().map(|(t, _)| t.ln()).collect();
    let log_x: Vec<f64> = late.iter().map(|(_, x)| x.max(1e-10).ln()).collect();
    if let Ok(reg) = linregress(&log_t, &log_x) {
        let cf = reg.intercept.exp();
        let spread = (log_t.iter().map(|v| v * v).sum::<f64>() / log_t.len() as f64).sqrt();
        fit.cf = Some(round3(cf));
        fit.cf_std = Some(round3(cf * reg.stderr * spread));
        fit.wf = Some(round3(reg.slope));
        fit.wf_std = Some(round3(reg.stderr));
    }
    fit
}

impl RecordFields for TwoRegimeFit {
    fn write_fields(&self, record: &mut ResultRecord) {
        record.optional("vf", self.vf);
        record.optional("vf_std", self.vf_std);
        record.optional("Cf", self.cf);
        record.optional("Cf_std", self.cf_std);
        record.optional("wf", self.wf);
        record.optional("wf_std", self.wf_std);
        record.vector("xt_over_t", &self.xt_over_t);
        record.vector("G", &self.g);
        record.int("bound_low", self.bound_low as i64);
        record.int("bound_high", self.bound_high as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_through_origin_skips_nan() {
        let values = [0.0, 2.0, f64::NAN, 6.0, 8.0];
        let slope = linear_fit_through_origin(&values, 1.0, 0..5).unwrap();
        assert!((slope - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_fit_through_origin_needs_two_points() {
        assert_eq!(linear_fit_through_origin(&[1.0], 1.0, 0..1), None);
    }

    #[test]
    fn test_linregress_exact_line() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [3.0, 5.0, 7.0, 9.0];
        let reg = linregress(&x, &y).unwrap();
        assert!((reg.slope - 2.0).abs() < 1e-12);
        assert!((reg.intercept - 1.0).abs() < 1e-12);
        assert!((reg.r - 1.0).abs() < 1e-12);
        assert!(reg.stderr.abs() < 1e-9);
    }

    #[test]
    fn test_exp_decay_recovers_parameters() {
        let t: Vec<f64> = (0..60).map(|k| k as f64 * 0.5).collect();
        let y: Vec<f64> = t.iter().map(|t| 0.4 * (-t / 3.0).exp()).collect();
        let (y0, tau) = fit_exp_decay(&t, &y, (y[0], 1.0)).unwrap();
        assert!((y0 - 0.4).abs() < 1e-6);
        assert!((tau - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_two_regime_on_power_law() {
        let times: Vec<f64> = (0..200).map(|k| k as f64).collect();
        let positions: Vec<f64> = times.iter().map(|t| 2.0 * t.powf(0.5)).collect();
        let fit = two_regime_fit(&times, &positions, 5, 80);
        assert_eq!(fit.wf, Some(0.5));
        assert_eq!(fit.cf, Some(2.0));
        assert!(fit.vf.is_some());
    }

    #[test]
    fn test_two_regime_short_input_is_empty() {
        let fit = two_regime_fit(&[0.0, 1.0], &[0.0, 1.0], 5, 80);
        assert_eq!(fit.vf, None);
        assert_eq!(fit.wf, None);
        assert!(fit.xt_over_t.is_empty());
    }
}
