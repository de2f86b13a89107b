use crate::error::{LfResult, LoopForgeError};
use statrs::function::gamma::ln_gamma;

/// Probability of each jump length, index 0 excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct JumpKernel {
    probs: Vec<f64>,
    cumulative: Vec<f64>,
    support_end: usize,
}

impl JumpKernel {
    /// Gamma-shaped kernel with mean `mu` and spread `theta`, evaluated on
    /// jump lengths `0..len`.
    ///
    /// The density is built in log space and shifted by its maximum before
    /// exponentiation, so very sharp kernels (`theta << mu`) keep their mass.
    pub fn gamma(mu: f64, theta: f64, len: usize) -> LfResult<Self> {
        if !(mu > 0.0 && mu.is_finite()) {
            return Err(LoopForgeError::InvalidConfiguration(format!(
                "mu must be positive, got {}",
                mu
            )));
        }
        if !(theta > 0.0 && theta.is_finite()) {
            return Err(LoopForgeError::InvalidConfiguration(format!(
                "theta must be positive, got {}",
                theta
            )));
        }

        let shape = mu * mu / (theta * theta);
        let scale = theta * theta / mu;
        let norm = ln_gamma(shape) + shape * scale.ln();

        let log_pdf: Vec<f64> = (0..len)
            .map(|d| {
                if d == 0 {
                    return f64::NEG_INFINITY;
                }
                let x = d as f64;
                (shape - 1.0) * x.ln() - x / scale - norm
            })
            .collect();

        let peak = log_pdf
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(f64::NEG_INFINITY, f64::max);
        if !peak.is_finite() {
            return Err(LoopForgeError::DegenerateDistribution(format!(
                "gamma kernel (mu={}, theta={}) has no finite density on {} sites",
                mu, theta, len
            )));
        }

        Self::from_weights(log_pdf.into_iter().map(|l| (l - peak).exp()).collect())
    }

    /// Normalizes arbitrary non-negative weights. Index 0 is forced to zero.
    pub fn from_weights(mut weights: Vec<f64>) -> LfResult<Self> {
        if let Some(w0) = weights.first_mut() {
            *w0 = 0.0;
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(LoopForgeError::DegenerateDistribution(
                "jump weights must be finite and non-negative".to_string(),
            ));
        }
        let total: f64 = weights.iter().sum();
        if !(total > 0.0 && total.is_finite()) {
            return Err(LoopForgeError::DegenerateDistribution(
                "jump kernel has zero total mass".to_string(),
            ));
        }

        let probs: Vec<f64> = weights.iter().map(|w| w / total).collect();
        let cumulative: Vec<f64> = probs
            .iter()
            .scan(0.0, |acc, p| {
                *acc += p;
                Some(*acc)
            })
            .collect();
        let support_end = probs.iter().rposition(|&p| p > 0.0).unwrap_or(0);

        Ok(Self {
            probs,
            cumulative,
            support_end,
        })
    }

    /// All mass on a single jump length.
    pub fn deterministic(step: usize, len: usize) -> LfResult<Self> {
        let mut weights = vec![0.0; len];
        if step == 0 || step >= len {
            return Err(LoopForgeError::InvalidConfiguration(format!(
                "deterministic step {} must lie in [1, {})",
                step, len
            )));
        }
        weights[step] = 1.0;
        Self::from_weights(weights)
    }

    pub fn len(&self) -> usize {
        self.probs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    pub fn probs(&self) -> &[f64] {
        &self.probs
    }

    #[inline(always)]
    pub fn p(&self, d: usize) -> f64 {
        self.probs[d]
    }

    /// Longest jump with non-zero probability.
    pub fn support_end(&self) -> usize {
        self.support_end
    }

    pub fn mean(&self) -> f64 {
        self.probs
            .iter()
            .enumerate()
            .map(|(d, p)| d as f64 * p)
            .sum()
    }

    /// Inverse-CDF draw for a uniform `u` in `[0, 1)`.
    pub fn sample(&self, u: f64) -> usize {
        let d = self.cumulative.partition_point(|&c| c <= u);
        d.clamp(1, self.support_end.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_inverts_cumulative() {
        let kernel = JumpKernel::from_weights(vec![5.0, 1.0, 0.0, 3.0]).unwrap();
        assert_eq!(kernel.p(0), 0.0);
        assert_eq!(kernel.sample(0.0), 1);
        assert_eq!(kernel.sample(0.24), 1);
        assert_eq!(kernel.sample(0.26), 3);
        assert_eq!(kernel.sample(0.999_999), 3);
        assert_eq!(kernel.support_end(), 3);
    }
}
