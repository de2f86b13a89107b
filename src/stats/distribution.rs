/// Bin centers and their probability mass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distribution {
    pub points: Vec<f64>,
    pub probs: Vec<f64>,
}

impl Distribution {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Center of the most populated bin, `None` when nothing was binned.
    pub fn most_probable(&self) -> Option<f64> {
        let (k, p) = self
            .probs
            .iter()
            .enumerate()
            .fold((0, 0.0), |best, (k, &p)| if p > best.1 { (k, p) } else { best });
        (p > 0.0).then(|| self.points[k])
    }
}

/// Uniform bins over `[first, last)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinGrid {
    pub first: f64,
    pub last: f64,
    pub width: f64,
    pub n_bins: usize,
}

impl BinGrid {
    pub fn new(first: f64, last: f64, width: f64) -> Self {
        let n_bins = if width > 0.0 && last > first {
            ((last - first) / width - 1e-9).ceil().max(0.0) as usize
        } else {
            0
        };
        Self {
            first,
            last,
            width,
            n_bins,
        }
    }

    #[inline]
    pub fn index(&self, value: f64) -> Option<usize> {
        if !value.is_finite() || value < self.first || value >= self.last || self.n_bins == 0 {
            return None;
        }
        let k = ((value - self.first) / self.width).floor() as usize;
        Some(k.min(self.n_bins - 1))
    }

    pub fn centers(&self) -> Vec<f64> {
        (0..self.n_bins)
            .map(|k| self.first + (k as f64 + 0.5) * self.width)
            .collect()
    }

    /// Counts per bin; non-finite and out-of-grid samples are dropped.
    pub fn histogram<I: IntoIterator<Item = f64>>(&self, data: I) -> Vec<u64> {
        let mut counts = vec![0u64; self.n_bins];
        for v in data {
            if let Some(k) = self.index(v) {
                counts[k] += 1;
            }
        }
        counts
    }
}

/// Turns counts into probabilities. An empty or all-zero input gives zeros.
pub fn normalize_counts(counts: &[u64]) -> Vec<f64> {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return vec![0.0; counts.len()];
    }
    let total = total as f64;
    counts.iter().map(|&c| c as f64 / total).collect()
}

/// Normalized histogram of `data` over `[first, last)` in bins of `width`.
pub fn distribution<I: IntoIterator<Item = f64>>(
    data: I,
    first: f64,
    last: f64,
    width: f64,
) -> Distribution {
    let grid = BinGrid::new(first, last, width);
    let counts = grid.histogram(data);
    Distribution {
        points: grid.centers(),
        probs: normalize_counts(&counts),
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Median of the values, reordering them in place.
pub fn median(values: &mut [f64]) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    values.sort_unstable_by(f64::total_cmp);
    Some(if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    })
}

/// NaN-skipping column statistics of equally long rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnStats {
    pub mean: Vec<f64>,
    pub median: Vec<f64>,
    pub std: Vec<f64>,
}

pub fn column_stats(rows: &[Vec<f64>]) -> ColumnStats {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut out = ColumnStats {
        mean: Vec::with_capacity(width),
        median: Vec::with_capacity(width),
        std: Vec::with_capacity(width),
    };
    let mut column = Vec::with_capacity(rows.len());
    for k in 0..width {
        column.clear();
        column.extend(
            rows.iter()
                .filter_map(|r| r.get(k).copied())
                .filter(|v| v.is_finite()),
        );
        out.mean.push(mean(&column).unwrap_or(f64::NAN));
        out.std.push(std_dev(&column).unwrap_or(f64::NAN));
        out.median.push(median(&mut column).unwrap_or(f64::NAN));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_is_half_open() {
        let grid = BinGrid::new(0.0, 10.0, 2.0);
        assert_eq!(grid.n_bins, 5);
        assert_eq!(grid.index(0.0), Some(0));
        assert_eq!(grid.index(9.99), Some(4));
        assert_eq!(grid.index(10.0), None);
        assert_eq!(grid.index(-0.1), None);
        assert_eq!(grid.index(f64::NAN), None);
    }

    #[test]
    fn test_fractional_width_bin_count() {
        assert_eq!(BinGrid::new(0.0, 100.0, 0.2).n_bins, 500);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&mut []), None);
    }
}
