/// What the slots of a dense row are indexed by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DenseAxis {
    /// Slot `k` holds the displacement at time `k * dt`.
    Time { dt: f64 },
    /// Slot `x` holds the first arrival time at site `x`.
    Position,
}

/// Writes `value` into `dense[from..=through]`, clipped to the row, and
/// returns the index after `through`: the next slot still waiting for data.
pub fn fill_span(dense: &mut [f64], from: usize, through: usize, value: f64) -> usize {
    let end = through.saturating_add(1).min(dense.len());
    if from < end {
        dense[from..end].fill(value);
    }
    through.saturating_add(1)
}

/// Slot holding time `t`. Saturates for very large or sentinel times.
#[inline]
pub fn time_index(t: f64, dt: f64) -> usize {
    (t / dt).floor() as usize
}
