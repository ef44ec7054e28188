//! Small numeric helpers shared by the aggregator and the layout sorter.

/// Median of `values`, sorting them in place.
///
/// - Even counts average the two middle values.
/// - Returns `None` for an empty slice.
/// - NaN sorts last (`total_cmp`) and so never panics.
pub fn median_in_place(values: &mut [f64]) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    values.sort_unstable_by(f64::total_cmp);
    let mid = n / 2;
    if n.is_multiple_of(2) {
        // n >= 2 here, so mid >= 1
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Upper median: the element at `n / 2` after sorting. Never averages.
pub fn upper_median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable_by(f64::total_cmp);
    Some(values[values.len() / 2])
}

/// Mean of a non-empty slice; 0.0 for an empty one.
#[inline]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
