//! Batch -> one reading per channel.
//!
//! Two stages: keep only attempts whose length is the batch majority (an
//! attempt that lost a channel would otherwise shift every later slot),
//! then take the per-channel median of the survivors.

use crate::error::AggregationFailure;
use crate::util::median_in_place;

/// Most frequent attempt length. Ties prefer `channel_count`, then the
/// length seen first.
fn majority_length(attempts: &[Vec<f64>], channel_count: usize) -> Option<usize> {
    // (length, count) in first-seen order
    let mut tally: Vec<(usize, usize)> = Vec::new();
    for a in attempts {
        match tally.iter_mut().find(|(len, _)| *len == a.len()) {
            Some((_, n)) => *n += 1,
            None => tally.push((a.len(), 1)),
        }
    }
    let best = tally.iter().map(|(_, n)| *n).max()?;
    let mut tied = tally.iter().filter(|(_, n)| *n == best).map(|(len, _)| *len);
    let first = tied.clone().next();
    if tied.any(|len| len == channel_count) {
        Some(channel_count)
    } else {
        first
    }
}

/// Majority-length filter followed by a per-channel median.
///
/// Returns `None` for an empty batch. The result has the majority length,
/// which may differ from `channel_count`; use [`aggregate_exact`] to treat
/// that as a failure.
pub fn aggregate(attempts: &[Vec<f64>], channel_count: usize) -> Option<Vec<f64>> {
    let len = majority_length(attempts, channel_count)?;
    let survivors: Vec<&Vec<f64>> = attempts.iter().filter(|a| a.len() == len).collect();
    let mut column = Vec::with_capacity(survivors.len());
    let mut out = Vec::with_capacity(len);
    for ch in 0..len {
        column.clear();
        column.extend(survivors.iter().map(|a| a[ch]));
        out.push(median_in_place(&mut column)?);
    }
    Some(out)
}

/// Like [`aggregate`] but insists on exactly `channel_count` channels.
pub fn aggregate_exact(
    attempts: &[Vec<f64>],
    channel_count: usize,
) -> Result<Vec<f64>, AggregationFailure> {
    let v = aggregate(attempts, channel_count).ok_or(AggregationFailure::NoData)?;
    if v.len() != channel_count {
        return Err(AggregationFailure::LengthMismatch {
            expected: channel_count,
            got: v.len(),
        });
    }
    Ok(v)
}
