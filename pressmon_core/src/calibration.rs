//! Zero baseline captured by calibration and subtracted from every reading.

/// Holds the current baseline. Replaced wholesale on each calibration.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationStore {
    baseline: Vec<f64>,
}

impl CalibrationStore {
    /// All-zero baseline for `channels` channels.
    pub fn zeros(channels: usize) -> Self {
        Self {
            baseline: vec![0.0; channels],
        }
    }

    pub fn from_baseline(baseline: Vec<f64>) -> Self {
        Self { baseline }
    }

    pub fn baseline(&self) -> &[f64] {
        &self.baseline
    }

    pub fn set_baseline(&mut self, baseline: Vec<f64>) {
        self.baseline = baseline;
    }

    /// `reading - baseline` per channel. Channels without a baseline entry
    /// pass through unchanged.
    pub fn apply(&self, reading: &[f64]) -> Vec<f64> {
        reading
            .iter()
            .enumerate()
            .map(|(i, v)| v - self.baseline.get(i).copied().unwrap_or(0.0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtracts_componentwise_and_overwrites() {
        let mut store = CalibrationStore::zeros(3);
        assert_eq!(store.apply(&[1.0, 2.0, 3.0]), vec![1.0, 2.0, 3.0]);
        store.set_baseline(vec![0.5, 1.0, 1.5]);
        assert_eq!(store.apply(&[1.0, 2.0, 3.0]), vec![0.5, 1.0, 1.5]);
        store.set_baseline(vec![1.0, 1.0, 1.0]);
        assert_eq!(store.baseline(), &[1.0, 1.0, 1.0]);
    }
}
