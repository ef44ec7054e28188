//! Runtime configuration for the session controller.
//!
//! These are separate from the TOML-deserialized config in `pressmon_config`;
//! see `conversions` for the bridge.

use std::time::Duration;

/// When the session clock starts counting recorded seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockStart {
    /// Start on the first valid full batch.
    #[default]
    FirstReading,
    /// Probe until a reading appears, wait the settle delay, then start on
    /// the next valid full batch.
    AfterSettle,
}

/// Batch sizes and the camera settle delay.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingCfg {
    /// Attempts per calibration batch.
    pub calibration_batch_size: usize,
    /// Attempts per recorded second.
    pub sampling_batch_size: usize,
    /// Attempts per probe while waiting for the first camera reading.
    pub probe_batch_size: usize,
    pub settle_delay: Duration,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            calibration_batch_size: 10,
            sampling_batch_size: 10,
            probe_batch_size: 3,
            settle_delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionCfg {
    pub channel_count: usize,
    pub duration_seconds: u64,
    /// Pass iff |last - first| <= threshold, per channel.
    pub threshold: f64,
    pub clock_start: ClockStart,
}

impl Default for SessionCfg {
    fn default() -> Self {
        Self {
            channel_count: 4,
            duration_seconds: 60,
            threshold: 5.0,
            clock_start: ClockStart::FirstReading,
        }
    }
}
