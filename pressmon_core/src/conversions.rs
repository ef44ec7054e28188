//! `From`/`TryFrom` implementations bridging `pressmon_config` types to
//! `pressmon_core` types.

use std::time::Duration;

use crate::calibration::CalibrationStore;
use crate::config::{ClockStart, SamplingCfg, SessionCfg};
use crate::error::BuildError;
use crate::parser::SerialLineParser;
use crate::units::UnitConverter;

// ── SamplingCfg ──────────────────────────────────────────────────────────────

impl From<&pressmon_config::SamplingCfg> for SamplingCfg {
    fn from(c: &pressmon_config::SamplingCfg) -> Self {
        Self {
            calibration_batch_size: c.calibration_batch_size,
            sampling_batch_size: c.sampling_batch_size,
            probe_batch_size: c.probe_batch_size,
            settle_delay: Duration::from_secs(c.settle_delay_seconds),
        }
    }
}

// ── ClockStart ───────────────────────────────────────────────────────────────

impl From<pressmon_config::BackendKind> for ClockStart {
    fn from(k: pressmon_config::BackendKind) -> Self {
        match k {
            pressmon_config::BackendKind::Serial => ClockStart::FirstReading,
            pressmon_config::BackendKind::Camera => ClockStart::AfterSettle,
        }
    }
}

// ── SessionCfg ───────────────────────────────────────────────────────────────

impl From<&pressmon_config::Config> for SessionCfg {
    fn from(c: &pressmon_config::Config) -> Self {
        Self {
            channel_count: c.channels.count,
            duration_seconds: c.session.duration_seconds,
            threshold: c.session.threshold,
            clock_start: c.backend.kind.into(),
        }
    }
}

// ── UnitConverter / SerialLineParser ─────────────────────────────────────────

impl TryFrom<&pressmon_config::ConversionCfg> for UnitConverter {
    type Error = BuildError;
    fn try_from(c: &pressmon_config::ConversionCfg) -> Result<Self, Self::Error> {
        UnitConverter::new(c.adc_max, c.v_ref, c.i_max, c.p_max)
    }
}

impl TryFrom<&pressmon_config::Config> for SerialLineParser {
    type Error = BuildError;
    fn try_from(c: &pressmon_config::Config) -> Result<Self, Self::Error> {
        let converter = UnitConverter::try_from(&c.conversion)?;
        Ok(SerialLineParser::new(converter, c.serial.presence_gate))
    }
}

// ── CalibrationStore ─────────────────────────────────────────────────────────

impl From<&pressmon_config::Config> for CalibrationStore {
    fn from(c: &pressmon_config::Config) -> Self {
        match &c.calibration.initial_baseline {
            Some(b) => CalibrationStore::from_baseline(b.clone()),
            None => CalibrationStore::zeros(c.channels.count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_config_settles_before_recording() {
        let cfg = pressmon_config::load_toml(
            "[backend]\nkind = \"camera\"\n[channels]\ncount = 2\n[sampling]\nsettle_delay_seconds = 3\n",
        )
        .unwrap();
        let session = SessionCfg::from(&cfg);
        assert_eq!(session.clock_start, ClockStart::AfterSettle);
        assert_eq!(session.channel_count, 2);
        let sampling = SamplingCfg::from(&cfg.sampling);
        assert_eq!(sampling.settle_delay, Duration::from_secs(3));
        assert_eq!(CalibrationStore::from(&cfg).baseline(), &[0.0, 0.0]);
    }

    #[test]
    fn conversion_constants_flow_into_parser() {
        let cfg = pressmon_config::load_toml("[conversion]\np_max = 10.0\n").unwrap();
        let parser = SerialLineParser::try_from(&cfg).unwrap();
        let v = parser
            .parse("CH0: 0 | CH1: 4095 | CH2: 0 | CH3: 0 | CH4: 0")
            .unwrap()
            .unwrap();
        assert_eq!(v[0], 10.0);
    }
}
