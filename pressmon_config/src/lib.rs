#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and baseline persistence for the pressure monitor.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//!   Every section has defaults, so an empty file is a valid config.
//! - Baseline CSV loader/writer enforces the `channel,baseline` header so a
//!   zero captured by `calibrate` can be reused by later sessions.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Upper bound on channels a session may carry.
pub const MAX_CHANNELS: usize = 16;

/// Number of data channels a serial line carries (CH1..CH4).
pub const SERIAL_CHANNELS: usize = 4;

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Serial,
    Camera,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BackendCfg {
    pub kind: BackendKind,
    /// Serial device path. When absent the built-in simulator answers instead.
    pub port: Option<String>,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
    /// JSON-lines file of recorded OCR detections (camera backend).
    pub replay: Option<PathBuf>,
}

impl Default for BackendCfg {
    fn default() -> Self {
        Self {
            kind: BackendKind::Serial,
            port: None,
            baud_rate: 115_200,
            read_timeout_ms: 1000,
            replay: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ChannelsCfg {
    pub count: usize,
}

impl Default for ChannelsCfg {
    fn default() -> Self {
        Self { count: 4 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SamplingCfg {
    pub calibration_batch_size: usize,
    pub sampling_batch_size: usize,
    /// Attempts in the camera probe batch that detects the first reading.
    pub probe_batch_size: usize,
    /// Pause between the first camera reading and the start of recording.
    pub settle_delay_seconds: u64,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            calibration_batch_size: 10,
            sampling_batch_size: 10,
            probe_batch_size: 3,
            settle_delay_seconds: 2,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionCfg {
    pub duration_seconds: u64,
    /// Maximum |last - first| per channel, in physical units, for a pass.
    pub threshold: f64,
}

impl Default for SessionCfg {
    fn default() -> Self {
        Self {
            duration_seconds: 60,
            threshold: 5.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct ConversionCfg {
    pub adc_max: f64,
    pub v_ref: f64,
    pub i_max: f64,
    pub p_max: f64,
}

impl Default for ConversionCfg {
    fn default() -> Self {
        Self {
            adc_max: 4095.0,
            v_ref: 3.0,
            i_max: 20.0,
            p_max: 40.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SerialCfg {
    /// CH0 values above this mean "no physical data" for the line.
    pub presence_gate: i64,
}

impl Default for SerialCfg {
    fn default() -> Self {
        Self {
            presence_gate: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Baseline used until the first calibration. Defaults to zeros.
    pub initial_baseline: Option<Vec<f64>>,
    /// Baseline CSV written by `calibrate --save`; preferred over `initial_baseline`.
    pub file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RecordCfg {
    /// Root for per-session directories (`<dir>/<timestamp>/`).
    pub dir: PathBuf,
    pub enabled: bool,
}

impl Default for RecordCfg {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("rec"),
            enabled: true,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub backend: BackendCfg,
    pub channels: ChannelsCfg,
    pub sampling: SamplingCfg,
    pub session: SessionCfg,
    pub conversion: ConversionCfg,
    pub serial: SerialCfg,
    pub calibration: CalibrationCfg,
    pub logging: Logging,
    pub record: RecordCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// One row of a persisted baseline.
///
/// Expected headers:
/// channel,baseline
///
/// Example:
/// channel,baseline
/// 1,0.12
/// 2,-0.03
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct BaselineRow {
    pub channel: usize,
    pub baseline: f64,
}

/// Load a baseline CSV and return the values ordered by channel (1-based, contiguous).
pub fn load_baseline_csv(path: &Path) -> eyre::Result<Vec<f64>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open baseline CSV {:?}: {}", path, e))?;

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["channel", "baseline"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "baseline CSV must have headers 'channel,baseline', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<BaselineRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => eyre::bail!("invalid CSV row {}: {}", idx + 2, e),
        }
    }
    if rows.is_empty() {
        eyre::bail!("baseline CSV {:?} has no rows", path);
    }

    rows.sort_by_key(|r| r.channel);
    for (i, row) in rows.iter().enumerate() {
        if row.channel != i + 1 {
            eyre::bail!(
                "baseline CSV channels must be 1..={} without gaps, found channel {}",
                rows.len(),
                row.channel
            );
        }
        if !row.baseline.is_finite() {
            eyre::bail!("baseline for channel {} is not finite", row.channel);
        }
    }
    Ok(rows.into_iter().map(|r| r.baseline).collect())
}

/// Write `baseline` as a `channel,baseline` CSV.
pub fn write_baseline_csv(path: &Path, baseline: &[f64]) -> eyre::Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|e| eyre::eyre!("create baseline CSV {:?}: {}", path, e))?;
    for (i, value) in baseline.iter().enumerate() {
        wtr.serialize(BaselineRow {
            channel: i + 1,
            baseline: *value,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

fn positive_finite(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Backend
        if self.backend.baud_rate == 0 {
            eyre::bail!("backend.baud_rate must be > 0");
        }
        if self.backend.read_timeout_ms == 0 {
            eyre::bail!("backend.read_timeout_ms must be >= 1");
        }
        if self.backend.kind == BackendKind::Serial && self.backend.replay.is_some() {
            eyre::bail!("backend.replay is only valid with kind = \"camera\"");
        }

        // Channels
        if self.channels.count == 0 {
            eyre::bail!("channels.count must be >= 1");
        }
        if self.channels.count > MAX_CHANNELS {
            eyre::bail!("channels.count must be <= {MAX_CHANNELS}");
        }
        if self.backend.kind == BackendKind::Serial && self.channels.count != SERIAL_CHANNELS {
            eyre::bail!("channels.count must be {SERIAL_CHANNELS} for the serial backend");
        }

        // Sampling
        if self.sampling.calibration_batch_size == 0 {
            eyre::bail!("sampling.calibration_batch_size must be >= 1");
        }
        if self.sampling.sampling_batch_size == 0 {
            eyre::bail!("sampling.sampling_batch_size must be >= 1");
        }
        if self.sampling.probe_batch_size == 0 {
            eyre::bail!("sampling.probe_batch_size must be >= 1");
        }
        if self.sampling.settle_delay_seconds > 60 {
            eyre::bail!("sampling.settle_delay_seconds is unreasonably large (>60s)");
        }

        // Session
        if self.session.duration_seconds == 0 {
            eyre::bail!("session.duration_seconds must be >= 1");
        }
        if self.session.duration_seconds > 24 * 60 * 60 {
            eyre::bail!("session.duration_seconds is unreasonably large (>24h)");
        }
        if !self.session.threshold.is_finite() || self.session.threshold < 0.0 {
            eyre::bail!("session.threshold must be a finite value >= 0");
        }

        // Conversion
        let c = &self.conversion;
        for (name, v) in [
            ("adc_max", c.adc_max),
            ("v_ref", c.v_ref),
            ("i_max", c.i_max),
            ("p_max", c.p_max),
        ] {
            if !positive_finite(v) {
                eyre::bail!("conversion.{name} must be a finite value > 0");
            }
        }

        // Calibration
        if let Some(base) = &self.calibration.initial_baseline {
            if base.len() != self.channels.count {
                eyre::bail!(
                    "calibration.initial_baseline has {} values, expected {}",
                    base.len(),
                    self.channels.count
                );
            }
            if base.iter().any(|v| !v.is_finite()) {
                eyre::bail!("calibration.initial_baseline values must be finite");
            }
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        Ok(())
    }
}
