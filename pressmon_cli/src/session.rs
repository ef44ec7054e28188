//! Backend assembly from config and the detect / calibrate / self-check flows.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crossbeam_channel::Receiver;
use eyre::WrapErr;
use pressmon_config::{BackendKind, Config};
use pressmon_core::logger::{FileSessionLog, NullSessionLog};
use pressmon_core::error::MonitorError;
use pressmon_core::record::write_session_record;
use pressmon_core::runner::{Control, TICK, run_session};
use pressmon_core::{
    Backend, BatchSampler, CalibrationStore, CameraBackend, OcrTextParser, Sample, SamplingCfg,
    SerialBackend, SerialLineParser, SessionCfg, SessionController, SessionEvent, SessionReport,
    SpatialSorter,
};
use pressmon_hardware::{SimulatedCamera, SimulatedDetector, SimulatedSerial};
use pressmon_traits::{SessionLog, TextDetector};

use crate::replay::ReplayDetector;

/// Session directory and file stem, e.g. `20260101_120000123`.
const SESSION_STAMP: &str = "%Y%m%d_%H%M%S%3f";

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Tick period for the runner. Tests shorten it with `PRESSMON_TEST_TICK_MS`.
pub fn tick_period() -> Duration {
    env_parse::<u64>("PRESSMON_TEST_TICK_MS").map_or(TICK, Duration::from_millis)
}

fn simulated_serial() -> SimulatedSerial {
    let mut sim = SimulatedSerial::new([820, 1640, 2460, 3280]).with_noise(3, 0x5eed);
    if let Some(ch0) = env_parse::<u32>("PRESSMON_TEST_SIM_PRESENCE") {
        sim = sim.with_presence(ch0);
    }
    if let Some(drift) = env_parse::<i64>("PRESSMON_TEST_SIM_DRIFT") {
        sim = sim.with_drift(drift);
    }
    if let Some(n) = env_parse::<u64>("PRESSMON_TEST_SIM_TIMEOUT") {
        sim = sim.with_timeout_every(n);
    }
    sim
}

fn serial_backend(cfg: &Config) -> eyre::Result<Backend> {
    let parser = SerialLineParser::try_from(cfg).map_err(eyre::Report::new)?;
    let Some(port) = cfg.backend.port.as_deref() else {
        tracing::info!("no backend.port configured; using the serial simulator");
        return Ok(Backend::Serial(SerialBackend::new(
            Box::new(simulated_serial()),
            parser,
        )));
    };
    open_serial(cfg, port, parser)
}

#[cfg(feature = "hardware")]
fn open_serial(cfg: &Config, port: &str, parser: SerialLineParser) -> eyre::Result<Backend> {
    use pressmon_hardware::SerialOpts;
    use pressmon_hardware::serial::SerialDevice;

    let opts = SerialOpts {
        baud_rate: cfg.backend.baud_rate,
        read_timeout: Duration::from_millis(cfg.backend.read_timeout_ms),
    };
    let device =
        SerialDevice::connect(port, &opts).wrap_err_with(|| format!("open serial port {port}"))?;
    Ok(Backend::Serial(SerialBackend::new(Box::new(device), parser)))
}

#[cfg(not(feature = "hardware"))]
fn open_serial(_cfg: &Config, port: &str, _parser: SerialLineParser) -> eyre::Result<Backend> {
    eyre::bail!("backend.port = {port:?} needs a build with the `hardware` feature")
}

fn camera_backend(cfg: &Config) -> eyre::Result<Backend> {
    let detector: Box<dyn TextDetector> = match &cfg.backend.replay {
        Some(path) => {
            let replay = ReplayDetector::load(path)?;
            tracing::info!(path = %path.display(), frames = replay.frames(), "replaying OCR detections");
            Box::new(replay)
        }
        None => {
            tracing::info!("no backend.replay configured; using the display simulator");
            let values = (1..=cfg.channels.count).map(|i| i as f64 * 1.25).collect();
            Box::new(SimulatedDetector::new(values, 2).with_confusions_every(4))
        }
    };
    Ok(Backend::Camera(CameraBackend::new(
        Box::new(SimulatedCamera::new(640, 480)),
        detector,
        OcrTextParser::default(),
        SpatialSorter::default(),
    )))
}

/// Build the configured backend. Exactly one backend is active per run.
pub fn build_backend(cfg: &Config) -> eyre::Result<Backend> {
    let backend = match cfg.backend.kind {
        BackendKind::Serial => serial_backend(cfg)?,
        BackendKind::Camera => camera_backend(cfg)?,
    };
    tracing::info!(backend = backend.kind(), channels = cfg.channels.count, "backend ready");
    Ok(backend)
}

/// Baseline to start from: the saved CSV if configured and present, else
/// `calibration.initial_baseline`, else zeros.
pub fn load_baseline(cfg: &Config) -> eyre::Result<CalibrationStore> {
    if let Some(path) = &cfg.calibration.file
        && path.exists()
    {
        let baseline = pressmon_config::load_baseline_csv(path)?;
        if baseline.len() != cfg.channels.count {
            return Err(eyre::Report::new(MonitorError::Config(format!(
                "calibration file {} has {} channels, config has {}",
                path.display(),
                baseline.len(),
                cfg.channels.count
            ))));
        }
        tracing::info!(path = %path.display(), "baseline loaded");
        return Ok(CalibrationStore::from_baseline(baseline));
    }
    Ok(CalibrationStore::from(cfg))
}

pub fn build_controller(cfg: &Config, store: &CalibrationStore) -> eyre::Result<SessionController> {
    SessionController::builder()
        .with_session(SessionCfg::from(cfg))
        .with_sampling(SamplingCfg::from(&cfg.sampling))
        .with_calibration(store)
        .build()
}

/// Files written for one detection session.
#[derive(Debug, Clone)]
pub struct SessionPaths {
    pub dir: PathBuf,
    pub log: PathBuf,
    pub record: PathBuf,
}

impl SessionPaths {
    pub fn new(root: &Path, stamp: &str) -> Self {
        let dir = root.join(stamp);
        Self {
            log: dir.join(format!("{stamp}.log")),
            record: dir.join(format!("{stamp}.txt")),
            dir,
        }
    }
}

pub struct DetectOpts {
    pub duration: Option<u64>,
    pub threshold: Option<f64>,
    pub zero: bool,
}

pub struct DetectOutcome {
    pub report: SessionReport,
    pub baseline: Vec<f64>,
    pub record: Option<PathBuf>,
}

/// Apply CLI overrides on top of the loaded config.
pub fn apply_overrides(cfg: &mut Config, opts: &DetectOpts) {
    if let Some(d) = opts.duration {
        cfg.session.duration_seconds = d;
    }
    if let Some(t) = opts.threshold {
        cfg.session.threshold = t;
    }
}

/// One complete detection: optional zeroing, the timed session, the record.
pub fn run_detect(
    cfg: &Config,
    opts: &DetectOpts,
    control: &Receiver<Control>,
    mut on_event: impl FnMut(&SessionEvent),
) -> eyre::Result<DetectOutcome> {
    let store = load_baseline(cfg)?;
    let mut controller = build_controller(cfg, &store)?;
    let mut sampler = BatchSampler::new(build_backend(cfg)?);

    let paths = cfg.record.enabled.then(|| {
        let stamp = chrono::Local::now().format(SESSION_STAMP).to_string();
        SessionPaths::new(&cfg.record.dir, &stamp)
    });
    let mut log: Box<dyn SessionLog> = match &paths {
        Some(p) => Box::new(
            FileSessionLog::open(&p.log)
                .wrap_err_with(|| format!("open session log {}", p.log.display()))?,
        ),
        None => Box::new(NullSessionLog),
    };

    if opts.zero {
        let events = controller.calibrate(&mut sampler)?;
        for ev in &events {
            if let Err(e) = log.append(&ev.to_string()) {
                tracing::warn!(error = %e, "session log write failed");
            }
            on_event(ev);
        }
    }

    let outcome = run_session(
        &mut controller,
        &mut sampler,
        log.as_mut(),
        control,
        tick_period(),
        &mut on_event,
    );
    let (attempts, skipped) = sampler.counters();
    tracing::debug!(attempts, skipped, "sampler counters");
    sampler.disconnect();
    let report = outcome?;

    let record = match paths {
        Some(p) => {
            write_session_record(&p.record, controller.history())?;
            Some(p.record)
        }
        None => None,
    };
    Ok(DetectOutcome {
        report,
        baseline: controller.baseline().to_vec(),
        record,
    })
}

/// Capture a baseline; optionally persist it as CSV.
pub fn run_calibrate(cfg: &Config, save: Option<&Path>) -> eyre::Result<Vec<f64>> {
    let store = load_baseline(cfg)?;
    let mut controller = build_controller(cfg, &store)?;
    let mut sampler = BatchSampler::new(build_backend(cfg)?);
    let result = controller.calibrate(&mut sampler);
    sampler.disconnect();
    result?;

    let baseline = controller.baseline().to_vec();
    if let Some(path) = save {
        pressmon_config::write_baseline_csv(path, &baseline)?;
        tracing::info!(path = %path.display(), "baseline saved");
    }
    Ok(baseline)
}

pub struct SelfCheck {
    pub backend: &'static str,
    pub requested: usize,
    pub readings: usize,
}

/// Open the backend and take one probe batch.
pub fn self_check(cfg: &Config) -> eyre::Result<SelfCheck> {
    let mut sampler = BatchSampler::new(build_backend(cfg)?);
    let requested = cfg.sampling.probe_batch_size;
    let readings = sampler.sample_batch(requested).len();
    let backend = sampler.backend().kind();
    sampler.disconnect();
    if readings == 0 {
        eyre::bail!("{backend} backend produced no readings in {requested} attempts");
    }
    Ok(SelfCheck {
        backend,
        requested,
        readings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_files_share_the_stamp() {
        let p = SessionPaths::new(Path::new("rec"), "20260101_120000000");
        assert_eq!(p.dir, PathBuf::from("rec/20260101_120000000"));
        assert_eq!(p.log, PathBuf::from("rec/20260101_120000000/20260101_120000000.log"));
        assert_eq!(p.record, PathBuf::from("rec/20260101_120000000/20260101_120000000.txt"));
    }

    #[test]
    fn overrides_replace_session_values() {
        let mut cfg = Config::default();
        apply_overrides(
            &mut cfg,
            &DetectOpts {
                duration: Some(5),
                threshold: Some(0.5),
                zero: false,
            },
        );
        assert_eq!(cfg.session.duration_seconds, 5);
        assert_eq!(cfg.session.threshold, 0.5);
    }

    #[test]
    fn simulated_camera_backend_reads_every_channel() {
        let cfg = pressmon_config::load_toml("[backend]\nkind = \"camera\"\n").unwrap();
        let mut sampler = BatchSampler::new(build_backend(&cfg).unwrap());
        let batch = sampler.sample_batch(4);
        assert_eq!(batch.len(), 4);
        assert_eq!(batch[0], vec![1.25, 2.5, 3.75, 5.0]);
    }

    #[test]
    fn default_config_uses_the_serial_simulator() {
        let cfg = Config::default();
        let mut sampler = BatchSampler::new(build_backend(&cfg).unwrap());
        assert_eq!(sampler.backend().kind(), "serial");
        assert_eq!(sampler.sample_batch(3).len(), 3);
    }
}
