//! Session state machine: calibration, timed sampling and evaluation.
//!
//! ```text
//! Idle --calibrate--> Calibrating --> Idle
//! Idle --start--> Sampling --tick*/stop--> Finished --reset--> Idle
//! ```
//!
//! Every transition is a method call that returns the events it produced.
//! The caller owns the cadence: `tick` is expected once per second.

use std::sync::Arc;

use pressmon_traits::{Clock, MonotonicClock};
use tracing::{debug, info, warn};

use crate::aggregate::aggregate_exact;
use crate::batch::Sample;
use crate::calibration::CalibrationStore;
use crate::config::{ClockStart, SamplingCfg, SessionCfg};
use crate::error::{AggregationFailure, BuildError, MonitorError, Result};
use crate::status::{ChannelResult, SessionEvent, SessionReport, SessionState, Verdict};

pub struct SessionController {
    session: SessionCfg,
    sampling: SamplingCfg,
    calibration: CalibrationStore,
    state: SessionState,
    /// One series per channel.
    history: Vec<Vec<f64>>,
    remaining: u64,
    recording: bool,
    report: Option<SessionReport>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state)
            .field("remaining", &self.remaining)
            .field("recording", &self.recording)
            .field("recorded", &self.recorded_seconds())
            .finish_non_exhaustive()
    }
}

impl SessionController {
    pub fn builder() -> SessionControllerBuilder {
        SessionControllerBuilder::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Calibrated readings, one series per channel.
    pub fn history(&self) -> &[Vec<f64>] {
        &self.history
    }

    pub fn recorded_seconds(&self) -> usize {
        self.history.first().map_or(0, Vec::len)
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn baseline(&self) -> &[f64] {
        self.calibration.baseline()
    }

    pub fn session_cfg(&self) -> &SessionCfg {
        &self.session
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }

    /// The report of the last finished session, if it recorded anything.
    pub fn report(&self) -> Option<&SessionReport> {
        self.report.as_ref()
    }

    /// Result of the last finished session: its report, or `SessionAbort`.
    pub fn outcome(&self) -> Result<SessionReport> {
        if self.state != SessionState::Finished {
            return Err(eyre::Report::new(MonitorError::State(format!(
                "no finished session (state {:?})",
                self.state
            ))));
        }
        self.report
            .clone()
            .ok_or_else(|| eyre::Report::new(MonitorError::SessionAbort))
    }

    fn require(&self, want: SessionState, action: &str) -> Result<()> {
        if self.state != want {
            return Err(eyre::Report::new(MonitorError::State(format!(
                "cannot {action} while {:?}",
                self.state
            ))));
        }
        Ok(())
    }

    fn measure<S: Sample + ?Sized>(
        &self,
        sampler: &mut S,
        n: usize,
    ) -> std::result::Result<Vec<f64>, AggregationFailure> {
        let batch = sampler.sample_batch(n);
        aggregate_exact(&batch, self.session.channel_count)
    }

    /// Capture a new zero baseline. Only allowed from `Idle`.
    ///
    /// On failure the previous baseline stays in place.
    pub fn calibrate<S: Sample + ?Sized>(&mut self, sampler: &mut S) -> Result<Vec<SessionEvent>> {
        self.require(SessionState::Idle, "calibrate")?;
        self.state = SessionState::Calibrating;
        let result = self.measure(sampler, self.sampling.calibration_batch_size);
        self.state = SessionState::Idle;
        match result {
            Ok(baseline) => {
                info!(?baseline, "calibration complete");
                self.calibration.set_baseline(baseline.clone());
                Ok(vec![SessionEvent::Calibrated { baseline }])
            }
            Err(f) => {
                warn!(reason = %f, "calibration failed; baseline unchanged");
                Err(eyre::Report::new(MonitorError::Calibration(f)))
            }
        }
    }

    pub fn start(&mut self) -> Result<Vec<SessionEvent>> {
        self.require(SessionState::Idle, "start")?;
        for series in &mut self.history {
            series.clear();
        }
        self.report = None;
        self.recording = false;
        self.remaining = self.session.duration_seconds;
        self.state = SessionState::Sampling;
        info!(
            duration_s = self.session.duration_seconds,
            threshold = self.session.threshold,
            "session start"
        );
        Ok(vec![SessionEvent::Started {
            duration_seconds: self.session.duration_seconds,
        }])
    }

    /// One elapsed second while sampling.
    pub fn tick<S: Sample + ?Sized>(&mut self, sampler: &mut S) -> Result<Vec<SessionEvent>> {
        self.require(SessionState::Sampling, "tick")?;
        let full = self.sampling.sampling_batch_size;
        let mut events = Vec::new();

        if self.recording {
            match self.measure(sampler, full) {
                Ok(v) => self.record(v, &mut events),
                Err(f) => self.skip(f, &mut events),
            }
        } else {
            let first = match self.session.clock_start {
                ClockStart::FirstReading => self.measure(sampler, full),
                ClockStart::AfterSettle => {
                    match self.measure(sampler, self.sampling.probe_batch_size) {
                        Ok(_) => {
                            let delay = self.sampling.settle_delay;
                            info!(delay_s = delay.as_secs(), "first reading; settling");
                            events.push(SessionEvent::Settling { delay });
                            self.clock.sleep(delay);
                            self.measure(sampler, full)
                        }
                        Err(f) => Err(f),
                    }
                }
            };
            match first {
                Ok(v) => {
                    self.recording = true;
                    self.remaining = self.session.duration_seconds;
                    info!("recording started");
                    events.push(SessionEvent::RecordingBegan);
                    self.record(v, &mut events);
                }
                Err(f) => self.skip(f, &mut events),
            }
        }

        if self.remaining == 0 {
            events.push(self.finish(false));
        }
        Ok(events)
    }

    /// Manual stop: evaluate whatever has been recorded so far.
    pub fn stop(&mut self) -> Result<Vec<SessionEvent>> {
        self.require(SessionState::Sampling, "stop")?;
        info!(remaining_s = self.remaining, "session stopped manually");
        Ok(vec![self.finish(true)])
    }

    /// Back to `Idle`. A no-op when already idle.
    pub fn reset(&mut self) -> Result<Vec<SessionEvent>> {
        match self.state {
            SessionState::Idle => Ok(Vec::new()),
            SessionState::Finished => {
                for series in &mut self.history {
                    series.clear();
                }
                self.recording = false;
                self.remaining = 0;
                self.report = None;
                self.state = SessionState::Idle;
                Ok(Vec::new())
            }
            other => Err(eyre::Report::new(MonitorError::State(format!(
                "cannot reset while {other:?}"
            )))),
        }
    }

    fn record(&mut self, reading: Vec<f64>, events: &mut Vec<SessionEvent>) {
        let values = self.calibration.apply(&reading);
        for (series, v) in self.history.iter_mut().zip(&values) {
            series.push(*v);
        }
        self.remaining = self.remaining.saturating_sub(1);
        let second = self.recorded_seconds() - 1;
        debug!(second, ?values, remaining = self.remaining, "recorded");
        events.push(SessionEvent::Recorded { second, values });
    }

    fn skip(&mut self, reason: AggregationFailure, events: &mut Vec<SessionEvent>) {
        self.remaining = self.remaining.saturating_sub(1);
        debug!(%reason, remaining = self.remaining, "no valid data this tick");
        events.push(SessionEvent::NoData {
            remaining: self.remaining,
            reason,
        });
    }

    fn finish(&mut self, stopped_early: bool) -> SessionEvent {
        self.state = SessionState::Finished;
        if self.recorded_seconds() == 0 {
            for series in &mut self.history {
                series.clear();
            }
            self.report = None;
            warn!("session finished without a recorded reading");
            return SessionEvent::Aborted;
        }
        let threshold = self.session.threshold;
        let channels = self
            .history
            .iter()
            .enumerate()
            .filter_map(|(i, series)| {
                let initial = *series.first()?;
                let last = *series.last()?;
                let delta = last - initial;
                let verdict = if delta.abs() <= threshold {
                    Verdict::Pass
                } else {
                    Verdict::Fail
                };
                Some(ChannelResult {
                    channel: i + 1,
                    initial,
                    last,
                    delta,
                    verdict,
                })
            })
            .collect();
        let report = SessionReport {
            channels,
            recorded_seconds: self.recorded_seconds(),
            threshold,
            stopped_early,
        };
        info!(
            recorded = report.recorded_seconds,
            passed = report.passed(),
            "session finished"
        );
        self.report = Some(report.clone());
        SessionEvent::Finished(report)
    }
}

/// Builder for `SessionController`. All fields are validated on `build()`.
#[derive(Default)]
pub struct SessionControllerBuilder {
    session: Option<SessionCfg>,
    sampling: Option<SamplingCfg>,
    baseline: Option<Vec<f64>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
}

impl SessionControllerBuilder {
    pub fn with_session(mut self, session: SessionCfg) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingCfg) -> Self {
        self.sampling = Some(sampling);
        self
    }

    pub fn with_baseline(mut self, baseline: Vec<f64>) -> Self {
        self.baseline = Some(baseline);
        self
    }

    pub fn with_calibration(self, store: &CalibrationStore) -> Self {
        self.with_baseline(store.baseline().to_vec())
    }

    /// Clock used for settle delays (tests inject a `TestClock`).
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<SessionController> {
        let session = self.session.unwrap_or_default();
        let sampling = self.sampling.unwrap_or_default();

        if session.channel_count == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "channel_count must be >= 1",
            )));
        }
        if session.duration_seconds == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "duration_seconds must be >= 1",
            )));
        }
        if !session.threshold.is_finite() || session.threshold < 0.0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "threshold must be finite and >= 0",
            )));
        }
        if sampling.calibration_batch_size == 0
            || sampling.sampling_batch_size == 0
            || sampling.probe_batch_size == 0
        {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "batch sizes must be >= 1",
            )));
        }

        let calibration = match self.baseline {
            Some(b) if b.len() != session.channel_count => {
                return Err(eyre::Report::new(BuildError::InvalidConfig(
                    "baseline length must equal channel_count",
                )));
            }
            Some(b) => CalibrationStore::from_baseline(b),
            None => CalibrationStore::zeros(session.channel_count),
        };
        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(b) => Arc::from(b),
            None => Arc::new(MonotonicClock::new()),
        };

        Ok(SessionController {
            history: vec![Vec::new(); session.channel_count],
            session,
            sampling,
            calibration,
            state: SessionState::Idle,
            remaining: 0,
            recording: false,
            report: None,
            clock,
        })
    }
}
