//! Session state, emitted events and the end-of-session report.

use std::fmt;
use std::time::Duration;

use crate::error::AggregationFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    /// Only observable while `calibrate` runs.
    Calibrating,
    Sampling,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
        }
    }
}

/// Outcome for one channel. `channel` is 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelResult {
    pub channel: usize,
    pub initial: f64,
    pub last: f64,
    pub delta: f64,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub channels: Vec<ChannelResult>,
    pub recorded_seconds: usize,
    pub threshold: f64,
    pub stopped_early: bool,
}

impl SessionReport {
    pub fn passed(&self) -> bool {
        self.channels.iter().all(|c| c.verdict == Verdict::Pass)
    }

    pub fn channel(&self, channel: usize) -> Option<&ChannelResult> {
        self.channels.iter().find(|c| c.channel == channel)
    }
}

/// Everything the controller reports back from a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Calibrated { baseline: Vec<f64> },
    Started { duration_seconds: u64 },
    /// First camera reading seen; waiting before recording starts.
    Settling { delay: Duration },
    RecordingBegan,
    Recorded { second: usize, values: Vec<f64> },
    NoData { remaining: u64, reason: AggregationFailure },
    Finished(SessionReport),
    /// Session ended without a single recorded second.
    Aborted,
}

fn join(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{v:.2}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEvent::Calibrated { baseline } => {
                write!(f, "calibration complete, baseline [{}]", join(baseline))
            }
            SessionEvent::Started { duration_seconds } => {
                write!(f, "detection started, duration {duration_seconds}s")
            }
            SessionEvent::Settling { delay } => {
                write!(f, "first reading detected, settling for {}s", delay.as_secs())
            }
            SessionEvent::RecordingBegan => write!(f, "recording started"),
            SessionEvent::Recorded { second, values } => {
                write!(f, "t={second}s [{}]", join(values))
            }
            SessionEvent::NoData { remaining, reason } => {
                write!(f, "no valid data ({reason}), {remaining}s remaining")
            }
            SessionEvent::Finished(report) => {
                write!(
                    f,
                    "detection finished after {}s{}:",
                    report.recorded_seconds,
                    if report.stopped_early { " (stopped)" } else { "" }
                )?;
                for c in &report.channels {
                    write!(
                        f,
                        " ch{} {:.2}->{:.2} delta {:.2} {};",
                        c.channel,
                        c.initial,
                        c.last,
                        c.delta,
                        c.verdict.as_str()
                    )?;
                }
                Ok(())
            }
            SessionEvent::Aborted => write!(f, "detection failed: no valid data recorded"),
        }
    }
}
