use std::time::Duration;

use crossbeam_channel::{Receiver, TryRecvError};
use pressmon_traits::SessionLog;

use crate::batch::Sample;
use crate::error::Result as CoreResult;
use crate::session::SessionController;
use crate::status::{SessionEvent, SessionState};

/// Requests delivered to a running session between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Stop,
}

/// Default tick period: one recorded second.
pub const TICK: Duration = Duration::from_secs(1);

/// Mirror events to the session log and the observer. Log failures are
/// reported and otherwise ignored.
fn emit(
    events: Vec<SessionEvent>,
    log: &mut dyn SessionLog,
    on_event: &mut dyn FnMut(&SessionEvent),
) {
    for ev in events {
        if let Err(e) = log.append(&ev.to_string()) {
            tracing::warn!(error = %e, "session log write failed");
        }
        on_event(&ev);
    }
}

/// Run one session to completion: start, then tick every `tick` on the
/// controller's clock until the duration elapses or `Stop` arrives.
///
/// The wait is not compensated for batch latency, so the real period is
/// `tick` plus however long the batch took. Returns the report, or the
/// `SessionAbort` error when nothing was recorded.
pub fn run_session<S: Sample + ?Sized>(
    controller: &mut SessionController,
    sampler: &mut S,
    log: &mut dyn SessionLog,
    control: &Receiver<Control>,
    tick: Duration,
    mut on_event: impl FnMut(&SessionEvent),
) -> CoreResult<crate::status::SessionReport> {
    let events = controller.start()?;
    emit(events, log, &mut on_event);

    let clock = controller.clock().clone();
    let started = clock.now();
    let mut control_open = true;
    while controller.state() == SessionState::Sampling {
        clock.sleep(tick);

        if control_open {
            match control.try_recv() {
                Ok(Control::Stop) => {
                    let events = controller.stop()?;
                    emit(events, log, &mut on_event);
                    break;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    tracing::debug!("control channel closed; running to completion");
                    control_open = false;
                }
            }
        }

        let events = controller.tick(sampler)?;
        emit(events, log, &mut on_event);
    }

    let outcome = controller.outcome();
    match &outcome {
        Ok(report) => tracing::info!(
            recorded = report.recorded_seconds,
            elapsed_s = clock.secs_since(started),
            passed = report.passed(),
            "session complete"
        ),
        Err(e) => tracing::error!(error = %e, "session aborted"),
    }
    outcome
}
