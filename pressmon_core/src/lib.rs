#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Acquisition, denoising and calibration pipeline (hardware-agnostic).
//!
//! All device access goes through the `pressmon_traits` capabilities
//! (`SerialLink`, `Camera`, `TextDetector`, `SessionLog`).
//!
//! ## Pipeline
//!
//! - **Units**: ADC count -> voltage -> current -> pressure (`units`)
//! - **Parsing**: serial reply lines and OCR fragments (`parser`)
//! - **Layout**: OCR boxes into reading order (`layout`)
//! - **Batching**: N attempts per second against one backend (`batch`)
//! - **Aggregation**: majority-length filter + per-channel median (`aggregate`)
//! - **Calibration**: zero baseline subtraction (`calibration`)
//! - **Session**: timed sampling state machine and pass/fail (`session`)
//!
//! `runner` drives a session on a tick; `record` and `logger` persist it.

pub mod aggregate;
pub mod atomic;
pub mod batch;
pub mod calibration;
pub mod config;
pub mod conversions;
pub mod error;
pub mod hw_error;
pub mod layout;
pub mod logger;
pub mod mocks;
pub mod parser;
pub mod record;
pub mod runner;
pub mod session;
pub mod status;
pub mod units;
pub mod util;

pub use aggregate::{aggregate, aggregate_exact};
pub use batch::{Backend, BatchSampler, CameraBackend, Sample, SerialBackend};
pub use calibration::CalibrationStore;
pub use config::{ClockStart, SamplingCfg, SessionCfg};
pub use error::{AcquisitionError, AggregationFailure, BuildError, MonitorError, ParseError, Result};
pub use layout::{LayoutTuning, SpatialSorter};
pub use parser::{DisplayPolicy, FixedPointDisplay, OcrTextParser, SerialLineParser};
pub use session::{SessionController, SessionControllerBuilder};
pub use status::{ChannelResult, SessionEvent, SessionReport, SessionState, Verdict};
pub use units::UnitConverter;
