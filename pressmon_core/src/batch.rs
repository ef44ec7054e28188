//! Batch acquisition: N attempts against one backend, failures skipped.

use pressmon_traits::{Camera, SerialLink, TextDetector};
use tracing::{debug, info, trace, warn};

use crate::error::{AcquisitionError, ParseError};
use crate::hw_error::map_hw_error;
use crate::layout::SpatialSorter;
use crate::parser::{OcrTextParser, SerialLineParser};

/// Anything that can produce a batch of attempt vectors.
///
/// Each returned vector holds the readings of one successful attempt, in
/// channel order. Failed attempts are simply absent.
pub trait Sample {
    fn sample_batch(&mut self, n: usize) -> Vec<Vec<f64>>;
}

impl<S: Sample + ?Sized> Sample for Box<S> {
    fn sample_batch(&mut self, n: usize) -> Vec<Vec<f64>> {
        (**self).sample_batch(n)
    }
}

/// Why one attempt produced nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptSkip {
    Acquisition(AcquisitionError),
    Parse(ParseError),
    /// Serial line well formed but CH0 says nothing is attached.
    Absent(String),
}

impl std::fmt::Display for AttemptSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptSkip::Acquisition(e) => write!(f, "{e}"),
            AttemptSkip::Parse(e) => write!(f, "{e}"),
            AttemptSkip::Absent(line) => write!(f, "presence gate closed: {line:?}"),
        }
    }
}

pub struct SerialBackend {
    link: Option<Box<dyn SerialLink>>,
    parser: SerialLineParser,
}

impl SerialBackend {
    pub fn new(link: Box<dyn SerialLink>, parser: SerialLineParser) -> Self {
        Self {
            link: Some(link),
            parser,
        }
    }

    /// A backend with no link; every batch comes back empty.
    pub fn disconnected(parser: SerialLineParser) -> Self {
        Self { link: None, parser }
    }

    fn attempt(&mut self) -> Result<Vec<f64>, AttemptSkip> {
        let link = self
            .link
            .as_mut()
            .ok_or(AttemptSkip::Acquisition(AcquisitionError::NotConnected))?;
        let line = link
            .request_line()
            .map_err(|e| AttemptSkip::Acquisition(map_hw_error(&*e)))?;
        trace!(line = %line, "serial line");
        match self.parser.parse(&line) {
            Ok(Some(values)) => Ok(values),
            Ok(None) => Err(AttemptSkip::Absent(line)),
            Err(e) => Err(AttemptSkip::Parse(e)),
        }
    }
}

pub struct CameraBackend {
    camera: Option<Box<dyn Camera>>,
    detector: Box<dyn TextDetector>,
    parser: OcrTextParser,
    sorter: SpatialSorter,
}

impl CameraBackend {
    pub fn new(
        camera: Box<dyn Camera>,
        detector: Box<dyn TextDetector>,
        parser: OcrTextParser,
        sorter: SpatialSorter,
    ) -> Self {
        Self {
            camera: Some(camera),
            detector,
            parser,
            sorter,
        }
    }

    fn attempt(&mut self) -> Result<Vec<f64>, AttemptSkip> {
        let camera = self
            .camera
            .as_mut()
            .ok_or(AttemptSkip::Acquisition(AcquisitionError::NotConnected))?;
        let frame = camera
            .capture_frame()
            .map_err(|e| AttemptSkip::Acquisition(map_hw_error(&*e)))?;
        let detections = self.detector.detect_text(&frame);
        if detections.is_empty() {
            return Err(AttemptSkip::Acquisition(AcquisitionError::NoDetections));
        }

        let mut first_error = None;
        let mut readings = Vec::with_capacity(detections.len());
        for (bbox, text) in detections {
            match self.parser.parse(&text) {
                Ok(v) => readings.push((bbox, v)),
                Err(e) => {
                    trace!(text = %text, error = %e, "fragment dropped");
                    first_error.get_or_insert(e);
                }
            }
        }
        if readings.is_empty() {
            return Err(match first_error {
                Some(e) => AttemptSkip::Parse(e),
                None => AttemptSkip::Acquisition(AcquisitionError::NoDetections),
            });
        }
        Ok(self.sorter.sort(readings).into_iter().map(|(_, v)| v).collect())
    }
}

/// The active sensing backend, chosen once when the session is configured.
pub enum Backend {
    Serial(SerialBackend),
    Camera(CameraBackend),
}

impl Backend {
    pub fn kind(&self) -> &'static str {
        match self {
            Backend::Serial(_) => "serial",
            Backend::Camera(_) => "camera",
        }
    }

    pub fn is_connected(&self) -> bool {
        match self {
            Backend::Serial(s) => s.link.is_some(),
            Backend::Camera(c) => c.camera.is_some(),
        }
    }

    /// Release the device. Later batches are empty.
    pub fn disconnect(&mut self) {
        match self {
            Backend::Serial(s) => {
                if let Some(mut link) = s.link.take()
                    && let Err(e) = link.disconnect()
                {
                    warn!(error = %e, "serial disconnect failed");
                }
            }
            Backend::Camera(c) => {
                c.camera = None;
            }
        }
        info!(backend = self.kind(), "backend disconnected");
    }

    fn attempt(&mut self) -> Result<Vec<f64>, AttemptSkip> {
        match self {
            Backend::Serial(s) => s.attempt(),
            Backend::Camera(c) => c.attempt(),
        }
    }
}

/// Runs batches of attempts against the injected backend.
pub struct BatchSampler {
    backend: Backend,
    attempts: u64,
    skipped: u64,
}

impl BatchSampler {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            attempts: 0,
            skipped: 0,
        }
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn disconnect(&mut self) {
        self.backend.disconnect();
    }

    /// Total attempts issued and how many of them were skipped.
    pub fn counters(&self) -> (u64, u64) {
        (self.attempts, self.skipped)
    }
}

impl Sample for BatchSampler {
    fn sample_batch(&mut self, n: usize) -> Vec<Vec<f64>> {
        if !self.backend.is_connected() {
            debug!(backend = self.backend.kind(), "backend not connected; empty batch");
            return Vec::new();
        }
        let mut out = Vec::with_capacity(n);
        for attempt in 0..n {
            self.attempts += 1;
            match self.backend.attempt() {
                Ok(values) if !values.is_empty() => out.push(values),
                Ok(_) => self.skipped += 1,
                Err(skip) => {
                    self.skipped += 1;
                    debug!(attempt, reason = %skip, "attempt skipped");
                }
            }
        }
        trace!(requested = n, kept = out.len(), "batch done");
        out
    }
}
