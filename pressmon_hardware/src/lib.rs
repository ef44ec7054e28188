pub mod error;
pub mod util;

#[cfg(feature = "hardware")]
pub mod serial;

use std::time::Duration;

use pressmon_traits::{BoundingBox, Camera, Frame, SerialLink, TextDetector};

use crate::error::HwError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Serial port parameters used by `SerialDevice::connect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialOpts {
    pub baud_rate: u32,
    pub read_timeout: Duration,
}

impl Default for SerialOpts {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            read_timeout: Duration::from_secs(1),
        }
    }
}

/// Small xorshift generator so the simulators stay deterministic per seed.
#[derive(Debug, Clone)]
struct Jitter(u64);

impl Jitter {
    fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Uniform integer in `[-amp, amp]`.
    fn spread(&mut self, amp: u32) -> i64 {
        if amp == 0 {
            return 0;
        }
        let span = 2 * u64::from(amp) + 1;
        (self.next_u64() % span) as i64 - i64::from(amp)
    }
}

/// Simulated acquisition MCU answering data requests with ADC lines.
///
/// Produces `CH0: p | CH1: a | CH2: b | CH3: c | CH4: d` where CH0 is the
/// presence sentinel and CH1..CH4 are the base counts plus drift and noise.
#[derive(Debug, Clone)]
pub struct SimulatedSerial {
    presence: u32,
    base: [u32; 4],
    noise: u32,
    drift_per_request: i64,
    timeout_every: Option<u64>,
    requests: u64,
    jitter: Jitter,
    connected: bool,
}

impl SimulatedSerial {
    pub fn new(base: [u32; 4]) -> Self {
        Self {
            presence: 500,
            base,
            noise: 0,
            drift_per_request: 0,
            timeout_every: None,
            requests: 0,
            jitter: Jitter::new(0x5eed),
            connected: true,
        }
    }

    /// Value reported on CH0.
    pub fn with_presence(mut self, ch0: u32) -> Self {
        self.presence = ch0;
        self
    }

    /// Uniform per-channel noise of `+-amp` counts.
    pub fn with_noise(mut self, amp: u32, seed: u64) -> Self {
        self.noise = amp;
        self.jitter = Jitter::new(seed);
        self
    }

    pub fn with_drift(mut self, counts_per_request: i64) -> Self {
        self.drift_per_request = counts_per_request;
        self
    }

    /// Every `n`th request times out instead of answering.
    pub fn with_timeout_every(mut self, n: u64) -> Self {
        self.timeout_every = (n > 0).then_some(n);
        self
    }

    pub fn requests(&self) -> u64 {
        self.requests
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn line(&mut self) -> String {
        let drift = self.drift_per_request.saturating_mul(self.requests as i64);
        let mut fields = vec![format!("CH0: {}", self.presence)];
        for (i, base) in self.base.iter().enumerate() {
            let v = (i64::from(*base) + drift + self.jitter.spread(self.noise)).clamp(0, 4095);
            fields.push(format!("CH{}: {v}", i + 1));
        }
        fields.join(" | ")
    }
}

impl SerialLink for SimulatedSerial {
    fn request_line(&mut self) -> Result<String, BoxError> {
        if !self.connected {
            return Err(HwError::NotConnected.into());
        }
        self.requests += 1;
        if hits(self.timeout_every, self.requests) {
            tracing::trace!(request = self.requests, "simulated serial timeout");
            return Err(HwError::Timeout.into());
        }
        let line = self.line();
        tracing::trace!(line = %line, "simulated serial reply");
        Ok(line)
    }

    fn disconnect(&mut self) -> Result<(), BoxError> {
        self.connected = false;
        Ok(())
    }
}

/// Camera producing blank frames of a fixed size.
#[derive(Debug, Clone)]
pub struct SimulatedCamera {
    width: u32,
    height: u32,
    fail_every: Option<u64>,
    captures: u64,
}

impl SimulatedCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fail_every: None,
            captures: 0,
        }
    }

    /// Every `n`th capture fails with a camera error.
    pub fn with_failure_every(mut self, n: u64) -> Self {
        self.fail_every = (n > 0).then_some(n);
        self
    }

    pub fn captures(&self) -> u64 {
        self.captures
    }
}

impl Camera for SimulatedCamera {
    fn capture_frame(&mut self) -> Result<Frame, BoxError> {
        self.captures += 1;
        if hits(self.fail_every, self.captures) {
            return Err(HwError::Camera(format!("frame {} dropped", self.captures)).into());
        }
        Ok(Frame {
            width: self.width,
            height: self.height,
            data: vec![0; (self.width as usize) * (self.height as usize)],
        })
    }
}

/// Text detector that "sees" a grid of two-decimal display readings.
///
/// Each value is rendered the way the display's OCR output looks: two
/// decimals with the point lost (`1.05` -> `"105"`). Boxes are returned in
/// reverse reading order so consumers must sort them.
#[derive(Debug, Clone)]
pub struct SimulatedDetector {
    values: Vec<f64>,
    columns: usize,
    cell: (f64, f64),
    origin: (f64, f64),
    confuse_every: Option<u64>,
    drop_every: Option<u64>,
    calls: u64,
}

impl SimulatedDetector {
    pub fn new(values: Vec<f64>, columns: usize) -> Self {
        Self {
            values,
            columns: columns.max(1),
            cell: (60.0, 30.0),
            origin: (40.0, 40.0),
            confuse_every: None,
            drop_every: None,
            calls: 0,
        }
    }

    pub fn set_values(&mut self, values: Vec<f64>) {
        self.values = values;
    }

    /// Every `n`th detection swaps digits for look-alike glyphs.
    pub fn with_confusions_every(mut self, n: u64) -> Self {
        self.confuse_every = (n > 0).then_some(n);
        self
    }

    /// Every `n`th detection misses the last reading.
    pub fn with_drop_every(mut self, n: u64) -> Self {
        self.drop_every = (n > 0).then_some(n);
        self
    }

    fn box_for(&self, index: usize) -> BoundingBox {
        let (cw, ch) = self.cell;
        let row = index / self.columns;
        let col = index % self.columns;
        // 2x cell pitch leaves a gap of one cell between neighbours.
        let x = self.origin.0 + col as f64 * cw * 2.0;
        let y = self.origin.1 + row as f64 * ch * 2.0;
        BoundingBox::from_rect(x, y, cw, ch)
    }
}

fn display_text(value: f64) -> String {
    format!("{value:.2}").replace('.', "")
}

fn confuse(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '0' => 'O',
            '1' => 'l',
            '5' => 'S',
            '8' => 'B',
            other => other,
        })
        .collect()
}

fn hits(every: Option<u64>, count: u64) -> bool {
    every.is_some_and(|n| count % n == 0)
}

impl TextDetector for SimulatedDetector {
    fn detect_text(&mut self, _frame: &Frame) -> Vec<(BoundingBox, String)> {
        self.calls += 1;
        let mut count = self.values.len();
        if hits(self.drop_every, self.calls) {
            count = count.saturating_sub(1);
        }
        let confused = hits(self.confuse_every, self.calls);
        let mut out: Vec<(BoundingBox, String)> = self.values[..count]
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let text = display_text(*v);
                let text = if confused { confuse(&text) } else { text };
                (self.box_for(i), text)
            })
            .collect();
        out.reverse();
        out
    }
}
