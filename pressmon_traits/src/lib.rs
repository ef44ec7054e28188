pub mod clock;
pub mod geometry;

pub use clock::{Clock, MonotonicClock};
pub use geometry::{BoundingBox, Frame, Point};

/// A line-oriented request/response link to the acquisition MCU.
///
/// One `request_line` is one round-trip: write the data request, read one
/// reply line. Implementations bound the read with their own timeout.
pub trait SerialLink {
    fn request_line(&mut self) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
    fn disconnect(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Source of still frames showing the instrument display.
pub trait Camera {
    fn capture_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error + Send + Sync>>;
}

/// Opaque text detector + recognizer. Returns zero or more detected regions
/// with their raw recognized text, in no particular order.
pub trait TextDetector {
    fn detect_text(&mut self, frame: &Frame) -> Vec<(BoundingBox, String)>;
}

/// Append-only, timestamped session log. One line per call.
pub trait SessionLog {
    fn append(&mut self, line: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: SerialLink + ?Sized> SerialLink for Box<T> {
    fn request_line(&mut self) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        (**self).request_line()
    }
    fn disconnect(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).disconnect()
    }
}

impl<T: Camera + ?Sized> Camera for Box<T> {
    fn capture_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error + Send + Sync>> {
        (**self).capture_frame()
    }
}

impl<T: TextDetector + ?Sized> TextDetector for Box<T> {
    fn detect_text(&mut self, frame: &Frame) -> Vec<(BoundingBox, String)> {
        (**self).detect_text(frame)
    }
}

impl<T: SessionLog + ?Sized> SessionLog for Box<T> {
    fn append(&mut self, line: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).append(line)
    }
}
