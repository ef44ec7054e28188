//! OCR detector that replays recorded detections from a JSON-lines file.
//!
//! Each non-empty line is one frame's detections:
//!
//! ```text
//! [{"box": [[40,40],[100,40],[100,70],[40,70]], "text": "105"}, ...]
//! ```
//!
//! Lines are served in order, one per `detect_text` call, wrapping around
//! at the end of the file.

use std::path::Path;

use eyre::WrapErr;
use pressmon_traits::{BoundingBox, Frame, Point, TextDetector};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Detection {
    #[serde(rename = "box")]
    corners: [[f64; 2]; 4],
    text: String,
}

impl Detection {
    fn into_pair(self) -> (BoundingBox, String) {
        let corners = self.corners.map(|[x, y]| Point::new(x, y));
        (BoundingBox::new(corners), self.text)
    }
}

#[derive(Debug, Clone)]
pub struct ReplayDetector {
    frames: Vec<Vec<(BoundingBox, String)>>,
    next: usize,
}

impl ReplayDetector {
    pub fn parse(text: &str) -> eyre::Result<Self> {
        let mut frames = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let dets: Vec<Detection> = serde_json::from_str(line)
                .wrap_err_with(|| format!("invalid replay line {}", i + 1))?;
            frames.push(dets.into_iter().map(Detection::into_pair).collect());
        }
        if frames.is_empty() {
            eyre::bail!("replay file has no frames");
        }
        Ok(Self { frames, next: 0 })
    }

    pub fn load(path: &Path) -> eyre::Result<Self> {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("read replay file {}", path.display()))?;
        Self::parse(&text).wrap_err_with(|| format!("replay file {}", path.display()))
    }

    pub fn frames(&self) -> usize {
        self.frames.len()
    }
}

impl TextDetector for ReplayDetector {
    fn detect_text(&mut self, _frame: &Frame) -> Vec<(BoundingBox, String)> {
        let out = self.frames[self.next].clone();
        self.next = (self.next + 1) % self.frames.len();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_FRAMES: &str = r#"
[{"box": [[40,40],[100,40],[100,70],[40,70]], "text": "105"}, {"box": [[160,40],[220,40],[220,70],[160,70]], "text": "2O5O"}]

[]
"#;

    #[test]
    fn frames_are_served_in_order_and_wrap() {
        let mut d = ReplayDetector::parse(TWO_FRAMES).unwrap();
        assert_eq!(d.frames(), 2);
        let f = Frame::default();
        let first = d.detect_text(&f);
        assert_eq!(first.len(), 2);
        assert_eq!(first[1].1, "2O5O");
        assert_eq!(first[0].0, BoundingBox::from_rect(40.0, 40.0, 60.0, 30.0));
        assert!(d.detect_text(&f).is_empty());
        assert_eq!(d.detect_text(&f).len(), 2);
    }

    #[test]
    fn bad_line_is_reported_with_its_number() {
        let err = ReplayDetector::parse("[]\n{\"text\": 1}\n").unwrap_err();
        assert!(format!("{err}").contains("line 2"), "{err}");
    }

    #[test]
    fn empty_file_is_rejected() {
        assert!(ReplayDetector::parse("\n  \n").is_err());
    }
}
