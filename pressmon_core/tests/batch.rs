use pressmon_core::mocks::ScriptedLink;
use pressmon_core::{
    Backend, BatchSampler, CameraBackend, OcrTextParser, Sample, SerialBackend, SerialLineParser,
    SpatialSorter, aggregate_exact,
};
use pressmon_hardware::{SimulatedCamera, SimulatedDetector, SimulatedSerial};
use pressmon_traits::{BoundingBox, Frame, TextDetector};

fn serial(link: impl pressmon_traits::SerialLink + 'static) -> BatchSampler {
    BatchSampler::new(Backend::Serial(SerialBackend::new(
        Box::new(link),
        SerialLineParser::default(),
    )))
}

fn camera(detector: impl TextDetector + 'static, cam: SimulatedCamera) -> BatchSampler {
    BatchSampler::new(Backend::Camera(CameraBackend::new(
        Box::new(cam),
        Box::new(detector),
        OcrTextParser::default(),
        SpatialSorter::default(),
    )))
}

fn assert_close(got: &[f64], want: &[f64]) {
    assert_eq!(got.len(), want.len(), "{got:?} vs {want:?}");
    for (g, w) in got.iter().zip(want) {
        assert!((g - w).abs() < 1e-9, "{got:?} vs {want:?}");
    }
}

#[test]
fn serial_batch_converts_every_attempt() {
    let mut s = serial(SimulatedSerial::new([0, 4095, 0, 0]));
    let batch = s.sample_batch(5);
    assert_eq!(batch.len(), 5);
    for attempt in &batch {
        assert_close(attempt, &[0.0, 40.0, 0.0, 0.0]);
    }
    assert_eq!(s.counters(), (5, 0));
}

#[test]
fn timed_out_requests_are_skipped() {
    let mut s = serial(SimulatedSerial::new([100, 100, 100, 100]).with_timeout_every(2));
    let batch = s.sample_batch(6);
    assert_eq!(batch.len(), 3);
    assert_eq!(s.counters(), (6, 3));
}

#[test]
fn closed_presence_gate_yields_empty_batch() {
    let mut s = serial(SimulatedSerial::new([100, 100, 100, 100]).with_presence(2000));
    assert!(s.sample_batch(4).is_empty());
    assert_eq!(s.counters(), (4, 4));
}

#[test]
fn scripted_link_mixes_failures_and_readings() {
    let good = "CH0: 0 | CH1: 4095 | CH2: 0 | CH3: 0 | CH4: 0".to_string();
    let link = ScriptedLink::new([
        Ok(good.clone()),
        Err("read timed out".to_string()),
        Ok("garbage".to_string()),
        Ok(good),
    ]);
    let mut s = serial(link);
    let batch = s.sample_batch(5);
    assert_eq!(batch.len(), 2);
    assert_eq!(s.counters(), (5, 3));
}

#[test]
fn disconnected_backend_is_not_queried() {
    let mut s = BatchSampler::new(Backend::Serial(SerialBackend::disconnected(
        SerialLineParser::default(),
    )));
    assert!(!s.backend().is_connected());
    assert!(s.sample_batch(10).is_empty());
    assert_eq!(s.counters(), (0, 0));
}

#[test]
fn disconnect_releases_the_link() {
    let mut s = serial(SimulatedSerial::new([1, 2, 3, 4]));
    assert_eq!(s.sample_batch(2).len(), 2);
    s.disconnect();
    assert!(!s.backend().is_connected());
    assert!(s.sample_batch(2).is_empty());
    assert_eq!(s.backend().kind(), "serial");
}

#[test]
fn camera_batch_reads_grid_in_row_major_order() {
    let det = SimulatedDetector::new(vec![1.05, 20.5, 3.0, 0.5], 2);
    let mut s = camera(det, SimulatedCamera::new(640, 480));
    let batch = s.sample_batch(3);
    assert_eq!(batch.len(), 3);
    for attempt in &batch {
        assert_close(attempt, &[1.05, 20.5, 3.0, 0.5]);
    }
}

#[test]
fn confused_glyphs_are_repaired() {
    let det = SimulatedDetector::new(vec![1.05, 20.5, 3.0, 0.5], 2).with_confusions_every(1);
    let mut s = camera(det, SimulatedCamera::new(640, 480));
    let batch = s.sample_batch(2);
    assert_eq!(batch.len(), 2);
    assert_close(&batch[0], &[1.05, 20.5, 3.0, 0.5]);
}

#[test]
fn failed_captures_are_skipped() {
    let det = SimulatedDetector::new(vec![1.0, 2.0], 2);
    let mut s = camera(det, SimulatedCamera::new(64, 48).with_failure_every(2));
    assert_eq!(s.sample_batch(4).len(), 2);
    assert_eq!(s.counters(), (4, 2));
    assert_eq!(s.backend().kind(), "camera");
}

#[test]
fn missed_reading_is_outvoted_by_the_batch() {
    let det = SimulatedDetector::new(vec![1.0, 2.0, 3.0, 4.0], 2).with_drop_every(3);
    let mut s = camera(det, SimulatedCamera::new(640, 480));
    let batch = s.sample_batch(10);
    assert_eq!(batch.len(), 10);
    assert_eq!(batch.iter().filter(|a| a.len() == 3).count(), 3);
    assert_eq!(aggregate_exact(&batch, 4), Ok(vec![1.0, 2.0, 3.0, 4.0]));
}

#[test]
fn blank_display_yields_nothing() {
    let det = SimulatedDetector::new(Vec::new(), 2);
    let mut s = camera(det, SimulatedCamera::new(64, 48));
    assert!(s.sample_batch(3).is_empty());
    assert_eq!(s.counters(), (3, 3));
}

/// Detector that always returns one unreadable fragment and one reading.
struct HalfReadable;

impl TextDetector for HalfReadable {
    fn detect_text(&mut self, _frame: &Frame) -> Vec<(BoundingBox, String)> {
        vec![
            (BoundingBox::from_rect(0.0, 0.0, 60.0, 30.0), "##".to_string()),
            (BoundingBox::from_rect(100.0, 0.0, 60.0, 30.0), "1234".to_string()),
        ]
    }
}

#[test]
fn unreadable_fragments_are_dropped() {
    let mut s = camera(HalfReadable, SimulatedCamera::new(64, 48));
    let batch = s.sample_batch(2);
    assert_eq!(batch, vec![vec![12.34], vec![12.34]]);
}
