#![no_main]
use libfuzzer_sys::fuzz_target;
use pressmon_core::{OcrTextParser, SerialLineParser};

fuzz_target!(|data: &str| {
    if let Ok(Some(values)) = SerialLineParser::default().parse(data) {
        assert_eq!(values.len(), 4);
    }
    if let Ok(v) = OcrTextParser::default().parse(data) {
        assert!(v.is_finite());
    }
});
