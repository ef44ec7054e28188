//! Human-readable error descriptions and structured JSON error formatting.

use pressmon_core::error::{AggregationFailure, BuildError, MonitorError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML or on the command line.\nHow to fix: Edit the config file or the overrides, then rerun."
            ),
        };
    }

    if let Some(me) = err.downcast_ref::<MonitorError>() {
        return match me {
            MonitorError::SessionAbort => {
                "What happened: Detection failed, no valid data was recorded.\nLikely causes: Nothing attached (presence gate closed), display not in view, or every request timed out.\nHow to fix: Check the sensor connection or camera framing, then run `pressmon self-check`.".to_string()
            }
            MonitorError::Calibration(AggregationFailure::NoData) => {
                "What happened: Calibration failed, no valid readings in the batch.\nLikely causes: Device not answering or presence gate closed; the previous baseline is still in use.\nHow to fix: Verify the backend with `pressmon self-check` and calibrate again.".to_string()
            }
            MonitorError::Calibration(f @ AggregationFailure::LengthMismatch { .. }) => format!(
                "What happened: Calibration failed ({f}).\nLikely causes: channels.count does not match what the device or display reports; the previous baseline is still in use.\nHow to fix: Set channels.count to the number of readings on the display and calibrate again."
            ),
            MonitorError::State(msg) => format!(
                "What happened: Operation not allowed right now ({msg}).\nLikely causes: A session is still running.\nHow to fix: Wait for the session to finish or stop it first."
            ),
            MonitorError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("handshake") {
        return "What happened: The device on the serial port did not answer the handshake.\nLikely causes: Wrong port, wrong baud rate, or firmware not running.\nHow to fix: Run `pressmon list-ports`, check backend.port and backend.baud_rate.".to_string();
    }

    if lower.contains("open serial port") || lower.contains("hardware` feature") {
        return format!(
            "What happened: Failed to open the serial port ({msg}).\nLikely causes: Port name wrong, device unplugged, missing permissions, or a build without serial support.\nHow to fix: Run `pressmon list-ports`; build with `--features hardware` for real devices."
        );
    }

    if lower.contains("invalid configuration") || lower.contains("read config") {
        let mut detail = String::new();
        for cause in err.chain().skip(1) {
            detail = format!(" ({cause})");
        }
        return format!(
            "What happened: Configuration is invalid or unreadable{detail}.\nLikely causes: Missing file, TOML syntax error, or out-of-range values.\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Baseline CSV header special-case
    if lower.contains("baseline csv must have headers") {
        return "Invalid headers in baseline CSV. Expected 'channel,baseline'.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 for an aborted session, 4 for a failed calibration, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<MonitorError>() {
        Some(MonitorError::SessionAbort) => 3,
        Some(MonitorError::Calibration(_)) => 4,
        _ => 1,
    }
}

pub fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(me) = err.downcast_ref::<MonitorError>() {
        return match me {
            MonitorError::SessionAbort => "SessionAbort",
            MonitorError::Calibration(_) => "Calibration",
            MonitorError::State(_) => "State",
            MonitorError::Config(_) => "Config",
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "Config";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let msg = humanize(err);
    match err.downcast_ref::<MonitorError>() {
        Some(MonitorError::Calibration(f)) => json!({
            "reason": reason_name(err),
            "details": { "failure": f.to_string() },
            "message": msg,
        })
        .to_string(),
        _ => json!({ "reason": reason_name(err), "message": msg }).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_maps_to_exit_code_3() {
        let e = eyre::Report::new(MonitorError::SessionAbort);
        assert_eq!(exit_code_for_error(&e), 3);
        assert!(humanize(&e).starts_with("What happened: Detection failed"));
    }

    #[test]
    fn calibration_failure_json_carries_the_reason() {
        let e = eyre::Report::new(MonitorError::Calibration(AggregationFailure::NoData));
        assert_eq!(exit_code_for_error(&e), 4);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&e)).unwrap();
        assert_eq!(v["reason"], "Calibration");
        assert!(v["details"]["failure"].is_string());
    }

    #[test]
    fn wrapped_typed_errors_are_still_recognized() {
        use eyre::WrapErr;
        let e: eyre::Result<()> = Err(eyre::Report::new(MonitorError::SessionAbort));
        let e = e.wrap_err("detect").unwrap_err();
        assert_eq!(exit_code_for_error(&e), 3);
    }

    #[test]
    fn unknown_errors_fall_back_to_generic_text() {
        let e = eyre::eyre!("disk on fire");
        assert_eq!(exit_code_for_error(&e), 1);
        assert!(humanize(&e).contains("Original: disk on fire"));
    }
}
