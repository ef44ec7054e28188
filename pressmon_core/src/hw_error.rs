//! Maps `Box<dyn Error>` from trait boundaries to typed `AcquisitionError`.
//!
//! The traits in `pressmon_traits` use `Box<dyn Error + Send + Sync>` so any
//! collaborator can plug in; this module converts those to our typed error,
//! with an optional feature-gated path for `pressmon_hardware::HwError`.

use crate::error::AcquisitionError;

/// Map a trait-boundary error to a typed `AcquisitionError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> AcquisitionError {
    #[cfg(feature = "hardware-errors")]
    {
        use pressmon_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout => AcquisitionError::Timeout,
                HwError::NotConnected => AcquisitionError::NotConnected,
                other => AcquisitionError::Io(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") {
        AcquisitionError::Timeout
    } else if lower.contains("not connected") {
        AcquisitionError::NotConnected
    } else {
        AcquisitionError::Io(s)
    }
}
