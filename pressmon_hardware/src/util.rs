use std::io::{ErrorKind, Read};
use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Read bytes from `reader` until a `\n` arrives or `timeout` expires, and
/// return the line with surrounding whitespace trimmed.
///
/// Transient `TimedOut`/`WouldBlock`/`Interrupted` reads are retried until the
/// deadline. End of stream before any byte is a timeout; end of stream after
/// some bytes returns what was read.
pub fn read_line_with_timeout<R: Read + ?Sized>(reader: &mut R, timeout: Duration) -> Result<String> {
    let deadline = Instant::now() + timeout;
    let mut line = Vec::with_capacity(64);
    let mut byte = [0u8; 1];
    loop {
        if Instant::now() >= deadline {
            return Err(HwError::Timeout);
        }
        match reader.read(&mut byte) {
            Ok(0) => {
                if line.is_empty() {
                    return Err(HwError::Timeout);
                }
                break;
            }
            Ok(_) => {
                if byte[0] == b'\n' {
                    break;
                }
                line.push(byte[0]);
            }
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                continue;
            }
            Err(e) => return Err(HwError::Io(e)),
        }
    }
    let text = String::from_utf8(line).map_err(|e| HwError::Serial(format!("invalid utf-8: {e}")))?;
    Ok(text.trim().to_string())
}
