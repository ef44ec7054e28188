use std::io::Write;
use std::time::Duration;

use pressmon_traits::SerialLink;
use serialport::{ClearBuffer, SerialPort};
use tracing::{debug, info, trace, warn};

use crate::SerialOpts;
use crate::error::{HwError, Result};
use crate::util::read_line_with_timeout;

const HANDSHAKE: &[u8] = b"FS connect\n";
const HANDSHAKE_OK: &str = "connect success";
const DATA_REQUEST: &[u8] = b"data request\n";

/// Serial link to the acquisition MCU.
///
/// The port is held in an `Option` so `disconnect` can close it while the
/// value stays owned by the sampler; later requests fail with `NotConnected`.
pub struct SerialDevice {
    name: String,
    port: Option<Box<dyn SerialPort>>,
    read_timeout: Duration,
}

impl SerialDevice {
    /// Open `port_name` and perform the MCU handshake.
    pub fn connect(port_name: &str, opts: &SerialOpts) -> Result<Self> {
        let mut port = serialport::new(port_name, opts.baud_rate)
            .timeout(opts.read_timeout)
            .open()
            .map_err(|e| HwError::Serial(format!("open {port_name}: {e}")))?;

        port.write_all(HANDSHAKE)?;
        port.flush()?;
        let reply = read_line_with_timeout(&mut *port, opts.read_timeout)?;
        if !reply.contains(HANDSHAKE_OK) {
            warn!(port = port_name, reply = %reply, "handshake rejected");
            return Err(HwError::Handshake(reply));
        }
        info!(port = port_name, baud = opts.baud_rate, "serial device connected");

        Ok(Self {
            name: port_name.to_string(),
            port: Some(port),
            read_timeout: opts.read_timeout,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    fn request(&mut self) -> Result<String> {
        let port = self.port.as_mut().ok_or(HwError::NotConnected)?;
        // Stale replies from an earlier timed-out request would shift every line by one.
        if let Err(e) = port.clear(ClearBuffer::Input) {
            debug!(error = %e, "input buffer clear failed");
        }
        port.write_all(DATA_REQUEST)?;
        port.flush()?;
        let line = read_line_with_timeout(&mut **port, self.read_timeout)?;
        trace!(line = %line, "serial reply");
        Ok(line)
    }
}

impl SerialLink for SerialDevice {
    fn request_line(&mut self) -> std::result::Result<String, Box<dyn std::error::Error + Send + Sync>> {
        self.request().map_err(Into::into)
    }

    fn disconnect(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.port.take().is_some() {
            info!(port = %self.name, "serial device disconnected");
        }
        Ok(())
    }
}

/// Names of the serial ports the OS currently reports.
pub fn list_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports().map_err(|e| HwError::Serial(e.to_string()))?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}
