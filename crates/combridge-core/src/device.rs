use std::io::{Read, Write};
use std::os::fd::{AsRawFd, BorrowedFd, RawFd};
use std::time::Duration;

use log::{debug, info};
use serialport::{FlowControl, TTYPort};

use crate::error::DeviceError;
use crate::params::LineSettings;

/// Upper bound on a single device write waiting for room in the output queue.
pub const DEVICE_IO_TIMEOUT: Duration = Duration::from_millis(100);

/// An open, configured serial device. The port is released on `close` or drop.
pub struct Device {
    path: String,
    settings: LineSettings,
    port: Option<TTYPort>,
}

impl Device {
    /// Opens `path` for reading and writing and applies `settings` in one step:
    /// raw input (no parity stripping, no extended processing), the requested
    /// character size, stop bits and parity, and the same input and output rate.
    pub fn open(path: &str, settings: LineSettings) -> Result<Self, DeviceError> {
        let port = serialport::new(path, settings.rate.bits_per_second())
            .data_bits(settings.data_bits)
            .parity(settings.parity)
            .stop_bits(settings.stop_bits)
            .flow_control(FlowControl::None)
            .timeout(DEVICE_IO_TIMEOUT)
            .open_native()
            .map_err(|source| DeviceError::Open {
                path: path.to_string(),
                source,
            })?;

        info!("opened {path} at {settings}");
        Ok(Self {
            path: path.to_string(),
            settings,
            port: Some(port),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn settings(&self) -> &LineSettings {
        &self.settings
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// The raw descriptor of the open port, `None` once closed.
    pub fn handle_id(&self) -> Option<RawFd> {
        self.port.as_ref().map(|p| p.as_raw_fd())
    }

    /// Borrows the descriptor for readiness polling.
    pub fn as_fd(&self) -> Result<BorrowedFd<'_>, DeviceError> {
        let port = self.port.as_ref().ok_or(DeviceError::Closed)?;
        // SAFETY: the descriptor is owned by `port`, which outlives the borrow of `self`.
        Ok(unsafe { BorrowedFd::borrow_raw(port.as_raw_fd()) })
    }

    /// Reads whatever is pending, up to `buf.len()` bytes. Call only after the
    /// poller reported the device readable. Returns 0 when nothing was read.
    pub fn read_available(&mut self, buf: &mut [u8]) -> usize {
        let Some(port) = self.port.as_mut() else {
            return 0;
        };
        match port.read(buf) {
            Ok(n) => n,
            Err(e) => {
                debug!("read from {} failed: {e}", self.path);
                0
            }
        }
    }

    pub fn read_one(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        (self.read_available(&mut byte) == 1).then_some(byte[0])
    }

    /// Writes a prefix of `data` and returns its length; 0 means the device
    /// took nothing.
    pub fn write_some(&mut self, data: &[u8]) -> usize {
        let Some(port) = self.port.as_mut() else {
            return 0;
        };
        match port.write(data) {
            Ok(n) => n,
            Err(e) => {
                debug!("write to {} failed: {e}", self.path);
                0
            }
        }
    }

    pub fn write_one(&mut self, byte: u8) -> bool {
        self.write_some(&[byte]) == 1
    }

    /// Releases the port. Closing an already closed device does nothing.
    pub fn close(&mut self) {
        if self.port.take().is_some() {
            info!("closed {}", self.path);
        }
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        self.close();
    }
}
