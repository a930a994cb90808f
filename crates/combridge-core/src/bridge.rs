//! The polling loop that relays bytes between a device and the console.

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use crossbeam_channel::Receiver;
use log::{info, warn};

use crate::device::Device;
use crate::error::{DeviceError, Result};
use crate::poller::{is_readable, DEFAULT_POLL_TIMEOUT};
use crate::traffic::{Direction, TrafficStats};

#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Longest wait for device data per iteration.
    pub poll_timeout: Duration,
    /// Most bytes moved per direction per iteration.
    pub chunk_size: usize,
    /// End the loop when console input reaches end of file.
    pub stop_on_console_eof: bool,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            chunk_size: 1,
            stop_on_console_eof: true,
        }
    }
}

/// Why `Bridge::run` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeExit {
    Stopped,
    ConsoleClosed,
}

pub struct Bridge<I, O> {
    device: Device,
    input: I,
    output: O,
    options: BridgeOptions,
    stats: TrafficStats,
    buf: Vec<u8>,
    input_open: bool,
}

impl<I: Read, O: Write> Bridge<I, O> {
    pub fn new(device: Device, input: I, output: O, options: BridgeOptions) -> Self {
        let buf = vec![0u8; options.chunk_size.max(1)];
        Self {
            device,
            input,
            output,
            options,
            stats: TrafficStats::default(),
            buf,
            input_open: true,
        }
    }

    /// Announces readiness: writes the device handle id as a single byte.
    ///
    /// Ids above 255 are truncated to their low byte.
    pub fn handshake(&mut self) -> Result<u8> {
        let id = self.device.handle_id().ok_or(DeviceError::Closed)?;
        if !(0..=255).contains(&id) {
            warn!("handle id {id} does not fit in the handshake byte");
        }
        let byte = id as u8;
        self.output.write_all(&[byte])?;
        self.output.flush()?;
        Ok(byte)
    }

    /// Relays bytes until a stop request arrives on `stop` or, if configured,
    /// console input ends. A disconnected `stop` channel is not a request.
    pub fn run(&mut self, stop: &Receiver<()>) -> Result<BridgeExit> {
        let exit = loop {
            if stop.try_recv().is_ok() {
                break BridgeExit::Stopped;
            }
            if let Some(exit) = self.step()? {
                break exit;
            }
        };
        info!("bridge on {} finished ({exit:?}): {}", self.device.path(), self.stats);
        Ok(exit)
    }

    /// One iteration: device to console first, then console to device.
    pub fn step(&mut self) -> Result<Option<BridgeExit>> {
        self.forward_to_console()?;
        self.forward_to_device()
    }

    fn forward_to_console(&mut self) -> Result<()> {
        if !is_readable(self.device.as_fd()?, self.options.poll_timeout)? {
            return Ok(());
        }
        let n = self.device.read_available(&mut self.buf);
        if n == 0 {
            return Ok(());
        }
        let data = &self.buf[..n];
        self.output.write_all(data)?;
        self.output.flush()?;
        self.stats.record(Direction::ToConsole, data);
        Ok(())
    }

    fn forward_to_device(&mut self) -> Result<Option<BridgeExit>> {
        if !self.input_open {
            return Ok(None);
        }
        let n = match self.input.read(&mut self.buf) {
            Ok(0) => {
                self.input_open = false;
                info!("console input closed");
                return Ok(self
                    .options
                    .stop_on_console_eof
                    .then_some(BridgeExit::ConsoleClosed));
            }
            Ok(n) => n,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let data = &self.buf[..n];
        let mut written = 0;
        while written < n {
            match self.device.write_some(&data[written..]) {
                0 => break,
                w => written += w,
            }
        }
        self.stats.record(Direction::ToDevice, &data[..written]);
        if written < n {
            warn!("{} dropped {} byte(s)", self.device.path(), n - written);
            self.stats.record_dropped(n - written);
        }
        Ok(None)
    }

    pub fn stats(&self) -> TrafficStats {
        self.stats
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn into_parts(self) -> (Device, I, O) {
        (self.device, self.input, self.output)
    }
}
