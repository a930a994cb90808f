use std::fmt;

use log::{log_enabled, trace, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Device to standard output.
    ToConsole,
    /// Standard input to device.
    ToDevice,
}

/// Byte counters for one bridge session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrafficStats {
    pub to_console: u64,
    pub to_device: u64,
    /// Console bytes the device refused to take.
    pub dropped: u64,
}

impl TrafficStats {
    pub fn record(&mut self, direction: Direction, data: &[u8]) {
        match direction {
            Direction::ToConsole => self.to_console += data.len() as u64,
            Direction::ToDevice => self.to_device += data.len() as u64,
        }
        if log_enabled!(Level::Trace) {
            let prefix = match direction {
                Direction::ToConsole => "RX",
                Direction::ToDevice => "TX",
            };
            trace!("{prefix}: {}", hex::encode_upper(data));
        }
    }

    pub fn record_dropped(&mut self, count: usize) {
        self.dropped += count as u64;
    }
}

impl fmt::Display for TrafficStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bytes to console, {} bytes to device, {} dropped",
            self.to_console, self.to_device, self.dropped
        )
    }
}
