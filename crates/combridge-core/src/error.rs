use thiserror::Error;

/// A textual line parameter that does not name a supported setting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is an invalid baud rate")]
    InvalidRate(String),
    #[error("{0} is an invalid parity")]
    InvalidParity(String),
    #[error("{0} is an invalid number of databits")]
    InvalidDataBits(String),
    #[error("{0} is an invalid number of stopbits")]
    InvalidStopBits(String),
}

#[derive(Debug, Error)]
pub enum DeviceError {
    /// Opening the port, setting its speed, or applying the line attributes failed.
    #[error("couldn't open port {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: serialport::Error,
    },
    #[error("device is closed")]
    Closed,
}

/// The device could not be checked for inbound data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReadinessError {
    #[error("poll failed: {0}")]
    Poll(#[from] nix::errno::Errno),
    #[error("device hung up")]
    Hangup,
    #[error("descriptor is not open")]
    Invalid,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error("failed in checking if the port had data ready: {0}")]
    Readiness(#[from] ReadinessError),
    #[error("console i/o failed: {0}")]
    Console(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
