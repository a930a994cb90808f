//! Core functionalities: line parameters, serial device, readiness polling, the bridge loop.

pub mod bridge;
pub mod console;
pub mod device;
pub mod error;
pub mod params;
pub mod poller;
pub mod traffic;

pub use bridge::{Bridge, BridgeExit, BridgeOptions};
pub use console::NonBlockingStdin;
pub use device::Device;
pub use error::{ConfigError, DeviceError, Error, ReadinessError, Result};
pub use params::{BaudRate, LineSettings};
pub use poller::{is_readable, DEFAULT_POLL_TIMEOUT};
pub use traffic::{Direction, TrafficStats};
