//! Translation of textual line parameters into device-level settings.

use std::fmt;

use serialport::{DataBits, Parity, StopBits};

use crate::error::ConfigError;

/// The standard speeds a port can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaudRate {
    B50,
    B75,
    B110,
    B134,
    B150,
    B200,
    B300,
    B600,
    B1200,
    B1800,
    B2400,
    B4800,
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
}

impl BaudRate {
    pub const ALL: [BaudRate; 17] = [
        Self::B50,
        Self::B75,
        Self::B110,
        Self::B134,
        Self::B150,
        Self::B200,
        Self::B300,
        Self::B600,
        Self::B1200,
        Self::B1800,
        Self::B2400,
        Self::B4800,
        Self::B9600,
        Self::B19200,
        Self::B38400,
        Self::B57600,
        Self::B115200,
    ];

    pub fn bits_per_second(&self) -> u32 {
        match self {
            Self::B50 => 50,
            Self::B75 => 75,
            Self::B110 => 110,
            Self::B134 => 134,
            Self::B150 => 150,
            Self::B200 => 200,
            Self::B300 => 300,
            Self::B600 => 600,
            Self::B1200 => 1200,
            Self::B1800 => 1800,
            Self::B2400 => 2400,
            Self::B4800 => 4800,
            Self::B9600 => 9600,
            Self::B19200 => 19_200,
            Self::B38400 => 38_400,
            Self::B57600 => 57_600,
            Self::B115200 => 115_200,
        }
    }
}

impl std::str::FromStr for BaudRate {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidRate(s.to_string());
        let rate: u32 = s.trim().parse().map_err(|_| invalid())?;
        Self::ALL
            .into_iter()
            .find(|b| b.bits_per_second() == rate)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits_per_second())
    }
}

pub fn parse_rate(token: &str) -> Result<BaudRate, ConfigError> {
    token.parse()
}

/// `E`, `O` or `N`. Nothing else, not even lowercase.
pub fn parse_parity(token: &str) -> Result<Parity, ConfigError> {
    match token {
        "E" => Ok(Parity::Even),
        "O" => Ok(Parity::Odd),
        "N" => Ok(Parity::None),
        _ => Err(ConfigError::InvalidParity(token.to_string())),
    }
}

pub fn parse_data_bits(token: &str) -> Result<DataBits, ConfigError> {
    match token.trim().parse::<u8>() {
        Ok(5) => Ok(DataBits::Five),
        Ok(6) => Ok(DataBits::Six),
        Ok(7) => Ok(DataBits::Seven),
        Ok(8) => Ok(DataBits::Eight),
        _ => Err(ConfigError::InvalidDataBits(token.to_string())),
    }
}

pub fn parse_stop_bits(token: &str) -> Result<StopBits, ConfigError> {
    match token.trim().parse::<u8>() {
        Ok(1) => Ok(StopBits::One),
        Ok(2) => Ok(StopBits::Two),
        _ => Err(ConfigError::InvalidStopBits(token.to_string())),
    }
}

/// Fully resolved line parameters for one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSettings {
    pub rate: BaudRate,
    pub parity: Parity,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            rate: BaudRate::B9600,
            parity: Parity::None,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
        }
    }
}

impl LineSettings {
    /// Resolves all four tokens, reporting the first bad one in argument order.
    pub fn parse(
        rate: &str,
        parity: &str,
        data_bits: &str,
        stop_bits: &str,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            rate: parse_rate(rate)?,
            parity: parse_parity(parity)?,
            data_bits: parse_data_bits(data_bits)?,
            stop_bits: parse_stop_bits(stop_bits)?,
        })
    }
}

impl fmt::Display for LineSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        };
        let data_bits = match self.data_bits {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        };
        let stop_bits = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        write!(f, "{} {}{}{}", self.rate, data_bits, parity, stop_bits)
    }
}
