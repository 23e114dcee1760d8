//! Error types for building and running a SoC.

use std::fmt;
use std::io;

use bus_switch::ConfigError;
use cpu_rv32i::DecodeError;
use sim_core::ProtocolViolation;
use soc_devices::Lanes;

/// Failure to build or load a [`Soc`](crate::Soc).
#[derive(Debug)]
pub enum SocError {
    /// Invalid switch wiring.
    Config(ConfigError),
    /// A core port tagged for a memory of the wrong width.
    PortWidth {
        link: &'static str,
        destination: u8,
        expected: Lanes,
        found: Lanes,
    },
    /// Program image does not fit in program memory.
    ProgramTooLarge { len: usize, capacity: usize },
    /// Hex program text with a line that is not a 32-bit word.
    InvalidHex { line: usize, text: String },
    Io(io::Error),
}

impl fmt::Display for SocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration: {e}"),
            Self::PortWidth {
                link,
                destination,
                expected,
                found,
            } => write!(
                f,
                "{link} port is tagged for destination {destination}, a {found:?}-lane memory; it needs {expected:?} lanes"
            ),
            Self::ProgramTooLarge { len, capacity } => write!(
                f,
                "program is {len} bytes but program memory holds {capacity}"
            ),
            Self::InvalidHex { line, text } => {
                write!(f, "line {line}: not a hex word: {text:?}")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for SocError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for SocError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<io::Error> for SocError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Why a run stopped short of its goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunError {
    /// The core halted on an unimplemented instruction.
    Halted(DecodeError),
    /// Cycle budget exhausted.
    Timeout { cycles: u64 },
    /// A bus monitor caught a protocol breach.
    Protocol(ProtocolViolation),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Halted(e) => write!(f, "core halted: {e}"),
            Self::Timeout { cycles } => write!(f, "no result after {cycles} cycles"),
            Self::Protocol(v) => write!(f, "bus protocol violation: {v}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Halted(e) => Some(e),
            Self::Protocol(v) => Some(v),
            Self::Timeout { .. } => None,
        }
    }
}
