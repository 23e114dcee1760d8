//! System wiring for the RV32I-subset SoC.
//!
//! A [`Soc`] owns one [`Rv32Core`](cpu_rv32i::Rv32Core), a two-port
//! [`BusSwitch`](bus_switch::BusSwitch) and two memories: a 32-bit program
//! memory and an 8-bit data memory. The core's program port is switch
//! master 0 and its data port is master 1.

mod config;
mod error;
pub mod program;
mod soc;

pub use config::SocConfig;
pub use error::{RunError, SocError};
pub use soc::{PORTS, Soc};
