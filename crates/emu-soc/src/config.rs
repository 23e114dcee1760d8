//! SoC configuration.

use serde::{Deserialize, Serialize};

/// Sizes, switch wiring and run limits for a [`Soc`](crate::Soc).
///
/// Missing fields in a JSON config take their default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocConfig {
    /// Program memory size in bytes.
    pub program_size: usize,
    /// Data memory size in bytes.
    pub data_size: usize,
    /// Switch port the program port is tagged for.
    pub program_destination: u8,
    /// Switch port the data port is tagged for.
    pub data_destination: u8,
    /// Default cycle limit for [`Soc::run`](crate::Soc::run).
    pub cycle_budget: u64,
    /// Attach protocol monitors to both core ports.
    pub monitor: bool,
}

impl Default for SocConfig {
    fn default() -> Self {
        Self {
            program_size: 64 * 1024,
            data_size: 64 * 1024,
            program_destination: 0,
            data_destination: 1,
            cycle_budget: 1_000_000,
            monitor: true,
        }
    }
}
