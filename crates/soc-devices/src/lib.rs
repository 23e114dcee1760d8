//! Bus devices for SoC simulation.
//!
//! - [`Memory`]: byte-addressed store with a registered acknowledge, one or
//!   four byte lanes per beat.
//! - [`ScriptedMaster`]: a bus master that plays back a queue of reads and
//!   writes, for driving a switch input or bringing up a responder.

mod memory;
mod scripted;

pub use memory::{Lanes, Memory};
pub use scripted::{Op, ScriptedMaster};
