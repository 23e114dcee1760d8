//! Shared contract for cycle-level SoC simulation.
//!
//! One global clock drives every component in lock-step. Each cycle has
//! two phases: masters present requests derived from registered state,
//! routing and responders settle, then every component latches its next
//! state on the clock edge. Everything in this crate is the vocabulary
//! those phases are written in.

mod bus;
mod monitor;
mod observable;
mod ticks;

pub use bus::{BusRequest, BusResponse, Master, Responder};
pub use monitor::{Beat, BusMonitor, ProtocolViolation};
pub use observable::{Observable, Value};
pub use ticks::Ticks;
