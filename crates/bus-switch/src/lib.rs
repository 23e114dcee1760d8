//! Bus interconnect.
//!
//! [`BusSwitch`] arbitrates two masters onto `N` responder ports, routing
//! the selected master by its `destination` tag. [`AddressSplit`] divides
//! one link between two responders by address range.

mod split;
mod switch;

pub use split::AddressSplit;
pub use switch::{BusSwitch, ConfigError};
