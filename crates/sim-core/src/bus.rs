//! Request/acknowledge bus protocol.
//!
//! Every link carries the same signal set: `cycle` opens a transaction
//! window, `strobe` marks a beat as a real request, and the responder
//! answers with `ack` plus `read_data`. A master holds `address`,
//! `write_enable` and `write_data` stable and keeps `cycle & strobe`
//! asserted until it sees `ack`. A responder never asserts `ack` for a
//! beat it did not see requested.
//!
//! Signals are split by direction: [`BusRequest`] is driven by the master,
//! [`BusResponse`] by the responder. Links through the switch additionally
//! carry a `destination` tag in the request.

/// Master-driven half of a bus link, as settled for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BusRequest {
    /// Transaction window open.
    pub cycle: bool,
    /// This beat is a real request.
    pub strobe: bool,
    pub address: u32,
    pub write_enable: bool,
    pub write_data: u32,
    /// Responder port index, only meaningful on switch links.
    pub destination: u8,
}

impl BusRequest {
    /// A link with nothing driven on it.
    pub const IDLE: Self = Self {
        cycle: false,
        strobe: false,
        address: 0,
        write_enable: false,
        write_data: 0,
        destination: 0,
    };

    /// An open single-beat read.
    #[must_use]
    pub const fn read(address: u32) -> Self {
        Self {
            cycle: true,
            strobe: true,
            address,
            write_enable: false,
            write_data: 0,
            destination: 0,
        }
    }

    /// An open single-beat write.
    #[must_use]
    pub const fn write(address: u32, data: u32) -> Self {
        Self {
            cycle: true,
            strobe: true,
            address,
            write_enable: true,
            write_data: data,
            destination: 0,
        }
    }

    /// Same request, tagged for a switch port.
    #[must_use]
    pub const fn to(mut self, destination: u8) -> Self {
        self.destination = destination;
        self
    }

    /// True when this cycle carries a beat a responder may accept.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.cycle && self.strobe
    }
}

/// Responder-driven half of a bus link, as settled for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BusResponse {
    pub ack: bool,
    pub read_data: u32,
}

impl BusResponse {
    /// No acknowledge, nothing on the data lines.
    pub const IDLE: Self = Self {
        ack: false,
        read_data: 0,
    };

    #[must_use]
    pub const fn ack(read_data: u32) -> Self {
        Self {
            ack: true,
            read_data,
        }
    }
}

/// The accepting side of a bus link.
///
/// Responders are evaluated in two phases per cycle. [`respond`] is the
/// combinational view: given the request currently on the link, what does
/// the responder drive back? It must not change state. [`clock`] is the
/// rising edge: the responder latches whatever it needs from the settled
/// request.
///
/// [`respond`]: Responder::respond
/// [`clock`]: Responder::clock
pub trait Responder {
    /// Drive `ack`/`read_data` for the request currently on the link.
    fn respond(&self, request: &BusRequest) -> BusResponse;

    /// Clock edge with the settled request.
    fn clock(&mut self, request: &BusRequest);
}

/// The initiating side of a single bus link.
///
/// A master's request is a function of its registered state only, so the
/// settle phase never loops back through a master.
pub trait Master {
    /// Request driven onto the link this cycle.
    fn request(&self) -> BusRequest;

    /// Clock edge with the settled response.
    fn clock(&mut self, response: &BusResponse);
}

impl<R: Responder + ?Sized> Responder for Box<R> {
    fn respond(&self, request: &BusRequest) -> BusResponse {
        (**self).respond(request)
    }

    fn clock(&mut self, request: &BusRequest) {
        (**self).clock(request);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_request_is_not_active() {
        assert!(!BusRequest::IDLE.is_active());
        assert!(!BusRequest::default().is_active());
    }

    #[test]
    fn cycle_without_strobe_is_not_a_beat() {
        let request = BusRequest {
            strobe: false,
            ..BusRequest::read(0x10)
        };
        assert!(!request.is_active());
    }

    #[test]
    fn write_carries_enable_and_data() {
        let request = BusRequest::write(13, 11).to(1);
        assert!(request.is_active());
        assert!(request.write_enable);
        assert_eq!(request.write_data, 11);
        assert_eq!(request.destination, 1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn request_serializes_with_signal_names() {
        let json = serde_json::to_string(&BusRequest::read(4)).expect("serialize");
        assert!(json.contains("\"cycle\":true"));
        assert!(json.contains("\"address\":4"));
    }
}
