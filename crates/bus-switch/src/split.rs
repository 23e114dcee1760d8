//! Address-range demultiplexer.

use sim_core::{BusRequest, BusResponse, Observable, Responder, Value};

/// Splits one link at `split`: lower addresses go to `low` unchanged,
/// the rest go to `high` rebased to start at zero.
///
/// Purely combinational. Whichever side is not addressed sees an idle
/// link on the clock edge.
#[derive(Debug, Clone)]
pub struct AddressSplit<A, B> {
    split: u32,
    low: A,
    high: B,
}

impl<A: Responder, B: Responder> AddressSplit<A, B> {
    #[must_use]
    pub fn new(split: u32, low: A, high: B) -> Self {
        Self { split, low, high }
    }

    #[must_use]
    pub fn split(&self) -> u32 {
        self.split
    }

    #[must_use]
    pub fn low(&self) -> &A {
        &self.low
    }

    #[must_use]
    pub fn high(&self) -> &B {
        &self.high
    }

    pub fn low_mut(&mut self) -> &mut A {
        &mut self.low
    }

    pub fn high_mut(&mut self) -> &mut B {
        &mut self.high
    }

    /// (request for `low`, request for `high`)
    fn divide(&self, request: &BusRequest) -> (BusRequest, BusRequest) {
        if request.address < self.split {
            (*request, BusRequest::IDLE)
        } else {
            let rebased = BusRequest {
                address: request.address - self.split,
                ..*request
            };
            (BusRequest::IDLE, rebased)
        }
    }
}

impl<A: Responder, B: Responder> Responder for AddressSplit<A, B> {
    fn respond(&self, request: &BusRequest) -> BusResponse {
        if request.address < self.split {
            self.low.respond(request)
        } else {
            self.high.respond(&self.divide(request).1)
        }
    }

    fn clock(&mut self, request: &BusRequest) {
        let (low, high) = self.divide(request);
        self.low.clock(&low);
        self.high.clock(&high);
    }
}

impl<A, B> Observable for AddressSplit<A, B> {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "split" => Some(self.split.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["split"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soc_devices::{Lanes, Memory};

    fn split() -> AddressSplit<Memory, Memory> {
        AddressSplit::new(8, Memory::new(8, Lanes::Byte), Memory::new(8, Lanes::Byte))
    }

    fn write(sp: &mut AddressSplit<Memory, Memory>, address: u32, data: u32) {
        let request = BusRequest::write(address, data);
        for _ in 0..4 {
            let acked = sp.respond(&request).ack;
            sp.clock(&request);
            if acked {
                break;
            }
        }
        sp.clock(&BusRequest::IDLE);
    }

    #[test]
    fn low_addresses_pass_through() {
        let mut sp = split();
        write(&mut sp, 3, 0xAA);
        assert_eq!(sp.low().peek(3), 0xAA);
        assert_eq!(sp.high().peek(3), 0);
    }

    #[test]
    fn high_addresses_are_rebased() {
        let mut sp = split();
        write(&mut sp, 11, 0xBB);
        assert_eq!(sp.high().peek(3), 0xBB);
        assert_eq!(sp.low().peek(3), 0);
    }

    #[test]
    fn unaddressed_side_never_acks() {
        let mut sp = split();
        let request = BusRequest::read(2);
        sp.clock(&request);
        assert!(sp.respond(&request).ack);
        assert_eq!(sp.high().query("ack"), Some(Value::Bool(false)));
    }
}
