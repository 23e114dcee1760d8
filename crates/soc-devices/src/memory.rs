//! Registered-acknowledge memory.

use sim_core::{BusRequest, BusResponse, Observable, Responder, Value};

/// Bytes transferred per beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lanes {
    /// 8-bit data port.
    Byte,
    /// 32-bit port, lanes assembled little-endian.
    Word,
}

impl Lanes {
    #[must_use]
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Word => 4,
        }
    }
}

/// Byte-addressed memory behind a single bus link.
///
/// `ack` is registered: it rises the cycle after a request appears and
/// falls the cycle after that, so every beat takes at least two cycles.
/// The read latch follows the request on every clock edge, which keeps it
/// valid for the cycle `ack` is high. Addresses wrap modulo the size.
#[derive(Debug, Clone)]
pub struct Memory {
    data: Vec<u8>,
    lanes: Lanes,
    ack: bool,
    read_latch: u32,
}

impl Memory {
    /// Zero-filled memory of `size` bytes (at least one).
    #[must_use]
    pub fn new(size: usize, lanes: Lanes) -> Self {
        Self {
            data: vec![0; size.max(1)],
            lanes,
            ack: false,
            read_latch: 0,
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn lanes(&self) -> Lanes {
        self.lanes
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Copy an image in at `offset`, wrapping past the end.
    pub fn load(&mut self, offset: u32, image: &[u8]) {
        for (i, &byte) in image.iter().enumerate() {
            self.poke(offset.wrapping_add(i as u32), byte);
        }
    }

    #[must_use]
    pub fn peek(&self, addr: u32) -> u8 {
        self.data[self.index(addr)]
    }

    pub fn poke(&mut self, addr: u32, value: u8) {
        let index = self.index(addr);
        self.data[index] = value;
    }

    fn index(&self, addr: u32) -> usize {
        addr as usize % self.data.len()
    }

    fn read_lanes(&self, addr: u32) -> u32 {
        (0..self.lanes.bytes()).fold(0, |word, i| {
            word | u32::from(self.peek(addr.wrapping_add(i))) << (8 * i)
        })
    }

    fn write_lanes(&mut self, addr: u32, value: u32) {
        for i in 0..self.lanes.bytes() {
            self.poke(addr.wrapping_add(i), (value >> (8 * i)) as u8);
        }
    }
}

impl Responder for Memory {
    fn respond(&self, request: &BusRequest) -> BusResponse {
        BusResponse {
            ack: self.ack && request.is_active(),
            read_data: self.read_latch,
        }
    }

    fn clock(&mut self, request: &BusRequest) {
        let active = request.is_active();
        if active {
            if request.write_enable {
                self.write_lanes(request.address, request.write_data);
            } else {
                self.read_latch = self.read_lanes(request.address);
            }
        }
        self.ack = !self.ack && active;
    }
}

const MEMORY_QUERY_PATHS: &[&str] = &["ack", "read_data", "size"];

impl Observable for Memory {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "ack" => Some(self.ack.into()),
            "read_data" => Some(self.read_latch.into()),
            "size" => Some((self.data.len() as u64).into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        MEMORY_QUERY_PATHS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hold `request` on the link until acked; returns (cycles, response).
    fn transact(mem: &mut Memory, request: BusRequest) -> (u32, BusResponse) {
        for cycle in 1..=8 {
            let response = mem.respond(&request);
            mem.clock(&request);
            if response.ack {
                return (cycle, response);
            }
        }
        panic!("no ack");
    }

    #[test]
    fn ack_is_registered_and_pulses() {
        let mut mem = Memory::new(16, Lanes::Byte);
        let req = BusRequest::read(0);
        assert!(!mem.respond(&req).ack);
        mem.clock(&req);
        assert!(mem.respond(&req).ack);
        mem.clock(&req);
        // held request sees ack drop for a cycle, then rise again
        assert!(!mem.respond(&req).ack);
        mem.clock(&req);
        assert!(mem.respond(&req).ack);
    }

    #[test]
    fn never_acks_without_request() {
        let mut mem = Memory::new(16, Lanes::Byte);
        mem.clock(&BusRequest::read(0));
        assert!(!mem.respond(&BusRequest::IDLE).ack);
        let no_strobe = BusRequest {
            strobe: false,
            ..BusRequest::read(0)
        };
        assert!(!mem.respond(&no_strobe).ack);
    }

    #[test]
    fn byte_lane_write_then_read() {
        let mut mem = Memory::new(16, Lanes::Byte);
        let (cycles, _) = transact(&mut mem, BusRequest::write(3, 0x1AB));
        assert_eq!(cycles, 2);
        assert_eq!(mem.peek(3), 0xAB);
        assert_eq!(mem.peek(4), 0);
        mem.clock(&BusRequest::IDLE);
        let (_, response) = transact(&mut mem, BusRequest::read(3));
        assert_eq!(response.read_data, 0xAB);
    }

    #[test]
    fn word_lanes_are_little_endian() {
        let mut mem = Memory::new(16, Lanes::Word);
        mem.load(4, &[0x78, 0x56, 0x34, 0x12]);
        let (_, response) = transact(&mut mem, BusRequest::read(4));
        assert_eq!(response.read_data, 0x1234_5678);
        mem.clock(&BusRequest::IDLE);
        transact(&mut mem, BusRequest::write(8, 0xDEAD_BEEF));
        assert_eq!(&mem.bytes()[8..12], &[0xEF, 0xBE, 0xAD, 0xDE]);
    }

    #[test]
    fn addresses_wrap() {
        let mut mem = Memory::new(8, Lanes::Word);
        mem.load(6, &[1, 2, 3, 4]);
        assert_eq!(&mem.bytes()[..2], &[3, 4]);
        assert_eq!(mem.peek(14), 1);
        assert_eq!(mem.peek(15), 2);
    }

    #[test]
    fn observable_ack() {
        let mut mem = Memory::new(4, Lanes::Byte);
        assert_eq!(mem.query("ack"), Some(Value::Bool(false)));
        mem.clock(&BusRequest::read(0));
        assert_eq!(mem.query("ack"), Some(Value::Bool(true)));
        assert_eq!(mem.query("size"), Some(Value::U64(4)));
        assert_eq!(mem.query("nope"), None);
    }
}
