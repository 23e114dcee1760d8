//! A bus master that replays a fixed script.

use std::collections::VecDeque;

use sim_core::{Beat, BusRequest, BusResponse, Master, Ticks};

/// One scripted bus operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Read(u32),
    Write(u32, u32),
    /// Drop `cycle` for this many cycles (at least one).
    Idle(u32),
}

/// Plays back [`Op`]s in order, holding each request until it is
/// acknowledged.
///
/// Back-to-back reads and writes keep `cycle` asserted across beats, so
/// an [`Op::Idle`] is the only way to release a switch input.
#[derive(Debug, Clone)]
pub struct ScriptedMaster {
    destination: u8,
    script: VecDeque<Op>,
    now: Ticks,
    completed: Vec<Beat>,
}

impl ScriptedMaster {
    /// Empty script; requests are tagged with `destination`.
    #[must_use]
    pub fn new(destination: u8) -> Self {
        Self {
            destination,
            script: VecDeque::new(),
            now: Ticks::ZERO,
            completed: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_script(destination: u8, ops: impl IntoIterator<Item = Op>) -> Self {
        let mut master = Self::new(destination);
        master.script.extend(ops);
        master
    }

    pub fn push(&mut self, op: Op) {
        self.script.push_back(op);
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.script.is_empty()
    }

    /// Beats acknowledged so far, with the cycle each was acked on.
    #[must_use]
    pub fn completed(&self) -> &[Beat] {
        &self.completed
    }
}

impl Master for ScriptedMaster {
    fn request(&self) -> BusRequest {
        match self.script.front() {
            Some(Op::Read(address)) => BusRequest::read(*address).to(self.destination),
            Some(Op::Write(address, data)) => {
                BusRequest::write(*address, *data).to(self.destination)
            }
            Some(Op::Idle(_)) | None => BusRequest::IDLE,
        }
    }

    fn clock(&mut self, response: &BusResponse) {
        let request = self.request();
        match self.script.front().copied() {
            Some(Op::Idle(n)) if n > 1 => self.script[0] = Op::Idle(n - 1),
            Some(Op::Idle(_)) => {
                self.script.pop_front();
            }
            Some(_) if response.ack => {
                self.completed.push(Beat {
                    cycle: self.now,
                    address: request.address,
                    write_enable: request.write_enable,
                    data: if request.write_enable {
                        request.write_data
                    } else {
                        response.read_data
                    },
                });
                log::trace!("scripted beat at {:#06X} done on cycle {}", request.address, self.now.get());
                self.script.pop_front();
            }
            _ => {}
        }
        self.now.increment();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lanes, Memory};
    use sim_core::Responder;

    fn run(master: &mut ScriptedMaster, mem: &mut Memory, cycles: usize) {
        for _ in 0..cycles {
            let request = master.request();
            let response = mem.respond(&request);
            master.clock(&response);
            mem.clock(&request);
        }
    }

    #[test]
    fn tags_requests_with_destination() {
        let master = ScriptedMaster::with_script(1, [Op::Read(8)]);
        let request = master.request();
        assert!(request.is_active());
        assert_eq!(request.destination, 1);
    }

    #[test]
    fn holds_until_ack_then_advances() {
        let mut mem = Memory::new(16, Lanes::Byte);
        let mut master = ScriptedMaster::with_script(0, [Op::Write(2, 0x5A), Op::Read(2)]);
        run(&mut master, &mut mem, 10);
        assert!(master.is_done());
        let beats = master.completed();
        assert_eq!(beats.len(), 2);
        assert!(beats[0].write_enable);
        assert_eq!((beats[1].address, beats[1].data), (2, 0x5A));
        assert!(beats[0].cycle < beats[1].cycle);
    }

    #[test]
    fn idle_drops_cycle() {
        let mut master = ScriptedMaster::with_script(0, [Op::Idle(2), Op::Read(0)]);
        assert!(!master.request().cycle);
        master.clock(&BusResponse::IDLE);
        assert!(!master.request().cycle);
        master.clock(&BusResponse::IDLE);
        assert!(master.request().cycle);
    }
}
