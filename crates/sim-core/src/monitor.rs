//! Per-link probe: beat trace and protocol checking.
//!
//! A monitor sits on one bus link and is fed the settled request and
//! response once per cycle, before the clock edge. It records every
//! acknowledged beat and flags anything the protocol forbids. Components
//! are built so these never fire; the monitor is how simulation proves it.

use std::fmt;

use crate::{BusRequest, BusResponse, Ticks};

/// One acknowledged beat as seen on a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Beat {
    /// Cycle on which `ack` was observed.
    pub cycle: Ticks,
    pub address: u32,
    pub write_enable: bool,
    /// `write_data` for writes, `read_data` for reads.
    pub data: u32,
}

/// A breach of the request/acknowledge contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// `ack` asserted on a cycle with no `cycle & strobe`.
    AckWithoutRequest { cycle: Ticks },
    /// `cycle` or `strobe` dropped while a beat was still waiting for `ack`.
    RequestWithdrawn { cycle: Ticks, address: u32 },
    /// Address, direction or write data changed while waiting for `ack`.
    RequestChangedWhileWaiting { cycle: Ticks, address: u32 },
}

impl fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AckWithoutRequest { cycle } => {
                write!(f, "ack without request at cycle {cycle}")
            }
            Self::RequestWithdrawn { cycle, address } => write!(
                f,
                "request for {address:#010X} withdrawn before ack at cycle {cycle}"
            ),
            Self::RequestChangedWhileWaiting { cycle, address } => write!(
                f,
                "request for {address:#010X} changed while waiting for ack at cycle {cycle}"
            ),
        }
    }
}

impl std::error::Error for ProtocolViolation {}

/// Probe for a single bus link.
#[derive(Debug, Clone)]
pub struct BusMonitor {
    name: &'static str,
    now: Ticks,
    /// Beat requested on an earlier cycle that has not been acknowledged.
    waiting: Option<BusRequest>,
    beats: Vec<Beat>,
    violations: Vec<ProtocolViolation>,
}

impl BusMonitor {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            now: Ticks::ZERO,
            waiting: None,
            beats: Vec::new(),
            violations: Vec::new(),
        }
    }

    /// Feed one cycle's settled signals. Call exactly once per cycle.
    pub fn observe(&mut self, request: &BusRequest, response: &BusResponse) {
        if response.ack && !request.is_active() {
            self.flag(ProtocolViolation::AckWithoutRequest { cycle: self.now });
        }

        if let Some(waiting) = self.waiting {
            if !request.is_active() {
                self.flag(ProtocolViolation::RequestWithdrawn {
                    cycle: self.now,
                    address: waiting.address,
                });
            } else if !same_beat(&waiting, request) {
                self.flag(ProtocolViolation::RequestChangedWhileWaiting {
                    cycle: self.now,
                    address: waiting.address,
                });
            }
        }

        if request.is_active() && response.ack {
            let beat = Beat {
                cycle: self.now,
                address: request.address,
                write_enable: request.write_enable,
                data: if request.write_enable {
                    request.write_data
                } else {
                    response.read_data
                },
            };
            log::trace!(
                "{}: {} {:#010X} = {:#X} @{}",
                self.name,
                if beat.write_enable { "W" } else { "R" },
                beat.address,
                beat.data,
                beat.cycle
            );
            self.beats.push(beat);
            self.waiting = None;
        } else if request.is_active() {
            self.waiting = Some(*request);
        } else {
            self.waiting = None;
        }

        self.now.increment();
    }

    fn flag(&mut self, violation: ProtocolViolation) {
        log::warn!("{}: {violation}", self.name);
        self.violations.push(violation);
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn beats(&self) -> &[Beat] {
        &self.beats
    }

    /// Acknowledged write beats only, in order.
    pub fn writes(&self) -> impl Iterator<Item = &Beat> {
        self.beats.iter().filter(|b| b.write_enable)
    }

    #[must_use]
    pub fn violations(&self) -> &[ProtocolViolation] {
        &self.violations
    }

    /// First violation seen, if any.
    pub fn check(&self) -> Result<(), ProtocolViolation> {
        match self.violations.first() {
            Some(v) => Err(*v),
            None => Ok(()),
        }
    }
}

fn same_beat(a: &BusRequest, b: &BusRequest) -> bool {
    a.address == b.address
        && a.write_enable == b.write_enable
        && (!a.write_enable || a.write_data == b.write_data)
        && a.destination == b.destination
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_acknowledged_beats_only() {
        let mut mon = BusMonitor::new("test");
        let req = BusRequest::read(8);
        mon.observe(&req, &BusResponse::IDLE);
        assert!(mon.beats().is_empty());
        mon.observe(&req, &BusResponse::ack(0x5A));
        mon.observe(&BusRequest::IDLE, &BusResponse::IDLE);

        assert_eq!(
            mon.beats(),
            &[Beat {
                cycle: Ticks(1),
                address: 8,
                write_enable: false,
                data: 0x5A,
            }]
        );
        assert!(mon.check().is_ok());
    }

    #[test]
    fn write_beat_records_write_data() {
        let mut mon = BusMonitor::new("test");
        mon.observe(&BusRequest::write(13, 11), &BusResponse::ack(0xFF));
        assert_eq!(mon.writes().count(), 1);
        assert_eq!(mon.beats()[0].data, 11);
    }

    #[test]
    fn flags_ack_without_request() {
        let mut mon = BusMonitor::new("test");
        mon.observe(&BusRequest::IDLE, &BusResponse::ack(0));
        assert_eq!(
            mon.check(),
            Err(ProtocolViolation::AckWithoutRequest { cycle: Ticks(0) })
        );
    }

    #[test]
    fn flags_withdrawn_request() {
        let mut mon = BusMonitor::new("test");
        mon.observe(&BusRequest::read(4), &BusResponse::IDLE);
        mon.observe(&BusRequest::IDLE, &BusResponse::IDLE);
        assert_eq!(
            mon.violations(),
            &[ProtocolViolation::RequestWithdrawn {
                cycle: Ticks(1),
                address: 4,
            }]
        );
    }

    #[test]
    fn flags_address_change_while_waiting() {
        let mut mon = BusMonitor::new("test");
        mon.observe(&BusRequest::read(4), &BusResponse::IDLE);
        mon.observe(&BusRequest::read(5), &BusResponse::IDLE);
        assert!(matches!(
            mon.check(),
            Err(ProtocolViolation::RequestChangedWhileWaiting { address: 4, .. })
        ));
    }

    #[test]
    fn back_to_back_beats_may_change_address_after_ack() {
        let mut mon = BusMonitor::new("test");
        mon.observe(&BusRequest::write(13, 1), &BusResponse::IDLE);
        mon.observe(&BusRequest::write(13, 1), &BusResponse::ack(0));
        mon.observe(&BusRequest::write(14, 2), &BusResponse::IDLE);
        mon.observe(&BusRequest::write(14, 2), &BusResponse::ack(0));
        assert!(mon.check().is_ok());
        let addrs: Vec<u32> = mon.writes().map(|b| b.address).collect();
        assert_eq!(addrs, vec![13, 14]);
    }
}
