//! Two-master, N-port switch.
//!
//! One `select` bit picks the master whose signals reach the responders.
//! It only moves at a transaction boundary: on a clock edge where the
//! selected master has `cycle` low, `select` flips to the other master.
//! The unselected master sees an idle link, so it can never receive an
//! `ack` for a beat that was not routed.

use std::fmt;

use sim_core::{BusRequest, BusResponse, Observable, Responder, Value};

/// Invalid switch wiring, caught before simulation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    DestinationOutOfRange { destination: u8, ports: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DestinationOutOfRange { destination, ports } => write!(
                f,
                "destination {destination} out of range for a switch with {ports} ports"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Arbiter between two masters and `N` responders.
#[derive(Debug, Clone)]
pub struct BusSwitch<R, const N: usize> {
    ports: [R; N],
    /// Index of the master currently routed.
    select: usize,
    /// Master inputs as seen at the last clock edge.
    inputs: [BusRequest; 2],
}

impl<R: Responder, const N: usize> BusSwitch<R, N> {
    #[must_use]
    pub fn new(ports: [R; N]) -> Self {
        Self {
            ports,
            select: 0,
            inputs: [BusRequest::IDLE; 2],
        }
    }

    /// Reject a destination tag that has no port behind it.
    pub fn check_destination(&self, destination: u8) -> Result<(), ConfigError> {
        if usize::from(destination) < N {
            Ok(())
        } else {
            Err(ConfigError::DestinationOutOfRange {
                destination,
                ports: N,
            })
        }
    }

    /// Master currently routed (0 or 1).
    #[must_use]
    pub fn selected(&self) -> usize {
        self.select
    }

    #[must_use]
    pub fn port(&self, index: usize) -> Option<&R> {
        self.ports.get(index)
    }

    #[must_use]
    pub fn ports(&self) -> &[R; N] {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut [R; N] {
        &mut self.ports
    }

    /// Per-port requests for the given master inputs.
    ///
    /// The selected master's request lands on `ports[destination]` with
    /// the tag stripped; every other port sees an idle link.
    #[must_use]
    pub fn route(&self, masters: &[BusRequest; 2]) -> [BusRequest; N] {
        let mut routed = [BusRequest::IDLE; N];
        let request = masters[self.select];
        if let Some(slot) = routed.get_mut(usize::from(request.destination)) {
            *slot = BusRequest {
                destination: 0,
                ..request
            };
        }
        routed
    }

    /// Settle phase: responses as seen by each master.
    #[must_use]
    pub fn respond(&self, masters: &[BusRequest; 2]) -> [BusResponse; 2] {
        let mut responses = [BusResponse::IDLE; 2];
        let destination = usize::from(masters[self.select].destination);
        let routed = self.route(masters);
        if let (Some(port), Some(request)) = (self.ports.get(destination), routed.get(destination)) {
            responses[self.select] = port.respond(request);
        }
        responses
    }

    /// Clock edge: clock every port with its routed request, then move
    /// `select` if the selected master has released its cycle.
    pub fn clock(&mut self, masters: &[BusRequest; 2]) {
        let routed = self.route(masters);
        for (port, request) in self.ports.iter_mut().zip(routed.iter()) {
            port.clock(request);
        }

        if !masters[self.select].cycle {
            let next = self.select ^ 1;
            if masters[next].cycle {
                log::debug!("switch: master {} -> master {next}", self.select);
            }
            self.select = next;
        }
        self.inputs = *masters;
    }
}

const SWITCH_QUERY_PATHS: &[&str] = &["select", "cycle.0", "cycle.1"];

impl<R: Responder, const N: usize> Observable for BusSwitch<R, N> {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "select" => Some((self.select as u8).into()),
            "cycle.0" => Some(self.inputs[0].cycle.into()),
            "cycle.1" => Some(self.inputs[1].cycle.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        SWITCH_QUERY_PATHS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soc_devices::{Lanes, Memory};

    fn switch() -> BusSwitch<Memory, 2> {
        BusSwitch::new([Memory::new(16, Lanes::Byte), Memory::new(16, Lanes::Byte)])
    }

    #[test]
    fn starts_on_master_zero() {
        assert_eq!(switch().selected(), 0);
    }

    #[test]
    fn routes_selected_master_by_destination() {
        let sw = switch();
        let masters = [BusRequest::read(3).to(1), BusRequest::write(5, 1).to(0)];
        let routed = sw.route(&masters);
        assert_eq!(routed[0], BusRequest::IDLE);
        assert_eq!(routed[1], BusRequest::read(3));
    }

    #[test]
    fn unselected_master_sees_idle() {
        let mut sw = switch();
        let masters = [BusRequest::read(0), BusRequest::read(1)];
        sw.clock(&masters);
        let responses = sw.respond(&masters);
        assert!(responses[0].ack);
        assert_eq!(responses[1], BusResponse::IDLE);
    }

    #[test]
    fn out_of_range_destination_drives_nothing() {
        let mut sw = switch();
        let masters = [BusRequest::read(0).to(7), BusRequest::IDLE];
        assert_eq!(sw.route(&masters), [BusRequest::IDLE; 2]);
        sw.clock(&masters);
        assert_eq!(sw.respond(&masters), [BusResponse::IDLE; 2]);
        assert_eq!(sw.port(0).and_then(|m| m.query("ack")), Some(Value::Bool(false)));
    }

    #[test]
    fn check_destination_bounds() {
        let sw = switch();
        assert_eq!(sw.check_destination(1), Ok(()));
        assert_eq!(
            sw.check_destination(2),
            Err(ConfigError::DestinationOutOfRange {
                destination: 2,
                ports: 2
            })
        );
    }

    #[test]
    fn select_holds_while_cycle_asserted() {
        let mut sw = switch();
        let busy = [BusRequest::read(0), BusRequest::read(0)];
        for _ in 0..5 {
            sw.clock(&busy);
            assert_eq!(sw.selected(), 0);
        }
        sw.clock(&[BusRequest::IDLE, BusRequest::read(0)]);
        assert_eq!(sw.selected(), 1);
    }

    #[test]
    fn idle_select_toggles_every_edge() {
        let mut sw = switch();
        let idle = [BusRequest::IDLE; 2];
        sw.clock(&idle);
        assert_eq!(sw.selected(), 1);
        sw.clock(&idle);
        assert_eq!(sw.selected(), 0);
    }

    #[test]
    fn observable_paths() {
        let mut sw = switch();
        sw.clock(&[BusRequest::IDLE, BusRequest::read(0)]);
        assert_eq!(sw.query("select"), Some(Value::U8(1)));
        assert_eq!(sw.query("cycle.0"), Some(Value::Bool(false)));
        assert_eq!(sw.query("cycle.1"), Some(Value::Bool(true)));
        assert_eq!(sw.query("cycle.2"), None);
    }
}
