//! The assembled system and its clock.

use bus_switch::BusSwitch;
use cpu_rv32i::Rv32Core;
use sim_core::{Beat, BusMonitor, Observable, ProtocolViolation, Ticks, Value};
use soc_devices::{Lanes, Memory};

use crate::{RunError, SocConfig, SocError};

/// Switch ports: program memory, then data memory.
pub const PORTS: usize = 2;

const PROGRAM: usize = 0;
const DATA: usize = 1;

/// Core, switch and memories, stepped one clock at a time.
pub struct Soc {
    core: Rv32Core,
    switch: BusSwitch<Memory, PORTS>,
    /// One per core port, in switch master order.
    monitors: Option<[BusMonitor; 2]>,
    config: SocConfig,
    cycles: Ticks,
}

impl Soc {
    /// Build a system with zeroed memories. Fails if either destination
    /// tag has no switch port behind it, or points the program port at
    /// anything but the word-wide memory (and the data port at anything
    /// but the byte-wide one).
    pub fn new(config: SocConfig) -> Result<Self, SocError> {
        let switch = BusSwitch::new([
            Memory::new(config.program_size, Lanes::Word),
            Memory::new(config.data_size, Lanes::Byte),
        ]);
        check_link(&switch, "program", config.program_destination, Lanes::Word)?;
        check_link(&switch, "data", config.data_destination, Lanes::Byte)?;

        let monitors = config
            .monitor
            .then(|| [BusMonitor::new("program"), BusMonitor::new("data")]);

        Ok(Self {
            core: Rv32Core::new(),
            switch,
            monitors,
            config,
            cycles: Ticks::ZERO,
        })
    }

    /// Copy a program image to address 0 of program memory.
    pub fn load_program(&mut self, image: &[u8]) -> Result<(), SocError> {
        let memory = self.memory_mut(PROGRAM);
        if image.len() > memory.size() {
            return Err(SocError::ProgramTooLarge {
                len: image.len(),
                capacity: memory.size(),
            });
        }
        memory.load(0, image);
        log::debug!("loaded {} byte program", image.len());
        Ok(())
    }

    /// Advance one clock.
    pub fn step(&mut self) {
        let requests = [
            self.core.program_request().to(self.config.program_destination),
            self.core.data_request().to(self.config.data_destination),
        ];
        let responses = self.switch.respond(&requests);

        if let Some(monitors) = &mut self.monitors {
            for (monitor, (request, response)) in monitors.iter_mut().zip(requests.iter().zip(&responses)) {
                monitor.observe(request, response);
            }
        }

        self.core.clock(&responses[0], &responses[1]);
        self.switch.clock(&requests);
        self.cycles.increment();
    }

    /// Run until the core halts. Returns the cycles this run took.
    pub fn run(&mut self, budget: u64) -> Result<u64, RunError> {
        let start = self.cycles;
        loop {
            self.check_protocol()?;
            if self.core.is_halted() {
                return Ok((self.cycles - start).get());
            }
            if (self.cycles - start).get() >= budget {
                return Err(RunError::Timeout { cycles: budget });
            }
            self.step();
        }
    }

    /// Run until `done` holds. A halt before that is an error.
    pub fn run_until(&mut self, mut done: impl FnMut(&Self) -> bool, budget: u64) -> Result<u64, RunError> {
        let start = self.cycles;
        loop {
            self.check_protocol()?;
            if done(self) {
                return Ok((self.cycles - start).get());
            }
            if let Some(fault) = self.core.fault() {
                return Err(RunError::Halted(fault));
            }
            if (self.cycles - start).get() >= budget {
                return Err(RunError::Timeout { cycles: budget });
            }
            self.step();
        }
    }

    fn check_protocol(&self) -> Result<(), RunError> {
        match self.violations().next() {
            Some(v) => Err(RunError::Protocol(*v)),
            None => Ok(()),
        }
    }

    // === Accessors ===

    #[must_use]
    pub fn config(&self) -> &SocConfig {
        &self.config
    }

    #[must_use]
    pub fn cycles(&self) -> Ticks {
        self.cycles
    }

    #[must_use]
    pub fn core(&self) -> &Rv32Core {
        &self.core
    }

    #[must_use]
    pub fn switch(&self) -> &BusSwitch<Memory, PORTS> {
        &self.switch
    }

    #[must_use]
    pub fn program_memory(&self) -> &Memory {
        &self.switch.ports()[PROGRAM]
    }

    #[must_use]
    pub fn data_memory(&self) -> &Memory {
        &self.switch.ports()[DATA]
    }

    pub fn data_memory_mut(&mut self) -> &mut Memory {
        self.memory_mut(DATA)
    }

    fn memory_mut(&mut self, port: usize) -> &mut Memory {
        &mut self.switch.ports_mut()[port]
    }

    /// Acknowledged beats on the data port. Empty when monitoring is off.
    #[must_use]
    pub fn data_trace(&self) -> &[Beat] {
        self.monitors.as_ref().map(|m| m[DATA].beats()).unwrap_or_default()
    }

    /// Acknowledged write beats on the data port, in order.
    pub fn data_writes(&self) -> impl Iterator<Item = &Beat> {
        self.monitors.iter().flat_map(|m| m[DATA].writes())
    }

    /// Acknowledged fetches on the program port.
    #[must_use]
    pub fn program_trace(&self) -> &[Beat] {
        self.monitors.as_ref().map(|m| m[PROGRAM].beats()).unwrap_or_default()
    }

    pub fn violations(&self) -> impl Iterator<Item = &ProtocolViolation> {
        self.monitors.iter().flatten().flat_map(BusMonitor::violations)
    }
}

fn check_link(
    switch: &BusSwitch<Memory, PORTS>,
    link: &'static str,
    destination: u8,
    expected: Lanes,
) -> Result<(), SocError> {
    switch.check_destination(destination)?;
    let found = switch
        .port(usize::from(destination))
        .map_or(expected, Memory::lanes);
    if found == expected {
        Ok(())
    } else {
        Err(SocError::PortWidth {
            link,
            destination,
            expected,
            found,
        })
    }
}

const SOC_QUERY_PATHS: &[&str] = &[
    "cycles",
    "pc", "stage", "halted", "instruction", "retired",
    "select", "cycle.0", "cycle.1",
];

impl Observable for Soc {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "cycles" => Some(self.cycles.get().into()),
            "select" | "cycle.0" | "cycle.1" => self.switch.query(path),
            _ => self.core.query(path),
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        SOC_QUERY_PATHS
    }
}
