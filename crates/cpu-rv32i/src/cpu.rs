//! The processor core state machine.
//!
//! The core is a pair of bus masters plus a register file. Its requests
//! are a pure function of registered state ([`Rv32Core::program_request`],
//! [`Rv32Core::data_request`]); everything else happens on the clock edge
//! in [`Rv32Core::clock`].
//!
//! Timing, per instruction class:
//!
//! | Class                      | Cycles after the fetch ack |
//! |----------------------------|----------------------------|
//! | OP, OP-IMM, LUI, AUIPC     | 0 (retire on the ack edge) |
//! | JAL, JALR                  | 0                          |
//! | Branch                     | 1                          |
//! | Load / store of `w` bytes  | 1 setup + `w` beats        |
//!
//! Stores put the least significant byte at the lowest address. Loads
//! walk the same bytes from the highest address down and shift each one
//! in from the right, so a store followed by a load of the same width
//! returns the stored value.

use sim_core::{BusRequest, BusResponse, Observable, Ticks, Value};

use crate::decode::{BranchCond, DecodeError, Operation, Width, decode};
use crate::execute::{branch_taken, immediate_op, register_op};
use crate::instruction::Instruction;
use crate::registers::RegisterFile;

/// Where the core is between fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Program port holds an open read at `pc`.
    Fetch,
    /// Compare cycle of a conditional branch.
    Branch {
        cond: BranchCond,
        rs1: u8,
        rs2: u8,
        offset: i32,
    },
    /// Address generation; clears `rd`.
    LoadSetup { width: Width, rd: u8, rs: u8, imm: i32 },
    /// Reading bytes from `address` downwards, `remaining` beats left.
    Load { rd: u8, address: u32, remaining: u8 },
    /// Address generation; latches the truncated store value.
    StoreSetup {
        width: Width,
        rs1: u8,
        rs2: u8,
        imm: i32,
    },
    /// Writing the low byte of `data` to `address`, `remaining` beats left.
    Store { address: u32, data: u32, remaining: u8 },
    /// Stopped on an instruction outside the implemented subset.
    Halted(DecodeError),
}

impl Stage {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Branch { .. } => "branch",
            Self::LoadSetup { .. } => "load-setup",
            Self::Load { .. } => "load",
            Self::StoreSetup { .. } => "store-setup",
            Self::Store { .. } => "store",
            Self::Halted(_) => "halted",
        }
    }
}

/// RV32I-subset core with a 32-bit program port and an 8-bit data port.
#[derive(Debug, Clone)]
pub struct Rv32Core {
    regs: RegisterFile,
    /// Address of the next fetch. Already advanced past the instruction
    /// in `instruction` once that has been latched.
    pc: u32,
    /// Last fetched instruction word.
    instruction: Instruction,
    stage: Stage,
    cycles: Ticks,
    retired: u64,
}

impl Default for Rv32Core {
    fn default() -> Self {
        Self::new()
    }
}

impl Rv32Core {
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: RegisterFile::new(),
            pc: 0,
            instruction: Instruction::default(),
            stage: Stage::Fetch,
            cycles: Ticks::ZERO,
            retired: 0,
        }
    }

    /// Back to fetch at address 0 with cleared registers.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    // === Bus outputs ===

    /// Program port request for this cycle.
    #[must_use]
    pub fn program_request(&self) -> BusRequest {
        match self.stage {
            Stage::Fetch => BusRequest::read(self.pc),
            _ => BusRequest::IDLE,
        }
    }

    /// Data port request for this cycle.
    #[must_use]
    pub fn data_request(&self) -> BusRequest {
        match self.stage {
            Stage::Load { address, .. } => BusRequest::read(address),
            Stage::Store { address, data, .. } => BusRequest::write(address, data & 0xFF),
            _ => BusRequest::IDLE,
        }
    }

    /// True while the program port holds an open fetch.
    #[must_use]
    pub fn fetch_in_flight(&self) -> bool {
        matches!(self.stage, Stage::Fetch)
    }

    // === Clock edge ===

    /// Latch next state from the settled responses of both ports.
    pub fn clock(&mut self, program: &BusResponse, data_port: &BusResponse) {
        if self.is_halted() {
            return;
        }
        self.cycles.increment();

        match self.stage {
            Stage::Fetch => {
                if program.ack {
                    self.fetched(Instruction(program.read_data));
                }
            }
            Stage::Branch {
                cond,
                rs1,
                rs2,
                offset,
            } => {
                if branch_taken(cond, self.regs.get(rs1), self.regs.get(rs2)) {
                    self.pc = self.jump_target(offset);
                }
                self.retire();
            }
            Stage::LoadSetup { width, rd, rs, imm } => {
                let base = self.effective_address(rs, imm);
                self.regs.set(rd, 0);
                let beats = width.beats();
                self.enter(Stage::Load {
                    rd,
                    address: base.wrapping_add(u32::from(beats) - 1),
                    remaining: beats,
                });
            }
            Stage::Load {
                rd,
                address,
                remaining,
            } => {
                if data_port.ack {
                    let byte = data_port.read_data & 0xFF;
                    let value = (self.regs.get(rd) as u32) << 8 | byte;
                    self.regs.set(rd, value as i32);
                    if remaining > 1 {
                        self.stage = Stage::Load {
                            rd,
                            address: address.wrapping_sub(1),
                            remaining: remaining - 1,
                        };
                    } else {
                        self.retire();
                    }
                }
            }
            Stage::StoreSetup {
                width,
                rs1,
                rs2,
                imm,
            } => {
                let address = self.effective_address(rs1, imm);
                self.enter(Stage::Store {
                    address,
                    data: self.regs.get(rs2) as u32 & width.mask(),
                    remaining: width.beats(),
                });
            }
            Stage::Store {
                address,
                data,
                remaining,
            } => {
                if data_port.ack {
                    if remaining > 1 {
                        self.stage = Stage::Store {
                            address: address.wrapping_add(1),
                            data: data >> 8,
                            remaining: remaining - 1,
                        };
                    } else {
                        self.retire();
                    }
                }
            }
            Stage::Halted(_) => {}
        }
    }

    /// Fetch acknowledged: advance, decode, and either retire or enter an
    /// execute stage.
    fn fetched(&mut self, instruction: Instruction) {
        self.instruction = instruction;
        let at = self.pc;
        self.pc = self.pc.wrapping_add(4);

        let op = match decode(instruction) {
            Ok(op) => op,
            Err(err) => {
                log::error!("halt at {at:#010X}: {err}");
                self.stage = Stage::Halted(err);
                return;
            }
        };
        log::trace!("{at:#010X}: {:#010X} {op:?}", instruction.word());

        match op {
            Operation::Reg { op, rd, rs1, rs2 } => {
                let value = register_op(op, self.regs.get(rs1), self.regs.get(rs2));
                self.regs.set(rd, value);
            }
            Operation::Imm { op, rd, rs, imm } => {
                let value = immediate_op(op, self.regs.get(rs), imm);
                self.regs.set(rd, value);
            }
            Operation::Lui { rd, value } => self.regs.set(rd, value),
            Operation::Auipc { rd, value } => {
                // relative to the instruction's own address, not the advanced pc
                let value = self.pc.wrapping_sub(4).wrapping_add(value as u32);
                self.regs.set(rd, value as i32);
            }
            Operation::Jal { rd, offset } => {
                let target = self.jump_target(offset);
                self.regs.set(rd, self.pc as i32);
                self.pc = target;
            }
            Operation::Jalr { rd, rs, imm } => {
                let target = self.effective_address(rs, imm) & !1;
                self.regs.set(rd, self.pc as i32);
                self.pc = target;
            }
            Operation::Branch {
                cond,
                rs1,
                rs2,
                offset,
            } => self.enter(Stage::Branch {
                cond,
                rs1,
                rs2,
                offset,
            }),
            Operation::Load { width, rd, rs, imm } => {
                self.enter(Stage::LoadSetup { width, rd, rs, imm });
            }
            Operation::Store {
                width,
                rs1,
                rs2,
                imm,
            } => self.enter(Stage::StoreSetup {
                width,
                rs1,
                rs2,
                imm,
            }),
        }
        if op.is_single_cycle() {
            self.retired += 1;
        }
    }

    fn enter(&mut self, stage: Stage) {
        log::debug!("{} -> {}", self.stage.name(), stage.name());
        self.stage = stage;
    }

    fn retire(&mut self) {
        self.enter(Stage::Fetch);
        self.retired += 1;
    }

    /// `pc` has already advanced past the instruction, so offsets are
    /// taken relative to `pc - 4`.
    fn jump_target(&self, offset: i32) -> u32 {
        self.pc.wrapping_add(offset as u32).wrapping_sub(4)
    }

    fn effective_address(&self, base: u8, imm: i32) -> u32 {
        self.regs.get(base).wrapping_add(imm) as u32
    }

    // === Accessors ===

    #[must_use]
    pub fn pc(&self) -> u32 {
        self.pc
    }

    #[must_use]
    pub fn register(&self, index: u8) -> i32 {
        self.regs.get(index)
    }

    #[must_use]
    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    /// Last fetched instruction word.
    #[must_use]
    pub fn instruction(&self) -> Instruction {
        self.instruction
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        matches!(self.stage, Stage::Halted(_))
    }

    /// The decode error that halted the core, if any.
    #[must_use]
    pub fn fault(&self) -> Option<DecodeError> {
        match self.stage {
            Stage::Halted(err) => Some(err),
            _ => None,
        }
    }

    /// Clock edges seen while running.
    #[must_use]
    pub fn cycles(&self) -> Ticks {
        self.cycles
    }

    /// Instructions completed.
    #[must_use]
    pub fn retired(&self) -> u64 {
        self.retired
    }

    /// Set the program counter.
    ///
    /// Only available in test builds.
    #[cfg(feature = "test-utils")]
    pub fn set_pc(&mut self, value: u32) {
        self.pc = value;
    }

    /// Set a general-purpose register.
    ///
    /// Only available in test builds.
    #[cfg(feature = "test-utils")]
    pub fn set_register(&mut self, index: u8, value: i32) {
        self.regs.set(index, value);
    }
}

// === Observable implementation ===

const RV32_QUERY_PATHS: &[&str] = &[
    "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7",
    "r8", "r9", "r10", "r11", "r12", "r13", "r14", "r15",
    "r16", "r17", "r18", "r19", "r20", "r21", "r22", "r23",
    "r24", "r25", "r26", "r27", "r28", "r29", "r30", "r31",
    "pc",
    "instruction",
    "stage", "halted", "fetch_in_flight",
    "cycles", "retired",
];

impl Observable for Rv32Core {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "pc" => Some(self.pc.into()),
            "instruction" => Some(self.instruction.word().into()),
            "stage" => Some(self.stage.name().into()),
            "halted" => Some(self.is_halted().into()),
            "fetch_in_flight" => Some(self.fetch_in_flight().into()),
            "cycles" => Some(self.cycles.get().into()),
            "retired" => Some(self.retired.into()),
            _ => {
                let index: u8 = path.strip_prefix('r')?.parse().ok()?;
                (index < 32).then(|| self.regs.get(index).into())
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        RV32_QUERY_PATHS
    }
}
