//! Multi-cycle RV32I-subset processor core.
//!
//! The core talks to the outside world only through two bus masters: a
//! 32-bit program port used for instruction fetch and an 8-bit data port
//! used for loads and stores. Arithmetic, upper-immediate and jump
//! instructions retire on the same clock edge their fetch is acknowledged,
//! so fetch streams without a stall. Branches, loads and stores park the
//! core in an execute stage that blocks fetch until they finish.
//!
//! The instruction subset is closed: anything outside it halts the core
//! with a [`DecodeError`]. There is no trap path.

pub mod asm;
mod cpu;
mod decode;
mod execute;
mod instruction;
mod registers;

pub use cpu::{Rv32Core, Stage};
pub use decode::{AluOp, BranchCond, DecodeError, Opcode, Operation, Width, decode};
pub use execute::{branch_taken, immediate_op, register_op};
pub use instruction::{BType, IType, Instruction, JType, RType, SType, UType};
pub use registers::RegisterFile;
