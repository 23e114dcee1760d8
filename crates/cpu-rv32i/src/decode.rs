//! Instruction decode.
//!
//! Turns a fetched word into an [`Operation`] or a [`DecodeError`]. Decode
//! is total over the implemented subset and rejects everything else; there
//! is no "ignore and carry on" path.

use std::fmt;

use crate::instruction::Instruction;

/// Major opcodes (bits [6:0]) the core implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Lui = 0b011_0111,
    Auipc = 0b001_0111,
    OpImm = 0b001_0011,
    Jal = 0b110_1111,
    Jalr = 0b110_0111,
    Branch = 0b110_0011,
    Load = 0b000_0011,
    Store = 0b010_0011,
    Op = 0b011_0011,
}

impl Opcode {
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits {
            0b011_0111 => Self::Lui,
            0b001_0111 => Self::Auipc,
            0b001_0011 => Self::OpImm,
            0b110_1111 => Self::Jal,
            0b110_0111 => Self::Jalr,
            0b110_0011 => Self::Branch,
            0b000_0011 => Self::Load,
            0b010_0011 => Self::Store,
            0b011_0011 => Self::Op,
            _ => return None,
        })
    }
}

/// Arithmetic/logic function shared by the register and immediate forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,
}

/// Branch comparison selected by the 3-bit funct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchCond {
    Eq,
    Ne,
    Lt,
    Ge,
    Ltu,
    Geu,
}

/// Transfer width of a load or store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Byte,
    Half,
    Word,
}

impl Width {
    const fn from_funct(funct: u8) -> Option<Self> {
        match funct {
            0b000 => Some(Self::Byte),
            0b001 => Some(Self::Half),
            0b010 => Some(Self::Word),
            _ => None,
        }
    }

    /// Number of byte-wide data port beats.
    #[must_use]
    pub const fn beats(self) -> u8 {
        match self {
            Self::Byte => 1,
            Self::Half => 2,
            Self::Word => 4,
        }
    }

    /// Mask that truncates a register to this width.
    #[must_use]
    pub const fn mask(self) -> u32 {
        match self {
            Self::Byte => 0xFF,
            Self::Half => 0xFFFF,
            Self::Word => 0xFFFF_FFFF,
        }
    }
}

/// A fully decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Reg { op: AluOp, rd: u8, rs1: u8, rs2: u8 },
    Imm { op: AluOp, rd: u8, rs: u8, imm: i32 },
    /// `value` is the immediate already shifted into the upper 20 bits.
    Lui { rd: u8, value: i32 },
    Auipc { rd: u8, value: i32 },
    Jal { rd: u8, offset: i32 },
    Jalr { rd: u8, rs: u8, imm: i32 },
    Branch { cond: BranchCond, rs1: u8, rs2: u8, offset: i32 },
    Load { width: Width, rd: u8, rs: u8, imm: i32 },
    Store { width: Width, rs1: u8, rs2: u8, imm: i32 },
}

impl Operation {
    /// True for classes that retire on the fetch edge without blocking fetch.
    #[must_use]
    pub const fn is_single_cycle(&self) -> bool {
        !matches!(self, Self::Branch { .. } | Self::Load { .. } | Self::Store { .. })
    }
}

/// A word outside the implemented subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    UnknownOpcode { word: u32, opcode: u8 },
    UnknownFunction { word: u32, opcode: Opcode, funct: u8, funct_hi: u8 },
    /// Right-shift immediate whose bits [31:27] are neither 00000 nor 01000.
    UnknownShift { word: u32, pattern: u8 },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOpcode { word, opcode } => {
                write!(f, "unknown opcode {opcode:#09b} in {word:#010X}")
            }
            Self::UnknownFunction {
                word,
                opcode,
                funct,
                funct_hi,
            } => write!(
                f,
                "function not implemented: {opcode:?} funct {funct:#05b}/{funct_hi:#09b} in {word:#010X}"
            ),
            Self::UnknownShift { word, pattern } => {
                write!(f, "shift function not implemented: {pattern:#07b} in {word:#010X}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decode one instruction word.
pub fn decode(insn: Instruction) -> Result<Operation, DecodeError> {
    let word = insn.word();
    let Some(opcode) = Opcode::from_bits(insn.opcode()) else {
        return Err(DecodeError::UnknownOpcode {
            word,
            opcode: insn.opcode(),
        });
    };
    let unknown = |funct: u8, funct_hi: u8| DecodeError::UnknownFunction {
        word,
        opcode,
        funct,
        funct_hi,
    };

    let op = match opcode {
        Opcode::Lui => {
            let u = insn.u();
            Operation::Lui { rd: u.rd, value: u.upper() }
        }
        Opcode::Auipc => {
            let u = insn.u();
            Operation::Auipc { rd: u.rd, value: u.upper() }
        }
        Opcode::Jal => {
            let j = insn.j();
            Operation::Jal { rd: j.rd, offset: j.offset() }
        }
        Opcode::Jalr => {
            let i = insn.i();
            Operation::Jalr { rd: i.rd, rs: i.rs, imm: i.imm }
        }
        Opcode::Branch => {
            let b = insn.b();
            let cond = match b.funct {
                0b000 => BranchCond::Eq,
                0b001 => BranchCond::Ne,
                0b100 => BranchCond::Lt,
                0b101 => BranchCond::Ge,
                0b110 => BranchCond::Ltu,
                0b111 => BranchCond::Geu,
                other => return Err(unknown(other, 0)),
            };
            Operation::Branch {
                cond,
                rs1: b.rs1,
                rs2: b.rs2,
                offset: b.offset(),
            }
        }
        Opcode::Load => {
            let i = insn.i();
            let width = Width::from_funct(i.funct).ok_or_else(|| unknown(i.funct, 0))?;
            Operation::Load {
                width,
                rd: i.rd,
                rs: i.rs,
                imm: i.imm,
            }
        }
        Opcode::Store => {
            let s = insn.s();
            let width = Width::from_funct(s.funct).ok_or_else(|| unknown(s.funct, 0))?;
            Operation::Store {
                width,
                rs1: s.rs1,
                rs2: s.rs2,
                imm: s.offset(),
            }
        }
        Opcode::Op => {
            let r = insn.r();
            let op = match (r.funct_lo, r.funct_hi) {
                (0b000, 0b000_0000) => AluOp::Add,
                (0b000, 0b010_0000) => AluOp::Sub,
                (0b001, 0b000_0000) => AluOp::Sll,
                (0b010, 0b000_0000) => AluOp::Slt,
                (0b011, 0b000_0000) => AluOp::Sltu,
                (0b100, 0b000_0000) => AluOp::Xor,
                (0b101, 0b000_0000) => AluOp::Srl,
                (0b101, 0b010_0000) => AluOp::Sra,
                (0b110, 0b000_0000) => AluOp::Or,
                (0b111, 0b000_0000) => AluOp::And,
                (lo, hi) => return Err(unknown(lo, hi)),
            };
            Operation::Reg {
                op,
                rd: r.rd,
                rs1: r.rs1,
                rs2: r.rs2,
            }
        }
        Opcode::OpImm => {
            let i = insn.i();
            let op = match i.funct {
                0b000 => AluOp::Add,
                0b010 => AluOp::Slt,
                0b011 => AluOp::Sltu,
                0b100 => AluOp::Xor,
                0b111 => AluOp::And,
                0b001 => AluOp::Sll,
                0b101 => match insn.top5() {
                    0b00000 => AluOp::Srl,
                    0b01000 => AluOp::Sra,
                    pattern => return Err(DecodeError::UnknownShift { word, pattern }),
                },
                other => return Err(unknown(other, 0)),
            };
            Operation::Imm {
                op,
                rd: i.rd,
                rs: i.rs,
                imm: i.imm,
            }
        }
    };
    Ok(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm;

    #[test]
    fn opcode_round_trip() {
        for op in [
            Opcode::Lui,
            Opcode::Auipc,
            Opcode::OpImm,
            Opcode::Jal,
            Opcode::Jalr,
            Opcode::Branch,
            Opcode::Load,
            Opcode::Store,
            Opcode::Op,
        ] {
            assert_eq!(Opcode::from_bits(op as u8), Some(op));
        }
    }

    #[test]
    fn fence_and_system_are_unknown_opcodes() {
        assert!(matches!(
            decode(Instruction(0x0000_000F)),
            Err(DecodeError::UnknownOpcode { opcode: 0b000_1111, .. })
        ));
        assert!(matches!(
            decode(Instruction(0x0000_0073)),
            Err(DecodeError::UnknownOpcode { opcode: 0b111_0011, .. })
        ));
    }

    #[test]
    fn decodes_store_word() {
        assert_eq!(
            decode(asm::sw(0, 0, 1)),
            Ok(Operation::Store {
                width: Width::Word,
                rs1: 1,
                rs2: 0,
                imm: 0,
            })
        );
    }

    #[test]
    fn rejects_unknown_funct_hi() {
        // add with funct_hi = 0000001 (a multiply in the M extension)
        let word = asm::add(1, 2, 3).word() | 1 << 25;
        assert_eq!(
            decode(Instruction(word)),
            Err(DecodeError::UnknownFunction {
                word,
                opcode: Opcode::Op,
                funct: 0,
                funct_hi: 1,
            })
        );
        // slt with funct_hi set is rejected too, not silently ignored
        let word = asm::slt(1, 2, 3).word() | 0x20 << 25;
        assert!(decode(Instruction(word)).is_err());
    }

    #[test]
    fn shift_right_immediate_selects_on_top_bits() {
        assert!(matches!(
            decode(asm::srli(1, 2, 3)),
            Ok(Operation::Imm { op: AluOp::Srl, imm: 3, .. })
        ));
        assert!(matches!(
            decode(asm::srai(1, 2, 3)),
            Ok(Operation::Imm { op: AluOp::Sra, .. })
        ));
        let word = asm::srli(1, 2, 3).word() | 0b10000 << 27;
        assert_eq!(
            decode(Instruction(word)),
            Err(DecodeError::UnknownShift { word, pattern: 0b10000 })
        );
    }

    #[test]
    fn rejects_unsigned_loads_and_wide_stores() {
        let lbu = asm::lb(1, 2, 0).word() | 0b100 << 12;
        assert!(matches!(
            decode(Instruction(lbu)),
            Err(DecodeError::UnknownFunction { opcode: Opcode::Load, funct: 0b100, .. })
        ));
        let sd = asm::sb(1, 0, 2).word() | 0b011 << 12;
        assert!(matches!(
            decode(Instruction(sd)),
            Err(DecodeError::UnknownFunction { opcode: Opcode::Store, funct: 0b011, .. })
        ));
    }

    #[test]
    fn rejects_reserved_branch_functs() {
        let word = asm::beq(1, 2, 8).word() | 0b010 << 12;
        assert!(matches!(
            decode(Instruction(word)),
            Err(DecodeError::UnknownFunction { opcode: Opcode::Branch, funct: 0b010, .. })
        ));
    }

    #[test]
    fn immediate_or_is_not_implemented() {
        // ori r3, r1, 15
        assert!(matches!(
            decode(Instruction(0x00F0_E193)),
            Err(DecodeError::UnknownFunction { opcode: Opcode::OpImm, funct: 0b110, .. })
        ));
    }

    #[test]
    fn single_cycle_classification() {
        assert!(decode(asm::addi(1, 1, 1)).expect("addi").is_single_cycle());
        assert!(decode(asm::jal(1, 8)).expect("jal").is_single_cycle());
        assert!(decode(asm::jalr(1, 2, 0)).expect("jalr").is_single_cycle());
        assert!(!decode(asm::beq(1, 2, 8)).expect("beq").is_single_cycle());
        assert!(!decode(asm::lw(1, 2, 0)).expect("lw").is_single_cycle());
        assert!(!decode(asm::sb(1, 0, 2)).expect("sb").is_single_cycle());
    }

    #[test]
    fn error_messages_name_the_word() {
        let err = DecodeError::UnknownOpcode {
            word: 0x0000_000F,
            opcode: 0x0F,
        };
        assert_eq!(err.to_string(), "unknown opcode 0b0001111 in 0x0000000F");
    }
}
