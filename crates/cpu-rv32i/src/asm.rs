//! Instruction encoders for hand-assembled programs.
//!
//! Operand order follows assembly syntax: `addi rd, rs1, imm`,
//! `sw rs2, offset(rs1)` becomes `sw(rs2, offset, rs1)`,
//! `lw rd, offset(rs1)` becomes `lw(rd, offset, rs1)`.

use crate::instruction::{BType, Instruction, JType};

const OP: u32 = 0b011_0011;
const OP_IMM: u32 = 0b001_0011;
const LOAD: u32 = 0b000_0011;
const STORE: u32 = 0b010_0011;
const BRANCH: u32 = 0b110_0011;

fn reg(r: u8) -> u32 {
    u32::from(r & 0x1F)
}

#[must_use]
pub fn r_type(opcode: u32, rd: u8, funct_lo: u32, rs1: u8, rs2: u8, funct_hi: u32) -> Instruction {
    Instruction(
        (funct_hi & 0x7F) << 25
            | reg(rs2) << 20
            | reg(rs1) << 15
            | (funct_lo & 0x7) << 12
            | reg(rd) << 7
            | (opcode & 0x7F),
    )
}

#[must_use]
pub fn i_type(opcode: u32, rd: u8, funct: u32, rs1: u8, imm: i32) -> Instruction {
    Instruction(
        ((imm as u32) & 0xFFF) << 20 | reg(rs1) << 15 | (funct & 0x7) << 12 | reg(rd) << 7 | (opcode & 0x7F),
    )
}

#[must_use]
pub fn s_type(funct: u32, rs1: u8, rs2: u8, offset: i32) -> Instruction {
    let imm = (offset as u32) & 0xFFF;
    Instruction(
        (imm >> 5) << 25 | reg(rs2) << 20 | reg(rs1) << 15 | (funct & 0x7) << 12 | (imm & 0x1F) << 7 | STORE,
    )
}

#[must_use]
pub fn b_type(funct: u32, rs1: u8, rs2: u8, offset: i32) -> Instruction {
    let (lo, hi) = BType::encode_offset(offset);
    Instruction(
        u32::from(hi) << 25 | reg(rs2) << 20 | reg(rs1) << 15 | (funct & 0x7) << 12 | u32::from(lo) << 7 | BRANCH,
    )
}

/// `imm` is the 20-bit upper immediate, before the shift by 12.
#[must_use]
pub fn u_type(opcode: u32, rd: u8, imm: i32) -> Instruction {
    Instruction(((imm as u32) & 0xF_FFFF) << 12 | reg(rd) << 7 | (opcode & 0x7F))
}

#[must_use]
pub fn add(rd: u8, rs1: u8, rs2: u8) -> Instruction {
    r_type(OP, rd, 0b000, rs1, rs2, 0)
}

#[must_use]
pub fn sub(rd: u8, rs1: u8, rs2: u8) -> Instruction {
    r_type(OP, rd, 0b000, rs1, rs2, 0b010_0000)
}

#[must_use]
pub fn sll(rd: u8, rs1: u8, rs2: u8) -> Instruction {
    r_type(OP, rd, 0b001, rs1, rs2, 0)
}

#[must_use]
pub fn slt(rd: u8, rs1: u8, rs2: u8) -> Instruction {
    r_type(OP, rd, 0b010, rs1, rs2, 0)
}

#[must_use]
pub fn sltu(rd: u8, rs1: u8, rs2: u8) -> Instruction {
    r_type(OP, rd, 0b011, rs1, rs2, 0)
}

#[must_use]
pub fn xor(rd: u8, rs1: u8, rs2: u8) -> Instruction {
    r_type(OP, rd, 0b100, rs1, rs2, 0)
}

#[must_use]
pub fn srl(rd: u8, rs1: u8, rs2: u8) -> Instruction {
    r_type(OP, rd, 0b101, rs1, rs2, 0)
}

#[must_use]
pub fn sra(rd: u8, rs1: u8, rs2: u8) -> Instruction {
    r_type(OP, rd, 0b101, rs1, rs2, 0b010_0000)
}

#[must_use]
pub fn or(rd: u8, rs1: u8, rs2: u8) -> Instruction {
    r_type(OP, rd, 0b110, rs1, rs2, 0)
}

#[must_use]
pub fn and(rd: u8, rs1: u8, rs2: u8) -> Instruction {
    r_type(OP, rd, 0b111, rs1, rs2, 0)
}

#[must_use]
pub fn addi(rd: u8, rs1: u8, imm: i32) -> Instruction {
    i_type(OP_IMM, rd, 0b000, rs1, imm)
}

#[must_use]
pub fn slti(rd: u8, rs1: u8, imm: i32) -> Instruction {
    i_type(OP_IMM, rd, 0b010, rs1, imm)
}

#[must_use]
pub fn sltiu(rd: u8, rs1: u8, imm: i32) -> Instruction {
    i_type(OP_IMM, rd, 0b011, rs1, imm)
}

#[must_use]
pub fn xori(rd: u8, rs1: u8, imm: i32) -> Instruction {
    i_type(OP_IMM, rd, 0b100, rs1, imm)
}

#[must_use]
pub fn andi(rd: u8, rs1: u8, imm: i32) -> Instruction {
    i_type(OP_IMM, rd, 0b111, rs1, imm)
}

#[must_use]
pub fn slli(rd: u8, rs1: u8, shamt: u8) -> Instruction {
    i_type(OP_IMM, rd, 0b001, rs1, i32::from(shamt & 0x1F))
}

#[must_use]
pub fn srli(rd: u8, rs1: u8, shamt: u8) -> Instruction {
    i_type(OP_IMM, rd, 0b101, rs1, i32::from(shamt & 0x1F))
}

#[must_use]
pub fn srai(rd: u8, rs1: u8, shamt: u8) -> Instruction {
    i_type(OP_IMM, rd, 0b101, rs1, 0x400 | i32::from(shamt & 0x1F))
}

#[must_use]
pub fn lui(rd: u8, imm: i32) -> Instruction {
    u_type(0b011_0111, rd, imm)
}

#[must_use]
pub fn auipc(rd: u8, imm: i32) -> Instruction {
    u_type(0b001_0111, rd, imm)
}

#[must_use]
pub fn jal(rd: u8, offset: i32) -> Instruction {
    Instruction(JType::encode_offset(offset) << 12 | reg(rd) << 7 | 0b110_1111)
}

#[must_use]
pub fn jalr(rd: u8, rs1: u8, imm: i32) -> Instruction {
    i_type(0b110_0111, rd, 0b000, rs1, imm)
}

#[must_use]
pub fn beq(rs1: u8, rs2: u8, offset: i32) -> Instruction {
    b_type(0b000, rs1, rs2, offset)
}

#[must_use]
pub fn bne(rs1: u8, rs2: u8, offset: i32) -> Instruction {
    b_type(0b001, rs1, rs2, offset)
}

#[must_use]
pub fn blt(rs1: u8, rs2: u8, offset: i32) -> Instruction {
    b_type(0b100, rs1, rs2, offset)
}

#[must_use]
pub fn bge(rs1: u8, rs2: u8, offset: i32) -> Instruction {
    b_type(0b101, rs1, rs2, offset)
}

#[must_use]
pub fn bltu(rs1: u8, rs2: u8, offset: i32) -> Instruction {
    b_type(0b110, rs1, rs2, offset)
}

#[must_use]
pub fn bgeu(rs1: u8, rs2: u8, offset: i32) -> Instruction {
    b_type(0b111, rs1, rs2, offset)
}

#[must_use]
pub fn lb(rd: u8, offset: i32, rs1: u8) -> Instruction {
    i_type(LOAD, rd, 0b000, rs1, offset)
}

#[must_use]
pub fn lh(rd: u8, offset: i32, rs1: u8) -> Instruction {
    i_type(LOAD, rd, 0b001, rs1, offset)
}

#[must_use]
pub fn lw(rd: u8, offset: i32, rs1: u8) -> Instruction {
    i_type(LOAD, rd, 0b010, rs1, offset)
}

#[must_use]
pub fn sb(rs2: u8, offset: i32, rs1: u8) -> Instruction {
    s_type(0b000, rs1, rs2, offset)
}

#[must_use]
pub fn sh(rs2: u8, offset: i32, rs1: u8) -> Instruction {
    s_type(0b001, rs1, rs2, offset)
}

#[must_use]
pub fn sw(rs2: u8, offset: i32, rs1: u8) -> Instruction {
    s_type(0b010, rs1, rs2, offset)
}

/// Flatten a program into little-endian bytes for a program memory image.
#[must_use]
pub fn to_bytes(program: &[Instruction]) -> Vec<u8> {
    program.iter().flat_map(|i| i.word().to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_reference_encodings() {
        assert_eq!(sub(3, 1, 2).word(), 0x4020_81B3);
        assert_eq!(addi(5, 6, -1).word(), 0xFFF3_0293);
        assert_eq!(lui(1, 0x8_0000).word(), 0x8000_00B7);
        assert_eq!(sw(2, -4, 1).word(), 0xFE20_AE23);
        assert_eq!(jal(1, 8).word(), 0x0080_00EF);
        assert_eq!(jal(0, -4).word(), 0xFFDF_F06F);
        assert_eq!(beq(1, 2, 8).word(), 0x0020_8463);
        assert_eq!(bne(1, 2, -8).word(), 0xFE20_9CE3);
    }

    #[test]
    fn store_fields_land_in_s_layout() {
        let s = sw(0, 0, 1).s();
        assert_eq!((s.rs1, s.rs2, s.funct, s.offset()), (1, 0, 0b010, 0));
        let s = sh(7, 2047, 9).s();
        assert_eq!((s.rs1, s.rs2, s.funct, s.offset()), (9, 7, 0b001, 2047));
    }

    #[test]
    fn srai_sets_bit_30() {
        assert_eq!(srai(1, 2, 4).top5(), 0b01000);
        assert_eq!(srli(1, 2, 4).top5(), 0b00000);
    }

    #[test]
    fn to_bytes_is_little_endian() {
        assert_eq!(to_bytes(&[Instruction(0x1122_3344)]), vec![0x44, 0x33, 0x22, 0x11]);
    }
}
