//! Arithmetic, comparison and shift semantics.
//!
//! Pure functions over register values. The register and immediate forms
//! differ in how they treat shift amounts, so each gets its own entry
//! point.

use crate::decode::{AluOp, BranchCond};

/// Register-register arithmetic.
///
/// Left shift is deliberately narrow: a shift register value above 5
/// yields 0, anything else shifts by its low 3 bits. Right shifts use the
/// full unsigned value of `b`; 32 or more shifts everything out.
#[must_use]
pub fn register_op(op: AluOp, a: i32, b: i32) -> i32 {
    let amount = b as u32;
    match op {
        AluOp::Add => a.wrapping_add(b),
        AluOp::Sub => a.wrapping_sub(b),
        AluOp::Sll => {
            if amount > 5 {
                0
            } else {
                ((a as u32) << (amount & 0b111)) as i32
            }
        }
        AluOp::Slt => i32::from(a < b),
        AluOp::Sltu => i32::from((a as u32) < amount),
        AluOp::Xor => a ^ b,
        AluOp::Srl => (a as u32).checked_shr(amount).unwrap_or(0) as i32,
        AluOp::Sra => a.checked_shr(amount).unwrap_or(if a < 0 { -1 } else { 0 }),
        AluOp::Or => a | b,
        AluOp::And => a & b,
    }
}

/// Register-immediate arithmetic. Shifts use the low 5 bits of `imm`.
#[must_use]
pub fn immediate_op(op: AluOp, a: i32, imm: i32) -> i32 {
    let shamt = (imm as u32) & 0x1F;
    match op {
        AluOp::Add => a.wrapping_add(imm),
        AluOp::Sub => a.wrapping_sub(imm),
        AluOp::Sll => ((a as u32) << shamt) as i32,
        AluOp::Slt => i32::from(a < imm),
        AluOp::Sltu => i32::from((a as u32) < (imm as u32)),
        AluOp::Xor => a ^ imm,
        AluOp::Srl => ((a as u32) >> shamt) as i32,
        AluOp::Sra => a >> shamt,
        AluOp::Or => a | imm,
        AluOp::And => a & imm,
    }
}

#[must_use]
pub fn branch_taken(cond: BranchCond, a: i32, b: i32) -> bool {
    match cond {
        BranchCond::Eq => a == b,
        BranchCond::Ne => a != b,
        BranchCond::Lt => a < b,
        BranchCond::Ge => a >= b,
        BranchCond::Ltu => (a as u32) < (b as u32),
        BranchCond::Geu => (a as u32) >= (b as u32),
    }
}
