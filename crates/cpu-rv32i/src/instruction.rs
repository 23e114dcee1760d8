//! Instruction word and its six field layouts.
//!
//! A word is stored once as a `u32`. The layouts overlap, so each view is
//! a pure accessor that slices bit ranges out of the same word; the
//! opcode in bits [6:0] says which view is meaningful.

/// Sign-extend the low `bits` bits of `value`.
#[must_use]
pub(crate) const fn sign_extend(value: u32, bits: u32) -> i32 {
    let shift = 32 - bits;
    ((value << shift) as i32) >> shift
}

const fn field(word: u32, lo: u32, width: u32) -> u32 {
    (word >> lo) & ((1 << width) - 1)
}

/// A raw 32-bit instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Instruction(pub u32);

impl Instruction {
    #[must_use]
    pub const fn word(self) -> u32 {
        self.0
    }

    /// Bits [6:0].
    #[must_use]
    pub const fn opcode(self) -> u8 {
        field(self.0, 0, 7) as u8
    }

    /// Bits [31:27], which select between the right-shift immediates.
    #[must_use]
    pub const fn top5(self) -> u8 {
        field(self.0, 27, 5) as u8
    }

    #[must_use]
    pub const fn r(self) -> RType {
        RType {
            rd: field(self.0, 7, 5) as u8,
            funct_lo: field(self.0, 12, 3) as u8,
            rs1: field(self.0, 15, 5) as u8,
            rs2: field(self.0, 20, 5) as u8,
            funct_hi: field(self.0, 25, 7) as u8,
        }
    }

    #[must_use]
    pub const fn i(self) -> IType {
        IType {
            rd: field(self.0, 7, 5) as u8,
            funct: field(self.0, 12, 3) as u8,
            rs: field(self.0, 15, 5) as u8,
            imm: sign_extend(field(self.0, 20, 12), 12),
        }
    }

    #[must_use]
    pub const fn u(self) -> UType {
        UType {
            rd: field(self.0, 7, 5) as u8,
            imm: sign_extend(field(self.0, 12, 20), 20),
        }
    }

    #[must_use]
    pub const fn s(self) -> SType {
        SType {
            imm_lo: field(self.0, 7, 5) as u8,
            funct: field(self.0, 12, 3) as u8,
            rs1: field(self.0, 15, 5) as u8,
            rs2: field(self.0, 20, 5) as u8,
            imm_hi: field(self.0, 25, 7) as u8,
        }
    }

    #[must_use]
    pub const fn j(self) -> JType {
        JType {
            rd: field(self.0, 7, 5) as u8,
            field: field(self.0, 12, 20),
        }
    }

    #[must_use]
    pub const fn b(self) -> BType {
        BType {
            offset_lo: field(self.0, 7, 5) as u8,
            funct: field(self.0, 12, 3) as u8,
            rs1: field(self.0, 15, 5) as u8,
            rs2: field(self.0, 20, 5) as u8,
            offset_hi: field(self.0, 25, 7) as u8,
        }
    }
}

impl From<u32> for Instruction {
    fn from(word: u32) -> Self {
        Self(word)
    }
}

/// Register-register layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RType {
    pub rd: u8,
    pub funct_lo: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub funct_hi: u8,
}

/// Immediate layout. `imm` is already sign-extended from 12 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IType {
    pub rd: u8,
    pub funct: u8,
    pub rs: u8,
    pub imm: i32,
}

/// Upper-immediate layout. `imm` is the sign-extended 20-bit field, not yet
/// shifted into place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UType {
    pub rd: u8,
    pub imm: i32,
}

impl UType {
    /// The immediate as it is used: shifted left by 12.
    #[must_use]
    pub const fn upper(self) -> i32 {
        self.imm << 12
    }
}

/// Store layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SType {
    pub imm_lo: u8,
    pub funct: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub imm_hi: u8,
}

impl SType {
    /// `imm_lo | imm_hi << 5`, sign-extended from 12 bits.
    #[must_use]
    pub const fn offset(self) -> i32 {
        sign_extend(self.imm_lo as u32 | (self.imm_hi as u32) << 5, 12)
    }
}

/// Jump layout. `field` is the raw 20 bits [31:12] in their scattered order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JType {
    pub rd: u8,
    pub field: u32,
}

impl JType {
    /// Reassembled 21-bit signed jump offset. Bit 0 is always clear.
    ///
    /// field[7:0] -> offset[19:12], field[8] -> offset[11],
    /// field[18:9] -> offset[10:1], field[19] -> offset[20].
    #[must_use]
    pub const fn offset(self) -> i32 {
        let f = self.field;
        let raw = field(f, 0, 8) << 12 | field(f, 8, 1) << 11 | field(f, 9, 10) << 1 | field(f, 19, 1) << 20;
        sign_extend(raw, 21)
    }

    /// Scatter an even offset back into the 20-bit field.
    #[must_use]
    pub const fn encode_offset(offset: i32) -> u32 {
        let o = offset as u32;
        field(o, 12, 8) | field(o, 11, 1) << 8 | field(o, 1, 10) << 9 | field(o, 20, 1) << 19
    }
}

/// Branch layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BType {
    pub offset_lo: u8,
    pub funct: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub offset_hi: u8,
}

impl BType {
    /// Reassembled 13-bit signed branch offset. Bit 0 is always clear.
    ///
    /// lo[0] -> offset[11], lo[4:1] -> offset[4:1],
    /// hi[5:0] -> offset[10:5], hi[6] -> offset[12].
    #[must_use]
    pub const fn offset(self) -> i32 {
        let lo = self.offset_lo as u32;
        let hi = self.offset_hi as u32;
        let raw = field(lo, 0, 1) << 11 | field(lo, 1, 4) << 1 | field(hi, 0, 6) << 5 | field(hi, 6, 1) << 12;
        sign_extend(raw, 13)
    }

    /// Split an even offset into `(offset_lo, offset_hi)`.
    #[must_use]
    pub const fn encode_offset(offset: i32) -> (u8, u8) {
        let o = offset as u32;
        let lo = field(o, 11, 1) | field(o, 1, 4) << 1;
        let hi = field(o, 5, 6) | field(o, 12, 1) << 6;
        (lo as u8, hi as u8)
    }
}
