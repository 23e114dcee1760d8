//! General-purpose register file.

/// 32 signed 32-bit registers.
///
/// Register 0 is an ordinary register here: it is not hardwired to zero
/// and writes to it stick.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegisterFile {
    cells: [i32; 32],
}

impl RegisterFile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a register. Only the low 5 bits of `index` are used.
    #[must_use]
    pub fn get(&self, index: u8) -> i32 {
        self.cells[usize::from(index & 0x1F)]
    }

    pub fn set(&mut self, index: u8, value: i32) {
        self.cells[usize::from(index & 0x1F)] = value;
    }

    #[must_use]
    pub fn as_slice(&self) -> &[i32; 32] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_zero_is_writable() {
        let mut regs = RegisterFile::new();
        regs.set(0, 11);
        assert_eq!(regs.get(0), 11);
    }

    #[test]
    fn slice_is_in_index_order() {
        let mut regs = RegisterFile::new();
        regs.set(31, 5);
        regs.set(2, -1);
        let cells = regs.as_slice();
        assert_eq!((cells[2], cells[31]), (-1, 5));
        assert_eq!(cells.iter().filter(|&&v| v != 0).count(), 2);
    }

    #[test]
    fn index_wraps_to_five_bits() {
        let mut regs = RegisterFile::new();
        regs.set(33, -7);
        assert_eq!(regs.get(1), -7);
    }
}
