//! Program image loading.
//!
//! Two formats are accepted: a raw little-endian binary, and text with one
//! hexadecimal 32-bit word per line. In text form an optional `0x` prefix
//! and `_` separators are allowed, `#` starts a comment, and blank lines
//! are skipped.

use std::fs;
use std::path::Path;

use crate::SocError;

/// Parse hex text into a little-endian byte image.
pub fn parse_hex(text: &str) -> Result<Vec<u8>, SocError> {
    let mut image = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let digits: String = line
            .trim_start_matches("0x")
            .trim_start_matches("0X")
            .chars()
            .filter(|&c| c != '_')
            .collect();
        let word = u32::from_str_radix(&digits, 16).map_err(|_| SocError::InvalidHex {
            line: index + 1,
            text: line.to_string(),
        })?;
        image.extend_from_slice(&word.to_le_bytes());
    }
    Ok(image)
}

/// Read a program file. `.hex` and `.txt` files are parsed as hex text,
/// anything else is taken as a raw binary.
pub fn load_file(path: &Path) -> Result<Vec<u8>, SocError> {
    let is_text = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("hex") || e.eq_ignore_ascii_case("txt"));
    if is_text {
        parse_hex(&fs::read_to_string(path)?)
    } else {
        Ok(fs::read(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_words_are_little_endian() {
        let image = parse_hex("0x00000013\n0040_006F\n").expect("parse");
        assert_eq!(image, vec![0x13, 0, 0, 0, 0x6F, 0, 0x40, 0]);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let image = parse_hex("# boot\n\n  00b00013  # addi r0, r0, 11\n").expect("parse");
        assert_eq!(image, 0x00B0_0013u32.to_le_bytes().to_vec());
    }

    #[test]
    fn bad_line_reports_its_number() {
        let err = parse_hex("00000013\nnope\n").expect_err("should fail");
        assert!(matches!(err, SocError::InvalidHex { line: 2, .. }));
    }

    #[test]
    fn word_wider_than_32_bits_is_rejected() {
        assert!(parse_hex("123456789").is_err());
    }
}
