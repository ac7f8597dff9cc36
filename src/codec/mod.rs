//! OOXML spreadsheet codec
//!
//! [`writer::encode`] serializes a [`Workbook`](crate::workbook::Workbook)
//! into a zip-packaged xlsx byte stream; [`reader::decode`] parses one back.
//! Spreadsheet-style letter+number cell addresses are an external-format
//! concern and stay confined to this module.

pub mod dates;
pub mod reader;
pub mod shared_strings;
pub mod styles;
pub mod writer;
pub mod xml;

pub use reader::{decode, SheetTable};
pub use writer::encode;

/// Convert a 1-based column index to a letter reference (1 -> A, 27 -> AA)
pub(crate) fn col_to_letters(col: u32) -> String {
    let mut out = String::new();
    let mut n = col;
    while n > 0 {
        let rem = (n - 1) % 26;
        out.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    out
}

/// Parse a cell reference such as "B12" into 1-based (row, col)
pub(crate) fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    let split = cell_ref.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = cell_ref.split_at(split);

    let mut col: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_uppercase() {
            return None;
        }
        col = col.checked_mul(26)?.checked_add(ch as u32 - 'A' as u32 + 1)?;
    }
    if col == 0 {
        return None;
    }

    let row: u32 = digits.parse().ok().filter(|&r| r >= 1)?;
    Some((row, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_col_to_letters() {
        assert_eq!(col_to_letters(1), "A");
        assert_eq!(col_to_letters(26), "Z");
        assert_eq!(col_to_letters(27), "AA");
        assert_eq!(col_to_letters(702), "ZZ");
        assert_eq!(col_to_letters(703), "AAA");
    }

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!(parse_cell_ref("A1"), Some((1, 1)));
        assert_eq!(parse_cell_ref("Z9"), Some((9, 26)));
        assert_eq!(parse_cell_ref("AA10"), Some((10, 27)));
        assert_eq!(parse_cell_ref(""), None);
        assert_eq!(parse_cell_ref("12"), None);
        assert_eq!(parse_cell_ref("ABC"), None);
    }

    #[test]
    fn test_ref_roundtrip() {
        for col in [1, 25, 26, 27, 51, 52, 701, 702, 703] {
            let reference = format!("{}{}", col_to_letters(col), 7);
            assert_eq!(parse_cell_ref(&reference), Some((7, col)));
        }
    }
}
