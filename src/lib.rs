//! # exceltab
//!
//! A from-scratch xlsx codec for tabular data with header/body semantics,
//! per-column formatting rules and multi-sheet support.
//!
//! ## Features
//!
//! - **Self-contained codec**: zip + XML reading and writing without a
//!   spreadsheet library underneath
//! - **Deterministic Output**: the same workbook always serializes to
//!   byte-identical bytes, so outputs can be golden-file tested
//! - **Header Semantics**: bold frozen header row on write, header-to-key
//!   projection into records on read
//! - **Column Rules**: number, percentage and date/date-time formatting per
//!   column, with configurable negative-value and row-parity styling
//! - **Multi-sheet**: positional or titled sheets on write; multi-sheet
//!   reads come back keyed by normalized sheet name
//! - **Pluggable Styling**: style configuration and formatting strategy are
//!   traits, substitutable per call
//!
//! ## Quick Start
//!
//! ### Writing a file
//!
//! ```rust,no_run
//! use exceltab::{CellValue, ColumnRule, Writer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let path = Writer::new("out")
//!     .filename("report")
//!     .header(vec!["Name".into(), "Balance".into(), "Since".into()])
//!     .rows(vec![
//!         vec!["Alice".into(), CellValue::Number(1250.0), "2021-01-01".into()],
//!         vec!["Bob".into(), CellValue::Number(-40.5), "2019-06-12".into()],
//!     ])
//!     .column_rule("Balance", ColumnRule::number())
//!     .column_rule("Since", ColumnRule::date())
//!     .save()?;
//! println!("wrote {}", path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ### Reading it back
//!
//! ```rust,no_run
//! use exceltab::{HeaderMap, Reader};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut map = HeaderMap::new();
//! map.insert("Name".to_string(), "name".to_string());
//! map.insert("Balance".to_string(), "balance".to_string());
//!
//! let result = Reader::open("out", "report")?
//!     .column_to_key(map)
//!     .read()?;
//!
//! for record in result.into_single().unwrap().as_keyed().unwrap() {
//!     println!("{:?} -> {:?}", record.get("name"), record.get("balance"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod format;
pub mod mapper;
pub mod reader;
pub mod style;
pub mod types;
pub mod workbook;
pub mod writer;

pub use error::{ExcelError, Result};
pub use format::{CellFormatter, DefaultCellFormatter};
pub use mapper::{ColumnKind, ColumnRule, ColumnRules, HeaderMap, ReadResult, Record, Rows};
pub use reader::Reader;
pub use style::{DefaultStyleConfig, StyleConfig};
pub use types::{CellStyle, CellValue, NumberFormat, Rgb};
pub use workbook::{Cell, Sheet, Workbook};
pub use writer::Writer;

/// Write header and body rows to `dir/filename` in one call, with default
/// styling and no column rules
pub fn write_to(
    dir: impl Into<std::path::PathBuf>,
    filename: &str,
    header: Vec<String>,
    rows: Vec<Vec<CellValue>>,
) -> Result<std::path::PathBuf> {
    Writer::new(dir)
        .filename(filename)
        .header(header)
        .rows(rows)
        .save()
}

/// Read the tabular content of `dir/filename` in one call, header mode on
pub fn read_from(dir: impl AsRef<std::path::Path>, filename: &str) -> Result<ReadResult> {
    Reader::open(dir, filename)?.read()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_imports() {
        // Test that all public types are accessible
        let _ = std::marker::PhantomData::<ExcelError>;
        let _ = std::marker::PhantomData::<Reader>;
        let _ = std::marker::PhantomData::<Writer>;
        let _ = std::marker::PhantomData::<Workbook>;
    }
}
