//! In-memory workbook document model
//!
//! Sheets hold dense 1-based rows of (value, style index) cells; styles live
//! in the workbook-wide [`StyleTable`]. The model stays letterless: column
//! letters only exist at the codec boundary.

use crate::error::{ExcelError, Result};
use crate::style::StyleTable;
use crate::types::CellValue;

/// Characters forbidden in sheet names
const FORBIDDEN_NAME_CHARS: [char; 7] = [':', '\\', '/', '?', '*', '[', ']'];

/// A cell: value plus style-table index
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: u32,
}

impl Cell {
    pub fn new(value: CellValue, style: u32) -> Self {
        Cell { value, style }
    }
}

/// A single worksheet
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    rows: Vec<Vec<Cell>>,
    frozen_row: Option<u32>,
}

impl Sheet {
    fn new(name: &str) -> Self {
        Sheet {
            name: name.to_string(),
            rows: Vec::new(),
            frozen_row: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set a cell at 1-based (row, col). Gaps the caller skips stay `Empty`
    /// with the default style. Index 0 on either axis is out of range and
    /// the write is ignored.
    pub fn set_cell(&mut self, row: u32, col: u32, value: CellValue, style: u32) {
        if row < 1 || col < 1 {
            return;
        }
        let (row, col) = (row as usize - 1, col as usize - 1);

        if self.rows.len() <= row {
            self.rows.resize(row + 1, Vec::new());
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, Cell::new(CellValue::Empty, 0));
        }
        cells[col] = Cell::new(value, style);
    }

    /// Look up a cell at 1-based (row, col)
    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.rows
            .get(row as usize - 1)
            .and_then(|r| r.get(col as usize - 1))
    }

    /// Rows in order, first row at index 0
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> u32 {
        self.rows.len() as u32
    }

    /// Freeze the pane above row 2, keeping the header visible
    pub fn freeze_header_row(&mut self) {
        self.frozen_row = Some(1);
    }

    pub fn frozen_row(&self) -> Option<u32> {
        self.frozen_row
    }

    /// Advisory column widths in characters, derived from the widest cell
    /// text per column. Metadata only, never required for correctness.
    pub(crate) fn advisory_col_widths(&self) -> Vec<f64> {
        let max_cols = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0usize; max_cols];
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.value.as_string().chars().count());
            }
        }
        widths
            .into_iter()
            .map(|w| (w + 2).clamp(8, 60) as f64)
            .collect()
    }
}

/// The in-memory spreadsheet document: ordered sheets plus the shared
/// style table. Insertion order is display order.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    styles: StyleTable,
}

impl Workbook {
    pub fn new() -> Self {
        Workbook {
            sheets: Vec::new(),
            styles: StyleTable::new(),
        }
    }

    /// Append a sheet and return a handle to it.
    ///
    /// Duplicates are compared on the raw name; underscore normalization is
    /// a lookup-key concern and deliberately not applied here.
    pub fn append_sheet(&mut self, name: &str) -> Result<&mut Sheet> {
        validate_sheet_name(name)?;
        if self.sheets.iter().any(|s| s.name == name) {
            return Err(ExcelError::DuplicateSheetName(name.to_string()));
        }
        self.sheets.push(Sheet::new(name));
        Ok(self.sheets.last_mut().expect("sheet was just pushed"))
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    pub fn styles_mut(&mut self) -> &mut StyleTable {
        &mut self.styles
    }
}

/// Normalize a sheet title into a lookup key: spaces become underscores
pub fn normalize_sheet_key(name: &str) -> String {
    name.replace(' ', "_")
}

fn validate_sheet_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name.chars().count() > 31
        || name.chars().any(|c| FORBIDDEN_NAME_CHARS.contains(&c))
    {
        return Err(ExcelError::InvalidSheetName(name.to_string()));
    }
    Ok(())
}
