//! High-level file writer
//!
//! [`Writer`] is the builder most callers use: point it at a directory, hand
//! it header and body rows plus per-column rules, and `save` lays the sheets
//! out, encodes the package and commits it to disk in one step. The package
//! is encoded fully in memory before the first byte touches the filesystem,
//! so a failed write never leaves a truncated file behind.

use crate::codec;
use crate::error::{ExcelError, Result};
use crate::format::{CellFormatter, DefaultCellFormatter};
use crate::mapper::{self, ColumnRule, ColumnRules, SheetLayout};
use crate::style::{DefaultStyleConfig, StyleConfig};
use crate::types::CellValue;
use crate::workbook::Workbook;
use chrono::Local;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

/// One body worth of rows bound for one sheet
struct SheetBody {
    title: Option<String>,
    rows: Vec<Vec<CellValue>>,
}

/// Builder for writing tabular data to an xlsx file
pub struct Writer {
    dir: PathBuf,
    filename: Option<String>,
    header: Option<Vec<String>>,
    per_sheet_headers: Option<Vec<Vec<String>>>,
    sheets: Vec<SheetBody>,
    column_rules: ColumnRules,
    column_keys: Option<Vec<String>>,
    ignore_fields: HashSet<String>,
    config: Box<dyn StyleConfig>,
    formatter: Box<dyn CellFormatter>,
}

impl Writer {
    /// Target directory for the output file; created on save if absent
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Writer {
            dir: dir.into(),
            filename: None,
            header: None,
            per_sheet_headers: None,
            sheets: Vec::new(),
            column_rules: ColumnRules::new(),
            column_keys: None,
            ignore_fields: HashSet::new(),
            config: Box::new(DefaultStyleConfig),
            formatter: Box::new(DefaultCellFormatter),
        }
    }

    /// Output filename. The `.xlsx` extension is appended when absent and
    /// spaces are replaced with underscores. Without a filename a
    /// timestamp-based name is generated at save time.
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Header labels shared by every sheet, written bold on a frozen row 1
    pub fn header(mut self, labels: Vec<String>) -> Self {
        self.header = Some(labels);
        self
    }

    /// Body rows for a single-sheet document
    pub fn rows(self, rows: Vec<Vec<CellValue>>) -> Self {
        self.sheet(rows)
    }

    /// Append one sheet's body. Untitled sheets are named positionally
    /// ("Sheet 1", "Sheet 2").
    pub fn sheet(mut self, rows: Vec<Vec<CellValue>>) -> Self {
        self.sheets.push(SheetBody { title: None, rows });
        self
    }

    /// Append one sheet with an explicit title.
    ///
    /// Multi-sheet reads key results by normalized title, so a custom title
    /// written here comes back under its own normalized key rather than the
    /// positional "Sheet_N" one.
    pub fn sheet_titled(mut self, title: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        self.sheets.push(SheetBody {
            title: Some(title.into()),
            rows,
        });
        self
    }

    /// Per-sheet header labels, paired with sheets by append order at save
    /// time (so this may be called before or after the sheets are added).
    /// Overrides the shared [`header`](Self::header) for sheets that have one.
    pub fn sheet_headers(mut self, headers: Vec<Vec<String>>) -> Self {
        self.per_sheet_headers = Some(headers);
        self
    }

    /// Attach a formatting rule to a column, looked up by output key (or by
    /// header label when no column keys were supplied)
    pub fn column_rule(mut self, key: impl Into<String>, rule: ColumnRule) -> Self {
        self.column_rules.insert(key.into(), rule);
        self
    }

    /// Column keys used for rule lookup when header labels and keys differ
    pub fn column_keys(mut self, keys: Vec<String>) -> Self {
        self.column_keys = Some(keys);
        self
    }

    /// Exempt a column from all formatting beyond the row background
    pub fn ignore_field(mut self, key: impl Into<String>) -> Self {
        self.ignore_fields.insert(key.into());
        self
    }

    /// Substitute the style configuration (negative color, row backgrounds)
    pub fn style_config(mut self, config: Box<dyn StyleConfig>) -> Self {
        self.config = config;
        self
    }

    /// Substitute the cell-formatting strategy
    pub fn formatter(mut self, formatter: Box<dyn CellFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Lay out, encode and write the file. Returns the full output path.
    pub fn save(self) -> Result<PathBuf> {
        self.check_body()?;

        let multi = self.sheets.len() > 1;
        let mut workbook = Workbook::new();
        for (i, body) in self.sheets.iter().enumerate() {
            let title = match (&body.title, multi) {
                (Some(title), _) => title.clone(),
                (None, true) => format!("Sheet {}", i + 1),
                (None, false) => "Sheet 1".to_string(),
            };
            let header = self
                .per_sheet_headers
                .as_ref()
                .and_then(|headers| headers.get(i))
                .map(Vec::as_slice)
                .or(self.header.as_deref());
            mapper::layout_sheet(
                &mut workbook,
                SheetLayout {
                    title: &title,
                    header,
                    column_keys: self.column_keys.as_deref(),
                    rows: &body.rows,
                },
                &self.column_rules,
                &self.ignore_fields,
                self.config.as_ref(),
                self.formatter.as_ref(),
            )?;
        }

        let bytes = codec::encode(&workbook)?;

        fs::create_dir_all(&self.dir).map_err(|source| ExcelError::PathCreation {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.dir.join(normalize_filename(self.filename.as_deref()));
        fs::write(&path, bytes)?;
        Ok(path)
    }

    fn check_body(&self) -> Result<()> {
        if self.sheets.iter().all(|s| s.rows.is_empty()) {
            return Err(ExcelError::EmptyDocument);
        }
        for body in &self.sheets {
            if !body.rows.is_empty() && body.rows.iter().all(Vec::is_empty) {
                return Err(ExcelError::MalformedBody(
                    "rows carry no cells".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Apply the filename rules: generated timestamp name when absent, spaces to
/// underscores, `.xlsx` appended when missing
fn normalize_filename(filename: Option<&str>) -> String {
    let mut name = match filename {
        Some(name) => name.replace(' ', "_"),
        None => Local::now().format("%Y_%m_%d__%H_%M_%S_file").to_string(),
    };
    if !name.ends_with(".xlsx") {
        name.push_str(".xlsx");
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_filename() {
        assert_eq!(normalize_filename(Some("report.xlsx")), "report.xlsx");
        assert_eq!(normalize_filename(Some("report")), "report.xlsx");
        assert_eq!(
            normalize_filename(Some("q1 sales report")),
            "q1_sales_report.xlsx"
        );
    }

    #[test]
    fn test_generated_filename_has_extension() {
        let name = normalize_filename(None);
        assert!(name.ends_with("_file.xlsx"));
    }

    #[test]
    fn test_empty_body_rejected() {
        let err = Writer::new("out").rows(Vec::new()).save().unwrap_err();
        assert!(matches!(err, ExcelError::EmptyDocument));

        let err = Writer::new("out").save().unwrap_err();
        assert!(matches!(err, ExcelError::EmptyDocument));
    }

    #[test]
    fn test_cell_less_rows_rejected() {
        let err = Writer::new("out")
            .rows(vec![Vec::new(), Vec::new()])
            .save()
            .unwrap_err();
        assert!(matches!(err, ExcelError::MalformedBody(_)));
    }
}
