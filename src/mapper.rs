//! Tabular mapper: header-to-key projection, per-column formatting rules and
//! multi-sheet assembly
//!
//! The mapper sits between flat row data and the workbook model. On write it
//! lays out header and body cells and drives the [`CellFormatter`] to pick
//! styles; on read it projects positional rows into keyed records using the
//! header row.

use crate::error::Result;
use crate::format::CellFormatter;
use crate::style::StyleConfig;
use crate::types::{CellStyle, CellValue, NumberFormat};
use crate::workbook::Workbook;
use indexmap::IndexMap;
use std::collections::HashSet;

/// Mapping from header label to output key. Columns whose header has no
/// entry are dropped from projected output.
pub type HeaderMap = IndexMap<String, String>;

/// A projected record: output key to cell value, in column order
pub type Record = IndexMap<String, CellValue>;

/// Formatting rule kind for one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    /// Thousands-separated numeric format
    Number,
    /// Percentage format
    Percentage,
    /// Textual date reformatted from `old` to `new` pattern
    Date { old: String, new: String },
    /// Textual date-and-time reformatted from `old` to `new` pattern
    DateTime { old: String, new: String },
}

/// Per-column formatting rule, looked up by the column's output key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRule {
    pub kind: ColumnKind,
    /// Skip all formatting beyond the row background
    pub ignore_formatting: bool,
}

impl ColumnRule {
    pub fn new(kind: ColumnKind) -> Self {
        ColumnRule {
            kind,
            ignore_formatting: false,
        }
    }

    pub fn number() -> Self {
        Self::new(ColumnKind::Number)
    }

    pub fn percentage() -> Self {
        Self::new(ColumnKind::Percentage)
    }

    /// Date rule with the stock `Y-m-d` to `d/m/Y` patterns
    pub fn date() -> Self {
        Self::date_patterns("Y-m-d", "d/m/Y")
    }

    pub fn date_patterns(old: &str, new: &str) -> Self {
        Self::new(ColumnKind::Date {
            old: old.to_string(),
            new: new.to_string(),
        })
    }

    /// Date-time rule with the stock `Y-m-d H:i:s` to `d/m/Y H:i:s` patterns
    pub fn date_time() -> Self {
        Self::date_time_patterns("Y-m-d H:i:s", "d/m/Y H:i:s")
    }

    pub fn date_time_patterns(old: &str, new: &str) -> Self {
        Self::new(ColumnKind::DateTime {
            old: old.to_string(),
            new: new.to_string(),
        })
    }
}

/// Per-column rules keyed by output key
pub type ColumnRules = IndexMap<String, ColumnRule>;

/// Rows read from a single sheet: positional when no header mapping was
/// supplied, keyed records otherwise. The two shapes are intentional.
#[derive(Debug, Clone, PartialEq)]
pub enum Rows {
    Positional(Vec<Vec<CellValue>>),
    Keyed(Vec<Record>),
}

impl Rows {
    pub fn len(&self) -> usize {
        match self {
            Rows::Positional(rows) => rows.len(),
            Rows::Keyed(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_positional(&self) -> Option<&[Vec<CellValue>]> {
        match self {
            Rows::Positional(rows) => Some(rows),
            Rows::Keyed(_) => None,
        }
    }

    pub fn as_keyed(&self) -> Option<&[Record]> {
        match self {
            Rows::Keyed(rows) => Some(rows),
            Rows::Positional(_) => None,
        }
    }
}

/// Result of a read: a single parsed sheet comes back flat, two or more come
/// back as a mapping keyed by normalized sheet name (spaces to underscores)
#[derive(Debug, Clone, PartialEq)]
pub enum ReadResult {
    Single(Rows),
    Multi(IndexMap<String, Rows>),
}

impl ReadResult {
    pub fn into_single(self) -> Option<Rows> {
        match self {
            ReadResult::Single(rows) => Some(rows),
            ReadResult::Multi(_) => None,
        }
    }

    pub fn into_multi(self) -> Option<IndexMap<String, Rows>> {
        match self {
            ReadResult::Multi(sheets) => Some(sheets),
            ReadResult::Single(_) => None,
        }
    }
}

/// Project body rows into keyed records using the header row.
///
/// For each column present in both the row and the header, the cell is
/// emitted under `header_map[label]`; columns without a mapping entry are
/// silently omitted from every record.
pub fn project(rows: &[Vec<CellValue>], header: &[String], header_map: &HeaderMap) -> Vec<Record> {
    rows.iter()
        .map(|cells| {
            let mut record = Record::new();
            for (i, cell) in cells.iter().enumerate() {
                let Some(label) = header.get(i) else { continue };
                if let Some(key) = header_map.get(label) {
                    record.insert(key.clone(), cell.clone());
                }
            }
            record
        })
        .collect()
}

/// Everything needed to lay one sheet out into the workbook
pub(crate) struct SheetLayout<'a> {
    pub title: &'a str,
    pub header: Option<&'a [String]>,
    /// Column keys for rule lookup; falls back to the header labels
    pub column_keys: Option<&'a [String]>,
    pub rows: &'a [Vec<CellValue>],
}

/// Lay out one sheet: bold frozen header on row 1, body rows below with
/// row-parity backgrounds and per-column rule formatting.
pub(crate) fn layout_sheet(
    workbook: &mut Workbook,
    layout: SheetLayout<'_>,
    rules: &ColumnRules,
    ignore_fields: &HashSet<String>,
    config: &dyn StyleConfig,
    formatter: &dyn CellFormatter,
) -> Result<()> {
    // styles interned up front; the sheet borrow below locks the workbook
    let header_style = layout.header.is_some().then(|| {
        let mut style = CellStyle::default();
        formatter.set_bold(&mut style);
        workbook.styles_mut().intern(style)
    });

    let mut body = Vec::with_capacity(layout.rows.len());
    let mut first_row = 1u32;
    if layout.header.is_some() {
        first_row = 2;
    }

    for (i, cells) in layout.rows.iter().enumerate() {
        let row_num = first_row + i as u32;
        let mut laid = Vec::with_capacity(cells.len());

        for (col, value) in cells.iter().enumerate() {
            let mut value = value.clone();
            let mut style = CellStyle::default();
            formatter.set_background(config, &mut style, row_num);

            let key = layout
                .column_keys
                .and_then(|keys| keys.get(col))
                .or_else(|| layout.header.and_then(|h| h.get(col)));
            let ignored = key.is_some_and(|k| ignore_fields.contains(k));
            let rule = key.and_then(|k| rules.get(k));

            if !value.is_empty() && !ignored && !rule.is_some_and(|r| r.ignore_formatting) {
                match rule.map(|r| &r.kind) {
                    Some(ColumnKind::Number) => {
                        if let Some(n) = value.as_f64() {
                            formatter.set_number_format(config, &mut style, n);
                        }
                    }
                    Some(ColumnKind::Percentage) => {
                        if let Some(n) = value.as_f64() {
                            formatter.set_percentage_format(config, &mut style, n);
                        }
                    }
                    Some(ColumnKind::Date { old, new })
                    | Some(ColumnKind::DateTime { old, new }) => {
                        formatter.set_date_format(&mut style, &mut value, old, new);
                    }
                    None => {
                        // untyped numeric-looking values default to Number;
                        // timestamps keep a date-time display so they read
                        // back as dates rather than raw serials
                        if let CellValue::DateTime(_) = value {
                            style.number_format =
                                NumberFormat::DateTime("d/m/Y H:i:s".to_string());
                        } else if let Some(n) = value.as_f64() {
                            formatter.set_number_format(config, &mut style, n);
                        }
                    }
                }
            }

            let style = workbook.styles_mut().intern(style);
            laid.push((value, style));
        }
        body.push(laid);
    }

    let sheet = workbook.append_sheet(layout.title)?;

    if let (Some(header), Some(style)) = (layout.header, header_style) {
        for (col, label) in header.iter().enumerate() {
            sheet.set_cell(1, col as u32 + 1, CellValue::from(label.as_str()), style);
        }
        sheet.freeze_header_row();
    }

    for (i, laid) in body.into_iter().enumerate() {
        let row_num = first_row + i as u32;
        for (col, (value, style)) in laid.into_iter().enumerate() {
            sheet.set_cell(row_num, col as u32 + 1, value, style);
        }
    }

    Ok(())
}
