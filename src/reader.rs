//! High-level file reader
//!
//! [`Reader`] opens an xlsx file and returns its tabular content. Row 1 is
//! treated as the header row unless header mode is switched off; with a
//! column-to-key mapping the body rows come back as keyed records instead of
//! positional rows. Parsing one sheet yields the rows directly; parsing two
//! or more yields a mapping keyed by normalized sheet name.

use crate::codec::{self, SheetTable};
use crate::error::{ExcelError, Result};
use crate::mapper::{project, HeaderMap, ReadResult, Rows};
use crate::types::CellValue;
use crate::workbook::normalize_sheet_key;
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Builder for reading tabular data from an xlsx file
#[derive(Debug)]
pub struct Reader {
    path: PathBuf,
    has_header: bool,
    sheets: Option<Vec<String>>,
    header_map: Option<HeaderMap>,
}

impl Reader {
    /// Open `filename` inside `dir`. The `.xlsx` extension is appended when
    /// absent. Fails with [`ExcelError::FileNotFound`] when the file does
    /// not exist.
    pub fn open(dir: impl AsRef<Path>, filename: &str) -> Result<Self> {
        let mut name = filename.to_string();
        if !name.ends_with(".xlsx") {
            name.push_str(".xlsx");
        }
        Self::from_path(dir.as_ref().join(name))
    }

    /// Open an xlsx file at a full path
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(ExcelError::FileNotFound(path));
        }
        Ok(Reader {
            path,
            has_header: true,
            sheets: None,
            header_map: None,
        })
    }

    /// Toggle header mode (on by default). With it off, row 1 is data and no
    /// projection happens.
    pub fn has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Restrict the read to these sheet names, in the order given. Unknown
    /// names fail the read.
    pub fn sheets(mut self, names: Vec<String>) -> Self {
        self.sheets = Some(names);
        self
    }

    /// Project body rows into keyed records using this header-label to
    /// output-key mapping. Labels without an entry drop their column.
    pub fn column_to_key(mut self, map: HeaderMap) -> Self {
        self.header_map = Some(map);
        self
    }

    /// Parse the file and return its rows
    pub fn read(self) -> Result<ReadResult> {
        let bytes = fs::read(&self.path)?;
        let tables = codec::decode(&bytes, self.sheets.as_deref())?;
        shape(tables, self.has_header, self.header_map.as_ref())
    }
}

/// Split off headers, project, and pick the single/multi result shape
fn shape(
    tables: Vec<SheetTable>,
    has_header: bool,
    header_map: Option<&HeaderMap>,
) -> Result<ReadResult> {
    let single = tables.len() == 1;
    let mut sheets = IndexMap::with_capacity(tables.len());

    for table in tables {
        let key = normalize_sheet_key(&table.name);
        sheets.insert(key, sheet_rows(table.rows, has_header, header_map)?);
    }

    if single {
        let (_, rows) = sheets.pop().ok_or(ExcelError::EmptyDocument)?;
        return Ok(ReadResult::Single(rows));
    }
    Ok(ReadResult::Multi(sheets))
}

fn sheet_rows(
    mut rows: Vec<Vec<CellValue>>,
    has_header: bool,
    header_map: Option<&HeaderMap>,
) -> Result<Rows> {
    let header = if has_header {
        if rows.is_empty() {
            return Err(ExcelError::EmptyDocument);
        }
        let labels: Vec<String> = rows.remove(0).iter().map(|c| c.as_string()).collect();
        Some(labels)
    } else {
        None
    };

    if rows.is_empty() {
        return Err(ExcelError::EmptyDocument);
    }

    match (header, header_map) {
        (Some(header), Some(map)) if !map.is_empty() => {
            Ok(Rows::Keyed(project(&rows, &header, map)))
        }
        _ => Ok(Rows::Positional(rows)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;

    fn table(name: &str, rows: Vec<Vec<CellValue>>) -> SheetTable {
        SheetTable {
            name: name.to_string(),
            rows,
        }
    }

    fn text_row(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::from(*v)).collect()
    }

    #[test]
    fn test_open_missing_file_fails() {
        let err = Reader::open("/nonexistent", "nope").unwrap_err();
        match err {
            ExcelError::FileNotFound(path) => {
                assert_eq!(path, PathBuf::from("/nonexistent/nope.xlsx"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_single_sheet_is_flat() {
        let tables = vec![table(
            "Sheet 1",
            vec![text_row(&["A"]), text_row(&["a1"])],
        )];
        let result = shape(tables, true, None).unwrap();
        let rows = result.into_single().unwrap();
        assert_eq!(rows.as_positional().unwrap(), &[text_row(&["a1"])]);
    }

    #[test]
    fn test_multi_sheet_is_keyed_by_normalized_name() {
        let tables = vec![
            table("Foglio 1", vec![text_row(&["A"]), text_row(&["a1"])]),
            table("Foglio 2", vec![text_row(&["A"]), text_row(&["a2"])]),
        ];
        let result = shape(tables, true, None).unwrap();
        let sheets = result.into_multi().unwrap();
        assert_eq!(
            sheets.keys().collect::<Vec<_>>(),
            vec!["Foglio_1", "Foglio_2"]
        );
    }

    #[test]
    fn test_projection_applies_in_header_mode() {
        let mut map = HeaderMap::new();
        map.insert("A".to_string(), "x".to_string());

        let tables = vec![table(
            "Sheet 1",
            vec![text_row(&["A", "B"]), text_row(&["a1", "b1"])],
        )];
        let result = shape(tables, true, Some(&map)).unwrap();
        let rows = result.into_single().unwrap();
        let records = rows.as_keyed().unwrap();
        assert_eq!(records[0].get("x"), Some(&CellValue::from("a1")));
        assert_eq!(records[0].len(), 1);
    }

    #[test]
    fn test_headerless_keeps_row_one() {
        let tables = vec![table("Sheet 1", vec![text_row(&["a1"])])];
        let result = shape(tables, false, None).unwrap();
        let rows = result.into_single().unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_header_only_sheet_is_empty() {
        let tables = vec![table("Sheet 1", vec![text_row(&["A"])])];
        let err = shape(tables, true, None).unwrap_err();
        assert!(matches!(err, ExcelError::EmptyDocument));
    }
}
