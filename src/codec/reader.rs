//! Workbook parsing from a zip-packaged xlsx byte stream

use crate::codec::dates::from_serial;
use crate::codec::parse_cell_ref;
use crate::codec::styles::StylesPart;
use crate::error::{ExcelError, Result};
use crate::types::CellValue;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read};

/// One parsed worksheet: raw title plus dense rows in document order
#[derive(Debug, Clone)]
pub struct SheetTable {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

fn malformed(part: &str, err: impl std::fmt::Display) -> ExcelError {
    ExcelError::Decode(format!("malformed {part}: {err}"))
}

/// Parse an xlsx byte stream into its sheets.
///
/// When `selection` is given only those sheets are parsed, in the order
/// requested; otherwise all sheets are parsed in document order. Fails with
/// [`ExcelError::Decode`] on a corrupt archive, a missing required part,
/// malformed XML or an unknown requested sheet, and with
/// [`ExcelError::EmptyDocument`] when the workbook has no sheets at all.
pub fn decode(bytes: &[u8], selection: Option<&[String]>) -> Result<Vec<SheetTable>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExcelError::Decode(format!("not a valid xlsx package: {e}")))?;

    let workbook_xml = read_part(&mut archive, "xl/workbook.xml")?;
    let sheets = parse_sheet_list(&workbook_xml)?;
    if sheets.is_empty() {
        return Err(ExcelError::EmptyDocument);
    }

    let rels_xml = read_part(&mut archive, "xl/_rels/workbook.xml.rels")?;
    let targets = parse_relationships(&rels_xml)?;

    let strings = match read_part_optional(&mut archive, "xl/sharedStrings.xml")? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let styles = match read_part_optional(&mut archive, "xl/styles.xml")? {
        Some(xml) => StylesPart::parse(&xml)?,
        None => StylesPart::empty(),
    };

    let requested: Vec<&(String, String)> = match selection {
        Some(names) => names
            .iter()
            .map(|name| {
                sheets
                    .iter()
                    .find(|(sheet_name, _)| sheet_name == name)
                    .ok_or_else(|| ExcelError::Decode(format!("sheet '{name}' not found")))
            })
            .collect::<Result<_>>()?,
        None => sheets.iter().collect(),
    };

    let mut tables = Vec::with_capacity(requested.len());
    for (name, rid) in requested {
        let target = targets
            .get(rid)
            .ok_or_else(|| ExcelError::Decode(format!("no relationship for sheet '{name}'")))?;
        let path = resolve_target(target);
        let sheet_xml = read_part(&mut archive, &path)?;
        let rows = parse_worksheet(&sheet_xml, &strings, &styles)?;
        tables.push(SheetTable {
            name: name.clone(),
            rows,
        });
    }

    Ok(tables)
}

fn read_part(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Vec<u8>> {
    read_part_optional(archive, name)?
        .ok_or_else(|| ExcelError::Decode(format!("missing required part '{name}'")))
}

fn read_part_optional(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<Vec<u8>>> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            Ok(Some(data))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(ExcelError::Decode(format!("cannot read part '{name}': {e}"))),
    }
}

/// Worksheet targets are relative to xl/; absolute targets keep their path
fn resolve_target(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_string()
    } else {
        format!("xl/{target}")
    }
}

fn attr_value(e: &BytesStart<'_>, key: &[u8], part: &str) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            let value = attr.unescape_value().map_err(|err| malformed(part, err))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Sheet (name, relationship id) pairs in document order
fn parse_sheet_list(xml: &[u8]) -> Result<Vec<(String, String)>> {
    const PART: &str = "workbook.xml";
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut sheets = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(|e| malformed(PART, e))? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"sheet" => {
                let name = attr_value(&e, b"name", PART)?
                    .ok_or_else(|| malformed(PART, "sheet without name"))?;
                let rid = attr_value(&e, b"r:id", PART)?
                    .ok_or_else(|| malformed(PART, "sheet without r:id"))?;
                sheets.push((name, rid));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(sheets)
}

fn parse_relationships(xml: &[u8]) -> Result<HashMap<String, String>> {
    const PART: &str = "workbook.xml.rels";
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut targets = HashMap::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(|e| malformed(PART, e))? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"Relationship" => {
                let id = attr_value(&e, b"Id", PART)?;
                let target = attr_value(&e, b"Target", PART)?;
                if let (Some(id), Some(target)) = (id, target) {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(targets)
}

/// Shared strings in table order; rich-text runs collapse to their
/// concatenated text
fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>> {
    const PART: &str = "sharedStrings.xml";
    let mut reader = Reader::from_reader(xml);

    let mut strings = Vec::new();
    let mut buf = Vec::new();
    let mut current: Option<String> = None;
    let mut in_t = false;

    loop {
        match reader.read_event_into(&mut buf).map_err(|e| malformed(PART, e))? {
            Event::Start(e) => match e.name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" => in_t = true,
                _ => {}
            },
            Event::Empty(e) if e.name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(e) if in_t => {
                let text = e.unescape().map_err(|err| malformed(PART, err))?;
                if let Some(s) = current.as_mut() {
                    s.push_str(&text);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"t" => in_t = false,
                b"si" => strings.push(current.take().unwrap_or_default()),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

fn parse_worksheet(
    xml: &[u8],
    strings: &[String],
    styles: &StylesPart,
) -> Result<Vec<Vec<CellValue>>> {
    const PART: &str = "worksheet";
    let mut reader = Reader::from_reader(xml);

    let mut rows: Vec<Vec<CellValue>> = Vec::new();

    // per-cell state
    let mut current_row: u32 = 0;
    let mut next_col: u32 = 1;
    let mut cell_ref: Option<(u32, u32)> = None;
    let mut cell_type: Option<String> = None;
    let mut cell_style: u32 = 0;
    let mut value: Option<String> = None;
    let mut in_value = false;
    let mut in_inline_text = false;
    let mut in_cell = false;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(|e| malformed(PART, e))? {
            Event::Start(ref e) | Event::Empty(ref e) if e.name().as_ref() == b"row" => {
                current_row = match attr_value(e, b"r", PART)? {
                    Some(r) => r
                        .parse()
                        .ok()
                        .filter(|&n| n >= 1)
                        .ok_or_else(|| malformed(PART, format!("bad row index '{r}'")))?,
                    None => current_row + 1,
                };
                next_col = 1;
            }
            // self-closing cell: style only, occupies its slot with Empty
            Event::Empty(ref e) if e.name().as_ref() == b"c" => {
                let (row, col) = cell_position(e, current_row, next_col, PART)?;
                place_cell(&mut rows, row, col, CellValue::Empty);
                current_row = row;
                next_col = col + 1;
            }
            Event::Start(ref e) if e.name().as_ref() == b"c" => {
                cell_ref = Some(cell_position(e, current_row, next_col, PART)?);
                cell_type = attr_value(e, b"t", PART)?;
                cell_style = attr_value(e, b"s", PART)?
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0);
                value = None;
                in_cell = true;
            }
            Event::Start(ref e) if e.name().as_ref() == b"v" && in_cell => in_value = true,
            Event::Start(ref e) if e.name().as_ref() == b"t" && in_cell => in_inline_text = true,
            Event::Text(e) if in_value || in_inline_text => {
                let text = e.unescape().map_err(|err| malformed(PART, err))?;
                value.get_or_insert_with(String::new).push_str(&text);
            }
            Event::End(e) => match e.name().as_ref() {
                b"v" => in_value = false,
                b"t" => in_inline_text = false,
                b"c" => {
                    if let Some((row, col)) = cell_ref.take() {
                        let resolved = resolve_cell(
                            value.take(),
                            cell_type.take().as_deref(),
                            cell_style,
                            strings,
                            styles,
                        )?;
                        place_cell(&mut rows, row, col, resolved);
                        next_col = col + 1;
                        current_row = row;
                    }
                    in_cell = false;
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rows)
}

// parse_cell_ref only yields 1-based positions, so the explicit-ref arm
// cannot produce row 0; the positional arm can, for a cell outside any row
fn cell_position(
    e: &BytesStart<'_>,
    current_row: u32,
    next_col: u32,
    part: &str,
) -> Result<(u32, u32)> {
    match attr_value(e, b"r", part)? {
        Some(r) => {
            parse_cell_ref(&r).ok_or_else(|| malformed(part, format!("bad cell ref '{r}'")))
        }
        None if current_row >= 1 => Ok((current_row, next_col)),
        None => Err(malformed(part, "cell outside a row")),
    }
}

fn resolve_cell(
    value: Option<String>,
    cell_type: Option<&str>,
    style: u32,
    strings: &[String],
    styles: &StylesPart,
) -> Result<CellValue> {
    let Some(raw) = value else {
        return Ok(CellValue::Empty);
    };

    match cell_type {
        Some("s") => {
            let index: usize = raw
                .trim()
                .parse()
                .map_err(|_| ExcelError::Decode(format!("bad shared-string index '{raw}'")))?;
            let text = strings.get(index).ok_or_else(|| {
                ExcelError::Decode(format!(
                    "shared-string index {index} out of range (table has {})",
                    strings.len()
                ))
            })?;
            Ok(CellValue::Text(text.clone()))
        }
        Some("b") => Ok(CellValue::Bool(raw.trim() == "1")),
        Some("str") | Some("inlineStr") | Some("e") => Ok(CellValue::Text(raw)),
        _ => match raw.trim().parse::<f64>() {
            Ok(n) if styles.is_date_style(style) => match from_serial(n) {
                Some(dt) => Ok(CellValue::DateTime(dt)),
                None => Ok(CellValue::Number(n)),
            },
            Ok(n) => Ok(CellValue::Number(n)),
            // lenient: untyped non-numeric content reads back as text
            Err(_) => Ok(CellValue::Text(raw)),
        },
    }
}

fn place_cell(rows: &mut Vec<Vec<CellValue>>, row: u32, col: u32, value: CellValue) {
    let (row, col) = (row as usize - 1, col as usize - 1);
    if rows.len() <= row {
        rows.resize(row + 1, Vec::new());
    }
    let cells = &mut rows[row];
    if cells.len() <= col {
        cells.resize(col + 1, CellValue::Empty);
    }
    cells[col] = value;
}
