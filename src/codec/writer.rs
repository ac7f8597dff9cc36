//! Workbook serialization to a zip-packaged xlsx byte stream
//!
//! Output is deterministic: parts are written in a fixed order, zip headers
//! carry a fixed timestamp, shared strings and styles keep first-seen order.
//! Encoding the same workbook twice yields byte-identical output, which is
//! what makes golden-file testing possible.

use crate::codec::dates::to_serial;
use crate::codec::shared_strings::SharedStrings;
use crate::codec::styles::write_stylesheet;
use crate::codec::xml::XmlWriter;
use crate::codec::col_to_letters;
use crate::error::{ExcelError, Result};
use crate::types::CellValue;
use crate::workbook::{Sheet, Workbook};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Serialize a workbook into xlsx bytes.
///
/// Fails with [`ExcelError::Encode`] only on internal invariant violations
/// (a cell referencing a style index outside the table), never on valid
/// input; an empty workbook is reported as [`ExcelError::EmptyDocument`].
pub fn encode(workbook: &Workbook) -> Result<Vec<u8>> {
    if workbook.sheets().is_empty() {
        return Err(ExcelError::EmptyDocument);
    }

    let strings = collect_shared_strings(workbook)?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(6))
        .last_modified_time(zip::DateTime::default());

    let wrap = |e: zip::result::ZipError| ExcelError::Encode(e.to_string());

    zip.start_file("[Content_Types].xml", options).map_err(wrap)?;
    write_content_types(&mut zip, workbook.sheets().len())?;

    zip.start_file("_rels/.rels", options).map_err(wrap)?;
    write_root_rels(&mut zip)?;

    zip.start_file("docProps/core.xml", options).map_err(wrap)?;
    write_core_props(&mut zip)?;

    zip.start_file("docProps/app.xml", options).map_err(wrap)?;
    write_app_props(&mut zip)?;

    zip.start_file("xl/workbook.xml", options).map_err(wrap)?;
    write_workbook_xml(&mut zip, workbook)?;

    zip.start_file("xl/_rels/workbook.xml.rels", options)
        .map_err(wrap)?;
    write_workbook_rels(&mut zip, workbook.sheets().len())?;

    zip.start_file("xl/styles.xml", options).map_err(wrap)?;
    write_stylesheet(&mut XmlWriter::new(&mut zip), workbook.styles())?;

    zip.start_file("xl/sharedStrings.xml", options).map_err(wrap)?;
    strings.write_xml(&mut XmlWriter::new(&mut zip))?;

    for (i, sheet) in workbook.sheets().iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)
            .map_err(wrap)?;
        write_worksheet(&mut zip, sheet, &strings)?;
    }

    let cursor = zip.finish().map_err(wrap)?;
    Ok(cursor.into_inner())
}

/// One pass over every cell to build the shared-string table in first-seen
/// order, validating style indices on the way.
fn collect_shared_strings(workbook: &Workbook) -> Result<SharedStrings> {
    let style_count = workbook.styles().len() as u32;
    let mut strings = SharedStrings::new();

    for sheet in workbook.sheets() {
        for row in sheet.rows() {
            for cell in row {
                if cell.style >= style_count {
                    return Err(ExcelError::Encode(format!(
                        "cell in sheet '{}' references style {} outside the table (len {})",
                        sheet.name(),
                        cell.style,
                        style_count
                    )));
                }
                if let CellValue::Text(s) = &cell.value {
                    strings.intern(s);
                }
            }
        }
    }
    Ok(strings)
}

fn write_worksheet<W: Write>(out: &mut W, sheet: &Sheet, strings: &SharedStrings) -> Result<()> {
    let mut w = XmlWriter::new(out);
    w.declaration()?;
    w.open("worksheet")?;
    w.attr("xmlns", SPREADSHEET_NS)?;
    w.attr("xmlns:r", RELATIONSHIPS_NS)?;
    w.finish_tag()?;

    if let Some(frozen) = sheet.frozen_row() {
        w.raw(b"<sheetViews><sheetView workbookViewId=\"0\">")?;
        w.open("pane")?;
        w.attr_u32("ySplit", frozen)?;
        w.attr("topLeftCell", &format!("A{}", frozen + 1))?;
        w.attr("activePane", "bottomLeft")?;
        w.attr("state", "frozen")?;
        w.finish_empty()?;
        w.raw(b"</sheetView></sheetViews>")?;
    }

    let widths = sheet.advisory_col_widths();
    if !widths.is_empty() {
        w.open("cols")?;
        w.finish_tag()?;
        for (i, width) in widths.iter().enumerate() {
            let col = i as u32 + 1;
            w.open("col")?;
            w.attr_u32("min", col)?;
            w.attr_u32("max", col)?;
            w.attr("width", &format!("{width}"))?;
            w.attr("customWidth", "1")?;
            w.finish_empty()?;
        }
        w.close("cols")?;
    }

    w.open("sheetData")?;
    w.finish_tag()?;

    for (row_idx, row) in sheet.rows().iter().enumerate() {
        let row_num = row_idx as u32 + 1;
        if row.is_empty() {
            continue;
        }
        w.open("row")?;
        w.attr_u32("r", row_num)?;
        w.finish_tag()?;

        for (col_idx, cell) in row.iter().enumerate() {
            let reference = format!("{}{}", col_to_letters(col_idx as u32 + 1), row_num);
            match &cell.value {
                // unstyled empty cells carry no information
                CellValue::Empty if cell.style == 0 => continue,
                CellValue::Empty => {
                    w.open("c")?;
                    w.attr("r", &reference)?;
                    w.attr_u32("s", cell.style)?;
                    w.finish_empty()?;
                }
                CellValue::Text(s) => {
                    let index = strings
                        .index_of(s)
                        .ok_or_else(|| ExcelError::Encode("uninterned shared string".into()))?;
                    w.open("c")?;
                    w.attr("r", &reference)?;
                    if cell.style != 0 {
                        w.attr_u32("s", cell.style)?;
                    }
                    w.attr("t", "s")?;
                    w.finish_tag()?;
                    w.open("v")?;
                    w.finish_tag()?;
                    let mut buf = itoa::Buffer::new();
                    w.text(buf.format(index))?;
                    w.close("v")?;
                    w.close("c")?;
                }
                CellValue::Number(n) => {
                    write_value_cell(&mut w, &reference, cell.style, &n.to_string(), None)?;
                }
                CellValue::Bool(b) => {
                    write_value_cell(
                        &mut w,
                        &reference,
                        cell.style,
                        if *b { "1" } else { "0" },
                        Some("b"),
                    )?;
                }
                CellValue::DateTime(dt) => {
                    write_value_cell(&mut w, &reference, cell.style, &to_serial(*dt).to_string(), None)?;
                }
            }
        }

        w.close("row")?;
    }

    w.close("sheetData")?;
    w.close("worksheet")?;
    w.flush()?;
    Ok(())
}

fn write_value_cell<W: Write>(
    w: &mut XmlWriter<W>,
    reference: &str,
    style: u32,
    value: &str,
    cell_type: Option<&str>,
) -> Result<()> {
    w.open("c")?;
    w.attr("r", reference)?;
    if style != 0 {
        w.attr_u32("s", style)?;
    }
    if let Some(t) = cell_type {
        w.attr("t", t)?;
    }
    w.finish_tag()?;
    w.open("v")?;
    w.finish_tag()?;
    w.text(value)?;
    w.close("v")?;
    w.close("c")?;
    Ok(())
}

fn write_workbook_xml<W: Write>(out: &mut W, workbook: &Workbook) -> Result<()> {
    let mut w = XmlWriter::new(out);
    w.declaration()?;
    w.open("workbook")?;
    w.attr("xmlns", SPREADSHEET_NS)?;
    w.attr("xmlns:r", RELATIONSHIPS_NS)?;
    w.finish_tag()?;
    w.open("sheets")?;
    w.finish_tag()?;

    for (i, sheet) in workbook.sheets().iter().enumerate() {
        let id = i as u32 + 1;
        w.open("sheet")?;
        w.attr("name", sheet.name())?;
        w.attr_u32("sheetId", id)?;
        w.attr("r:id", &format!("rId{id}"))?;
        w.finish_empty()?;
    }

    w.close("sheets")?;
    w.close("workbook")?;
    w.flush()?;
    Ok(())
}

fn write_workbook_rels<W: Write>(out: &mut W, sheet_count: usize) -> Result<()> {
    let mut w = XmlWriter::new(out);
    w.declaration()?;
    w.open("Relationships")?;
    w.attr(
        "xmlns",
        "http://schemas.openxmlformats.org/package/2006/relationships",
    )?;
    w.finish_tag()?;

    for i in 0..sheet_count {
        let id = i as u32 + 1;
        w.open("Relationship")?;
        w.attr("Id", &format!("rId{id}"))?;
        w.attr(
            "Type",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet",
        )?;
        w.attr("Target", &format!("worksheets/sheet{id}.xml"))?;
        w.finish_empty()?;
    }

    let styles_id = sheet_count as u32 + 1;
    w.open("Relationship")?;
    w.attr("Id", &format!("rId{styles_id}"))?;
    w.attr(
        "Type",
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles",
    )?;
    w.attr("Target", "styles.xml")?;
    w.finish_empty()?;

    let strings_id = sheet_count as u32 + 2;
    w.open("Relationship")?;
    w.attr("Id", &format!("rId{strings_id}"))?;
    w.attr(
        "Type",
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings",
    )?;
    w.attr("Target", "sharedStrings.xml")?;
    w.finish_empty()?;

    w.close("Relationships")?;
    w.flush()?;
    Ok(())
}

fn write_content_types<W: Write>(out: &mut W, sheet_count: usize) -> Result<()> {
    let mut w = XmlWriter::new(out);
    w.declaration()?;
    w.open("Types")?;
    w.attr(
        "xmlns",
        "http://schemas.openxmlformats.org/package/2006/content-types",
    )?;
    w.finish_tag()?;
    w.raw(b"<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>")?;
    w.raw(b"<Default Extension=\"xml\" ContentType=\"application/xml\"/>")?;
    w.raw(b"<Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>")?;
    for i in 0..sheet_count {
        w.open("Override")?;
        w.attr("PartName", &format!("/xl/worksheets/sheet{}.xml", i + 1))?;
        w.attr(
            "ContentType",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml",
        )?;
        w.finish_empty()?;
    }
    w.raw(b"<Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\"/>")?;
    w.raw(b"<Override PartName=\"/xl/sharedStrings.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml\"/>")?;
    w.raw(b"<Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>")?;
    w.raw(b"<Override PartName=\"/docProps/app.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.extended-properties+xml\"/>")?;
    w.close("Types")?;
    w.flush()?;
    Ok(())
}

fn write_root_rels<W: Write>(out: &mut W) -> Result<()> {
    let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;
    out.write_all(xml.as_bytes())?;
    Ok(())
}

// fixed timestamps: document properties must not change between two
// serializations of the same workbook
fn write_core_props<W: Write>(out: &mut W) -> Result<()> {
    let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<dc:creator>exceltab</dc:creator>
<cp:lastModifiedBy>exceltab</cp:lastModifiedBy>
<dcterms:created xsi:type="dcterms:W3CDTF">2024-01-01T00:00:00Z</dcterms:created>
<dcterms:modified xsi:type="dcterms:W3CDTF">2024-01-01T00:00:00Z</dcterms:modified>
</cp:coreProperties>"#;
    out.write_all(xml.as_bytes())?;
    Ok(())
}

fn write_app_props<W: Write>(out: &mut W) -> Result<()> {
    let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
<Application>exceltab</Application>
<DocSecurity>0</DocSecurity>
<ScaleCrop>false</ScaleCrop>
<Company></Company>
<LinksUpToDate>false</LinksUpToDate>
<SharedDoc>false</SharedDoc>
<HyperlinksChanged>false</HyperlinksChanged>
<AppVersion>1.0</AppVersion>
</Properties>"#;
    out.write_all(xml.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellStyle;

    fn sample_workbook() -> Workbook {
        let mut wb = Workbook::new();
        let bold = wb.styles_mut().intern(CellStyle::new().bold());
        let sheet = wb.append_sheet("Sheet 1").unwrap();
        sheet.set_cell(1, 1, CellValue::from("Name"), bold);
        sheet.set_cell(1, 2, CellValue::from("Total"), bold);
        sheet.set_cell(2, 1, CellValue::from("Alice"), 0);
        sheet.set_cell(2, 2, CellValue::from(-12.5), 0);
        sheet.freeze_header_row();
        wb
    }

    #[test]
    fn test_encode_is_deterministic() {
        let wb = sample_workbook();
        let a = encode(&wb).unwrap();
        let b = encode(&wb).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_encode_empty_workbook_fails() {
        let wb = Workbook::new();
        assert!(matches!(encode(&wb), Err(ExcelError::EmptyDocument)));
    }

    #[test]
    fn test_out_of_range_style_is_encode_error() {
        let mut wb = Workbook::new();
        let sheet = wb.append_sheet("S").unwrap();
        sheet.set_cell(1, 1, CellValue::from("x"), 42);
        assert!(matches!(encode(&wb), Err(ExcelError::Encode(_))));
    }

    #[test]
    fn test_package_is_a_zip_with_required_parts() {
        let bytes = encode(&sample_workbook()).unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();

        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "xl/workbook.xml",
            "xl/_rels/workbook.xml.rels",
            "xl/styles.xml",
            "xl/sharedStrings.xml",
            "xl/worksheets/sheet1.xml",
        ] {
            assert!(archive.by_name(part).is_ok(), "missing part {part}");
        }
    }
}
