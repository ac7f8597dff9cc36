//! styles.xml emission and parsing
//!
//! The write side lowers the workbook [`StyleTable`] into deduplicated
//! fonts/fills/numFmts plus one `cellXf` per style index. The read side only
//! recovers what value resolution needs: the numFmtId of every cellXf and
//! the custom format codes, enough to tell date-styled numbers apart.

use crate::codec::xml::XmlWriter;
use crate::error::{ExcelError, Result};
use crate::format::display_code;
use crate::style::StyleTable;
use crate::types::{NumberFormat, Rgb};
use indexmap::IndexMap;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::Write;

/// First id available for custom number formats
const CUSTOM_NUM_FMT_BASE: u32 = 164;

/// Builtin format ids for the non-pattern formats
const FMT_COMMA_SEPARATED: u32 = 4; // #,##0.00
const FMT_PERCENTAGE: u32 = 10; // 0.00%

fn num_fmt_id(format: &NumberFormat, custom: &mut IndexMap<String, u32>) -> u32 {
    match format {
        NumberFormat::General => 0,
        NumberFormat::NumberCommaSeparated => FMT_COMMA_SEPARATED,
        NumberFormat::Percentage => FMT_PERCENTAGE,
        NumberFormat::Date(pattern) | NumberFormat::DateTime(pattern) => {
            let code = display_code(pattern);
            let next = CUSTOM_NUM_FMT_BASE + custom.len() as u32;
            *custom.entry(code).or_insert(next)
        }
    }
}

/// Emit styles.xml for a style table
pub fn write_stylesheet<W: Write>(writer: &mut XmlWriter<W>, table: &StyleTable) -> Result<()> {
    // dedup fonts and fills in first-seen order; slots 0/1 of the fill list
    // are reserved by the format (none and gray125)
    let mut fonts: IndexMap<(bool, Option<Rgb>), u32> = IndexMap::new();
    let mut fills: IndexMap<Option<Rgb>, u32> = IndexMap::new();
    let mut custom: IndexMap<String, u32> = IndexMap::new();

    fonts.insert((false, None), 0);
    fills.insert(None, 0);

    struct Xf {
        num_fmt: u32,
        font: u32,
        fill: u32,
    }

    let mut xfs = Vec::with_capacity(table.len());
    for style in table.iter() {
        let font_key = (style.bold, style.font_color);
        let next_font = fonts.len() as u32;
        let font = *fonts.entry(font_key).or_insert(next_font);

        let fill = match style.fill {
            None => 0,
            some => {
                let next_fill = fills.len() as u32 + 1; // skip gray125 slot
                *fills.entry(some).or_insert(next_fill)
            }
        };

        xfs.push(Xf {
            num_fmt: num_fmt_id(&style.number_format, &mut custom),
            font,
            fill,
        });
    }

    writer.declaration()?;
    writer.open("styleSheet")?;
    writer.attr(
        "xmlns",
        "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
    )?;
    writer.finish_tag()?;

    writer.open("numFmts")?;
    writer.attr_u32("count", custom.len() as u32)?;
    writer.finish_tag()?;
    for (code, id) in &custom {
        writer.open("numFmt")?;
        writer.attr_u32("numFmtId", *id)?;
        writer.attr("formatCode", code)?;
        writer.finish_empty()?;
    }
    writer.close("numFmts")?;

    writer.open("fonts")?;
    writer.attr_u32("count", fonts.len() as u32)?;
    writer.finish_tag()?;
    for (bold, color) in fonts.keys() {
        writer.open("font")?;
        writer.finish_tag()?;
        if *bold {
            writer.raw(b"<b/>")?;
        }
        writer.raw(b"<sz val=\"11\"/>")?;
        if let Some(rgb) = color {
            writer.open("color")?;
            writer.attr("rgb", &rgb.to_argb())?;
            writer.finish_empty()?;
        }
        writer.raw(b"<name val=\"Calibri\"/>")?;
        writer.close("font")?;
    }
    writer.close("fonts")?;

    writer.open("fills")?;
    writer.attr_u32("count", fills.len() as u32 + 1)?;
    writer.finish_tag()?;
    writer.raw(b"<fill><patternFill patternType=\"none\"/></fill>")?;
    writer.raw(b"<fill><patternFill patternType=\"gray125\"/></fill>")?;
    for color in fills.keys().flatten() {
        writer.open("fill")?;
        writer.finish_tag()?;
        writer.raw(b"<patternFill patternType=\"solid\">")?;
        writer.open("fgColor")?;
        writer.attr("rgb", &color.to_argb())?;
        writer.finish_empty()?;
        writer.raw(b"</patternFill>")?;
        writer.close("fill")?;
    }
    writer.close("fills")?;

    writer.raw(
        b"<borders count=\"1\"><border><left/><right/><top/><bottom/><diagonal/></border></borders>",
    )?;
    writer.raw(
        b"<cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>",
    )?;

    writer.open("cellXfs")?;
    writer.attr_u32("count", xfs.len() as u32)?;
    writer.finish_tag()?;
    for xf in &xfs {
        writer.open("xf")?;
        writer.attr_u32("numFmtId", xf.num_fmt)?;
        writer.attr_u32("fontId", xf.font)?;
        writer.attr_u32("fillId", xf.fill)?;
        writer.attr("borderId", "0")?;
        writer.attr("xfId", "0")?;
        if xf.num_fmt != 0 {
            writer.attr("applyNumberFormat", "1")?;
        }
        if xf.font != 0 {
            writer.attr("applyFont", "1")?;
        }
        if xf.fill != 0 {
            writer.attr("applyFill", "1")?;
        }
        writer.finish_empty()?;
    }
    writer.close("cellXfs")?;

    writer.raw(
        b"<cellStyles count=\"1\"><cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/></cellStyles>",
    )?;
    writer.close("styleSheet")?;
    writer.flush()?;
    Ok(())
}

/// The slice of styles.xml the reader cares about
#[derive(Debug, Default)]
pub struct StylesPart {
    /// numFmtId per cellXf, indexed by the `s` attribute of cells
    num_fmt_ids: Vec<u32>,
    /// Custom format codes by id
    custom_codes: HashMap<u32, String>,
}

impl StylesPart {
    /// For workbooks without a styles part
    pub fn empty() -> Self {
        StylesPart::default()
    }

    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut part = StylesPart::default();
        let mut in_cell_xfs = false;
        let mut buf = Vec::new();

        loop {
            match reader
                .read_event_into(&mut buf)
                .map_err(|e| ExcelError::Decode(format!("malformed styles.xml: {e}")))?
            {
                Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                    b"cellXfs" => in_cell_xfs = true,
                    b"numFmt" => {
                        let mut id = None;
                        let mut code = None;
                        for attr in e.attributes().flatten() {
                            let value = attr
                                .unescape_value()
                                .map_err(|e| ExcelError::Decode(format!("malformed styles.xml: {e}")))?;
                            match attr.key.as_ref() {
                                b"numFmtId" => id = value.parse::<u32>().ok(),
                                b"formatCode" => code = Some(value.into_owned()),
                                _ => {}
                            }
                        }
                        if let (Some(id), Some(code)) = (id, code) {
                            part.custom_codes.insert(id, code);
                        }
                    }
                    b"xf" if in_cell_xfs => {
                        let mut id = 0;
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"numFmtId" {
                                id = attr
                                    .unescape_value()
                                    .ok()
                                    .and_then(|v| v.parse::<u32>().ok())
                                    .unwrap_or(0);
                            }
                        }
                        part.num_fmt_ids.push(id);
                    }
                    _ => {}
                },
                Event::End(e) if e.name().as_ref() == b"cellXfs" => in_cell_xfs = false,
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(part)
    }

    /// Does the cellXf at `xf_index` carry a date-like display format?
    pub fn is_date_style(&self, xf_index: u32) -> bool {
        let Some(&id) = self.num_fmt_ids.get(xf_index as usize) else {
            return false;
        };
        if matches!(id, 14..=22 | 45..=47) {
            return true;
        }
        match self.custom_codes.get(&id) {
            Some(code) => code_is_date_like(code),
            None => false,
        }
    }
}

/// A format code counts as date-like when it carries day/year/hour tokens
/// outside quoted literals ("#,##0.00" and "0.00%" do not).
fn code_is_date_like(code: &str) -> bool {
    let mut in_quotes = false;
    for ch in code.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            'y' | 'Y' | 'd' | 'D' | 'h' | 'H' if !in_quotes => return true,
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellStyle;

    fn render(table: &StyleTable) -> String {
        let mut out = Vec::new();
        write_stylesheet(&mut XmlWriter::new(&mut out), table).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_stylesheet_dedups_fonts_and_fills() {
        let mut table = StyleTable::new();
        table.intern(CellStyle::new().bold());
        table.intern(CellStyle::new().bold().fill(Rgb(0xEE, 0xEE, 0xEE)));

        let xml = render(&table);
        assert_eq!(xml.matches("<b/>").count(), 1);
        assert!(xml.contains("fgColor rgb=\"FFEEEEEE\""));
        assert!(xml.contains("cellXfs count=\"3\""));
    }

    #[test]
    fn test_custom_date_format_gets_id_from_164() {
        let mut table = StyleTable::new();
        table.intern(CellStyle::new().format(NumberFormat::Date("d/m/Y".into())));

        let xml = render(&table);
        assert!(xml.contains("numFmtId=\"164\" formatCode=\"dd/mm/yyyy\""));
    }

    #[test]
    fn test_parse_roundtrip_date_detection() {
        let mut table = StyleTable::new();
        table.intern(CellStyle::new().format(NumberFormat::NumberCommaSeparated));
        table.intern(CellStyle::new().format(NumberFormat::Date("d/m/Y".into())));

        let xml = render(&table);
        let part = StylesPart::parse(xml.as_bytes()).unwrap();

        assert!(!part.is_date_style(0)); // General
        assert!(!part.is_date_style(1)); // #,##0.00
        assert!(part.is_date_style(2)); // dd/mm/yyyy
        assert!(!part.is_date_style(99)); // out of range
    }

    #[test]
    fn test_code_is_date_like() {
        assert!(code_is_date_like("dd/mm/yyyy"));
        assert!(code_is_date_like("hh:mm:ss"));
        assert!(!code_is_date_like("#,##0.00"));
        assert!(!code_is_date_like("0.00%"));
        assert!(!code_is_date_like("\"days\" 0.0"));
    }
}
