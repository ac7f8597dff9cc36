//! Type definitions for cell values and cell styles

use chrono::NaiveDateTime;
use std::fmt;

/// A 24-bit RGB color, stored as three bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse a 6-hex-digit color string such as `"FF0000"`
    pub fn from_hex(hex: &str) -> Option<Rgb> {
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Rgb(r, g, b))
    }

    /// Render as an ARGB string with full alpha, the form styles.xml expects
    pub fn to_argb(self) -> String {
        format!("FF{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Represents a single cell value in a worksheet
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell
    Empty,
    /// Text value
    Text(String),
    /// Numeric value
    Number(f64),
    /// Boolean value
    Bool(bool),
    /// Date/time value, stored as a calendar timestamp (serialized as an
    /// Excel serial number at the codec boundary)
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Check if cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Convert cell value to string
    pub fn as_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::DateTime(dt) => dt.to_string(),
        }
    }

    /// Try to convert to float. Text values parse when numeric-looking.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Try to convert to boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            CellValue::Number(n) => Some(*n != 0.0),
            CellValue::Text(s) => match s.to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Number(i as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

/// Display number format attached to a cell style
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NumberFormat {
    /// No explicit format
    #[default]
    General,
    /// Thousands-separated with two decimals (#,##0.00)
    NumberCommaSeparated,
    /// Percentage with two decimals (0.00%)
    Percentage,
    /// Date display, pattern in `Y m d` token form (e.g. "d/m/Y")
    Date(String),
    /// Date-and-time display, pattern in `Y m d H i s` token form
    DateTime(String),
}

/// Formatting descriptor for a single cell.
///
/// Styles are deduplicated into the workbook [`StyleTable`](crate::style::StyleTable)
/// and referenced by index from cells; structurally equal styles always share
/// one index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CellStyle {
    /// Bold font
    pub bold: bool,
    /// Solid background fill
    pub fill: Option<Rgb>,
    /// Display number format
    pub number_format: NumberFormat,
    /// Font color, layered onto negative numeric values
    pub font_color: Option<Rgb>,
}

impl CellStyle {
    pub fn new() -> Self {
        CellStyle::default()
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn fill(mut self, color: Rgb) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn format(mut self, format: NumberFormat) -> Self {
        self.number_format = format;
        self
    }
}
