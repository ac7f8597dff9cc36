//! Cell-formatting strategy and date-pattern handling
//!
//! The formatting policy is pluggable: [`CellFormatter`] exposes the five
//! operations the tabular mapper drives, and [`DefaultCellFormatter`] is the
//! stock implementation. Substituting a custom formatter changes formatting
//! policy without touching the codec.

use crate::style::StyleConfig;
use crate::types::{CellStyle, CellValue, NumberFormat};
use chrono::{NaiveDate, NaiveDateTime};

/// Date patterns use `Y y m d H h i s` tokens ("Y-m-d", "d/m/Y H:i:s").
/// Translate one to a chrono strftime string.
pub(crate) fn chrono_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    for ch in pattern.chars() {
        match ch {
            'Y' => out.push_str("%Y"),
            'y' => out.push_str("%y"),
            'm' => out.push_str("%m"),
            'd' => out.push_str("%d"),
            'H' | 'h' => out.push_str("%H"),
            'i' => out.push_str("%M"),
            's' => out.push_str("%S"),
            '%' => out.push_str("%%"),
            other => out.push(other),
        }
    }
    out
}

/// Translate a date pattern to an OOXML display format code
pub(crate) fn display_code(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    for ch in pattern.chars() {
        match ch {
            'Y' => out.push_str("yyyy"),
            'y' => out.push_str("yy"),
            'm' | 'i' => out.push_str("mm"),
            'd' => out.push_str("dd"),
            'H' | 'h' => out.push_str("hh"),
            's' => out.push_str("ss"),
            other => out.push(other),
        }
    }
    out
}

pub(crate) fn has_time_tokens(pattern: &str) -> bool {
    pattern.chars().any(|c| matches!(c, 'H' | 'h' | 'i' | 's'))
}

/// Reformat a textual date from one pattern to another. Returns `None` when
/// the value does not parse under the old pattern.
pub(crate) fn reformat_date(value: &str, old_pattern: &str, new_pattern: &str) -> Option<String> {
    let old = chrono_pattern(old_pattern);
    let new = chrono_pattern(new_pattern);

    let dt: NaiveDateTime = if has_time_tokens(old_pattern) {
        NaiveDateTime::parse_from_str(value.trim(), &old).ok()?
    } else {
        NaiveDate::parse_from_str(value.trim(), &old)
            .ok()?
            .and_hms_opt(0, 0, 0)?
    };

    Some(dt.format(&new).to_string())
}

/// Caller-pluggable cell-formatting strategy
pub trait CellFormatter {
    /// Bold font, used for header cells
    fn set_bold(&self, style: &mut CellStyle);

    /// Background fill chosen by row parity from the active configuration
    fn set_background(&self, config: &dyn StyleConfig, style: &mut CellStyle, row: u32);

    /// Thousands-separated numeric format; negative values additionally get
    /// the configured negative-value color
    fn set_number_format(&self, config: &dyn StyleConfig, style: &mut CellStyle, value: f64);

    /// Percentage format with the same negative-value treatment
    fn set_percentage_format(&self, config: &dyn StyleConfig, style: &mut CellStyle, value: f64);

    /// Reformat a textual date from `old_pattern` to `new_pattern` and attach
    /// the matching display format
    fn set_date_format(
        &self,
        style: &mut CellStyle,
        value: &mut CellValue,
        old_pattern: &str,
        new_pattern: &str,
    );
}

/// Stock formatting policy
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCellFormatter;

impl CellFormatter for DefaultCellFormatter {
    fn set_bold(&self, style: &mut CellStyle) {
        style.bold = true;
    }

    fn set_background(&self, config: &dyn StyleConfig, style: &mut CellStyle, row: u32) {
        let background = if row % 2 == 0 {
            config.row_even()
        } else {
            config.row_odd()
        };
        style.fill = Some(background);
    }

    fn set_number_format(&self, config: &dyn StyleConfig, style: &mut CellStyle, value: f64) {
        style.number_format = NumberFormat::NumberCommaSeparated;
        if value < 0.0 {
            style.font_color = Some(config.negative_color());
        }
    }

    fn set_percentage_format(&self, config: &dyn StyleConfig, style: &mut CellStyle, value: f64) {
        style.number_format = NumberFormat::Percentage;
        if value < 0.0 {
            style.font_color = Some(config.negative_color());
        }
    }

    fn set_date_format(
        &self,
        style: &mut CellStyle,
        value: &mut CellValue,
        old_pattern: &str,
        new_pattern: &str,
    ) {
        // A value that does not parse under the old pattern is left as-is.
        if let CellValue::Text(text) = value {
            if let Some(reformatted) = reformat_date(text, old_pattern, new_pattern) {
                *value = CellValue::Text(reformatted);
            }
        }

        style.number_format = if has_time_tokens(new_pattern) {
            NumberFormat::DateTime(new_pattern.to_string())
        } else {
            NumberFormat::Date(new_pattern.to_string())
        };
    }
}
