//! Style deduplication table and pluggable style configuration

use crate::types::{CellStyle, Rgb};
use indexmap::IndexSet;

/// Deduplicating table of cell styles, referenced by index from cells.
///
/// Entries keep first-seen order so repeated serialization of the same
/// workbook yields byte-identical styles.xml. Index 0 is the default style.
#[derive(Debug, Clone)]
pub struct StyleTable {
    styles: IndexSet<CellStyle>,
}

impl StyleTable {
    pub fn new() -> Self {
        let mut styles = IndexSet::new();
        styles.insert(CellStyle::default());
        StyleTable { styles }
    }

    /// Intern a style and return its table index. Structurally equal styles
    /// always map to the same index.
    pub fn intern(&mut self, style: CellStyle) -> u32 {
        let (index, _) = self.styles.insert_full(style);
        index as u32
    }

    /// Look up a style by table index
    pub fn get(&self, index: u32) -> Option<&CellStyle> {
        self.styles.get_index(index as usize)
    }

    /// Number of distinct styles, default style included
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        false // index 0 always exists
    }

    /// Iterate styles in table-index order
    pub fn iter(&self) -> impl Iterator<Item = &CellStyle> {
        self.styles.iter()
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Caller-pluggable palette for row backgrounds and negative values.
///
/// Substitutable per [`Writer`](crate::writer::Writer); the defaults mirror a
/// white/gray banded table with red negatives.
pub trait StyleConfig {
    /// Font color applied to negative numeric values
    fn negative_color(&self) -> Rgb;
    /// Background of even data rows
    fn row_even(&self) -> Rgb;
    /// Background of odd data rows
    fn row_odd(&self) -> Rgb;
}

/// Default palette: red negatives, white even rows, light gray odd rows
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStyleConfig;

impl StyleConfig for DefaultStyleConfig {
    fn negative_color(&self) -> Rgb {
        Rgb(0xFF, 0x00, 0x00)
    }

    fn row_even(&self) -> Rgb {
        Rgb(0xFF, 0xFF, 0xFF)
    }

    fn row_odd(&self) -> Rgb {
        Rgb(0xEE, 0xEE, 0xEE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NumberFormat;

    #[test]
    fn test_equal_styles_share_index() {
        let mut table = StyleTable::new();

        let a = CellStyle::new().bold();
        let b = CellStyle::new().bold();
        let c = CellStyle::new().format(NumberFormat::Percentage);

        let ia = table.intern(a);
        let ib = table.intern(b);
        let ic = table.intern(c);

        assert_eq!(ia, ib);
        assert_ne!(ia, ic);
        assert_eq!(table.len(), 3); // default + bold + percentage
    }

    #[test]
    fn test_default_style_is_index_zero() {
        let mut table = StyleTable::new();
        assert_eq!(table.intern(CellStyle::default()), 0);
        assert_eq!(table.get(0), Some(&CellStyle::default()));
    }

    #[test]
    fn test_first_seen_order_is_stable() {
        let mut table = StyleTable::new();
        table.intern(CellStyle::new().bold());
        table.intern(CellStyle::new().fill(Rgb(0, 0, 0)));

        let collected: Vec<_> = table.iter().cloned().collect();
        assert_eq!(collected[1], CellStyle::new().bold());
        assert_eq!(collected[2], CellStyle::new().fill(Rgb(0, 0, 0)));
    }
}
