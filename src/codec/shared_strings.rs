//! Shared-string table: deduplicated text values referenced by index

use crate::codec::xml::XmlWriter;
use crate::error::Result;
use indexmap::IndexSet;
use std::io::Write;

/// Interns text values in first-seen order, the standard OOXML space
/// optimization. First-seen ordering keeps serialization deterministic.
#[derive(Debug, Default)]
pub struct SharedStrings {
    strings: IndexSet<String>,
    /// Total references, including duplicates (the `count` attribute)
    references: u64,
}

impl SharedStrings {
    pub fn new() -> Self {
        SharedStrings {
            strings: IndexSet::with_capacity(1024),
            references: 0,
        }
    }

    /// Intern a string and return its table index
    pub fn intern(&mut self, s: &str) -> u32 {
        self.references += 1;
        if let Some(index) = self.strings.get_index_of(s) {
            return index as u32;
        }
        let (index, _) = self.strings.insert_full(s.to_string());
        index as u32
    }

    /// Index of an already-interned string
    pub fn index_of(&self, s: &str) -> Option<u32> {
        self.strings.get_index_of(s).map(|i| i as u32)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Emit sharedStrings.xml
    pub fn write_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> Result<()> {
        writer.declaration()?;
        writer.open("sst")?;
        writer.attr(
            "xmlns",
            "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
        )?;
        writer.attr("count", &self.references.to_string())?;
        writer.attr_u32("uniqueCount", self.strings.len() as u32)?;
        writer.finish_tag()?;

        for s in &self.strings {
            writer.open("si")?;
            writer.finish_tag()?;
            writer.open("t")?;
            // leading/trailing whitespace must survive the XML round-trip
            if s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) {
                writer.attr("xml:space", "preserve")?;
            }
            writer.finish_tag()?;
            writer.escaped(s)?;
            writer.close("t")?;
            writer.close("si")?;
        }

        writer.close("sst")?;
        writer.flush()?;
        Ok(())
    }
}
