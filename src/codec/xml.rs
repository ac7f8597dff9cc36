//! Buffered XML writer for the serialization path
//!
//! Emission stays hand-built so every part of the package is produced in a
//! single deterministic pass; parsing (the read side) goes through quick-xml.

use crate::error::Result;
use std::io::Write;

/// XML writer that batches small writes into an internal buffer
pub struct XmlWriter<W: Write> {
    writer: W,
    buffer: Vec<u8>,
}

impl<W: Write> XmlWriter<W> {
    pub fn new(writer: W) -> Self {
        XmlWriter {
            writer,
            buffer: Vec::with_capacity(8192),
        }
    }

    pub fn declaration(&mut self) -> Result<()> {
        self.raw(b"<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n")
    }

    /// Write raw bytes
    #[inline]
    pub fn raw(&mut self, data: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(data);
        if self.buffer.len() > 4096 {
            self.flush_buffer()?;
        }
        Ok(())
    }

    #[inline]
    pub fn text(&mut self, s: &str) -> Result<()> {
        self.raw(s.as_bytes())
    }

    /// Open a start tag; attributes may follow until [`Self::finish_tag`]
    #[inline]
    pub fn open(&mut self, name: &str) -> Result<()> {
        self.raw(b"<")?;
        self.text(name)
    }

    /// Close the currently open start tag
    #[inline]
    pub fn finish_tag(&mut self) -> Result<()> {
        self.raw(b">")
    }

    /// Close the currently open start tag as self-closing
    #[inline]
    pub fn finish_empty(&mut self) -> Result<()> {
        self.raw(b"/>")
    }

    #[inline]
    pub fn close(&mut self, name: &str) -> Result<()> {
        self.raw(b"</")?;
        self.text(name)?;
        self.raw(b">")
    }

    #[inline]
    pub fn attr(&mut self, name: &str, value: &str) -> Result<()> {
        self.raw(b" ")?;
        self.text(name)?;
        self.raw(b"=\"")?;
        self.escaped(value)?;
        self.raw(b"\"")
    }

    #[inline]
    pub fn attr_u32(&mut self, name: &str, value: u32) -> Result<()> {
        let mut buf = itoa::Buffer::new();
        self.raw(b" ")?;
        self.text(name)?;
        self.raw(b"=\"")?;
        self.raw(buf.format(value).as_bytes())?;
        self.raw(b"\"")
    }

    /// Write text content with XML escaping
    #[inline]
    pub fn escaped(&mut self, text: &str) -> Result<()> {
        for byte in text.bytes() {
            match byte {
                b'&' => self.buffer.extend_from_slice(b"&amp;"),
                b'<' => self.buffer.extend_from_slice(b"&lt;"),
                b'>' => self.buffer.extend_from_slice(b"&gt;"),
                b'"' => self.buffer.extend_from_slice(b"&quot;"),
                b'\'' => self.buffer.extend_from_slice(b"&apos;"),
                _ => self.buffer.push(byte),
            }
        }
        if self.buffer.len() > 4096 {
            self.flush_buffer()?;
        }
        Ok(())
    }

    /// Flush buffered bytes to the underlying writer
    pub fn flush(&mut self) -> Result<()> {
        self.flush_buffer()?;
        self.writer.flush()?;
        Ok(())
    }

    fn flush_buffer(&mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            self.writer.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_with_attribute() {
        let mut out = Vec::new();
        let mut w = XmlWriter::new(&mut out);

        w.open("row").unwrap();
        w.attr_u32("r", 3).unwrap();
        w.finish_tag().unwrap();
        w.escaped("content").unwrap();
        w.close("row").unwrap();
        w.flush().unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "<row r=\"3\">content</row>");
    }

    #[test]
    fn test_escaping() {
        let mut out = Vec::new();
        let mut w = XmlWriter::new(&mut out);

        w.escaped("a<b>&\"c\"'d'").unwrap();
        w.flush().unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "a&lt;b&gt;&amp;&quot;c&quot;&apos;d&apos;"
        );
    }

    #[test]
    fn test_self_closing() {
        let mut out = Vec::new();
        let mut w = XmlWriter::new(&mut out);

        w.open("c").unwrap();
        w.attr("r", "A1").unwrap();
        w.finish_empty().unwrap();
        w.flush().unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "<c r=\"A1\"/>");
    }
}
