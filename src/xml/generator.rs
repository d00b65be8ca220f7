//! # Bounded markup generator.
//!
//! [`XmlGenerator`] writes elements into a buffer of fixed capacity. When the
//! output does not fit, every write fails with [`XmlError::BufferExceeded`]
//! and the caller (usually [`Reporter`](super::Reporter)) starts over with a
//! larger buffer. Generation callbacks must therefore tolerate being invoked
//! more than once.
//!
//! ## Example
//! ```rust
//! use heartvisor::xml::XmlGenerator;
//!
//! let mut xml = XmlGenerator::new(128);
//! xml.node("free_resources", |xml| {
//!     xml.node("ram", |xml| xml.attribute("available_mb", 12))
//! }).unwrap();
//! assert_eq!(xml.finish(), r#"<free_resources><ram available_mb="12"/></free_resources>"#);
//! ```

use std::fmt::{Display, Write as _};

use crate::error::XmlError;

/// Writes nested elements into a bounded buffer.
#[derive(Debug)]
pub struct XmlGenerator {
    buf: String,
    limit: usize,
    tag_open: bool,
}

impl XmlGenerator {
    /// Creates a generator that accepts at most `limit` bytes of output.
    pub fn new(limit: usize) -> Self {
        Self {
            buf: String::new(),
            limit,
            tag_open: false,
        }
    }

    /// Writes element `name`; `content` adds its attributes and children.
    ///
    /// Attributes must be written before any child or appended content.
    pub fn node<F>(&mut self, name: &str, content: F) -> Result<(), XmlError>
    where
        F: FnOnce(&mut Self) -> Result<(), XmlError>,
    {
        self.close_start_tag()?;
        self.push("<")?;
        self.push(name)?;
        self.tag_open = true;

        content(self)?;

        if self.tag_open {
            self.tag_open = false;
            self.push("/>")
        } else {
            self.push("</")?;
            self.push(name)?;
            self.push(">")
        }
    }

    /// Adds an attribute to the current element, escaping its value.
    pub fn attribute(&mut self, name: &str, value: impl Display) -> Result<(), XmlError> {
        let mut text = String::new();
        let _ = write!(text, "{value}");
        self.attribute_raw(name, &escape(&text))
    }

    /// Adds an attribute whose value is already escaped (copied from a
    /// parsed document).
    ///
    /// A value holding `"` was single-quoted in its source and is written
    /// single-quoted again.
    pub fn attribute_raw(&mut self, name: &str, raw: &str) -> Result<(), XmlError> {
        if !self.tag_open {
            return Err(XmlError::Malformed {
                offset: self.buf.len(),
                reason: "attribute written after element content",
            });
        }
        let quote = if raw.contains('"') { "'" } else { "\"" };
        self.push(" ")?;
        self.push(name)?;
        self.push("=")?;
        self.push(quote)?;
        self.push(raw)?;
        self.push(quote)
    }

    /// Appends already well-formed markup as content of the current element.
    ///
    /// Appending nothing leaves an element without content, so it is still
    /// closed as `<name/>`.
    pub fn append(&mut self, raw: &str) -> Result<(), XmlError> {
        if raw.is_empty() {
            return Ok(());
        }
        self.close_start_tag()?;
        self.push(raw)
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing was written yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the generator and returns the output.
    pub fn finish(self) -> String {
        self.buf
    }

    fn close_start_tag(&mut self) -> Result<(), XmlError> {
        if self.tag_open {
            self.tag_open = false;
            self.push(">")?;
        }
        Ok(())
    }

    fn push(&mut self, s: &str) -> Result<(), XmlError> {
        if self.buf.len() + s.len() > self.limit {
            return Err(XmlError::BufferExceeded { limit: self.limit });
        }
        self.buf.push_str(s);
        Ok(())
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlNode;

    #[test]
    fn test_nested_nodes() {
        let mut xml = XmlGenerator::new(1024);
        xml.node("restart_info", |xml| {
            xml.node("component", |xml| {
                xml.attribute("name", "vbox")?;
                xml.attribute("restarts", 2)?;
                xml.node("failed", |xml| xml.attribute("label", "vbox -> vfs"))
            })?;
            xml.node("component", |xml| xml.attribute("name", "fs"))
        })
        .unwrap();

        assert_eq!(
            xml.finish(),
            "<restart_info>\
             <component name=\"vbox\" restarts=\"2\"><failed label=\"vbox -&gt; vfs\"/></component>\
             <component name=\"fs\"/>\
             </restart_info>"
        );
    }

    #[test]
    fn test_empty_root() {
        let mut xml = XmlGenerator::new(16);
        xml.node("config", |_| Ok(())).unwrap();
        assert_eq!(xml.finish(), "<config/>");
    }

    #[test]
    fn test_append_raw() {
        let mut xml = XmlGenerator::new(1024);
        xml.node("config", |xml| {
            xml.attribute_raw("verbose", "yes")?;
            xml.append("<report delay_ms=\"500\"/>")
        })
        .unwrap();
        assert_eq!(xml.finish(), "<config verbose=\"yes\"><report delay_ms=\"500\"/></config>");
    }

    #[test]
    fn test_raw_value_keeps_quotes_balanced() {
        let mut xml = XmlGenerator::new(1024);
        xml.node("start", |xml| {
            xml.attribute_raw("name", "a&amp;b")?;
            xml.attribute_raw("note", r#"say "hi""#)
        })
        .unwrap();
        let out = xml.finish();

        assert_eq!(out, r#"<start name="a&amp;b" note='say "hi"'/>"#);
        let node = XmlNode::parse(&out).unwrap();
        assert_eq!(node.attribute("name"), Some("a&b"));
        assert_eq!(node.attribute("note"), Some(r#"say "hi""#));
    }

    #[test]
    fn test_buffer_exceeded() {
        let mut xml = XmlGenerator::new(10);
        let res = xml.node("restart_info", |_| Ok(()));
        assert_eq!(res, Err(XmlError::BufferExceeded { limit: 10 }));
    }

    #[test]
    fn test_attribute_after_content_rejected() {
        let mut xml = XmlGenerator::new(1024);
        let res = xml.node("a", |xml| {
            xml.append("<b/>")?;
            xml.attribute("late", 1)
        });
        assert!(matches!(res, Err(XmlError::Malformed { .. })));
    }
}
