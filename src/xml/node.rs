//! # Span-preserving markup tree.
//!
//! [`XmlNode`] is a read-only view of one element of a parsed document. It
//! borrows the source text and remembers the byte span of every element and
//! of its content, so the configuration generator can copy nodes verbatim
//! without re-serialising them.
//!
//! ## Rules
//! - One root element; declarations (`<?...?>`), comments and `<!...>` are skipped.
//! - Text content is not interpreted, only kept inside the content span.
//! - [`XmlNode::attribute`] decodes the predefined and numeric character
//!   references; [`XmlNode::attributes`] yields values as written.
//! - Trailing whitespace and NUL bytes after the root are ignored (inbound
//!   report buffers are fixed-size and zero-padded).

use std::borrow::Cow;
use std::ops::Range;
use std::str::FromStr;

use crate::error::XmlError;

/// One parsed element with its attributes and child elements.
#[derive(Debug, Clone)]
pub struct XmlNode<'a> {
    src: &'a str,
    name: &'a str,
    attributes: Vec<Attribute<'a>>,
    children: Vec<XmlNode<'a>>,
    span: Range<usize>,
    content: Range<usize>,
}

impl<'a> XmlNode<'a> {
    /// Parses `src` into its root element.
    pub fn parse(src: &'a str) -> Result<Self, XmlError> {
        let mut parser = Parser { src, pos: 0 };
        parser.skip_misc()?;
        if parser.at_end() {
            return Err(XmlError::UnexpectedEof);
        }
        let root = parser.element()?;
        parser.skip_misc()?;
        if !parser.at_end() {
            return Err(XmlError::Malformed {
                offset: parser.pos,
                reason: "content after root element",
            });
        }
        Ok(root)
    }

    /// Element name.
    #[inline]
    pub fn node_type(&self) -> &'a str {
        self.name
    }

    /// Returns `true` if the element is named `ty`.
    #[inline]
    pub fn has_type(&self, ty: &str) -> bool {
        self.name == ty
    }

    /// Decoded value of attribute `name`, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_ref())
    }

    /// Returns `true` if attribute `name` is present.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Parses attribute `name`, falling back to `default` when it is missing
    /// or does not parse.
    pub fn attribute_value<T: FromStr>(&self, name: &str, default: T) -> T {
        self.attribute(name)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Parses a boolean attribute (`true/yes/on/1`, `false/no/off/0`).
    pub fn attribute_bool(&self, name: &str, default: bool) -> bool {
        match self.attribute(name).map(str::trim) {
            Some("true" | "yes" | "on" | "1") => true,
            Some("false" | "no" | "off" | "0") => false,
            _ => default,
        }
    }

    /// All attributes in document order, values as written.
    pub fn attributes(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        self.attributes.iter().map(|a| (a.name, a.raw))
    }

    /// All child elements in document order.
    pub fn children(&self) -> std::slice::Iter<'_, XmlNode<'a>> {
        self.children.iter()
    }

    /// Child elements named `ty`.
    pub fn sub_nodes<'s>(&'s self, ty: &'s str) -> impl Iterator<Item = &'s XmlNode<'a>> + 's {
        self.children.iter().filter(move |c| c.name == ty)
    }

    /// First child element named `ty`.
    pub fn sub_node(&self, ty: &str) -> Option<&XmlNode<'a>> {
        self.children.iter().find(|c| c.name == ty)
    }

    /// Returns `true` if a child element named `ty` exists.
    pub fn has_sub_node(&self, ty: &str) -> bool {
        self.sub_node(ty).is_some()
    }

    /// Number of child elements of any type.
    #[inline]
    pub fn num_sub_nodes(&self) -> usize {
        self.children.len()
    }

    /// The element as written, from `<` to the end of its closing tag.
    #[inline]
    pub fn raw(&self) -> &'a str {
        &self.src[self.span.clone()]
    }

    /// Everything between the start and the closing tag (empty for `<x/>`).
    #[inline]
    pub fn raw_content(&self) -> &'a str {
        &self.src[self.content.clone()]
    }
}

#[derive(Debug, Clone)]
struct Attribute<'a> {
    name: &'a str,
    raw: &'a str,
    value: Cow<'a, str>,
}

/// Replaces character references in an attribute value.
///
/// Unknown or unterminated references are kept as written.
fn unescape(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|end| {
            let c = match &rest[1..end] {
                "amp" => '&',
                "lt" => '<',
                "gt" => '>',
                "quot" => '"',
                "apos" => '\'',
                num => {
                    let code = match num.strip_prefix("#x").or_else(|| num.strip_prefix("#X")) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                        None => num.strip_prefix('#')?.parse().ok()?,
                    };
                    char::from_u32(code)?
                }
            };
            Some((c, end + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn malformed(&self, reason: &'static str) -> XmlError {
        XmlError::Malformed {
            offset: self.pos,
            reason,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || b == 0 {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Moves past the next occurrence of `end`.
    fn skip_past(&mut self, end: &str) -> Result<(), XmlError> {
        match self.rest().find(end) {
            Some(i) => {
                self.pos += i + end.len();
                Ok(())
            }
            None => Err(XmlError::UnexpectedEof),
        }
    }

    /// Skips whitespace, declarations and comments.
    fn skip_misc(&mut self) -> Result<(), XmlError> {
        loop {
            self.skip_whitespace();
            if self.skip_markup()? {
                continue;
            }
            return Ok(());
        }
    }

    /// Skips one comment, declaration or CDATA section at the cursor.
    fn skip_markup(&mut self) -> Result<bool, XmlError> {
        let rest = self.rest();
        if rest.starts_with("<!--") {
            self.skip_past("-->")?;
        } else if rest.starts_with("<![CDATA[") {
            self.skip_past("]]>")?;
        } else if rest.starts_with("<?") {
            self.skip_past("?>")?;
        } else if rest.starts_with("<!") {
            self.skip_past(">")?;
        } else {
            return Ok(false);
        }
        Ok(true)
    }

    fn name(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || matches!(b, b'/' | b'>' | b'<' | b'=' | b'"' | b'\'') {
                break;
            }
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn expect(&mut self, b: u8, reason: &'static str) -> Result<(), XmlError> {
        match self.peek() {
            Some(c) if c == b => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(self.malformed(reason)),
            None => Err(XmlError::UnexpectedEof),
        }
    }

    fn element(&mut self) -> Result<XmlNode<'a>, XmlError> {
        let start = self.pos;
        self.expect(b'<', "expected '<'")?;
        let name = self.name();
        if name.is_empty() {
            return Err(self.malformed("expected element name"));
        }

        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(XmlError::UnexpectedEof),
                Some(b'/') => {
                    self.pos += 1;
                    self.expect(b'>', "expected '>' after '/'")?;
                    return Ok(XmlNode {
                        src: self.src,
                        name,
                        attributes,
                        children: Vec::new(),
                        span: start..self.pos,
                        content: self.pos..self.pos,
                    });
                }
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => attributes.push(self.attribute()?),
            }
        }

        let content_start = self.pos;
        let mut children = Vec::new();
        loop {
            match self.rest().find('<') {
                Some(i) => self.pos += i,
                None => return Err(XmlError::UnexpectedEof),
            }
            if self.rest().starts_with("</") {
                let content_end = self.pos;
                self.pos += 2;
                let found = self.name();
                self.skip_whitespace();
                self.expect(b'>', "expected '>' in closing tag")?;
                if found != name {
                    return Err(XmlError::MismatchedTag {
                        offset: content_end,
                        expected: name.to_string(),
                        found: found.to_string(),
                    });
                }
                return Ok(XmlNode {
                    src: self.src,
                    name,
                    attributes,
                    children,
                    span: start..self.pos,
                    content: content_start..content_end,
                });
            }
            if !self.skip_markup()? {
                children.push(self.element()?);
            }
        }
    }

    fn attribute(&mut self) -> Result<Attribute<'a>, XmlError> {
        let name = self.name();
        if name.is_empty() {
            return Err(self.malformed("expected attribute name"));
        }
        self.skip_whitespace();
        self.expect(b'=', "expected '=' after attribute name")?;
        self.skip_whitespace();
        let quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            Some(_) => return Err(self.malformed("expected quoted attribute value")),
            None => return Err(XmlError::UnexpectedEof),
        };
        self.pos += 1;
        let start = self.pos;
        match self.rest().find(quote as char) {
            Some(i) => self.pos += i,
            None => return Err(XmlError::UnexpectedEof),
        }
        let raw = &self.src[start..self.pos];
        self.pos += 1;
        Ok(Attribute {
            name,
            raw,
            value: unescape(raw),
        })
    }
}
