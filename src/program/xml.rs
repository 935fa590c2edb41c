// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Element-at-a-time walking over result XML

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{ParseError, ParseResult};

/// A start tag handed out by [`XmlCursor::next_child`]
pub(crate) struct Element<'a> {
    start: BytesStart<'a>,
    empty: bool,
}

impl<'a> Element<'a> {
    pub fn is(&self, name: &str) -> bool {
        self.start.name().into_inner() == name.as_bytes()
    }

    /// Self-closing element, no children to read
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn attribute(&self, name: &str) -> ParseResult<Option<String>> {
        for attr in self.start.attributes() {
            let attr = attr?;
            if attr.key.into_inner() == name.as_bytes() {
                return Ok(Some(attr.unescape_value()?.into_owned()));
            }
        }
        Ok(None)
    }

    /// Attribute parsed as a number, absent or unparsable values are `None`
    pub fn number(&self, name: &str) -> ParseResult<Option<f64>> {
        Ok(self.attribute(name)?.as_deref().and_then(parse_number))
    }
}

/// Accepts the plain decimal seconds every framework writes, tolerating a
/// trailing unit suffix.
pub(crate) fn parse_number(value: &str) -> Option<f64> {
    value.trim().trim_end_matches('s').parse::<f64>().ok()
}

/// Forward-only cursor that mirrors the "read next start element" style of
/// walking a document: each element is either entered (by calling
/// `next_child` until it returns `None`), skipped, or read as text.
pub(crate) struct XmlCursor<'a> {
    reader: Reader<&'a [u8]>,
    depth: usize,
}

impl<'a> XmlCursor<'a> {
    pub fn new(xml: &'a str) -> Self {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        Self { reader, depth: 0 }
    }

    /// Next child element of the element currently entered. `None` once its
    /// end tag has been consumed, or at the end of the document at top level.
    pub fn next_child(&mut self) -> ParseResult<Option<Element<'a>>> {
        loop {
            match self.reader.read_event()? {
                Event::Start(start) => {
                    self.depth += 1;
                    return Ok(Some(Element { start, empty: false }));
                }
                Event::Empty(start) => return Ok(Some(Element { start, empty: true })),
                Event::End(_) => {
                    self.depth = self.depth.saturating_sub(1);
                    return Ok(None);
                }
                Event::Eof if self.depth > 0 => return Err(ParseError::UnexpectedEof),
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }

    /// Consume the rest of `element` including its children
    pub fn skip(&mut self, element: &Element<'a>) -> ParseResult<()> {
        if !element.empty {
            self.reader.read_to_end(element.start.name())?;
            self.depth = self.depth.saturating_sub(1);
        }
        Ok(())
    }

    /// Concatenated text and CDATA content of `element`, consuming through
    /// its end tag. Text inside nested elements is included.
    pub fn read_text(&mut self, element: &Element<'a>) -> ParseResult<String> {
        let mut text = String::new();
        if element.empty {
            return Ok(text);
        }

        let mut nested = 0usize;
        loop {
            match self.reader.read_event()? {
                Event::Text(t) => text.push_str(&t.unescape()?),
                Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
                Event::Start(_) => nested += 1,
                Event::End(_) if nested == 0 => {
                    self.depth = self.depth.saturating_sub(1);
                    return Ok(text);
                }
                Event::End(_) => nested -= 1,
                Event::Eof => return Err(ParseError::UnexpectedEof),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walks_children_and_text() {
        let xml = r#"<?xml version="1.0"?>
            <root a="1 &amp; 2">
                <skip><deep>x</deep></skip>
                <leaf/>
                <msg>hello <![CDATA[<world>]]></msg>
            </root>"#;
        let mut cursor = XmlCursor::new(xml);
        let root = cursor.next_child().unwrap().unwrap();
        assert!(root.is("root"));
        assert_eq!(root.attribute("a").unwrap().as_deref(), Some("1 & 2"));
        assert_eq!(root.attribute("b").unwrap(), None);

        let skip = cursor.next_child().unwrap().unwrap();
        cursor.skip(&skip).unwrap();

        let leaf = cursor.next_child().unwrap().unwrap();
        assert!(leaf.is("leaf") && leaf.is_empty());

        let msg = cursor.next_child().unwrap().unwrap();
        assert_eq!(cursor.read_text(&msg).unwrap(), "hello<world>");

        assert!(cursor.next_child().unwrap().is_none());
        assert!(cursor.next_child().unwrap().is_none());
    }

    #[test]
    fn test_truncated_document_is_an_error() {
        let mut cursor = XmlCursor::new("<root><child>");
        cursor.next_child().unwrap();
        cursor.next_child().unwrap();
        assert!(cursor.next_child().is_err());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("0.25"), Some(0.25));
        assert_eq!(parse_number("1.5s"), Some(1.5));
        assert_eq!(parse_number("soon"), None);
    }
}
