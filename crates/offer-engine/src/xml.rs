//! Owned XML tree for round-trip editing of OOXML parts.
//!
//! Built from quick-xml events. Element and attribute names keep their prefixes
//! verbatim; lookups compare local names so `w:tbl` and `tbl` match alike.
//! Declarations, comments and processing instructions are carried through untouched.

use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::OfferError;

fn xml_err(e: impl std::fmt::Display) -> OfferError {
    OfferError::Xml(e.to_string())
}

fn local(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, l)| l)
}

#[derive(Debug, Clone)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Other(Event<'static>),
}

#[derive(Debug, Clone, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn local_name(&self) -> &str {
        local(&self.name)
    }

    pub fn is(&self, local_name: &str) -> bool {
        self.local_name() == local_name
    }

    /// Name for a new element in this element's namespace prefix.
    pub fn sibling_name(&self, local_name: &str) -> String {
        match self.name.rsplit_once(':') {
            Some((prefix, _)) => format!("{prefix}:{local_name}"),
            None => local_name.to_string(),
        }
    }

    /// Attribute by exact name, falling back to local name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .or_else(|| self.attributes.iter().find(|(k, _)| local(k) == name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attributes.retain(|(k, _)| k != name);
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn children_named<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.is(local_name))
    }

    pub fn child(&self, local_name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.is(local_name))
    }

    pub fn child_mut(&mut self, local_name: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.is(local_name))
    }

    /// Indices into `children` of the direct child elements named `local_name`.
    pub fn positions(&self, local_name: &str) -> Vec<usize> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, n)| match n {
                XmlNode::Element(e) if e.is(local_name) => Some(i),
                _ => None,
            })
            .collect()
    }

    pub fn element_at(&self, index: usize) -> Option<&XmlElement> {
        match self.children.get(index) {
            Some(XmlNode::Element(e)) => Some(e),
            _ => None,
        }
    }

    pub fn element_at_mut(&mut self, index: usize) -> Option<&mut XmlElement> {
        match self.children.get_mut(index) {
            Some(XmlNode::Element(e)) => Some(e),
            _ => None,
        }
    }

    pub fn push(&mut self, element: XmlElement) {
        self.children.push(XmlNode::Element(element));
    }

    /// Drop direct child elements for which `remove` returns true.
    pub fn remove_elements(&mut self, mut remove: impl FnMut(&XmlElement) -> bool) {
        self.children.retain(|n| match n {
            XmlNode::Element(e) => !remove(e),
            _ => true,
        });
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    /// Concatenated text of all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(t) | XmlNode::CData(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
                XmlNode::Other(_) => {}
            }
        }
    }

    /// Visit every descendant named `local_name`, outermost first, without descending
    /// into matches.
    pub fn for_each_named_mut(&mut self, local_name: &str, f: &mut dyn FnMut(&mut XmlElement)) {
        for child in self.elements_mut() {
            if child.is(local_name) {
                f(child);
            } else {
                child.for_each_named_mut(local_name, f);
            }
        }
    }

    fn write(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), OfferError> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        if self.children.is_empty() {
            return writer.write_event(Event::Empty(start)).map_err(xml_err);
        }
        writer.write_event(Event::Start(start)).map_err(xml_err)?;
        for child in &self.children {
            child.write(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(xml_err)
    }
}

impl XmlNode {
    fn write(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), OfferError> {
        match self {
            XmlNode::Element(e) => e.write(writer),
            XmlNode::Text(t) => writer
                .write_event(Event::Text(BytesText::new(t)))
                .map_err(xml_err),
            XmlNode::CData(t) => writer
                .write_event(Event::CData(BytesCData::new(t.as_str())))
                .map_err(xml_err),
            XmlNode::Other(event) => writer.write_event(event.borrow()).map_err(xml_err),
        }
    }
}

/// A parsed XML part: everything before the root, the root, and anything after it.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    pub prolog: Vec<XmlNode>,
    pub root: XmlElement,
    pub epilog: Vec<XmlNode>,
}

impl XmlDocument {
    pub fn parse(xml: &str) -> Result<Self, OfferError> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let node = match reader.read_event().map_err(xml_err)? {
                Event::Start(start) => {
                    stack.push(element_from(&start)?);
                    continue;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| OfferError::Xml("unbalanced end tag".to_string()))?;
                    XmlNode::Element(element)
                }
                Event::Empty(start) => XmlNode::Element(element_from(&start)?),
                Event::Text(text) => XmlNode::Text(text.unescape().map_err(xml_err)?.into_owned()),
                Event::CData(data) => {
                    XmlNode::CData(String::from_utf8_lossy(&data.into_inner()).into_owned())
                }
                Event::Eof => break,
                other => XmlNode::Other(other.into_owned()),
            };

            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => match node {
                    XmlNode::Element(element) if root.is_none() => root = Some(element),
                    other if root.is_none() => prolog.push(other),
                    other => epilog.push(other),
                },
            }
        }

        if !stack.is_empty() {
            return Err(OfferError::Xml("unexpected end of document".to_string()));
        }
        let root = root.ok_or_else(|| OfferError::Xml("document has no root element".to_string()))?;
        Ok(Self {
            prolog,
            root,
            epilog,
        })
    }

    pub fn to_xml(&self) -> Result<String, OfferError> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.prolog {
            node.write(&mut writer)?;
        }
        self.root.write(&mut writer)?;
        for node in &self.epilog {
            node.write(&mut writer)?;
        }
        String::from_utf8(writer.into_inner()).map_err(xml_err)
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<XmlElement, OfferError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(xml_err)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(xml_err)?.into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="urn:w"><w:body><w:p><w:r><w:t xml:space="preserve">A &amp; B </w:t></w:r></w:p><w:sectPr/></w:body></w:document>"#;

    #[test]
    fn test_round_trip_preserves_structure() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        let out = doc.to_xml().unwrap();
        assert!(out.starts_with(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#));
        let again = XmlDocument::parse(&out).unwrap();
        assert_eq!(again.root.text(), "A & B ");
        assert_eq!(again.to_xml().unwrap(), out);
    }

    #[test]
    fn test_local_name_lookup() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        let body = doc.root.child("body").unwrap();
        assert_eq!(body.name, "w:body");
        assert_eq!(body.sibling_name("tbl"), "w:tbl");
        assert_eq!(body.positions("p"), vec![0]);
        let t = body.child("p").and_then(|p| p.child("r")).and_then(|r| r.child("t")).unwrap();
        assert_eq!(t.attr("xml:space"), Some("preserve"));
        assert_eq!(t.attr("space"), Some("preserve"));
    }

    #[test]
    fn test_escaping_on_write() {
        let mut root = XmlElement::new("root");
        root.set_attr("title", "a\"b<c");
        root.push(XmlElement::new("t").with_text("<x> & y"));
        let doc = XmlDocument {
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        };
        let out = doc.to_xml().unwrap();
        let parsed = XmlDocument::parse(&out).unwrap();
        assert_eq!(parsed.root.attr("title"), Some("a\"b<c"));
        assert_eq!(parsed.root.text(), "<x> & y");
    }

    #[test]
    fn test_unbalanced_document_rejected() {
        assert!(XmlDocument::parse("<a><b></a>").is_err());
        assert!(XmlDocument::parse("").is_err());
    }

    #[test]
    fn test_for_each_named_visits_nested() {
        let mut doc =
            XmlDocument::parse("<b><p>1</p><tbl><tr><tc><p>2</p></tc></tr></tbl></b>").unwrap();
        let mut seen = Vec::new();
        doc.root.for_each_named_mut("p", &mut |p| seen.push(p.text()));
        assert_eq!(seen, vec!["1", "2"]);
    }
}
