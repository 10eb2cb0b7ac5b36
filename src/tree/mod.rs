//! The parsed tree abstraction consumed by the decoder.
//!
//! Decoding never touches raw markup: every entry point funnels into
//! [`parse_str`], which materializes the document as an [`Element`] tree and
//! hands that tree to the decoder. The parser is deliberately hardened:
//!
//! - any `<!DOCTYPE ...>` declaration is rejected outright (which also
//!   forecloses internal entity declarations),
//! - external entities are never resolved,
//! - an unrecognized entity reference fails the parse instead of expanding.
//!
//! These properties are not configurable.

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;

// -----------------------------------------------------------------------------
// Element

/// One element node of a parsed document.
///
/// An `Element` carries its tag name as written (possibly namespace
/// qualified), the concatenation of its direct character data, and its child
/// elements in document order.
///
/// # Example
///
/// ```
/// use xmlbind::tree;
///
/// let root = tree::parse_str("<cfg><retries> 3 </retries></cfg>")?;
/// assert_eq!(root.name(), "cfg");
/// assert_eq!(root.child("retries").unwrap().text().trim(), "3");
/// # Ok::<(), xmlbind::tree::SourceError>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    /// Create an element with the given tag name and no content.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style helper setting the text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Builder-style helper appending a child element.
    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// The tag name as written in the document, prefix included.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tag name with any namespace prefix stripped.
    #[inline]
    pub fn local_name(&self) -> &str {
        match self.name.rsplit_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// The element's direct character data, untrimmed.
    ///
    /// Whitespace handling is the converter's concern, not the tree's.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Child elements in document order.
    #[inline]
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Whether this element answers to `name`, by tag name or local name.
    #[inline]
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.local_name() == name
    }

    /// The *first* child whose tag name or local name equals `name`.
    ///
    /// Singular field lookup deliberately ignores any later siblings with the
    /// same name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.matches(name))
    }

    /// All children whose tag name or local name equals `name`, in document
    /// order.
    pub fn children_named(&self, name: &str) -> impl Iterator<Item = &Element> {
        self.children.iter().filter(move |child| child.matches(name))
    }

    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }
}

// -----------------------------------------------------------------------------
// SourceError

/// Failure to obtain or parse an input document.
///
/// Raised before any decoding takes place; decode-time failures use
/// [`DecodeError`](crate::decode::DecodeError) instead.
#[derive(Debug)]
pub enum SourceError {
    /// The underlying stream or file could not be read.
    Io(std::io::Error),
    /// The document is not well-formed markup.
    Syntax(quick_xml::Error),
    /// The document carries a `<!DOCTYPE ...>` declaration.
    ///
    /// Doctype declarations (and with them, entity declarations) are
    /// rejected unconditionally.
    ForbiddenDoctype,
    /// The document ended without a root element.
    NoRootElement,
    /// A closing tag appeared without a matching open element.
    UnbalancedTag { name: String },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read document source: {err}"),
            Self::Syntax(err) => write!(f, "malformed document: {err}"),
            Self::ForbiddenDoctype => {
                write!(f, "document carries a DOCTYPE declaration, which is not allowed")
            }
            Self::NoRootElement => write!(f, "document has no root element"),
            Self::UnbalancedTag { name } => {
                write!(f, "closing tag `{name}` without a matching open element")
            }
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Syntax(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SourceError {
    #[inline]
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<quick_xml::Error> for SourceError {
    #[inline]
    fn from(err: quick_xml::Error) -> Self {
        Self::Syntax(err)
    }
}

// -----------------------------------------------------------------------------
// Parsing

/// Parse a document held in memory into its root [`Element`].
pub fn parse_str(xml: &str) -> Result<Element, SourceError> {
    let mut reader = Reader::from_str(xml);

    // Open elements, innermost last. The finished root lands in `root`.
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::DocType(_) => return Err(SourceError::ForbiddenDoctype),
            Event::Start(start) => {
                stack.push(Element::new(name_of(start.name().as_ref())));
            }
            Event::Empty(start) => {
                let element = Element::new(name_of(start.name().as_ref()));
                attach(element, &mut stack, &mut root);
            }
            Event::End(end) => {
                let Some(element) = stack.pop() else {
                    return Err(SourceError::UnbalancedTag {
                        name: name_of(end.name().as_ref()),
                    });
                };
                attach(element, &mut stack, &mut root);
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|err| SourceError::Syntax(err.into()))?;
                if let Some(open) = stack.last_mut() {
                    open.push_text(&text);
                }
            }
            Event::CData(cdata) => {
                let bytes = cdata.into_inner();
                if let Some(open) = stack.last_mut() {
                    open.push_text(&String::from_utf8_lossy(&bytes));
                }
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) => {}
            Event::Eof => break,
        }
    }

    root.ok_or(SourceError::NoRootElement)
}

/// Parse a document from an arbitrary reader.
///
/// The stream is drained eagerly; parsing is never incremental.
pub fn parse_reader<R: Read>(mut reader: R) -> Result<Element, SourceError> {
    let mut xml = String::new();
    reader.read_to_string(&mut xml)?;
    parse_str(&xml)
}

/// Parse a document stored at `path`.
pub fn parse_path(path: impl AsRef<Path>) -> Result<Element, SourceError> {
    let xml = fs::read_to_string(path)?;
    parse_str(&xml)
}

fn name_of(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn attach(element: Element, stack: &mut Vec<Element>, root: &mut Option<Element>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        // Only the first top-level element becomes the root.
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_structure_and_document_order() {
        let root = parse_str(
            "<settings>\
                <a>1</a>\
                <b><inner>x</inner></b>\
                <a>2</a>\
             </settings>",
        )
        .unwrap();

        assert_eq!(root.name(), "settings");
        assert_eq!(root.children().len(), 3);
        assert_eq!(root.children()[0].text(), "1");
        assert_eq!(root.children()[1].child("inner").unwrap().text(), "x");

        // Singular lookup returns the first match only.
        assert_eq!(root.child("a").unwrap().text(), "1");

        let all: Vec<_> = root.children_named("a").map(Element::text).collect();
        assert_eq!(all, ["1", "2"]);
    }

    #[test]
    fn local_name_matching_with_prefixes() {
        let root = parse_str("<c:cfg><c:retries>7</c:retries></c:cfg>").unwrap();
        assert_eq!(root.name(), "c:cfg");
        assert_eq!(root.local_name(), "cfg");
        assert!(root.matches("cfg"));
        assert_eq!(root.child("retries").unwrap().text(), "7");
    }

    #[test]
    fn empty_elements_and_cdata() {
        let root = parse_str("<r><flag/><raw><![CDATA[a < b]]></raw></r>").unwrap();
        assert_eq!(root.child("flag").unwrap().text(), "");
        assert_eq!(root.child("raw").unwrap().text(), "a < b");
    }

    #[test]
    fn text_is_kept_untrimmed() {
        let root = parse_str("<r><v>  42  </v></r>").unwrap();
        assert_eq!(root.child("v").unwrap().text(), "  42  ");
    }

    #[test]
    fn predefined_entities_resolve() {
        let root = parse_str("<r><v>a &amp; b</v></r>").unwrap();
        assert_eq!(root.child("v").unwrap().text(), "a & b");
    }

    #[test]
    fn doctype_is_rejected() {
        let err = parse_str("<!DOCTYPE r [<!ENTITY xxe SYSTEM \"file:///etc/passwd\">]><r/>")
            .unwrap_err();
        assert!(matches!(err, SourceError::ForbiddenDoctype));
    }

    #[test]
    fn unknown_entity_reference_fails_instead_of_expanding() {
        assert!(parse_str("<r><v>&xxe;</v></r>").is_err());
    }

    #[test]
    fn missing_root_is_an_error() {
        assert!(matches!(
            parse_str("<?xml version=\"1.0\"?>"),
            Err(SourceError::NoRootElement)
        ));
    }

    #[test]
    fn malformed_markup_is_an_error() {
        assert!(parse_str("<r><open></r>").is_err());
    }
}
