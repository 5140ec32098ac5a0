//! Minimal XML reader for dive log documents.
//!
//! Tokens are recognised with nom combinators and assembled into an element
//! tree with an explicit stack, so unbalanced markup is reported with the
//! byte offset of the offending tag. The reader checks well-formedness for the
//! constructs UDDF exports actually contain: the XML declaration, comments,
//! processing instructions, a DOCTYPE without an internal subset, CDATA,
//! attributes, self-closing tags, predefined entities and numeric character
//! references.
//!
//! Queries follow document order, mirroring what a DOM selector would return:
//!
//! ```
//! use diveoverlay_core::xml::{NomXmlReader, XmlReader};
//!
//! let doc = NomXmlReader
//!     .read("<dc><name>A</name><manufacturer><name>B</name></manufacturer></dc>")
//!     .unwrap();
//! let dc = doc.find("dc").unwrap();
//! assert_eq!(dc.find("name").unwrap().text_content(), "A");
//! assert_eq!(dc.find_path(&["manufacturer", "name"]).unwrap().text_content(), "B");
//! ```

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{map, recognize, value},
    multi::many0,
    sequence::{delimited, pair},
    IResult, Parser,
};

use crate::error::XmlError;

/// Capability that turns XML text into a [`Document`].
///
/// The UDDF parser is generic over this trait so callers can substitute a
/// different XML backend.
pub trait XmlReader {
    fn read(&self, text: &str) -> Result<Document, XmlError>;
}

impl<F> XmlReader for F
where
    F: Fn(&str) -> Result<Document, XmlError>,
{
    fn read(&self, text: &str) -> Result<Document, XmlError> {
        self(text)
    }
}

/// Default reader backed by [`read_document`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NomXmlReader;

impl XmlReader for NomXmlReader {
    fn read(&self, text: &str) -> Result<Document, XmlError> {
        read_document(text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Direct child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// All descendant elements in document order, excluding `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![self.children.iter()],
        }
    }

    /// First descendant element named `name`.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.descendants().find(|el| el.name == name)
    }

    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.descendants().filter(move |el| el.name == name)
    }

    /// Descendant-combinator lookup: `["manufacturer", "name"]` finds a
    /// `name` element somewhere below a `manufacturer` element.
    pub fn find_path(&self, path: &[&str]) -> Option<&Element> {
        match path {
            [] => None,
            [last] => self.find(last),
            [first, rest @ ..] => self
                .descendants()
                .filter(|el| el.name == *first)
                .find_map(|el| el.find_path(rest)),
        }
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for node in &element.children {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => collect_text(el, out),
        }
    }
}

/// Pre-order iterator over descendant elements.
pub struct Descendants<'a> {
    stack: Vec<std::slice::Iter<'a, Node>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<&'a Element> {
        while let Some(iter) = self.stack.last_mut() {
            match iter.next() {
                Some(Node::Element(el)) => {
                    self.stack.push(el.children.iter());
                    return Some(el);
                }
                Some(Node::Text(_)) => continue,
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}

/// A parsed document. Queries include the root element itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        std::iter::once(&self.root).chain(self.root.descendants())
    }

    pub fn find(&self, name: &str) -> Option<&Element> {
        self.elements().find(|el| el.name == name)
    }

    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |el| el.name == name)
    }
}

/// Deepest element nesting accepted by [`read_document`]. The tree is
/// recursive, so unbounded depth would overflow the stack on drop.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    StartTag {
        name: &'a str,
        attributes: Vec<(&'a str, &'a str)>,
        self_closing: bool,
    },
    EndTag(&'a str),
    Text(&'a str),
    CData(&'a str),
    Comment,
    ProcessingInstruction,
    Doctype(&'a str),
}

/// Parse XML text into a [`Document`].
pub fn read_document(text: &str) -> Result<Document, XmlError> {
    let full = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rest = full;
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    while !rest.is_empty() {
        let position = full.len() - rest.len();
        let (remaining, tok) = match token(rest) {
            Ok(parsed) => parsed,
            Err(_) => return Err(XmlError::new(position, describe_failure(rest))),
        };
        rest = remaining;

        match tok {
            Token::Comment | Token::ProcessingInstruction => {}
            Token::Doctype(body) => {
                if root.is_some() || !stack.is_empty() {
                    return Err(XmlError::new(position, "DOCTYPE after the root element"));
                }
                if body.contains('[') {
                    return Err(XmlError::new(
                        position,
                        "internal DTD subsets are not supported",
                    ));
                }
            }
            Token::Text(raw) => match stack.last_mut() {
                Some(parent) => push_text(parent, decode_entities(raw, position)?),
                None if raw.trim().is_empty() => {}
                None => {
                    return Err(XmlError::new(
                        position,
                        "text outside of the root element",
                    ))
                }
            },
            Token::CData(data) => match stack.last_mut() {
                Some(parent) => push_text(parent, data.to_string()),
                None => {
                    return Err(XmlError::new(
                        position,
                        "CDATA outside of the root element",
                    ))
                }
            },
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                if stack.is_empty() && root.is_some() {
                    return Err(XmlError::new(
                        position,
                        format!("second root element <{}>", name),
                    ));
                }
                if stack.len() >= MAX_DEPTH {
                    return Err(XmlError::new(
                        position,
                        format!("elements nested deeper than {}", MAX_DEPTH),
                    ));
                }
                let mut element = Element::new(name);
                for (key, raw_value) in attributes {
                    if element.attribute(key).is_some() {
                        return Err(XmlError::new(
                            position,
                            format!("duplicate attribute '{}' on <{}>", key, name),
                        ));
                    }
                    let decoded = decode_entities(raw_value, position)?;
                    element.attributes.push((key.to_string(), decoded));
                }
                if self_closing {
                    attach(&mut stack, &mut root, element);
                } else {
                    stack.push(element);
                }
            }
            Token::EndTag(name) => {
                let open = stack.pop().ok_or_else(|| {
                    XmlError::new(position, format!("unexpected end tag </{}>", name))
                })?;
                if open.name != name {
                    return Err(XmlError::new(
                        position,
                        format!(
                            "mismatched end tag: expected </{}>, found </{}>",
                            open.name, name
                        ),
                    ));
                }
                attach(&mut stack, &mut root, open);
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::new(
            full.len(),
            format!("unclosed element <{}>", open.name),
        ));
    }
    root.map(|root| Document { root })
        .ok_or_else(|| XmlError::new(full.len(), "no root element"))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => *root = Some(element),
    }
}

fn push_text(parent: &mut Element, text: String) {
    if let Some(Node::Text(existing)) = parent.children.last_mut() {
        existing.push_str(&text);
    } else {
        parent.children.push(Node::Text(text));
    }
}

fn describe_failure(rest: &str) -> String {
    let construct = if rest.starts_with("<!--") {
        "unterminated comment"
    } else if rest.starts_with("<![CDATA[") {
        "unterminated CDATA section"
    } else if rest.starts_with("<!") {
        "malformed declaration"
    } else if rest.starts_with("<?") {
        "unterminated processing instruction"
    } else if rest.starts_with("</") {
        "malformed end tag"
    } else {
        "malformed start tag"
    };
    let snippet: String = rest.chars().take(24).collect();
    format!("{} near '{}'", construct, snippet)
}

fn decode_entities(raw: &str, position: usize) -> Result<String, XmlError> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let at = position + (raw.len() - rest.len()) + amp;
        let after = &rest[amp + 1..];
        let semi = after
            .find(';')
            .ok_or_else(|| XmlError::new(at, "unterminated entity reference"))?;
        let entity = &after[..semi];
        let decoded = match entity {
            "lt" => Some('<'),
            "gt" => Some('>'),
            "amp" => Some('&'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => numeric_reference(entity),
        };
        match decoded {
            Some(c) => out.push(c),
            None => {
                return Err(XmlError::new(
                    at,
                    format!("unknown entity '&{};'", entity),
                ))
            }
        }
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn numeric_reference(entity: &str) -> Option<char> {
    let code = if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        entity.strip_prefix('#')?.parse::<u32>().ok()?
    };
    char::from_u32(code)
}

fn token(input: &str) -> IResult<&str, Token<'_>> {
    alt((
        value(Token::Comment, comment),
        map(cdata, Token::CData),
        map(doctype, Token::Doctype),
        value(Token::ProcessingInstruction, processing_instruction),
        map(end_tag, Token::EndTag),
        start_tag,
        map(text, Token::Text),
    ))
    .parse(input)
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == ':'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.')
}

fn name(input: &str) -> IResult<&str, &str> {
    recognize(pair(take_while1(is_name_start), take_while(is_name_char))).parse(input)
}

fn comment(input: &str) -> IResult<&str, &str> {
    delimited(tag("<!--"), take_until("-->"), tag("-->")).parse(input)
}

fn cdata(input: &str) -> IResult<&str, &str> {
    delimited(tag("<![CDATA["), take_until("]]>"), tag("]]>")).parse(input)
}

fn doctype(input: &str) -> IResult<&str, &str> {
    delimited(tag("<!DOCTYPE"), take_until(">"), char('>')).parse(input)
}

fn processing_instruction(input: &str) -> IResult<&str, &str> {
    delimited(tag("<?"), take_until("?>"), tag("?>")).parse(input)
}

fn end_tag(input: &str) -> IResult<&str, &str> {
    delimited(tag("</"), name, pair(multispace0, char('>'))).parse(input)
}

fn attribute_value(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(
            char('"'),
            take_while(|c: char| c != '"' && c != '<'),
            char('"'),
        ),
        delimited(
            char('\''),
            take_while(|c: char| c != '\'' && c != '<'),
            char('\''),
        ),
    ))
    .parse(input)
}

fn attribute(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, _) = multispace1(input)?;
    let (input, key) = name(input)?;
    let (input, _) = delimited(multispace0, char('='), multispace0).parse(input)?;
    let (input, val) = attribute_value(input)?;
    Ok((input, (key, val)))
}

fn start_tag(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('<').parse(input)?;
    let (input, tag_name) = name(input)?;
    let (input, attributes) = many0(attribute).parse(input)?;
    let (input, _) = multispace0(input)?;
    let (input, self_closing) =
        alt((value(true, tag("/>")), value(false, tag(">")))).parse(input)?;

    Ok((
        input,
        Token::StartTag {
            name: tag_name,
            attributes,
            self_closing,
        },
    ))
}

fn text(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c != '<').parse(input)
}
