//! Element tree serialization
//!
//! Markup is produced with quick-xml's event [`Writer`]; the resulting UTF-8
//! text is then transcoded to the requested output encoding.
//!
//! Element namespaces are written as default-namespace declarations, so a
//! tree built with `{urn:a}root` containing `{urn:a}child` serializes as
//! `<root xmlns="urn:a"><child/></root>`. Namespaced attributes get a
//! generated `nsN` prefix declared on the element that first needs it; the
//! XML namespace always uses `xml`.

use std::io::{self, Write};

use encoding_rs::{Encoding, REPLACEMENT, UTF_16BE, UTF_16LE, UTF_8};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{Error, ErrorKind, Result};
use crate::tree::element::{Element, QName, XML_NAMESPACE};

/// Output options for [`Element::to_bytes`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Encoding label such as `utf-8`, `ascii`, `utf-16` or `iso-8859-2`.
    /// `None` produces UTF-8.
    pub encoding: Option<String>,
    /// Force the XML declaration on or off. When unset it is written only
    /// for encodings other than UTF-8 and ASCII.
    pub xml_declaration: Option<bool>,
    /// Pretty-print with this many spaces per nesting level.
    ///
    /// Elements with text are mixed content: nothing inside them is
    /// indented, so their text survives unchanged.
    pub indent: Option<usize>,
}

impl SerializeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = Some(label.into());
        self
    }

    pub fn with_declaration(mut self, declaration: bool) -> Self {
        self.xml_declaration = Some(declaration);
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = Some(indent);
        self
    }
}

/// Resolved output encoding
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputEncoding {
    Utf8,
    Ascii,
    Utf16 { big_endian: bool, bom: bool },
    Legacy(&'static Encoding),
}

impl OutputEncoding {
    fn resolve(label: &str) -> Result<Self> {
        let normalized = label.trim().to_ascii_lowercase();
        // WHATWG maps "ascii" to windows-1252, which is not what XML callers mean.
        if matches!(normalized.as_str(), "ascii" | "us-ascii") {
            return Ok(Self::Ascii);
        }

        let encoding = Encoding::for_label(normalized.as_bytes())
            .filter(|encoding| *encoding != REPLACEMENT)
            .ok_or_else(|| {
                Error::new(ErrorKind::UnknownEncoding {
                    label: label.to_string(),
                })
            })?;

        let bom = normalized == "utf-16";
        Ok(if encoding == UTF_8 {
            Self::Utf8
        } else if encoding == UTF_16LE {
            Self::Utf16 {
                big_endian: false,
                bom,
            }
        } else if encoding == UTF_16BE {
            Self::Utf16 {
                big_endian: true,
                bom,
            }
        } else {
            Self::Legacy(encoding)
        })
    }

    fn declared_name(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Ascii => "US-ASCII",
            Self::Utf16 { bom: true, .. } => "UTF-16",
            Self::Utf16 {
                big_endian: true, ..
            } => "UTF-16BE",
            Self::Utf16 { .. } => "UTF-16LE",
            Self::Legacy(encoding) => encoding.name(),
        }
    }

    fn is_default(self) -> bool {
        matches!(self, Self::Utf8 | Self::Ascii)
    }

    /// Names have no escape hatch: character references are not allowed in them
    fn can_encode_name(self, name: &str) -> bool {
        match self {
            Self::Utf8 | Self::Utf16 { .. } => true,
            Self::Ascii => name.is_ascii(),
            Self::Legacy(encoding) => !encoding.encode(name).2,
        }
    }

    fn check_names(self, element: &Element) -> Result<()> {
        let names = std::iter::once(element.local_name())
            .chain(element.attrs().map(|(name, _)| name.local_name()));
        for name in names {
            if !self.can_encode_name(name) {
                return Err(Error::new(ErrorKind::UnrepresentableName {
                    name: name.to_string(),
                    encoding: self.declared_name().to_string(),
                }));
            }
        }
        element
            .children()
            .iter()
            .try_for_each(|child| self.check_names(child))
    }

    fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Ascii => encode_ascii(text),
            Self::Utf16 { big_endian, bom } => encode_utf16(text, big_endian, bom),
            // Unmappable characters come back as `&#NNNN;`, which is what XML wants.
            Self::Legacy(encoding) => encoding.encode(text).0.into_owned(),
        }
    }
}

fn encode_ascii(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        match u8::try_from(ch) {
            Ok(byte) if byte.is_ascii() => out.push(byte),
            _ => out.extend_from_slice(format!("&#{};", u32::from(ch)).as_bytes()),
        }
    }
    out
}

fn encode_utf16(text: &str, big_endian: bool, bom: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2 + 2);
    let units = bom.then_some(0xFEFF_u16).into_iter().chain(text.encode_utf16());
    for unit in units {
        if big_endian {
            out.extend_from_slice(&unit.to_be_bytes());
        } else {
            out.extend_from_slice(&unit.to_le_bytes());
        }
    }
    out
}

impl Element {
    /// Serialize this element and its subtree as UTF-8 text without a declaration
    pub fn to_xml_string(&self) -> Result<String> {
        let markup = write_markup(self, None, None)?;
        String::from_utf8(markup)
            .map_err(|err| Error::with_message(ErrorKind::Io, format!("i/o error: {err}")))
    }

    /// Serialize this element and its subtree with the given options
    pub fn to_bytes(&self, options: &SerializeOptions) -> Result<Vec<u8>> {
        let encoding = match options.encoding.as_deref() {
            Some(label) => Some(OutputEncoding::resolve(label)?),
            None => None,
        };

        let declaration = options
            .xml_declaration
            .unwrap_or_else(|| encoding.is_some_and(|encoding| !encoding.is_default()));
        let encoding = encoding.unwrap_or(OutputEncoding::Utf8);
        encoding.check_names(self)?;
        let declared = declaration.then(|| encoding.declared_name());

        let markup = write_markup(self, declared, options.indent)?;
        if encoding == OutputEncoding::Utf8 {
            return Ok(markup);
        }

        let text = String::from_utf8(markup)
            .map_err(|err| Error::with_message(ErrorKind::Io, format!("i/o error: {err}")))?;
        Ok(encoding.encode(&text))
    }

    /// Write this element to `out` with the given options
    pub fn write_to<W: Write>(&self, mut out: W, options: &SerializeOptions) -> Result<()> {
        let bytes = self.to_bytes(options)?;
        out.write_all(&bytes)?;
        Ok(())
    }
}

fn write_markup(
    element: &Element,
    declaration: Option<&str>,
    indent: Option<usize>,
) -> Result<Vec<u8>> {
    let mut markup = MarkupWriter {
        writer: Writer::new(Vec::with_capacity(256)),
        indent,
        prefixes: Vec::new(),
    };

    if let Some(encoding) = declaration {
        markup
            .writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some(encoding), None)))?;
        if indent.is_some() {
            markup.writer.write_event(Event::Text(BytesText::new("\n")))?;
        }
    }
    markup.element(element, None, 0, indent.is_some())?;

    Ok(markup.writer.into_inner())
}

struct MarkupWriter<'a, W: Write> {
    writer: Writer<W>,
    indent: Option<usize>,
    /// Attribute namespace prefixes in scope, innermost last
    prefixes: Vec<(&'a str, String)>,
}

impl<'a, W: Write> MarkupWriter<'a, W> {
    /// `scope` is the default namespace in effect at the parent
    fn element(
        &mut self,
        element: &'a Element,
        scope: Option<&'a str>,
        depth: usize,
        pretty: bool,
    ) -> io::Result<()> {
        let namespace = element.namespace();
        let mut start = BytesStart::new(element.local_name());
        if namespace != scope {
            start.push_attribute(("xmlns", namespace.unwrap_or("")));
        }

        let bound = self.prefixes.len();
        let attributes: Vec<_> = element
            .attrs()
            .map(|(name, value)| (self.qualified_name(name), value))
            .collect();
        for (uri, prefix) in self.prefixes.iter().skip(bound) {
            start.push_attribute((format!("xmlns:{prefix}").as_str(), *uri));
        }
        for (name, value) in &attributes {
            start.push_attribute((name.as_str(), *value));
        }

        let result = self.content(element, start, namespace, depth, pretty);
        self.prefixes.truncate(bound);
        result
    }

    fn content(
        &mut self,
        element: &'a Element,
        start: BytesStart<'_>,
        namespace: Option<&'a str>,
        depth: usize,
        pretty: bool,
    ) -> io::Result<()> {
        if element.is_empty() {
            self.writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        self.writer.write_event(Event::Start(start))?;
        if let Some(text) = element.text() {
            self.writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        let indent_children = pretty && element.text().is_none();
        for child in element.children() {
            if indent_children {
                self.line_break(depth + 1)?;
            }
            self.element(child, namespace, depth + 1, indent_children)?;
        }
        if indent_children {
            self.line_break(depth)?;
        }
        self.writer
            .write_event(Event::End(BytesEnd::new(element.local_name())))?;
        Ok(())
    }

    /// Attribute name as written, binding a new prefix when none is in scope
    fn qualified_name(&mut self, name: &'a QName) -> String {
        let Some(uri) = name.namespace() else {
            return name.local_name().to_string();
        };
        if uri == XML_NAMESPACE {
            return format!("xml:{}", name.local_name());
        }

        let bound = self
            .prefixes
            .iter()
            .rev()
            .find(|(candidate, _)| *candidate == uri)
            .map(|(_, prefix)| prefix.clone());
        let prefix = bound.unwrap_or_else(|| {
            let prefix = format!("ns{}", self.prefixes.len());
            self.prefixes.push((uri, prefix.clone()));
            prefix
        });
        format!("{prefix}:{}", name.local_name())
    }

    fn line_break(&mut self, depth: usize) -> io::Result<()> {
        let width = self.indent.unwrap_or(0).saturating_mul(depth);
        let whitespace = format!("\n{}", " ".repeat(width));
        self.writer
            .write_event(Event::Text(BytesText::new(&whitespace)))?;
        Ok(())
    }
}
