//! XML element model

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::{Error, ErrorKind, Result};
use crate::tree::name::{validate_chars, validate_ncname};

/// Namespace bound to the reserved `xml` prefix
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// A local name plus an optional namespace URI
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QName {
    local: String,
    namespace: Option<String>,
}

impl QName {
    /// Unqualified name
    pub fn local(name: impl Into<String>) -> Result<Self> {
        Self::new(name, None)
    }

    /// Name qualified with `namespace`
    pub fn namespaced(namespace: &str, name: impl Into<String>) -> Result<Self> {
        Self::new(name, Some(namespace))
    }

    /// Create a name, validating the local part and the namespace URI.
    ///
    /// An empty URI means "no namespace", as `xmlns=""` does in a document.
    pub fn new(name: impl Into<String>, namespace: Option<&str>) -> Result<Self> {
        let local = name.into();
        validate_ncname(&local)?;

        let namespace = match namespace {
            Some("") | None => None,
            Some(uri) => {
                if validate_chars(uri).is_err() {
                    return Err(Error::new(ErrorKind::InvalidNamespace {
                        found: format!("{uri:?}"),
                    }));
                }
                Some(uri.to_string())
            }
        };

        Ok(Self { local, namespace })
    }

    pub fn local_name(&self) -> &str {
        &self.local
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

/// Parses a plain name or Clark notation (`{urn:example}local`)
impl FromStr for QName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.strip_prefix('{') {
            Some(rest) => match rest.split_once('}') {
                Some((namespace, local)) => Self::new(local, Some(namespace)),
                None => Err(Error::invalid_name(s)),
            },
            None => Self::local(s),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{{{namespace}}}{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

fn attribute_name(name: &str) -> Result<QName> {
    match name.strip_prefix("xml:") {
        Some(local) => QName::namespaced(XML_NAMESPACE, local),
        None => name.parse(),
    }
}

/// XML element
///
/// Holds a qualified name, ordered attributes, optional leading text and
/// ordered child elements. Children are owned by their parent.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    name: QName,
    attributes: IndexMap<QName, String>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: IndexMap::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    /// Local name, independent of the namespace
    pub fn local_name(&self) -> &str {
        self.name.local_name()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.name.namespace()
    }

    /// Set an attribute, replacing any previous value in its original position.
    ///
    /// `name` is a plain name, Clark notation (`{uri}local`) or an `xml:`
    /// prefixed name such as `xml:lang`.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        self.set_qualified_attr(attribute_name(name)?, value)
    }

    pub fn set_qualified_attr(&mut self, name: QName, value: impl Into<String>) -> Result<()> {
        let declares_namespace = match name.namespace() {
            None => name.local_name() == "xmlns",
            Some(namespace) => namespace == XMLNS_NAMESPACE,
        };
        if declares_namespace {
            return Err(Error::invalid_name(&name.to_string()));
        }
        let value = value.into();
        validate_chars(&value)?;
        self.attributes.insert(name, value);
        Ok(())
    }

    /// Look an attribute up by the same name forms [`Element::set_attr`] accepts
    pub fn attr(&self, name: &str) -> Option<&str> {
        let name = attribute_name(name).ok()?;
        self.attributes.get(&name).map(String::as_str)
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let name = attribute_name(name).ok()?;
        self.attributes.shift_remove(&name)
    }

    /// Attributes in insertion order
    pub fn attrs(&self) -> impl Iterator<Item = (&QName, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name, value.as_str()))
    }

    pub fn attr_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn set_text(&mut self, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        validate_chars(&value)?;
        self.text = Some(value);
        Ok(())
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn clear_text(&mut self) -> Option<String> {
        self.text.take()
    }

    pub fn append_child(&mut self, child: Self) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[Self] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// First child with the given local name
    pub fn find(&self, local_name: &str) -> Option<&Self> {
        self.children
            .iter()
            .find(|child| child.local_name() == local_name)
    }

    /// True when there is neither text nor any child
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.children.is_empty()
    }
}

impl Extend<Element> for Element {
    fn extend<I: IntoIterator<Item = Element>>(&mut self, iter: I) {
        self.children.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qname_local() -> Result<()> {
        let name = QName::local("item")?;
        assert_eq!(name.local_name(), "item");
        assert_eq!(name.namespace(), None);
        assert_eq!(name.to_string(), "item");
        Ok(())
    }

    #[test]
    fn test_qname_empty_namespace_is_none() -> Result<()> {
        let name = QName::namespaced("", "item")?;
        assert_eq!(name, QName::local("item")?);
        Ok(())
    }

    #[test]
    fn test_qname_clark_notation() -> Result<()> {
        let name: QName = "{urn:test}item".parse()?;
        assert_eq!(name.namespace(), Some("urn:test"));
        assert_eq!(name.local_name(), "item");
        assert_eq!(name.to_string(), "{urn:test}item");

        assert!("{urn:test".parse::<QName>().is_err());
        assert!("pre:item".parse::<QName>().is_err());
        Ok(())
    }

    #[test]
    fn test_qname_rejects_control_characters_in_namespace() {
        let err = QName::namespaced("urn:\u{0}", "item").err();
        assert!(matches!(
            err.map(|e| e.kind().clone()),
            Some(ErrorKind::InvalidNamespace { .. })
        ));
    }

    #[test]
    fn test_attributes_keep_order_and_replace_in_place() -> Result<()> {
        let mut element = Element::new(QName::local("root")?);
        element.set_attr("bravo", "b")?;
        element.set_attr("alpha", "a")?;
        element.set_attr("bravo", "B")?;

        let attrs: Vec<_> = element
            .attrs()
            .map(|(name, value)| (name.local_name(), value))
            .collect();
        assert_eq!(attrs, vec![("bravo", "B"), ("alpha", "a")]);
        assert_eq!(element.attr("alpha"), Some("a"));
        assert_eq!(element.attr_count(), 2);

        assert_eq!(element.remove_attr("bravo"), Some("B".to_string()));
        assert_eq!(element.attr("bravo"), None);
        Ok(())
    }

    #[test]
    fn test_attribute_name_validation() -> Result<()> {
        let mut element = Element::new(QName::local("root")?);
        assert!(element.set_attr("xmlns", "urn:x").is_err());
        assert!(element.set_attr("bad name", "x").is_err());
        assert!(element.set_attr("ok", "bad\u{1}value").is_err());
        assert!(element.set_attr("pre:fix", "x").is_err());
        assert!(element
            .set_attr("{http://www.w3.org/2000/xmlns/}p", "urn:x")
            .is_err());
        assert_eq!(element.attr_count(), 0);
        Ok(())
    }

    #[test]
    fn test_namespaced_attributes() -> Result<()> {
        let mut element = Element::new(QName::local("root")?);
        element.set_attr("xml:lang", "en")?;
        element.set_attr("{urn:x}lang", "fr")?;
        element.set_attr("lang", "de")?;

        assert_eq!(element.attr_count(), 3);
        assert_eq!(element.attr("xml:lang"), Some("en"));
        assert_eq!(element.attr(&format!("{{{XML_NAMESPACE}}}lang")), Some("en"));
        assert_eq!(element.attr("{urn:x}lang"), Some("fr"));
        assert_eq!(element.attr("lang"), Some("de"));

        let names: Vec<_> = element.attrs().map(|(name, _)| name.namespace()).collect();
        assert_eq!(names, vec![Some(XML_NAMESPACE), Some("urn:x"), None]);
        Ok(())
    }

    #[test]
    fn test_text_and_children() -> Result<()> {
        let mut root = Element::new(QName::local("root")?);
        assert!(root.is_empty());

        root.set_text("hello")?;
        assert_eq!(root.text(), Some("hello"));
        assert!(!root.is_empty());

        root.append_child(Element::new(QName::local("alpha")?));
        root.extend([Element::new(QName::namespaced("urn:b", "bravo")?)]);

        assert_eq!(root.child_count(), 2);
        assert_eq!(root.find("bravo").and_then(Element::namespace), Some("urn:b"));
        assert!(root.find("charlie").is_none());

        assert_eq!(root.clear_text(), Some("hello".to_string()));
        assert_eq!(root.text(), None);
        Ok(())
    }
}
