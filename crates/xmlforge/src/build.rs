//! Structure-to-element builder
//!
//! Mapping keys follow a fixed convention:
//!
//! - `#ns` sets the namespace of the element and of every descendant that
//!   does not declare its own. A null value removes the namespace.
//! - `#text` sets the element's text.
//! - `@name` sets the attribute `name`. Namespaced attributes are written
//!   `@xml:lang` or in Clark notation, `@{uri}name`.
//! - any other key adds one child element per value, or one per item when
//!   the value is a sequence.
//!
//! Null attributes and text are left out rather than written empty.

use tracing::{debug, instrument, trace};

use crate::error::{Error, ErrorKind, Result};
use crate::node::{Mapping, Node, Scalar};
use crate::tree::{Element, QName, SerializeOptions};

/// Tag used for the root element when the caller does not choose one
pub const DEFAULT_ROOT: &str = "root";

const NAMESPACE_KEY: &str = "#ns";
const TEXT_KEY: &str = "#text";
const ATTRIBUTE_PREFIX: char = '@';

/// Configuration for the builder
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// Maximum nesting depth (0 means unlimited). Each mapping counts one
    /// level, as does each sequence placed directly inside another sequence.
    pub max_depth: u16,
}

impl Config {
    /// Create a new config with unlimited depth
    pub const fn unlimited() -> Self {
        Self { max_depth: 0 }
    }

    pub const fn new(max_depth: u16) -> Self {
        Self { max_depth }
    }
}

/// Namespace carried by a mapping
#[derive(Clone, Debug, PartialEq, Eq)]
enum NamespaceDecl {
    /// No `#ns` key: use the parent's
    Inherit,
    /// `#ns` present; `None` when it was null
    Declared(Option<String>),
}

impl NamespaceDecl {
    fn resolve(self, inherited: Option<&str>) -> Option<String> {
        match self {
            Self::Inherit => inherited.map(str::to_string),
            Self::Declared(namespace) => namespace,
        }
    }
}

/// A mapping split by key convention, in iteration order
#[derive(Debug)]
struct Layout {
    namespace: NamespaceDecl,
    text: Option<Scalar>,
    attributes: Vec<(String, Scalar)>,
    children: Vec<(String, Node)>,
}

impl Layout {
    fn from_mapping(mapping: Mapping) -> Result<Self> {
        let mut layout = Self {
            namespace: NamespaceDecl::Inherit,
            text: None,
            attributes: Vec::new(),
            children: Vec::with_capacity(mapping.len()),
        };

        for (key, value) in mapping {
            if key == NAMESPACE_KEY {
                layout.namespace = NamespaceDecl::Declared(namespace_uri(value)?);
            } else if key == TEXT_KEY {
                layout.text = Some(expect_scalar(&key, value)?);
            } else if let Some(name) = key.strip_prefix(ATTRIBUTE_PREFIX) {
                let value = expect_scalar(&key, value)?;
                layout.attributes.push((name.to_string(), value));
            } else {
                layout.children.push((key, value));
            }
        }

        Ok(layout)
    }
}

fn namespace_uri(value: Node) -> Result<Option<String>> {
    match value {
        Node::Scalar(Scalar::Null) => Ok(None),
        Node::Scalar(Scalar::String(uri)) => Ok(Some(uri)),
        other => Err(Error::new(ErrorKind::InvalidNamespace {
            found: other.kind_name().to_string(),
        })),
    }
}

fn expect_scalar(key: &str, value: Node) -> Result<Scalar> {
    match value {
        Node::Scalar(scalar) => Ok(scalar),
        other => Err(Error::new(ErrorKind::UnexpectedValue {
            key: key.to_string(),
            found: other.kind_name(),
        })),
    }
}

/// A pre-built element may only be attached under its own local name
fn ensure_name(element: &Element, expected: &str) -> Result<()> {
    let actual = element.local_name();
    if actual == expected {
        Ok(())
    } else {
        Err(Error::mismatched_name(expected, actual))
    }
}

/// Builds element trees from [`Node`] structures
#[derive(Clone, Copy, Debug, Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub const fn with_config(config: Config) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> Config {
        self.config
    }

    /// Build the element tree for `structure` with the tag `root`.
    ///
    /// Pre-built elements inside `structure` are moved into the result.
    #[instrument(level = "debug", skip(self, structure), fields(kind = structure.kind_name()))]
    pub fn build_element(&self, structure: Node, root: &str) -> Result<Element> {
        let mut produced = Vec::with_capacity(1);
        self.expand(&mut produced, root, structure, None, 0)?;

        let count = produced.len();
        match (produced.pop(), count) {
            (Some(element), 1) => {
                debug!(root, "built element tree");
                Ok(element)
            }
            _ => Err(Error::new(ErrorKind::InvalidRoot { count })),
        }
    }

    /// Build and serialize as UTF-8 text
    pub fn build(&self, structure: Node, root: &str) -> Result<String> {
        self.build_element(structure, root)?.to_xml_string()
    }

    /// Build and serialize with explicit output options
    pub fn build_bytes(
        &self,
        structure: Node,
        root: &str,
        options: &SerializeOptions,
    ) -> Result<Vec<u8>> {
        self.build_element(structure, root)?.to_bytes(options)
    }

    /// Value-kind dispatch: push the element(s) `value` produces under `name`
    fn expand<S: Extend<Element>>(
        &self,
        sink: &mut S,
        name: &str,
        value: Node,
        namespace: Option<&str>,
        depth: u16,
    ) -> Result<()> {
        match value {
            Node::Element(element) => {
                ensure_name(&element, name)?;
                trace!(
                    tag = name,
                    namespace = element.namespace(),
                    "adopting pre-built element"
                );
                sink.extend(Some(element));
            }
            Node::Mapping(mapping) => {
                let element = self.build_mapping(name, mapping, namespace, depth)?;
                sink.extend(Some(element));
            }
            Node::Sequence(items) => {
                for item in items {
                    let depth = match item {
                        Node::Sequence(_) => self.descend(depth)?,
                        _ => depth,
                    };
                    self.expand(sink, name, item, namespace, depth)?;
                }
            }
            Node::Scalar(scalar) => {
                let mut element = Element::new(QName::new(name, namespace)?);
                set_text(&mut element, &scalar)?;
                sink.extend(Some(element));
            }
        }
        Ok(())
    }

    fn descend(&self, depth: u16) -> Result<u16> {
        let depth = depth.saturating_add(1);
        if self.config.max_depth > 0 && depth > self.config.max_depth {
            return Err(Error::new(ErrorKind::MaxDepthExceeded {
                max: self.config.max_depth,
            }));
        }
        Ok(depth)
    }

    fn build_mapping(
        &self,
        name: &str,
        mapping: Mapping,
        inherited: Option<&str>,
        depth: u16,
    ) -> Result<Element> {
        let depth = self.descend(depth)?;
        let layout = Layout::from_mapping(mapping)?;
        if let NamespaceDecl::Declared(declared) = &layout.namespace {
            trace!(tag = name, namespace = declared.as_deref(), "namespace declared");
        }
        let namespace = layout.namespace.resolve(inherited);

        let mut element = Element::new(QName::new(name, namespace.as_deref())?);
        if let Some(text) = &layout.text {
            set_text(&mut element, text)?;
        }
        for (attr, value) in &layout.attributes {
            if let Some(text) = value.to_text() {
                element.set_attr(attr.as_str(), text)?;
            }
        }
        for (key, value) in layout.children {
            self.expand(&mut element, &key, value, namespace.as_deref(), depth)?;
        }

        Ok(element)
    }
}

fn set_text(element: &mut Element, value: &Scalar) -> Result<()> {
    match value.to_text() {
        Some(text) => element.set_text(text),
        None => Ok(()),
    }
}

/// Build `structure` into an element tree and serialize it as UTF-8 text
pub fn build(structure: impl Into<Node>, root: &str) -> Result<String> {
    Builder::new().build(structure.into(), root)
}

/// Build `structure` into an element tree without serializing it
pub fn build_element(structure: impl Into<Node>, root: &str) -> Result<Element> {
    Builder::new().build_element(structure.into(), root)
}

/// Build `structure` and serialize it with the given output options
pub fn build_with_options(
    structure: impl Into<Node>,
    root: &str,
    options: &SerializeOptions,
) -> Result<Vec<u8>> {
    Builder::new().build_bytes(structure.into(), root, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_partitions_keys() -> Result<()> {
        let mapping = Mapping::new()
            .with("alpha", 1)
            .with("@id", "x")
            .with("#text", "body")
            .with("#ns", "urn:n")
            .with("bravo", Node::null());

        let layout = Layout::from_mapping(mapping)?;
        assert_eq!(
            layout.namespace,
            NamespaceDecl::Declared(Some("urn:n".to_string()))
        );
        assert_eq!(layout.text, Some(Scalar::from("body")));
        assert_eq!(layout.attributes, vec![("id".to_string(), Scalar::from("x"))]);

        let children: Vec<_> = layout.children.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(children, vec!["alpha", "bravo"]);
        Ok(())
    }

    #[test]
    fn test_namespace_decl_tristate() -> Result<()> {
        let inherit = Layout::from_mapping(Mapping::new())?.namespace;
        assert_eq!(inherit.resolve(Some("urn:p")), Some("urn:p".to_string()));

        let cleared = Layout::from_mapping(Mapping::new().with("#ns", Node::null()))?.namespace;
        assert_eq!(cleared, NamespaceDecl::Declared(None));
        assert_eq!(cleared.resolve(Some("urn:p")), None);
        Ok(())
    }

    #[test]
    fn test_non_string_namespace_rejected() {
        let err = Layout::from_mapping(Mapping::new().with("#ns", 5)).err();
        assert_eq!(
            err.map(|e| e.kind().clone()),
            Some(ErrorKind::InvalidNamespace {
                found: "scalar".to_string()
            })
        );
    }

    #[test]
    fn test_structured_attribute_rejected() {
        let err = Layout::from_mapping(Mapping::new().with("@attr", vec![1, 2])).err();
        assert_eq!(
            err.map(|e| e.kind().clone()),
            Some(ErrorKind::UnexpectedValue {
                key: "@attr".to_string(),
                found: "sequence"
            })
        );
    }

    #[test]
    fn test_root_scalar_builds_leaf() -> Result<()> {
        let element = build_element("hello", "greeting")?;
        assert_eq!(element.local_name(), "greeting");
        assert_eq!(element.text(), Some("hello"));
        Ok(())
    }

    #[test]
    fn test_root_sequence_must_yield_one_element() -> Result<()> {
        let single = build_element(vec!["only"], DEFAULT_ROOT)?;
        assert_eq!(single.text(), Some("only"));

        let err = build_element(Vec::<Node>::new(), DEFAULT_ROOT).err();
        assert_eq!(
            err.map(|e| e.kind().clone()),
            Some(ErrorKind::InvalidRoot { count: 0 })
        );

        let err = build_element(vec![1, 2], DEFAULT_ROOT).err();
        assert_eq!(
            err.map(|e| e.kind().clone()),
            Some(ErrorKind::InvalidRoot { count: 2 })
        );
        Ok(())
    }

    #[test]
    fn test_max_depth() -> Result<()> {
        let nested = Mapping::new().with("a", Mapping::new().with("b", Mapping::new()));

        let shallow = Builder::with_config(Config::new(2));
        let err = shallow.build_element(nested.clone().into(), DEFAULT_ROOT).err();
        assert_eq!(
            err.map(|e| e.kind().clone()),
            Some(ErrorKind::MaxDepthExceeded { max: 2 })
        );

        let deep_enough = Builder::with_config(Config::new(3));
        let element = deep_enough.build_element(nested.clone().into(), DEFAULT_ROOT)?;
        assert_eq!(element.child_count(), 1);

        let unlimited = Builder::with_config(Config::unlimited());
        unlimited.build_element(nested.into(), DEFAULT_ROOT)?;
        Ok(())
    }

    #[test]
    fn test_max_depth_counts_nested_sequences() -> Result<()> {
        let nested = Mapping::new().with("x", vec![vec![vec![1]]]);

        let shallow = Builder::with_config(Config::new(2));
        let err = shallow.build_element(nested.clone().into(), DEFAULT_ROOT).err();
        assert_eq!(
            err.map(|e| e.kind().clone()),
            Some(ErrorKind::MaxDepthExceeded { max: 2 })
        );

        let element =
            Builder::with_config(Config::new(3)).build_element(nested.into(), DEFAULT_ROOT)?;
        assert_eq!(element.find("x").and_then(Element::text), Some("1"));

        // a flat sequence of mappings adds no level of its own
        let flat = Mapping::new().with("x", vec![Mapping::new(), Mapping::new()]);
        let element =
            Builder::with_config(Config::new(2)).build_element(flat.into(), DEFAULT_ROOT)?;
        assert_eq!(element.child_count(), 2);
        Ok(())
    }

    #[test]
    fn test_namespaced_attribute_keys() -> Result<()> {
        let structure = Mapping::new()
            .with("@xml:lang", "en")
            .with("@{http://www.w3.org/2001/XMLSchema-instance}nil", true);
        let element = build_element(structure, DEFAULT_ROOT)?;
        assert_eq!(element.attr("xml:lang"), Some("en"));
        assert_eq!(
            element.attr("{http://www.w3.org/2001/XMLSchema-instance}nil"),
            Some("true")
        );
        Ok(())
    }

    #[test]
    fn test_invalid_key_surfaces_tree_error() {
        let err = build("x", "not a name").err();
        assert_eq!(
            err.map(|e| e.kind().clone()),
            Some(ErrorKind::InvalidName {
                name: "not a name".to_string()
            })
        );
    }
}
