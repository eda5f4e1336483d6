//! xmlforge - build XML element trees from nested structures
//!
//! Mappings become elements, sequences become repeated siblings, scalars
//! become text. Reserved keys steer the result: `@name` for attributes,
//! `#text` for text content and `#ns` for the namespace, which children
//! inherit unless they declare their own.
//!
//! # Quick Start
//!
//! ```
//! use xmlforge::{build, Mapping, Node};
//! # fn main() -> Result<(), xmlforge::Error> {
//! let structure = Mapping::new()
//!     .with("@id", 7)
//!     .with("name", "widget")
//!     .with("tag", vec!["a", "b"])
//!     .with("note", Node::null());
//!
//! let xml = build(structure, "item")?;
//! assert_eq!(
//!     xml,
//!     r#"<item id="7"><name>widget</name><tag>a</tag><tag>b</tag><note/></item>"#
//! );
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Result};

pub mod node;
#[cfg(feature = "serde")]
pub use node::from_json_str;
pub use node::{Mapping, Node, Scalar};

pub mod tree;
pub use tree::{Element, QName, SerializeOptions, XML_NAMESPACE};

pub mod build;
pub use build::{build, build_element, build_with_options, Builder, Config, DEFAULT_ROOT};
