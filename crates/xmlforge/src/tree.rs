//! Element tree: qualified names, elements and their serialization

pub mod element;
pub mod name;
pub mod serialize;

pub use element::{Element, QName, XML_NAMESPACE};
pub use serialize::SerializeOptions;
