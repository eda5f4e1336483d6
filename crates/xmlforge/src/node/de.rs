//! Converting host data into [`Node`] through serde
//!
//! Any self-describing format can feed the builder this way; map entries are
//! kept in the order the deserializer visits them.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

use super::{Mapping, Node, Scalar};
use crate::error::Result;

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping, sequence or scalar")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Node, E> {
        Ok(Node::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Node, E> {
        Ok(Node::from(v))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> std::result::Result<Node, E> {
        Ok(Node::Scalar(Scalar::Integer(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Node, E> {
        Ok(Node::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Node, E> {
        Ok(Node::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Node, E> {
        Ok(Node::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Node, E> {
        Ok(Node::from(v))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Node, E> {
        Ok(Node::null())
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Node, E> {
        Ok(Node::null())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<Node, D::Error> {
        Node::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Node, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Node::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Node, A::Error> {
        let mut mapping = Mapping::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Node>()? {
            mapping.insert(key, value);
        }
        Ok(Node::Mapping(mapping))
    }
}

/// Parse JSON text into a [`Node`]
pub fn from_json_str(s: &str) -> Result<Node> {
    Ok(serde_json::from_str(s)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_scalars() -> Result<()> {
        assert_eq!(from_json_str("null")?, Node::null());
        assert_eq!(from_json_str("true")?, Node::from(true));
        assert_eq!(from_json_str("-3")?, Node::from(-3i64));
        assert_eq!(from_json_str("18446744073709551615")?, Node::from(u64::MAX));
        assert_eq!(from_json_str("1.5")?, Node::from(1.5));
        assert_eq!(from_json_str("\"hi\"")?, Node::from("hi"));
        Ok(())
    }

    #[test]
    fn test_json_mapping_keeps_document_order() -> Result<()> {
        let node = from_json_str(r#"{"zulu": 1, "alpha": [true, null], "mike": {}}"#)?;
        let mapping = node.as_mapping().cloned().unwrap_or_default();

        let keys: Vec<_> = mapping.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zulu", "alpha", "mike"]);
        assert_eq!(
            mapping.get("alpha"),
            Some(&Node::Sequence(vec![Node::from(true), Node::null()]))
        );
        assert_eq!(mapping.get("mike"), Some(&Node::from(Mapping::new())));
        Ok(())
    }

    #[test]
    fn test_invalid_json() {
        let err = from_json_str("{not json").err();
        assert_eq!(
            err.map(|e| e.kind().clone()),
            Some(crate::ErrorKind::Json)
        );
    }
}
