//! The inverse of [`crate::finalize::finalize`]: reconstructs a mutable
//! [`Node`] tree from a finalized buffer by recursive traversal, one
//! [`Node`] per reachable wire entry.

use crate::buffer::BufferValue;
use crate::error::{Error, TypeName};
use crate::heap::{Array, Node, Object};
use crate::owner::Kind;

/// Reconstructs a mutable tree from `value`, using `kind` for every
/// allocated handle in the rebuilt tree.
pub fn definalize(value: &BufferValue, kind: Kind) -> Result<Node, Error> {
    match value.type_name()? {
        TypeName::Null => Ok(Node::null()),
        TypeName::Boolean => Ok(Node::boolean(value.as_bool()?)),
        TypeName::Integer => Ok(Node::integer(value.as_i64()?)),
        TypeName::Decimal => Ok(Node::decimal(value.as_f64()?)),
        TypeName::String => Ok(Node::string_with_kind(kind, value.as_str()?)),
        TypeName::Array => {
            let buffer_array = value.as_array()?;
            let mut array = Array::new(kind);
            array.reserve(buffer_array.size());
            for item in buffer_array.values() {
                array.push_back(definalize(&item?, kind)?);
            }
            Ok(Node::Array(array))
        }
        TypeName::Object => {
            let buffer_object = value.as_object()?;
            let mut object = Object::new(kind);
            for entry in buffer_object.entries() {
                let (key, child) = entry?;
                // The buffer's vtable is already sorted, so insertion order here
                // never collides with the sorted-key invariant `insert` enforces.
                object.insert(key, definalize(&child, kind)?)?;
            }
            Ok(Node::Object(object))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finalize::finalize;

    #[test]
    fn round_trips_a_mixed_tree() {
        let mut inner = Object::new(Kind::Local);
        inner.insert("a", Node::integer(1)).unwrap();
        inner.insert("b", Node::boolean(true)).unwrap();

        let mut array = Array::new(Kind::Local);
        array.push_back(Node::string("x"));
        array.push_back(Node::Object(inner));
        array.push_back(Node::null());

        let mut root = Object::new(Kind::Local);
        root.insert("items", Node::Array(array)).unwrap();
        let original = Node::Object(root);

        let bytes = finalize(&original);
        let buffer = BufferValue::new_root(Kind::Local, bytes);
        let rebuilt = definalize(&buffer, Kind::Local).unwrap();

        assert_eq!(original, rebuilt);
    }

    #[test]
    fn finalizing_a_definalized_tree_reproduces_the_same_bytes() {
        let mut obj = Object::new(Kind::Local);
        obj.insert("k", Node::string("v")).unwrap();
        obj.insert("n", Node::integer(99)).unwrap();
        let original_bytes = finalize(&Node::Object(obj));

        let buffer = BufferValue::new_root(Kind::Local, original_bytes.clone());
        let rebuilt = definalize(&buffer, Kind::Shared).unwrap();
        let roundtrip_bytes = finalize(&rebuilt);

        assert_eq!(original_bytes, roundtrip_bytes);
    }
}
