//! The dynamic packet wrapper: a tagged value over the mutable tree and the
//! immutable buffer that forwards read operations uniformly and restricts
//! mutation to the mutable variant.

use crate::buffer::BufferValue;
use crate::definalize::definalize;
use crate::error::{Error, TypeName};
use crate::finalize::finalize;
use crate::heap::Node;
use crate::owner::Kind;

/// A value that may be backed by a mutable tree or an immutable, finalized
/// buffer. Read operations dispatch on the tag; mutation is only legal on
/// [`Packet::Heap`] and fails with [`Error::State`] on [`Packet::Buffer`].
pub enum Packet {
    /// Backed by a mutable [`Node`] tree.
    Heap(Node),
    /// Backed by an immutable, finalized buffer.
    Buffer(BufferValue),
}

impl Packet {
    /// Wraps an existing mutable tree.
    pub fn from_node(node: Node) -> Self {
        Packet::Heap(node)
    }

    /// Wraps an existing finalized buffer.
    pub fn from_buffer(value: BufferValue) -> Self {
        Packet::Buffer(value)
    }

    /// The logical type of the wrapped value, regardless of which state it's in.
    pub fn type_name(&self) -> Result<TypeName, Error> {
        match self {
            Packet::Heap(node) => Ok(node.type_name()),
            Packet::Buffer(value) => value.type_name(),
        }
    }

    /// True if the wrapped value is null.
    pub fn is_null(&self) -> Result<bool, Error> {
        match self {
            Packet::Heap(node) => Ok(node.is_null()),
            Packet::Buffer(value) => value.is_null(),
        }
    }

    /// True if this packet currently holds the mutable representation.
    pub fn is_heap(&self) -> bool {
        matches!(self, Packet::Heap(_))
    }

    /// Reads the string contents, failing with `Error::Type` otherwise.
    pub fn as_str(&self) -> Result<&str, Error> {
        match self {
            Packet::Heap(node) => node.as_str(),
            Packet::Buffer(value) => value.as_str(),
        }
    }

    /// Reads the integer value, failing with `Error::Type` otherwise.
    pub fn as_i64(&self) -> Result<i64, Error> {
        match self {
            Packet::Heap(node) => node.as_i64(),
            Packet::Buffer(value) => value.as_i64(),
        }
    }

    /// Reads the decimal value, failing with `Error::Type` otherwise.
    pub fn as_f64(&self) -> Result<f64, Error> {
        match self {
            Packet::Heap(node) => node.as_f64(),
            Packet::Buffer(value) => value.as_f64(),
        }
    }

    /// Reads the boolean value, failing with `Error::Type` otherwise.
    pub fn as_bool(&self) -> Result<bool, Error> {
        match self {
            Packet::Heap(node) => node.as_bool(),
            Packet::Buffer(value) => value.as_bool(),
        }
    }

    /// Number of entries (object) or elements (array).
    pub fn size(&self) -> Result<usize, Error> {
        match self {
            Packet::Heap(Node::Object(o)) => Ok(o.size()),
            Packet::Heap(Node::Array(a)) => Ok(a.size()),
            Packet::Heap(other) => Err(Error::type_error(TypeName::Object, other.type_name())),
            Packet::Buffer(value) => match value.type_name()? {
                TypeName::Object => Ok(value.as_object()?.size()),
                TypeName::Array => Ok(value.as_array()?.size()),
                other => Err(Error::type_error(TypeName::Object, other)),
            },
        }
    }

    /// Whether `key` is present, for an object-typed packet.
    pub fn has_key(&self, key: &str) -> Result<bool, Error> {
        match self {
            Packet::Heap(node) => Ok(node.as_object()?.has_key(key)),
            Packet::Buffer(value) => value.as_object()?.has_key(key),
        }
    }

    /// Looks up `key` on an object-typed packet. `Ok(None)` if absent.
    pub fn get(&self, key: &str) -> Result<Option<Packet>, Error> {
        match self {
            Packet::Heap(node) => Ok(node.as_object()?.get(key).cloned().map(Packet::Heap)),
            Packet::Buffer(value) => Ok(value.as_object()?.get(key)?.map(Packet::Buffer)),
        }
    }

    /// Indexes into an array-typed packet. Strict: errors if out of range.
    pub fn at_index(&self, index: usize) -> Result<Packet, Error> {
        match self {
            Packet::Heap(node) => Ok(Packet::Heap(node.as_array()?.at(index)?.clone())),
            Packet::Buffer(value) => Ok(Packet::Buffer(value.as_array()?.at(index)?)),
        }
    }

    /// Upserts `key` on an object-typed packet. Fails with [`Error::State`]
    /// unless this packet is currently [`Packet::Heap`].
    pub fn set(&mut self, key: &str, value: Node) -> Result<(), Error> {
        match self {
            Packet::Heap(node) => {
                node.as_object_mut()?.set(key, value);
                Ok(())
            }
            Packet::Buffer(_) => Err(Error::State("mutation is not permitted on an immutable buffer")),
        }
    }

    /// Inserts `key` on an object-typed packet, failing on a duplicate key.
    /// Fails with [`Error::State`] unless this packet is currently [`Packet::Heap`].
    pub fn insert(&mut self, key: &str, value: Node) -> Result<(), Error> {
        match self {
            Packet::Heap(node) => node.as_object_mut()?.insert(key, value),
            Packet::Buffer(_) => Err(Error::State("mutation is not permitted on an immutable buffer")),
        }
    }

    /// Lowers a [`Packet::Heap`] value to its finalized bytes without
    /// changing this packet's own state. Fails with [`Error::State`] if this
    /// packet is already a buffer.
    pub fn finalize_bytes(&self) -> Result<Vec<u8>, Error> {
        match self {
            Packet::Heap(node) => Ok(finalize(node)),
            Packet::Buffer(_) => Err(Error::State("value is already finalized")),
        }
    }

    /// Transitions this packet from `Heap` to `Buffer` in place. A no-op if
    /// it is already a buffer.
    pub fn finalize(&mut self, kind: Kind) {
        if let Packet::Heap(node) = self {
            let bytes = finalize(node);
            *self = Packet::Buffer(BufferValue::new_root(kind, bytes));
        }
    }

    /// Transitions this packet from `Buffer` to `Heap` in place, rebuilding
    /// the mutable tree via [`definalize`]. A no-op if it is already a heap value.
    pub fn definalize(&mut self, kind: Kind) -> Result<(), Error> {
        if let Packet::Buffer(value) = self {
            let node = definalize(value, kind)?;
            *self = Packet::Heap(node);
        }
        Ok(())
    }
}

impl PartialEq for Packet {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Packet::Heap(a), Packet::Heap(b)) => a == b,
            (Packet::Buffer(a), Packet::Buffer(b)) => a == b,
            (Packet::Heap(a), Packet::Buffer(b)) | (Packet::Buffer(b), Packet::Heap(a)) => {
                // `Kind` never affects equality, so any kind works for the
                // throwaway tree built just to compare against `a`.
                definalize(b, Kind::default()).map(|rebuilt| &rebuilt == a).unwrap_or(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::Object;

    fn sample_heap() -> Packet {
        let mut obj = Object::new(Kind::Local);
        obj.insert("k", Node::string("v")).unwrap();
        Packet::Heap(Node::Object(obj))
    }

    #[test]
    fn mutation_on_a_buffer_packet_fails_with_state_error() {
        let mut packet = sample_heap();
        packet.finalize(Kind::Local);
        assert!(!packet.is_heap());
        assert_eq!(packet.set("k", Node::string("w")), Err(Error::State("mutation is not permitted on an immutable buffer")));
    }

    #[test]
    fn finalize_then_get_matches_the_original_value() {
        let mut packet = sample_heap();
        packet.finalize(Kind::Local);
        let value = packet.get("k").unwrap().unwrap();
        assert_eq!(value.as_str().unwrap(), "v");
    }

    #[test]
    fn definalize_restores_mutability() {
        let mut packet = sample_heap();
        packet.finalize(Kind::Local);
        packet.definalize(Kind::Local).unwrap();
        assert!(packet.is_heap());
        packet.set("k", Node::string("w")).unwrap();
        assert_eq!(packet.get("k").unwrap().unwrap().as_str().unwrap(), "w");
    }
}
