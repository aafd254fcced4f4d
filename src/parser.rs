//! The producer interface: the event surface an external parser (JSON,
//! YAML, whatever — out of scope here) drives to build a mutable tree. Keys
//! need not arrive sorted; [`crate::heap::Object`] keeps them sorted
//! regardless.

use crate::error::Error;
use crate::heap::{Array, Node, Object};
use crate::owner::Kind;

/// The event sink a parser adapter drives. Implemented here by
/// [`TreeBuilder`]; an external parser only needs to call these methods in
/// a well-formed sequence (every `start_*` matched by an `end_*`, every
/// value preceded by a `key` when inside an object).
pub trait EventSink {
    /// Begins an object. Must be matched by [`EventSink::end_object`].
    fn start_object(&mut self);
    /// Ends the innermost open object.
    fn end_object(&mut self) -> Result<(), Error>;
    /// Supplies the key for the next value inside the innermost open object.
    fn key(&mut self, bytes: &[u8]) -> Result<(), Error>;
    /// Begins an array. Must be matched by [`EventSink::end_array`].
    fn start_array(&mut self);
    /// Ends the innermost open array.
    fn end_array(&mut self) -> Result<(), Error>;
    /// Emits a `null` value.
    fn value_null(&mut self) -> Result<(), Error>;
    /// Emits a boolean value.
    fn value_bool(&mut self, value: bool) -> Result<(), Error>;
    /// Emits an integer value.
    fn value_integer(&mut self, value: i64) -> Result<(), Error>;
    /// Emits a decimal value.
    fn value_decimal(&mut self, value: f64) -> Result<(), Error>;
    /// Emits a string value from raw (expected UTF-8) bytes.
    fn value_string(&mut self, bytes: &[u8]) -> Result<(), Error>;
}

enum Frame {
    Object { object: Object, pending_key: Option<Box<str>> },
    Array { array: Array },
}

/// Builds a [`Node`] tree by replaying a well-formed [`EventSink`] call
/// sequence, the way an external parser would drive it while walking its
/// own input.
pub struct TreeBuilder {
    kind: Kind,
    stack: Vec<Frame>,
    root: Option<Node>,
}

impl TreeBuilder {
    /// Creates an empty builder that allocates shared handles with `kind`.
    pub fn new(kind: Kind) -> Self {
        TreeBuilder { kind, stack: Vec::new(), root: None }
    }

    fn push_value(&mut self, value: Node) -> Result<(), Error> {
        match self.stack.last_mut() {
            Some(Frame::Array { array }) => {
                array.push_back(value);
                Ok(())
            }
            Some(Frame::Object { object, pending_key }) => {
                let key = pending_key.take().ok_or(Error::State("value produced without a preceding key inside an object"))?;
                object.insert(&key, value)
            }
            None => {
                if self.root.is_some() {
                    return Err(Error::State("a second root value was produced"));
                }
                self.root = Some(value);
                Ok(())
            }
        }
    }

    /// Consumes the builder, returning the completed tree. Errors if any
    /// `start_object`/`start_array` was never closed, or no value was ever produced.
    pub fn finish(mut self) -> Result<Node, Error> {
        if !self.stack.is_empty() {
            return Err(Error::State("finish() called with an unclosed object or array"));
        }
        self.root.take().ok_or(Error::State("finish() called before any value was produced"))
    }
}

impl EventSink for TreeBuilder {
    fn start_object(&mut self) {
        self.stack.push(Frame::Object { object: Object::new(self.kind), pending_key: None });
    }

    fn end_object(&mut self) -> Result<(), Error> {
        match self.stack.pop() {
            Some(Frame::Object { object, pending_key: None }) => self.push_value(Node::Object(object)),
            Some(Frame::Object { pending_key: Some(_), .. }) => Err(Error::State("object ended with a key but no matching value")),
            Some(other) => {
                self.stack.push(other);
                Err(Error::State("end_object does not match the innermost open container"))
            }
            None => Err(Error::State("end_object with nothing open")),
        }
    }

    fn key(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let key = std::str::from_utf8(bytes).map_err(|_| Error::Runtime("key bytes are not valid UTF-8"))?;
        match self.stack.last_mut() {
            Some(Frame::Object { pending_key, .. }) => {
                *pending_key = Some(key.into());
                Ok(())
            }
            _ => Err(Error::State("key() outside of an open object")),
        }
    }

    fn start_array(&mut self) {
        self.stack.push(Frame::Array { array: Array::new(self.kind) });
    }

    fn end_array(&mut self) -> Result<(), Error> {
        match self.stack.pop() {
            Some(Frame::Array { array }) => self.push_value(Node::Array(array)),
            Some(other) => {
                self.stack.push(other);
                Err(Error::State("end_array does not match the innermost open container"))
            }
            None => Err(Error::State("end_array with nothing open")),
        }
    }

    fn value_null(&mut self) -> Result<(), Error> {
        self.push_value(Node::null())
    }

    fn value_bool(&mut self, value: bool) -> Result<(), Error> {
        self.push_value(Node::boolean(value))
    }

    fn value_integer(&mut self, value: i64) -> Result<(), Error> {
        self.push_value(Node::integer(value))
    }

    fn value_decimal(&mut self, value: f64) -> Result<(), Error> {
        self.push_value(Node::decimal(value))
    }

    fn value_string(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let s = std::str::from_utf8(bytes).map_err(|_| Error::Runtime("string bytes are not valid UTF-8"))?;
        self.push_value(Node::string_with_kind(self.kind, s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_objects_and_arrays_with_unsorted_key_arrival() {
        let mut builder = TreeBuilder::new(Kind::Local);
        builder.start_object();
        builder.key(b"c").unwrap();
        builder.value_integer(3).unwrap();
        builder.key(b"a").unwrap();
        builder.value_integer(1).unwrap();
        builder.key(b"b").unwrap();
        builder.start_array();
        builder.value_string(b"x").unwrap();
        builder.value_null().unwrap();
        builder.end_array().unwrap();
        builder.end_object().unwrap();
        let tree = builder.finish().unwrap();

        let object = tree.as_object().unwrap();
        assert_eq!(object.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(object.at("a").unwrap().as_i64().unwrap(), 1);
        let array = object.at("b").unwrap().as_array().unwrap();
        assert_eq!(array.size(), 2);
    }

    #[test]
    fn mismatched_end_object_is_rejected() {
        let mut builder = TreeBuilder::new(Kind::Local);
        builder.start_array();
        assert!(builder.end_object().is_err());
    }

    #[test]
    fn value_without_a_key_inside_an_object_is_rejected() {
        let mut builder = TreeBuilder::new(Kind::Local);
        builder.start_object();
        assert!(builder.value_integer(1).is_err());
    }

    #[test]
    fn finish_before_closing_every_container_is_rejected() {
        let mut builder = TreeBuilder::new(Kind::Local);
        builder.start_object();
        assert!(builder.finish().is_err());
    }
}
