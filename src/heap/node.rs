//! `Node`: the mutable tree's value type.

use crate::error::{Error, TypeName};
use crate::heap::array::Array;
use crate::heap::object::Object;
use crate::heap::string::NodeString;
use crate::owner::Kind;

/// A value in the mutable tree. Aggregates (`Object`, `Array`) hold a
/// copy-on-write [`crate::owner::Handle`]; primitives are inline.
#[derive(Clone, Debug)]
pub enum Node {
    /// The null value.
    Null,
    /// `true` or `false`.
    Boolean(bool),
    /// A signed 64-bit logical integer. Narrowed to the smallest sufficient
    /// width only at finalization time.
    Integer(i64),
    /// A 64-bit logical float. Narrowed to 32-bit at finalization time if lossless.
    Decimal(f64),
    /// A UTF-8 string, inline or out of line depending on length.
    String(NodeString),
    /// An ordered sequence of children.
    Array(Array),
    /// A sorted `key -> Node` mapping.
    Object(Object),
}

impl Node {
    /// The null value.
    pub fn null() -> Self {
        Node::Null
    }

    /// A boolean value.
    pub fn boolean(value: bool) -> Self {
        Node::Boolean(value)
    }

    /// An integer value.
    pub fn integer(value: i64) -> Self {
        Node::Integer(value)
    }

    /// A decimal (floating point) value.
    pub fn decimal(value: f64) -> Self {
        Node::Decimal(value)
    }

    /// A string value, built with [`Kind::Local`] storage.
    pub fn string(value: &str) -> Self {
        Node::String(NodeString::new(Kind::Local, value))
    }

    /// A string value, built with an explicit ownership kind.
    pub fn string_with_kind(kind: Kind, value: &str) -> Self {
        Node::String(NodeString::new(kind, value))
    }

    /// An empty object using the given ownership kind.
    pub fn object(kind: Kind) -> Self {
        Node::Object(Object::new(kind))
    }

    /// An empty array using the given ownership kind.
    pub fn array(kind: Kind) -> Self {
        Node::Array(Array::new(kind))
    }

    /// The logical type tag, for error messages and dispatch.
    pub fn type_name(&self) -> TypeName {
        match self {
            Node::Null => TypeName::Null,
            Node::Boolean(_) => TypeName::Boolean,
            Node::Integer(_) => TypeName::Integer,
            Node::Decimal(_) => TypeName::Decimal,
            Node::String(_) => TypeName::String,
            Node::Array(_) => TypeName::Array,
            Node::Object(_) => TypeName::Object,
        }
    }

    /// Borrows this node as an [`Object`], failing with `Error::Type` otherwise.
    pub fn as_object(&self) -> Result<&Object, Error> {
        match self {
            Node::Object(o) => Ok(o),
            other => Err(Error::type_error(TypeName::Object, other.type_name())),
        }
    }

    /// Mutably borrows this node as an [`Object`], failing with `Error::Type` otherwise.
    pub fn as_object_mut(&mut self) -> Result<&mut Object, Error> {
        let found = self.type_name();
        match self {
            Node::Object(o) => Ok(o),
            _ => Err(Error::type_error(TypeName::Object, found)),
        }
    }

    /// Borrows this node as an [`Array`], failing with `Error::Type` otherwise.
    pub fn as_array(&self) -> Result<&Array, Error> {
        match self {
            Node::Array(a) => Ok(a),
            other => Err(Error::type_error(TypeName::Array, other.type_name())),
        }
    }

    /// Mutably borrows this node as an [`Array`], failing with `Error::Type` otherwise.
    pub fn as_array_mut(&mut self) -> Result<&mut Array, Error> {
        let found = self.type_name();
        match self {
            Node::Array(a) => Ok(a),
            _ => Err(Error::type_error(TypeName::Array, found)),
        }
    }

    /// Reads the string contents, failing with `Error::Type` otherwise.
    pub fn as_str(&self) -> Result<&str, Error> {
        match self {
            Node::String(s) => Ok(s.as_str()),
            other => Err(Error::type_error(TypeName::String, other.type_name())),
        }
    }

    /// Reads the integer value, failing with `Error::Type` otherwise.
    pub fn as_i64(&self) -> Result<i64, Error> {
        match self {
            Node::Integer(v) => Ok(*v),
            other => Err(Error::type_error(TypeName::Integer, other.type_name())),
        }
    }

    /// Reads the decimal value, failing with `Error::Type` otherwise.
    pub fn as_f64(&self) -> Result<f64, Error> {
        match self {
            Node::Decimal(v) => Ok(*v),
            other => Err(Error::type_error(TypeName::Decimal, other.type_name())),
        }
    }

    /// Reads the boolean value, failing with `Error::Type` otherwise.
    pub fn as_bool(&self) -> Result<bool, Error> {
        match self {
            Node::Boolean(v) => Ok(*v),
            other => Err(Error::type_error(TypeName::Boolean, other.type_name())),
        }
    }

    /// Reads the integer value or `default` if this node is not an integer.
    pub fn i64_or(&self, default: i64) -> i64 {
        self.as_i64().unwrap_or(default)
    }

    /// Reads the string contents or `default` if this node is not a string.
    pub fn str_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.as_str().unwrap_or(default)
    }

    /// True if this is [`Node::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Null, Node::Null) => true,
            (Node::Boolean(a), Node::Boolean(b)) => a == b,
            (Node::Integer(a), Node::Integer(b)) => a == b,
            (Node::Decimal(a), Node::Decimal(b)) => a == b,
            (Node::String(a), Node::String(b)) => a == b,
            (Node::Array(a), Node::Array(b)) => a == b,
            (Node::Object(a), Node::Object(b)) => a == b,
            _ => false,
        }
    }
}

#[test]
fn type_mismatch_accessors_report_both_sides() {
    let n = Node::integer(5);
    let err = n.as_str().unwrap_err();
    assert_eq!(err, Error::type_error(TypeName::String, TypeName::Integer));
}

#[test]
fn or_default_accessors_never_error() {
    let n = Node::string("hi");
    assert_eq!(n.i64_or(-1), -1);
    assert_eq!(n.str_or("fallback"), "hi");
}

#[test]
fn equality_is_reflexive_symmetric_and_transitive_on_a_sample() {
    let a = Node::integer(7);
    let b = Node::integer(7);
    let c = Node::integer(7);
    assert_eq!(a, a);
    assert_eq!(a, b);
    assert_eq!(b, a);
    assert_eq!(b, c);
    assert_eq!(a, c);
    assert_ne!(a, Node::integer(8));
}
