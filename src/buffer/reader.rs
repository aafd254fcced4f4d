//! `BufferValue`: a zero-copy handle into a finalized wire-format buffer.
//! Every accessor reads directly out of the shared byte allocation; none of
//! them allocate or copy the payload.

use crate::buffer::array::BufferArray;
use crate::buffer::object::BufferObject;
use crate::codec;
use crate::error::{Error, ParseFailure, TypeName};
use crate::owner::{Handle, Kind};
use crate::raw::RawType;

/// The logical type a [`RawType`] tag denotes, for error reporting.
pub(crate) fn type_name_of(raw: RawType) -> TypeName {
    match raw {
        RawType::Null => TypeName::Null,
        RawType::False | RawType::True => TypeName::Boolean,
        RawType::Int8 | RawType::Int16 | RawType::Int32 | RawType::Int64 => TypeName::Integer,
        RawType::Float32 | RawType::Float64 => TypeName::Decimal,
        RawType::StringSmall | RawType::StringLarge => TypeName::String,
        RawType::ObjectSmall | RawType::ObjectLarge => TypeName::Object,
        RawType::Array => TypeName::Array,
    }
}

/// A read-only view onto one value inside a finalized buffer: the shared
/// backing allocation plus this value's byte offset within it.
#[derive(Clone, Debug)]
pub struct BufferValue {
    pub(crate) root: Handle<Vec<u8>>,
    pub(crate) offset: usize,
}

impl BufferValue {
    /// Wraps an already-finalized byte buffer as the root value. Callers
    /// that received `bytes` from an untrusted source should run
    /// [`crate::validate::validate`] first.
    pub fn new_root(kind: Kind, bytes: Vec<u8>) -> Self {
        BufferValue { root: Handle::new(kind, bytes), offset: 0 }
    }

    pub(crate) fn at_offset(&self, offset: usize) -> BufferValue {
        BufferValue { root: self.root.clone(), offset }
    }

    /// The full backing allocation (not just this value's slice of it).
    pub(crate) fn bytes(&self) -> &[u8] {
        &self.root
    }

    fn raw_type(&self) -> Result<RawType, Error> {
        let tag = codec::read_u8(self.bytes(), self.offset).ok_or(Error::Parse(ParseFailure::TruncatedHeader))?;
        RawType::from_tag(tag)
    }

    /// The logical type of this value.
    pub fn type_name(&self) -> Result<TypeName, Error> {
        self.raw_type().map(type_name_of)
    }

    /// True if this value is [`TypeName::Null`].
    pub fn is_null(&self) -> Result<bool, Error> {
        Ok(matches!(self.raw_type()?, RawType::Null))
    }

    /// Reads this value as an object, failing with [`Error::Type`] otherwise.
    pub fn as_object(&self) -> Result<BufferObject, Error> {
        match self.raw_type()? {
            RawType::ObjectSmall | RawType::ObjectLarge => Ok(BufferObject { value: self.clone() }),
            other => Err(Error::type_error(TypeName::Object, type_name_of(other))),
        }
    }

    /// Reads this value as an array, failing with [`Error::Type`] otherwise.
    pub fn as_array(&self) -> Result<BufferArray, Error> {
        match self.raw_type()? {
            RawType::Array => Ok(BufferArray { value: self.clone() }),
            other => Err(Error::type_error(TypeName::Array, type_name_of(other))),
        }
    }

    /// Reads this value as a string slice, failing with [`Error::Type`] otherwise.
    pub fn as_str(&self) -> Result<&str, Error> {
        let bytes = self.bytes();
        match self.raw_type()? {
            RawType::StringSmall => {
                let len = codec::read_u8(bytes, self.offset + 1).ok_or(Error::Parse(ParseFailure::LengthOutOfBounds))? as usize;
                let slice = bytes
                    .get(self.offset + 2..self.offset + 2 + len)
                    .ok_or(Error::Parse(ParseFailure::LengthOutOfBounds))?;
                std::str::from_utf8(slice).map_err(|_| Error::Parse(ParseFailure::MalformedKey))
            }
            RawType::StringLarge => {
                let len = codec::read_u32(bytes, self.offset + 1).ok_or(Error::Parse(ParseFailure::LengthOutOfBounds))? as usize;
                let slice = bytes
                    .get(self.offset + 5..self.offset + 5 + len)
                    .ok_or(Error::Parse(ParseFailure::LengthOutOfBounds))?;
                std::str::from_utf8(slice).map_err(|_| Error::Parse(ParseFailure::MalformedKey))
            }
            other => Err(Error::type_error(TypeName::String, type_name_of(other))),
        }
    }

    /// Reads this value as a 64-bit integer (sign-extending narrower widths),
    /// failing with [`Error::Type`] otherwise.
    pub fn as_i64(&self) -> Result<i64, Error> {
        let bytes = self.bytes();
        let body = self.offset + 1;
        match self.raw_type()? {
            RawType::Int8 => Ok(codec::read_u8(bytes, body).ok_or(Error::Parse(ParseFailure::LengthOutOfBounds))? as i8 as i64),
            RawType::Int16 => Ok(codec::read_i16(bytes, body).ok_or(Error::Parse(ParseFailure::LengthOutOfBounds))? as i64),
            RawType::Int32 => Ok(codec::read_i32(bytes, body).ok_or(Error::Parse(ParseFailure::LengthOutOfBounds))? as i64),
            RawType::Int64 => codec::read_i64(bytes, body).ok_or(Error::Parse(ParseFailure::LengthOutOfBounds)),
            other => Err(Error::type_error(TypeName::Integer, type_name_of(other))),
        }
    }

    /// Reads this value as a 64-bit float (widening `Float32` losslessly),
    /// failing with [`Error::Type`] otherwise.
    pub fn as_f64(&self) -> Result<f64, Error> {
        let bytes = self.bytes();
        let body = self.offset + 1;
        match self.raw_type()? {
            RawType::Float32 => Ok(codec::read_f32(bytes, body).ok_or(Error::Parse(ParseFailure::LengthOutOfBounds))? as f64),
            RawType::Float64 => codec::read_f64(bytes, body).ok_or(Error::Parse(ParseFailure::LengthOutOfBounds)),
            other => Err(Error::type_error(TypeName::Decimal, type_name_of(other))),
        }
    }

    /// Reads this value as a boolean, failing with [`Error::Type`] otherwise.
    pub fn as_bool(&self) -> Result<bool, Error> {
        match self.raw_type()? {
            RawType::True => Ok(true),
            RawType::False => Ok(false),
            other => Err(Error::type_error(TypeName::Boolean, type_name_of(other))),
        }
    }
}

impl PartialEq for BufferValue {
    fn eq(&self, other: &Self) -> bool {
        fn structural_eq(a: &BufferValue, b: &BufferValue) -> bool {
            let (ta, tb) = match (a.type_name(), b.type_name()) {
                (Ok(ta), Ok(tb)) => (ta, tb),
                _ => return false,
            };
            if ta != tb {
                return false;
            }
            match ta {
                TypeName::Null => true,
                TypeName::Boolean => a.as_bool() == b.as_bool(),
                TypeName::Integer => a.as_i64() == b.as_i64(),
                TypeName::Decimal => a.as_f64() == b.as_f64(),
                TypeName::String => a.as_str() == b.as_str(),
                TypeName::Array => {
                    let (aa, ab) = (a.as_array().unwrap(), b.as_array().unwrap());
                    aa.size() == ab.size()
                        && aa
                            .values()
                            .zip(ab.values())
                            .all(|(x, y)| x.map(|x| y.map(|y| structural_eq(&x, &y)).unwrap_or(false)).unwrap_or(false))
                }
                TypeName::Object => {
                    let (ao, bo) = (a.as_object().unwrap(), b.as_object().unwrap());
                    ao.size() == bo.size()
                        && ao.entries().zip(bo.entries()).all(|(x, y)| match (x, y) {
                            (Ok((k1, v1)), Ok((k2, v2))) => k1 == k2 && structural_eq(&v1, &v2),
                            _ => false,
                        })
                }
            }
        }
        structural_eq(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finalize::finalize;
    use crate::heap::{Node, Object};

    #[test]
    fn scalar_values_read_back_through_the_wire() {
        let mut obj = Object::new(Kind::Local);
        obj.insert("n", Node::integer(-7)).unwrap();
        obj.insert("f", Node::decimal(2.5)).unwrap();
        obj.insert("s", Node::string("hi")).unwrap();
        obj.insert("b", Node::boolean(true)).unwrap();
        obj.insert("z", Node::null()).unwrap();
        let bytes = finalize(&Node::Object(obj));

        let root = BufferValue::new_root(Kind::Local, bytes);
        let buffer_obj = root.as_object().unwrap();
        assert_eq!(buffer_obj.get("n").unwrap().unwrap().as_i64().unwrap(), -7);
        assert_eq!(buffer_obj.get("f").unwrap().unwrap().as_f64().unwrap(), 2.5);
        assert_eq!(buffer_obj.get("s").unwrap().unwrap().as_str().unwrap(), "hi");
        assert!(buffer_obj.get("b").unwrap().unwrap().as_bool().unwrap());
        assert!(buffer_obj.get("z").unwrap().unwrap().is_null().unwrap());
        assert!(buffer_obj.get("missing").unwrap().is_none());
    }

    #[test]
    fn type_mismatch_reads_report_both_sides() {
        let bytes = finalize(&Node::integer(3));
        let root = BufferValue::new_root(Kind::Local, bytes);
        let err = root.as_str().unwrap_err();
        assert_eq!(err, Error::type_error(TypeName::String, TypeName::Integer));
    }
}
