//! Validates an untrusted byte slice before a receiver treats it as a
//! finalized buffer. Four checks, each named directly:
//!
//! 1. the root header's declared length agrees with the supplied slice;
//! 2. every child offset points within its parent's extent;
//! 3. every key offset resolves to a length-prefixed key within the
//!    object's extent;
//! 4. keys as found in the payload are strictly ascending.
//!
//! `validate(bytes).is_ok()` is the precondition [`crate::buffer::BufferValue::new_root`]
//! assumes but does not itself check — reading bytes that haven't passed
//! validation is the caller's risk, not this crate's.

use crate::codec;
use crate::error::{Error, ParseFailure};
use crate::raw::{
    ArrayEntry, ObjectEntry, RawType, LARGE_HEADER_WIDTH, OBJECT_SMALL_HEADER_WIDTH, VTABLE_ENTRY_WIDTH,
};

/// Validates that `bytes` is a well-formed finalized buffer, recursively
/// checking every reachable value and returning an error describing the
/// first violation found. On success, traversing the buffer via
/// [`crate::buffer`] is guaranteed to never read outside `bytes`.
pub fn validate(bytes: &[u8]) -> Result<(), Error> {
    let consumed = validate_value(bytes, 0)?;
    if consumed != bytes.len() {
        return Err(Error::Parse(ParseFailure::LengthOutOfBounds));
    }
    Ok(())
}

/// Validates the value starting at `offset`, returning its total encoded extent.
fn validate_value(bytes: &[u8], offset: usize) -> Result<usize, Error> {
    let tag = codec::read_u8(bytes, offset).ok_or(Error::Parse(ParseFailure::TruncatedHeader))?;
    match RawType::from_tag(tag)? {
        RawType::Null | RawType::False | RawType::True => Ok(1),
        RawType::Int8 => bounded(bytes, offset, 2),
        RawType::Int16 => bounded(bytes, offset, 3),
        RawType::Int32 => bounded(bytes, offset, 5),
        RawType::Int64 => bounded(bytes, offset, 9),
        RawType::Float32 => bounded(bytes, offset, 5),
        RawType::Float64 => bounded(bytes, offset, 9),
        RawType::StringSmall => {
            let len = codec::read_u8(bytes, offset + 1).ok_or(Error::Parse(ParseFailure::TruncatedHeader))? as usize;
            bounded(bytes, offset, 2 + len)
        }
        RawType::StringLarge => {
            let len = codec::read_u32(bytes, offset + 1).ok_or(Error::Parse(ParseFailure::TruncatedHeader))? as usize;
            bounded(bytes, offset, 5 + len)
        }
        RawType::ObjectSmall => validate_object(bytes, offset, true),
        RawType::ObjectLarge => validate_object(bytes, offset, false),
        RawType::Array => validate_array(bytes, offset),
    }
}

/// Check (1): `len` bytes starting at `offset` must actually be present.
fn bounded(bytes: &[u8], offset: usize, len: usize) -> Result<usize, Error> {
    bytes.get(offset..offset + len).ok_or(Error::Parse(ParseFailure::LengthOutOfBounds))?;
    Ok(len)
}

fn validate_object(bytes: &[u8], offset: usize, small: bool) -> Result<usize, Error> {
    let (header_width, total_len, count) = if small {
        let total_len = codec::read_u16(bytes, offset + 1).ok_or(Error::Parse(ParseFailure::TruncatedHeader))? as usize;
        let count = codec::read_u16(bytes, offset + 3).ok_or(Error::Parse(ParseFailure::TruncatedHeader))? as usize;
        (OBJECT_SMALL_HEADER_WIDTH, total_len, count)
    } else {
        let total_len = codec::read_u32(bytes, offset + 1).ok_or(Error::Parse(ParseFailure::TruncatedHeader))? as usize;
        let count = codec::read_u32(bytes, offset + 5).ok_or(Error::Parse(ParseFailure::TruncatedHeader))? as usize;
        (LARGE_HEADER_WIDTH, total_len, count)
    };
    // Check (1): the declared header length must fit within the supplied slice.
    bytes.get(offset..offset + total_len).ok_or(Error::Parse(ParseFailure::LengthOutOfBounds))?;
    let extent_end = offset + total_len;

    let mut previous_key: Option<Box<str>> = None;
    for index in 0..count {
        let entry_at = offset + header_width + index * VTABLE_ENTRY_WIDTH;
        bytes
            .get(entry_at..entry_at + VTABLE_ENTRY_WIDTH)
            .ok_or(Error::Parse(ParseFailure::TruncatedHeader))?;
        let entry = ObjectEntry::decode(bytes, entry_at).ok_or(Error::Parse(ParseFailure::TruncatedHeader))?;

        // Check (2): the key/value block's offset must land inside this object.
        let key_start = offset + entry.offset as usize;
        if key_start >= extent_end {
            return Err(Error::Parse(ParseFailure::OffsetOutOfBounds));
        }

        // Check (3): the key length/bytes must resolve within the object's extent.
        let key_len = codec::read_u16(bytes, key_start).ok_or(Error::Parse(ParseFailure::MalformedKey))? as usize;
        let key_bytes = bytes.get(key_start + 2..key_start + 2 + key_len).ok_or(Error::Parse(ParseFailure::MalformedKey))?;
        if key_start + 2 + key_len > extent_end {
            return Err(Error::Parse(ParseFailure::MalformedKey));
        }
        let key = std::str::from_utf8(key_bytes).map_err(|_| Error::Parse(ParseFailure::MalformedKey))?;

        // Check (4): keys as found in the payload must be strictly ascending.
        if let Some(previous) = &previous_key {
            if key <= previous.as_ref() {
                return Err(Error::Parse(ParseFailure::KeysNotSorted));
            }
        }
        previous_key = Some(key.into());

        let value_offset = key_start + 2 + key_len;
        let value_extent = validate_value(bytes, value_offset)?;
        if value_offset + value_extent > extent_end {
            return Err(Error::Parse(ParseFailure::OffsetOutOfBounds));
        }
    }
    Ok(total_len)
}

fn validate_array(bytes: &[u8], offset: usize) -> Result<usize, Error> {
    let total_len = codec::read_u32(bytes, offset + 1).ok_or(Error::Parse(ParseFailure::TruncatedHeader))? as usize;
    let count = codec::read_u32(bytes, offset + 5).ok_or(Error::Parse(ParseFailure::TruncatedHeader))? as usize;
    bytes.get(offset..offset + total_len).ok_or(Error::Parse(ParseFailure::LengthOutOfBounds))?;
    let extent_end = offset + total_len;

    for index in 0..count {
        let entry_at = offset + LARGE_HEADER_WIDTH + index * VTABLE_ENTRY_WIDTH;
        bytes
            .get(entry_at..entry_at + VTABLE_ENTRY_WIDTH)
            .ok_or(Error::Parse(ParseFailure::TruncatedHeader))?;
        let entry = ArrayEntry::decode(bytes, entry_at).ok_or(Error::Parse(ParseFailure::TruncatedHeader))?;

        let value_offset = offset + entry.offset as usize;
        if value_offset >= extent_end {
            return Err(Error::Parse(ParseFailure::OffsetOutOfBounds));
        }
        let value_extent = validate_value(bytes, value_offset)?;
        if value_offset + value_extent > extent_end {
            return Err(Error::Parse(ParseFailure::OffsetOutOfBounds));
        }
    }
    Ok(total_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finalize::finalize;
    use crate::heap::{Array, Node, Object};
    use crate::owner::Kind;

    fn sample_bytes() -> Vec<u8> {
        let mut root = Object::new(Kind::Local);
        root.insert("msg", Node::string("hello from dart!")).unwrap();
        let mut items = Array::new(Kind::Local);
        items.push_back(Node::integer(1));
        items.push_back(Node::string("two"));
        root.insert("items", Node::Array(items)).unwrap();
        finalize(&Node::Object(root))
    }

    #[test]
    fn a_freshly_finalized_buffer_validates() {
        assert!(validate(&sample_bytes()).is_ok());
    }

    #[test]
    fn truncated_bytes_fail_validation() {
        let bytes = sample_bytes();
        let truncated = &bytes[..bytes.len() - 3];
        assert!(validate(truncated).is_err());
    }

    #[test]
    fn a_corrupted_vtable_offset_is_rejected() {
        let mut bytes = sample_bytes();
        // Stomp the first vtable entry's offset field with an out-of-range value.
        let corrupt_at = OBJECT_SMALL_HEADER_WIDTH + 4;
        bytes[corrupt_at..corrupt_at + 4].copy_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        assert_eq!(validate(&bytes), Err(Error::Parse(ParseFailure::OffsetOutOfBounds)));
    }

    #[test]
    fn trailing_garbage_bytes_fail_the_length_check() {
        let mut bytes = sample_bytes();
        bytes.push(0xAB);
        assert_eq!(validate(&bytes), Err(Error::Parse(ParseFailure::LengthOutOfBounds)));
    }
}
