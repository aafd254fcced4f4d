//! Wire layout descriptors: the one-byte raw type tag, vtable entry shape,
//! and the small set of fixed widths the rest of the crate builds on.

use crate::error::{Error, ParseFailure};

/// The one-byte on-disk discriminator. Every value on the wire begins with
/// one of these.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawType {
    /// No payload.
    Null = 0,
    /// No payload, logical value `false`.
    False = 1,
    /// No payload, logical value `true`.
    True = 2,
    /// 1-byte signed integer payload.
    Int8 = 3,
    /// 2-byte signed integer payload.
    Int16 = 4,
    /// 4-byte signed integer payload.
    Int32 = 5,
    /// 8-byte signed integer payload.
    Int64 = 6,
    /// 4-byte IEEE-754 float payload.
    Float32 = 7,
    /// 8-byte IEEE-754 float payload.
    Float64 = 8,
    /// `u8` length prefix, then that many UTF-8 bytes.
    StringSmall = 9,
    /// `u32` length prefix, then that many UTF-8 bytes.
    StringLarge = 10,
    /// `u16` total-length/count header, vtable, payload.
    ObjectSmall = 11,
    /// `u32` total-length/count header, vtable, payload.
    ObjectLarge = 12,
    /// `u32` total-length/count header, vtable, payload.
    Array = 13,
}

impl RawType {
    /// Decodes a raw type tag byte, failing with [`ParseFailure::UnknownRawType`]
    /// on anything this version of the format does not recognize.
    pub fn from_tag(tag: u8) -> Result<Self, Error> {
        Ok(match tag {
            0 => RawType::Null,
            1 => RawType::False,
            2 => RawType::True,
            3 => RawType::Int8,
            4 => RawType::Int16,
            5 => RawType::Int32,
            6 => RawType::Int64,
            7 => RawType::Float32,
            8 => RawType::Float64,
            9 => RawType::StringSmall,
            10 => RawType::StringLarge,
            11 => RawType::ObjectSmall,
            12 => RawType::ObjectLarge,
            13 => RawType::Array,
            other => return Err(Error::Parse(ParseFailure::UnknownRawType(other))),
        })
    }

    /// Whether this tag denotes an object (either size class).
    pub fn is_object(self) -> bool {
        matches!(self, RawType::ObjectSmall | RawType::ObjectLarge)
    }

    /// Whether this tag denotes an array.
    pub fn is_array(self) -> bool {
        matches!(self, RawType::Array)
    }
}

/// Width, in bytes, of a vtable entry: 2-byte key prefix cache, 1-byte child
/// raw type, 1 padding byte, 4-byte offset. Fixed so binary search can index
/// directly without touching the payload region.
pub const VTABLE_ENTRY_WIDTH: usize = 8;

/// Header width for [`RawType::ObjectSmall`]: tag(1) + total_len:u16(2) + count:u16(2).
pub const OBJECT_SMALL_HEADER_WIDTH: usize = 5;

/// Header width for [`RawType::ObjectLarge`] / [`RawType::Array`]:
/// tag(1) + total_len:u32(4) + count:u32(4).
pub const LARGE_HEADER_WIDTH: usize = 9;

/// Above this encoded size an object is emitted with a `u32` header instead
/// of a `u16` one.
pub const OBJECT_SMALL_SIZE_LIMIT: usize = u16::MAX as usize;

/// Strings up to this many bytes are encoded with [`RawType::StringSmall`].
pub const STRING_SMALL_LIMIT: usize = u8::MAX as usize;

/// Number of leading key bytes cached inline in each object vtable entry.
pub const PREFIX_LEN: usize = 2;

/// A decoded object vtable entry: enough to dispatch on type and locate the
/// key/value payload block without reading anything but the vtable itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectEntry {
    /// First [`PREFIX_LEN`] bytes of the key, zero-padded if shorter.
    pub prefix: [u8; PREFIX_LEN],
    /// Raw type of the value, cached so dispatch needs no payload access.
    pub raw_type: RawType,
    /// Offset, relative to the object's start, of the key-length/key/value block.
    pub offset: u32,
}

impl ObjectEntry {
    pub(crate) fn encode(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.prefix);
        out.push(self.raw_type as u8);
        out.push(0); // padding, keeps the entry width fixed at 8 bytes
        crate::codec::write_u32(out, self.offset);
    }

    pub(crate) fn decode(bytes: &[u8], at: usize) -> Option<Self> {
        let slice = bytes.get(at..at + VTABLE_ENTRY_WIDTH)?;
        let prefix = [slice[0], slice[1]];
        let raw_type = RawType::from_tag(slice[2]).ok()?;
        let offset = crate::codec::read_u32(slice, 4)?;
        Some(ObjectEntry { prefix, raw_type, offset })
    }

    /// Builds the zero-padded 2-byte prefix cache for `key`.
    pub fn prefix_of(key: &str) -> [u8; PREFIX_LEN] {
        let bytes = key.as_bytes();
        let mut prefix = [0u8; PREFIX_LEN];
        let n = bytes.len().min(PREFIX_LEN);
        prefix[..n].copy_from_slice(&bytes[..n]);
        prefix
    }
}

/// A decoded array vtable entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayEntry {
    /// Raw type of the element.
    pub raw_type: RawType,
    /// Offset, relative to the array's start, of the element's encoded bytes.
    pub offset: u32,
}

impl ArrayEntry {
    pub(crate) fn encode(self, out: &mut Vec<u8>) {
        out.push(self.raw_type as u8);
        out.extend_from_slice(&[0u8; 3]); // padding, keeps the entry width at 8 bytes
        crate::codec::write_u32(out, self.offset);
    }

    pub(crate) fn decode(bytes: &[u8], at: usize) -> Option<Self> {
        let slice = bytes.get(at..at + VTABLE_ENTRY_WIDTH)?;
        let raw_type = RawType::from_tag(slice[0]).ok()?;
        let offset = crate::codec::read_u32(slice, 4)?;
        Some(ArrayEntry { raw_type, offset })
    }
}

#[test]
fn prefix_padding_preserves_lexicographic_order_among_short_keys() {
    // "a" < "ab" < "b" lexicographically; the zero-padded prefix comparison
    // must agree, since '\0' < any printable byte.
    assert_eq!(ObjectEntry::prefix_of("a"), [b'a', 0]);
    assert_eq!(ObjectEntry::prefix_of("ab"), [b'a', b'b']);
    assert!(ObjectEntry::prefix_of("a") < ObjectEntry::prefix_of("ab"));
    assert!(ObjectEntry::prefix_of("ab") < ObjectEntry::prefix_of("b"));
}

#[test]
fn entry_round_trips_through_encode_decode() {
    let entry = ObjectEntry { prefix: [b'h', b'i'], raw_type: RawType::StringSmall, offset: 42 };
    let mut buf = Vec::new();
    entry.encode(&mut buf);
    assert_eq!(buf.len(), VTABLE_ENTRY_WIDTH);
    assert_eq!(ObjectEntry::decode(&buf, 0), Some(entry));
}
