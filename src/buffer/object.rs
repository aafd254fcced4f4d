//! Object key lookup over a finalized buffer's vtable: binary search that
//! only ever touches the small, cache-friendly vtable region — the 2-byte
//! inline prefix resolves almost every comparison without dereferencing the
//! payload at all.

use std::cmp::Ordering;

use crate::buffer::reader::BufferValue;
use crate::codec;
use crate::error::{Error, LogicFailure, ParseFailure, TypeName};
use crate::raw::{ObjectEntry, RawType, LARGE_HEADER_WIDTH, OBJECT_SMALL_HEADER_WIDTH, VTABLE_ENTRY_WIDTH};

/// A read-only view onto an object value inside a finalized buffer.
pub struct BufferObject {
    pub(crate) value: BufferValue,
}

struct Header {
    header_width: usize,
    count: usize,
}

impl BufferObject {
    fn header(&self) -> Result<Header, Error> {
        let bytes = self.value.bytes();
        let offset = self.value.offset;
        let tag = codec::read_u8(bytes, offset).ok_or(Error::Parse(ParseFailure::TruncatedHeader))?;
        match RawType::from_tag(tag)? {
            RawType::ObjectSmall => {
                let count = codec::read_u16(bytes, offset + 3).ok_or(Error::Parse(ParseFailure::TruncatedHeader))? as usize;
                Ok(Header { header_width: OBJECT_SMALL_HEADER_WIDTH, count })
            }
            RawType::ObjectLarge => {
                let count = codec::read_u32(bytes, offset + 5).ok_or(Error::Parse(ParseFailure::TruncatedHeader))? as usize;
                Ok(Header { header_width: LARGE_HEADER_WIDTH, count })
            }
            other => Err(Error::type_error(TypeName::Object, crate::buffer::reader::type_name_of(other))),
        }
    }

    /// Number of entries.
    pub fn size(&self) -> usize {
        self.header().map(|h| h.count).unwrap_or(0)
    }

    fn entry_at(&self, index: usize) -> Result<ObjectEntry, Error> {
        let header = self.header()?;
        let at = self.value.offset + header.header_width + index * VTABLE_ENTRY_WIDTH;
        ObjectEntry::decode(self.value.bytes(), at).ok_or(Error::Parse(ParseFailure::TruncatedHeader))
    }

    /// Reads the key stored at vtable slot `entry`, returning its absolute
    /// byte offset (the start of the value that follows it) alongside it.
    fn key_at(&self, entry: &ObjectEntry) -> Result<(&str, usize), Error> {
        let bytes = self.value.bytes();
        let key_start = self.value.offset + entry.offset as usize;
        let key_len = codec::read_u16(bytes, key_start).ok_or(Error::Parse(ParseFailure::MalformedKey))? as usize;
        let key_bytes = bytes
            .get(key_start + 2..key_start + 2 + key_len)
            .ok_or(Error::Parse(ParseFailure::MalformedKey))?;
        let key = std::str::from_utf8(key_bytes).map_err(|_| Error::Parse(ParseFailure::MalformedKey))?;
        Ok((key, key_start + 2 + key_len))
    }

    fn lower_bound_prefix(&self, prefix: [u8; 2], count: usize) -> Result<usize, Error> {
        let mut lo = 0;
        let mut hi = count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let entry = self.entry_at(mid)?;
            if entry.prefix < prefix {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Ok(lo)
    }

    fn upper_bound_prefix(&self, prefix: [u8; 2], count: usize) -> Result<usize, Error> {
        let mut lo = 0;
        let mut hi = count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let entry = self.entry_at(mid)?;
            if entry.prefix <= prefix {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Ok(lo)
    }

    /// Looks up `key`. `Ok(None)` if absent, consistent with the mutable
    /// tree's [`crate::heap::Object::get`].
    ///
    /// Binary search narrows to the (typically singleton) range of vtable
    /// entries sharing `key`'s 2-byte prefix without ever reading the
    /// payload, then a second binary search within that range — keyed on the
    /// full key, now loaded from the payload — breaks any prefix collision.
    /// Both searches are over the vtable's sorted order, so the whole lookup
    /// stays `O(log n)` even when many keys collide on their first two bytes.
    pub fn get(&self, key: &str) -> Result<Option<BufferValue>, Error> {
        let header = self.header()?;
        let prefix = ObjectEntry::prefix_of(key);
        let lo = self.lower_bound_prefix(prefix, header.count)?;
        let hi = self.upper_bound_prefix(prefix, header.count)?;

        let mut lo = lo;
        let mut hi = hi;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let entry = self.entry_at(mid)?;
            let (candidate, value_offset) = self.key_at(&entry)?;
            match candidate.cmp(key) {
                Ordering::Equal => return Ok(Some(self.value.at_offset(value_offset))),
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
            }
        }
        Ok(None)
    }

    /// Strict lookup: errors with `LogicFailure::KeyNotFound` if `key` is absent.
    pub fn at(&self, key: &str) -> Result<BufferValue, Error> {
        self.get(key)?.ok_or_else(|| Error::Logic(LogicFailure::KeyNotFound(key.into())))
    }

    /// Whether `key` is present.
    pub fn has_key(&self, key: &str) -> Result<bool, Error> {
        Ok(self.get(key)?.is_some())
    }

    /// `(key, value)` pairs in key-sorted order.
    pub fn entries(&self) -> ObjectEntries<'_> {
        ObjectEntries { object: self, index: 0, count: self.size() }
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = Result<&str, Error>> {
        self.entries().map(|r| r.map(|(k, _)| k))
    }

    /// Values in key-sorted order.
    pub fn values(&self) -> impl Iterator<Item = Result<BufferValue, Error>> + '_ {
        self.entries().map(|r| r.map(|(_, v)| v))
    }
}

/// Iterator over an object's `(key, value)` pairs in sorted order.
pub struct ObjectEntries<'a> {
    object: &'a BufferObject,
    index: usize,
    count: usize,
}

impl<'a> ObjectEntries<'a> {
    fn entry_result(&self, index: usize) -> Result<(&'a str, BufferValue), Error> {
        let entry = self.object.entry_at(index)?;
        let (key, value_offset) = self.object.key_at(&entry)?;
        Ok((key, self.object.value.at_offset(value_offset)))
    }
}

impl<'a> Iterator for ObjectEntries<'a> {
    type Item = Result<(&'a str, BufferValue), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.count {
            return None;
        }
        let result = self.entry_result(self.index);
        self.index += 1;
        Some(result)
    }
}

/// Double-ended: walking from the back touches only the vtable's tail, never
/// the front, so `.rev()` carries the same zero-extra-work guarantee as
/// forward iteration.
impl<'a> DoubleEndedIterator for ObjectEntries<'a> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.index >= self.count {
            return None;
        }
        self.count -= 1;
        Some(self.entry_result(self.count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finalize::finalize;
    use crate::heap::{Node, Object};
    use crate::owner::Kind;
    use crate::utils::Rand;

    #[test]
    fn binary_search_survives_prefix_collisions() {
        let mut obj = Object::new(Kind::Local);
        obj.insert("ab", Node::integer(1)).unwrap();
        obj.insert("abc", Node::integer(2)).unwrap();
        obj.insert("abd", Node::integer(3)).unwrap();
        obj.insert("ac", Node::integer(4)).unwrap();
        let bytes = finalize(&Node::Object(obj));
        let root = BufferValue::new_root(Kind::Local, bytes);
        let buffer_obj = root.as_object().unwrap();

        assert_eq!(buffer_obj.get("ab").unwrap().unwrap().as_i64().unwrap(), 1);
        assert_eq!(buffer_obj.get("abc").unwrap().unwrap().as_i64().unwrap(), 2);
        assert_eq!(buffer_obj.get("abd").unwrap().unwrap().as_i64().unwrap(), 3);
        assert_eq!(buffer_obj.get("ac").unwrap().unwrap().as_i64().unwrap(), 4);
        assert!(buffer_obj.get("abe").unwrap().is_none());
    }

    #[test]
    fn lookup_survives_256_random_eight_byte_keys() {
        let mut rand = Rand::new(0x5eed_5eed);
        let mut obj = Object::new(Kind::Local);
        let mut keys: Vec<String> = Vec::new();
        while keys.len() < 256 {
            let candidate: String = (0..8).map(|_| (b'a' + (rand.next_u32() % 26) as u8) as char).collect();
            if obj.insert(&candidate, Node::integer(keys.len() as i64)).is_ok() {
                keys.push(candidate);
            }
        }
        let bytes = finalize(&Node::Object(obj));
        let root = BufferValue::new_root(Kind::Local, bytes);
        let buffer_obj = root.as_object().unwrap();

        for (expected_value, key) in keys.iter().enumerate() {
            assert_eq!(buffer_obj.get(key).unwrap().unwrap().as_i64().unwrap(), expected_value as i64);
        }
        assert_eq!(buffer_obj.size(), keys.len());
    }

    #[test]
    fn entries_iterate_in_sorted_order() {
        let mut obj = Object::new(Kind::Local);
        obj.insert("z", Node::integer(1)).unwrap();
        obj.insert("a", Node::integer(2)).unwrap();
        obj.insert("m", Node::integer(3)).unwrap();
        let bytes = finalize(&Node::Object(obj));
        let root = BufferValue::new_root(Kind::Local, bytes);
        let buffer_obj = root.as_object().unwrap();

        let keys: Vec<&str> = buffer_obj.keys().collect::<Result<_, _>>().unwrap();
        assert_eq!(keys, vec!["a", "m", "z"]);
    }
}
