//! Constant-time indexed access over a finalized buffer's array vtable: the
//! vtable is fixed-width, so the Nth element's offset is a direct index,
//! never a scan.

use crate::buffer::reader::BufferValue;
use crate::codec;
use crate::error::{Error, LogicFailure, ParseFailure, TypeName};
use crate::raw::{ArrayEntry, RawType, LARGE_HEADER_WIDTH, VTABLE_ENTRY_WIDTH};

/// A read-only view onto an array value inside a finalized buffer.
pub struct BufferArray {
    pub(crate) value: BufferValue,
}

impl BufferArray {
    fn count(&self) -> Result<usize, Error> {
        let bytes = self.value.bytes();
        let offset = self.value.offset;
        let tag = codec::read_u8(bytes, offset).ok_or(Error::Parse(ParseFailure::TruncatedHeader))?;
        match RawType::from_tag(tag)? {
            RawType::Array => {
                codec::read_u32(bytes, offset + 5).map(|n| n as usize).ok_or(Error::Parse(ParseFailure::TruncatedHeader))
            }
            other => Err(Error::type_error(TypeName::Array, crate::buffer::reader::type_name_of(other))),
        }
    }

    /// Number of elements.
    pub fn size(&self) -> usize {
        self.count().unwrap_or(0)
    }

    fn entry_at(&self, index: usize) -> Result<ArrayEntry, Error> {
        let at = self.value.offset + LARGE_HEADER_WIDTH + index * VTABLE_ENTRY_WIDTH;
        ArrayEntry::decode(self.value.bytes(), at).ok_or(Error::Parse(ParseFailure::TruncatedHeader))
    }

    /// Non-strict indexed access; `Ok(None)` if out of range.
    pub fn get(&self, index: usize) -> Result<Option<BufferValue>, Error> {
        let count = self.count()?;
        if index >= count {
            return Ok(None);
        }
        let entry = self.entry_at(index)?;
        Ok(Some(self.value.at_offset(self.value.offset + entry.offset as usize)))
    }

    /// Strict indexed access: errors with `LogicFailure::IndexOutOfRange` if out of range.
    pub fn at(&self, index: usize) -> Result<BufferValue, Error> {
        let len = self.size();
        self.get(index)?.ok_or(Error::Logic(LogicFailure::IndexOutOfRange { index, len }))
    }

    /// Elements in index order.
    pub fn values(&self) -> ArrayValues<'_> {
        ArrayValues { array: self, index: 0, count: self.size() }
    }
}

/// Iterator over an array's elements in index order.
pub struct ArrayValues<'a> {
    array: &'a BufferArray,
    index: usize,
    count: usize,
}

impl<'a> Iterator for ArrayValues<'a> {
    type Item = Result<BufferValue, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.count {
            return None;
        }
        let result = self.array.get(self.index).map(|v| v.expect("index within bounds by construction"));
        self.index += 1;
        Some(result)
    }
}

/// Double-ended: indexed access is constant-time in either direction, so
/// `.rev()` costs nothing extra over forward iteration.
impl<'a> DoubleEndedIterator for ArrayValues<'a> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.index >= self.count {
            return None;
        }
        self.count -= 1;
        Some(self.array.get(self.count).map(|v| v.expect("index within bounds by construction")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finalize::finalize;
    use crate::heap::{Array, Node};
    use crate::owner::Kind;

    #[test]
    fn indexed_access_and_iteration_agree() {
        let mut arr = Array::new(Kind::Local);
        arr.push_back(Node::integer(10));
        arr.push_back(Node::integer(20));
        arr.push_back(Node::integer(30));
        let bytes = finalize(&Node::Array(arr));
        let root = BufferValue::new_root(Kind::Local, bytes);
        let buffer_arr = root.as_array().unwrap();

        assert_eq!(buffer_arr.size(), 3);
        assert_eq!(buffer_arr.at(1).unwrap().as_i64().unwrap(), 20);
        assert!(matches!(buffer_arr.get(10), Ok(None)));
        assert!(matches!(buffer_arr.at(10), Err(Error::Logic(LogicFailure::IndexOutOfRange { index: 10, len: 3 }))));

        let values: Vec<i64> = buffer_arr.values().map(|v| v.unwrap().as_i64().unwrap()).collect();
        assert_eq!(values, vec![10, 20, 30]);
    }
}
