//! The finalizer: lowers a mutable [`Node`] tree into a single contiguous,
//! wire-format byte buffer.
//!
//! Two passes:
//!
//! 1. [`size_of`] walks the tree bottom-up and computes the exact encoded
//!    byte count of every node, without writing anything. The result is a
//!    parallel "size tree" ([`Size`]) so the second pass never has to
//!    recompute a child's size.
//! 2. [`emit`] allocates one `Vec<u8>` sized by the root's computed total and
//!    writes the whole tree into it in the same traversal order, patching
//!    each aggregate's length header once its true byte count is known.
//!
//! Determinism falls out for free: both passes are pure functions of the
//! tree's logical content (and nothing else), and objects are already kept
//! sorted by [`crate::heap::Object`], so two producers building the same
//! logical value always emit identical bytes.

use crate::codec;
use crate::heap::{Array, Node, Object};
use crate::raw::{
    ArrayEntry, ObjectEntry, RawType, LARGE_HEADER_WIDTH, OBJECT_SMALL_HEADER_WIDTH,
    OBJECT_SMALL_SIZE_LIMIT, STRING_SMALL_LIMIT, VTABLE_ENTRY_WIDTH,
};

/// Precomputed size information for one node, retained across the size pass
/// so the emit pass never recomputes a descendant's size.
enum Size {
    /// A scalar or string: just its total encoded size.
    Leaf(usize),
    /// An array: total size plus each child's own [`Size`], in index order.
    Array { total: usize, children: Vec<Size> },
    /// An object: total size, the chosen size class, plus each value's
    /// [`Size`] in the object's (sorted) key order.
    Object { total: usize, raw_type: RawType, header_width: usize, entries: Vec<Size> },
}

impl Size {
    fn total(&self) -> usize {
        match self {
            Size::Leaf(n) => *n,
            Size::Array { total, .. } => *total,
            Size::Object { total, .. } => *total,
        }
    }
}

/// Smallest signed-integer byte width that losslessly represents `v`.
fn int_width(v: i64) -> usize {
    if i8::try_from(v).is_ok() {
        1
    } else if i16::try_from(v).is_ok() {
        2
    } else if i32::try_from(v).is_ok() {
        4
    } else {
        8
    }
}

/// Whether `v` round-trips exactly through `f32`. NaN is deliberately never
/// narrowed: a quiet-NaN payload is not guaranteed to survive the round trip
/// bit-for-bit, and `NaN == NaN` is always false so the natural round-trip
/// check can't even observe success.
fn decimal_width(v: f64) -> usize {
    if !v.is_nan() && (v as f32) as f64 == v {
        4
    } else {
        8
    }
}

fn string_header_width(len: usize) -> usize {
    if len <= STRING_SMALL_LIMIT {
        2 // tag + u8 length
    } else {
        5 // tag + u32 length
    }
}

fn size_of(node: &Node) -> Size {
    match node {
        Node::Null | Node::Boolean(_) => Size::Leaf(1),
        Node::Integer(v) => Size::Leaf(1 + int_width(*v)),
        Node::Decimal(v) => Size::Leaf(1 + decimal_width(*v)),
        Node::String(s) => Size::Leaf(string_header_width(s.len()) + s.len()),
        Node::Array(a) => size_of_array(a),
        Node::Object(o) => size_of_object(o),
    }
}

fn size_of_array(array: &Array) -> Size {
    let children: Vec<Size> = array.values().map(size_of).collect();
    let vtable_width = children.len() * VTABLE_ENTRY_WIDTH;
    let payload_width: usize = children.iter().map(Size::total).sum();
    let total = LARGE_HEADER_WIDTH + vtable_width + payload_width;
    Size::Array { total, children }
}

fn size_of_object(object: &Object) -> Size {
    let entries: Vec<Size> = object.values().map(size_of).collect();
    let vtable_width = entries.len() * VTABLE_ENTRY_WIDTH;
    let key_overhead: usize = object.keys().map(|k| 2 + k.len()).sum();
    let value_width: usize = entries.iter().map(Size::total).sum();
    let payload_width = key_overhead + value_width;

    let small_total = OBJECT_SMALL_HEADER_WIDTH + vtable_width + payload_width;
    if small_total <= OBJECT_SMALL_SIZE_LIMIT {
        Size::Object { total: small_total, raw_type: RawType::ObjectSmall, header_width: OBJECT_SMALL_HEADER_WIDTH, entries }
    } else {
        let total = LARGE_HEADER_WIDTH + vtable_width + payload_width;
        Size::Object { total, raw_type: RawType::ObjectLarge, header_width: LARGE_HEADER_WIDTH, entries }
    }
}

/// The raw type a node will be tagged with on the wire, consulting the
/// precomputed [`Size`] for aggregates (whose size class was already decided)
/// and recomputing the (cheap, O(1)) decision for scalars.
fn raw_type_of(node: &Node, size: &Size) -> RawType {
    match size {
        Size::Array { .. } => RawType::Array,
        Size::Object { raw_type, .. } => *raw_type,
        Size::Leaf(_) => match node {
            Node::Null => RawType::Null,
            Node::Boolean(b) => if *b { RawType::True } else { RawType::False },
            Node::Integer(v) => match int_width(*v) {
                1 => RawType::Int8,
                2 => RawType::Int16,
                4 => RawType::Int32,
                _ => RawType::Int64,
            },
            Node::Decimal(v) => if decimal_width(*v) == 4 { RawType::Float32 } else { RawType::Float64 },
            Node::String(s) => if s.len() <= STRING_SMALL_LIMIT { RawType::StringSmall } else { RawType::StringLarge },
            Node::Array(_) | Node::Object(_) => unreachable!("aggregate nodes always pair with a non-Leaf Size"),
        },
    }
}

fn emit_integer(v: i64, out: &mut Vec<u8>) {
    match int_width(v) {
        1 => {
            out.push(RawType::Int8 as u8);
            out.push(v as i8 as u8);
        }
        2 => {
            out.push(RawType::Int16 as u8);
            codec::write_i16(out, v as i16);
        }
        4 => {
            out.push(RawType::Int32 as u8);
            codec::write_i32(out, v as i32);
        }
        _ => {
            out.push(RawType::Int64 as u8);
            codec::write_i64(out, v);
        }
    }
}

fn emit_decimal(v: f64, out: &mut Vec<u8>) {
    if decimal_width(v) == 4 {
        out.push(RawType::Float32 as u8);
        codec::write_f32(out, v as f32);
    } else {
        out.push(RawType::Float64 as u8);
        codec::write_f64(out, v);
    }
}

fn emit_string(s: &str, out: &mut Vec<u8>) {
    if s.len() <= STRING_SMALL_LIMIT {
        out.push(RawType::StringSmall as u8);
        out.push(s.len() as u8);
    } else {
        out.push(RawType::StringLarge as u8);
        codec::write_u32(out, s.len() as u32);
    }
    out.extend_from_slice(s.as_bytes());
}

fn emit(node: &Node, size: &Size, out: &mut Vec<u8>) {
    match (node, size) {
        (Node::Null, _) => out.push(RawType::Null as u8),
        (Node::Boolean(b), _) => out.push(if *b { RawType::True as u8 } else { RawType::False as u8 }),
        (Node::Integer(v), _) => emit_integer(*v, out),
        (Node::Decimal(v), _) => emit_decimal(*v, out),
        (Node::String(s), _) => emit_string(s.as_str(), out),
        (Node::Array(array), Size::Array { children, .. }) => emit_array(array, children, out),
        (Node::Object(object), Size::Object { raw_type, header_width, entries, .. }) => {
            emit_object(object, *raw_type, *header_width, entries, out)
        }
        _ => unreachable!("size tree shape must mirror node shape"),
    }
}

fn emit_array(array: &Array, children: &[Size], out: &mut Vec<u8>) {
    let start = out.len();
    out.push(RawType::Array as u8);
    out.extend_from_slice(&[0u8; 4]); // total_len placeholder, patched below
    codec::write_u32(out, array.size() as u32);

    let vtable_width = array.size() * VTABLE_ENTRY_WIDTH;
    let mut running = LARGE_HEADER_WIDTH + vtable_width;
    let mut entries = Vec::with_capacity(array.size());
    for (value, child_size) in array.values().zip(children) {
        entries.push(ArrayEntry { raw_type: raw_type_of(value, child_size), offset: running as u32 });
        running += child_size.total();
    }
    for entry in &entries {
        entry.encode(out);
    }
    for (value, child_size) in array.values().zip(children) {
        emit(value, child_size, out);
    }

    let total_len = (out.len() - start) as u32;
    codec::patch_u32(out, start + 1, total_len);
}

fn emit_object(object: &Object, raw_type: RawType, header_width: usize, entries: &[Size], out: &mut Vec<u8>) {
    let start = out.len();
    let small = matches!(raw_type, RawType::ObjectSmall);
    out.push(raw_type as u8);
    if small {
        out.extend_from_slice(&[0u8; 2]);
        codec::write_u16(out, object.size() as u16);
    } else {
        out.extend_from_slice(&[0u8; 4]);
        codec::write_u32(out, object.size() as u32);
    }

    let vtable_width = object.size() * VTABLE_ENTRY_WIDTH;
    let mut running = header_width + vtable_width;
    let mut vtable = Vec::with_capacity(object.size());
    for ((key, value), child_size) in object.entries().zip(entries) {
        vtable.push(ObjectEntry {
            prefix: ObjectEntry::prefix_of(key),
            raw_type: raw_type_of(value, child_size),
            offset: running as u32,
        });
        running += 2 + key.len() + child_size.total();
    }
    for entry in &vtable {
        entry.encode(out);
    }
    for ((key, value), child_size) in object.entries().zip(entries) {
        codec::write_u16(out, key.len() as u16);
        out.extend_from_slice(key.as_bytes());
        emit(value, child_size, out);
    }

    let total_len = out.len() - start;
    if small {
        codec::patch_u16(out, start + 1, total_len as u16);
    } else {
        codec::patch_u32(out, start + 1, total_len as u32);
    }
}

/// Lowers `node` into a self-contained wire-format byte buffer.
pub fn finalize(node: &Node) -> Vec<u8> {
    let size = size_of(node);
    let mut out = Vec::with_capacity(size.total());
    emit(node, &size, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::owner::Kind;

    #[test]
    fn scalar_object_finalizes_to_expected_shape() {
        let mut obj = Object::new(Kind::Local);
        obj.insert("msg", Node::string("hello from dart!")).unwrap();
        let bytes = finalize(&Node::Object(obj));
        assert_eq!(bytes[0], RawType::ObjectSmall as u8);
    }

    #[test]
    fn two_trees_with_equal_content_finalize_identically() {
        let mut a = Object::new(Kind::Local);
        a.insert("a", Node::integer(1)).unwrap();
        a.insert("b", Node::integer(2)).unwrap();

        // built via a different insertion order and a different ownership kind
        let mut b = Object::new(Kind::Shared);
        b.insert("b", Node::integer(2)).unwrap();
        b.insert("a", Node::integer(1)).unwrap();

        assert_eq!(finalize(&Node::Object(a)), finalize(&Node::Object(b)));
    }

    #[test]
    fn integers_narrow_to_the_smallest_sufficient_width() {
        assert_eq!(finalize(&Node::integer(5))[0], RawType::Int8 as u8);
        assert_eq!(finalize(&Node::integer(1000))[0], RawType::Int16 as u8);
        assert_eq!(finalize(&Node::integer(100_000))[0], RawType::Int32 as u8);
        assert_eq!(finalize(&Node::integer(i64::MAX))[0], RawType::Int64 as u8);
    }

    #[test]
    fn decimals_narrow_to_f32_only_when_lossless() {
        assert_eq!(finalize(&Node::decimal(1.5))[0], RawType::Float32 as u8);
        assert_eq!(finalize(&Node::decimal(std::f64::consts::PI))[0], RawType::Float64 as u8);
    }

    #[test]
    fn array_of_mixed_types_finalizes() {
        let mut arr = Array::new(Kind::Local);
        arr.push_back(Node::string("one"));
        arr.push_back(Node::string("two"));
        arr.push_back(Node::null());
        arr.push_back(Node::decimal(3.14));
        arr.push_back(Node::boolean(true));
        let bytes = finalize(&Node::Array(arr));
        assert_eq!(bytes[0], RawType::Array as u8);
    }
}
