//! Little-endian byte codec for the wire format.
//!
//! Every multi-byte field on the wire is little-endian. Reads never assume
//! the backing slice is aligned for the type being read: each accessor
//! copies into a fixed-size array first, so `from_le_bytes` never has to
//! reason about alignment at all. On a little-endian host this copy is the
//! only cost over a direct read; on a big-endian host the same copy also
//! does the byte swap for free via `from_le_bytes`.

/// Reads a `u8` at `offset`. Returns `None` if `offset` is out of bounds.
#[inline]
pub fn read_u8(bytes: &[u8], offset: usize) -> Option<u8> {
    bytes.get(offset).copied()
}

/// Writes a `u8` at `offset` into `out`, growing it if necessary.
#[inline]
pub fn write_u8(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

macro_rules! le_accessor {
    ($read_name:ident, $write_name:ident, $ty:ty) => {
        #[doc = concat!("Reads a little-endian `", stringify!($ty), "` at `offset`.")]
        #[inline]
        pub fn $read_name(bytes: &[u8], offset: usize) -> Option<$ty> {
            let width = std::mem::size_of::<$ty>();
            let slice = bytes.get(offset..offset + width)?;
            let mut buf = [0u8; std::mem::size_of::<$ty>()];
            buf.copy_from_slice(slice);
            Some(<$ty>::from_le_bytes(buf))
        }

        #[doc = concat!("Appends a little-endian `", stringify!($ty), "` to `out`.")]
        #[inline]
        pub fn $write_name(out: &mut Vec<u8>, value: $ty) {
            out.extend_from_slice(&value.to_le_bytes());
        }
    };
}

le_accessor!(read_i16, write_i16, i16);
le_accessor!(read_u16, write_u16, u16);
le_accessor!(read_i32, write_i32, i32);
le_accessor!(read_u32, write_u32, u32);
le_accessor!(read_i64, write_i64, i64);
le_accessor!(read_u64, write_u64, u64);
le_accessor!(read_f32, write_f32, f32);
le_accessor!(read_f64, write_f64, f64);

/// Overwrites a little-endian `u16` already present at `offset` in `out`.
///
/// Used by the finalizer to patch vtable entries and size-class headers
/// after the fact, once the exact count/length is known.
#[inline]
pub fn patch_u16(out: &mut [u8], offset: usize, value: u16) {
    out[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

/// Overwrites a little-endian `u32` already present at `offset` in `out`.
#[inline]
pub fn patch_u32(out: &mut [u8], offset: usize, value: u32) {
    out[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[test]
fn round_trips_every_bit_pattern_of_interest() {
    let mut buf = Vec::new();
    write_u32(&mut buf, 0xDEAD_BEEF);
    write_i64(&mut buf, i64::MIN);
    write_f64(&mut buf, f64::NAN.copysign(1.0));
    write_f32(&mut buf, -0.0);

    assert_eq!(read_u32(&buf, 0), Some(0xDEAD_BEEFu32));
    assert_eq!(read_i64(&buf, 4), Some(i64::MIN));
    assert!(read_f64(&buf, 12).unwrap().is_nan());
    assert_eq!(read_f32(&buf, 20).unwrap().to_bits(), (-0.0f32).to_bits());
}

#[test]
fn out_of_bounds_reads_return_none() {
    let buf = [1u8, 2, 3];
    assert_eq!(read_u32(&buf, 0), None);
    assert_eq!(read_u16(&buf, 2), None);
    assert_eq!(read_u8(&buf, 3), None);
}
