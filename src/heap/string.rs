//! Small-string-optimized string storage for the mutable tree: short strings
//! are stored inline with no allocation, longer strings go out of line.

use crate::owner::{Handle, Kind};

/// Strings up to this many bytes are stored inline in the node itself with
/// no allocation; longer strings are boxed behind a [`Handle`].
pub const INLINE_CAPACITY: usize = 64;

/// A string value in the mutable tree.
#[derive(Clone, Debug)]
pub enum NodeString {
    /// Stored inline; `len` bytes of `buf` are the UTF-8 payload.
    Small { buf: [u8; INLINE_CAPACITY], len: u8 },
    /// Stored out of line, behind a copy-on-write handle.
    Large(Handle<Box<str>>),
}

impl NodeString {
    /// Builds a [`NodeString`] from a borrowed `&str`, choosing inline vs.
    /// out-of-line storage based on length.
    pub fn new(kind: Kind, s: &str) -> Self {
        if s.len() <= INLINE_CAPACITY {
            let mut buf = [0u8; INLINE_CAPACITY];
            buf[..s.len()].copy_from_slice(s.as_bytes());
            NodeString::Small { buf, len: s.len() as u8 }
        } else {
            NodeString::Large(Handle::new(kind, s.into()))
        }
    }

    /// Borrows the string's contents.
    pub fn as_str(&self) -> &str {
        match self {
            NodeString::Small { buf, len } => {
                std::str::from_utf8(&buf[..*len as usize]).expect("inline bytes are valid UTF-8 by construction")
            }
            NodeString::Large(handle) => handle,
        }
    }

    /// Byte length.
    pub fn len(&self) -> usize {
        self.as_str().len()
    }

    /// Whether the string is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PartialEq for NodeString {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

#[test]
fn short_strings_stay_inline() {
    let s = NodeString::new(Kind::Local, "hello");
    assert!(matches!(s, NodeString::Small { .. }));
    assert_eq!(s.as_str(), "hello");
}

#[test]
fn long_strings_go_out_of_line_and_share_on_clone() {
    let long = "x".repeat(INLINE_CAPACITY + 1);
    let s = NodeString::new(Kind::Local, &long);
    assert!(matches!(s, NodeString::Large(_)));
    if let NodeString::Large(handle) = &s {
        let cloned = handle.clone();
        assert_eq!(handle.strong_count(), 2);
        assert_eq!(*cloned, long.into_boxed_str());
    }
}

#[test]
fn equality_ignores_storage_form() {
    let long = "y".repeat(INLINE_CAPACITY + 1);
    let a = NodeString::new(Kind::Local, "hi");
    let b = NodeString::new(Kind::Shared, "hi");
    assert_eq!(a, b);
    let c = NodeString::new(Kind::Local, &long);
    assert_ne!(a, c);
}
