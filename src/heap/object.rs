//! The mutable tree's object node: an ordered `key -> Node` mapping kept
//! sorted lexicographically by key at all times.
//!
//! Backed by a `Vec<(Box<str>, Node)>` probed with `binary_search_by`, which
//! supports `insert` (fails on a duplicate key) alongside `set` (upsert), and
//! wrapped in a copy-on-write [`Handle`] so cloning an object is cheap and
//! mutating a shared clone never disturbs the original.

use crate::error::{Error, LogicFailure};
use crate::heap::node::Node;
use crate::owner::{Handle, Kind};

/// The data behind an [`Object`]: a key-sorted vector of entries.
#[derive(Clone, Debug, Default)]
pub struct ObjectData(Vec<(Box<str>, Node)>);

impl ObjectData {
    fn search(&self, key: &str) -> Result<usize, usize> {
        self.0.binary_search_by(|(k, _)| k.as_ref().cmp(key))
    }
}

/// A mutable, copy-on-write handle to an object node.
#[derive(Clone, Debug)]
pub struct Object(pub(crate) Handle<ObjectData>);

impl Object {
    /// Creates a new, empty object using the given ownership [`Kind`].
    pub fn new(kind: Kind) -> Self {
        Object(Handle::new(kind, ObjectData::default()))
    }

    /// Which ownership kind backs this object's handle.
    pub fn kind(&self) -> Kind {
        self.0.kind()
    }

    /// Number of entries.
    pub fn size(&self) -> usize {
        self.0.0.len()
    }

    /// Whether `key` is present.
    pub fn has_key(&self, key: &str) -> bool {
        self.0.search(key).is_ok()
    }

    /// Looks up `key`. Returns `None` if absent — callers that want a hard
    /// error instead use [`Object::at`].
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self.0.search(key) {
            Ok(pos) => Some(&self.0 .0[pos].1),
            Err(_) => None,
        }
    }

    /// Strict lookup: errors with `LogicFailure::KeyNotFound` if `key` is absent.
    pub fn at(&self, key: &str) -> Result<&Node, Error> {
        self.get(key)
            .ok_or_else(|| Error::Logic(LogicFailure::KeyNotFound(key.into())))
    }

    /// Inserts a new key, failing with `LogicFailure::DuplicateKey` if it
    /// already exists. Copy-on-write: shallow-clones this level first if the
    /// handle is shared.
    pub fn insert(&mut self, key: &str, value: Node) -> Result<(), Error> {
        let data = self.0.make_mut();
        match data.search(key) {
            Ok(_) => Err(Error::Logic(LogicFailure::DuplicateKey(key.into()))),
            Err(pos) => {
                data.0.insert(pos, (key.into(), value));
                Ok(())
            }
        }
    }

    /// Upserts `key`: replaces the value if present, inserts otherwise.
    pub fn set(&mut self, key: &str, value: Node) {
        let data = self.0.make_mut();
        match data.search(key) {
            Ok(pos) => data.0[pos].1 = value,
            Err(pos) => data.0.insert(pos, (key.into(), value)),
        }
    }

    /// Removes `key` if present. Returns whether anything was removed.
    pub fn erase(&mut self, key: &str) -> bool {
        let data = self.0.make_mut();
        match data.search(key) {
            Ok(pos) => {
                data.0.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Keys in sorted order. Double-ended: `.rev()` walks descending.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.0 .0.iter().map(|(k, _)| k.as_ref())
    }

    /// Values in key-sorted order. Double-ended: `.rev()` walks descending.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &Node> {
        self.0 .0.iter().map(|(_, v)| v)
    }

    /// `(key, value)` pairs in key-sorted order. Double-ended: `.rev()` walks descending.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = (&str, &Node)> {
        self.0 .0.iter().map(|(k, v)| (k.as_ref(), v))
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        // Both sides are kept sorted at all times, so element-wise comparison
        // in iteration order is already the canonical comparison.
        self.0 .0.len() == other.0 .0.len()
            && self
                .entries()
                .zip(other.entries())
                .all(|((k1, v1), (k2, v2))| k1 == k2 && v1 == v2)
    }
}

#[test]
fn insert_rejects_duplicates_and_set_upserts() {
    let mut obj = Object::new(Kind::Local);
    obj.insert("a", Node::integer(1)).unwrap();
    assert!(matches!(
        obj.insert("a", Node::integer(2)),
        Err(Error::Logic(LogicFailure::DuplicateKey(_)))
    ));
    obj.set("a", Node::integer(2));
    assert_eq!(obj.get("a"), Some(&Node::integer(2)));
}

#[test]
fn keys_stay_sorted_regardless_of_insertion_order() {
    let mut obj = Object::new(Kind::Local);
    obj.insert("a", Node::integer(1)).unwrap();
    obj.insert("c", Node::integer(3)).unwrap();
    obj.insert("b", Node::integer(2)).unwrap();
    assert_eq!(obj.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
}

#[test]
fn copy_on_write_isolates_clones() {
    let mut a = Object::new(Kind::Local);
    a.insert("k", Node::string("v")).unwrap();
    let mut b = a.clone();
    b.set("k", Node::string("w"));
    assert_eq!(a.get("k"), Some(&Node::string("v")));
    assert_eq!(b.get("k"), Some(&Node::string("w")));
}

#[test]
fn erase_removes_missing_key_is_noop() {
    let mut obj = Object::new(Kind::Local);
    obj.insert("a", Node::null()).unwrap();
    assert!(!obj.erase("missing"));
    assert!(obj.erase("a"));
    assert_eq!(obj.size(), 0);
}
