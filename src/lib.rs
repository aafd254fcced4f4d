#![warn(missing_docs)]

//! ## Schema-less, zero-copy structured data
//!
//! A single, architecture-independent wire format that a receiver can query
//! with zero allocation, zero parsing, and `O(log n)` key lookup backed by a
//! cache-friendly vtable. Producers build values in a mutable tree; once
//! [`finalize`] lowers that tree to bytes, any receiver holding those bytes
//! can query them in place — no schema, no deserialization step.
//!
//! ### Features
//! - Zero dependencies
//! - Zero-copy reads: `get`, `has_key`, `size`, `type`, and every primitive
//!   unwrap touch only the bytes they need to answer, never the whole buffer
//! - `O(log n)` object key lookup via a 2-byte inline key-prefix cache in the
//!   vtable, falling back to a full-key compare only on a prefix collision
//! - Copy-on-write mutation of the in-memory tree, with `Rc`- or
//!   `Arc`-backed sharing selectable per tree
//! - Canonical, byte-deterministic output: two producers building the same
//!   logical value finalize to identical bytes
//!
//! ### Lifecycle
//!
//! A value moves through three states:
//! - [`heap::Node`] — the mutable tree a producer builds and edits.
//! - a finalized buffer ([`buffer::BufferValue`]) — the immutable byte region
//!   a consumer queries in place.
//! - [`packet::Packet`] — a tagged wrapper holding either of the above, so
//!   callers that don't care which state a value is in can just call into it.
//!
//! [`finalize::finalize`] lowers a tree to bytes; [`definalize::definalize`]
//! reconstructs a tree from bytes. Bytes received from an untrusted source
//! should pass [`validate::validate`] before being trusted as a
//! [`buffer::BufferValue`] root.
//!
//! ```
//! use wiretree::heap::{Node, Object};
//! use wiretree::owner::Kind;
//! use wiretree::buffer::BufferValue;
//!
//! let mut root = Object::new(Kind::Local);
//! root.insert("msg", Node::string("hello from dart!")).unwrap();
//! let bytes = wiretree::finalize::finalize(&Node::Object(root));
//!
//! let buffer = BufferValue::new_root(Kind::Local, bytes);
//! let value = buffer.as_object().unwrap().at("msg").unwrap();
//! assert_eq!(value.as_str().unwrap(), "hello from dart!");
//! ```

pub mod buffer;
pub mod codec;
pub mod definalize;
pub mod error;
pub mod finalize;
pub mod heap;
pub mod iter;
pub mod owner;
pub mod packet;
pub mod parser;
pub mod raw;
pub mod validate;

mod utils;

pub use error::Error;
pub use heap::Node;
pub use packet::Packet;
