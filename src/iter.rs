//! Iteration: forward and reverse traversal over objects (keys, values, or
//! both together) and arrays, in both the mutable and immutable states.
//!
//! There is no separate iterator type here — [`crate::heap::Object::entries`],
//! [`crate::heap::Array::values`], [`crate::buffer::BufferObject::entries`],
//! and [`crate::buffer::BufferArray::values`] already return
//! [`DoubleEndedIterator`]s, so `.rev()` is the reverse-iteration API for all
//! four container/state combinations. This module exists to state and test
//! that contract in one place rather than leaving it implicit.
//!
//! Dereferencing any of these iterators yields a value of the same ownership
//! flavor as its container: heap iterators yield `&Node`, buffer iterators
//! yield owned [`crate::buffer::BufferValue`] views sharing the root's byte
//! allocation. The two flavors are not interchangeable — there is
//! deliberately no adapter that erases which one you're holding.

#[cfg(test)]
mod tests {
    use crate::finalize::finalize;
    use crate::heap::{Array, Node, Object};
    use crate::owner::Kind;

    fn sample_object() -> Object {
        let mut obj = Object::new(Kind::Local);
        obj.insert("a", Node::integer(1)).unwrap();
        obj.insert("b", Node::integer(2)).unwrap();
        obj.insert("c", Node::integer(3)).unwrap();
        obj
    }

    fn sample_array() -> Array {
        let mut arr = Array::new(Kind::Local);
        arr.push_back(Node::integer(10));
        arr.push_back(Node::integer(20));
        arr.push_back(Node::integer(30));
        arr
    }

    #[test]
    fn heap_object_reverse_iteration_mirrors_forward() {
        let obj = sample_object();
        let forward: Vec<&str> = obj.keys().collect();
        let mut reversed: Vec<&str> = obj.keys().rev().collect();
        reversed.reverse();
        assert_eq!(forward, reversed);
        assert_eq!(obj.keys().rev().collect::<Vec<_>>(), vec!["c", "b", "a"]);
    }

    #[test]
    fn heap_array_reverse_iteration_mirrors_forward() {
        let arr = sample_array();
        assert_eq!(arr.values().rev().map(|n| n.as_i64().unwrap()).collect::<Vec<_>>(), vec![30, 20, 10]);
    }

    #[test]
    fn buffer_object_reverse_iteration_mirrors_forward() {
        let bytes = finalize(&Node::Object(sample_object()));
        let root = crate::buffer::BufferValue::new_root(Kind::Local, bytes);
        let buffer_obj = root.as_object().unwrap();

        let keys: Vec<&str> = buffer_obj.entries().rev().map(|e| e.unwrap().0).collect();
        assert_eq!(keys, vec!["c", "b", "a"]);
    }

    #[test]
    fn buffer_array_reverse_iteration_mirrors_forward() {
        let bytes = finalize(&Node::Array(sample_array()));
        let root = crate::buffer::BufferValue::new_root(Kind::Local, bytes);
        let buffer_arr = root.as_array().unwrap();

        let values: Vec<i64> = buffer_arr.values().rev().map(|v| v.unwrap().as_i64().unwrap()).collect();
        assert_eq!(values, vec![30, 20, 10]);
    }

    #[test]
    fn forward_and_backward_cursors_meet_in_the_middle() {
        let bytes = finalize(&Node::Object(sample_object()));
        let root = crate::buffer::BufferValue::new_root(Kind::Local, bytes);
        let buffer_obj = root.as_object().unwrap();

        let mut iter = buffer_obj.entries();
        let first = iter.next().unwrap().unwrap();
        let last = iter.next_back().unwrap().unwrap();
        assert_eq!(first.0, "a");
        assert_eq!(last.0, "c");
        let middle = iter.next().unwrap().unwrap();
        assert_eq!(middle.0, "b");
        assert!(iter.next().is_none());
    }
}
