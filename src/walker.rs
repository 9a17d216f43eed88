// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Recursive, in-memory visitor over an unpacked [`Value`] tree, emitting
//! the same canonical event stream the forward cursor produces over a
//! packed container (`SPEC_FULL.md` §4.5).

use crate::value::Value;

/// One step of the canonical event stream.
#[derive(Debug, Clone, Copy)]
pub enum WalkEvent<'a> {
    BeginArray { count: usize, is_scalar: bool },
    BeginObject { count: usize },
    Key(&'a [u8]),
    Value(&'a Value),
    Elem(&'a Value),
    EndArray,
    EndObject,
}

/// Walks `value` depth-first, calling `visit` for every event. Scalar and
/// `Binary` (already-packed, not re-walked) children are emitted directly;
/// `Array`/`Object` children cause recursion instead of an `Elem`/`Value`
/// event.
pub fn walk<'a, F: FnMut(WalkEvent<'a>)>(value: &'a Value, visit: &mut F) {
    match value {
        Value::Array { elems, is_scalar, .. } => {
            visit(WalkEvent::BeginArray {
                count: elems.len(),
                is_scalar: *is_scalar,
            });
            for elem in elems {
                match elem {
                    Value::Array { .. } | Value::Object { .. } => walk(elem, visit),
                    leaf => visit(WalkEvent::Elem(leaf)),
                }
            }
            visit(WalkEvent::EndArray);
        }
        Value::Object { pairs, .. } => {
            visit(WalkEvent::BeginObject { count: pairs.len() });
            for pair in pairs {
                visit(WalkEvent::Key(&pair.key));
                match &pair.value {
                    Value::Array { .. } | Value::Object { .. } => walk(&pair.value, visit),
                    leaf => visit(WalkEvent::Value(leaf)),
                }
            }
            visit(WalkEvent::EndObject);
        }
        leaf => visit(WalkEvent::Elem(leaf)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Pair;
    use test_log::test;

    #[test]
    fn walks_object_in_key_order() {
        let v = Value::object(vec![
            Pair { key: b"a".to_vec(), value: Value::Bool(true), order: 0 },
            Pair { key: b"b".to_vec(), value: Value::Null, order: 1 },
        ]);

        let mut keys = Vec::new();
        walk(&v, &mut |ev| {
            if let WalkEvent::Key(k) = ev {
                keys.push(k.to_vec());
            }
        });
        assert_eq!(keys, [b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn nested_array_recurses_without_elem_event() {
        let v = Value::array(vec![Value::array(vec![Value::Null], false)], false);

        let mut begins = 0;
        let mut elems = 0;
        walk(&v, &mut |ev| match ev {
            WalkEvent::BeginArray { .. } => begins += 1,
            WalkEvent::Elem(_) => elems += 1,
            _ => {}
        });
        assert_eq!(begins, 2);
        assert_eq!(elems, 1);
    }
}
