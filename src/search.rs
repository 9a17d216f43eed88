// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Find-by-key, total-order comparison, and deep containment over packed
//! containers (`SPEC_FULL.md` §4.7).

use crate::binary_search::partition_point;
use crate::container::ContainerRef;
use crate::cursor::{Cursor, CursorEvent, Leaf};
use crate::resolver::ResolverCache;
use crate::value::ScalarKind;
use std::cmp::Ordering;

/// A found value: either a scalar leaf or an un-descended nested subtree.
pub type FoundValue<'a> = Leaf<'a>;

/// Finds `key` inside a packed array or object container.
///
/// Arrays are searched linearly, starting at `lowbound` (advanced past the
/// match on hit, so repeated calls continue forward). Objects are searched
/// by binary search on the sorted key array; `lowbound` is ignored.
pub fn find_in_container<'a>(
    container: ContainerRef<'a>,
    key: Leaf<'_>,
    lowbound: &mut usize,
    resolver: &ResolverCache,
) -> Option<FoundValue<'a>> {
    let header = container.header();
    if crate::layout::header_is_object(header) {
        find_in_object(container, key, resolver)
    } else {
        find_in_array(container, key, lowbound, resolver)
    }
}

fn find_in_array<'a>(
    container: ContainerRef<'a>,
    key: Leaf<'_>,
    lowbound: &mut usize,
    resolver: &ResolverCache,
) -> Option<FoundValue<'a>> {
    let mut cursor = Cursor::new(container, true);
    // Skip BeginArray.
    cursor.next();

    let mut idx = 0;
    for ev in cursor {
        match ev {
            CursorEvent::Elem(found) => {
                if idx >= *lowbound && leaf_eq(found, key, resolver) {
                    *lowbound = idx + 1;
                    return Some(found);
                }
                idx += 1;
            }
            CursorEvent::EndArray => break,
            _ => {}
        }
    }
    None
}

fn find_in_object<'a>(
    container: ContainerRef<'a>,
    key: Leaf<'_>,
    _resolver: &ResolverCache,
) -> Option<FoundValue<'a>> {
    let needle = match key {
        Leaf::String(s) => s,
        _ => return None,
    };

    // Collect (key bytes, value) pairs via the cursor; the object's keys
    // are guaranteed sorted by (length, bytes) by the builder, so a
    // partition_point binary search applies directly.
    let mut cursor = Cursor::new(container, true);
    cursor.next(); // BeginObject

    let mut pairs: Vec<(&'a [u8], Leaf<'a>)> = Vec::new();
    loop {
        match cursor.next() {
            Some(CursorEvent::Key(k)) => {
                let v = match cursor.next() {
                    Some(CursorEvent::Value(v)) => v,
                    _ => return None,
                };
                pairs.push((k, v));
            }
            Some(CursorEvent::EndObject) | None => break,
            _ => {}
        }
    }

    let idx = partition_point(&pairs, |(k, _)| key_order(k, needle) == Ordering::Less);
    match pairs.get(idx) {
        Some((k, v)) if key_order(k, needle) == Ordering::Equal => Some(*v),
        _ => None,
    }
}

fn key_order(a: &[u8], b: &[u8]) -> Ordering {
    (a.len(), a).cmp(&(b.len(), b))
}

fn leaf_eq(a: Leaf<'_>, b: Leaf<'_>, resolver: &ResolverCache) -> bool {
    compare_leaf(a, b, resolver) == Ordering::Equal
}

fn leaf_rank(leaf: Leaf<'_>) -> u8 {
    match leaf {
        Leaf::Null => 0,
        Leaf::String(_) => 1,
        Leaf::Numeric(_) => 2,
        Leaf::Bool(_) => 3,
        Leaf::Binary(_) => 6,
    }
}

/// Total order over scalar leaves used by [`compare_value`]:
/// `Null < String < Numeric < Bool < Array < Object < Binary`.
fn compare_leaf(a: Leaf<'_>, b: Leaf<'_>, resolver: &ResolverCache) -> Ordering {
    let (ra, rb) = (leaf_rank(a), leaf_rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (a, b) {
        (Leaf::Null, Leaf::Null) => Ordering::Equal,
        (Leaf::String(x), Leaf::String(y)) => key_order(x, y),
        (Leaf::Bool(x), Leaf::Bool(y)) => x.cmp(&y),
        (Leaf::Numeric(x), Leaf::Numeric(y)) => resolver
            .numeric_cmp(x, y)
            .unwrap_or_else(|_| x.cmp(&y)),
        (Leaf::Binary(x), Leaf::Binary(y)) => x.bytes().cmp(y.bytes()),
        _ => Ordering::Equal,
    }
}

/// Total order over containers used by the btree operator class
/// (`SPEC_FULL.md` §4.7). `Binary` values compare by a structural cursor
/// walk producing a consistent-but-arbitrary order over mismatched shapes.
#[must_use]
pub fn compare_value(a: ContainerRef<'_>, b: ContainerRef<'_>, resolver: &ResolverCache) -> Ordering {
    let mut ca = Cursor::new(a, false);
    let mut cb = Cursor::new(b, false);
    loop {
        match (ca.next(), cb.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ea), Some(eb)) => {
                let ord = compare_events(&ea, &eb, resolver);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn event_rank(ev: &CursorEvent<'_>) -> u8 {
    match ev {
        CursorEvent::BeginObject { .. } => 0,
        CursorEvent::BeginArray { .. } => 1,
        CursorEvent::Key(_) => 2,
        CursorEvent::Value(_) | CursorEvent::Elem(_) => 3,
        CursorEvent::EndObject | CursorEvent::EndArray => 4,
    }
}

fn compare_events(a: &CursorEvent<'_>, b: &CursorEvent<'_>, resolver: &ResolverCache) -> Ordering {
    let (ra, rb) = (event_rank(a), event_rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (a, b) {
        (CursorEvent::BeginArray { count: ca, .. }, CursorEvent::BeginArray { count: cb, .. }) => {
            ca.cmp(cb)
        }
        (CursorEvent::BeginObject { count: ca }, CursorEvent::BeginObject { count: cb }) => {
            ca.cmp(cb)
        }
        (CursorEvent::Key(ka), CursorEvent::Key(kb)) => key_order(ka, kb),
        (CursorEvent::Value(va), CursorEvent::Value(vb))
        | (CursorEvent::Elem(va), CursorEvent::Elem(vb)) => compare_leaf(*va, *vb, resolver),
        _ => Ordering::Equal,
    }
}

/// Returns true iff every key of `b` appears in `a` with a value that deep
/// contains `b`'s (objects), and every scalar of `b` appears in `a` while
/// every nested composite of `b` is deep-contained by some nested composite
/// of `a` (arrays, existential match).
#[must_use]
pub fn deep_contains(a: ContainerRef<'_>, b: ContainerRef<'_>, resolver: &ResolverCache) -> bool {
    let header_a = a.header();
    let header_b = b.header();

    if crate::layout::header_is_object(header_a) && crate::layout::header_is_object(header_b) {
        return object_contains(a, b, resolver);
    }
    if crate::layout::header_is_array(header_a) && crate::layout::header_is_array(header_b) {
        return array_contains(a, b, resolver);
    }
    false
}

fn object_contains(a: ContainerRef<'_>, b: ContainerRef<'_>, resolver: &ResolverCache) -> bool {
    let mut cb = Cursor::new(b, true);
    cb.next(); // BeginObject

    loop {
        match cb.next() {
            Some(CursorEvent::Key(key)) => {
                let bval = match cb.next() {
                    Some(CursorEvent::Value(v)) => v,
                    _ => return false,
                };
                let mut lowbound = 0;
                match find_in_container(a, Leaf::String(key), &mut lowbound, resolver) {
                    Some(Leaf::Binary(sub_a)) => {
                        let bval_container = match bval {
                            Leaf::Binary(sub_b) => sub_b,
                            _ => return false,
                        };
                        if !deep_contains(sub_a, bval_container, resolver) {
                            return false;
                        }
                    }
                    Some(found) => {
                        if !leaf_eq(found, bval, resolver) {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
            Some(CursorEvent::EndObject) | None => return true,
            _ => {}
        }
    }
}

fn array_contains(a: ContainerRef<'_>, b: ContainerRef<'_>, resolver: &ResolverCache) -> bool {
    let mut scalars_a = Vec::new();
    let mut nests_a = Vec::new();
    collect_array_children(a, &mut scalars_a, &mut nests_a);

    let mut cb = Cursor::new(b, true);
    cb.next(); // BeginArray

    loop {
        match cb.next() {
            Some(CursorEvent::Elem(Leaf::Binary(sub_b))) => {
                if !nests_a
                    .iter()
                    .any(|sub_a| deep_contains(*sub_a, sub_b, resolver))
                {
                    return false;
                }
            }
            Some(CursorEvent::Elem(leaf)) => {
                if !scalars_a.iter().any(|x| leaf_eq(*x, leaf, resolver)) {
                    return false;
                }
            }
            Some(CursorEvent::EndArray) | None => return true,
            _ => {}
        }
    }
}

fn collect_array_children<'a>(
    container: ContainerRef<'a>,
    scalars: &mut Vec<Leaf<'a>>,
    nests: &mut Vec<ContainerRef<'a>>,
) {
    let mut cursor = Cursor::new(container, true);
    cursor.next(); // BeginArray
    for ev in cursor {
        match ev {
            CursorEvent::Elem(Leaf::Binary(sub)) => nests.push(sub),
            CursorEvent::Elem(leaf) => scalars.push(leaf),
            CursorEvent::EndArray => break,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Builder, Event};
    use crate::compactor::compact;
    use crate::value::Value;
    use test_log::test;

    fn build(events: Vec<Event>) -> crate::container::Container {
        let mut b = Builder::new();
        for e in events {
            b.push(e).unwrap();
        }
        compact(&b.finish().unwrap()).unwrap()
    }

    #[test]
    fn finds_object_value_by_key() {
        let c = build(vec![
            Event::BeginObject,
            Event::Key(b"a".to_vec()),
            Event::Value(Value::Numeric(b"1".to_vec())),
            Event::Key(b"b".to_vec()),
            Event::Value(Value::Numeric(b"2".to_vec())),
            Event::EndObject,
        ]);

        let resolver = ResolverCache::new();
        let mut lowbound = 0;
        let found = find_in_container(c.as_ref(), Leaf::String(b"b"), &mut lowbound, &resolver);
        assert_eq!(found, Some(Leaf::Numeric(b"2")));
    }

    #[test]
    fn object_deep_contains() {
        let a = build(vec![
            Event::BeginObject,
            Event::Key(b"x".to_vec()),
            Event::Value(Value::Numeric(b"1".to_vec())),
            Event::Key(b"y".to_vec()),
            Event::Value(Value::Bool(true)),
            Event::EndObject,
        ]);
        let b = build(vec![
            Event::BeginObject,
            Event::Key(b"y".to_vec()),
            Event::Value(Value::Bool(true)),
            Event::EndObject,
        ]);

        let resolver = ResolverCache::new();
        assert!(deep_contains(a.as_ref(), b.as_ref(), &resolver));
    }

    #[test]
    fn array_existential_containment() {
        let a = build(vec![
            Event::BeginArray { is_scalar: false },
            Event::Elem(Value::Numeric(b"1".to_vec())),
            Event::Elem(Value::Numeric(b"2".to_vec())),
            Event::Elem(Value::Numeric(b"3".to_vec())),
            Event::EndArray,
        ]);
        let b = build(vec![
            Event::BeginArray { is_scalar: false },
            Event::Elem(Value::Numeric(b"2".to_vec())),
            Event::Elem(Value::Numeric(b"1".to_vec())),
            Event::EndArray,
        ]);

        let resolver = ResolverCache::new();
        assert!(deep_contains(a.as_ref(), b.as_ref(), &resolver));
    }
}
