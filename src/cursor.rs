// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Forward cursor: a stack of frames advancing through a packed container,
//! emitting the same event stream the packed walker produces over an
//! in-memory tree, without recursion (`SPEC_FULL.md` §4.6).

use crate::container::ContainerRef;
use crate::layout::{self, header_count, header_is_array, header_is_scalar, EntryType};
use byteorder::{ByteOrder, LittleEndian};

/// A decoded leaf value: a scalar, or an un-descended nested subtree when
/// the cursor was constructed with `skip_nested = true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leaf<'a> {
    Null,
    Bool(bool),
    Numeric(&'a [u8]),
    String(&'a [u8]),
    Binary(ContainerRef<'a>),
}

/// One step of the canonical event stream.
#[derive(Clone, Copy)]
pub enum CursorEvent<'a> {
    BeginArray { count: usize, is_scalar: bool },
    BeginObject { count: usize },
    Key(&'a [u8]),
    Value(Leaf<'a>),
    Elem(Leaf<'a>),
    EndArray,
    EndObject,
}

struct Frame<'a> {
    payload: &'a [u8],
    entries: Vec<u32>,
    count: usize,
    is_array: bool,
    is_scalar: bool,
    index: usize,
    awaiting_value: bool,
    begun: bool,
}

impl<'a> Frame<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        let header = LittleEndian::read_u32(&bytes[0..4]);
        let count = header_count(header);
        let is_array = header_is_array(header);
        let is_scalar = header_is_scalar(header);
        let n_entries = if is_array { count } else { count * 2 };

        let mut entries = Vec::with_capacity(n_entries);
        for i in 0..n_entries {
            let off = 4 + i * 4;
            entries.push(LittleEndian::read_u32(&bytes[off..off + 4]));
        }

        let payload_start = 4 + n_entries * 4;
        let payload = &bytes[payload_start..];

        Self {
            payload,
            entries,
            count,
            is_array,
            is_scalar,
            index: 0,
            awaiting_value: false,
            begun: false,
        }
    }

    fn child(&self, idx: usize) -> (&'a [u8], EntryType) {
        let entry = self.entries[idx];
        let off = layout::off(&self.entries, idx) as usize;
        let end = layout::end_pos(entry) as usize;
        (&self.payload[off..end], layout::type_of(entry))
    }
}

fn decode_leaf<'a>(ty: EntryType, bytes: &'a [u8]) -> Leaf<'a> {
    match ty {
        EntryType::Null => Leaf::Null,
        EntryType::True => Leaf::Bool(true),
        EntryType::False => Leaf::Bool(false),
        EntryType::String => Leaf::String(bytes),
        EntryType::Numeric => Leaf::Numeric(bytes),
        EntryType::Nest => unreachable!("Nest is handled by the caller before decode_leaf"),
    }
}

/// Iterates the event stream of a packed container.
pub struct Cursor<'a> {
    stack: Vec<Frame<'a>>,
    /// When true, nested composites are surfaced as an opaque
    /// `Leaf::Binary` instead of being descended into.
    skip_nested: bool,
}

impl<'a> Cursor<'a> {
    #[must_use]
    pub fn new(container: ContainerRef<'a>, skip_nested: bool) -> Self {
        Self {
            stack: vec![Frame::new(container.bytes())],
            skip_nested,
        }
    }
}

impl<'a> Iterator for Cursor<'a> {
    type Item = CursorEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let skip_nested = self.skip_nested;
            let top = self.stack.last_mut()?;

            if !top.begun {
                top.begun = true;
                return Some(if top.is_array {
                    CursorEvent::BeginArray {
                        count: top.count,
                        is_scalar: top.is_scalar,
                    }
                } else {
                    CursorEvent::BeginObject { count: top.count }
                });
            }

            if top.is_array {
                if top.index >= top.count {
                    self.stack.pop();
                    return Some(CursorEvent::EndArray);
                }
                let idx = top.index;
                top.index += 1;
                let (bytes, ty) = top.child(idx);
                match ty {
                    EntryType::Nest if !skip_nested => {
                        self.stack.push(Frame::new(bytes));
                    }
                    EntryType::Nest => {
                        return Some(CursorEvent::Elem(Leaf::Binary(ContainerRef::new(bytes))));
                    }
                    leaf_ty => return Some(CursorEvent::Elem(decode_leaf(leaf_ty, bytes))),
                }
            } else {
                if top.index >= top.count {
                    self.stack.pop();
                    return Some(CursorEvent::EndObject);
                }
                if !top.awaiting_value {
                    let key_idx = top.index * 2;
                    let (key_bytes, _) = top.child(key_idx);
                    top.awaiting_value = true;
                    return Some(CursorEvent::Key(key_bytes));
                }
                let val_idx = top.index * 2 + 1;
                top.index += 1;
                top.awaiting_value = false;
                let (bytes, ty) = top.child(val_idx);
                match ty {
                    EntryType::Nest if !skip_nested => {
                        self.stack.push(Frame::new(bytes));
                    }
                    EntryType::Nest => {
                        return Some(CursorEvent::Value(Leaf::Binary(ContainerRef::new(bytes))));
                    }
                    leaf_ty => return Some(CursorEvent::Value(decode_leaf(leaf_ty, bytes))),
                }
            }
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
    fn cursor_emits_sorted_keys() {
        let c = build(vec![
            Event::BeginObject,
            Event::Key(b"b".to_vec()),
            Event::Value(Value::Numeric(b"2".to_vec())),
            Event::Key(b"a".to_vec()),
            Event::Value(Value::Numeric(b"1".to_vec())),
            Event::EndObject,
        ]);

        let cursor = Cursor::new(c.as_ref(), false);
        let keys: Vec<Vec<u8>> = cursor
            .filter_map(|ev| match ev {
                CursorEvent::Key(k) => Some(k.to_vec()),
                _ => None,
            })
            .collect();
        assert_eq!(keys, [b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn skip_nested_surfaces_binary_leaf() {
        let c = build(vec![
            Event::BeginArray { is_scalar: false },
            Event::BeginArray { is_scalar: false },
            Event::Elem(Value::Null),
            Event::EndArray,
            Event::EndArray,
        ]);

        let cursor = Cursor::new(c.as_ref(), true);
        let events: Vec<_> = cursor.collect();
        // BeginArray(outer), Elem(Binary(inner)), EndArray(outer) -- no inner
        // BeginArray/EndArray because we never descended.
        assert_eq!(events.len(), 3);
        assert!(matches!(events[1], CursorEvent::Elem(Leaf::Binary(_))));
    }

    #[test]
    fn round_trips_scalar_wrap() {
        let c = build(vec![
            Event::BeginArray { is_scalar: true },
            Event::Elem(Value::String(b"hi".to_vec())),
            Event::EndArray,
        ]);

        let mut cursor = Cursor::new(c.as_ref(), false);
        match cursor.next() {
            Some(CursorEvent::BeginArray { count, is_scalar }) => {
                assert_eq!(count, 1);
                assert!(is_scalar);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}

impl std::fmt::Debug for CursorEvent<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BeginArray { count, is_scalar } => {
                write!(f, "BeginArray{{count: {count}, is_scalar: {is_scalar}}}")
            }
            Self::BeginObject { count } => write!(f, "BeginObject{{count: {count}}}"),
            Self::Key(k) => write!(f, "Key({k:?})"),
            Self::Value(v) => write!(f, "Value({v:?})"),
            Self::Elem(v) => write!(f, "Elem({v:?})"),
            Self::EndArray => write!(f, "EndArray"),
            Self::EndObject => write!(f, "EndObject"),
        }
    }
}
