// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Push-builder state machine: turns a stream of typed events into an
//! in-memory [`Value`] tree, auto-sorting and deduplicating object keys
//! (later push wins) at `END_OBJECT`.

use crate::error::Error;
use crate::kernel::{self, Direction, UniqueMode};
use crate::value::{Pair, Value};
use std::cmp::Ordering;

/// One step of the push-builder protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    BeginArray { is_scalar: bool },
    BeginObject,
    Key(Vec<u8>),
    Value(Value),
    Elem(Value),
    EndArray,
    EndObject,
}

enum Frame {
    Array { elems: Vec<Value>, is_scalar: bool },
    Object { pairs: Vec<Pair>, pending_key: Option<Vec<u8>> },
}

/// Accumulates push events into a tree. Construct with [`Builder::new`],
/// feed events with [`Builder::push`], and retrieve the completed tree with
/// [`Builder::finish`].
pub struct Builder {
    stack: Vec<Frame>,
    order_counter: usize,
    root: Option<Value>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            order_counter: 0,
            root: None,
        }
    }

    /// Feeds one event into the state machine.
    pub fn push(&mut self, event: Event) -> Result<(), Error> {
        match event {
            Event::BeginArray { is_scalar } => {
                if self.stack.is_empty() && self.root.is_some() {
                    return Err(Error::ProtocolViolation("root already complete"));
                }
                if !self.stack.is_empty() {
                    self.expect_value_position()?;
                }
                self.stack.push(Frame::Array {
                    elems: Vec::new(),
                    is_scalar,
                });
                Ok(())
            }
            Event::BeginObject => {
                if self.stack.is_empty() && self.root.is_some() {
                    return Err(Error::ProtocolViolation("root already complete"));
                }
                if !self.stack.is_empty() {
                    self.expect_value_position()?;
                }
                self.stack.push(Frame::Object {
                    pairs: Vec::new(),
                    pending_key: None,
                });
                Ok(())
            }
            Event::Key(k) => match self.stack.last_mut() {
                Some(Frame::Object { pending_key, .. }) if pending_key.is_none() => {
                    *pending_key = Some(k);
                    Ok(())
                }
                _ => Err(Error::ProtocolViolation("KEY outside InObject(ExpectKey)")),
            },
            Event::Elem(v) => {
                Self::check_leaf(&v)?;
                match self.stack.last_mut() {
                    Some(Frame::Array { elems, .. }) => {
                        note_growth("array", elems.len(), elems.capacity());
                        elems.push(v);
                        Ok(())
                    }
                    _ => Err(Error::ProtocolViolation("ELEM outside InArray")),
                }
            }
            Event::Value(v) => {
                Self::check_leaf(&v)?;
                match self.stack.last_mut() {
                    Some(Frame::Object { pending_key, pairs }) if pending_key.is_some() => {
                        let order = self.order_counter;
                        self.order_counter += 1;
                        note_growth("object", pairs.len(), pairs.capacity());
                        pairs.push(Pair {
                            key: pending_key.take().expect("checked Some above"),
                            value: v,
                            order,
                        });
                        Ok(())
                    }
                    _ => Err(Error::ProtocolViolation("VALUE outside InObject(ExpectValue)")),
                }
            }
            Event::EndArray => {
                match self.stack.pop() {
                    Some(Frame::Array { elems, is_scalar }) => {
                        let value = Value::array(elems, is_scalar);
                        self.attach(value)
                    }
                    Some(other) => {
                        self.stack.push(other);
                        Err(Error::ProtocolViolation("END_ARRAY while InObject"))
                    }
                    None => Err(Error::ProtocolViolation("END_ARRAY at Top")),
                }
            }
            Event::EndObject => {
                match self.stack.pop() {
                    Some(Frame::Object { pairs, pending_key }) => {
                        if pending_key.is_some() {
                            self.stack.push(Frame::Object { pairs, pending_key });
                            return Err(Error::ProtocolViolation(
                                "END_OBJECT with a key missing its value",
                            ));
                        }
                        let sorted = dedupe_object(pairs);
                        self.attach(Value::object(sorted))
                    }
                    Some(other) => {
                        self.stack.push(other);
                        Err(Error::ProtocolViolation("END_OBJECT while InArray"))
                    }
                    None => Err(Error::ProtocolViolation("END_OBJECT at Top")),
                }
            }
        }
    }

    /// Returns the completed tree, or an error if the event stream never
    /// reached `Top` with exactly one value produced.
    pub fn finish(self) -> Result<Value, Error> {
        if !self.stack.is_empty() {
            return Err(Error::ProtocolViolation("event stream ended with open composites"));
        }
        self.root.ok_or(Error::ProtocolViolation("event stream produced no value"))
    }

    /// `VALUE`/`ELEM` only carry a leaf (scalar, or an already-packed
    /// `Binary` subtree); a nested `Array`/`Object` must instead go through
    /// its own `BEGIN_*`/`END_*` pair.
    fn check_leaf(v: &Value) -> Result<(), Error> {
        match v {
            Value::Array { .. } | Value::Object { .. } => Err(Error::ProtocolViolation(
                "VALUE/ELEM must carry a leaf; push nested composites via BEGIN_*/END_*",
            )),
            _ => Ok(()),
        }
    }

    /// A bare scalar at the top level must be wrapped by the caller as
    /// `BeginArray{is_scalar:true}, Elem(scalar), EndArray` (this mirrors
    /// the teacher-grounded source's own top-level scalar-wrap convention).
    fn expect_value_position(&self) -> Result<(), Error> {
        match self.stack.last() {
            Some(Frame::Array { .. }) => Ok(()),
            Some(Frame::Object { pending_key, .. }) if pending_key.is_some() => Ok(()),
            Some(Frame::Object { .. }) => {
                Err(Error::ProtocolViolation("composite pushed outside InObject(ExpectValue)"))
            }
            None => Ok(()),
        }
    }

    fn attach(&mut self, value: Value) -> Result<(), Error> {
        match self.stack.last_mut() {
            None => {
                if self.root.is_some() {
                    return Err(Error::ProtocolViolation("root already complete"));
                }
                self.root = Some(value);
                Ok(())
            }
            Some(Frame::Array { elems, .. }) => {
                note_growth("array", elems.len(), elems.capacity());
                elems.push(value);
                Ok(())
            }
            Some(Frame::Object { pending_key, pairs }) => {
                if pending_key.is_none() {
                    return Err(Error::ProtocolViolation(
                        "nested composite closed without a pending key",
                    ));
                }
                let order = self.order_counter;
                self.order_counter += 1;
                note_growth("object", pairs.len(), pairs.capacity());
                pairs.push(Pair {
                    key: pending_key.take().expect("checked Some above"),
                    value,
                    order,
                });
                Ok(())
            }
        }
    }
}

/// Logs when the next push would make a composite's backing `Vec`
/// reallocate, i.e. `len == capacity` (capacity 0 counts, since the first
/// push always allocates).
fn note_growth(what: &str, len: usize, capacity: usize) {
    if len == capacity {
        log::trace!("{what} builder growing past capacity {capacity}");
    }
}

/// Total order over keys: shorter first, then byte-compare; ties broken by
/// preferring the later push (so `END_OBJECT` keeps the last value written
/// for a repeated key).
fn key_order(a: &Pair, b: &Pair) -> Ordering {
    (a.key.len(), &a.key).cmp(&(b.key.len(), &b.key))
}

fn dedupe_object(mut pairs: Vec<Pair>) -> Vec<Pair> {
    kernel::sort(&mut pairs, Direction::Ascending, |a, b| {
        key_order(a, b).then_with(|| {
            // Later push wins: among equal keys, sort so the highest
            // `order` sorts last, then `unique` keeps the first of each
            // class... so instead we want the *last* representative kept.
            // We achieve "later wins" by reversing order within a class:
            // the highest `order` sorts first, and `unique` below keeps the
            // first representative of each equivalence class.
            b.order.cmp(&a.order)
        })
    });
    kernel::unique(&pairs, UniqueMode::KeepUniques, key_order)
}
