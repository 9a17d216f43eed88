// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Inverted-index (token) extraction and strategy dispatch
//! (`SPEC_FULL.md` §4.8).

use crate::container::ContainerRef;
use crate::cursor::{Cursor, CursorEvent, Leaf};

/// A membership/exists query strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `left ⊇ template` — lossy; callers must recheck.
    Contains,
    /// A single key is present.
    Exists,
    /// At least one of several keys is present.
    ExistsAny,
    /// All of several keys are present.
    ExistsAll,
}

fn make_token(flag: u8, body: &[u8]) -> Vec<u8> {
    let mut token = Vec::with_capacity(1 + body.len());
    token.push(flag);
    token.extend_from_slice(body);
    token
}

/// Stringifies a scalar leaf the way the token extractor does: booleans as
/// the two ASCII bytes `" t"`/`" f"`, strings and numerics as their raw
/// bytes (numeric-to-text conversion is a host responsibility out of scope
/// here; `Numeric` payloads are assumed already text-comparable).
fn token_for_leaf(leaf: Leaf<'_>, flag: u8) -> Vec<u8> {
    match leaf {
        Leaf::Null => make_token(b'N', b""),
        Leaf::Bool(true) => make_token(flag, b" t"),
        Leaf::Bool(false) => make_token(flag, b" f"),
        Leaf::String(s) => make_token(flag, s),
        Leaf::Numeric(n) => make_token(flag, n),
        Leaf::Binary(_) => unreachable!("a non-skip-nested cursor never yields a Binary leaf"),
    }
}

/// Extracts the full token bag for `container`: one `K`-flagged token per
/// object key, one `V`-flagged token per object value, one `E`-flagged
/// token per array element, with scalar `null` always emitting a bare `N`
/// token regardless of position.
#[must_use]
pub fn extract(container: ContainerRef<'_>) -> Vec<Vec<u8>> {
    let mut tokens = Vec::new();
    for ev in Cursor::new(container, false) {
        match ev {
            CursorEvent::Key(k) => tokens.push(make_token(b'K', k)),
            CursorEvent::Value(leaf) => tokens.push(token_for_leaf(leaf, b'V')),
            CursorEvent::Elem(leaf) => tokens.push(token_for_leaf(leaf, b'E')),
            _ => {}
        }
    }
    tokens
}

/// Builds the query-side token set for a strategy. An empty result for
/// `Contains`/`ExistsAll` signals "full index scan" to the index method
/// framework.
#[must_use]
pub fn extract_query(strategy: Strategy, template: ContainerRef<'_>, keys: &[&[u8]]) -> Vec<Vec<u8>> {
    match strategy {
        Strategy::Contains => extract(template),
        Strategy::Exists => keys.first().map(|k| vec![make_token(b'K', k)]).unwrap_or_default(),
        Strategy::ExistsAny | Strategy::ExistsAll => {
            keys.iter().map(|k| make_token(b'K', k)).collect()
        }
    }
}

/// Evaluates the `consistent` callback given, for each query token, whether
/// the index reported it as present in the candidate row. Returns
/// `(matches, recheck)`.
#[must_use]
pub fn consistent(strategy: Strategy, present: &[bool]) -> (bool, bool) {
    match strategy {
        Strategy::Contains => (present.iter().all(|&p| p), true),
        Strategy::Exists | Strategy::ExistsAny => (present.iter().any(|&p| p), false),
        Strategy::ExistsAll => (present.iter().all(|&p| p), false),
    }
}

/// Per-path CRC-32 hash extractor: one integer token per leaf, computed
/// over the stack of precomputed prefix hashes from the root (array steps
/// fold in only a separator byte; object `KEY` steps fold in the key bytes
/// plus a separator).
const PATH_SEPARATOR: &[u8] = b"\0";

fn finalize_leaf(mut hasher: crc32fast::Hasher, leaf: Leaf<'_>) -> u32 {
    match leaf {
        Leaf::Null => hasher.update(b"NULL"),
        Leaf::Bool(true) => hasher.update(b" t"),
        Leaf::Bool(false) => hasher.update(b" f"),
        Leaf::String(s) => hasher.update(s),
        Leaf::Numeric(n) => hasher.update(n),
        Leaf::Binary(_) => unreachable!("a non-skip-nested cursor never yields a Binary leaf"),
    }
    hasher.finalize()
}

/// Extracts the per-path CRC-32 hash token bag for `container`.
#[must_use]
pub fn extract_path_hashes(container: ContainerRef<'_>) -> Vec<u32> {
    let mut tokens = Vec::new();
    let mut path_stack: Vec<crc32fast::Hasher> = Vec::new();
    let mut pending_key_prefix: Option<crc32fast::Hasher> = None;

    for ev in Cursor::new(container, false) {
        match ev {
            CursorEvent::BeginArray { .. } | CursorEvent::BeginObject { .. } => {
                let base = if let Some(prefix) = pending_key_prefix.take() {
                    prefix
                } else if let Some(parent) = path_stack.last() {
                    let mut h = parent.clone();
                    h.update(PATH_SEPARATOR);
                    h
                } else {
                    crc32fast::Hasher::new()
                };
                path_stack.push(base);
            }
            CursorEvent::EndArray | CursorEvent::EndObject => {
                path_stack.pop();
            }
            CursorEvent::Key(k) => {
                let mut h = path_stack
                    .last()
                    .cloned()
                    .unwrap_or_else(crc32fast::Hasher::new);
                h.update(k);
                h.update(PATH_SEPARATOR);
                pending_key_prefix = Some(h);
            }
            CursorEvent::Value(leaf) => {
                let h = pending_key_prefix
                    .take()
                    .unwrap_or_else(crc32fast::Hasher::new);
                tokens.push(finalize_leaf(h, leaf));
            }
            CursorEvent::Elem(leaf) => {
                let mut h = path_stack
                    .last()
                    .cloned()
                    .unwrap_or_else(crc32fast::Hasher::new);
                h.update(PATH_SEPARATOR);
                tokens.push(finalize_leaf(h, leaf));
            }
        }
    }

    tokens
}

/// `consistent` for the path-hash extractor: it only serves `Contains`, and
/// is always lossy (same path hash can collide across distinct key paths).
#[must_use]
pub fn consistent_path_hash(present: &[bool]) -> (bool, bool) {
    (present.iter().all(|&p| p), true)
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
    fn extracts_key_and_value_tokens() {
        let c = build(vec![
            Event::BeginObject,
            Event::Key(b"a".to_vec()),
            Event::Value(Value::Numeric(b"1".to_vec())),
            Event::Key(b"b".to_vec()),
            Event::Value(Value::String(b"t".to_vec())),
            Event::EndObject,
        ]);

        let tokens = extract(c.as_ref());
        assert_eq!(
            tokens,
            vec![
                make_token(b'K', b"a"),
                make_token(b'V', b"1"),
                make_token(b'K', b"b"),
                make_token(b'V', b"t"),
            ]
        );
    }

    #[test]
    fn null_always_emits_n_token() {
        let c = build(vec![
            Event::BeginObject,
            Event::Key(b"a".to_vec()),
            Event::Value(Value::Null),
            Event::EndObject,
        ]);

        let tokens = extract(c.as_ref());
        assert_eq!(tokens[1], make_token(b'N', b""));
    }

    #[test]
    fn consistent_contains_requires_all_present_and_rechecks() {
        assert_eq!(consistent(Strategy::Contains, &[true, true]), (true, true));
        assert_eq!(consistent(Strategy::Contains, &[true, false]), (false, true));
    }

    #[test]
    fn consistent_exists_any_all() {
        assert_eq!(consistent(Strategy::ExistsAny, &[false, true]), (true, false));
        assert_eq!(consistent(Strategy::ExistsAll, &[false, true]), (false, false));
        assert_eq!(consistent(Strategy::ExistsAll, &[true, true]), (true, false));
    }

    #[test]
    fn path_hash_distinguishes_same_value_different_keys() {
        let c = build(vec![
            Event::BeginObject,
            Event::Key(b"a".to_vec()),
            Event::Value(Value::Numeric(b"1".to_vec())),
            Event::Key(b"b".to_vec()),
            Event::Value(Value::Numeric(b"1".to_vec())),
            Event::EndObject,
        ]);

        let hashes = extract_path_hashes(c.as_ref());
        assert_eq!(hashes.len(), 2);
        assert_ne!(hashes[0], hashes[1]);
    }
}
