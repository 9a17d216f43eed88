// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Single-pass depth-first compaction of an in-memory [`Value`] tree into
//! the packed container format (`SPEC_FULL.md` §4.4).

use crate::container::Container;
use crate::error::Error;
use crate::layout::{align4, make_entry, make_header, EntryType, MAX_POS};
use crate::value::{Pair, Value};

/// Compacts a top-level array or object into a packed [`Container`].
///
/// A bare top-level scalar must first be wrapped by the builder as a
/// one-element `is_scalar` array (see `builder::Event::BeginArray`); passing
/// a bare scalar here is a domain violation.
pub fn compact(value: &Value) -> Result<Container, Error> {
    let bound = value.size_bound();
    let mut buf = Vec::new();
    match value {
        Value::Array { elems, is_scalar, .. } => compact_array_into(&mut buf, elems, *is_scalar)?,
        Value::Object { pairs, .. } => compact_object_into(&mut buf, pairs)?,
        _ => {
            return Err(Error::DomainViolation(
                "compactor root must be an array or object",
            ))
        }
    }
    log::debug!("checking compacted size {} against bound {bound}", buf.len());
    if buf.len() as u32 > bound {
        return Err(Error::Invariant("compacted container exceeded its precomputed size bound"));
    }
    log::trace!("compacted container of {} bytes", buf.len());
    Ok(Container::new(buf))
}

fn push_end(len: usize) -> Result<u32, Error> {
    let end = u32::try_from(len).map_err(|_| Error::TooLarge("container payload"))?;
    if end > MAX_POS {
        return Err(Error::TooLarge("container payload exceeds POSMASK"));
    }
    Ok(end)
}

fn compact_value_into(payload: &mut Vec<u8>, value: &Value) -> Result<EntryType, Error> {
    match value {
        Value::Null => Ok(EntryType::Null),
        Value::Bool(true) => Ok(EntryType::True),
        Value::Bool(false) => Ok(EntryType::False),
        Value::String(bytes) => {
            push_end(bytes.len())?;
            payload.extend_from_slice(bytes);
            Ok(EntryType::String)
        }
        Value::Numeric(bytes) => {
            align4(payload);
            payload.extend_from_slice(bytes);
            Ok(EntryType::Numeric)
        }
        Value::Array { elems, is_scalar, .. } => {
            align4(payload);
            compact_array_into(payload, elems, *is_scalar)?;
            Ok(EntryType::Nest)
        }
        Value::Object { pairs, .. } => {
            align4(payload);
            compact_object_into(payload, pairs)?;
            Ok(EntryType::Nest)
        }
        Value::Binary(container) => {
            align4(payload);
            payload.extend_from_slice(container.as_bytes());
            Ok(EntryType::Nest)
        }
    }
}

fn compact_array_into(payload: &mut Vec<u8>, elems: &[Value], is_scalar: bool) -> Result<(), Error> {
    let count = u32::try_from(elems.len()).map_err(|_| Error::TooLarge("array element count"))?;

    let mut sub_payload = Vec::new();
    let mut entries = Vec::with_capacity(elems.len());
    for elem in elems {
        let ty = compact_value_into(&mut sub_payload, elem)?;
        let end = push_end(sub_payload.len())?;
        entries.push(make_entry(entries.is_empty(), ty, end));
    }

    let header = make_header(count, true, is_scalar);
    payload.extend_from_slice(&header.to_le_bytes());
    for entry in &entries {
        payload.extend_from_slice(&entry.to_le_bytes());
    }
    payload.extend_from_slice(&sub_payload);
    Ok(())
}

fn compact_object_into(payload: &mut Vec<u8>, pairs: &[Pair]) -> Result<(), Error> {
    let count = u32::try_from(pairs.len()).map_err(|_| Error::TooLarge("object pair count"))?;

    let mut sub_payload = Vec::new();
    let mut entries = Vec::with_capacity(pairs.len() * 2);
    for pair in pairs {
        push_end(pair.key.len())?;
        sub_payload.extend_from_slice(&pair.key);
        let key_end = push_end(sub_payload.len())?;
        entries.push(make_entry(entries.is_empty(), EntryType::String, key_end));

        let ty = compact_value_into(&mut sub_payload, &pair.value)?;
        let val_end = push_end(sub_payload.len())?;
        entries.push(make_entry(false, ty, val_end));
    }

    let header = make_header(count, false, false);
    payload.extend_from_slice(&header.to_le_bytes());
    for entry in &entries {
        payload.extend_from_slice(&entry.to_le_bytes());
    }
    payload.extend_from_slice(&sub_payload);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{header_count, header_is_array, header_is_object, header_is_scalar};
    use byteorder::{ByteOrder, LittleEndian};
    use test_log::test;

    #[test]
    fn compacts_scalar_wrapped_array() {
        let v = Value::array(vec![Value::String(b"hi".to_vec())], true);
        let c = compact(&v).unwrap();
        let header = LittleEndian::read_u32(&c.as_bytes()[0..4]);
        assert!(header_is_array(header));
        assert!(header_is_scalar(header));
        assert_eq!(header_count(header), 1);
    }

    #[test]
    fn compacts_object_with_two_keys() {
        let v = Value::object(vec![
            Pair { key: b"a".to_vec(), value: Value::Numeric(b"1".to_vec()), order: 0 },
            Pair { key: b"b".to_vec(), value: Value::Numeric(b"2".to_vec()), order: 1 },
        ]);
        let c = compact(&v).unwrap();
        let header = LittleEndian::read_u32(&c.as_bytes()[0..4]);
        assert!(header_is_object(header));
        assert_eq!(header_count(header), 2);
    }

    #[test]
    fn rejects_bare_scalar_root() {
        let v = Value::Null;
        assert!(compact(&v).is_err());
    }

    #[test]
    fn rejects_understated_size_bound() {
        let v = Value::Array {
            elems: vec![Value::String(b"much too long for this bound".to_vec())],
            is_scalar: true,
            size: 1,
        };
        match compact(&v) {
            Err(Error::Invariant(_)) => {}
            other => panic!("expected Invariant error, got {other:?}"),
        }
    }
}
