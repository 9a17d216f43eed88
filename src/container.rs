// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! The opaque, immutable, packed container type, and its wire format.

use crate::coding::{Decode, DecodeError, Encode, EncodeError};
use crate::layout::{end_pos, header_count, header_is_array, header_is_object, off, type_of, EntryType};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};
use std::sync::Arc;

/// An immutable, cheaply-clonable packed container. Owns its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container(Arc<[u8]>);

impl Container {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }

    #[must_use]
    pub fn as_ref(&self) -> ContainerRef<'_> {
        ContainerRef(&self.0)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serializes the container for the wire: a 32-bit little-endian byte
    /// length, followed by the container's own bytes (which already begin
    /// with the composite header word).
    #[must_use]
    pub fn send(&self) -> Vec<u8> {
        self.encode_into_vec()
    }

    /// Reads a wire-format buffer produced by [`Container::send`], walking
    /// the root composite recursively (and every `Nest` child beneath it) to
    /// validate the header/entries/payload structure before trusting it. If
    /// neither `IS_ARRAY` nor `IS_OBJECT` is set in the root header, this is
    /// a legacy pre-versioned container; see [`recv_legacy`].
    pub fn recv(buf: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = buf;
        Self::decode_from(&mut reader).map_err(|e| match e {
            crate::Error::Decode(d) => d,
            other => DecodeError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, other.to_string())),
        })
    }
}

impl Encode for Container {
    fn encode_into<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError> {
        writer.write_u32::<LittleEndian>(self.0.len() as u32)?;
        writer.write_all(&self.0)?;
        Ok(())
    }
}

impl Decode for Container {
    fn decode_from<R: Read>(reader: &mut R) -> Result<Self, crate::Error> {
        let declared_len = reader.read_u32::<LittleEndian>().map_err(DecodeError::from)? as usize;
        let mut body = vec![0u8; declared_len];
        reader.read_exact(&mut body).map_err(DecodeError::from)?;
        if body.len() < 4 {
            return Err(DecodeError::InvalidHeader("Container").into());
        }
        validate_composite(&body)?;
        Ok(Self::new(body))
    }
}

/// Recursively walks a composite's header/entries/payload, checking every
/// child's span lies within the payload and that every `Null` entry carries
/// a zero-length span (the packed analogue of hstore's `-1`-is-null wire
/// convention: see `recvHStoreValue` in the grounding source), recursing
/// into `Nest` children instead of trusting their declared length blindly.
fn validate_composite(bytes: &[u8]) -> Result<(), DecodeError> {
    if bytes.len() < 4 {
        return Err(DecodeError::UnexpectedEof);
    }
    let header = LittleEndian::read_u32(&bytes[0..4]);
    let count = header_count(header);
    let n_entries = if header_is_array(header) { count } else { count * 2 };
    let entries_end = 4 + n_entries * 4;
    let entry_bytes = bytes.get(4..entries_end).ok_or(DecodeError::UnexpectedEof)?;
    let entries: Vec<u32> = entry_bytes.chunks_exact(4).map(LittleEndian::read_u32).collect();
    let payload = &bytes[entries_end..];

    for (i, entry) in entries.iter().enumerate() {
        let start = off(&entries, i) as usize;
        let end = end_pos(*entry) as usize;
        let child = payload.get(start..end).ok_or(DecodeError::UnexpectedEof)?;
        match type_of(*entry) {
            EntryType::Null => {
                if !child.is_empty() {
                    return Err(DecodeError::InvalidHeader("Container"));
                }
            }
            EntryType::Nest => validate_composite(child)?,
            EntryType::String | EntryType::Numeric | EntryType::False | EntryType::True => {}
        }
    }
    Ok(())
}

impl AsRef<[u8]> for Container {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Container {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

/// A zero-copy, borrowed view of a [`Container`]'s bytes, for read paths
/// that don't need ownership (the forward cursor, search, index extraction).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerRef<'a>(&'a [u8]);

impl<'a> ContainerRef<'a> {
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn bytes(&self) -> &'a [u8] {
        self.0
    }

    #[must_use]
    pub fn header(&self) -> u32 {
        LittleEndian::read_u32(&self.0[0..4])
    }

    #[must_use]
    pub fn to_owned(&self) -> Container {
        Container::new(self.0.to_vec())
    }
}

/// Migrates a legacy (pre-versioned) container buffer, whose root header had
/// neither `IS_ARRAY` nor `IS_OBJECT` set, into the current layout by
/// inferring `IS_OBJECT` for historical compatibility. Returns the buffer
/// unchanged (as a fresh `Container`) if it already carries a valid header.
pub fn recv_legacy(buf: &[u8]) -> Result<Container, DecodeError> {
    if buf.len() < 4 {
        return Err(DecodeError::UnexpectedEof);
    }
    let header = LittleEndian::read_u32(&buf[0..4]);
    if header_is_array(header) || header_is_object(header) {
        return Ok(Container::new(buf.to_vec()));
    }

    let mut out = buf.to_vec();
    let fixed = header | crate::layout::HEADER_IS_OBJECT;
    LittleEndian::write_u32(&mut out[0..4], fixed);
    Ok(Container::new(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::make_header;
    use test_log::test;

    #[test]
    fn send_recv_round_trip() {
        let header = make_header(0, true, false);
        let mut bytes = vec![0u8; 4];
        LittleEndian::write_u32(&mut bytes, header);
        let c = Container::new(bytes);

        let wire = c.send();
        let back = Container::recv(&wire).expect("should decode");
        assert_eq!(c, back);
    }

    #[test]
    fn legacy_header_infers_object() {
        let bytes = vec![0u8; 4]; // header == 0: neither array nor object
        let migrated = recv_legacy(&bytes).expect("should migrate");
        assert!(header_is_object(migrated.as_ref().header()));
    }

    #[test]
    fn recv_rejects_entry_span_past_payload() {
        use crate::layout::{make_entry, EntryType};

        let header = make_header(1, true, false);
        let mut bytes = vec![0u8; 4];
        LittleEndian::write_u32(&mut bytes, header);
        // Declares a 100-byte string but the payload is empty.
        let entry = make_entry(true, EntryType::String, 100);
        let mut entry_bytes = [0u8; 4];
        LittleEndian::write_u32(&mut entry_bytes, entry);
        bytes.extend_from_slice(&entry_bytes);

        let c = Container::new(bytes);
        assert!(Container::recv(&c.send()).is_err());
    }

    #[test]
    fn recv_recurses_into_nested_composite() {
        use crate::value::{Pair, Value};

        let inner = Value::object(vec![Pair {
            key: b"k".to_vec(),
            value: Value::Numeric(b"1".to_vec()),
            order: 0,
        }]);
        let outer = Value::array(vec![inner], false);
        let c = crate::compactor::compact(&outer).expect("compacts");

        let back = Container::recv(&c.send()).expect("recursive validation accepts it");
        assert_eq!(c, back);
    }
}
