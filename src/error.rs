// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::coding::{DecodeError, EncodeError};
use crate::value::ScalarKind;

/// Errors that can occur while building, compacting, or querying a container.
#[derive(Debug)]
pub enum Error {
    /// Serialization failed
    Encode(EncodeError),

    /// Deserialization failed
    Decode(DecodeError),

    /// A push-builder event was illegal in the builder's current state
    ProtocolViolation(&'static str),

    /// A key or element count exceeded the 28-bit `POSMASK` limit
    TooLarge(&'static str),

    /// An array/object-shaped input violated a domain constraint (e.g. a
    /// null pushed into the any-value set, or an odd-length key/value list)
    DomainViolation(&'static str),

    /// No `cmp`/`hash`/`numeric_cmp`/`numeric_eq` function is registered for
    /// this scalar kind
    ResolutionFailure(ScalarKind),

    /// The requested similarity metric has no inner-page (signature) estimate
    UnsupportedSimilarity(&'static str),

    /// An internal bound or assertion was violated; indicates a bug in this
    /// crate rather than bad input
    Invariant(&'static str),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContainerError: {self:?}")
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(e) => Some(e),
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EncodeError> for Error {
    fn from(value: EncodeError) -> Self {
        Self::Encode(value)
    }
}

impl From<DecodeError> for Error {
    fn from(value: DecodeError) -> Self {
        Self::Decode(value)
    }
}

/// Container result
pub type Result<T> = std::result::Result<T, Error>;
