// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! In-memory tree model produced by the push-builder and consumed by the
//! compactor and the packed walker.

use crate::container::Container;

/// Discriminant used by the scalar resolver and by `compare_value`'s
/// variant ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Null,
    String,
    Numeric,
    Bool,
}

/// A fully in-memory, unpacked value tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    /// Opaque arbitrary-precision decimal payload; compared and hashed via
    /// the scalar resolver, never interpreted directly by this crate.
    Numeric(Vec<u8>),
    String(Vec<u8>),
    Array {
        elems: Vec<Value>,
        /// Set only on a root array wrapping a single scalar.
        is_scalar: bool,
        /// Cumulative upper bound, in bytes, on this subtree's compacted
        /// size (§4.4's pre-computed bound); see [`Value::array`].
        size: u32,
    },
    Object {
        pairs: Vec<Pair>,
        /// Cumulative upper bound, in bytes, on this subtree's compacted
        /// size; see [`Value::object`].
        size: u32,
    },
    /// An already-packed subtree, nested without re-walking it.
    Binary(Container),
}

/// A single key/value pair inside an in-memory object, before sorting.
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub key: Vec<u8>,
    pub value: Value,
    /// Monotonically increasing push order, used to break ties in favor of
    /// the later push when two keys compare equal (see `builder::dedupe`).
    pub order: usize,
}

impl Value {
    #[must_use]
    pub fn kind(&self) -> ScalarKindOrComposite {
        match self {
            Self::Null => ScalarKindOrComposite::Scalar(ScalarKind::Null),
            Self::Bool(_) => ScalarKindOrComposite::Scalar(ScalarKind::Bool),
            Self::Numeric(_) => ScalarKindOrComposite::Scalar(ScalarKind::Numeric),
            Self::String(_) => ScalarKindOrComposite::Scalar(ScalarKind::String),
            Self::Array { .. } => ScalarKindOrComposite::Array,
            Self::Object { .. } => ScalarKindOrComposite::Object,
            Self::Binary(_) => ScalarKindOrComposite::Binary,
        }
    }

    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(self.kind(), ScalarKindOrComposite::Scalar(_))
    }

    /// Builds an array value, computing its cumulative size bound from its
    /// (already-sized, if composite) elements.
    #[must_use]
    pub fn array(elems: Vec<Value>, is_scalar: bool) -> Self {
        let size = 4 + 4 * elems.len() as u32 + elems.iter().map(leaf_contribution).sum::<u32>();
        Self::Array { elems, is_scalar, size }
    }

    /// Builds an object value, computing its cumulative size bound from its
    /// (already-sized, if composite) pairs.
    #[must_use]
    pub fn object(pairs: Vec<Pair>) -> Self {
        let size = 4
            + 8 * pairs.len() as u32
            + pairs
                .iter()
                .map(|p| p.key.len() as u32 + leaf_contribution(&p.value))
                .sum::<u32>();
        Self::Object { pairs, size }
    }

    /// The pre-computed upper bound (§4.4) on this value's compacted size,
    /// in bytes. Only meaningful for a composite root; the compactor only
    /// ever accepts an `Array`/`Object` at the top level.
    #[must_use]
    pub fn size_bound(&self) -> u32 {
        match self {
            Self::Array { size, .. } | Self::Object { size, .. } => *size,
            other => leaf_contribution(other),
        }
    }
}

/// Upper bound, in bytes, on what the compactor will emit for `value` as one
/// child of its parent: the entry descriptor's own contribution is charged
/// by the caller, this covers the payload plus a 4-byte alignment slack
/// (the compactor only knows the exact padding once it knows the running
/// buffer position, so this conservatively charges the worst case).
fn leaf_contribution(value: &Value) -> u32 {
    match value {
        Value::Null | Value::Bool(_) => 0,
        Value::String(bytes) => bytes.len() as u32,
        Value::Numeric(bytes) => bytes.len() as u32 + 3,
        Value::Array { size, .. } | Value::Object { size, .. } => *size + 3,
        Value::Binary(container) => container.len() as u32 + 3,
    }
}

/// Either one of the four scalar kinds or one of the three composite kinds,
/// used for the variant ranking in `compare_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKindOrComposite {
    Scalar(ScalarKind),
    Array,
    Object,
    Binary,
}

impl ScalarKindOrComposite {
    /// Rank used for the total order across variants:
    /// `Null < String < Numeric < Bool < Array < Object < Binary`.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Scalar(ScalarKind::Null) => 0,
            Self::Scalar(ScalarKind::String) => 1,
            Self::Scalar(ScalarKind::Numeric) => 2,
            Self::Scalar(ScalarKind::Bool) => 3,
            Self::Array => 4,
            Self::Object => 5,
            Self::Binary => 6,
        }
    }
}
