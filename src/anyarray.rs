// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! The any-value set: a flat, sorted, deduplicated multi-set of scalars of
//! one uniform kind, reusing the key-sorted-array kernel and the signature
//! index's bitmap machinery (`SPEC_FULL.md` §4.11).

use crate::error::Error;
use crate::index::signature::{compress, SignatureKey};
use crate::kernel::{self, Direction, UniqueMode};
use crate::resolver::ResolverCache;
use crate::value::ScalarKind;
use std::cmp::Ordering;

fn elem_cmp(kind: ScalarKind, resolver: &ResolverCache, a: &[u8], b: &[u8]) -> Result<Ordering, Error> {
    match kind {
        ScalarKind::Numeric => resolver.numeric_cmp(a, b),
        _ => Ok(a.cmp(b)),
    }
}

/// Compares two elements already known to belong to a validly-built
/// [`AnyArray`] of this `kind`. Resolution cannot fail here: the same
/// `(kind, resolver)` pair already proved comparable when the elements were
/// inserted.
fn elem_cmp_ok(kind: ScalarKind, resolver: &ResolverCache, a: &[u8], b: &[u8]) -> Ordering {
    elem_cmp(kind, resolver, a, b).expect("kind already validated against this resolver by insert")
}

fn elem_hash(kind: ScalarKind, resolver: &ResolverCache, elem: &[u8]) -> Result<u32, Error> {
    match kind {
        #[allow(clippy::cast_possible_truncation)]
        ScalarKind::Numeric => Ok(resolver.numeric_hash(elem)? as u32),
        _ => {
            let mut hasher = crc32fast::Hasher::new();
            hasher.update(elem);
            Ok(hasher.finalize())
        }
    }
}

/// A flat, sorted, deduplicated multi-set of scalars of one uniform kind. A
/// `Null` kind, or a `Null`-shaped element, is a domain violation: unlike
/// the jsonb-shaped container, this set has no way to represent an absent
/// value as a first-class member.
#[derive(Debug, Clone)]
pub struct AnyArray {
    kind: ScalarKind,
    elems: Vec<Vec<u8>>,
}

impl AnyArray {
    /// Creates an empty set of the given element kind.
    pub fn new(kind: ScalarKind) -> Result<Self, Error> {
        if kind == ScalarKind::Null {
            return Err(Error::DomainViolation("any-value set cannot hold Null"));
        }
        Ok(Self { kind, elems: Vec::new() })
    }

    /// Builds a set from an initial batch of elements, sorting and
    /// deduplicating once.
    pub fn from_elements(
        kind: ScalarKind,
        elements: Vec<Vec<u8>>,
        resolver: &ResolverCache,
    ) -> Result<Self, Error> {
        let mut set = Self::new(kind)?;
        set.elems = elements;
        set.resort(resolver)?;
        Ok(set)
    }

    /// Builds a set from a nested-array input shaped like `dims` dimensions.
    /// Only a 1-D (or 0-D, i.e. empty) input is accepted; anything deeper is
    /// a domain violation (grounded on `CHECKARRVALID` in the original
    /// source, which rejects any `anyarray` input with more than one
    /// dimension).
    pub fn from_nested(
        kind: ScalarKind,
        dims: usize,
        elements: Vec<Vec<u8>>,
        resolver: &ResolverCache,
    ) -> Result<Self, Error> {
        if dims > 1 {
            return Err(Error::DomainViolation("any-value set input must be one-dimensional"));
        }
        Self::from_elements(kind, elements, resolver)
    }

    /// Splits a flat, alternating key/value array into two parallel sets:
    /// one of keys, one of values. An odd-length input has no matching
    /// value for its last key and is a domain violation (grounded on
    /// `hstore_from_array`'s 1-D-array construction path, which rejects a
    /// flat array with an odd element count the same way).
    pub fn from_flat_pairs(
        kind: ScalarKind,
        flat: Vec<Vec<u8>>,
        resolver: &ResolverCache,
    ) -> Result<(Self, Self), Error> {
        if flat.len() % 2 != 0 {
            return Err(Error::DomainViolation(
                "flat key/value array must have an even number of elements",
            ));
        }
        let mut keys = Vec::with_capacity(flat.len() / 2);
        let mut values = Vec::with_capacity(flat.len() / 2);
        for chunk in flat.chunks_exact(2) {
            keys.push(chunk[0].clone());
            values.push(chunk[1].clone());
        }
        let keys = Self::from_elements(kind, keys, resolver)?;
        let values = Self::from_elements(kind, values, resolver)?;
        Ok((keys, values))
    }

    #[must_use]
    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    #[must_use]
    pub fn elements(&self) -> &[Vec<u8>] {
        &self.elems
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Inserts one element, re-sorting and deduplicating in place.
    pub fn insert(&mut self, elem: Vec<u8>, resolver: &ResolverCache) -> Result<(), Error> {
        self.elems.push(elem);
        self.resort(resolver)
    }

    fn resort(&mut self, resolver: &ResolverCache) -> Result<(), Error> {
        let kind = self.kind;
        let mut failure = None;
        kernel::sort(&mut self.elems, Direction::Ascending, |a, b| {
            match elem_cmp(kind, resolver, a, b) {
                Ok(ord) => ord,
                Err(e) => {
                    failure.get_or_insert(e);
                    Ordering::Equal
                }
            }
        });
        if let Some(e) = failure {
            return Err(e);
        }
        self.elems = kernel::unique(&self.elems, UniqueMode::KeepUniques, |a, b| {
            elem_cmp_ok(kind, resolver, a, b)
        });
        Ok(())
    }

    fn check_same_kind(&self, other: &Self) -> Result<(), Error> {
        if self.kind != other.kind {
            return Err(Error::DomainViolation("any-value sets of different kinds compared"));
        }
        Ok(())
    }

    fn common_count(&self, other: &Self, resolver: &ResolverCache) -> usize {
        kernel::intersect(&self.elems, &other.elems, |a, b| elem_cmp_ok(self.kind, resolver, a, b))
    }

    /// True iff every element of `other` is present in `self`.
    pub fn contains(&self, other: &Self, resolver: &ResolverCache) -> Result<bool, Error> {
        self.check_same_kind(other)?;
        Ok(self.common_count(other, resolver) == other.elems.len())
    }

    /// True iff at least one element of `other` is present in `self`.
    pub fn overlaps(&self, other: &Self, resolver: &ResolverCache) -> Result<bool, Error> {
        self.check_same_kind(other)?;
        Ok(self.common_count(other, resolver) > 0)
    }

    /// True iff `self` and `other` meet `cfg`'s similarity threshold under
    /// `cfg`'s metric.
    pub fn similar(
        &self,
        other: &Self,
        cfg: &crate::config::SimilarityConfig,
        resolver: &ResolverCache,
    ) -> Result<bool, Error> {
        use crate::config::SimilarityMetric;

        self.check_same_kind(other)?;
        let common = self.common_count(other, resolver) as f64;
        let na = self.elems.len() as f64;
        let nb = other.elems.len() as f64;

        let metric = match cfg.metric() {
            SimilarityMetric::Cosine => {
                if na > 0.0 && nb > 0.0 {
                    common / (na * nb).sqrt()
                } else {
                    0.0
                }
            }
            SimilarityMetric::Overlap => common,
            SimilarityMetric::Jaccard => {
                let union_count = na + nb - common;
                if union_count > 0.0 {
                    common / union_count
                } else {
                    0.0
                }
            }
        };

        Ok(metric >= cfg.threshold())
    }

    /// 1-based, negative-from-end sub-slice of the sorted set.
    #[must_use]
    pub fn subarray(&self, start: i64, len: i64) -> Vec<Vec<u8>> {
        kernel::subarray(&self.elems, start, len)
    }

    /// 1-based index of `needle`, or 0 if absent.
    #[must_use]
    pub fn index_of(&self, needle: &[u8], resolver: &ResolverCache) -> usize {
        kernel::binary_search(&self.elems, &needle.to_vec(), |a, b| {
            elem_cmp_ok(self.kind, resolver, a, b)
        })
    }

    /// The set's signature-index key, for GiST-shaped index support over
    /// an any-value-set column.
    pub fn signature_key(&self, resolver: &ResolverCache) -> Result<SignatureKey, Error> {
        let hashes = self
            .elems
            .iter()
            .map(|e| elem_hash(self.kind, resolver, e))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(compress(&hashes))
    }
}
