// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Per-`ScalarKind` comparison/hash resolution, cached once per call-site
//! (`SPEC_FULL.md` §4.10, §5).

use crate::error::Error;
use crate::value::ScalarKind;
use std::cmp::Ordering;

/// Narrow interface a host provides for one scalar kind's numeric
/// comparison/equality/hash. The only kind that needs this in practice is
/// `Numeric` (opaque arbitrary-precision decimal bytes); the other scalar
/// kinds have an obvious byte-level comparison and don't need a resolver
/// entry.
pub trait ScalarResolver: Send + Sync {
    fn numeric_cmp(&self, a: &[u8], b: &[u8]) -> Ordering;
    fn numeric_eq(&self, a: &[u8], b: &[u8]) -> bool {
        self.numeric_cmp(a, b) == Ordering::Equal
    }
    fn numeric_hash(&self, a: &[u8]) -> u64;
}

/// A resolver that treats numeric payloads as raw bytes: good enough when
/// the host's numeric encoding is already comparable byte-for-byte (fixed
/// width, big-endian). Hosts with a variable-width decimal encoding should
/// supply their own [`ScalarResolver`].
#[derive(Debug, Default)]
pub struct BytewiseNumericResolver;

impl ScalarResolver for BytewiseNumericResolver {
    fn numeric_cmp(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }

    fn numeric_hash(&self, a: &[u8]) -> u64 {
        let mut hasher = rustc_hash::FxHasher::default();
        std::hash::Hash::hash(a, &mut hasher);
        std::hash::Hasher::finish(&hasher)
    }
}

/// Caches the resolved numeric resolver so repeated comparisons in a tight
/// loop (e.g. scanning many rows) don't re-resolve on every call. The other
/// three scalar kinds compare/hash as raw bytes and never go through a
/// resolver lookup.
pub struct ResolverCache {
    numeric: Option<Box<dyn ScalarResolver>>,
}

impl Default for ResolverCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverCache {
    /// A cache with the default bytewise numeric resolver installed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            numeric: Some(Box::new(BytewiseNumericResolver)),
        }
    }

    /// A cache with no resolver installed for any kind; every
    /// `numeric_*` call misses and returns [`Error::ResolutionFailure`].
    #[must_use]
    pub fn empty() -> Self {
        Self { numeric: None }
    }

    #[must_use]
    pub fn with_numeric_resolver(resolver: Box<dyn ScalarResolver>) -> Self {
        Self { numeric: Some(resolver) }
    }

    pub fn numeric_cmp(&self, a: &[u8], b: &[u8]) -> Result<Ordering, Error> {
        Ok(self.numeric(ScalarKind::Numeric)?.numeric_cmp(a, b))
    }

    pub fn numeric_eq(&self, a: &[u8], b: &[u8]) -> Result<bool, Error> {
        Ok(self.numeric(ScalarKind::Numeric)?.numeric_eq(a, b))
    }

    pub fn numeric_hash(&self, a: &[u8]) -> Result<u64, Error> {
        Ok(self.numeric(ScalarKind::Numeric)?.numeric_hash(a))
    }

    fn numeric(&self, kind: ScalarKind) -> Result<&dyn ScalarResolver, Error> {
        match &self.numeric {
            Some(resolver) => {
                log::trace!("resolver cache hit for {kind:?}");
                Ok(resolver.as_ref())
            }
            None => {
                log::debug!("resolver cache miss for {kind:?}");
                Err(Error::ResolutionFailure(kind))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn default_numeric_resolver_compares_bytes() {
        let cache = ResolverCache::new();
        assert_eq!(cache.numeric_cmp(&[1, 2], &[1, 3]).unwrap(), Ordering::Less);
        assert!(cache.numeric_eq(&[9], &[9]).unwrap());
    }

    #[test]
    fn empty_cache_misses_numeric_lookups() {
        let cache = ResolverCache::empty();
        match cache.numeric_cmp(&[1], &[2]) {
            Err(Error::ResolutionFailure(ScalarKind::Numeric)) => {}
            other => panic!("expected ResolutionFailure, got {other:?}"),
        }
    }
}
