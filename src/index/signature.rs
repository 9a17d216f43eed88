// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Bounding-box (signature) index support: a fixed-width bitmap of leaf
//! hashes used as the key type for a spatial-tree index method
//! (`SPEC_FULL.md` §4.9).

use crate::bloom::BitArray;
use crate::config::{SimilarityConfig, SimilarityMetric};
use crate::error::Error;
use crate::kernel;

/// Width of the signature bitmap, in bits. Close to the source's
/// `SIGLENBIT` (992): wide enough that collisions are rare without
/// spilling out of an index page.
pub const SIGLEN_BITS: usize = 992;
pub const SIGLEN_BYTES: usize = SIGLEN_BITS / 8;

/// Below this element count, `consistent`'s array-vs-query intersection
/// uses a plain linear scan.
pub const SMALL_ARRAY_LINEAR_THRESHOLD: usize = 3;
/// Below this query size (with a larger array), intersection uses binary
/// search per query element instead of a sort+merge walk.
pub const SMALL_QUERY_BINARY_THRESHOLD: usize = 5;

/// The key type stored at signature-index entries.
#[derive(Debug, Clone, PartialEq)]
pub enum SignatureKey {
    /// Leaf entry: sorted, deduplicated hashes of each scalar leaf.
    Array(Vec<u32>),
    /// Inner-page entry: a fixed-width bitmap, one bit per `hash % SIGLEN_BITS`.
    Bitmap(BitArray),
    /// Degenerate bitmap that has saturated to all-ones.
    AllTrue,
}

fn hash_to_bit(hash: u32) -> usize {
    (hash as usize) % SIGLEN_BITS
}

fn bitmap_from_hashes(hashes: &[u32]) -> BitArray {
    let mut bits = BitArray::with_capacity(SIGLEN_BYTES);
    for &h in hashes {
        bits.set(hash_to_bit(h), true);
    }
    bits
}

fn to_bitmap(key: &SignatureKey) -> BitArray {
    match key {
        SignatureKey::Bitmap(bits) => bits.clone(),
        SignatureKey::Array(hashes) => bitmap_from_hashes(hashes),
        SignatureKey::AllTrue => {
            let mut bits = BitArray::with_capacity(SIGLEN_BYTES);
            for i in 0..bits.bit_len() {
                bits.set(i, true);
            }
            bits
        }
    }
}

fn dedup_sorted(hashes: &[u32]) -> Vec<u32> {
    let mut sorted = hashes.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
}

/// Compresses a leaf's scalar hashes into a key: stays an `Array` while
/// small, converts to a `Bitmap` once the array representation would be
/// larger than the bitmap, then collapses to `AllTrue` on saturation.
#[must_use]
pub fn compress(hashes: &[u32]) -> SignatureKey {
    let sorted = dedup_sorted(hashes);
    let array_bytes = sorted.len() * std::mem::size_of::<u32>();
    if array_bytes <= SIGLEN_BYTES {
        return SignatureKey::Array(sorted);
    }
    let bits = bitmap_from_hashes(&sorted);
    if bits.is_saturated() {
        log::debug!("signature compressed {} hashes into AllTrue", sorted.len());
        SignatureKey::AllTrue
    } else {
        SignatureKey::Bitmap(bits)
    }
}

/// Bitwise-ORs a set of keys. `AllTrue` is absorbing.
#[must_use]
pub fn union(entries: &[SignatureKey]) -> SignatureKey {
    if entries.iter().any(|e| matches!(e, SignatureKey::AllTrue)) {
        return SignatureKey::AllTrue;
    }
    let mut acc = BitArray::with_capacity(SIGLEN_BYTES);
    for entry in entries {
        acc.or_with(&to_bitmap(entry));
    }
    if acc.is_saturated() {
        log::debug!("union of {} signature entries saturated to AllTrue", entries.len());
        SignatureKey::AllTrue
    } else {
        SignatureKey::Bitmap(acc)
    }
}

/// Hamming distance between two keys, with `AllTrue` treated as a bitmap of
/// all ones.
#[must_use]
pub fn penalty(orig: &SignatureKey, new: &SignatureKey) -> u32 {
    match (orig, new) {
        (SignatureKey::AllTrue, SignatureKey::AllTrue) => 0,
        (SignatureKey::AllTrue, other) | (other, SignatureKey::AllTrue) => {
            SIGLEN_BITS as u32 - to_bitmap(other).count_ones()
        }
        (a, b) => to_bitmap(a).hamming_distance(&to_bitmap(b)),
    }
}

/// Equality, with `AllTrue` only equal to `AllTrue`.
#[must_use]
pub fn same(a: &SignatureKey, b: &SignatureKey) -> bool {
    match (a, b) {
        (SignatureKey::AllTrue, SignatureKey::AllTrue) => true,
        (SignatureKey::AllTrue, _) | (_, SignatureKey::AllTrue) => false,
        (SignatureKey::Array(x), SignatureKey::Array(y)) => x == y,
        _ => to_bitmap(a) == to_bitmap(b),
    }
}

/// `WISH_F(a, b, c) = -((a - b)^3) * c`, the penalty's tie-break: mildly
/// discourages growing the side that is already larger.
fn wish(a: i64, b: i64, c: i64) -> i64 {
    -((a - b).pow(3)) * c
}

/// Result of [`pick_split`]: which original indices went to each side, and
/// the union key each side should be stored under.
#[derive(Debug, Clone)]
pub struct PickSplit {
    pub left: Vec<usize>,
    pub right: Vec<usize>,
    pub left_key: SignatureKey,
    pub right_key: SignatureKey,
}

/// Splits `entries` into two groups for a page split: seeds are the pair
/// with maximum Hamming distance; the rest are assigned, in descending
/// order of `|dist(seed_l) - dist(seed_r)|`, to whichever side's running
/// union they are closer to, ties broken toward the smaller side.
///
/// # Panics
/// Panics if `entries` has fewer than two elements.
#[must_use]
pub fn pick_split(entries: &[SignatureKey]) -> PickSplit {
    let n = entries.len();
    assert!(n >= 2, "pick_split needs at least two entries");

    let bitmaps: Vec<BitArray> = entries.iter().map(to_bitmap).collect();

    let mut seed = (0usize, 1usize, 0u32);
    for i in 0..n {
        for j in (i + 1)..n {
            let d = bitmaps[i].hamming_distance(&bitmaps[j]);
            if d > seed.2 {
                seed = (i, j, d);
            }
        }
    }
    let (seed_l, seed_r, _) = seed;

    let mut left = vec![seed_l];
    let mut right = vec![seed_r];
    let mut left_union = bitmaps[seed_l].clone();
    let mut right_union = bitmaps[seed_r].clone();
    let mut left_all_true = matches!(entries[seed_l], SignatureKey::AllTrue);
    let mut right_all_true = matches!(entries[seed_r], SignatureKey::AllTrue);

    let mut rest: Vec<usize> = (0..n).filter(|&k| k != seed_l && k != seed_r).collect();
    rest.sort_by(|&a, &b| {
        let cost = |k: usize| -> i64 {
            let dl = bitmaps[k].hamming_distance(&bitmaps[seed_l]) as i64;
            let dr = bitmaps[k].hamming_distance(&bitmaps[seed_r]) as i64;
            (dl - dr).abs()
        };
        cost(b).cmp(&cost(a))
    });

    for k in rest {
        let dist_l = bitmaps[k].hamming_distance(&left_union);
        let dist_r = bitmaps[k].hamming_distance(&right_union);

        let go_left = if dist_l != dist_r {
            dist_l < dist_r
        } else {
            wish(left.len() as i64, right.len() as i64, 1) >= wish(right.len() as i64, left.len() as i64, 1)
        };

        if go_left {
            left.push(k);
            left_union.or_with(&bitmaps[k]);
            left_all_true |= matches!(entries[k], SignatureKey::AllTrue);
        } else {
            right.push(k);
            right_union.or_with(&bitmaps[k]);
            right_all_true |= matches!(entries[k], SignatureKey::AllTrue);
        }
    }

    let finalize = |all_true: bool, bits: BitArray| {
        if all_true || bits.is_saturated() {
            SignatureKey::AllTrue
        } else {
            SignatureKey::Bitmap(bits)
        }
    };

    PickSplit {
        left,
        right,
        left_key: finalize(left_all_true, left_union),
        right_key: finalize(right_all_true, right_union),
    }
}

/// Strategy for the `consistent` callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Overlap,
    Contains,
    ContainedBy,
    Same,
    Similarity,
}

fn count_common(entry: &SignatureKey, query: &[u32]) -> usize {
    match entry {
        SignatureKey::AllTrue => dedup_sorted(query).len(),
        SignatureKey::Bitmap(bits) => query.iter().filter(|&&h| bits.get(hash_to_bit(h))).count(),
        SignatureKey::Array(arr) => {
            if arr.len() <= SMALL_ARRAY_LINEAR_THRESHOLD {
                query.iter().filter(|h| arr.contains(h)).count()
            } else if query.len() < SMALL_QUERY_BINARY_THRESHOLD {
                query.iter().filter(|h| arr.binary_search(h).is_ok()).count()
            } else {
                let sorted_query = dedup_sorted(query);
                kernel::intersect(arr, &sorted_query, |a, b| a.cmp(b))
            }
        }
    }
}

/// Evaluates the `consistent` callback for one index entry against a query
/// hash set. `is_leaf` distinguishes a leaf-page exact estimate from an
/// inner-page (union/signature) estimate, which matters for `Similarity`.
pub fn consistent(
    entry: &SignatureKey,
    query: &[u32],
    strategy: Strategy,
    cfg: &SimilarityConfig,
    is_leaf: bool,
) -> Result<(bool, bool), Error> {
    match strategy {
        Strategy::Overlap => Ok((count_common(entry, query) > 0, false)),
        Strategy::Contains => {
            let distinct = dedup_sorted(query).len();
            Ok((count_common(entry, query) == distinct, true))
        }
        Strategy::ContainedBy => {
            let query_bits = bitmap_from_hashes(query);
            let entry_bits = to_bitmap(entry);
            Ok((entry_bits.is_subset_of(&query_bits), true))
        }
        Strategy::Same => {
            let query_key = compress(query);
            Ok((same(entry, &query_key), true))
        }
        Strategy::Similarity => {
            let common = count_common(entry, query) as f64;
            let na = match entry {
                SignatureKey::Array(a) => a.len() as f64,
                SignatureKey::Bitmap(b) => f64::from(b.count_ones()),
                SignatureKey::AllTrue => SIGLEN_BITS as f64,
            };
            let nb = dedup_sorted(query).len() as f64;

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
                    if !is_leaf {
                        return Err(Error::UnsupportedSimilarity(
                            "jaccard has no inner-page (signature) estimate",
                        ));
                    }
                    let union_count = na + nb - common;
                    if union_count > 0.0 {
                        common / union_count
                    } else {
                        0.0
                    }
                }
            };

            Ok((metric >= cfg.threshold(), true))
        }
    }
}
