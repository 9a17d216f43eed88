use svalue::bloom::BitArray;
use svalue::index::signature::{pick_split, SignatureKey, SIGLEN_BYTES};

fn bitmap_with_bits(bits: &[usize]) -> SignatureKey {
    let mut b = BitArray::with_capacity(SIGLEN_BYTES);
    for &i in bits {
        b.set(i, true);
    }
    SignatureKey::Bitmap(b)
}

#[test_log::test]
fn pick_split_separates_the_maximal_hamming_distance_seed_pair() {
    // Four entries whose low 4 bits read 0b0011, 0b1100, 0b0101, 0b1010.
    // The first pair has the maximal pairwise Hamming distance (4), so it
    // seeds the split; the remaining two balance group sizes.
    let entries = vec![
        bitmap_with_bits(&[0, 1]), // 0b0011
        bitmap_with_bits(&[2, 3]), // 0b1100
        bitmap_with_bits(&[0, 2]), // 0b0101
        bitmap_with_bits(&[1, 3]), // 0b1010
    ];

    let split = pick_split(&entries);

    assert_eq!(split.left.len(), 2);
    assert_eq!(split.right.len(), 2);

    let left_has = |idx: usize| split.left.contains(&idx);

    // The seed pair (indices 0 and 1) must land in different groups.
    assert_ne!(left_has(0), left_has(1));
}
