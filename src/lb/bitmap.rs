//! Bitmap filter lower bound (C7): folds every node's label id into a
//! fixed-size bit array and uses the symmetric difference between the two
//! trees' bitmaps as a cheap, size-bounded lower bound on TED. Grounded on
//! `ted_lb/bitmap_filter[_impl].h`'s three bit-setting policies (`set`,
//! `xor`, linear-probe "next empty") and its JSON-aware variant that splits
//! the bitmap into a keys bitmap and a literals bitmap, counting objects and
//! arrays exactly instead of hashing them.
//!
//! Lower bound proof sketch (same as the label-intersection LB this
//! generalizes): folding distinct labels into `size` buckets can only ever
//! merge labels together, never split one label across two bits, so the
//! popcount of the symmetric difference never *overstates* the number of
//! label positions the two trees disagree on -- the bound stays valid, just
//! looser than the exact per-label histogram as `size` shrinks.

use crate::indexing::{JsonNodeType, TreeIndex};

/// Default total bitmap size, matching the reference implementation's
/// parameterless entry point.
pub const DEFAULT_BITMAP_SIZE: usize = 1024;

/// How repeated label ids collide into the same bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitPolicy {
    /// Plain set: once a bit is set it stays set (`ted2`/`ted3`).
    Set,
    /// Flip on every occurrence (`ted4`/`ted5`).
    Xor,
    /// Linear probing to the next unset bit, wrapping around; once every
    /// bit is occupied, further collisions are dropped (`ted6`/`ted7`).
    LinearProbe,
}

fn apply_bit(bitmap: &mut [bool], pos: usize, policy: BitPolicy) {
    match policy {
        BitPolicy::Set => bitmap[pos] = true,
        BitPolicy::Xor => bitmap[pos] = !bitmap[pos],
        BitPolicy::LinearProbe => {
            let size = bitmap.len();
            let mut probe = pos;
            let mut steps = 0;
            while bitmap[probe] && steps < size {
                probe = (probe + 1) % size;
                steps += 1;
            }
            if steps != size {
                bitmap[probe] = true;
            }
        }
    }
}

fn popcount_xor(a: &[bool], b: &[bool]) -> usize {
    a.iter().zip(b.iter()).filter(|(x, y)| x != y).count()
}

fn bound_from_mismatch(size1: usize, size2: usize, mismatch: usize) -> f64 {
    let bigger = size1.max(size2);
    let overlap = (size1 + size2).saturating_sub(mismatch) / 2;
    bigger.saturating_sub(overlap) as f64
}

/// Plain bitmap filter over every node's label id (`ted2`/`ted4`/`ted6`
/// depending on `policy`), with `size` bits total.
pub fn bitmap_filter(t1: &TreeIndex, t2: &TreeIndex, size: usize, policy: BitPolicy) -> f64 {
    let mut bmp1 = vec![false; size];
    let mut bmp2 = vec![false; size];
    for &label in &t1.postl_to_label_id {
        apply_bit(&mut bmp1, label as usize % size, policy);
    }
    for &label in &t2.postl_to_label_id {
        apply_bit(&mut bmp2, label as usize % size, policy);
    }
    bound_from_mismatch(t1.c.tree_size, t2.c.tree_size, popcount_xor(&bmp1, &bmp2))
}

/// JSON-aware bitmap filter (`ted3`/`ted5`/`ted7` depending on `policy`):
/// keys and literals each get their own half-size bitmap, while objects and
/// arrays contribute their exact count difference instead of a hashed bit,
/// since there's no label to hash for them beyond their type.
pub fn bitmap_filter_json(t1: &TreeIndex, t2: &TreeIndex, size: usize, policy: BitPolicy) -> f64 {
    let bitmap_size = size.div_ceil(2).max(1);
    let mut key_bmp1 = vec![false; bitmap_size];
    let mut key_bmp2 = vec![false; bitmap_size];
    let mut lit_bmp1 = vec![false; bitmap_size];
    let mut lit_bmp2 = vec![false; bitmap_size];
    let (mut obj1, mut obj2, mut arr1, mut arr2) = (0i64, 0i64, 0i64, 0i64);

    for (&label, ty) in t1.postl_to_label_id.iter().zip(t1.postl_to_type.iter()) {
        match ty {
            JsonNodeType::Object => obj1 += 1,
            JsonNodeType::Array => arr1 += 1,
            JsonNodeType::Key => apply_bit(&mut key_bmp1, label as usize % bitmap_size, policy),
            JsonNodeType::Value => apply_bit(&mut lit_bmp1, label as usize % bitmap_size, policy),
        }
    }
    for (&label, ty) in t2.postl_to_label_id.iter().zip(t2.postl_to_type.iter()) {
        match ty {
            JsonNodeType::Object => obj2 += 1,
            JsonNodeType::Array => arr2 += 1,
            JsonNodeType::Key => apply_bit(&mut key_bmp2, label as usize % bitmap_size, policy),
            JsonNodeType::Value => apply_bit(&mut lit_bmp2, label as usize % bitmap_size, policy),
        }
    }

    let mismatch = popcount_xor(&key_bmp1, &key_bmp2)
        + popcount_xor(&lit_bmp1, &lit_bmp2)
        + (obj1 - obj2).unsigned_abs() as usize
        + (arr1 - arr2).unsigned_abs() as usize;
    bound_from_mismatch(t1.c.tree_size, t2.c.tree_size, mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexing::Indexer;
    use crate::parsing::{parse_single, LabelDict};

    fn index(tree_str: &str) -> TreeIndex {
        let mut ld = LabelDict::new();
        let tree = parse_single(tree_str.to_owned(), &mut ld);
        TreeIndex::index_tree(&tree, &ld)
    }

    #[test]
    fn identical_trees_bound_at_zero() {
        let t1 = index("{a{b}{c}}");
        let t2 = index("{a{b}{c}}");
        for policy in [BitPolicy::Set, BitPolicy::Xor, BitPolicy::LinearProbe] {
            assert_eq!(bitmap_filter(&t1, &t2, DEFAULT_BITMAP_SIZE, policy), 0.0);
        }
    }

    #[test]
    fn disjoint_labels_bound_is_positive() {
        let t1 = index("{a{b}}");
        let t2 = index("{x{y}}");
        assert!(bitmap_filter(&t1, &t2, DEFAULT_BITMAP_SIZE, BitPolicy::Set) > 0.0);
    }

    #[test]
    fn bound_never_exceeds_label_intersection_lower_bound() {
        // A small bitmap can only ever merge labels together (hash
        // collisions), never separate one label's occurrences across two
        // bits, so folding can only make the bound looser, never tighter,
        // than the exact per-label histogram bound.
        use crate::indexing::InvertedListLabelPostorderIndex;
        let mut ld = LabelDict::new();
        let tree1 = parse_single("{a{b{d}{e}}{c}}".to_owned(), &mut ld);
        let tree2 = parse_single("{a{b}{c{f}{g}}}".to_owned(), &mut ld);
        let t1 = TreeIndex::index_tree(&tree1, &ld);
        let t2 = TreeIndex::index_tree(&tree2, &ld);
        let il1 = InvertedListLabelPostorderIndex::index_tree(&tree1, &ld);
        let il2 = InvertedListLabelPostorderIndex::index_tree(&tree2, &ld);

        let exact_lb = crate::lb::label_intersection::label_intersection(&il1, &il2) as f64;
        let folded = bitmap_filter(&t1, &t2, 4, BitPolicy::Set);
        assert!(folded <= exact_lb);
    }

    #[test]
    fn json_variant_counts_objects_and_arrays_exactly() {
        let t1 = index(r#"{{}{k1:{v1}}}"#);
        let t2 = index(r#"{[]{k1:{v1}}}"#);
        assert!(bitmap_filter_json(&t1, &t2, DEFAULT_BITMAP_SIZE, BitPolicy::Xor) >= 1.0);
    }
}
