//! Label-guided greedy mapping (LGM, C7): a cheap upper bound on tree edit
//! distance, for join drivers that want to skip exact verification whenever
//! a "good enough" mapping already proves a pair is within threshold.
//!
//! Four steps: greedily pair up same-label nodes that are close in
//! postorder (the label guidance), then repair the result into a valid TED
//! mapping in two passes -- keep only the longest postorder-increasing
//! subsequence (rules out sibling-order crossings), then drop any pair
//! whose mapped-descendants count disagrees between the two trees (rules
//! out the ancestor-order crossings postorder-monotonicity alone misses) --
//! then fill the gaps the repaired mapping left unmatched with any further
//! same-label pair that doesn't cross an already-accepted ancestor or
//! descendant relationship, and finally cost the completed mapping. Gap
//! filling only ever tightens the bound: every pair it adds is checked
//! against the same validity condition repair enforces, so it can lower the
//! total cost but never produce an invalid mapping.

use crate::cost::CostModel;
use crate::indexing::TreeIndex;

/// Greedily pairs same-label nodes within a `2k+1` postorder window of each
/// other, each node used at most once. Returns pairs `(postl_in_t1,
/// postl_in_t2)` in `t1` postorder order.
fn label_guided_pairs(t1: &TreeIndex, t2: &TreeIndex, k: usize) -> Vec<(usize, usize)> {
    let mut used2 = vec![false; t2.c.tree_size];
    let mut pairs = Vec::new();
    for v in 0..t1.c.tree_size {
        let label = t1.postl_to_label_id[v];
        let Some(candidates) = t2.inverted_list_label_id_to_postl.get(&label) else {
            continue;
        };
        let mut best: Option<(usize, usize)> = None;
        for &w in candidates {
            let w = w as usize;
            if used2[w] {
                continue;
            }
            let dist = v.abs_diff(w);
            if dist > 2 * k + 1 {
                continue;
            }
            if best.map_or(true, |(_, bd)| dist < bd) {
                best = Some((w, dist));
            }
        }
        if let Some((w, _)) = best {
            used2[w] = true;
            pairs.push((v, w));
        }
    }
    pairs
}

/// Longest subsequence whose second coordinate is strictly increasing,
/// given `pairs` already sorted by the first coordinate (as
/// `label_guided_pairs` returns them). A patience-sorting style O(n log n)
/// scan over the second coordinate.
fn longest_increasing_by_second(pairs: &[(usize, usize)]) -> Vec<(usize, usize)> {
    if pairs.is_empty() {
        return Vec::new();
    }
    let mut tails: Vec<usize> = Vec::new();
    let mut tails_idx: Vec<usize> = Vec::new();
    let mut predecessor = vec![usize::MAX; pairs.len()];

    for (i, &(_, w)) in pairs.iter().enumerate() {
        let pos = tails.partition_point(|&x| x < w);
        if pos > 0 {
            predecessor[i] = tails_idx[pos - 1];
        }
        if pos == tails.len() {
            tails.push(w);
            tails_idx.push(i);
        } else {
            tails[pos] = w;
            tails_idx[pos] = i;
        }
    }

    let mut seq = Vec::with_capacity(tails_idx.len());
    let mut cur = tails_idx.last().copied();
    while let Some(i) = cur {
        seq.push(pairs[i]);
        cur = if predecessor[i] == usize::MAX {
            None
        } else {
            Some(predecessor[i])
        };
    }
    seq.reverse();
    seq
}

/// Drops any pair whose acceptance would make the mapping invalid. A
/// postorder-increasing-in-both-coordinates sequence is necessary but not
/// sufficient for a valid TED mapping: it can still pair up a node that has
/// no mapped descendants with one that does (e.g. a leaf in `t1` mapped to
/// an internal node's descendant in `t2` while that internal node is mapped
/// to `v`'s sibling), which silently reorders an ancestor/descendant
/// relationship across the two trees. Spec's repair condition -- equal
/// "mapped-descendants count" on both sides of a pair -- catches exactly
/// that. Pairs are decided in increasing postorder, so by the time `(v, w)`
/// is considered, every pair rooted at a proper descendant of `v` or `w`
/// has already been decided; `desc_count{1,2}` are kept current by walking
/// `postl_to_parent` on acceptance.
fn repair_to_valid_mapping(
    pairs: &[(usize, usize)],
    t1: &TreeIndex,
    t2: &TreeIndex,
) -> Vec<(usize, usize)> {
    let mut desc_count1 = vec![0u32; t1.c.tree_size];
    let mut desc_count2 = vec![0u32; t2.c.tree_size];
    let mut accepted = Vec::with_capacity(pairs.len());
    for &(v, w) in pairs {
        if desc_count1[v] != desc_count2[w] {
            continue;
        }
        accepted.push((v, w));
        let mut a = t1.postl_to_parent[v];
        while a >= 0 {
            desc_count1[a as usize] += 1;
            a = t1.postl_to_parent[a as usize];
        }
        let mut b = t2.postl_to_parent[w];
        while b >= 0 {
            desc_count2[b as usize] += 1;
            b = t2.postl_to_parent[b as usize];
        }
    }
    accepted
}

/// Whether `node` lies inside `anc`'s subtree (or is `anc` itself), using
/// the postorder contiguous-range property: `anc`'s subtree is exactly the
/// `size` postorder ids ending at `anc`.
fn is_ancestor_or_self(t: &TreeIndex, anc: usize, node: usize) -> bool {
    let anc_i = anc as i64;
    let node_i = node as i64;
    let size = t.postl_to_size[anc] as i64;
    node_i <= anc_i && node_i > anc_i - size
}

/// Whether unmapped `v` (in `t1`) and `w` (in `t2`), both strictly between
/// a gap's boundary pairs, sit in matching structural positions relative to
/// those boundaries: `v` an ancestor-or-self of the left pair's `t1` side
/// iff `w` is an ancestor-or-self of the left pair's `t2` side, and
/// symmetrically for `v`/`w` against the right pair on the descendant side.
/// Accepting a pair that fails this would cross an ancestor/descendant
/// relationship the mapping has already committed to.
fn if_in_corresponding_regions(
    t1: &TreeIndex,
    t2: &TreeIndex,
    v: usize,
    w: usize,
    left: Option<(usize, usize)>,
    right: Option<(usize, usize)>,
) -> bool {
    let v_anc_left = left.is_some_and(|(a, _)| is_ancestor_or_self(t1, v, a));
    let w_anc_left = left.is_some_and(|(_, b)| is_ancestor_or_self(t2, w, b));
    let v_desc_right = right.is_some_and(|(a, _)| is_ancestor_or_self(t1, a, v));
    let w_desc_right = right.is_some_and(|(_, b)| is_ancestor_or_self(t2, b, w));
    v_anc_left == w_anc_left && v_desc_right == w_desc_right
}

/// Searches the open postorder window between `left` and `right` (`None`
/// meaning "no bound", i.e. before the first / after the last mapped pair)
/// for the postorder-closest unmapped same-label pair that keeps the
/// mapping structurally valid, accepts it, and recurses into the two
/// sub-gaps it splits this gap into.
fn fill_gap(
    t1: &TreeIndex,
    t2: &TreeIndex,
    left: Option<(usize, usize)>,
    right: Option<(usize, usize)>,
    mapped1: &mut [bool],
    mapped2: &mut [bool],
    out: &mut Vec<(usize, usize)>,
) {
    let v_lo = left.map_or(0, |(v, _)| v + 1);
    let v_hi = right.map_or(t1.c.tree_size, |(v, _)| v);
    let w_lo = left.map_or(0, |(_, w)| w + 1);
    let w_hi = right.map_or(t2.c.tree_size, |(_, w)| w);
    if v_lo >= v_hi || w_lo >= w_hi {
        return;
    }

    let mut best: Option<(usize, usize)> = None;
    for v in v_lo..v_hi {
        if mapped1[v] {
            continue;
        }
        let label = t1.postl_to_label_id[v];
        for w in w_lo..w_hi {
            if mapped2[w] || t2.postl_to_label_id[w] != label {
                continue;
            }
            if !if_in_corresponding_regions(t1, t2, v, w, left, right) {
                continue;
            }
            if best.map_or(true, |(bv, bw)| v.abs_diff(w) < bv.abs_diff(bw)) {
                best = Some((v, w));
            }
        }
    }

    let Some((v, w)) = best else { return };
    mapped1[v] = true;
    mapped2[w] = true;
    fill_gap(t1, t2, left, Some((v, w)), mapped1, mapped2, out);
    fill_gap(t1, t2, Some((v, w)), right, mapped1, mapped2, out);
    out.push((v, w));
}

/// Gap-filling pass: walks every gap between consecutive pairs of
/// `mapping` (plus the gap before the first and after the last) looking
/// for additional same-label matches the greedy pass and repair step left
/// unmapped, and appends whatever it finds.
fn fill_gaps(t1: &TreeIndex, t2: &TreeIndex, mapping: &mut Vec<(usize, usize)>) {
    let mut mapped1 = vec![false; t1.c.tree_size];
    let mut mapped2 = vec![false; t2.c.tree_size];
    for &(v, w) in mapping.iter() {
        mapped1[v] = true;
        mapped2[w] = true;
    }

    let mut extra = Vec::new();
    let boundaries: Vec<Option<(usize, usize)>> = std::iter::once(None)
        .chain(mapping.iter().copied().map(Some))
        .chain(std::iter::once(None))
        .collect();
    for pair in boundaries.windows(2) {
        fill_gap(t1, t2, pair[0], pair[1], &mut mapped1, &mut mapped2, &mut extra);
    }

    mapping.extend(extra);
    mapping.sort_by_key(|&(v, _)| v);
}

/// Upper bound on tree edit distance: a valid (but not necessarily optimal)
/// mapping's cost. Always `>=` the true distance is wrong by construction --
/// this is an upper bound, so it's always `<=` the cost of mapping nothing
/// (full delete + full insert), and `>=` the true edit distance.
pub fn lgm_upper_bound<C: CostModel>(t1: &TreeIndex, t2: &TreeIndex, cost: &C, k: usize) -> f64 {
    let pairs = label_guided_pairs(t1, t2, k);
    let candidates = longest_increasing_by_second(&pairs);
    let mut mapping = repair_to_valid_mapping(&candidates, t1, t2);
    fill_gaps(t1, t2, &mut mapping);

    let mut mapped1 = vec![false; t1.c.tree_size];
    let mut mapped2 = vec![false; t2.c.tree_size];
    let mut total = 0.0;
    for &(v, w) in &mapping {
        mapped1[v] = true;
        mapped2[w] = true;
        total += cost.ren(t1.postl_to_label_id[v], t2.postl_to_label_id[w]).into();
    }
    for v in 0..t1.c.tree_size {
        if !mapped1[v] {
            total += cost.del(t1.postl_to_label_id[v]).into();
        }
    }
    for w in 0..t2.c.tree_size {
        if !mapped2[w] {
            total += cost.ins(t2.postl_to_label_id[w]).into();
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::UnitCostModel;
    use crate::indexing::Indexer;
    use crate::parsing::{parse_single, LabelDict};
    use crate::ted::zhang_shasha;

    fn index(tree_str: &str) -> TreeIndex {
        let mut ld = LabelDict::new();
        let tree = parse_single(tree_str.to_owned(), &mut ld);
        TreeIndex::index_tree(&tree, &ld)
    }

    #[test]
    fn identical_trees_bound_at_zero() {
        let t1 = index("{a{b}{c}}");
        let t2 = index("{a{b}{c}}");
        assert_eq!(lgm_upper_bound(&t1, &t2, &UnitCostModel, 2), 0.0);
    }

    #[test]
    fn bound_never_understates_true_distance() {
        let t1 = index("{a{b{d}{e}}{c}}");
        let t2 = index("{a{b}{c{f}{g}}}");
        let exact = zhang_shasha::ted(&t1, &t2, &UnitCostModel);
        let bound = lgm_upper_bound(&t1, &t2, &UnitCostModel, 3);
        assert!(bound >= exact);
    }

    #[test]
    fn repair_drops_pair_that_would_cross_ancestor_relation() {
        // t1 = r1[p, q] (siblings); t2 = r2[x[y]] (x ancestor of y).
        // Postorder: t1 -> p=0, q=1, r1=2; t2 -> y=0, x=1, r2=2.
        // (p, y) and (q, x) are both postorder-increasing ((0,0), (1,1)),
        // but accepting both would map the sibling pair (p, q) onto the
        // ancestor pair (y, x) -- not a valid TED mapping. The second
        // pair must be dropped.
        let t1 = index("{r1{p}{q}}");
        let t2 = index("{r2{x{y}}}");
        let candidates = vec![(0usize, 0usize), (1usize, 1usize)];
        let repaired = repair_to_valid_mapping(&candidates, &t1, &t2);
        assert_eq!(repaired, vec![(0, 0)]);
    }

    #[test]
    fn disjoint_labels_bound_equals_full_delete_insert() {
        let t1 = index("{a{b}}");
        let t2 = index("{x{y}}");
        assert_eq!(lgm_upper_bound(&t1, &t2, &UnitCostModel, 2), 4.0);
    }

    #[test]
    fn corresponding_regions_rejects_pair_that_crosses_an_accepted_mapping() {
        // t1 = r[a[m], b]; t2 = r[a, b[m]]. Postorder: t1 -> m=0, a=1, b=2,
        // r=3; t2 -> a=0, m=1, b=2, r=3. With a-a already accepted (1, 0),
        // pairing m(t1, descendant of a) with m(t2, descendant of b) would
        // make a's image (a) no longer contain m's image -- an
        // ancestor/descendant relationship the accepted pair already fixed.
        let t1 = index("{r{a{m}}{b}}");
        let t2 = index("{r{a}{b{m}}}");
        assert!(!if_in_corresponding_regions(
            &t1,
            &t2,
            0,
            1,
            None,
            Some((1, 0)),
        ));
    }

    #[test]
    fn fill_gaps_recovers_a_same_label_pair_left_unmapped_by_repair() {
        // Both trees are r[a, m, b]; postorder numbers a=0, m=1, b=2, r=3 in
        // each. A mapping that (for whatever reason) skipped the middle
        // child still has room for it: m sits strictly between a and b on
        // both sides and crosses no accepted relationship.
        let t1 = index("{r{a}{m}{b}}");
        let t2 = index("{r{a}{m}{b}}");
        let mut mapping = vec![(0, 0), (2, 2), (3, 3)];
        fill_gaps(&t1, &t2, &mut mapping);
        assert_eq!(mapping, vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn gap_filling_tightens_the_bound_when_repair_leaves_a_fillable_gap() {
        let t1 = index("{r{a}{m}{b}}");
        let t2 = index("{r{a}{m}{b}}");
        let without_fill = vec![(0, 0), (2, 2), (3, 3)];
        let mut with_fill = without_fill.clone();
        fill_gaps(&t1, &t2, &mut with_fill);

        let cost_of = |mapping: &[(usize, usize)]| -> f64 {
            let mut mapped1 = vec![false; t1.c.tree_size];
            let mut mapped2 = vec![false; t2.c.tree_size];
            let mut total = 0.0;
            for &(v, w) in mapping {
                mapped1[v] = true;
                mapped2[w] = true;
                total += UnitCostModel
                    .ren(t1.postl_to_label_id[v], t2.postl_to_label_id[w])
                    .into();
            }
            for v in 0..t1.c.tree_size {
                if !mapped1[v] {
                    total += UnitCostModel.del(t1.postl_to_label_id[v]).into();
                }
            }
            for w in 0..t2.c.tree_size {
                if !mapped2[w] {
                    total += UnitCostModel.ins(t2.postl_to_label_id[w]).into();
                }
            }
            total
        };

        assert!(cost_of(&with_fill) < cost_of(&without_fill));
    }
}
