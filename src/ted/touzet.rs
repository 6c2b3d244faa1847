//! Touzet's k-bounded tree edit distance (C5): computes the exact distance
//! only up to a caller-supplied threshold `k`, pruning any subtree pair
//! whose distance must already exceed it. Four variants trade pruning
//! strength for bookkeeping cost; all agree on the final verdict
//! (`Some(d)` with `d <= k`, or `None` meaning "distance > k").
//!
//! Grounded in the reference `touzet_impl.h`/`ted_algorithm_touzet.h`
//! `tree_dist` band-matrix recurrence: a diagonal band around each subtree
//! pair's forest-distance table, since any alignment straying far enough
//! from the diagonal already costs more than the budget. The band's width
//! is `k`-relevant pairs' own `e_budget`, not the bare whole-call `k` --
//! narrower for pairs whose position in the outer trees already rules out
//! most of the slack, full-`k` for pairs (KR-Set representatives, or a
//! root pair reached only by the always-compute fallback) that are not
//! individually provable k-relevant.

use crate::cost::CostModel;
use crate::indexing::TreeIndex;
use crate::matrix::{BandMatrix, Matrix};
use rustc_hash::FxHashMap;

/// The four structural gaps Touzet's k-relevance test sums: nodes strictly
/// to the right of the subtree, depth, subtree size, and leftmost-descendant
/// offset, each as `t1`'s coordinate minus `t2`'s.
struct RelevanceGaps {
    right: i64,
    depth: i64,
    size: i64,
    lld: i64,
}

fn relevance_gaps(t1: &TreeIndex, t2: &TreeIndex, x: usize, y: usize) -> RelevanceGaps {
    let n1 = t1.c.tree_size as i64;
    let n2 = t2.c.tree_size as i64;
    let depth1 = t1.postl_to_depth[x] as i64;
    let depth2 = t2.postl_to_depth[y] as i64;
    let size1 = t1.postl_to_size[x] as i64;
    let size2 = t2.postl_to_size[y] as i64;
    let x = x as i64;
    let y = y as i64;

    RelevanceGaps {
        right: (n1 - x - 1 - depth1) - (n2 - y - 1 - depth2),
        depth: depth1 - depth2,
        size: size1 - size2,
        lld: (x + 1 - size1) - (y + 1 - size2),
    }
}

/// Touzet's k-relevance test (spec 4.5): `(x, y)` can only possibly lie
/// within a valid mapping of cost `<= k` if every one of these four
/// structural gaps -- nodes strictly to the right of the subtree, depth,
/// subtree size, and leftmost-descendant offset -- sums to at most `k`.
/// Pairs failing this test can be skipped without ever running the band DP.
fn is_k_relevant(t1: &TreeIndex, t2: &TreeIndex, x: usize, y: usize, k: i64) -> bool {
    let g = relevance_gaps(t1, t2, x, y);
    g.right.abs() + g.depth.abs() + g.size.abs() + g.lld.abs() <= k
}

/// e_budget (spec 4.5): `k` minus every gap term *except* the size gap,
/// since `tree_dist`'s own table dimensions already account for the size
/// difference between the two subtrees. Grounded in `touzet_impl.h`'s
/// `e_budget(x, y, k)`, which takes postorder ids directly (not bare
/// sizes): whenever `(x, y)` is k-relevant, `e = (k - sum_of_four_gaps) +
/// size_gap >= size_gap`, so a band of this width always reaches the
/// table's far corner. A size-only `e = k - |size1 - size2|` does not carry
/// that guarantee and can leave the corner cell unreachable. Clamped to 0
/// per this crate's resolution of the reference's negative-budget open
/// question.
fn e_budget(t1: &TreeIndex, t2: &TreeIndex, x: usize, y: usize, k: i64) -> i64 {
    let g = relevance_gaps(t1, t2, x, y);
    (k - g.right.abs() - g.depth.abs() - g.lld.abs()).max(0)
}

/// Fills the banded forest-distance table for one subtree-root pair `(i,
/// j)` (postorder ids) and writes the resulting subtree distance into
/// `treedists[i][j]`. Shared by every variant below: they differ only in
/// *which* `(i, j)` pairs get a call and what budget `e` they pass, never
/// in how a single pair is scored. `e` must be wide enough to reach this
/// table's far corner (offset `|size1 - size2|` from the diagonal) for any
/// in-budget pair to be found; callers that cannot prove that for `(i, j)`
/// individually should pass `k` itself.
fn tree_dist<C: CostModel>(
    t1: &TreeIndex,
    t2: &TreeIndex,
    cost: &C,
    i: usize,
    j: usize,
    k: usize,
    e: usize,
    treedists: &mut Matrix<f64>,
) {
    let l1 = &t1.postl_to_lld;
    let l2 = &t2.postl_to_lld;
    let label1 = &t1.postl_to_label_id;
    let label2 = &t2.postl_to_label_id;

    let li = l1[i] as usize;
    let lj = l2[j] as usize;
    let size1 = i - li + 1;
    let size2 = j - lj + 1;

    if size1.abs_diff(size2) > k {
        treedists.set(i, j, f64::INFINITY).ok();
        return;
    }

    let rows = size1 + 1;
    let cols = size2 + 1;
    let width = e;
    let mut fd = BandMatrix::<f64>::filled(rows.max(cols), width, f64::INFINITY);
    let _ = fd.set(0, 0, 0.0);

    for x in 1..rows.min(width + 1) {
        let node = li + x - 1;
        let del: f64 = cost.del(label1[node]).into();
        if let Ok(prev) = fd.read_at(x - 1, 0) {
            let prev = *prev;
            let _ = fd.set(x, 0, prev + del);
        }
    }
    for y in 1..cols.min(width + 1) {
        let node = lj + y - 1;
        let ins: f64 = cost.ins(label2[node]).into();
        if let Ok(prev) = fd.read_at(0, y - 1) {
            let prev = *prev;
            let _ = fd.set(0, y, prev + ins);
        }
    }

    for x in 1..rows {
        let ii = li + x - 1;
        let ylo = x.saturating_sub(width).max(1);
        let yhi = (x + width).min(cols - 1);
        for y in ylo..=yhi {
            let jj = lj + y - 1;
            let del: f64 = cost.del(label1[ii]).into();
            let ins: f64 = cost.ins(label2[jj]).into();

            let best = if l1[ii] as usize == li && l2[jj] as usize == lj {
                let ren: f64 = cost.ren(label1[ii], label2[jj]).into();
                let d_del = fd.read_at(x - 1, y).map(|v| v + del).unwrap_or(f64::INFINITY);
                let d_ins = fd.read_at(x, y - 1).map(|v| v + ins).unwrap_or(f64::INFINITY);
                let d_ren = fd
                    .read_at(x - 1, y - 1)
                    .map(|v| v + ren)
                    .unwrap_or(f64::INFINITY);
                let best = d_del.min(d_ins).min(d_ren);
                treedists.set(ii, jj, best).ok();
                best
            } else {
                let xoff = l1[ii] as usize - li;
                let yoff = l2[jj] as usize - lj;
                let d_del = fd.read_at(x - 1, y).map(|v| v + del).unwrap_or(f64::INFINITY);
                let d_ins = fd.read_at(x, y - 1).map(|v| v + ins).unwrap_or(f64::INFINITY);
                let sub = treedists.read_at(ii, jj).copied().unwrap_or(f64::INFINITY);
                let d_tree = fd
                    .read_at(xoff, yoff)
                    .ok()
                    .map(|v| v + sub)
                    .unwrap_or(f64::INFINITY);
                d_del.min(d_ins).min(d_tree)
            };
            let _ = fd.set(x, y, best);
        }
    }
}

/// Baseline variant: bounded forest distance over a diagonal band of
/// half-width `k`, one keyroot pair at a time, short-circuiting any
/// keyroot pair whose size gap alone already exceeds `k`.
pub fn ted_k<C: CostModel>(t1: &TreeIndex, t2: &TreeIndex, cost: &C, k: usize) -> Option<f64> {
    let (n, m) = (t1.c.tree_size, t2.c.tree_size);
    if n.abs_diff(m) > k {
        return None;
    }
    if n == 0 && m == 0 {
        return Some(0.0);
    }

    let k_i = k as i64;
    let mut treedists = Matrix::<f64>::filled(n.max(1), m.max(1), f64::INFINITY);
    for &i in &t1.list_kr {
        let i = i as usize;
        for &j in &t2.list_kr {
            let j = j as usize;
            if !is_k_relevant(t1, t2, i, j, k_i) {
                continue;
            }
            let e = e_budget(t1, t2, i, j, k_i) as usize;
            tree_dist(t1, t2, cost, i, j, k, e, &mut treedists);
        }
    }

    // The root pair might fail a loose reading of k-relevance (e.g. k == 0
    // on equal-size trees) while still being the only pair that matters;
    // make sure it is always computed.
    let root1 = n - 1;
    let root2 = m - 1;
    if treedists.read_at(root1, root2).copied().unwrap_or(f64::INFINITY).is_infinite() {
        tree_dist(t1, t2, cost, root1, root2, k, k, &mut treedists);
    }

    let result = *treedists.read_at(root1, root2).unwrap();
    if result <= k as f64 {
        Some(result)
    } else {
        None
    }
}

/// Right-to-left preorder over the subtree rooted at postorder id `x`,
/// skipping any node (and therefore its whole subtree) once its depth
/// exceeds `max_depth`: a node deeper than that can never sit inside the
/// e-strip, so neither can anything below it.
fn truncated_subtree_nodes(t1: &TreeIndex, x: usize, max_depth: i64) -> Vec<usize> {
    let mut nodes = Vec::new();
    let mut stack = vec![x];
    while let Some(nid) = stack.pop() {
        if t1.postl_to_depth[nid] as i64 > max_depth {
            continue;
        }
        nodes.push(nid);
        // Children are listed left to right in postl order; pushing them in
        // that order means the rightmost pops first, giving right-to-left
        // preorder.
        for &c in &t1.postl_to_children[nid] {
            stack.push(c as usize);
        }
    }
    nodes
}

/// Same recurrence as [`tree_dist`], but restricted to the subtree-root
/// pair's truncated node set: only rows whose node lies within
/// `depth(x) + e + 1` of `x` itself are ever filled in, per the
/// "truncated-tree fix" -- a row that falls outside that bound is already
/// provably unreachable within the remaining budget `e`, so it is left at
/// its initial infinity and any cell that would have read it sees infinity
/// too, with no separate fallback bookkeeping needed.
fn tree_dist_depth_pruned<C: CostModel>(
    t1: &TreeIndex,
    t2: &TreeIndex,
    cost: &C,
    x: usize,
    y: usize,
    k: usize,
    e: usize,
    treedists: &mut Matrix<f64>,
) {
    let l1 = &t1.postl_to_lld;
    let l2 = &t2.postl_to_lld;
    let label1 = &t1.postl_to_label_id;
    let label2 = &t2.postl_to_label_id;

    let li = l1[x] as usize;
    let lj = l2[y] as usize;
    let size1 = x - li + 1;
    let size2 = y - lj + 1;

    if size1.abs_diff(size2) > k {
        treedists.set(x, y, f64::INFINITY).ok();
        return;
    }

    let width = e;
    let rows = size1 + 1;
    let cols = size2 + 1;
    let mut fd = BandMatrix::<f64>::filled(rows.max(cols), width, f64::INFINITY);
    let _ = fd.set(0, 0, 0.0);

    for j in 1..cols.min(width + 1) {
        let node = lj + j - 1;
        let ins: f64 = cost.ins(label2[node]).into();
        if let Ok(prev) = fd.read_at(0, j - 1) {
            let prev = *prev;
            let _ = fd.set(0, j, prev + ins);
        }
    }
    for i in 1..rows.min(width + 1) {
        let node = li + i - 1;
        let del: f64 = cost.del(label1[node]).into();
        if let Ok(prev) = fd.read_at(i - 1, 0) {
            let prev = *prev;
            let _ = fd.set(i, 0, prev + del);
        }
    }

    let depth_x = t1.postl_to_depth[x] as i64;
    let max_depth = (depth_x + width as i64 + 1).min(t1.postl_to_subtree_max_depth[x] as i64);
    let mut truncated = truncated_subtree_nodes(t1, x, max_depth);
    truncated.sort_unstable();

    for node in truncated {
        let i = node - li + 1;
        let ylo = i.saturating_sub(width).max(1);
        let yhi = (i + width).min(cols - 1);
        for jj in ylo..=yhi {
            let ii = li + i - 1;
            let jnode = lj + jj - 1;
            let del: f64 = cost.del(label1[ii]).into();
            let ins: f64 = cost.ins(label2[jnode]).into();

            let best = if l1[ii] as usize == li && l2[jnode] as usize == lj {
                let ren: f64 = cost.ren(label1[ii], label2[jnode]).into();
                let d_del = fd.read_at(i - 1, jj).map(|v| v + del).unwrap_or(f64::INFINITY);
                let d_ins = fd.read_at(i, jj - 1).map(|v| v + ins).unwrap_or(f64::INFINITY);
                let d_ren = fd
                    .read_at(i - 1, jj - 1)
                    .map(|v| v + ren)
                    .unwrap_or(f64::INFINITY);
                let best = d_del.min(d_ins).min(d_ren);
                treedists.set(ii, jnode, best).ok();
                best
            } else {
                let xoff = l1[ii] as usize - li;
                let yoff = l2[jnode] as usize - lj;
                let d_del = fd.read_at(i - 1, jj).map(|v| v + del).unwrap_or(f64::INFINITY);
                let d_ins = fd.read_at(i, jj - 1).map(|v| v + ins).unwrap_or(f64::INFINITY);
                let sub = treedists.read_at(ii, jnode).copied().unwrap_or(f64::INFINITY);
                let d_tree = fd
                    .read_at(xoff, yoff)
                    .ok()
                    .map(|v| v + sub)
                    .unwrap_or(f64::INFINITY);
                d_del.min(d_ins).min(d_tree)
            };
            let _ = fd.set(i, jj, best);
        }
    }
}

/// Depth-pruning variant: the "truncated-tree fix" from the source --
/// `tree_dist` itself only walks the ancestors within `depth(x) + e + 1` of
/// each subtree-root pair (collected in right-to-left preorder), instead of
/// filling the whole `(|T1_x|+1) x (|T2_y|+1)` table.
pub fn ted_k_depth_pruning<C: CostModel>(
    t1: &TreeIndex,
    t2: &TreeIndex,
    cost: &C,
    k: usize,
) -> Option<f64> {
    let (n, m) = (t1.c.tree_size, t2.c.tree_size);
    if n.abs_diff(m) > k {
        return None;
    }
    if n == 0 && m == 0 {
        return Some(0.0);
    }

    let k_i = k as i64;
    let mut treedists = Matrix::<f64>::filled(n.max(1), m.max(1), f64::INFINITY);
    for &i in &t1.list_kr {
        let i = i as usize;
        for &j in &t2.list_kr {
            let j = j as usize;
            if !is_k_relevant(t1, t2, i, j, k_i) {
                continue;
            }
            let e = e_budget(t1, t2, i, j, k_i) as usize;
            tree_dist_depth_pruned(t1, t2, cost, i, j, k, e, &mut treedists);
        }
    }

    let root1 = n - 1;
    let root2 = m - 1;
    if treedists.read_at(root1, root2).copied().unwrap_or(f64::INFINITY).is_infinite() {
        tree_dist_depth_pruned(t1, t2, cost, root1, root2, k, k, &mut treedists);
    }

    let result = *treedists.read_at(n - 1, m - 1).unwrap();
    if result <= k as f64 {
        Some(result)
    } else {
        None
    }
}

/// KR-Set variant: per spec, folds every k-relevant postorder pair `(x,
/// y)` down to one representative per `(kr_ancestor(x), kr_ancestor(y))`
/// group (keeping the one with the largest `y`, since it subsumes the
/// forest-distance work of smaller `y`s sharing the same keyroot pair),
/// then runs `tree_dist` only on those representatives. `kBitsToShift =
/// 32` packs both postorders into one `u64` key, matching the source's
/// documented `2^32` tree-size bound.
pub fn ted_k_kr_set<C: CostModel>(t1: &TreeIndex, t2: &TreeIndex, cost: &C, k: usize) -> Option<f64> {
    const K_BITS_TO_SHIFT: u32 = 32;

    let (n, m) = (t1.c.tree_size, t2.c.tree_size);
    if n.abs_diff(m) > k {
        return None;
    }
    if n == 0 && m == 0 {
        return Some(0.0);
    }

    let k_i = k as i64;
    let mut reps: FxHashMap<u64, (usize, usize)> = FxHashMap::default();
    for x in (0..n).rev() {
        for y in (0..m).rev() {
            if !is_k_relevant(t1, t2, x, y, k_i) {
                continue;
            }
            let kr_x = t1.postl_to_kr_ancestor[x] as u64;
            let kr_y = t2.postl_to_kr_ancestor[y] as u64;
            let key = (kr_x << K_BITS_TO_SHIFT) | kr_y;
            reps.entry(key)
                .and_modify(|(_, ry)| {
                    if y > *ry {
                        *ry = y;
                    }
                })
                .or_insert((x, y));
        }
    }

    let mut pairs: Vec<(usize, usize)> = reps.into_values().collect();
    // Ascending postorder: a pair's dependencies (smaller subtree-root
    // pairs reused through `treedists`) always carry a smaller postorder
    // in both coordinates, so this order keeps them filled in first.
    pairs.sort_unstable();

    // A representative pair is assembled from two different (x, y) checks
    // (the one that created its group and the one that last raised `ry`),
    // so it isn't itself guaranteed individually k-relevant; band at the
    // full `k` rather than risk a representative-specific `e` too narrow to
    // reach this table's corner.
    let mut treedists = Matrix::<f64>::filled(n.max(1), m.max(1), f64::INFINITY);
    for &(x, y) in &pairs {
        tree_dist(t1, t2, cost, x, y, k, k, &mut treedists);
    }

    // Representatives only guarantee the keyroot pairs themselves are
    // covered; the root pair might not have been k-relevant under a loose
    // reading of the test (e.g. k == 0 on equal trees), so make sure it is
    // always computed.
    let root1 = n - 1;
    let root2 = m - 1;
    if treedists.read_at(root1, root2).copied().unwrap_or(f64::INFINITY).is_infinite() {
        tree_dist(t1, t2, cost, root1, root2, k, k, &mut treedists);
    }

    let result = *treedists.read_at(root1, root2).unwrap();
    if result <= k as f64 {
        Some(result)
    } else {
        None
    }
}

/// Exact tree edit distance via Touzet's bound-doubling search: starts at
/// the unavoidable size-difference lower bound and doubles `k` until
/// `ted_k` confirms the true distance is within it.
pub fn ted<C: CostModel>(t1: &TreeIndex, t2: &TreeIndex, cost: &C) -> f64 {
    let mut k = t1.c.tree_size.abs_diff(t2.c.tree_size) + 1;
    loop {
        if let Some(d) = ted_k(t1, t2, cost, k) {
            return d;
        }
        k *= 2;
    }
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
    fn within_budget_matches_exact() {
        let t1 = index("{a{b}{c}}");
        let t2 = index("{a{b}{d}}");
        let exact = zhang_shasha::ted(&t1, &t2, &UnitCostModel);
        assert_eq!(ted_k(&t1, &t2, &UnitCostModel, 5), Some(exact));
    }

    #[test]
    fn exceeding_budget_returns_none() {
        let t1 = index("{a{b}{c}{d}{e}}");
        let t2 = index("{x{y}{z}}");
        assert_eq!(ted_k(&t1, &t2, &UnitCostModel, 0), None);
    }

    #[test]
    fn e_budget_matches_k_when_gaps_vanish_at_the_root() {
        // Roots always have right_gap = depth_gap = lld_gap = 0, so e == k.
        let t1 = index("{a{b}{c}}");
        let t2 = index("{a{b}{c}}");
        let root = t1.c.tree_size - 1;
        assert_eq!(e_budget(&t1, &t2, root, root, 3), 3);
    }

    #[test]
    fn e_budget_clamps_negative_to_zero() {
        let t1 = index("{a{b{d}}{c}}");
        let t2 = index("{x{y}}");
        // node 1 (`b`) against node 0 (`y`): right_gap == 1, so any k below
        // that would drive the raw budget negative.
        assert_eq!(e_budget(&t1, &t2, 1, 0, 0), 0);
        assert_eq!(e_budget(&t1, &t2, 1, 0, 2), 1);
    }

    #[test]
    fn depth_pruning_agrees_with_baseline_when_not_pruned() {
        let t1 = index("{a{b{d}}{c}}");
        let t2 = index("{a{b{d}}{c}}");
        assert_eq!(
            ted_k_depth_pruning(&t1, &t2, &UnitCostModel, 2),
            ted_k(&t1, &t2, &UnitCostModel, 2)
        );
    }

    #[test]
    fn depth_pruning_truncates_a_deep_chain_and_still_agrees_with_baseline() {
        // A five-deep chain differing only at the leaf: with k = 1, e at the
        // root keyroot pair is 1, so `max_depth = depth(root) + e + 1 = 2`
        // truncates the chain's two deepest nodes out of this call's node
        // set entirely. The result must still match the untruncated baseline.
        let t1 = index("{a{b{c{d{f}}}}}");
        let t2 = index("{a{b{c{d{g}}}}}");
        assert_eq!(
            ted_k_depth_pruning(&t1, &t2, &UnitCostModel, 1),
            ted_k(&t1, &t2, &UnitCostModel, 1)
        );
        assert_eq!(ted_k_depth_pruning(&t1, &t2, &UnitCostModel, 1), Some(1.0));
    }

    #[test]
    fn depth_pruning_agrees_with_baseline_on_larger_trees() {
        let t1 = index("{a{b{d}{e}}{c{f}{g}}}");
        let t2 = index("{a{b{d}}{c{f}{g}{h}}}");
        assert_eq!(
            ted_k_depth_pruning(&t1, &t2, &UnitCostModel, 3),
            ted_k(&t1, &t2, &UnitCostModel, 3)
        );
    }

    #[test]
    fn kr_set_agrees_with_baseline() {
        let t1 = index("{a{b{d}{e}}{c{f}{g}}}");
        let t2 = index("{a{b{d}}{c{f}{g}{h}}}");
        assert_eq!(
            ted_k_kr_set(&t1, &t2, &UnitCostModel, 3),
            ted_k(&t1, &t2, &UnitCostModel, 3)
        );
    }

    #[test]
    fn kr_set_exceeding_budget_returns_none() {
        let t1 = index("{a{b}{c}{d}{e}}");
        let t2 = index("{x{y}{z}}");
        assert_eq!(ted_k_kr_set(&t1, &t2, &UnitCostModel, 0), None);
    }

    #[test]
    fn k_relevance_is_symmetric_for_identical_trees() {
        let t1 = index("{a{b}{c}}");
        let t2 = index("{a{b}{c}}");
        let n = t1.c.tree_size;
        for i in 0..n {
            assert!(is_k_relevant(&t1, &t2, i, i, 0));
        }
    }

    #[test]
    fn ted_doubling_matches_exact_distance() {
        let t1 = index("{a{b{d}{e}}{c{f}{g}}}");
        let t2 = index("{a{b{d}}{c{f}{g}{h}}}");
        let exact = zhang_shasha::ted(&t1, &t2, &UnitCostModel);
        assert_eq!(ted(&t1, &t2, &UnitCostModel), exact);
    }
}
