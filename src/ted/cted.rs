//! Constrained tree edit distance (CTED, C5/C6): Zhang's 1995 constrained
//! mapping, which additionally forbids the handful of "crossing" mappings
//! the unconstrained Tai mapping (Zhang-Shasha/APTED) allows. Deleting a
//! node promotes its children as a forest matched against the *other*
//! side's single surviving tree, rather than letting them scatter freely
//! across the other tree the way the unconstrained mapping does.
//!
//! Used by the JSON-aware kernels (C6): JSON object-member reordering
//! aside, object/array nesting makes the unconstrained mapping's crossing
//! moves meaningless, so the constrained distance is the natural upper
//! bound to align against.

use crate::cost::CostModel;
use crate::indexing::TreeIndex;
use crate::matrix::Matrix;

pub(crate) fn subtree_del_cost(t: &TreeIndex, postl: usize) -> f64 {
    t.prel_to_subtree_del_cost[t.postl_to_prel[postl] as usize]
}

pub(crate) fn subtree_ins_cost(t: &TreeIndex, postl: usize) -> f64 {
    t.prel_to_subtree_ins_cost[t.postl_to_prel[postl] as usize]
}

/// Constrained edit distance between two ordered sequences of whole
/// subtrees (e.g. a node's children, or a single-element `[node]`),
/// reusing already-computed `treedist` entries for any subtree pairing.
pub(crate) fn forest_dist(
    seq1: &[i32],
    seq2: &[i32],
    t1: &TreeIndex,
    t2: &TreeIndex,
    treedist: &Matrix<f64>,
) -> f64 {
    let (k, l) = (seq1.len(), seq2.len());
    let mut d = Matrix::<f64>::new(k + 1, l + 1);
    for x in 1..=k {
        let prev = *d.read_at(x - 1, 0).unwrap();
        d.set(x, 0, prev + subtree_del_cost(t1, seq1[x - 1] as usize))
            .unwrap();
    }
    for y in 1..=l {
        let prev = *d.read_at(0, y - 1).unwrap();
        d.set(0, y, prev + subtree_ins_cost(t2, seq2[y - 1] as usize))
            .unwrap();
    }
    for x in 1..=k {
        for y in 1..=l {
            let del = d.read_at(x - 1, y).unwrap() + subtree_del_cost(t1, seq1[x - 1] as usize);
            let ins = d.read_at(x, y - 1).unwrap() + subtree_ins_cost(t2, seq2[y - 1] as usize);
            let ren = d.read_at(x - 1, y - 1).unwrap()
                + treedist
                    .read_at(seq1[x - 1] as usize, seq2[y - 1] as usize)
                    .unwrap();
            d.set(x, y, del.min(ins).min(ren)).unwrap();
        }
    }
    *d.read_at(k, l).unwrap()
}

pub fn ted<C: CostModel>(t1: &TreeIndex, t2: &TreeIndex, cost: &C) -> f64 {
    let (n, m) = (t1.c.tree_size, t2.c.tree_size);
    if n == 0 {
        return (0..m).map(|p| cost.ins(t2.postl_to_label_id[p]).into()).sum();
    }
    if m == 0 {
        return (0..n).map(|p| cost.del(t1.postl_to_label_id[p]).into()).sum();
    }

    let mut treedist = Matrix::<f64>::new(n, m);
    for v in 0..n {
        let v_singleton = [v as i32];
        for w in 0..m {
            let w_singleton = [w as i32];
            let ren: f64 = cost
                .ren(t1.postl_to_label_id[v], t2.postl_to_label_id[w])
                .into();
            let del: f64 = cost.del(t1.postl_to_label_id[v]).into();
            let ins: f64 = cost.ins(t2.postl_to_label_id[w]).into();

            let map_roots = forest_dist(&t1.postl_to_children[v], &t2.postl_to_children[w], t1, t2, &treedist) + ren;
            let delete_v = del + forest_dist(&t1.postl_to_children[v], &w_singleton, t1, t2, &treedist);
            let insert_w = ins + forest_dist(&v_singleton, &t2.postl_to_children[w], t1, t2, &treedist);

            treedist.set(v, w, map_roots.min(delete_v).min(insert_w)).unwrap();
        }
    }

    *treedist.read_at(n - 1, m - 1).unwrap()
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
    fn identical_trees_have_zero_distance() {
        let t1 = index("{a{b}{c}}");
        let t2 = index("{a{b}{c}}");
        assert_eq!(ted(&t1, &t2, &UnitCostModel), 0.0);
    }

    #[test]
    fn single_relabel() {
        let t1 = index("{a{b}{c}}");
        let t2 = index("{a{b}{d}}");
        assert_eq!(ted(&t1, &t2, &UnitCostModel), 1.0);
    }

    #[test]
    fn constrained_distance_is_never_below_unconstrained() {
        let t1 = index("{a{b{d}{e}}{c}}");
        let t2 = index("{a{b}{c{f}{g}}}");
        assert!(ted(&t1, &t2, &UnitCostModel) >= zhang_shasha::ted(&t1, &t2, &UnitCostModel));
    }

    #[test]
    fn leaf_to_leaf_relabel_matches_unconstrained() {
        // No nesting to constrain away from: CTED and Tai mapping agree on flat trees.
        let t1 = index("{a{b}{c}{d}}");
        let t2 = index("{a{x}{c}{d}}");
        assert_eq!(
            ted(&t1, &t2, &UnitCostModel),
            zhang_shasha::ted(&t1, &t2, &UnitCostModel)
        );
    }
}
