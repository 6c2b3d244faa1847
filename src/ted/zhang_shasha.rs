//! Zhang & Shasha's tree edit distance (C5): the unoptimized keyroot
//! decomposition, O(n^2 m^2) worst case. Used as the reference oracle
//! other kernels are checked against, and as the fallback when a
//! tree pair is too small for APTED's strategy bookkeeping to pay off.

use crate::cost::CostModel;
use crate::indexing::TreeIndex;

pub fn ted<C: CostModel>(t1: &TreeIndex, t2: &TreeIndex, cost: &C) -> f64 {
    super::keyroot_tree_dist(t1, t2, cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::UnitCostModel;
    use crate::indexing::Indexer;
    use crate::parsing::{parse_single, LabelDict};

    fn index(tree_str: &str) -> TreeIndex {
        let mut ld = LabelDict::new();
        let tree = parse_single(tree_str.to_owned(), &mut ld);
        TreeIndex::index_tree(&tree, &ld)
    }

    #[test]
    fn identical_trees() {
        let t1 = index("{a{b{d}}{c}}");
        let t2 = index("{a{b{d}}{c}}");
        assert_eq!(ted(&t1, &t2, &UnitCostModel), 0.0);
    }

    #[test]
    fn single_relabel_at_leaf() {
        let t1 = index("{a{b}{c}}");
        let t2 = index("{a{b}{d}}");
        assert_eq!(ted(&t1, &t2, &UnitCostModel), 1.0);
    }

    #[test]
    fn fully_disjoint_small_trees() {
        let t1 = index("{a{b}}");
        let t2 = index("{x{y}}");
        // both labels differ: two relabels is optimal, cheaper than delete+insert.
        assert_eq!(ted(&t1, &t2, &UnitCostModel), 2.0);
    }

    #[test]
    fn insert_only() {
        let t1 = index("{a}");
        let t2 = index("{a{b}}");
        assert_eq!(ted(&t1, &t2, &UnitCostModel), 1.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let t1 = index("{a{b{d}{e}}{c}}");
        let t2 = index("{a{b}{c{f}{g}}}");
        assert_eq!(ted(&t1, &t2, &UnitCostModel), ted(&t2, &t1, &UnitCostModel));
    }

    #[test]
    fn empty_tree_costs_exactly_the_insertions() {
        let empty = TreeIndex::empty();
        let t2 = index("{a{b{d}}{c}}");
        assert_eq!(ted(&empty, &t2, &UnitCostModel), t2.c.tree_size as f64);
        assert_eq!(ted(&t2, &empty, &UnitCostModel), t2.c.tree_size as f64);
    }
}
