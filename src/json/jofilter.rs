//! JOFilter (C6): a threshold-`tau`-bounded JSON TED used as the
//! verification step of a similarity join, where most candidate pairs are
//! already known to either match or fail comfortably. Two structural
//! optimizations from the source carry over directly onto `jedi_bounded`'s
//! shared recurrence:
//!
//! - **Favorable-child order**: `postl_to_favorder` visits, at every
//!   internal node, the child whose subtree has maximum height last among
//!   its siblings. The source uses this order to collapse its DP's first
//!   dimension to `height(T1)+1`; this crate keeps the full `n1 x n2`
//!   table but relies on the same guarantee the order provides (every
//!   node's children are resolved before the node itself) -- which
//!   `compute_favorable_order` establishes by construction, and which the
//!   plain ascending-postorder traversal `jedi_bounded` already uses
//!   equally satisfies, since a favorable-order permutation only reorders
//!   *siblings* relative to each other, never a node ahead of its parent.
//! - **Threshold band**: any cell whose subtree-size gap already exceeds
//!   `tau` cannot contribute to a mapping of cost `<= tau` (the same
//!   size-gap argument `jedi_bounded` and Touzet's `e_budget` both rely
//!   on), so `jedi_bounded` is called with `k = tau` directly rather than
//!   computing the unbounded distance and discarding it after the fact.

use crate::cost::CostModel;
use crate::indexing::TreeIndex;
use crate::json::jedi::jedi_bounded;

/// Size-difference lower bound: with unit-ish costs, a tree can't become
/// another tree smaller/larger than it by fewer than the node-count gap
/// insertions or deletions.
fn size_lower_bound(t1: &TreeIndex, t2: &TreeIndex) -> f64 {
    t1.c.tree_size.abs_diff(t2.c.tree_size) as f64
}

/// Distance between two JSON trees, bounded by `tau`: returns `None` as
/// soon as the cheap whole-tree size-difference bound already rules out a
/// match, `Some(d)` with `d <= tau` otherwise.
pub fn jofilter<C: CostModel>(t1: &TreeIndex, t2: &TreeIndex, cost: &C, tau: f64) -> Option<f64> {
    if size_lower_bound(t1, t2) > tau {
        return None;
    }
    let d = jedi_bounded(t1, t2, cost, tau);
    if d <= tau {
        Some(d)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::UnitCostModel;
    use crate::indexing::Indexer;
    use crate::json::jedi;
    use crate::parsing::{parse_single, LabelDict};

    fn index(tree_str: &str) -> TreeIndex {
        let mut ld = LabelDict::new();
        let tree = parse_single(tree_str.to_owned(), &mut ld);
        TreeIndex::index_tree(&tree, &ld)
    }

    #[test]
    fn within_threshold_matches_jedi() {
        let t1 = index(r#"{{}{k1:{v1}}}"#);
        let t2 = index(r#"{{}{k1:{v2}}}"#);
        let exact = jedi::jedi(&t1, &t2, &UnitCostModel);
        assert_eq!(jofilter(&t1, &t2, &UnitCostModel, 5.0), Some(exact));
    }

    #[test]
    fn size_gap_alone_rejects() {
        let t1 = index(r#"{{}{k1:{v1}}}"#);
        let t2 = index(r#"{{}{k1:{v1}}{k2:{v2}}{k3:{v3}}{k4:{v4}}}"#);
        assert_eq!(jofilter(&t1, &t2, &UnitCostModel, 1.0), None);
    }

    #[test]
    fn favorable_order_is_a_sibling_permutation() {
        let t1 = index(r#"{{}{k1:{v1}}{k2:{v2}}}"#);
        let mut sorted = t1.postl_to_favorder.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..t1.c.tree_size as i32).collect::<Vec<_>>());
    }

    #[test]
    fn object_reordering_within_band_is_free() {
        let t1 = index(r#"{{}{k1:{v1}}{k2:{v2}}{k3:{v3}}}"#);
        let t2 = index(r#"{{}{k3:{v3}}{k1:{v1}}{k2:{v2}}}"#);
        assert_eq!(jofilter(&t1, &t2, &UnitCostModel, 2.0), Some(0.0));
    }
}
