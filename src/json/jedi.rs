//! JEDI-Baseline (C6): tree edit distance between two JSON trees, branching
//! on each node pair's `JsonNodeType` so every node is compared the way its
//! role in the JSON document calls for rather than via a single generic
//! tree-edit recurrence.
//!
//! - `Value`/`Value`: the cost to relabel one scalar into the other.
//! - `Key`/`Key`: a key has exactly one child, so this is a direct
//!   relabel-and-recurse, no matching needed.
//! - `Array`/`Array`: array elements are ordered, so children are aligned
//!   with the same banded string-edit recurrence `ted::cted` uses for a
//!   node's children.
//! - `Object`/`Object`: object members are unordered, so children are
//!   matched by running the Hungarian algorithm over a cost matrix padded
//!   with delete/insert-only rows and columns for the size mismatch.
//! - any other pairing (an array compared against an object, etc.): no
//!   node-type-specific alignment applies, so this falls back to the same
//!   ordered forest recurrence `Array`/`Array` uses.

use crate::cost::CostModel;
use crate::indexing::{JsonNodeType, TreeIndex};
use crate::json::hungarian::execute_hungarian;
use crate::matrix::Matrix;
use crate::ted::cted::{forest_dist, subtree_del_cost, subtree_ins_cost};

/// Ordered forest alignment over two child sequences, substitution cost
/// taken from already-computed `treedist` entries. Same recurrence as
/// `ted::cted::forest_dist`, specialized to read/write this module's
/// postorder-indexed `treedist` table directly instead of taking it by
/// reference, since JEDI never needs forest distances over anything but a
/// node's immediate children.
fn ordered_forest_dist(
    children1: &[i32],
    children2: &[i32],
    t1: &TreeIndex,
    t2: &TreeIndex,
    treedist: &Matrix<f64>,
) -> f64 {
    let (k, l) = (children1.len(), children2.len());
    let mut d = Matrix::<f64>::new(k + 1, l + 1);
    for x in 1..=k {
        let prev = *d.read_at(x - 1, 0).unwrap();
        d.set(x, 0, prev + subtree_del_cost(t1, children1[x - 1] as usize))
            .unwrap();
    }
    for y in 1..=l {
        let prev = *d.read_at(0, y - 1).unwrap();
        d.set(0, y, prev + subtree_ins_cost(t2, children2[y - 1] as usize))
            .unwrap();
    }
    for x in 1..=k {
        for y in 1..=l {
            let del = d.read_at(x - 1, y).unwrap() + subtree_del_cost(t1, children1[x - 1] as usize);
            let ins = d.read_at(x, y - 1).unwrap() + subtree_ins_cost(t2, children2[y - 1] as usize);
            let sub = d.read_at(x - 1, y - 1).unwrap()
                + treedist
                    .read_at(children1[x - 1] as usize, children2[y - 1] as usize)
                    .unwrap();
            d.set(x, y, del.min(ins).min(sub)).unwrap();
        }
    }
    *d.read_at(k, l).unwrap()
}

/// Unordered matching over a node's children via the Hungarian algorithm:
/// an `n x n` cost matrix, `n = max(k, l)`, padded so any surplus child on
/// either side can only be matched against a delete/insert slot.
fn unordered_child_match(
    children1: &[i32],
    children2: &[i32],
    t1: &TreeIndex,
    t2: &TreeIndex,
    treedist: &Matrix<f64>,
) -> f64 {
    let (k, l) = (children1.len(), children2.len());
    let n = k.max(l);
    if n == 0 {
        return 0.0;
    }
    let mut cost = Matrix::<f64>::new(n, n);
    for i in 0..n {
        for j in 0..n {
            let v = match (i < k, j < l) {
                (true, true) => *treedist
                    .read_at(children1[i] as usize, children2[j] as usize)
                    .unwrap(),
                (true, false) => subtree_del_cost(t1, children1[i] as usize),
                (false, true) => subtree_ins_cost(t2, children2[j] as usize),
                (false, false) => 0.0,
            };
            cost.set(i, j, v).unwrap();
        }
    }
    execute_hungarian(&cost, n)
}

/// Tree edit distance between two JSON trees indexed the same way any other
/// tree in this crate is (`TreeIndex`), dispatching the per-node-pair
/// alignment strategy on `postl_to_type`.
pub fn jedi<C: CostModel>(t1: &TreeIndex, t2: &TreeIndex, cost: &C) -> f64 {
    jedi_bounded(t1, t2, cost, f64::INFINITY)
}

/// Shared engine behind `jedi`, `dpjed::dpjed_k` and `jofilter::jofilter`:
/// the same node-type-dispatched recurrence, but any cell `(v, w)` whose
/// subtree sizes differ by more than `k` skips the expensive child
/// alignment (ordered DP or Hungarian matching) entirely. That skip is
/// sound for a `k`-bounded caller: matching two subtrees always costs at
/// least the difference in their sizes (every unmatched node costs one
/// deletion or insertion), so once that gap alone exceeds `k` the
/// alignment branch cannot be part of any mapping of cost `<= k`, and
/// omitting it cannot make the table's final value too small. With
/// `k = f64::INFINITY` this is exactly the unbounded `jedi` recurrence.
pub(crate) fn jedi_bounded<C: CostModel>(t1: &TreeIndex, t2: &TreeIndex, cost: &C, k: f64) -> f64 {
    let (n, m) = (t1.c.tree_size, t2.c.tree_size);
    if n == 0 {
        return (0..m).map(|p| cost.ins(t2.postl_to_label_id[p]).into()).sum();
    }
    if m == 0 {
        return (0..n).map(|p| cost.del(t1.postl_to_label_id[p]).into()).sum();
    }

    let mut treedist = Matrix::<f64>::filled(n, m, f64::INFINITY);
    for v in 0..n {
        let size_v = t1.postl_to_size[v] as f64;
        let v_singleton = [v as i32];
        for w in 0..m {
            let w_singleton = [w as i32];
            // Deleting v promotes its children to a forest matched against
            // w itself (not just deleted away) -- symmetrically for
            // inserting w against v -- mirroring `ted::cted::ted`'s
            // `delete_v`/`insert_w` terms. A flat `del(v) + subtree_del(v)`
            // would double-count v's own cost and ignore building w.
            let del = cost.del(t1.postl_to_label_id[v]).into()
                + forest_dist(&t1.postl_to_children[v], &w_singleton, t1, t2, &treedist);
            let ins = cost.ins(t2.postl_to_label_id[w]).into()
                + forest_dist(&v_singleton, &t2.postl_to_children[w], t1, t2, &treedist);

            let size_w = t2.postl_to_size[w] as f64;
            let best = if (size_v - size_w).abs() > k {
                del.min(ins)
            } else {
                let type1 = t1.postl_to_type[v];
                let type2 = t2.postl_to_type[w];
                let ren: f64 = cost
                    .ren(t1.postl_to_label_id[v], t2.postl_to_label_id[w])
                    .into();

                let d = match (type1, type2) {
                    (JsonNodeType::Value, JsonNodeType::Value) => ren,
                    (JsonNodeType::Object, JsonNodeType::Object) => {
                        ren + unordered_child_match(
                            &t1.postl_to_children[v],
                            &t2.postl_to_children[w],
                            t1,
                            t2,
                            &treedist,
                        )
                    }
                    _ => {
                        ren + ordered_forest_dist(
                            &t1.postl_to_children[v],
                            &t2.postl_to_children[w],
                            t1,
                            t2,
                            &treedist,
                        )
                    }
                };
                d.min(del).min(ins)
            };
            treedist.set(v, w, best).unwrap();
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

    fn index(tree_str: &str) -> TreeIndex {
        let mut ld = LabelDict::new();
        let tree = parse_single(tree_str.to_owned(), &mut ld);
        TreeIndex::index_tree(&tree, &ld)
    }

    #[test]
    fn identical_json_trees_have_zero_distance() {
        let t1 = index(r#"{{}{k1:{v1}}{k2:{v2}}}"#);
        let t2 = index(r#"{{}{k1:{v1}}{k2:{v2}}}"#);
        assert_eq!(jedi(&t1, &t2, &UnitCostModel), 0.0);
    }

    #[test]
    fn object_member_reordering_is_free() {
        // Unordered matching: swapping two key/value pairs costs nothing.
        let t1 = index(r#"{{}{k1:{v1}}{k2:{v2}}}"#);
        let t2 = index(r#"{{}{k2:{v2}}{k1:{v1}}}"#);
        assert_eq!(jedi(&t1, &t2, &UnitCostModel), 0.0);
    }

    #[test]
    fn array_element_reordering_is_not_free() {
        // Ordered matching: swapping two array elements costs a rename pair.
        let t1 = index(r#"{[]{v1}{v2}}"#);
        let t2 = index(r#"{[]{v2}{v1}}"#);
        assert!(jedi(&t1, &t2, &UnitCostModel) > 0.0);
    }

    #[test]
    fn value_change_costs_one_relabel() {
        let t1 = index(r#"{{}{k1:{v1}}}"#);
        let t2 = index(r#"{{}{k1:{v2}}}"#);
        assert_eq!(jedi(&t1, &t2, &UnitCostModel), 1.0);
    }

    #[test]
    fn added_key_costs_subtree_insert() {
        let t1 = index(r#"{{}{k1:{v1}}}"#);
        let t2 = index(r#"{{}{k1:{v1}}{k2:{v2}}}"#);
        assert_eq!(jedi(&t1, &t2, &UnitCostModel), 2.0);
    }

    #[test]
    fn deleting_a_large_array_does_not_shortcut_below_true_distance() {
        // Root's only child grows from one array element to twenty; the
        // true distance keeps the matching element and inserts the other
        // nineteen. A del/ins term that forgets to account for building the
        // other side would let the root cell settle for `del(root) +
        // subtree_del_cost(root)`, far below the true cost.
        let mut big = String::from("{[]{v1}");
        for i in 2..=20 {
            big.push_str(&format!("{{v{i}}}"));
        }
        big.push('}');
        let t1 = index("{[]{v1}}");
        let t2 = index(&big);
        assert_eq!(jedi(&t1, &t2, &UnitCostModel), 19.0);
    }
}
