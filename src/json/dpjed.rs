//! DPJED (C6): the `k`-bounded counterpart to `jedi` -- same relationship
//! `touzet::ted_k` has to `zhang_shasha::ted`, but for JSON trees. Every
//! cell of the DP whose two subtree sizes already differ by more than `k`
//! skips the expensive ordered/Hungarian child alignment (`jedi_bounded`'s
//! pruning, grounded in the same size-gap argument Touzet's `e_budget`
//! uses), so a tight `k` prunes real work rather than only gating the
//! final answer. Reports `None` rather than a distance once the exact
//! value is confirmed to exceed the budget.

use crate::cost::CostModel;
use crate::indexing::TreeIndex;
use crate::json::jedi::jedi_bounded;

/// Exact JSON tree edit distance, bounded by `k`: `None` means "distance is
/// known to exceed `k`", never that the computation was skipped for any
/// other reason.
pub fn dpjed_k<C: CostModel>(t1: &TreeIndex, t2: &TreeIndex, cost: &C, k: usize) -> Option<f64> {
    if t1.c.tree_size.abs_diff(t2.c.tree_size) > k {
        return None;
    }
    let d = jedi_bounded(t1, t2, cost, k as f64);
    if d <= k as f64 {
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
    fn within_budget_matches_jedi() {
        let t1 = index(r#"{{}{k1:{v1}}}"#);
        let t2 = index(r#"{{}{k1:{v2}}}"#);
        let exact = jedi::jedi(&t1, &t2, &UnitCostModel);
        assert_eq!(dpjed_k(&t1, &t2, &UnitCostModel, 5), Some(exact));
    }

    #[test]
    fn prunes_without_changing_the_in_budget_answer() {
        let t1 = index(r#"{{}{k1:{v1}}{k2:{v2}}}"#);
        let t2 = index(r#"{{}{k2:{v2}}{k1:{v1}}}"#);
        let exact = jedi::jedi(&t1, &t2, &UnitCostModel);
        assert_eq!(dpjed_k(&t1, &t2, &UnitCostModel, 1), Some(exact));
        assert_eq!(exact, 0.0);
    }

    #[test]
    fn exceeding_budget_returns_none() {
        let t1 = index(r#"{{}{k1:{v1}}}"#);
        let t2 = index(r#"{{}{k1:{v1}}{k2:{v2}}{k3:{v3}}{k4:{v4}}}"#);
        assert_eq!(dpjed_k(&t1, &t2, &UnitCostModel, 0), None);
    }
}
