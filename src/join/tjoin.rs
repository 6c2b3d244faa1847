//! TJoin (C8/C9): label-set inverted-list candidate generation, an LGM
//! upper-bound shortcut, then exact verification of whatever's left.
//! Grounded in `t_join_impl.h`'s four-stage flow:
//! `convert_trees_to_sets` -> `retrieve_candidates` -> `upperbound` ->
//! `verify_candidates`. The reference implementation removes
//! upper-bound-accepted candidates from the verification list with a
//! swap-remove (`*it = candidates.back(); candidates.pop_back();`); this
//! port gets the same effect by partitioning candidates into "accepted by
//! bound" and "needs verification" up front instead of mutating a shared
//! vector in place.

use crate::cost::UnitCostModel;
use crate::indexing::{Indexer, TreeIndex};
use crate::join::{JoinCounters, JoinDriver, JoinResultElement};
use crate::lb::lgm;
use crate::lb::structural_filter::{LabelSetConverter, StructuralFilterIndex};
use crate::parsing::{LabelDict, ParsedTree};
use crate::ted::touzet;

#[derive(Debug, Default)]
pub struct TJoin {
    counters: JoinCounters,
}

impl JoinDriver for TJoin {
    fn execute_join(
        &mut self,
        trees: &[ParsedTree],
        label_dict: &LabelDict,
        tau: f64,
    ) -> Vec<JoinResultElement> {
        self.counters = JoinCounters::default();
        let k = tau as usize;

        let mut converter = LabelSetConverter::default();
        let sets = converter.create(trees);
        let index = StructuralFilterIndex::new(&sets);
        let tree_indexes: Vec<TreeIndex> = trees
            .iter()
            .map(|t| TreeIndex::index_tree(t, label_dict))
            .collect();

        let mut candidate_pairs = Vec::new();
        for i in 0..sets.len() {
            let found = index.query_index(&sets[i], k, Some(i));
            self.counters.pre_candidates += found.len() as u64;
            self.counters.il_lookups += 1;
            for (_, j) in found {
                if j > i {
                    candidate_pairs.push((i, j));
                }
            }
        }
        self.counters.candidates_count = candidate_pairs.len() as u64;

        let mut results = Vec::new();
        let mut needs_verification = Vec::with_capacity(candidate_pairs.len());
        for (i, j) in candidate_pairs {
            let bound = lgm::lgm_upper_bound(&tree_indexes[i], &tree_indexes[j], &UnitCostModel, k);
            if bound <= tau {
                self.counters.u_t_result_pairs += 1;
                results.push(JoinResultElement::new(i, j, bound));
            } else {
                needs_verification.push((i, j));
            }
        }

        for (i, j) in needs_verification {
            self.counters.verification_count += 1;
            self.counters.subproblem_count +=
                (tree_indexes[i].c.tree_size * tree_indexes[j].c.tree_size) as u64;
            if let Some(d) = touzet::ted_k(&tree_indexes[i], &tree_indexes[j], &UnitCostModel, k) {
                if d <= tau {
                    self.counters.cted_result_pairs += 1;
                    results.push(JoinResultElement::new(i, j, d));
                }
            }
        }
        results
    }

    fn counters(&self) -> JoinCounters {
        self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse_single;

    fn dataset(trees: &[&str]) -> (Vec<ParsedTree>, LabelDict) {
        let mut ld = LabelDict::new();
        let parsed = trees
            .iter()
            .map(|s| parse_single((*s).to_owned(), &mut ld))
            .collect();
        (parsed, ld)
    }

    #[test]
    fn agrees_with_naive_join_on_small_dataset() {
        use crate::join::naive::NaiveJoin;
        let (trees, ld) = dataset(&[
            "{a{b}{c}}",
            "{a{b}{d}}",
            "{x{y}{z}}",
            "{a{b}{c}{e}}",
        ]);
        let mut tjoin = TJoin::default();
        let mut naive = NaiveJoin::default();
        let mut tjoin_result = tjoin.execute_join(&trees, &ld, 1.0);
        let mut naive_result = naive.execute_join(&trees, &ld, 1.0);
        tjoin_result.sort_by_key(|r| (r.tree_id_1, r.tree_id_2));
        naive_result.sort_by_key(|r| (r.tree_id_1, r.tree_id_2));
        let tjoin_pairs: Vec<(u32, u32)> = tjoin_result.iter().map(|r| (r.tree_id_1, r.tree_id_2)).collect();
        let naive_pairs: Vec<(u32, u32)> = naive_result.iter().map(|r| (r.tree_id_1, r.tree_id_2)).collect();
        assert_eq!(tjoin_pairs, naive_pairs);
    }
}
