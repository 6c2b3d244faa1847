//! Naive join (C9): every tree pair is a candidate, verified directly by
//! Touzet's k-bounded distance. Grounded in `naive_join_ti_impl.h`'s plain
//! double loop -- no candidate generation step to skip, every pair pays for
//! verification, and the subproblem counter accumulates unconditionally
//! (even for pairs that end up exceeding the threshold).

use crate::cost::UnitCostModel;
use crate::indexing::{Indexer, TreeIndex};
use crate::join::{JoinCounters, JoinDriver, JoinResultElement};
use crate::parsing::{LabelDict, ParsedTree};
use crate::ted::touzet;

#[derive(Debug, Default)]
pub struct NaiveJoin {
    counters: JoinCounters,
}

impl JoinDriver for NaiveJoin {
    fn execute_join(
        &mut self,
        trees: &[ParsedTree],
        label_dict: &LabelDict,
        tau: f64,
    ) -> Vec<JoinResultElement> {
        self.counters = JoinCounters::default();
        let k = tau as usize;
        let indexes: Vec<TreeIndex> = trees
            .iter()
            .map(|t| TreeIndex::index_tree(t, label_dict))
            .collect();

        let mut results = Vec::new();
        for i in 0..indexes.len() {
            for j in (i + 1)..indexes.len() {
                self.counters.candidates_count += 1;
                self.counters.verification_count += 1;
                self.counters.subproblem_count +=
                    (indexes[i].c.tree_size * indexes[j].c.tree_size) as u64;
                if let Some(d) = touzet::ted_k(&indexes[i], &indexes[j], &UnitCostModel, k) {
                    if d <= tau {
                        results.push(JoinResultElement::new(i, j, d));
                    }
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
    fn finds_all_pairs_within_threshold() {
        let (trees, ld) = dataset(&["{a{b}{c}}", "{a{b}{d}}", "{x{y}{z}}"]);
        let mut join = NaiveJoin::default();
        let result = join.execute_join(&trees, &ld, 1.0);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].tree_id_1, 0);
        assert_eq!(result[0].tree_id_2, 1);
    }

    #[test]
    fn counters_track_every_pair() {
        let (trees, ld) = dataset(&["{a}", "{b}", "{c}"]);
        let mut join = NaiveJoin::default();
        join.execute_join(&trees, &ld, 0.0);
        assert_eq!(join.counters().verification_count, 3);
    }
}
