//! Guha RSB/RSC join (C9): a random reference set of trees, each tree
//! represented by its vector of exact distances to every reference tree,
//! and the triangle inequality over that vector space used to prune or
//! directly accept pairs before ever running an exact verification.
//! Grounded in `guha_impl.h`'s `l_t`/`u_t` bounds
//! (`l_t = max_k |v1[k] - v2[k]|`, `u_t = min_k (v1[k] + v2[k])`), with the
//! reference set itself drawn by a seeded shuffle rather than
//! `guha_impl.h`'s plain uniform sampling -- the reference set size the
//! crate ends up with doesn't depend on draw order, but a seed makes it
//! reproducible, which `guha_impl.h`'s unseeded `std::random_device` does
//! not give you.

use crate::cost::UnitCostModel;
use crate::indexing::{Indexer, TreeIndex};
use crate::join::{JoinCounters, JoinDriver, JoinResultElement};
use crate::parsing::{LabelDict, ParsedTree};
use crate::ted::{touzet, zhang_shasha};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

const DEFAULT_REFERENCE_SET_SIZE: usize = 20;

#[derive(Debug)]
pub struct GuhaJoin {
    seed: u64,
    reference_set_size: usize,
    counters: JoinCounters,
}

impl GuhaJoin {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            reference_set_size: DEFAULT_REFERENCE_SET_SIZE,
            counters: JoinCounters::default(),
        }
    }

    pub fn with_reference_set_size(seed: u64, reference_set_size: usize) -> Self {
        Self {
            seed,
            reference_set_size,
            counters: JoinCounters::default(),
        }
    }
}

impl JoinDriver for GuhaJoin {
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
        let n = indexes.len();

        let ref_count = self.reference_set_size.min(n);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        let mut ids: Vec<usize> = (0..n).collect();
        ids.shuffle(&mut rng);
        let references = &ids[..ref_count];

        let vectors: Vec<Vec<f64>> = indexes
            .iter()
            .map(|t| {
                references
                    .iter()
                    .map(|&r| zhang_shasha::ted(t, &indexes[r], &UnitCostModel))
                    .collect()
            })
            .collect();

        let mut results = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                self.counters.candidates_count += 1;
                let l_t = vectors[i]
                    .iter()
                    .zip(&vectors[j])
                    .map(|(a, b)| (a - b).abs())
                    .fold(0.0_f64, f64::max);
                if l_t > tau {
                    self.counters.l_t_candidates += 1;
                    continue;
                }
                let u_t = vectors[i]
                    .iter()
                    .zip(&vectors[j])
                    .map(|(a, b)| a + b)
                    .fold(f64::INFINITY, f64::min);
                if u_t <= tau {
                    self.counters.u_t_result_pairs += 1;
                    results.push(JoinResultElement::new(i, j, u_t));
                    continue;
                }

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
    fn agrees_with_naive_join_on_small_dataset() {
        use crate::join::naive::NaiveJoin;
        let (trees, ld) = dataset(&[
            "{a{b}{c}}",
            "{a{b}{d}}",
            "{x{y}{z}}",
            "{a{b}{c}{e}}",
        ]);
        let mut guha = GuhaJoin::new(42);
        let mut naive = NaiveJoin::default();
        let mut guha_result = guha.execute_join(&trees, &ld, 1.0);
        let mut naive_result = naive.execute_join(&trees, &ld, 1.0);
        guha_result.sort_by_key(|r| (r.tree_id_1, r.tree_id_2));
        naive_result.sort_by_key(|r| (r.tree_id_1, r.tree_id_2));
        let guha_pairs: Vec<(u32, u32)> = guha_result.iter().map(|r| (r.tree_id_1, r.tree_id_2)).collect();
        let naive_pairs: Vec<(u32, u32)> = naive_result.iter().map(|r| (r.tree_id_1, r.tree_id_2)).collect();
        assert_eq!(guha_pairs, naive_pairs);
    }

    #[test]
    fn deterministic_given_same_seed() {
        let (trees, ld) = dataset(&["{a{b}{c}}", "{a{b}{d}}", "{x{y}{z}}", "{a{b}{c}{e}}"]);
        let mut g1 = GuhaJoin::new(7);
        let mut g2 = GuhaJoin::new(7);
        let r1 = g1.execute_join(&trees, &ld, 1.0);
        let r2 = g2.execute_join(&trees, &ld, 1.0);
        assert_eq!(r1, r2);
    }
}
