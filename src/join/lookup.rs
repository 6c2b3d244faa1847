//! Lookup index driver (C9): build a structural-filter index once over a
//! tree collection, then answer repeated range queries ("every tree within
//! `tau` of this query tree") against it. Grounded in
//! `lookup/index/index_impl.h`'s two driver variants: `VerificationIndex`
//! verifies every candidate directly, `VerificationUBkIndex` first tries
//! the LGM upper bound and only falls through to exact verification when
//! the bound doesn't already prove the pair within threshold. This crate
//! keeps both behind one type and a constructor flag rather than a second
//! struct, since the two only differ in whether the bound check runs.

use crate::cost::UnitCostModel;
use crate::indexing::{Indexer, TreeIndex};
use crate::join::JoinCounters;
use crate::lb::lgm;
use crate::lb::structural_filter::{LabelSetConverter, StructuralFilterIndex, StructuralFilterTuple};
use crate::parsing::{LabelDict, ParsedTree};
use crate::ted::touzet;

/// One match returned by a lookup query.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct LookupResultElement {
    pub tree_id: u32,
    pub distance: f64,
}

pub struct LookupIndex {
    converter: LabelSetConverter,
    sets: Vec<StructuralFilterTuple>,
    index: Option<StructuralFilterIndex>,
    tree_indexes: Vec<TreeIndex>,
    use_upper_bound: bool,
    counters: JoinCounters,
}

impl LookupIndex {
    /// `VerificationIndex`: candidates go straight to exact verification.
    pub fn new() -> Self {
        Self {
            converter: LabelSetConverter::default(),
            sets: Vec::new(),
            index: None,
            tree_indexes: Vec::new(),
            use_upper_bound: false,
            counters: JoinCounters::default(),
        }
    }

    /// `VerificationUBkIndex`: candidates try the LGM upper bound first.
    pub fn with_upper_bound() -> Self {
        Self {
            use_upper_bound: true,
            ..Self::new()
        }
    }

    pub fn build(&mut self, trees: &[ParsedTree], label_dict: &LabelDict) {
        self.sets = self.converter.create(trees);
        self.index = Some(StructuralFilterIndex::new(&self.sets));
        self.tree_indexes = trees
            .iter()
            .map(|t| TreeIndex::index_tree(t, label_dict))
            .collect();
        self.counters = JoinCounters::default();
    }

    pub fn lookup(&mut self, query: &ParsedTree, label_dict: &LabelDict, tau: f64) -> Vec<LookupResultElement> {
        let index = self.index.as_ref().expect("build() must run before lookup()");
        let k = tau as usize;

        let query_set = {
            let mut converter = LabelSetConverter::default();
            converter.create_single(query)
        };
        let query_index = TreeIndex::index_tree(query, label_dict);

        let found = index.query_index(&query_set, k, None);
        self.counters.pre_candidates += found.len() as u64;
        self.counters.il_lookups += 1;

        let mut results = Vec::new();
        for (_, tid) in found {
            self.counters.candidates_count += 1;
            let candidate = &self.tree_indexes[tid];

            if self.use_upper_bound {
                let bound = lgm::lgm_upper_bound(&query_index, candidate, &UnitCostModel, k);
                if bound <= tau {
                    self.counters.u_t_result_pairs += 1;
                    results.push(LookupResultElement {
                        tree_id: tid as u32,
                        distance: bound,
                    });
                    continue;
                }
            }

            self.counters.verification_count += 1;
            self.counters.subproblem_count +=
                (query_index.c.tree_size * candidate.c.tree_size) as u64;
            if let Some(d) = touzet::ted_k(&query_index, candidate, &UnitCostModel, k) {
                if d <= tau {
                    results.push(LookupResultElement {
                        tree_id: tid as u32,
                        distance: d,
                    });
                }
            }
        }
        results
    }

    pub fn counters(&self) -> JoinCounters {
        self.counters
    }
}

impl Default for LookupIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse_single;

    #[test]
    fn finds_matches_within_threshold() {
        let mut ld = LabelDict::new();
        let corpus: Vec<ParsedTree> = ["{a{b}{c}}", "{x{y}{z}}", "{a{b}{d}}"]
            .iter()
            .map(|s| parse_single((*s).to_owned(), &mut ld))
            .collect();
        let query = parse_single("{a{b}{c}}".to_owned(), &mut ld);

        let mut index = LookupIndex::new();
        index.build(&corpus, &ld);
        let mut result = index.lookup(&query, &ld, 1.0);
        result.sort_by_key(|r| r.tree_id);

        let ids: Vec<u32> = result.iter().map(|r| r.tree_id).collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn upper_bound_variant_agrees_with_plain_variant() {
        let mut ld = LabelDict::new();
        let corpus: Vec<ParsedTree> = ["{a{b}{c}}", "{x{y}{z}}", "{a{b}{d}}"]
            .iter()
            .map(|s| parse_single((*s).to_owned(), &mut ld))
            .collect();
        let query = parse_single("{a{b}{c}}".to_owned(), &mut ld);

        let mut plain = LookupIndex::new();
        plain.build(&corpus, &ld);
        let mut plain_result = plain.lookup(&query, &ld, 1.0);

        let mut ubk = LookupIndex::with_upper_bound();
        ubk.build(&corpus, &ld);
        let mut ubk_result = ubk.lookup(&query, &ld, 1.0);

        plain_result.sort_by_key(|r| r.tree_id);
        ubk_result.sort_by_key(|r| r.tree_id);
        let plain_ids: Vec<u32> = plain_result.iter().map(|r| r.tree_id).collect();
        let ubk_ids: Vec<u32> = ubk_result.iter().map(|r| r.tree_id).collect();
        assert_eq!(plain_ids, ubk_ids);
    }
}
