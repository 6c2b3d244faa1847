//! Join/lookup drivers (C9): orchestrate convert -> retrieve candidates ->
//! upper-bound shortcut -> verify, and expose the counters every driver
//! accumulates while doing so.
//!
//! Every driver owns its own `JoinCounters`: per the concurrency model (see
//! the design notes), two concurrent joins use disjoint driver instances, so
//! there is no cross-invocation aggregation to do here.

pub mod guha;
pub mod lookup;
pub mod naive;
pub mod tang;
pub mod tjoin;

use crate::parsing::{LabelDict, ParsedTree};

/// One emitted join result: `tree_id_1 < tree_id_2`, `distance <= tau`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct JoinResultElement {
    pub tree_id_1: u32,
    pub tree_id_2: u32,
    pub distance: f64,
}

impl JoinResultElement {
    pub fn new(tree_id_1: usize, tree_id_2: usize, distance: f64) -> Self {
        let (a, b) = if tree_id_1 < tree_id_2 {
            (tree_id_1, tree_id_2)
        } else {
            (tree_id_2, tree_id_1)
        };
        Self {
            tree_id_1: a as u32,
            tree_id_2: b as u32,
            distance,
        }
    }
}

/// Read-only exports every driver maintains (spec §4.10); fields a given
/// driver never touches stay at 0 rather than growing a per-driver subtype.
#[derive(Debug, Default, Clone, Copy)]
pub struct JoinCounters {
    pub subproblem_count: u64,
    pub pre_candidates: u64,
    pub il_lookups: u64,
    pub verification_count: u64,
    pub candidates_count: u64,
    pub l_t_candidates: u64,
    pub sed_candidates: u64,
    pub u_t_result_pairs: u64,
    pub cted_result_pairs: u64,
}

pub trait JoinDriver {
    /// Runs a full self-join over `trees` at threshold `tau`, returning every
    /// pair with true edit distance `<= tau`. `label_dict` must already
    /// contain every label used by `trees` (the dictionary built while
    /// parsing them).
    fn execute_join(
        &mut self,
        trees: &[ParsedTree],
        label_dict: &LabelDict,
        tau: f64,
    ) -> Vec<JoinResultElement>;

    fn counters(&self) -> JoinCounters;
}
