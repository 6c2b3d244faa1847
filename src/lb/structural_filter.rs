use crate::parsing::{LabelDict, LabelFreqOrdering, LabelId, ParsedTree};
use indextree::NodeId;
use itertools::Itertools;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::max;

type StructHashMap = FxHashMap<LabelId, LabelSetElement>;

type RegionNumType = i32;

/// The building block for structural filter, holds information about
/// the count of ancestral nodes, descendants nodes, to the left and to the right
// difference between children and descendants? Children nodes are only 1 level below current node level
// while descendants are all nodes below the current node
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StructuralVec {
    label_id: LabelId,
    /// Id of postorder tree traversal
    pub postorder_id: usize,
    /// Vector of number of nodes to the left, ancestors, nodes to right and descendants
    pub mapping_regions: [RegionNumType; 4],
}

/// This is an element holding relevant data of a set.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LabelSetElementBase {
    pub id: LabelId,
    pub weight: usize,
    pub weigh_so_far: usize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct LabelSetElement {
    pub base: LabelSetElementBase,
    pub struct_vec: Vec<StructuralVec>,
}

/// Base struct tuple for structural filter
#[derive(Clone, Debug)]
pub struct StructuralFilterTuple(usize, StructHashMap);

impl StructuralFilterTuple {
    pub fn get_prefix(&self, ordering: &LabelFreqOrdering, k: usize) -> Vec<&LabelSetElement> {
        self.1
            .iter()
            .sorted_by_key(|(label, _)| {
                if **label as usize >= ordering.len() {
                    return usize::MAX;
                }
                ordering[**label as usize - 1]
            })
            .map(|(_, set_element)| set_element)
            .take(k + 1)
            .collect_vec()
    }

    pub fn get_sorted_nodes(&self, ordering: &LabelFreqOrdering) -> Vec<&LabelSetElement> {
        self.1
            .iter()
            .sorted_by_key(|(label, _)| {
                if **label as usize >= ordering.len() {
                    return usize::MAX;
                }
                ordering[**label as usize - 1]
            })
            .map(|(_, set_element)| set_element)
            .collect_vec()
    }
}

/// Takes a collection of trees and converts them into a collection of label
/// sets. A label set consists of labels and each label holds all nodes with that
/// label. The labels are substituted with their inverted label frequency number.
/// The labels in the sets are sorted by the global inverted frequency ordering
/// of the input collection.
#[derive(Debug, Default)]
pub struct LabelSetConverter {
    actual_depth: RegionNumType,
    actual_pre_order_number: RegionNumType,
    tree_size: RegionNumType,
}

impl LabelSetConverter {
    fn reset(&mut self) {
        self.actual_depth = 0;
        self.actual_pre_order_number = 0;
        self.tree_size = 0;
    }

    pub fn create(&mut self, trees: &[ParsedTree]) -> Vec<StructuralFilterTuple> {
        // add one because range are end exclusive
        // frequency vector of pair (label weight, labelId)
        self.reset();
        let mut sets_collection = Vec::with_capacity(trees.len());
        for tree in trees.iter() {
            // contains structural vectors for the current tree
            // is it a hash map of Label -> Vec<StructVec>
            let mut record_labels = StructHashMap::default();

            let Some(root) = tree.iter().next() else {
                panic!("tree is empty");
            };
            let root_id = tree.get_node_id(root).unwrap();
            // for recursive postorder traversal
            let mut postorder_id = 0;

            self.tree_size = tree.count() as RegionNumType;

            // array of records stored in sets_collection
            self.create_record(&root_id, tree, &mut postorder_id, &mut record_labels);

            // reset state variables needed for positional evaluation
            self.reset();
            sets_collection.push(StructuralFilterTuple(tree.count(), record_labels));
        }
        sets_collection
    }

    pub fn create_single(&mut self, tree: &ParsedTree) -> StructuralFilterTuple {
        self.reset();
        let mut record_labels = StructHashMap::default();
        let Some(root) = tree.iter().next() else {
            panic!("tree is empty");
        };
        let root_id = tree.get_node_id(root).unwrap();
        // for recursive postorder traversal
        let mut postorder_id = 0;
        self.tree_size = tree.count() as RegionNumType;
        // array of records stored in sets_collection
        self.create_record(&root_id, tree, &mut postorder_id, &mut record_labels);
        self.reset();
        StructuralFilterTuple(tree.count(), record_labels)
    }

    fn create_record(
        &mut self,
        root_id: &NodeId,
        tree: &ParsedTree,
        postorder_id: &mut usize,
        record_labels: &mut StructHashMap,
    ) -> RegionNumType {
        // number of children = subtree_size - 1
        // subtree_size = 1 -> actual node + sum of children
        let mut subtree_size = 1;

        self.actual_depth += 1;

        for cid in root_id.children(tree) {
            subtree_size += self.create_record(&cid, tree, postorder_id, record_labels);
        }

        *postorder_id += 1;
        self.actual_depth -= 1;
        self.actual_pre_order_number += 1;

        let root_label = tree.get(*root_id).unwrap().get();
        let node_struct_vec = StructuralVec {
            postorder_id: *postorder_id,
            label_id: *root_label,
            mapping_regions: [
                (self.actual_pre_order_number - subtree_size),
                self.actual_depth,
                (self.tree_size - (self.actual_pre_order_number + self.actual_depth)),
                (subtree_size - 1),
            ],
        };

        if let Some(se) = record_labels.get_mut(root_label) {
            se.base.weight += 1;
            se.struct_vec.push(node_struct_vec);
        } else {
            let mut se = LabelSetElement {
                base: LabelSetElementBase {
                    id: *tree.get(*root_id).unwrap().get(),
                    weight: 1,
                    ..LabelSetElementBase::default()
                },
                ..LabelSetElement::default()
            };
            se.struct_vec.push(node_struct_vec);
            record_labels.insert(*root_label, se);
        }
        subtree_size
    }
}

#[inline(always)]
fn svec_l1(n1: &StructuralVec, n2: &StructuralVec) -> u32 {
    n1.mapping_regions
        .iter()
        .zip_eq(n2.mapping_regions.iter())
        .map(|(a, b)| (a - b).abs())
        .sum::<i32>() as u32
}

#[inline(always)]
fn svec_l1_strict(n1: &[RegionNumType; 4], n2: &[RegionNumType; 4]) -> i32 {
    n1.iter()
        .zip_eq(n2.iter())
        .fold(0, |acc, (a, b)| acc + (a - b).abs())
}

/// Given two sets
pub fn ted(s1: &StructuralFilterTuple, s2: &StructuralFilterTuple, k: usize) -> usize {
    use std::cmp::max;
    let bigger = max(s1.0, s2.0);

    if s1.0.abs_diff(s2.0) > k {
        return k + 1;
    }
    let k = k as i32;

    let mut overlap = 0;
    for (lblid, set1) in s1.1.iter() {
        if let Some(set2) = s2.1.get(lblid) {
            if set1.base.weight == 1 && set2.base.weight == 1 {
                let l1_region_distance = svec_l1_strict(
                    &set1.struct_vec[0].mapping_regions,
                    &set2.struct_vec[0].mapping_regions,
                );

                if l1_region_distance <= k {
                    overlap += 1;
                }
                continue;
            }

            let (s1c, s2c) = if set2.base.weight < set1.base.weight {
                (set2, set1)
            } else {
                (set1, set2)
            };

            for n1 in s1c.struct_vec.iter() {
                // let k_window = n1.postorder_id as i32 - k as i32;
                // let k_window = std::cmp::max(k_window, 0) as usize;

                // apply postorder filter
                // let s2clen = s2c.struct_vec.len();
                for n2 in s2c.struct_vec.iter()
                // .skip_while(|n2| k_window < s2c.struct_vec.len() && n2.postorder_id < k_window)
                // .take_while(|n2| !(n2.postorder_id > k as usize + n1.postorder_id))
                {
                    let l1_region_distance =
                        svec_l1_strict(&n1.mapping_regions, &n2.mapping_regions);

                    if l1_region_distance <= k {
                        overlap += 1;
                        break;
                    }
                }
            }
        }
    }

    bigger - overlap
}

fn get_nodes_overlap(set1: &LabelSetElement, set2: &LabelSetElement, k: usize) -> usize {
    let mut overlap = 0;
    if set1.base.weight == 1 && set2.base.weight == 1 {
        return usize::from(
            svec_l1_strict(
                &set1.struct_vec[0].mapping_regions,
                &set2.struct_vec[0].mapping_regions,
            ) as usize
                <= k,
        );
    }

    let (s1c, s2c) = if set2.base.weight < set1.base.weight {
        (set2, set1)
    } else {
        (set1, set2)
    };

    for n1 in s1c.struct_vec.iter() {
        let k_window = n1.postorder_id as i32 - k as i32;
        let k_window = std::cmp::max(k_window, 0) as usize;

        // apply postorder filter
        let s2clen = s2c.struct_vec.len();
        for n2 in s2c
            .struct_vec
            .iter()
            .skip_while(|n2| k_window < s2c.struct_vec.len() && n2.postorder_id < k_window)
            .take_while(|n2| n2.postorder_id <= k + n1.postorder_id)
        {
            let l1_region_distance = svec_l1_strict(&n1.mapping_regions, &n2.mapping_regions);

            if l1_region_distance as usize <= k {
                overlap += 1;
                break;
            }
        }
    }
    overlap
}

pub struct StructuralFilterIndex {
    // the tuple is treeId, tree_size and label count
    index: FxHashMap<LabelId, Vec<(usize, usize, LabelSetElement)>>,
    // first is the tree size, second is starting point
    // skip_list: FxHashMap<LabelId, Vec<(usize, usize)>>,
    size_index: Vec<usize>,
}

impl StructuralFilterIndex {
    pub fn new(trees: &[StructuralFilterTuple]) -> Self {
        let mut index: FxHashMap<LabelId, Vec<(usize, usize, LabelSetElement)>> =
            FxHashMap::default();
        let mut size_index = vec![];

        for (tid, tt) in trees.iter().enumerate() {
            for (label, vectors) in tt.1.iter() {
                index
                    .entry(*label)
                    .and_modify(|postings| postings.push((tid, tt.0, vectors.clone())))
                    .or_insert(vec![(tid, tt.0, vectors.clone())]);
            }
            size_index.push(tt.0);
        }

        Self { size_index, index }
    }

    pub fn query_index_prefix(
        &self,
        query_tree: &StructuralFilterTuple,
        ordering: &LabelFreqOrdering,
        k: usize,
        trees: &[StructuralFilterTuple],
        query_id: Option<usize>,
    ) -> Vec<(usize, usize)> {
        let mut candidates = FxHashSet::default();
        let prefix = query_tree.get_sorted_nodes(ordering);
        let mut overlaps = FxHashMap::default();

        if query_tree.0 <= k {
            // find candidates that have no label overlap but can fit by size because of threshold
            for (cid, tree_size) in self
                .size_index
                .iter()
                .enumerate()
                .take_while(|(_, ts)| **ts < query_tree.0 || query_tree.0.abs_diff(**ts) <= k)
            {
                candidates.insert(cid);
                overlaps.insert(cid, (*tree_size, 1));
            }
        }

        for l in prefix.iter().take(k + 1) {
            if let Some(postings) = self.index.get(&l.base.id) {
                postings
                    .iter()
                    .filter(|(_, ts, _)| {
                        *ts >= query_tree.0.saturating_sub(k) && ts.abs_diff(query_tree.0) <= k
                    })
                    .for_each(|(cid, ts, nodes)| {
                        let overlap = get_nodes_overlap(&l, nodes, k);
                        // dbg!(nodes);
                        overlaps
                            .entry(*cid)
                            .and_modify(|(_, ov)| *ov += overlap)
                            .or_insert((*ts, overlap));
                    });
            }
        }

        for (cid, (size, overlap)) in overlaps.iter_mut() {
            if *overlap > 0 {
                for label_set in prefix.iter().skip(k + 1) {
                    if let Some(nodes) = trees[*cid].1.get(&label_set.base.id) {
                        *overlap += get_nodes_overlap(&label_set, nodes, k);
                    }
                }

                if std::cmp::max(query_tree.0, *size).saturating_sub(*overlap) <= k {
                    candidates.insert(*cid);
                } else {
                    candidates.remove(cid);
                }
            }
        }

        candidates
            .into_iter()
            .map(|cid| (query_id.unwrap_or(0), cid))
            .collect::<Vec<(usize, usize)>>()
    }

    pub fn query_index(
        &self,
        query_tree: &StructuralFilterTuple,
        k: usize,
        query_id: Option<usize>,
    ) -> Vec<(usize, usize)> {
        let query_id = query_id.unwrap_or(0);

        let mut tree_intersections = FxHashMap::default();
        for (lbl, query_label_nodes) in query_tree.1.iter() {
            if let Some(posting_list) = self.index.get(lbl) {
                for (tid, tree_size, posting_nodes) in posting_list
                    .iter()
                    // .skip(start)
                    .skip_while(|(_, size, _)| query_tree.0 - size > k)
                    .take_while(|(_, size, _)| *size <= k + query_tree.0)
                {
                    let overlapping_nodes = get_nodes_overlap(query_label_nodes, posting_nodes, k);

                    tree_intersections
                        .entry(*tid)
                        .and_modify(|(intersection_size, _)| {
                            *intersection_size += overlapping_nodes;
                        })
                        .or_insert((overlapping_nodes, *tree_size));
                }
            }
        }

        let mut candidates = vec![];
        // find candidates that have no label overlap but can fit by size because of threshold
        for (cid, tree_size) in self
            .size_index
            .iter()
            .enumerate()
            .take_while(|(_, ts)| query_tree.0.abs_diff(**ts) <= k)
        {
            if !tree_intersections.contains_key(&cid)
                && std::cmp::max(query_tree.0, *tree_size) <= k
            {
                candidates.push((query_id, cid));
            }
        }

        candidates.extend(
            tree_intersections
                .iter()
                .filter(|(_, (intersection_size, tree_size))| {
                    std::cmp::max(query_tree.0, *tree_size) - intersection_size <= k
                })
                .map(|(tid, _)| (query_id, *tid)),
        );
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svec_l1_distance_with_axes() {
        let a = StructuralVec {
            // mapping_region_splits: [[0; 4], [0, 1, 0, 0]],
            ..Default::default()
        };
        let b = StructuralVec {
            // mapping_region_splits: [[0, 0, 0, 1], [0; 4]],
            ..Default::default()
        };
        let dist = svec_l1(&a, &b);
        assert_eq!(dist, 2);
    }
}
