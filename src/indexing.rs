//! Tree index builder (C3).
//!
//! `TreeIndex` bundles every array an algorithm in this crate might need,
//! built in one iterative traversal (an explicit stack, not native recursion,
//! so chain-shaped trees don't blow the platform stack — see the recursion
//! note in the design notes). Smaller, single-purpose indexes
//! (`SEDIndex`, `InvertedListLabelPostorderIndex`) stay around for callers
//! that only need a slice of this: `lb::sed` and `lb::label_intersection`
//! are cheap enough that building the full `TreeIndex` for them would be
//! wasted work.

use crate::cost::{CostModel, UnitCostModel};
use crate::parsing::{LabelDict, LabelId, ParsedTree};
use indextree::NodeId;
use rustc_hash::FxHashMap;

pub trait Indexer {
    fn index_tree(tree: &ParsedTree, label_dict: &LabelDict) -> Self
    where
        Self: Sized;
}

#[derive(Debug, Clone, Copy)]
pub struct ConstantsIndex {
    pub tree_size: usize,
}

#[derive(Debug)]
pub struct SEDIndex {
    pub preorder: Vec<i32>,
    pub postorder: Vec<i32>,
    pub c: ConstantsIndex,
}

impl Indexer for SEDIndex {
    fn index_tree(tree: &ParsedTree, _label_dict: &LabelDict) -> Self {
        let Some(root) = tree.iter().next() else {
            return Self {
                preorder: Vec::new(),
                postorder: Vec::new(),
                c: ConstantsIndex { tree_size: 0 },
            };
        };
        let root_id = tree.get_node_id(root).unwrap();

        let mut pre = Vec::with_capacity(tree.count());
        let mut post = Vec::with_capacity(tree.count());

        traverse(root_id, tree, &mut pre, &mut post);

        Self {
            postorder: post,
            preorder: pre,
            c: ConstantsIndex {
                tree_size: tree.count(),
            },
        }
    }
}

/// Iterative pre/postorder label sequence: explicit stacks, no native
/// recursion, so a chain-shaped tree can't blow the platform stack (see the
/// module doc's recursion note -- `TreeIndex::build` follows the same rule).
fn traverse(root_id: NodeId, tree: &ParsedTree, pre: &mut Vec<i32>, post: &mut Vec<i32>) {
    let mut pre_stack = vec![root_id];
    while let Some(nid) = pre_stack.pop() {
        pre.push(*tree.get(nid).unwrap().get());
        for c in nid.children(tree).collect::<Vec<_>>().into_iter().rev() {
            pre_stack.push(c);
        }
    }

    // Child-cursor postorder walk: each stack frame remembers its own
    // children and how far through them it has recursed.
    let mut frames: Vec<(NodeId, Vec<NodeId>, usize)> =
        vec![(root_id, root_id.children(tree).collect(), 0)];
    while let Some(frame) = frames.last_mut() {
        if frame.2 < frame.1.len() {
            let child = frame.1[frame.2];
            frame.2 += 1;
            let grandchildren = child.children(tree).collect();
            frames.push((child, grandchildren, 0));
        } else {
            post.push(*tree.get(frame.0).unwrap().get());
            frames.pop();
        }
    }
}

pub type InvListLblPost = FxHashMap<LabelId, Vec<i32>>;

/// Inverted list of nodes, key is index which is the label id in label dict
/// and postings list contains postorder traversal number
#[derive(Debug)]
pub struct InvertedListLabelPostorderIndex {
    pub inverted_list: InvListLblPost,
    pub c: ConstantsIndex,
}

impl Indexer for InvertedListLabelPostorderIndex {
    fn index_tree(tree: &ParsedTree, _label_dict: &LabelDict) -> Self {
        let Some(root) = tree.iter().next() else {
            return Self {
                inverted_list: InvListLblPost::default(),
                c: ConstantsIndex { tree_size: 0 },
            };
        };
        let mut inverted_list = InvListLblPost::default();
        let root_id = tree.get_node_id(root).unwrap();
        traverse_inverted(root_id, tree, &mut inverted_list, 0);

        Self {
            inverted_list,
            c: ConstantsIndex {
                tree_size: tree.count(),
            },
        }
    }
}

/// Same child-cursor postorder walk as `traverse`, assigning postorder ids
/// left to right as each node is popped with all its children already
/// visited -- no native recursion.
fn traverse_inverted(
    root_id: NodeId,
    tree: &ParsedTree,
    inverted_list: &mut InvListLblPost,
    start_postorder: i32,
) {
    let mut postorder_id = start_postorder;
    let mut frames: Vec<(NodeId, Vec<NodeId>, usize)> =
        vec![(root_id, root_id.children(tree).collect(), 0)];
    while let Some(frame) = frames.last_mut() {
        if frame.2 < frame.1.len() {
            let child = frame.1[frame.2];
            frame.2 += 1;
            let grandchildren = child.children(tree).collect();
            frames.push((child, grandchildren, 0));
        } else {
            let label = *tree.get(frame.0).unwrap().get();
            inverted_list
                .entry(label)
                .and_modify(|postings| postings.push(postorder_id))
                .or_insert_with(|| vec![postorder_id]);
            postorder_id += 1;
            frames.pop();
        }
    }
}

/// Lexical classification of a label for the JSON-aware kernels (C6).
/// `"{}"` -> object, `"[]"` -> array, a label ending in `:` -> key, else value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonNodeType {
    Object,
    Array,
    Key,
    Value,
}

impl JsonNodeType {
    pub fn classify(label: &str) -> Self {
        if label == "{}" {
            JsonNodeType::Object
        } else if label == "[]" {
            JsonNodeType::Array
        } else if label.ends_with(':') {
            JsonNodeType::Key
        } else {
            JsonNodeType::Value
        }
    }
}

/// The full per-tree capability bundle (C3). Every array named in the data
/// model table is populated by `TreeIndex::build`; algorithms only read the
/// subset they need.
#[derive(Debug)]
pub struct TreeIndex {
    pub c: ConstantsIndex,

    // --- preorder-indexed arrays ---
    pub prel_to_label_id: Vec<LabelId>,
    pub prel_to_size: Vec<i32>,
    pub prel_to_parent: Vec<i32>,
    pub prel_to_children: Vec<Vec<i32>>,
    pub prel_to_postl: Vec<i32>,
    pub prel_to_postr: Vec<i32>,
    pub prel_to_prer: Vec<i32>,
    pub prel_to_lld: Vec<i32>,
    pub prel_to_rld: Vec<i32>,
    pub prel_to_type_left: Vec<bool>,
    pub prel_to_type_right: Vec<bool>,
    pub prel_to_ln: Vec<i32>,
    pub prel_to_cost_all: Vec<i64>,
    pub prel_to_cost_left: Vec<i64>,
    pub prel_to_cost_right: Vec<i64>,
    pub prel_to_subtree_del_cost: Vec<f64>,
    pub prel_to_subtree_ins_cost: Vec<f64>,

    // --- postorder-indexed arrays ---
    pub postl_to_label_id: Vec<LabelId>,
    pub postl_to_size: Vec<i32>,
    pub postl_to_parent: Vec<i32>,
    pub postl_to_children: Vec<Vec<i32>>,
    pub postl_to_depth: Vec<i32>,
    pub postl_to_lld: Vec<i32>,
    pub postl_to_prel: Vec<i32>,
    pub postl_to_lch: Vec<i32>,
    pub postl_to_subtree_max_depth: Vec<i32>,
    pub postl_to_kr_ancestor: Vec<i32>,
    pub postl_to_type: Vec<JsonNodeType>,
    pub postl_to_fav_child: Vec<i32>,
    pub postl_to_favorder: Vec<i32>,

    // --- right-to-left orientation arrays ---
    pub postr_to_label_id: Vec<LabelId>,
    pub postr_to_prel: Vec<i32>,
    pub postr_to_rld: Vec<i32>,
    pub prer_to_prel: Vec<i32>,
    pub prer_to_ln: Vec<i32>,

    pub list_kr: Vec<i32>,
    pub inverted_list_label_id_to_postl: FxHashMap<LabelId, Vec<i32>>,
}

impl Indexer for TreeIndex {
    fn index_tree(tree: &ParsedTree, label_dict: &LabelDict) -> Self {
        Self::build(tree, label_dict, &UnitCostModel)
    }
}

impl TreeIndex {
    pub fn build<C: CostModel>(tree: &ParsedTree, label_dict: &LabelDict, cost: &C) -> Self {
        let n = tree.count();
        let Some(root) = tree.iter().next() else {
            return Self::empty();
        };
        let root_id = tree.get_node_id(root).unwrap();

        // Pass 1: iterative preorder. Assigns prel ids, parent links, depth,
        // children lists. Explicit stack, no native recursion.
        let mut order: Vec<NodeId> = Vec::with_capacity(n);
        let mut prel_to_parent = vec![-1i32; n];
        let mut depth = vec![0i32; n];
        let mut prel_to_children: Vec<Vec<i32>> = vec![Vec::new(); n];
        let mut prel_of_node: FxHashMap<NodeId, i32> = FxHashMap::default();

        let mut stack: Vec<(NodeId, i32, i32)> = vec![(root_id, -1, 0)];
        let mut counter = 0i32;
        while let Some((nid, ppre, d)) = stack.pop() {
            let pre = counter;
            counter += 1;
            order.push(nid);
            prel_of_node.insert(nid, pre);
            prel_to_parent[pre as usize] = ppre;
            depth[pre as usize] = d;
            if ppre >= 0 {
                prel_to_children[ppre as usize].push(pre);
            }
            let kids: Vec<NodeId> = nid.children(tree).collect();
            for c in kids.into_iter().rev() {
                stack.push((c, pre, d + 1));
            }
        }

        let prel_to_label_id: Vec<LabelId> =
            order.iter().map(|nid| *tree.get(*nid).unwrap().get()).collect();

        // Subtree sizes: children always have a larger prel, so a single
        // descending pass already sees every child's size.
        let mut prel_to_size = vec![1i32; n];
        for i in (0..n).rev() {
            let s: i32 = prel_to_children[i].iter().map(|&c| prel_to_size[c as usize]).sum();
            prel_to_size[i] += s;
        }

        // Pass 2: postorder ids via an explicit-stack child-cursor walk.
        let mut postl_of_prel = vec![-1i32; n];
        let mut prel_of_postl = vec![-1i32; n];
        {
            let mut post_counter = 0i32;
            let mut wstack: Vec<(i32, usize)> = vec![(0, 0)];
            while let Some(top) = wstack.last_mut() {
                let (pre, idx) = *top;
                if (idx as usize) < prel_to_children[pre as usize].len() {
                    let child = prel_to_children[pre as usize][idx];
                    top.1 += 1;
                    wstack.push((child, 0));
                } else {
                    postl_of_prel[pre as usize] = post_counter;
                    prel_of_postl[post_counter as usize] = pre;
                    post_counter += 1;
                    wstack.pop();
                }
            }
        }

        // Right-to-left preorder: descend into the rightmost child first.
        let mut prer_of_prel = vec![-1i32; n];
        let mut prel_of_prer = vec![-1i32; n];
        {
            let mut counter = 0i32;
            let mut explicit: Vec<NodeId> = vec![root_id];
            while let Some(nid) = explicit.pop() {
                let prer = counter;
                counter += 1;
                let pre = prel_of_node[&nid];
                prer_of_prel[pre as usize] = prer;
                prel_of_prer[prer as usize] = pre;
                // push children left-to-right so the rightmost pops first
                for c in nid.children(tree) {
                    explicit.push(c);
                }
            }
        }

        // Right-to-left postorder.
        let mut postr_of_prel = vec![-1i32; n];
        let mut prel_of_postr = vec![-1i32; n];
        {
            let mut post_counter = 0i32;
            let mut wstack: Vec<(i32, usize)> = vec![(0, 0)];
            while let Some(top) = wstack.last_mut() {
                let (pre, idx) = *top;
                let kids = &prel_to_children[pre as usize];
                if (idx as usize) < kids.len() {
                    let child = kids[kids.len() - 1 - idx as usize];
                    top.1 += 1;
                    wstack.push((child, 0));
                } else {
                    postr_of_prel[pre as usize] = post_counter;
                    prel_of_postr[post_counter as usize] = pre;
                    post_counter += 1;
                    wstack.pop();
                }
            }
        }

        // Leftmost / rightmost leaf descendants, in preorder.
        let mut prel_to_lld = vec![0i32; n];
        let mut prel_to_rld = vec![0i32; n];
        for i in (0..n).rev() {
            prel_to_lld[i] = match prel_to_children[i].first() {
                Some(&c) => prel_to_lld[c as usize],
                None => i as i32,
            };
            prel_to_rld[i] = match prel_to_children[i].last() {
                Some(&c) => prel_to_rld[c as usize],
                None => i as i32,
            };
        }

        // Leftmost/rightmost child type flags. Root counts as both, matching
        // the convention that the root starts (and ends) its own spine.
        let mut prel_to_type_left = vec![false; n];
        let mut prel_to_type_right = vec![false; n];
        prel_to_type_left[0] = true;
        prel_to_type_right[0] = true;
        for children in &prel_to_children {
            if let Some(&first) = children.first() {
                prel_to_type_left[first as usize] = true;
            }
            if let Some(&last) = children.last() {
                prel_to_type_right[last as usize] = true;
            }
        }

        // `ln` arrays: nearest leaf strictly to the left in each orientation.
        let mut prel_to_ln = vec![-1i32; n];
        {
            let mut last_leaf = -1i32;
            for i in 0..n {
                prel_to_ln[i] = last_leaf;
                if prel_to_children[i].is_empty() {
                    last_leaf = i as i32;
                }
            }
        }
        let mut prer_to_ln = vec![-1i32; n];
        {
            let mut last_leaf = -1i32;
            for i in 0..n {
                prer_to_ln[i] = last_leaf;
                let pre = prel_of_prer[i] as usize;
                if prel_to_children[pre].is_empty() {
                    last_leaf = i as i32;
                }
            }
        }

        // Derived postorder arrays.
        let postl_to_label_id: Vec<LabelId> = (0..n)
            .map(|postl| prel_to_label_id[prel_of_postl[postl] as usize])
            .collect();
        let postl_to_size: Vec<i32> = (0..n)
            .map(|postl| prel_to_size[prel_of_postl[postl] as usize])
            .collect();
        let postl_to_prel = prel_of_postl.clone();
        let postl_to_parent: Vec<i32> = (0..n)
            .map(|postl| {
                let p = prel_to_parent[prel_of_postl[postl] as usize];
                if p < 0 { -1 } else { postl_of_prel[p as usize] }
            })
            .collect();
        let postl_to_children: Vec<Vec<i32>> = (0..n)
            .map(|postl| {
                prel_to_children[prel_of_postl[postl] as usize]
                    .iter()
                    .map(|&c| postl_of_prel[c as usize])
                    .collect()
            })
            .collect();
        let postl_to_depth: Vec<i32> = (0..n)
            .map(|postl| depth[prel_of_postl[postl] as usize])
            .collect();
        let postl_to_lld: Vec<i32> = (0..n)
            .map(|postl| postl_of_prel[prel_to_lld[prel_of_postl[postl] as usize] as usize])
            .collect();
        let postl_to_lch: Vec<i32> = postl_to_children
            .iter()
            .map(|c| *c.first().unwrap_or(&-1))
            .collect();

        let postr_to_label_id: Vec<LabelId> = (0..n)
            .map(|postr| prel_to_label_id[prel_of_postr[postr] as usize])
            .collect();
        let postr_to_prel = prel_of_postr.clone();
        let postr_to_rld: Vec<i32> = (0..n)
            .map(|postr| postr_of_prel[prel_to_rld[prel_of_postr[postr] as usize] as usize])
            .collect();

        // subtree_max_depth: bottom-up over postorder (children seen first).
        let mut postl_to_subtree_max_depth = vec![0i32; n];
        for postl in 0..n {
            let mut m = postl_to_depth[postl];
            for &c in &postl_to_children[postl] {
                m = m.max(postl_to_subtree_max_depth[c as usize]);
            }
            postl_to_subtree_max_depth[postl] = m;
        }

        // Keyroots: root, plus every non-leftmost child, ascending postorder.
        let mut list_kr: Vec<i32> = (0..n as i32)
            .filter(|&postl| {
                let pre = postl_to_prel[postl as usize];
                pre == 0 || !prel_to_type_left[pre as usize]
            })
            .collect();
        list_kr.sort_unstable();

        // Nearest keyroot ancestor, propagated down each leftmost-child chain.
        let mut postl_to_kr_ancestor = vec![-1i32; n];
        for &kr in &list_kr {
            let mut cur = kr;
            postl_to_kr_ancestor[cur as usize] = kr;
            while postl_to_lch[cur as usize] != -1 {
                cur = postl_to_lch[cur as usize];
                postl_to_kr_ancestor[cur as usize] = kr;
            }
        }

        // JSON node typing from label lexical form.
        let id_to_label: FxHashMap<LabelId, &str> = label_dict
            .iter()
            .map(|(s, (id, _))| (*id, s.as_str()))
            .collect();
        let postl_to_type: Vec<JsonNodeType> = postl_to_label_id
            .iter()
            .map(|id| id_to_label.get(id).map_or(JsonNodeType::Value, |s| JsonNodeType::classify(s)))
            .collect();

        // Favorable child: child whose subtree has maximum height
        // (height = deepest depth in subtree - node's own depth).
        let postl_to_fav_child: Vec<i32> = postl_to_children
            .iter()
            .map(|kids| {
                kids.iter()
                    .copied()
                    .max_by_key(|&c| {
                        postl_to_subtree_max_depth[c as usize] - postl_to_depth[c as usize]
                    })
                    .unwrap_or(-1)
            })
            .collect();

        let postl_to_favorder = compute_favorable_order(n, &postl_to_children, &postl_to_fav_child);

        let mut inverted_list_label_id_to_postl: FxHashMap<LabelId, Vec<i32>> = FxHashMap::default();
        for (postl, &label) in postl_to_label_id.iter().enumerate() {
            inverted_list_label_id_to_postl
                .entry(label)
                .or_default()
                .push(postl as i32);
        }

        // APTED strategy cost arrays, reverse preorder (children before parent).
        let mut prel_to_cost_all = vec![0i64; n];
        let mut prel_to_cost_left = vec![0i64; n];
        let mut prel_to_cost_right = vec![0i64; n];
        for i in (0..n).rev() {
            let s = prel_to_size[i] as i64;
            let children_sum: i64 = prel_to_children[i]
                .iter()
                .map(|&c| prel_to_cost_all[c as usize])
                .sum();
            prel_to_cost_all[i] = s * (s + 3) / 2 - children_sum;
            prel_to_cost_left[i] = s
                + prel_to_children[i]
                    .first()
                    .map_or(0, |&c| prel_to_cost_left[c as usize]);
            prel_to_cost_right[i] = s
                + prel_to_children[i]
                    .last()
                    .map_or(0, |&c| prel_to_cost_right[c as usize]);
        }

        // Subtree delete/insert cost, reverse preorder.
        let mut prel_to_subtree_del_cost = vec![0.0f64; n];
        let mut prel_to_subtree_ins_cost = vec![0.0f64; n];
        for i in (0..n).rev() {
            let own_del: f64 = cost.del(prel_to_label_id[i]).into();
            let own_ins: f64 = cost.ins(prel_to_label_id[i]).into();
            let child_del: f64 = prel_to_children[i]
                .iter()
                .map(|&c| prel_to_subtree_del_cost[c as usize])
                .sum();
            let child_ins: f64 = prel_to_children[i]
                .iter()
                .map(|&c| prel_to_subtree_ins_cost[c as usize])
                .sum();
            prel_to_subtree_del_cost[i] = own_del + child_del;
            prel_to_subtree_ins_cost[i] = own_ins + child_ins;
        }

        let prel_to_postl = postl_of_prel;
        let prel_to_postr = postr_of_prel;
        let prel_to_prer = prer_of_prel;

        TreeIndex {
            c: ConstantsIndex { tree_size: n },
            prel_to_label_id,
            prel_to_size,
            prel_to_parent,
            prel_to_children,
            prel_to_postl,
            prel_to_postr,
            prel_to_prer,
            prel_to_lld,
            prel_to_rld,
            prel_to_type_left,
            prel_to_type_right,
            prel_to_ln,
            prel_to_cost_all,
            prel_to_cost_left,
            prel_to_cost_right,
            prel_to_subtree_del_cost,
            prel_to_subtree_ins_cost,
            postl_to_label_id,
            postl_to_size,
            postl_to_parent,
            postl_to_children,
            postl_to_depth,
            postl_to_lld,
            postl_to_prel,
            postl_to_lch,
            postl_to_subtree_max_depth,
            postl_to_kr_ancestor,
            postl_to_type,
            postl_to_fav_child,
            postl_to_favorder,
            postr_to_label_id,
            postr_to_prel,
            postr_to_rld,
            prer_to_prel,
            prer_to_ln,
            list_kr,
            inverted_list_label_id_to_postl,
        }
    }

    /// The index of an empty tree: every array empty, `tree_size == 0`. Lets
    /// every kernel's `n == 0` / `m == 0` base case actually be exercised
    /// instead of being unreachable dead code, since `ParsedTree::new()` (an
    /// empty indextree `Arena`) is a valid tree that never comes out of the
    /// bracket-notation parser.
    pub fn empty() -> Self {
        TreeIndex {
            c: ConstantsIndex { tree_size: 0 },
            prel_to_label_id: Vec::new(),
            prel_to_size: Vec::new(),
            prel_to_parent: Vec::new(),
            prel_to_children: Vec::new(),
            prel_to_postl: Vec::new(),
            prel_to_postr: Vec::new(),
            prel_to_prer: Vec::new(),
            prel_to_lld: Vec::new(),
            prel_to_rld: Vec::new(),
            prel_to_type_left: Vec::new(),
            prel_to_type_right: Vec::new(),
            prel_to_ln: Vec::new(),
            prel_to_cost_all: Vec::new(),
            prel_to_cost_left: Vec::new(),
            prel_to_cost_right: Vec::new(),
            prel_to_subtree_del_cost: Vec::new(),
            prel_to_subtree_ins_cost: Vec::new(),
            postl_to_label_id: Vec::new(),
            postl_to_size: Vec::new(),
            postl_to_parent: Vec::new(),
            postl_to_children: Vec::new(),
            postl_to_depth: Vec::new(),
            postl_to_lld: Vec::new(),
            postl_to_prel: Vec::new(),
            postl_to_lch: Vec::new(),
            postl_to_subtree_max_depth: Vec::new(),
            postl_to_kr_ancestor: Vec::new(),
            postl_to_type: Vec::new(),
            postl_to_fav_child: Vec::new(),
            postl_to_favorder: Vec::new(),
            postr_to_label_id: Vec::new(),
            postr_to_prel: Vec::new(),
            postr_to_rld: Vec::new(),
            prer_to_prel: Vec::new(),
            prer_to_ln: Vec::new(),
            list_kr: Vec::new(),
            inverted_list_label_id_to_postl: FxHashMap::default(),
        }
    }
}

/// Computes the favorable-child traversal order (JOFilter): a postorder-like
/// walk where, at each node, the favorable child is visited last among
/// siblings. Returns, for each normal postorder id, its rank (0..n-1) in
/// that walk.
fn compute_favorable_order(
    n: usize,
    postl_to_children: &[Vec<i32>],
    postl_to_fav_child: &[i32],
) -> Vec<i32> {
    if n == 0 {
        return vec![];
    }
    let root_postl = (n - 1) as i32;
    let mut rank = vec![0i32; n];
    let mut counter = 0i32;
    let mut stack: Vec<(i32, usize)> = vec![(root_postl, 0)];
    // Build a per-node visiting order with the favorable child moved last.
    let ordered_children: Vec<Vec<i32>> = postl_to_children
        .iter()
        .enumerate()
        .map(|(postl, kids)| {
            let fav = postl_to_fav_child[postl];
            let mut non_fav: Vec<i32> = kids.iter().copied().filter(|&c| c != fav).collect();
            if fav != -1 {
                non_fav.push(fav);
            }
            non_fav
        })
        .collect();
    while let Some(top) = stack.last_mut() {
        let (node, idx) = *top;
        let kids = &ordered_children[node as usize];
        if (idx as usize) < kids.len() {
            let child = kids[idx as usize];
            top.1 += 1;
            stack.push((child, 0));
        } else {
            rank[node as usize] = counter;
            counter += 1;
            stack.pop();
        }
    }
    rank
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse_single;

    fn build(tree_str: &str) -> (TreeIndex, LabelDict) {
        let mut label_dict = LabelDict::new();
        let tree = parse_single(tree_str.to_owned(), &mut label_dict);
        let idx = TreeIndex::index_tree(&tree, &label_dict);
        (idx, label_dict)
    }

    #[test]
    fn test_pre_and_postorder_sizes() {
        let tree_str = "{1{2{5}{6}}{3{7}}{4{8}{9}}}".to_owned();
        let mut label_dict = LabelDict::new();
        let parsed_tree = parse_single(tree_str, &mut label_dict);

        let sed_index = SEDIndex::index_tree(&parsed_tree, &label_dict);
        assert_eq!(sed_index.preorder.len(), 9);
        assert_eq!(sed_index.postorder.len(), 9);
    }

    #[test]
    fn keyroots_contain_root_and_non_leftmost_children() {
        let (idx, _ld) = build("{a{b{d}{e}}{c{f}}}");
        assert_eq!(idx.c.tree_size, 6);
        let root_postl = idx.c.tree_size as i32 - 1;
        assert!(idx.list_kr.contains(&root_postl));
        // kr ancestor of every node is itself or an ancestor.
        for (postl, &kr) in idx.postl_to_kr_ancestor.iter().enumerate() {
            assert!(kr >= postl as i32);
        }
    }

    #[test]
    fn postorder_preorder_bijection_roundtrips() {
        let (idx, _ld) = build("{a{b{d}{e}}{c{f}}}");
        for postl in 0..idx.c.tree_size {
            let pre = idx.postl_to_prel[postl];
            assert_eq!(idx.prel_to_postl[pre as usize], postl as i32);
        }
        for postl in 0..idx.c.tree_size {
            assert!(idx.postl_to_lld[postl] <= postl as i32);
        }
    }

    #[test]
    fn test_inverted_list_postorder_index() {
        let mut label_dict = LabelDict::new();
        let tree = parse_single("{a{a{f}{b}{x}}{b}{y}}".to_owned(), &mut label_dict);
        let idx = InvertedListLabelPostorderIndex::index_tree(&tree, &label_dict);
        let total: usize = idx.inverted_list.values().map(|v| v.len()).sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn json_label_typing_from_lexical_form() {
        let (idx, _ld) = build(r#"{{}{k1:{v1}}}"#);
        assert!(idx
            .postl_to_type
            .iter()
            .any(|t| matches!(t, JsonNodeType::Object)));
        assert!(idx
            .postl_to_type
            .iter()
            .any(|t| matches!(t, JsonNodeType::Key)));
    }

    #[test]
    fn favorable_order_is_a_permutation() {
        let (idx, _ld) = build("{a{b{d}{e}}{c{f}}}");
        let mut sorted = idx.postl_to_favorder.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..idx.c.tree_size as i32).collect::<Vec<_>>());
    }
}
