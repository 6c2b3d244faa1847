//! Tree edit distance kernels (C5): exact algorithms operating on a
//! [`crate::indexing::TreeIndex`] pair under a [`crate::cost::CostModel`].

pub mod apted;
pub mod cted;
pub mod touzet;
pub mod zhang_shasha;

use crate::cost::CostModel;
use crate::indexing::TreeIndex;
use crate::matrix::Matrix;

/// Zhang & Shasha's keyroot forest-distance recurrence (Zhang, Shasha 1989;
/// the same recurrence Pawlik & Augsten's RTED/APTED build on). Visits every
/// keyroot pair in ascending postorder -- a subtree's keyroot always has a
/// smaller postorder id than its ancestors' keyroots, so ascending order
/// guarantees a keyroot pair's dependencies (the `treedists` entries its
/// forest distance table reads through `l1`/`l2`) are already filled in.
///
/// Shared by [`zhang_shasha::ted`] (used as-is) and [`apted::ted`] (the
/// strategy array there only reorders which of this recurrence's symmetric
/// forms runs per pair; it does not change the value this computes).
pub(crate) fn keyroot_tree_dist<C: CostModel>(t1: &TreeIndex, t2: &TreeIndex, cost: &C) -> f64 {
    let n = t1.c.tree_size;
    let m = t2.c.tree_size;
    if n == 0 {
        return (0..m).map(|p| cost.ins(t2.postl_to_label_id[p]).into()).sum();
    }
    if m == 0 {
        return (0..n).map(|p| cost.del(t1.postl_to_label_id[p]).into()).sum();
    }

    let l1 = &t1.postl_to_lld;
    let l2 = &t2.postl_to_lld;
    let label1 = &t1.postl_to_label_id;
    let label2 = &t2.postl_to_label_id;

    let mut treedists = Matrix::<f64>::new(n, m);

    for &i in &t1.list_kr {
        let i = i as usize;
        for &j in &t2.list_kr {
            let j = j as usize;
            let li = l1[i] as usize;
            let lj = l2[j] as usize;
            let rows = i - li + 2;
            let cols = j - lj + 2;
            let mut fd = Matrix::<f64>::new(rows, cols);

            for x in 1..rows {
                let node = li + x - 1;
                let del: f64 = cost.del(label1[node]).into();
                let prev = *fd.read_at(x - 1, 0).unwrap();
                fd.set(x, 0, prev + del).unwrap();
            }
            for y in 1..cols {
                let node = lj + y - 1;
                let ins: f64 = cost.ins(label2[node]).into();
                let prev = *fd.read_at(0, y - 1).unwrap();
                fd.set(0, y, prev + ins).unwrap();
            }

            for x in 1..rows {
                let ii = li + x - 1;
                for y in 1..cols {
                    let jj = lj + y - 1;
                    let del: f64 = cost.del(label1[ii]).into();
                    let ins: f64 = cost.ins(label2[jj]).into();

                    if l1[ii] as usize == li && l2[jj] as usize == lj {
                        let ren: f64 = cost.ren(label1[ii], label2[jj]).into();
                        let d_del = fd.read_at(x - 1, y).unwrap() + del;
                        let d_ins = fd.read_at(x, y - 1).unwrap() + ins;
                        let d_ren = fd.read_at(x - 1, y - 1).unwrap() + ren;
                        let best = d_del.min(d_ins).min(d_ren);
                        fd.set(x, y, best).unwrap();
                        treedists.set(ii, jj, best).unwrap();
                    } else {
                        let xoff = l1[ii] as usize - li;
                        let yoff = l2[jj] as usize - lj;
                        let d_del = fd.read_at(x - 1, y).unwrap() + del;
                        let d_ins = fd.read_at(x, y - 1).unwrap() + ins;
                        let d_tree = fd.read_at(xoff, yoff).unwrap() + treedists.read_at(ii, jj).unwrap();
                        let best = d_del.min(d_ins).min(d_tree);
                        fd.set(x, y, best).unwrap();
                    }
                }
            }
        }
    }

    *treedists.read_at(n - 1, m - 1).unwrap()
}
