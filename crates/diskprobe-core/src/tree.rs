//! Scan results and bottom-up tree finalization.

use serde::{Deserialize, Serialize};

use crate::node::{NodeKind, ScanNode};

/// Global counters collected during a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Number of file nodes in the tree.
    pub files: u64,
    /// Number of directory nodes in the tree, root included.
    pub directories: u64,
    /// Directories that could not be read plus entries that could not be
    /// stat'ed. These are skipped, never fatal.
    pub access_errors: u64,
}

/// A finalized scan: the aggregated tree plus its counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSnapshot {
    /// Root of the tree.
    pub root: ScanNode,
    /// Counters collected during the walk.
    pub stats: ScanStats,
}

/// Aggregate sizes bottom-up and sort children, iteratively.
///
/// Pass 1 collects every directory node in pre-order; pass 2 walks that
/// sequence in reverse (post-order), so each directory sums children whose
/// own totals are already final. Children are ordered by `disk_usage`
/// descending with ascending `name` as the deterministic tie-break.
///
/// Idempotent, and safe for arbitrarily deep trees (no recursion).
pub fn finalize(root: &mut ScanNode) {
    let mut dirs: Vec<*mut ScanNode> = Vec::new();
    let mut visit: Vec<*mut ScanNode> = vec![root as *mut ScanNode];

    while let Some(ptr) = visit.pop() {
        // SAFETY: every pointer addresses a distinct node of a tree we hold
        // exclusively (`&mut` on the root), and only one reference is live
        // at a time.
        let node = unsafe { &mut *ptr };
        if !node.is_dir() {
            continue;
        }
        dirs.push(ptr);
        for child in node.children.iter_mut() {
            visit.push(child);
        }
    }

    for &ptr in dirs.iter().rev() {
        // SAFETY: reverse pre-order processes children before parents, so by
        // the time a parent's `children` vector is sorted (moving the child
        // structs), every pointer into it has already been retired.
        let node = unsafe { &mut *ptr };
        node.size_bytes = node.children.iter().map(|c| c.size_bytes).sum();
        node.disk_usage = node.children.iter().map(|c| c.disk_usage).sum();
        node.children.sort_by(|a, b| {
            b.disk_usage
                .cmp(&a.disk_usage)
                .then_with(|| a.name.cmp(&b.name))
        });
    }
}

/// Iterate all nodes in the tree, depth-first.
pub fn iter_nodes(root: &ScanNode) -> NodeIter<'_> {
    NodeIter { stack: vec![root] }
}

/// Depth-first iterator returned by [`iter_nodes`].
pub struct NodeIter<'a> {
    stack: Vec<&'a ScanNode>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a ScanNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter());
        Some(node)
    }
}

/// Return the `n` nodes with the largest `disk_usage`, excluding the root.
///
/// When `kind` is given, only nodes of that kind are considered. Output is
/// ordered largest-first.
pub fn top_nodes<'a>(root: &'a ScanNode, n: usize, kind: Option<NodeKind>) -> Vec<&'a ScanNode> {
    use std::cmp::Reverse;
    use std::collections::BinaryHeap;

    if n == 0 {
        return Vec::new();
    }

    // Min-heap of the n largest seen so far.
    let mut heap: BinaryHeap<Reverse<(u64, &str)>> = BinaryHeap::with_capacity(n + 1);
    let mut by_key: Vec<(&ScanNode, (u64, &str))> = Vec::new();

    for node in iter_nodes(root) {
        if node.path == root.path || kind.is_some_and(|k| k != node.kind) {
            continue;
        }
        let key = (node.disk_usage, node.path.as_str());
        if heap.len() < n {
            heap.push(Reverse(key));
            by_key.push((node, key));
        } else if heap.peek().is_some_and(|Reverse(min)| key > *min) {
            heap.pop();
            heap.push(Reverse(key));
            by_key.push((node, key));
        }
    }

    let kept: std::collections::HashSet<(u64, &str)> =
        heap.into_iter().map(|Reverse(k)| k).collect();
    let mut out: Vec<(&ScanNode, (u64, &str))> = by_key
        .into_iter()
        .filter(|(_, k)| kept.contains(k))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1));
    out.into_iter().map(|(node, _)| node).collect()
}
