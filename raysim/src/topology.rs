//! Spanning-tree construction and the initial holder pointers.
//!
//! The simulator runs on one fixed shape: the heap tree, where node i's
//! parent is node i/2 and node 1 starts with the token. `from_parents`
//! accepts any rooted spanning tree over 1..=N so alternative shapes can
//! be wired in without touching the state machine, but nothing in the
//! simulator builds one today.

use hashbrown::{HashMap, HashSet};

use raymond::NodeId;

/// An undirected spanning tree over nodes 1..=N, stored as parent
/// pointers from a chosen root.
///
/// The tree never changes during a run; the token's position is encoded
/// in the per-node holder pointers, which always select a tree edge (or
/// self). This type is what the invariant checker compares those pointers
/// against.
#[derive(Debug, Clone)]
pub struct Tree {
    root: NodeId,
    parents: HashMap<NodeId, NodeId>,
    size: u32,
}

impl Tree {
    /// Build the heap-shaped binary tree over `n` nodes: parent(i) = i/2,
    /// node 1 is the root and initial token holder.
    pub fn heap(n: u32) -> Self {
        assert!(n >= 1, "a tree needs at least one node");

        let mut parents = HashMap::with_capacity(n.saturating_sub(1) as usize);
        for i in 2..=n {
            parents.insert(NodeId::new(i), NodeId::new(i / 2));
        }

        Self {
            root: NodeId::new(1),
            parents,
            size: n,
        }
    }

    /// Build a tree from explicit parent edges `(child, parent)` over
    /// nodes 1..=n with the given root.
    ///
    /// Returns `None` unless the edges form exactly one rooted spanning
    /// tree: every non-root node has one parent, the root has none, and
    /// every parent chain reaches the root.
    pub fn from_parents(n: u32, root: NodeId, edges: &[(NodeId, NodeId)]) -> Option<Self> {
        if n < 1 || root.get() > n || edges.len() != (n as usize) - 1 {
            return None;
        }

        let mut parents = HashMap::with_capacity(edges.len());
        for &(child, parent) in edges {
            if child == root || child.get() > n || parent.get() > n {
                return None;
            }
            if parents.insert(child, parent).is_some() {
                return None;
            }
        }

        let tree = Self {
            root,
            parents,
            size: n,
        };

        // Every node must reach the root without revisiting itself; with
        // n-1 distinct children this also rules out cycles.
        for i in 1..=n {
            let mut cursor = NodeId::new(i);
            let mut hops = 0u32;
            while cursor != root {
                cursor = *tree.parents.get(&cursor)?;
                hops += 1;
                if hops > n {
                    return None;
                }
            }
        }

        Some(tree)
    }

    /// Number of nodes.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The initial token holder.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// All node ids in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (1..=self.size).map(NodeId::new)
    }

    /// A node's initial holder pointer: its parent, or itself at the root.
    pub fn initial_holder(&self, node: NodeId) -> NodeId {
        self.parents.get(&node).copied().unwrap_or(node)
    }

    /// Whether `{a, b}` is a tree edge.
    pub fn is_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.parents.get(&a) == Some(&b) || self.parents.get(&b) == Some(&a)
    }

    /// The unordered edge set, each edge in canonical (low, high) order.
    pub fn edges(&self) -> HashSet<(NodeId, NodeId)> {
        self.parents
            .iter()
            .map(|(&child, &parent)| canonical_pair(child, parent))
            .collect()
    }
}

/// Canonical ordering for an unordered node pair.
pub fn canonical_pair(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(id: u32) -> NodeId {
        NodeId::new(id)
    }

    #[test]
    fn test_heap_parent_rule() {
        let tree = Tree::heap(7);
        assert_eq!(tree.root(), n(1));
        assert_eq!(tree.initial_holder(n(1)), n(1));
        assert_eq!(tree.initial_holder(n(2)), n(1));
        assert_eq!(tree.initial_holder(n(3)), n(1));
        assert_eq!(tree.initial_holder(n(4)), n(2));
        assert_eq!(tree.initial_holder(n(5)), n(2));
        assert_eq!(tree.initial_holder(n(6)), n(3));
        assert_eq!(tree.initial_holder(n(7)), n(3));
    }

    #[test]
    fn test_single_node_tree() {
        let tree = Tree::heap(1);
        assert_eq!(tree.size(), 1);
        assert_eq!(tree.initial_holder(n(1)), n(1));
        assert!(tree.edges().is_empty());
    }

    #[test]
    fn test_edges_are_canonical() {
        let tree = Tree::heap(3);
        let edges = tree.edges();
        assert_eq!(edges.len(), 2);
        assert!(edges.contains(&(n(1), n(2))));
        assert!(edges.contains(&(n(1), n(3))));
        assert!(tree.is_edge(n(2), n(1)));
        assert!(!tree.is_edge(n(2), n(3)));
    }

    #[test]
    fn test_from_parents_accepts_chain() {
        let tree = Tree::from_parents(3, n(3), &[(n(1), n(2)), (n(2), n(3))]).unwrap();
        assert_eq!(tree.initial_holder(n(3)), n(3));
        assert_eq!(tree.initial_holder(n(1)), n(2));
        assert!(tree.is_edge(n(2), n(3)));
    }

    #[test]
    fn test_from_parents_rejects_malformed() {
        // Wrong edge count.
        assert!(Tree::from_parents(3, n(1), &[(n(2), n(1))]).is_none());
        // Root with a parent.
        assert!(Tree::from_parents(2, n(1), &[(n(1), n(2))]).is_none());
        // Cycle disconnected from the root.
        assert!(Tree::from_parents(4, n(1), &[(n(2), n(3)), (n(3), n(2)), (n(4), n(1))]).is_none());
        // Duplicate child.
        assert!(Tree::from_parents(3, n(1), &[(n(2), n(1)), (n(2), n(3))]).is_none());
    }
}
