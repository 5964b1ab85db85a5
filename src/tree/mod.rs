use std::fmt::{Display, Formatter};

use anyhow::{anyhow, bail};
use hashbrown::HashSet;
use itertools::Itertools;

use crate::sequences::EmptyInputError;
use crate::Result;
use NodeIdx::{Internal as Int, Leaf};

pub mod tree_builder;
mod tree_node;
mod upgma_builder;
mod upgma_matrices;

pub use tree_node::Node;
pub use upgma_builder::{DegenerateDistanceError, NegativeBranchPolicy, UPGMABuilder};

#[derive(Debug, PartialEq, Clone, Copy, PartialOrd, Eq, Ord, Hash)]
pub enum NodeIdx {
    Internal(usize),
    Leaf(usize),
}

impl Display for NodeIdx {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Int(idx) => write!(f, "Internal node {}", idx),
            Leaf(idx) => write!(f, "Leaf node {}", idx),
        }
    }
}

impl From<NodeIdx> for usize {
    fn from(node_idx: NodeIdx) -> usize {
        match node_idx {
            Int(idx) => idx,
            Leaf(idx) => idx,
        }
    }
}

impl From<&NodeIdx> for usize {
    fn from(node_idx: &NodeIdx) -> usize {
        usize::from(*node_idx)
    }
}

/// Rooted tree stored as an arena of nodes.
///
/// Leaves occupy indices `0..n`, internal nodes follow in the order they were created,
/// so for a tree built from `n > 1` leaves the root is `Internal(2n - 2)`.
#[derive(Debug, Clone)]
pub struct Tree {
    pub root: NodeIdx,
    pub(crate) nodes: Vec<Node>,
    pub postorder: Vec<NodeIdx>,
    pub preorder: Vec<NodeIdx>,
    pub complete: bool,
    pub n: usize,
    /// Height of the root above the leaves.
    pub height: f64,
}

impl Tree {
    /// Creates a tree holding only the leaves. A single leaf is already a complete tree.
    pub fn new<S: AsRef<str>>(leaf_ids: &[S]) -> Result<Self> {
        let n = leaf_ids.len();
        if n == 0 {
            bail!(EmptyInputError);
        }
        let mut nodes = Vec::with_capacity(2 * n - 1);
        nodes.extend(
            leaf_ids
                .iter()
                .enumerate()
                .map(|(idx, id)| Node::new_leaf(idx, None, 0.0, id.as_ref().to_string())),
        );
        let mut tree = Self {
            root: if n == 1 { Leaf(0) } else { Int(2 * n - 2) },
            nodes,
            postorder: Vec::new(),
            preorder: Vec::new(),
            complete: n == 1,
            n,
            height: 0.0,
        };
        if tree.complete {
            tree.compute_postorder();
            tree.compute_preorder();
        }
        Ok(tree)
    }

    /// Joins two existing nodes under a new internal node at the given height.
    pub(crate) fn add_parent(
        &mut self,
        parent_idx: usize,
        height: f64,
        idx_i: &NodeIdx,
        idx_j: &NodeIdx,
        blen_i: f64,
        blen_j: f64,
    ) {
        debug_assert_eq!(parent_idx, self.nodes.len());
        self.nodes.push(Node::new_internal(
            parent_idx,
            None,
            vec![*idx_i, *idx_j],
            0.0,
            height,
        ));
        let parent = Int(parent_idx);
        self.nodes[usize::from(idx_i)].add_parent(&parent, blen_i);
        self.nodes[usize::from(idx_j)].add_parent(&parent, blen_j);
    }

    pub(crate) fn compute_postorder(&mut self) {
        let mut order = Vec::<NodeIdx>::with_capacity(self.len());
        let mut stack = Vec::<NodeIdx>::with_capacity(self.len());
        stack.push(self.root);
        while let Some(cur_root) = stack.pop() {
            order.push(cur_root);
            stack.extend(self.nodes[usize::from(cur_root)].children.iter());
        }
        order.reverse();
        self.postorder = order;
    }

    pub(crate) fn compute_preorder(&mut self) {
        self.preorder = self.preorder_subroot(&self.root);
    }

    pub fn preorder_subroot(&self, subroot_idx: &NodeIdx) -> Vec<NodeIdx> {
        let mut order = Vec::<NodeIdx>::with_capacity(self.len());
        let mut stack = Vec::<NodeIdx>::with_capacity(self.len());
        stack.push(*subroot_idx);
        while let Some(cur_root) = stack.pop() {
            order.push(cur_root);
            stack.extend(self.nodes[usize::from(cur_root)].children.iter().rev());
        }
        order
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn leaves(&self) -> Vec<&Node> {
        self.nodes.iter().filter(|node| node.is_leaf()).collect()
    }

    pub fn internals(&self) -> Vec<&Node> {
        self.nodes.iter().filter(|node| !node.is_leaf()).collect()
    }

    pub fn leaf_ids(&self) -> Vec<String> {
        self.leaves().iter().map(|node| node.id.clone()).collect()
    }

    pub fn node(&self, node_idx: &NodeIdx) -> &Node {
        &self.nodes[usize::from(node_idx)]
    }

    pub fn children(&self, node_idx: &NodeIdx) -> &[NodeIdx] {
        &self.node(node_idx).children
    }

    pub fn parent(&self, node_idx: &NodeIdx) -> Option<&NodeIdx> {
        self.node(node_idx).parent.as_ref()
    }

    pub fn blen(&self, node_idx: &NodeIdx) -> f64 {
        self.node(node_idx).blen
    }

    pub fn node_height(&self, node_idx: &NodeIdx) -> f64 {
        self.node(node_idx).height
    }

    /// Returns the leaf with the given id, panics if there is none.
    pub fn by_id(&self, id: &str) -> &Node {
        self.nodes
            .iter()
            .find(|node| node.is_leaf() && node.id == id)
            .unwrap_or_else(|| panic!("No leaf with id {} in the tree", id))
    }

    pub fn try_idx(&self, id: &str) -> Result<NodeIdx> {
        self.nodes
            .iter()
            .find(|node| node.is_leaf() && node.id == id)
            .map(|node| node.idx)
            .ok_or_else(|| anyhow!("No leaf with id {} in the tree", id))
    }

    /// Sum of all branch lengths.
    pub fn total_length(&self) -> f64 {
        self.nodes.iter().map(|node| node.blen).sum()
    }

    /// The node followed by all of its ancestors up to the root.
    pub fn ancestors(&self, node_idx: &NodeIdx) -> Vec<NodeIdx> {
        let mut path = vec![*node_idx];
        let mut cur = *node_idx;
        while let Some(parent) = self.parent(&cur) {
            path.push(*parent);
            cur = *parent;
        }
        path
    }

    /// Sum of branch lengths on the path from the node up to one of its ancestors.
    pub fn path_length(&self, node_idx: &NodeIdx, ancestor_idx: &NodeIdx) -> Result<f64> {
        let mut length = 0.0;
        for idx in self.ancestors(node_idx) {
            if idx == *ancestor_idx {
                return Ok(length);
            }
            length += self.blen(&idx);
        }
        bail!("{} is not an ancestor of {}", ancestor_idx, node_idx)
    }

    pub fn root_distance(&self, node_idx: &NodeIdx) -> f64 {
        self.ancestors(node_idx)
            .iter()
            .map(|idx| self.blen(idx))
            .sum()
    }

    pub fn root_to_leaf(&self, id: &str) -> Result<f64> {
        Ok(self.root_distance(&self.try_idx(id)?))
    }

    /// Most recent common ancestor of two nodes, a node being its own ancestor.
    pub fn mrca(&self, idx_a: &NodeIdx, idx_b: &NodeIdx) -> NodeIdx {
        let ancestors_a: HashSet<NodeIdx> = self.ancestors(idx_a).into_iter().collect();
        self.ancestors(idx_b)
            .into_iter()
            .find(|idx| ancestors_a.contains(idx))
            .unwrap_or(self.root)
    }

    pub fn mrca_by_id(&self, id_a: &str, id_b: &str) -> Result<NodeIdx> {
        Ok(self.mrca(&self.try_idx(id_a)?, &self.try_idx(id_b)?))
    }

    /// Length of the path between two leaves through their most recent common ancestor.
    pub fn leaf_distance(&self, id_a: &str, id_b: &str) -> Result<f64> {
        let (idx_a, idx_b) = (self.try_idx(id_a)?, self.try_idx(id_b)?);
        let mrca = self.mrca(&idx_a, &idx_b);
        Ok(self.path_length(&idx_a, &mrca)? + self.path_length(&idx_b, &mrca)?)
    }

    /// Checks that all leaves are at the same distance from the root, up to `epsilon`.
    pub fn is_ultrametric(&self, epsilon: f64) -> bool {
        let distances = self
            .leaves()
            .iter()
            .map(|leaf| self.root_distance(&leaf.idx))
            .collect::<Vec<_>>();
        match distances.iter().copied().minmax().into_option() {
            Some((min, max)) => max - min <= epsilon,
            None => true,
        }
    }

    pub fn to_newick(&self) -> String {
        format!("{};", self.subtree_to_newick(&self.root))
    }

    fn subtree_to_newick(&self, node_idx: &NodeIdx) -> String {
        let node = self.node(node_idx);
        let label = match node_idx {
            Int(_) => format!(
                "({}){}",
                node.children
                    .iter()
                    .map(|child| self.subtree_to_newick(child))
                    .join(","),
                newick_label(&node.id)
            ),
            Leaf(_) => newick_label(&node.id),
        };
        match node.parent {
            Some(_) => format!("{}:{}", label, node.blen),
            None => label,
        }
    }
}

/// Wraps labels holding Newick punctuation or whitespace in single quotes, doubling inner quotes.
fn newick_label(id: &str) -> String {
    if id
        .chars()
        .any(|c| c.is_whitespace() || "()[]':;,".contains(c))
    {
        format!("'{}'", id.replace('\'', "''"))
    } else {
        id.to_string()
    }
}

impl Display for Tree {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_newick())
    }
}
