use std::error::Error;
use std::fmt;

use anyhow::bail;
use log::{debug, info, warn};

use crate::distances::DistanceMatrix;
use crate::sequences::Sequences;
use crate::tree::tree_builder::TreeBuilder;
use crate::tree::upgma_matrices::{Cluster, UPGMAMat};
use crate::tree::Tree;
use crate::Result;

/// A merge placed a node below one of its children.
#[derive(Debug, Clone, PartialEq)]
pub struct DegenerateDistanceError {
    pub label: String,
    pub blen: f64,
}

impl fmt::Display for DegenerateDistanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Negative branch length {} above the cluster containing {}, distances are not ultrametric",
            self.blen, self.label
        )
    }
}
impl Error for DegenerateDistanceError {}

/// What to do when a merge height lies below the height of a merged cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NegativeBranchPolicy {
    /// Set the branch length to zero and log a warning.
    #[default]
    Clamp,
    /// Fail with [`DegenerateDistanceError`].
    Fail,
}

/// Builds rooted ultrametric trees with UPGMA on Hamming distances.
///
/// Two clusters merge at half their distance, distances to the merged cluster are the
/// size weighted averages of the distances to its two parts.
///
/// # Example
/// ```
/// use upgma::sequences::Sequences;
/// use upgma::tree::{tree_builder::TreeBuilder, UPGMABuilder};
///
/// let sequences = Sequences::from_map([("A", "AAAA"), ("B", "AAAC"), ("C", "ACCC")]).unwrap();
/// let tree = UPGMABuilder::new().build_tree(&sequences).unwrap();
/// assert_eq!(tree.leaves().len(), 3);
/// assert_eq!(tree.height, 1.25);
/// assert!(tree.is_ultrametric(1e-9));
/// ```
#[derive(Debug, Clone, Default)]
pub struct UPGMABuilder {
    negative_branches: NegativeBranchPolicy,
}

impl TreeBuilder for UPGMABuilder {
    fn build_tree(&self, sequences: &Sequences) -> Result<Tree> {
        let distances = DistanceMatrix::new(sequences)?;
        self.build_tree_from_distances(&distances)
    }
}

impl UPGMABuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn negative_branches(mut self, policy: NegativeBranchPolicy) -> Self {
        self.negative_branches = policy;
        self
    }

    pub fn build_tree_from_distances(&self, distances: &DistanceMatrix) -> Result<Tree> {
        self.build_tree_from_matrix(UPGMAMat::new(distances), distances.ids())
    }

    fn build_tree_from_matrix(&self, mut upgma_data: UPGMAMat, ids: &[String]) -> Result<Tree> {
        let n = upgma_data.len();
        let mut tree = Tree::new(ids)?;
        info!("Building UPGMA tree for {} leaves", n);
        for idx_new in n..(2 * n - 1) {
            debug!("Active clusters and distances:\n{}", upgma_data);
            let Some((i, j)) = upgma_data.closest_pair() else {
                bail!("No clusters left to merge with {} of them active", upgma_data.len());
            };
            let height = upgma_data.distances[(i, j)] / 2.0;
            let (first, second) = if upgma_data.clusters[i].label < upgma_data.clusters[j].label {
                (&upgma_data.clusters[i], &upgma_data.clusters[j])
            } else {
                (&upgma_data.clusters[j], &upgma_data.clusters[i])
            };
            let blen_first = self.branch_length(height, first)?;
            let blen_second = self.branch_length(height, second)?;
            debug!(
                "Merging {} ({}) and {} ({}) at height {}",
                first.idx, first.label, second.idx, second.label, height
            );
            tree.add_parent(
                idx_new,
                height,
                &first.idx,
                &second.idx,
                blen_first,
                blen_second,
            );
            upgma_data = upgma_data
                .add_merge_node(idx_new, i, j, height)
                .recompute_new_node_distances(i, j)
                .remove_merged_nodes(i, j);
        }
        tree.complete = true;
        tree.compute_postorder();
        tree.compute_preorder();
        tree.height = tree.node(&tree.root).height;
        info!("Finished UPGMA tree with root height {}", tree.height);
        Ok(tree)
    }

    fn branch_length(&self, height: f64, child: &Cluster) -> Result<f64> {
        let blen = height - child.height;
        if blen >= 0.0 {
            return Ok(blen);
        }
        match self.negative_branches {
            NegativeBranchPolicy::Clamp => {
                warn!(
                    "Negative branch length {} above the cluster containing {}, setting it to 0",
                    blen, child.label
                );
                Ok(0.0)
            }
            NegativeBranchPolicy::Fail => bail!(DegenerateDistanceError {
                label: child.label.clone(),
                blen,
            }),
        }
    }
}
