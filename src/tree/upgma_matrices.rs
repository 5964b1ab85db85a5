use std::cmp::{max, min};
use std::fmt::{Display, Formatter, Result};

use crate::distances::{DistanceMatrix, Mat};
use crate::tree::NodeIdx::{self, Internal as Int, Leaf};

/// A subtree that has not been merged yet.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Cluster {
    pub(super) idx: NodeIdx,
    /// Lexicographically smallest leaf id in the cluster.
    pub(super) label: String,
    pub(super) size: usize,
    pub(super) height: f64,
}

impl Cluster {
    pub(super) fn leaf(idx: usize, id: &str) -> Self {
        Self {
            idx: Leaf(idx),
            label: id.to_string(),
            size: 1,
            height: 0.0,
        }
    }

    fn merge(idx: usize, a: &Cluster, b: &Cluster, height: f64) -> Self {
        Self {
            idx: Int(idx),
            label: min(&a.label, &b.label).clone(),
            size: a.size + b.size,
            height,
        }
    }
}

/// Active clusters and the distances between them; row `k` of `distances` belongs to `clusters[k]`.
#[derive(Debug)]
pub(super) struct UPGMAMat {
    pub(super) clusters: Vec<Cluster>,
    pub(super) distances: Mat,
}

impl Display for UPGMAMat {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let labels: Vec<_> = self.clusters.iter().map(|c| (c.idx, &c.label)).collect();
        write!(f, "{:?}\n {}", labels, self.distances)
    }
}

impl UPGMAMat {
    pub(super) fn new(distances: &DistanceMatrix) -> Self {
        Self {
            clusters: distances
                .ids()
                .iter()
                .enumerate()
                .map(|(idx, id)| Cluster::leaf(idx, id))
                .collect(),
            distances: distances.matrix().clone(),
        }
    }

    pub(super) fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Positions `(i, j)` with `i > j` of the two closest clusters.
    ///
    /// Among equally close pairs the one with the smallest (label, label) tuple wins,
    /// the smaller label of the pair coming first.
    pub(super) fn closest_pair(&self) -> Option<(usize, usize)> {
        let mut arg_min = vec![];
        let mut val_min = f64::INFINITY;
        for i in 0..self.distances.nrows() {
            for j in 0..i {
                let val = self.distances[(i, j)];
                if val < val_min {
                    val_min = val;
                    arg_min = vec![(i, j)];
                } else if val == val_min {
                    arg_min.push((i, j));
                }
            }
        }
        arg_min
            .into_iter()
            .min_by_key(|&(i, j)| self.pair_key(i, j))
    }

    fn pair_key(&self, i: usize, j: usize) -> (&str, &str) {
        let (a, b) = (
            self.clusters[i].label.as_str(),
            self.clusters[j].label.as_str(),
        );
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub(super) fn add_merge_node(mut self, idx_new: usize, i: usize, j: usize, height: f64) -> Self {
        let new_row_index = self.distances.nrows();
        self.distances = self
            .distances
            .insert_row(new_row_index, 0.0)
            .insert_column(new_row_index, 0.0);
        let merged = Cluster::merge(idx_new, &self.clusters[i], &self.clusters[j], height);
        self.clusters.push(merged);
        self
    }

    /// Size weighted average of the distances of the two merged clusters.
    pub(super) fn recompute_new_node_distances(mut self, i: usize, j: usize) -> Self {
        let new_idx = self.distances.ncols() - 1;
        let size_i = self.clusters[i].size as f64;
        let size_j = self.clusters[j].size as f64;
        for k in (0..new_idx).filter(|&k| k != i && k != j) {
            let new_dist = (size_i * self.distances[(i, k)] + size_j * self.distances[(j, k)])
                / (size_i + size_j);
            self.distances[(new_idx, k)] = new_dist;
            self.distances[(k, new_idx)] = new_dist;
        }
        self
    }

    pub(super) fn remove_merged_nodes(mut self, i: usize, j: usize) -> Self {
        self.distances = self
            .distances
            .remove_columns_at(&[i, j])
            .remove_rows_at(&[i, j]);
        self.clusters.remove(max(i, j));
        self.clusters.remove(min(i, j));
        self
    }
}
