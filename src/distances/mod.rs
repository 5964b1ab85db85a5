use std::fmt::{Display, Formatter};

use anyhow::{anyhow, bail};
use bio::alignment::distance::hamming;
use hashbrown::HashSet;
use itertools::Itertools;
use log::{debug, info};
use nalgebra::DMatrix;

use crate::io::DataError;
use crate::sequences::{symbols, DuplicateIdError, EmptyInputError, Sequences};
use crate::Result;

#[cfg(feature = "par-distances")]
use rayon::prelude::*;

pub type Mat = DMatrix<f64>;

/// Symmetric matrix of pairwise distances between named sequences, with a zero diagonal.
///
/// Rows and columns follow the order of `ids`.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    ids: Vec<String>,
    distances: Mat,
}

impl Display for DistanceMatrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}\n {}", self.ids, self.distances)
    }
}

impl DistanceMatrix {
    /// Computes the pairwise Hamming distances between the given sequences.
    ///
    /// Fails with [`EmptyInputError`] when there are no sequences,
    /// [`crate::sequences::LengthMismatchError`] when the lengths differ and
    /// [`DuplicateIdError`] when an id occurs twice.
    ///
    /// # Example
    /// ```
    /// use upgma::distances::DistanceMatrix;
    /// use upgma::sequences::Sequences;
    ///
    /// let sequences =
    ///     Sequences::from_map([("A", "AAAA"), ("B", "AAAC"), ("C", "ACCC")]).unwrap();
    /// let distances = DistanceMatrix::new(&sequences).unwrap();
    /// assert_eq!(distances.distance("A", "C").unwrap(), 3.0);
    /// assert_eq!(distances.distance("B", "C").unwrap(), 2.0);
    /// ```
    pub fn new(sequences: &Sequences) -> Result<Self> {
        sequences.validate()?;
        let nseqs = sequences.len();
        info!(
            "Computing Hamming distances for {} sequences of length {}",
            nseqs,
            sequences.msa_len()
        );
        let mut distances = DMatrix::zeros(nseqs, nseqs);
        for ((i, j), dist) in Self::pairwise_hamming(sequences) {
            distances[(i, j)] = dist;
            distances[(j, i)] = dist;
        }
        debug!("Distance matrix:\n{}", distances);
        Ok(Self {
            ids: sequences.ids(),
            distances,
        })
    }

    fn pairwise_hamming(sequences: &Sequences) -> Vec<((usize, usize), f64)> {
        let pairs = (0..sequences.len()).tuple_combinations::<(usize, usize)>();
        cfg_if::cfg_if! {
        if #[cfg(feature = "par-distances")] {
            pairs
                .collect::<Vec<_>>()
                .into_par_iter()
                .map(|(i, j)| ((i, j), Self::hamming_pair(sequences, i, j)))
                .collect()
        } else {
            pairs
                .map(|(i, j)| ((i, j), Self::hamming_pair(sequences, i, j)))
                .collect()
        }
        }
    }

    fn hamming_pair(sequences: &Sequences, i: usize, j: usize) -> f64 {
        let (seq_i, seq_j) = (sequences.record(i).seq(), sequences.record(j).seq());
        if seq_i.is_ascii() && seq_j.is_ascii() {
            return hamming(seq_i, seq_j) as f64;
        }
        symbols(seq_i)
            .iter()
            .zip(symbols(seq_j).iter())
            .filter(|(a, b)| a != b)
            .count() as f64
    }

    /// Creates a distance matrix from ids and the lower triangle of the matrix, diagonal included,
    /// so row `i` holds `i + 1` entries.
    ///
    /// # Example
    /// ```
    /// use upgma::distances::DistanceMatrix;
    ///
    /// let distances = DistanceMatrix::from_lower_triangle(
    ///     &["A", "B", "C"],
    ///     &[vec![0.0], vec![1.0, 0.0], vec![3.0, 2.0, 0.0]],
    /// )
    /// .unwrap();
    /// assert_eq!(distances.distance("C", "A").unwrap(), 3.0);
    /// ```
    pub fn from_lower_triangle<S: AsRef<str>>(ids: &[S], rows: &[Vec<f64>]) -> Result<Self> {
        if ids.is_empty() {
            bail!(EmptyInputError);
        }
        if ids.len() != rows.len() {
            bail!(DataError {
                message: format!(
                    "Expected {} matrix rows for {} ids, got {}",
                    ids.len(),
                    ids.len(),
                    rows.len()
                )
            });
        }
        let mut seen = HashSet::with_capacity(ids.len());
        for id in ids {
            if !seen.insert(id.as_ref()) {
                bail!(DuplicateIdError {
                    id: id.as_ref().to_string()
                });
            }
        }

        let n = ids.len();
        let mut distances = DMatrix::zeros(n, n);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != i + 1 {
                bail!(DataError {
                    message: format!(
                        "Row {} of the lower triangle must have {} entries, got {}",
                        i,
                        i + 1,
                        row.len()
                    )
                });
            }
            if row[i] != 0.0 {
                bail!(DataError {
                    message: format!("Diagonal entry {} must be zero, got {}", i, row[i])
                });
            }
            for (j, &dist) in row[..i].iter().enumerate() {
                if !dist.is_finite() || dist < 0.0 {
                    bail!(DataError {
                        message: format!(
                            "Distance between {} and {} must be a non-negative number, got {}",
                            ids[i].as_ref(),
                            ids[j].as_ref(),
                            dist
                        )
                    });
                }
                distances[(i, j)] = dist;
                distances[(j, i)] = dist;
            }
        }
        Ok(Self {
            ids: ids.iter().map(|id| id.as_ref().to_string()).collect(),
            distances,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn idx(&self, id: &str) -> Result<usize> {
        self.ids
            .iter()
            .position(|other| other == id)
            .ok_or_else(|| anyhow!("No sequence with id {} in the distance matrix", id))
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.distances[(i, j)]
    }

    pub fn distance(&self, id_a: &str, id_b: &str) -> Result<f64> {
        Ok(self.get(self.idx(id_a)?, self.idx(id_b)?))
    }

    pub(crate) fn matrix(&self) -> &Mat {
        &self.distances
    }
}
