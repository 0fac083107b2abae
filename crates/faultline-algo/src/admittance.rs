//! Sparse sequence admittance matrices.
//!
//! ```text
//! I = Y × V,   Y[i,j] = G[i,j] + jB[i,j]
//! ```
//!
//! G and B are assembled separately as triplets from the branch blocks and
//! bus injections of an [`ScNetwork`], then converted to CSR.

use faultline_core::ScError;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use sprs::{CsMat, TriMat};
use thiserror::Error;

use crate::model::{BranchBlock, ScNetwork};

/// Which sequence network to assemble. The inverse sequence shares the
/// direct one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sequence {
    Direct,
    Zero,
}

impl std::fmt::Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sequence::Direct => f.write_str("direct"),
            Sequence::Zero => f.write_str("zero"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AdmittanceError {
    #[error("No buses in the {0} sequence network")]
    NoBuses(Sequence),

    #[error("Branch {branch} has a non-finite {sequence} sequence admittance")]
    NonFinite { branch: String, sequence: Sequence },
}

impl From<AdmittanceError> for ScError {
    fn from(err: AdmittanceError) -> Self {
        ScError::Solver(err.to_string())
    }
}

/// Admittance matrix of one sequence network.
#[derive(Debug, Clone)]
pub struct SequenceAdmittance {
    sequence: Sequence,
    n_bus: usize,
    g_matrix: CsMat<f64>,
    b_matrix: CsMat<f64>,
    /// Bus pairs joined by a coupling branch block
    couplings: Vec<(usize, usize)>,
    /// Buses holding at least one element to ground
    grounded: Vec<bool>,
}

impl SequenceAdmittance {
    pub fn build(network: &ScNetwork, sequence: Sequence) -> Result<Self, AdmittanceError> {
        let n_bus = network.bus_count();
        if n_bus == 0 {
            return Err(AdmittanceError::NoBuses(sequence));
        }

        let mut g_triplet = TriMat::new((n_bus, n_bus));
        let mut b_triplet = TriMat::new((n_bus, n_bus));
        let mut couplings = Vec::new();
        let mut grounded = vec![false; n_bus];

        let mut add = |i: usize, j: usize, y: Complex64| {
            g_triplet.add_triplet(i, j, y.re);
            b_triplet.add_triplet(i, j, y.im);
        };

        for branch in network.branches() {
            let block: &BranchBlock = match sequence {
                Sequence::Direct => &branch.direct,
                Sequence::Zero => &branch.zero,
            };
            if !block.is_finite() {
                return Err(AdmittanceError::NonFinite {
                    branch: branch.name.clone(),
                    sequence,
                });
            }
            let (i, j) = (branch.bus1, branch.bus2);
            add(i, i, block.y11);
            add(j, j, block.y22);
            if block.is_coupling() {
                add(i, j, block.y12);
                add(j, i, block.y21);
                couplings.push((i, j));
            }
            let (ground_i, ground_j) = block.grounds();
            grounded[i] |= ground_i;
            grounded[j] |= ground_j;
        }

        for feeder in network.feeders() {
            let y = match sequence {
                Sequence::Direct => feeder.direct,
                Sequence::Zero => feeder.zero,
            };
            if y != Complex64::default() {
                add(feeder.bus, feeder.bus, y);
                grounded[feeder.bus] = true;
            }
        }

        Ok(Self {
            sequence,
            n_bus,
            g_matrix: g_triplet.to_csr(),
            b_matrix: b_triplet.to_csr(),
            couplings,
            grounded,
        })
    }

    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    pub fn n_bus(&self) -> usize {
        self.n_bus
    }

    /// G[i,j]
    pub fn g(&self, i: usize, j: usize) -> f64 {
        self.g_matrix.get(i, j).copied().unwrap_or(0.0)
    }

    /// B[i,j]
    pub fn b(&self, i: usize, j: usize) -> f64 {
        self.b_matrix.get(i, j).copied().unwrap_or(0.0)
    }

    pub fn y(&self, i: usize, j: usize) -> Complex64 {
        Complex64::new(self.g(i, j), self.b(i, j))
    }

    pub fn couplings(&self) -> &[(usize, usize)] {
        &self.couplings
    }

    pub fn is_grounded(&self, bus: usize) -> bool {
        self.grounded.get(bus).copied().unwrap_or(false)
    }

    /// Non-zero `(col, G, B)` entries of row `i`.
    pub fn row(&self, i: usize) -> Vec<(usize, f64, f64)> {
        let mut entries: Vec<(usize, f64, f64)> = Vec::new();
        if let Some(g_row) = self.g_matrix.outer_view(i) {
            for (j, &g) in g_row.iter() {
                entries.push((j, g, 0.0));
            }
        }
        if let Some(b_row) = self.b_matrix.outer_view(i) {
            for (j, &b) in b_row.iter() {
                match entries.iter_mut().find(|(col, _, _)| *col == j) {
                    Some(entry) => entry.2 = b,
                    None => entries.push((j, 0.0, b)),
                }
            }
        }
        entries
    }

    /// Total non-zeros (G + B)
    pub fn nnz(&self) -> usize {
        self.g_matrix.nnz() + self.b_matrix.nnz()
    }
}
