//! # Thevenin Impedances by Unit Current Injection
//!
//! For a sequence admittance matrix `Y`, injecting a unit current at bus `k`
//! and solving
//!
//! ```text
//! Y × V = e_k
//! ```
//!
//! gives column `k` of the impedance matrix `Z = Y⁻¹`: `V[k]` is the
//! Thevenin self impedance at `k` and `V[j]` the transfer impedance `Z[j,k]`.
//! The column is also what the bus voltage deltas need, since a fault current
//! `I` at `k` shifts every bus by `-Z[j,k] I`.
//!
//! ## Islands
//!
//! Buses are partitioned into islands of the matrix (union-find over coupling
//! branches). Each island is factorized on its own with a dense partial-pivot
//! LU on the real form
//!
//! ```text
//! [G  -B] [Vx]   [Ix]
//! [B   G] [Vy] = [Iy]
//! ```
//!
//! so a floating island (no element to ground, singular matrix) only makes
//! its own locations singular. Factorizations are kept and reused for every
//! right-hand side; the columns of one island are solved as one
//! multi-column system.

use std::collections::HashMap;
use std::fmt;

use faer::{prelude::*, solvers::PartialPivLu, Mat};
use num_complex::Complex64;
use petgraph::unionfind::UnionFind;
use tracing::{debug, warn};

use crate::admittance::{Sequence, SequenceAdmittance};

struct IslandFactor {
    buses: Vec<usize>,
    lu: Option<PartialPivLu<f64>>,
}

/// Factorized sequence network.
pub struct TheveninSolver {
    sequence: Sequence,
    n_bus: usize,
    islands: Vec<IslandFactor>,
    /// `(island, local index)` of every bus
    locations: Vec<(usize, usize)>,
}

impl fmt::Debug for TheveninSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TheveninSolver")
            .field("sequence", &self.sequence)
            .field("n_bus", &self.n_bus)
            .field("islands", &self.islands.len())
            .field("singular_islands", &self.singular_island_count())
            .finish()
    }
}

impl TheveninSolver {
    /// Factorize every island of `admittance`.
    pub fn factorize(admittance: &SequenceAdmittance) -> Self {
        let n_bus = admittance.n_bus();
        let sequence = admittance.sequence();

        let mut union_find = UnionFind::<usize>::new(n_bus);
        for &(i, j) in admittance.couplings() {
            union_find.union(i, j);
        }
        let labels = union_find.into_labeling();

        let mut island_of_label: HashMap<usize, usize> = HashMap::new();
        let mut members: Vec<Vec<usize>> = Vec::new();
        let mut locations = vec![(0, 0); n_bus];
        for (bus, label) in labels.into_iter().enumerate() {
            let island = *island_of_label.entry(label).or_insert_with(|| {
                members.push(Vec::new());
                members.len() - 1
            });
            locations[bus] = (island, members[island].len());
            members[island].push(bus);
        }

        let islands = members
            .into_iter()
            .enumerate()
            .map(|(island, buses)| {
                let grounded = buses.iter().any(|&b| admittance.is_grounded(b));
                if !grounded {
                    warn!(
                        %sequence,
                        island,
                        buses = buses.len(),
                        "island has no path to ground, its locations are singular"
                    );
                    return IslandFactor { buses, lu: None };
                }
                let matrix = real_form(admittance, &buses, &locations);
                debug!(%sequence, island, size = buses.len(), "island factorized");
                IslandFactor {
                    lu: Some(PartialPivLu::new(matrix.as_ref())),
                    buses,
                }
            })
            .collect();

        Self {
            sequence,
            n_bus,
            islands,
            locations,
        }
    }

    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    pub fn n_bus(&self) -> usize {
        self.n_bus
    }

    pub fn island_count(&self) -> usize {
        self.islands.len()
    }

    pub fn singular_island_count(&self) -> usize {
        self.islands.iter().filter(|i| i.lu.is_none()).count()
    }

    /// Whether two buses share an island (their transfer impedance can be
    /// non-zero).
    pub fn same_island(&self, a: usize, b: usize) -> bool {
        match (self.locations.get(a), self.locations.get(b)) {
            (Some(la), Some(lb)) => la.0 == lb.0,
            _ => false,
        }
    }

    /// Impedance column of one bus, `None` when the location is singular.
    pub fn impedance_column(&self, bus: usize) -> Option<Vec<Complex64>> {
        self.impedance_columns(&[bus]).pop().flatten()
    }

    /// Impedance columns of several buses, in request order.
    ///
    /// Requests on the same island are solved together against its stored
    /// factorization.
    pub fn impedance_columns(&self, buses: &[usize]) -> Vec<Option<Vec<Complex64>>> {
        let mut results: Vec<Option<Vec<Complex64>>> = vec![None; buses.len()];

        let mut per_island: HashMap<usize, Vec<usize>> = HashMap::new();
        for (request, &bus) in buses.iter().enumerate() {
            if let Some(&(island, _)) = self.locations.get(bus) {
                per_island.entry(island).or_default().push(request);
            }
        }

        for (island, requests) in per_island {
            let factor = &self.islands[island];
            let Some(lu) = &factor.lu else {
                continue;
            };
            let m = factor.buses.len();
            let mut rhs = Mat::<f64>::zeros(2 * m, requests.len());
            for (col, &request) in requests.iter().enumerate() {
                let (_, local) = self.locations[buses[request]];
                rhs.write(local, col, 1.0);
            }
            let solution = lu.solve(&rhs);

            for (col, &request) in requests.iter().enumerate() {
                let mut column = vec![Complex64::default(); self.n_bus];
                let mut finite = true;
                for (local, &bus) in factor.buses.iter().enumerate() {
                    let v = Complex64::new(solution.read(local, col), solution.read(m + local, col));
                    finite &= v.re.is_finite() && v.im.is_finite();
                    column[bus] = v;
                }
                if finite {
                    results[request] = Some(column);
                } else {
                    warn!(sequence = %self.sequence, bus = buses[request], "singular location");
                }
            }
        }
        results
    }
}

/// Dense `[[G, -B], [B, G]]` restricted to one island.
fn real_form(admittance: &SequenceAdmittance, buses: &[usize], locations: &[(usize, usize)]) -> Mat<f64> {
    let m = buses.len();
    let mut matrix = Mat::<f64>::zeros(2 * m, 2 * m);
    for (row, &bus) in buses.iter().enumerate() {
        for (j, g, b) in admittance.row(bus) {
            let (_, col) = locations[j];
            matrix.write(row, col, g);
            matrix.write(row, m + col, -b);
            matrix.write(m + row, col, b);
            matrix.write(m + row, m + col, g);
        }
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScNetwork;
    use crate::norm::NormCoefficients;
    use crate::parameters::ShortCircuitParameters;
    use faultline_core::{
        Bus, BusId, Diagnostics, GenId, Generator, GeneratorShortCircuit, Kilovolts, Line, LineId,
        Network,
    };

    fn solver(with_floating_bus: bool) -> TheveninSolver {
        let mut network = Network::new();
        for id in 1..=2 {
            network.add_bus(Bus::new(BusId::new(id), format!("B{id}"), Kilovolts(10.0)));
        }
        network
            .add_line(Line::new(LineId::new(1), "L12", BusId::new(1), BusId::new(2), 0.1, 1.0))
            .unwrap();
        network
            .add_generator(Generator::new(
                GenId::new(1),
                "G1",
                BusId::new(1),
                GeneratorShortCircuit::with_impedance(0.05, 0.5),
            ))
            .unwrap();
        if with_floating_bus {
            network.add_bus(Bus::new(BusId::new(3), "B3", Kilovolts(10.0)));
        }
        let mut diag = Diagnostics::new();
        let model = ScNetwork::build(
            &network,
            &ShortCircuitParameters::new(),
            &NormCoefficients::new(),
            &mut diag,
        )
        .unwrap();
        let y = SequenceAdmittance::build(&model, Sequence::Direct).unwrap();
        TheveninSolver::factorize(&y)
    }

    fn close(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    #[test]
    fn test_radial_self_and_transfer_impedances() {
        let solver = solver(false);
        let zg = Complex64::new(0.05, 0.5);
        let zl = Complex64::new(0.1, 1.0);

        let col1 = solver.impedance_column(0).unwrap();
        assert!(close(col1[0], zg));
        assert!(close(col1[1], zg));

        let col2 = solver.impedance_column(1).unwrap();
        assert!(close(col2[1], zg + zl));
        assert!(close(col2[0], col1[1]));
    }

    #[test]
    fn test_batched_columns_match_single_solves() {
        let solver = solver(false);
        let batch = solver.impedance_columns(&[1, 0, 1]);
        assert_eq!(batch.len(), 3);
        let single = solver.impedance_column(1).unwrap();
        for (a, b) in batch[0].as_ref().unwrap().iter().zip(single.iter()) {
            assert!(close(*a, *b));
        }
        assert_eq!(batch[0], batch[2]);
    }

    #[test]
    fn test_floating_island_is_isolated() {
        let solver = solver(true);
        assert_eq!(solver.island_count(), 2);
        assert_eq!(solver.singular_island_count(), 1);
        assert!(solver.impedance_column(2).is_none());
        assert!(solver.impedance_column(1).is_some());
        assert!(!solver.same_island(0, 2));
    }
}
