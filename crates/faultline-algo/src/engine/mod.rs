//! # Short-Circuit Engines
//!
//! Two engines share the sequence-network and Thevenin infrastructure:
//!
//! - [`BalancedEngine`]: three-phase faults, selective or systematic (one
//!   fault per bus). Only the direct-sequence network is factorized.
//! - [`UnbalancedEngine`]: monophase, biphase, biphase-to-ground and
//!   common-support faults. Direct and zero-sequence networks are factorized.
//!
//! A run goes norm correction → sequence assembly → factorization → one
//! multi-column solve per island → per-fault combination. Factorizations are
//! kept in a [`SequenceNetworkCache`] owned by the engine, so calling
//! [`ShortCircuitEngine::run`] again, or handing the cache to another engine
//! on the same network, reuses them.
//!
//! ## Errors
//!
//! Malformed faults, unknown buses and degenerate transformer data abort the
//! run with [`ScError::Config`]. A fault whose location has no finite
//! Thevenin impedance gets a [`ResultStatus::SingularLocation`] result and
//! the other faults are unaffected.
//!
//! [`ResultStatus::SingularLocation`]: crate::results::ResultStatus::SingularLocation

mod balanced;
mod cache;
mod unbalanced;

use std::collections::{HashMap, HashSet};

use faultline_core::{find_islands, Diagnostics, Network, ScError, ScResult};
use num_complex::Complex64;
use serde::ser::{Serialize, Serializer};
use tracing::warn;

pub use balanced::BalancedEngine;
pub use cache::{SequenceNetworkCache, SequenceNetworks};
pub use unbalanced::UnbalancedEngine;

use crate::fault::{validate_faults, Fault, FaultError, FaultId};
use crate::fortescue::FortescueValue;
use crate::model::ScNetwork;
use crate::results::{BusVoltageDelta, FaultLocation, ShortCircuitResult};
use crate::thevenin::TheveninSolver;

/// Common interface of the balanced and unbalanced engines.
pub trait ShortCircuitEngine {
    /// Compute every fault. Results of a previous run are replaced.
    fn run(&mut self) -> ScResult<()>;

    /// Results in fault input order.
    fn results_per_fault(&self) -> &FaultResults;

    /// Non-fatal issues found during the last run.
    fn diagnostics(&self) -> &Diagnostics;
}

/// Results keyed by fault id, in input order.
#[derive(Debug, Clone, Default)]
pub struct FaultResults {
    entries: Vec<(FaultId, ShortCircuitResult)>,
}

impl FaultResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, result: ShortCircuitResult) {
        self.entries.push((result.fault.clone(), result));
    }

    pub fn get(&self, id: &str) -> Option<&ShortCircuitResult> {
        self.entries
            .iter()
            .find(|(fault, _)| fault.as_str() == id)
            .map(|(_, result)| result)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ShortCircuitResult> {
        self.entries
            .iter_mut()
            .find(|(fault, _)| fault.as_str() == id)
            .map(|(_, result)| result)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FaultId, &ShortCircuitResult)> {
        self.entries.iter().map(|(id, result)| (id, result))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Serialize for FaultResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter().map(|(_, result)| result))
    }
}

/// Checks shared by both engines: network data, fault list and islands
/// without any source.
pub(crate) fn check_inputs(
    network: &Network,
    faults: &[Fault],
    diag: &mut Diagnostics,
) -> ScResult<()> {
    let mut network_diag = Diagnostics::new();
    network.validate_into(&mut network_diag);
    if network_diag.has_errors() {
        let message = network_diag
            .errors()
            .map(|issue| issue.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ScError::Validation(message));
    }
    diag.merge(network_diag);

    validate_faults(faults, network)?;

    let islands = find_islands(network);
    for island in islands.dead_islands() {
        warn!(
            island = island.island_id,
            buses = island.buses.len(),
            "island without source, faults there see no current"
        );
        diag.add_warning(
            "topology",
            &format!(
                "island {} ({} buses) has no generator or motor",
                island.island_id,
                island.buses.len()
            ),
        );
    }
    Ok(())
}

/// Sequence-network bus index of every fault location.
pub(crate) fn location_indices(
    faults: &[Fault],
    model: &ScNetwork,
) -> Result<Vec<Vec<usize>>, FaultError> {
    faults
        .iter()
        .map(|fault| {
            fault
                .locations()
                .map(|bus| {
                    model.bus_index(bus).ok_or_else(|| FaultError::UnknownBus {
                        fault: fault.id().clone(),
                        bus: bus.value(),
                    })
                })
                .collect()
        })
        .collect()
}

/// Impedance columns of the distinct buses in `indices`, solved in one batch.
pub(crate) fn solve_columns(
    solver: &TheveninSolver,
    indices: &[Vec<usize>],
) -> HashMap<usize, Option<Vec<Complex64>>> {
    let mut seen = HashSet::new();
    let buses: Vec<usize> = indices
        .iter()
        .flatten()
        .copied()
        .filter(|bus| seen.insert(*bus))
        .collect();
    let columns = solver.impedance_columns(&buses);
    buses.into_iter().zip(columns).collect()
}

/// Fault location record with its currents and voltages.
pub(crate) fn location(
    model: &ScNetwork,
    fault_bus: faultline_core::BusId,
    index: usize,
    current: FortescueValue,
    voltage: FortescueValue,
) -> FaultLocation {
    let (bus_name, nominal_kv) = model
        .bus(index)
        .map(|b| (b.name.clone(), b.nominal_kv))
        .unwrap_or_default();
    FaultLocation {
        bus: fault_bus,
        bus_name,
        nominal_kv,
        current,
        voltage,
    }
}

/// Attach bus voltage deltas and recompute feeder contributions.
pub(crate) fn attach_deltas(
    result: &mut ShortCircuitResult,
    model: &ScNetwork,
    deltas: Vec<FortescueValue>,
) {
    result.voltage_deltas = model
        .buses()
        .iter()
        .zip(deltas)
        .map(|(bus, delta)| BusVoltageDelta {
            bus: bus.name.clone(),
            delta,
        })
        .collect();
    result.update_feeders(model);
}
