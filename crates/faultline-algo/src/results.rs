//! Per-fault results and feeder contributions.

use faultline_core::{BusId, Kilovolts, MegavoltAmperes};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::calculators::MutualImpedances;
use crate::fault::{FaultId, FaultType};
use crate::fortescue::FortescueValue;
use crate::model::{FeederKind, ScNetwork, BASE_MVA};

/// Below this magnitude the feeder admittances of a bus are not used to split
/// its current.
const MIN_FEEDER_ADMITTANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultStatus {
    Ok,
    /// The location sits on a sequence network island with no path to
    /// ground; impedances are infinite and currents zero
    SingularLocation,
    /// Common-support fault on a bus pair already solved in the same run;
    /// the result is zero
    DuplicatePair,
}

/// Currents and voltages at one fault location, in pu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultLocation {
    pub bus: BusId,
    pub bus_name: String,
    pub nominal_kv: Kilovolts,
    /// Sequence currents from the network into the fault
    pub current: FortescueValue,
    /// Sequence voltages during the fault
    pub voltage: FortescueValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusVoltageDelta {
    pub bus: String,
    pub delta: FortescueValue,
}

/// Current supplied by one feeder to the fault, in pu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeederResult {
    pub name: String,
    pub kind: FeederKind,
    pub bus: String,
    pub current: FortescueValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortCircuitResult {
    pub fault: FaultId,
    pub fault_type: FaultType,
    pub status: ResultStatus,
    /// Thevenin impedances at the first location
    pub thevenin: FortescueValue,
    /// Self and mutual impedances of a common-support fault
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutual: Option<MutualImpedances>,
    pub locations: Vec<FaultLocation>,
    /// Initial short-circuit current in kA, scaled by cmax
    pub ik_ka: f64,
    /// Short-circuit current in A from the pre-fault Thevenin voltage
    pub icc_a: f64,
    /// Short-circuit power in MVA
    pub pcc_mva: f64,
    /// Bus voltage deltas, indexed like the sequence-network buses
    #[serde(default)]
    pub voltage_deltas: Vec<BusVoltageDelta>,
    #[serde(default)]
    pub feeders: Vec<FeederResult>,
}

/// `(Ik kA, Icc A, Pcc MVA)` from the direct-sequence fault current.
pub fn magnitudes(direct: Complex64, nominal: Kilovolts, cmax: f64) -> (f64, f64, f64) {
    let sqrt3 = 3f64.sqrt();
    let id = direct.norm();
    let ik = id * nominal.base_current(MegavoltAmperes(BASE_MVA)).value() * cmax;
    let icc = id * BASE_MVA * 1000.0 / sqrt3;
    (ik, icc, sqrt3 * nominal.value() * ik)
}

impl ShortCircuitResult {
    pub fn new(fault: FaultId, fault_type: FaultType, locations: Vec<FaultLocation>) -> Self {
        Self {
            fault,
            fault_type,
            status: ResultStatus::Ok,
            thevenin: FortescueValue::default(),
            mutual: None,
            locations,
            ik_ka: 0.0,
            icc_a: 0.0,
            pcc_mva: 0.0,
            voltage_deltas: Vec::new(),
            feeders: Vec::new(),
        }
    }

    /// Result for a location without a finite Thevenin impedance.
    pub fn singular(fault: FaultId, fault_type: FaultType, locations: Vec<FaultLocation>) -> Self {
        let infinite = Complex64::new(f64::INFINITY, f64::INFINITY);
        Self {
            status: ResultStatus::SingularLocation,
            thevenin: FortescueValue::new(infinite, infinite, infinite),
            ..Self::new(fault, fault_type, locations)
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ResultStatus::Ok
    }

    /// Direct-sequence current at the first location.
    pub fn direct_current(&self) -> Complex64 {
        self.locations
            .first()
            .map(|l| l.current.direct)
            .unwrap_or_default()
    }

    /// Phase currents `[A, B, C]` at the first location.
    pub fn phase_currents(&self) -> [Complex64; 3] {
        self.locations
            .first()
            .map(|l| l.current.to_phases())
            .unwrap_or_default()
    }

    pub fn feeder(&self, name: &str) -> Option<&FeederResult> {
        self.feeders.iter().find(|f| f.name == name)
    }

    pub fn voltage_delta(&self, bus: &str) -> Option<&FortescueValue> {
        self.voltage_deltas
            .iter()
            .find(|d| d.bus == bus)
            .map(|d| &d.delta)
    }

    /// Recompute the feeder contributions from the stored voltage deltas.
    ///
    /// For every bus the currents entering its branches are summed per
    /// sequence and shared between the bus feeders in proportion to their
    /// admittance. The previous feeder list is discarded, so calling this
    /// twice gives the same result.
    pub fn update_feeders(&mut self, network: &ScNetwork) {
        self.feeders.clear();
        if self.voltage_deltas.len() != network.bus_count() {
            return;
        }
        let deltas: Vec<FortescueValue> = self.voltage_deltas.iter().map(|d| d.delta).collect();

        let mut branch_sums = vec![FortescueValue::default(); network.bus_count()];
        for branch in network.branches() {
            let (dv1, dv2) = (deltas[branch.bus1], deltas[branch.bus2]);
            let (o1, o2) = branch.zero.currents(dv1.zero, dv2.zero);
            let (d1, d2) = branch.direct.currents(dv1.direct, dv2.direct);
            let (i1, i2) = branch.direct.currents(dv1.inverse, dv2.inverse);
            branch_sums[branch.bus1] = branch_sums[branch.bus1] + FortescueValue::new(o1, d1, i1);
            branch_sums[branch.bus2] = branch_sums[branch.bus2] + FortescueValue::new(o2, d2, i2);
        }

        for (bus, sum) in branch_sums.iter().enumerate() {
            let feeders: Vec<_> = network.feeders_at(bus).collect();
            if feeders.is_empty() {
                continue;
            }
            let total_direct: Complex64 = feeders.iter().map(|f| f.direct).sum();
            let total_zero: Complex64 = feeders.iter().map(|f| f.zero).sum();
            let share = |y: Complex64, total: Complex64, current: Complex64| {
                if total.norm() > MIN_FEEDER_ADMITTANCE {
                    y / total * current
                } else {
                    Complex64::default()
                }
            };
            let bus_name = network
                .bus(bus)
                .map(|b| b.name.clone())
                .unwrap_or_default();
            for feeder in feeders {
                self.feeders.push(FeederResult {
                    name: feeder.name.clone(),
                    kind: feeder.kind,
                    bus: bus_name.clone(),
                    current: FortescueValue::new(
                        share(feeder.zero, total_zero, sum.zero),
                        share(feeder.direct, total_direct, sum.direct),
                        share(feeder.direct, total_direct, sum.inverse),
                    ),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitudes() {
        let (ik, icc, pcc) = magnitudes(Complex64::new(0.0, -10.0), Kilovolts(20.0), 1.1);
        let ib = 100.0 / (3f64.sqrt() * 20.0);
        assert!((ik - 10.0 * ib * 1.1).abs() < 1e-12);
        assert!((icc - 10.0 * 100.0 * 1000.0 / 3f64.sqrt()).abs() < 1e-9);
        assert!((pcc - 3f64.sqrt() * 20.0 * ik).abs() < 1e-12);
    }

    #[test]
    fn test_singular_result_has_infinite_impedance() {
        let result = ShortCircuitResult::singular(FaultId::new("F"), FaultType::Monophase, Vec::new());
        assert_eq!(result.status, ResultStatus::SingularLocation);
        assert!(result.thevenin.direct.re.is_infinite());
        assert_eq!(result.direct_current(), Complex64::default());
        assert!(!result.is_ok());
    }

    #[test]
    fn test_status_serde_names() {
        let json = serde_json::to_string(&ResultStatus::SingularLocation).unwrap();
        assert_eq!(json, "\"SINGULAR_LOCATION\"");
    }
}
