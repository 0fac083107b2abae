//! Fault catalog: typed fault descriptors and their validation.
//!
//! A [`Fault`] is checked when it is built, whether through one of the typed
//! constructors or through serde, so an engine never sees a common-support
//! fault with one location or a single-bus fault with two.

use std::collections::HashSet;
use std::fmt;

use faultline_core::{BusId, Network, ScError};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Caller-chosen fault identity, used to look results up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaultId(String);

impl FaultId {
    pub fn new(id: impl Into<String>) -> Self {
        FaultId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FaultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FaultId {
    fn from(s: &str) -> Self {
        FaultId(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FaultType {
    ThreePhaseGround,
    /// Phase c to ground
    Monophase,
    /// Phase b to phase c
    Biphase,
    /// Phases b and c to ground
    BiphaseGround,
    /// Phase c of one bus to a phase of a second bus
    BiphaseCommonSupport,
}

impl FaultType {
    pub fn is_balanced(self) -> bool {
        self == FaultType::ThreePhaseGround
    }

    pub fn needs_two_locations(self) -> bool {
        self == FaultType::BiphaseCommonSupport
    }
}

impl fmt::Display for FaultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FaultType::ThreePhaseGround => "THREE_PHASE_GROUND",
            FaultType::Monophase => "MONOPHASE",
            FaultType::Biphase => "BIPHASE",
            FaultType::BiphaseGround => "BIPHASE_GROUND",
            FaultType::BiphaseCommonSupport => "BIPHASE_COMMON_SUPPORT",
        };
        f.write_str(label)
    }
}

/// Which phase of the second bus is shorted to phase c of the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommonSupportType {
    #[serde(rename = "C1_A2")]
    C1A2,
    #[serde(rename = "C1_B2")]
    C1B2,
    #[serde(rename = "C1_C2")]
    C1C2,
}

#[derive(Debug, Error, PartialEq)]
pub enum FaultError {
    #[error("fault {fault}: {fault_type} needs a second bus location")]
    MissingSecondBus { fault: FaultId, fault_type: FaultType },

    #[error("fault {fault}: {fault_type} takes exactly one bus location")]
    UnexpectedSecondBus { fault: FaultId, fault_type: FaultType },

    #[error("fault {fault}: both locations are bus {bus}")]
    SameBus { fault: FaultId, bus: usize },

    #[error("fault {fault}: common-support fault needs a phase correlation")]
    MissingCorrelation { fault: FaultId },

    #[error("fault {fault}: unknown bus {bus}")]
    UnknownBus { fault: FaultId, bus: usize },

    #[error("fault id {0} is used more than once")]
    DuplicateId(FaultId),

    #[error("fault {fault}: {fault_type} is not handled by the {engine} engine")]
    UnsupportedType {
        fault: FaultId,
        fault_type: FaultType,
        engine: &'static str,
    },
}

impl From<FaultError> for ScError {
    fn from(err: FaultError) -> Self {
        ScError::Config(err.to_string())
    }
}

/// Serialized form of a fault, checked by [`Fault::new`] on the way in.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FaultSpec {
    id: FaultId,
    fault_type: FaultType,
    bus: BusId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    second_bus: Option<BusId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    correlation: Option<CommonSupportType>,
    #[serde(default)]
    r: f64,
    #[serde(default)]
    x: f64,
}

/// A short-circuit fault. The fault impedance `r + jx` is in per-unit on the
/// 100 MVA base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FaultSpec", into = "FaultSpec")]
pub struct Fault {
    id: FaultId,
    fault_type: FaultType,
    bus: BusId,
    second_bus: Option<BusId>,
    correlation: Option<CommonSupportType>,
    r: f64,
    x: f64,
}

impl Fault {
    /// General constructor; checks the location count against the type.
    pub fn new(
        id: impl Into<FaultId>,
        fault_type: FaultType,
        bus: BusId,
        second_bus: Option<BusId>,
        correlation: Option<CommonSupportType>,
        r: f64,
        x: f64,
    ) -> Result<Self, FaultError> {
        let id = id.into();
        if fault_type.needs_two_locations() {
            let Some(second) = second_bus else {
                return Err(FaultError::MissingSecondBus {
                    fault: id,
                    fault_type,
                });
            };
            if second == bus {
                return Err(FaultError::SameBus {
                    fault: id,
                    bus: bus.value(),
                });
            }
            if correlation.is_none() {
                return Err(FaultError::MissingCorrelation { fault: id });
            }
        } else if second_bus.is_some() {
            return Err(FaultError::UnexpectedSecondBus {
                fault: id,
                fault_type,
            });
        }

        Ok(Self {
            id,
            fault_type,
            bus,
            second_bus,
            correlation: if fault_type.needs_two_locations() {
                correlation
            } else {
                None
            },
            r,
            x,
        })
    }

    fn single(id: impl Into<FaultId>, fault_type: FaultType, bus: BusId, r: f64, x: f64) -> Self {
        Self {
            id: id.into(),
            fault_type,
            bus,
            second_bus: None,
            correlation: None,
            r,
            x,
        }
    }

    pub fn three_phase(id: impl Into<FaultId>, bus: BusId, r: f64, x: f64) -> Self {
        Self::single(id, FaultType::ThreePhaseGround, bus, r, x)
    }

    pub fn monophase(id: impl Into<FaultId>, bus: BusId, r: f64, x: f64) -> Self {
        Self::single(id, FaultType::Monophase, bus, r, x)
    }

    pub fn biphase(id: impl Into<FaultId>, bus: BusId, r: f64, x: f64) -> Self {
        Self::single(id, FaultType::Biphase, bus, r, x)
    }

    pub fn biphase_ground(id: impl Into<FaultId>, bus: BusId, r: f64, x: f64) -> Self {
        Self::single(id, FaultType::BiphaseGround, bus, r, x)
    }

    pub fn common_support(
        id: impl Into<FaultId>,
        bus: BusId,
        second_bus: BusId,
        correlation: CommonSupportType,
        r: f64,
        x: f64,
    ) -> Result<Self, FaultError> {
        Self::new(
            id,
            FaultType::BiphaseCommonSupport,
            bus,
            Some(second_bus),
            Some(correlation),
            r,
            x,
        )
    }

    pub fn id(&self) -> &FaultId {
        &self.id
    }

    pub fn fault_type(&self) -> FaultType {
        self.fault_type
    }

    pub fn bus(&self) -> BusId {
        self.bus
    }

    pub fn second_bus(&self) -> Option<BusId> {
        self.second_bus
    }

    pub fn correlation(&self) -> Option<CommonSupportType> {
        self.correlation
    }

    pub fn impedance(&self) -> Complex64 {
        Complex64::new(self.r, self.x)
    }

    /// Bus locations in order: the faulted bus, then the second bus if any.
    pub fn locations(&self) -> impl Iterator<Item = BusId> + '_ {
        std::iter::once(self.bus).chain(self.second_bus)
    }

    /// Unordered bus pair of a common-support fault.
    pub fn bus_pair(&self) -> Option<(BusId, BusId)> {
        self.second_bus
            .map(|second| (self.bus.min(second), self.bus.max(second)))
    }
}

impl From<String> for FaultId {
    fn from(s: String) -> Self {
        FaultId(s)
    }
}

impl TryFrom<FaultSpec> for Fault {
    type Error = FaultError;

    fn try_from(spec: FaultSpec) -> Result<Self, Self::Error> {
        Fault::new(
            spec.id,
            spec.fault_type,
            spec.bus,
            spec.second_bus,
            spec.correlation,
            spec.r,
            spec.x,
        )
    }
}

impl From<Fault> for FaultSpec {
    fn from(fault: Fault) -> Self {
        FaultSpec {
            id: fault.id,
            fault_type: fault.fault_type,
            bus: fault.bus,
            second_bus: fault.second_bus,
            correlation: fault.correlation,
            r: fault.r,
            x: fault.x,
        }
    }
}

/// Check a fault list against a network: ids are unique and every location
/// is a known bus.
pub fn validate_faults(faults: &[Fault], network: &Network) -> Result<(), FaultError> {
    let mut ids = HashSet::new();
    for fault in faults {
        if !ids.insert(fault.id()) {
            return Err(FaultError::DuplicateId(fault.id().clone()));
        }
        for bus in fault.locations() {
            if network.bus(bus).is_none() {
                return Err(FaultError::UnknownBus {
                    fault: fault.id().clone(),
                    bus: bus.value(),
                });
            }
        }
    }
    Ok(())
}

/// One bolted three-phase fault per bus, named `SC_<bus name>`.
pub fn systematic_faults(network: &Network) -> Vec<Fault> {
    network
        .buses()
        .into_iter()
        .map(|bus| Fault::three_phase(format!("SC_{}", bus.name), bus.id, 0.0, 0.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_core::{Bus, Kilovolts};

    fn network() -> Network {
        let mut network = Network::new();
        network.add_bus(Bus::new(BusId::new(1), "B1", Kilovolts(20.0)));
        network.add_bus(Bus::new(BusId::new(2), "B2", Kilovolts(20.0)));
        network
    }

    #[test]
    fn test_common_support_requires_two_distinct_buses() {
        let err = Fault::new(
            "F1",
            FaultType::BiphaseCommonSupport,
            BusId::new(1),
            None,
            Some(CommonSupportType::C1A2),
            0.0,
            0.0,
        )
        .unwrap_err();
        assert!(matches!(err, FaultError::MissingSecondBus { .. }));

        let err = Fault::common_support("F2", BusId::new(1), BusId::new(1), CommonSupportType::C1C2, 0.0, 0.0)
            .unwrap_err();
        assert_eq!(err.to_string(), "fault F2: both locations are bus 1");
    }

    #[test]
    fn test_single_location_rejects_second_bus() {
        let err = Fault::new(
            "F3",
            FaultType::Monophase,
            BusId::new(1),
            Some(BusId::new(2)),
            None,
            0.0,
            0.0,
        )
        .unwrap_err();
        assert!(err.to_string().contains("MONOPHASE takes exactly one bus location"));
        let sc: ScError = err.into();
        assert!(sc.is_config());
    }

    #[test]
    fn test_missing_correlation() {
        let err = Fault::new(
            "F4",
            FaultType::BiphaseCommonSupport,
            BusId::new(1),
            Some(BusId::new(2)),
            None,
            0.0,
            0.0,
        )
        .unwrap_err();
        assert_eq!(err, FaultError::MissingCorrelation { fault: FaultId::new("F4") });
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Fault = serde_json::from_str(
            r#"{"id": "F1", "fault_type": "BIPHASE_COMMON_SUPPORT", "bus": 1, "second_bus": 2, "correlation": "C1_B2"}"#,
        )
        .unwrap();
        assert_eq!(ok.correlation(), Some(CommonSupportType::C1B2));
        assert_eq!(ok.bus_pair(), Some((BusId::new(1), BusId::new(2))));

        let bad = serde_json::from_str::<Fault>(
            r#"{"id": "F2", "fault_type": "BIPHASE_COMMON_SUPPORT", "bus": 1}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_validate_against_network() {
        let net = network();
        let faults = vec![
            Fault::monophase("F1", BusId::new(1), 0.0, 0.0),
            Fault::monophase("F1", BusId::new(2), 0.0, 0.0),
        ];
        assert_eq!(
            validate_faults(&faults, &net),
            Err(FaultError::DuplicateId(FaultId::new("F1")))
        );

        let faults = vec![Fault::three_phase("F9", BusId::new(9), 0.0, 0.0)];
        assert!(matches!(
            validate_faults(&faults, &net),
            Err(FaultError::UnknownBus { bus: 9, .. })
        ));
    }

    #[test]
    fn test_systematic_faults_named_after_buses() {
        let faults = systematic_faults(&network());
        let ids: Vec<_> = faults.iter().map(|f| f.id().as_str().to_string()).collect();
        assert_eq!(ids, vec!["SC_B1", "SC_B2"]);
        assert!(faults.iter().all(|f| f.fault_type().is_balanced()));
    }
}
