//! # faultline-algo: Short-Circuit Currents by Symmetrical Components
//!
//! This crate computes fault currents on a [`faultline_core::Network`] by
//! building its zero, direct and inverse sequence networks and reading
//! Thevenin impedances off a factorized admittance matrix.
//!
//! ## Pipeline
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Norm correction | [`norm`] | kG, kT and per-leg coefficients, voltage factors |
//! | Per-unit model | [`model`] | branches with direct and zero-sequence blocks, feeders |
//! | Zero-sequence branches | [`homopolar`] | 2x2 blocks per winding connection pair |
//! | Matrix assembly | [`admittance`] | sparse `G + jB` per sequence |
//! | Factorization | [`thevenin`] | impedance columns by unit current injection |
//! | Fault equations | [`calculators`] | sequence currents and voltages at the fault |
//! | Engines | [`engine`] | one [`ShortCircuitResult`] per fault |
//!
//! The inverse-sequence network is taken equal to the direct one.
//!
//! ## Example
//!
//! ```ignore
//! use faultline_algo::{BalancedEngine, Fault, Norm, ShortCircuitEngine, ShortCircuitParameters};
//!
//! let params = ShortCircuitParameters::new().with_norm(Norm::Iec);
//! let faults = vec![Fault::three_phase("F1", BusId::new(3), 0.0, 0.0)];
//! let mut engine = BalancedEngine::new(&network, params, faults);
//! engine.run()?;
//! println!("{:.3} kA", engine.results_per_fault().get("F1").unwrap().ik_ka);
//! ```
//!
//! ## Units
//!
//! Results carry currents and voltages in per-unit on the 100 MVA base
//! ([`model::BASE_MVA`]) and the derived magnitudes Ik (kA), Icc (A) and
//! Pcc (MVA).

pub mod admittance;
pub mod calculators;
pub mod engine;
pub mod fault;
pub mod fortescue;
pub mod homopolar;
pub mod model;
pub mod norm;
pub mod parameters;
pub mod results;
pub mod thevenin;

pub use admittance::{AdmittanceError, Sequence, SequenceAdmittance};
pub use calculators::MutualImpedances;
pub use engine::{
    BalancedEngine, FaultResults, SequenceNetworkCache, SequenceNetworks, ShortCircuitEngine,
    UnbalancedEngine,
};
pub use fault::{systematic_faults, CommonSupportType, Fault, FaultError, FaultId, FaultType};
pub use fortescue::FortescueValue;
pub use model::{ScNetwork, BASE_MVA};
pub use norm::{Norm, NormCoefficients, ShortCircuitNorm};
pub use parameters::{AnalysisType, PeriodType, ShortCircuitParameters, VoltageProfile};
pub use results::{FaultLocation, FeederResult, ResultStatus, ShortCircuitResult};
pub use thevenin::TheveninSolver;
