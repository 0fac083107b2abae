//! # Norm Correction Layer
//!
//! A norm turns nameplate data into correction coefficients before the
//! sequence networks are assembled:
//!
//! | Coefficient | Applies to | Network |
//! |-------------|-----------|---------|
//! | kG / Ks     | rotating generators | direct, inverse |
//! | kT / Ks     | two-winding transformers | none, reported only |
//! | kT (R, X per leg) | three-winding transformer legs | zero |
//!
//! plus the voltage factors `cmax`/`cmin` used to scale the reported Ik.
//! A unit transformer's Ks still reaches the network through its generator.
//!
//! Coefficients live in a [`NormCoefficients`] table keyed by equipment id.
//! The network is never written to, so one network can be solved under
//! several norms in a row.
//!
//! Network equivalents (`GeneratorKind::Feeder`) are sized from their
//! short-circuit power under every norm, see [`feeder_impedance`].

mod courcirc;
mod iec;
mod none;

use std::collections::HashMap;
use std::fmt;

use faultline_core::{
    Diagnostics, FeederInfeed, GenId, Kilovolts, Network, ThreeWindingTransformerId,
    TransformerId,
};
use serde::{Deserialize, Serialize};

pub use courcirc::CourcircNorm;
pub use iec::IecNorm;
pub use none::NoNorm;

/// Norm selection carried in the run parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Norm {
    #[default]
    None,
    /// IEC 60909
    Iec,
    /// French utility convention
    Courcirc,
}

impl Norm {
    pub fn strategy(self) -> Box<dyn ShortCircuitNorm> {
        match self {
            Norm::None => Box::new(NoNorm),
            Norm::Iec => Box::new(IecNorm),
            Norm::Courcirc => Box::new(CourcircNorm),
        }
    }
}

impl fmt::Display for Norm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Norm::None => f.write_str("NONE"),
            Norm::Iec => f.write_str("IEC"),
            Norm::Courcirc => f.write_str("COURCIRC"),
        }
    }
}

/// A fault-current calculation standard.
pub trait ShortCircuitNorm {
    fn kind(&self) -> Norm;

    /// Voltage factor for maximum short-circuit currents.
    fn cmax(&self, nominal: Kilovolts) -> f64;

    /// Voltage factor for minimum short-circuit currents.
    fn cmin(&self, nominal: Kilovolts) -> f64;

    /// Correction coefficients for every piece of equipment of `network`.
    fn compute(&self, network: &Network, diag: &mut Diagnostics) -> NormCoefficients;
}

/// Zero-sequence correction of one three-winding transformer leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegCoefficients {
    pub k_ro: f64,
    pub k_xo: f64,
}

impl Default for LegCoefficients {
    fn default() -> Self {
        Self { k_ro: 1.0, k_xo: 1.0 }
    }
}

/// Coefficients produced by a norm for one network; missing entries read as 1.
#[derive(Debug, Clone, Default)]
pub struct NormCoefficients {
    generators: HashMap<GenId, f64>,
    transformers: HashMap<TransformerId, f64>,
    legs: HashMap<ThreeWindingTransformerId, [LegCoefficients; 3]>,
}

impl NormCoefficients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_generator(&mut self, id: GenId, k: f64) {
        self.generators.insert(id, k);
    }

    pub fn set_transformer(&mut self, id: TransformerId, k: f64) {
        self.transformers.insert(id, k);
    }

    pub fn set_legs(&mut self, id: ThreeWindingTransformerId, legs: [LegCoefficients; 3]) {
        self.legs.insert(id, legs);
    }

    pub fn generator(&self, id: GenId) -> f64 {
        self.generators.get(&id).copied().unwrap_or(1.0)
    }

    pub fn transformer(&self, id: TransformerId) -> f64 {
        self.transformers.get(&id).copied().unwrap_or(1.0)
    }

    pub fn legs(&self, id: ThreeWindingTransformerId) -> [LegCoefficients; 3] {
        self.legs.get(&id).copied().unwrap_or_default()
    }

    /// Iterate over every stored coefficient.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.generators
            .values()
            .chain(self.transformers.values())
            .copied()
            .chain(
                self.legs
                    .values()
                    .flat_map(|legs| legs.iter().flat_map(|l| [l.k_ro, l.k_xo])),
            )
    }
}

/// Coefficients of 1 for every generator and transformer of the network.
pub(crate) fn unit_coefficients(network: &Network) -> NormCoefficients {
    let mut coefficients = NormCoefficients::new();
    for gen in network.generators() {
        coefficients.set_generator(gen.id, 1.0);
    }
    for t2w in network.two_winding_transformers() {
        coefficients.set_transformer(t2w.id, 1.0);
    }
    for t3w in &network.three_winding_transformers {
        coefficients.set_legs(t3w.id, [LegCoefficients::default(); 3]);
    }
    coefficients
}

/// Equivalent impedance `(R, X)` in ohms of a network feeder:
/// `Zq = cq Un / (sqrt(3) IkQmax)`, split with the R/X ratio.
pub fn feeder_impedance(infeed: &FeederInfeed, nominal: Kilovolts) -> (f64, f64) {
    let ikq_ka = infeed.ikq_max_a / 1000.0;
    let zq = infeed.cq * nominal.value() / (3f64.sqrt() * ikq_ka);
    let ratio = infeed.r_to_x_ratio;
    let xq = zq / (ratio * ratio + 1.0).sqrt();
    (xq * ratio, xq)
}

/// Ratio `zt_k / zt`, falling back to 1 when the base value is zero.
pub(crate) fn checked_coefficient(
    owner: &str,
    corrected: f64,
    base: f64,
    diag: &mut Diagnostics,
) -> f64 {
    if base == 0.0 {
        if corrected != 0.0 {
            tracing::warn!(
                transformer = owner,
                "zero leg impedance with a non-zero corrected value, coefficient set to 1"
            );
            diag.add_warning_with_entity(
                "norm",
                "zero leg impedance with a non-zero corrected value, coefficient set to 1",
                owner,
            );
        }
        1.0
    } else {
        corrected / base
    }
}
