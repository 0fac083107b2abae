use faultline_core::{Diagnostics, Kilovolts, Network};

use super::{unit_coefficients, Norm, NormCoefficients, ShortCircuitNorm};

/// No correction: every coefficient and voltage factor is 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNorm;

impl ShortCircuitNorm for NoNorm {
    fn kind(&self) -> Norm {
        Norm::None
    }

    fn cmax(&self, _nominal: Kilovolts) -> f64 {
        1.0
    }

    fn cmin(&self, _nominal: Kilovolts) -> f64 {
        1.0
    }

    fn compute(&self, network: &Network, _diag: &mut Diagnostics) -> NormCoefficients {
        unit_coefficients(network)
    }
}
