use faultline_core::{Diagnostics, Kilovolts, Network};

use super::{unit_coefficients, Norm, NormCoefficients, ShortCircuitNorm};

/// Courcirc convention: machine and transformer data are used as given and
/// the fault current is reported as Icc from the pre-fault Thevenin voltage.
#[derive(Debug, Clone, Copy, Default)]
pub struct CourcircNorm;

impl ShortCircuitNorm for CourcircNorm {
    fn kind(&self) -> Norm {
        Norm::Courcirc
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
