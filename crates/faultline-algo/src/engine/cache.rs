use std::collections::hash_map::Entry;
use std::collections::HashMap;

use faultline_core::{Diagnostics, Network, ScResult};
use tracing::debug;

use crate::admittance::{Sequence, SequenceAdmittance};
use crate::model::ScNetwork;
use crate::norm::{Norm, NormCoefficients};
use crate::parameters::{PeriodType, ShortCircuitParameters, VoltageProfile};
use crate::thevenin::TheveninSolver;

/// What the sequence networks depend on besides the network itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    period: PeriodType,
    norm: Norm,
    voltage_profile: VoltageProfile,
    ignore_shunts: bool,
}

impl From<&ShortCircuitParameters> for CacheKey {
    fn from(params: &ShortCircuitParameters) -> Self {
        Self {
            period: params.period,
            norm: params.norm,
            voltage_profile: params.voltage_profile,
            ignore_shunts: params.ignore_shunts,
        }
    }
}

/// Per-unit model and factorized networks for one cache key.
#[derive(Debug)]
pub struct SequenceNetworks {
    pub model: ScNetwork,
    pub coefficients: NormCoefficients,
    pub direct: TheveninSolver,
    zero: Option<TheveninSolver>,
    thresholds: [f64; 3],
    /// Norm and assembly findings, replayed on every reuse
    diagnostics: Diagnostics,
}

impl SequenceNetworks {
    /// Zero-sequence solver, present once an unbalanced run asked for it.
    pub fn zero(&self) -> Option<&TheveninSolver> {
        self.zero.as_ref()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

fn thresholds(params: &ShortCircuitParameters) -> [f64; 3] {
    [
        params.low_impedance_threshold,
        params.homopolar_default_ratio,
        params.infinite_impedance_admittance,
    ]
}

/// Factorized sequence networks of one [`Network`], keyed by period, norm,
/// voltage profile and shunt handling.
///
/// The cache remembers the [`Network::fingerprint`] of the data it was built
/// from. Any change to the network empties it before the next lookup.
#[derive(Debug, Default)]
pub struct SequenceNetworkCache {
    entries: HashMap<CacheKey, SequenceNetworks>,
    network: Option<u64>,
    factorizations: usize,
}

impl SequenceNetworkCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Networks for `params`, built and factorized on first use. The zero
    /// sequence is factorized only when `with_zero` is set.
    pub fn networks(
        &mut self,
        network: &Network,
        params: &ShortCircuitParameters,
        with_zero: bool,
        diag: &mut Diagnostics,
    ) -> ScResult<&SequenceNetworks> {
        let fingerprint = network.fingerprint();
        if self.network.is_some_and(|known| known != fingerprint) && !self.entries.is_empty() {
            debug!(entries = self.entries.len(), "network data changed, dropping cached sequence networks");
            self.entries.clear();
        }
        self.network = Some(fingerprint);

        let key = CacheKey::from(params);
        let entry = match self.entries.entry(key) {
            Entry::Occupied(occupied) if occupied.get().thresholds == thresholds(params) => {
                debug!(period = %params.period, norm = %params.norm, "reusing sequence networks");
                occupied.into_mut()
            }
            Entry::Occupied(mut occupied) => {
                occupied.insert(Self::build(network, params)?);
                self.factorizations += 1;
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => {
                let built = Self::build(network, params)?;
                self.factorizations += 1;
                vacant.insert(built)
            }
        };
        diag.merge(entry.diagnostics.clone());

        if with_zero && entry.zero.is_none() {
            let admittance = SequenceAdmittance::build(&entry.model, Sequence::Zero)?;
            entry.zero = Some(TheveninSolver::factorize(&admittance));
            self.factorizations += 1;
        }
        Ok(entry)
    }

    fn build(network: &Network, params: &ShortCircuitParameters) -> ScResult<SequenceNetworks> {
        let mut diagnostics = Diagnostics::new();
        let coefficients = params.norm.strategy().compute(network, &mut diagnostics);
        let model = ScNetwork::build(network, params, &coefficients, &mut diagnostics)?;
        let admittance = SequenceAdmittance::build(&model, Sequence::Direct)?;
        let direct = TheveninSolver::factorize(&admittance);
        Ok(SequenceNetworks {
            model,
            coefficients,
            direct,
            zero: None,
            thresholds: thresholds(params),
            diagnostics,
        })
    }

    /// Number of sequence-network factorizations performed so far.
    pub fn factorization_count(&self) -> usize {
        self.factorizations
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
