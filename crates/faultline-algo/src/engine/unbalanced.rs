use std::collections::{HashMap, HashSet};

use faultline_core::{BusId, Diagnostics, Network, ScError, ScResult};
use num_complex::Complex64;
use tracing::{debug, info, warn};

use super::{
    attach_deltas, check_inputs, location, location_indices, solve_columns, FaultResults,
    SequenceNetworkCache, SequenceNetworks, ShortCircuitEngine,
};
use crate::calculators::{
    biphase, biphase_ground, common_support, common_support_voltages, fault_voltages, monophase,
    three_phase, MutualImpedances,
};
use crate::fault::{CommonSupportType, Fault, FaultType};
use crate::fortescue::FortescueValue;
use crate::norm::ShortCircuitNorm;
use crate::parameters::{AnalysisType, ShortCircuitParameters};
use crate::results::{magnitudes, ResultStatus, ShortCircuitResult};

type Calculator = fn(Complex64, &FortescueValue, Complex64) -> FortescueValue;

fn calculator(fault_type: FaultType) -> Option<Calculator> {
    match fault_type {
        FaultType::ThreePhaseGround => Some(three_phase),
        FaultType::Monophase => Some(monophase),
        FaultType::Biphase => Some(biphase),
        FaultType::BiphaseGround => Some(biphase_ground),
        FaultType::BiphaseCommonSupport => None,
    }
}

/// Fault types whose current returns through the zero-sequence network.
fn needs_zero_sequence(fault_type: FaultType) -> bool {
    matches!(
        fault_type,
        FaultType::Monophase | FaultType::BiphaseGround | FaultType::BiphaseCommonSupport
    )
}

/// Unbalanced short circuits on the zero, direct and inverse sequence
/// networks. The inverse network is taken equal to the direct one.
///
/// Three-phase faults are accepted as well and only use the direct sequence,
/// which makes the engine usable as a cross-check of [`BalancedEngine`].
/// Systematic analysis is balanced-only and is rejected.
///
/// Two common-support faults on the same unordered bus pair are not solved
/// twice: the later ones get a zero result with
/// [`ResultStatus::DuplicatePair`] and a `duplicate-pair` warning.
///
/// [`BalancedEngine`]: super::BalancedEngine
#[derive(Debug)]
pub struct UnbalancedEngine<'a> {
    network: &'a Network,
    params: ShortCircuitParameters,
    faults: Vec<Fault>,
    cache: SequenceNetworkCache,
    results: FaultResults,
    diagnostics: Diagnostics,
}

impl<'a> UnbalancedEngine<'a> {
    pub fn new(network: &'a Network, params: ShortCircuitParameters, faults: Vec<Fault>) -> Self {
        Self {
            network,
            params,
            faults,
            cache: SequenceNetworkCache::new(),
            results: FaultResults::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn with_cache(mut self, cache: SequenceNetworkCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &SequenceNetworkCache {
        &self.cache
    }

    pub fn into_cache(self) -> SequenceNetworkCache {
        self.cache
    }

    pub fn parameters(&self) -> &ShortCircuitParameters {
        &self.params
    }

    pub fn faults(&self) -> &[Fault] {
        &self.faults
    }
}

impl ShortCircuitEngine for UnbalancedEngine<'_> {
    fn run(&mut self) -> ScResult<()> {
        self.results.clear();
        self.diagnostics = Diagnostics::new();

        if self.params.analysis_type == AnalysisType::Systematic {
            return Err(ScError::config(
                "systematic analysis only generates three-phase faults, use the balanced engine",
            ));
        }
        check_inputs(self.network, &self.faults, &mut self.diagnostics)?;

        let networks = self
            .cache
            .networks(self.network, &self.params, true, &mut self.diagnostics)?;
        info!(
            faults = self.faults.len(),
            buses = networks.model.bus_count(),
            norm = %self.params.norm,
            period = %self.params.period,
            "unbalanced short-circuit run"
        );

        let mut run = UnbalancedRun::new(networks, &self.params, &self.faults)?;
        for fault in &self.faults {
            let result = run.solve(fault, &mut self.diagnostics)?;
            self.results.push(result);
        }
        Ok(())
    }

    fn results_per_fault(&self) -> &FaultResults {
        &self.results
    }

    fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

type Columns = HashMap<usize, Option<Vec<Complex64>>>;

/// Impedance columns of every fault location, solved once per run.
struct UnbalancedRun<'n> {
    networks: &'n SequenceNetworks,
    norm: Box<dyn ShortCircuitNorm>,
    voltage_update: bool,
    direct: Columns,
    zero: Columns,
    solved_pairs: HashSet<(BusId, BusId)>,
}

impl<'n> UnbalancedRun<'n> {
    fn new(
        networks: &'n SequenceNetworks,
        params: &ShortCircuitParameters,
        faults: &[Fault],
    ) -> ScResult<Self> {
        let zero_solver = networks
            .zero()
            .ok_or_else(|| ScError::Solver("zero-sequence network was not factorized".into()))?;
        let indices = location_indices(faults, &networks.model)?;
        Ok(Self {
            networks,
            norm: params.norm.strategy(),
            voltage_update: params.voltage_update,
            direct: solve_columns(&networks.direct, &indices),
            zero: solve_columns(zero_solver, &indices),
            solved_pairs: HashSet::new(),
        })
    }

    fn index(&self, fault: &Fault, bus: BusId) -> ScResult<usize> {
        self.networks.model.bus_index(bus).ok_or_else(|| {
            ScError::config(format!("fault {}: unknown bus {}", fault.id(), bus.value()))
        })
    }

    fn voltage(&self, k: usize) -> Complex64 {
        self.networks
            .model
            .bus(k)
            .map(|b| b.voltage)
            .unwrap_or_default()
    }

    /// `(direct, zero)` columns of bus `k`. The zero column is only required
    /// when the fault type draws zero-sequence current; otherwise a missing
    /// one reads as zero.
    fn columns(&self, k: usize, fault_type: FaultType) -> Option<(&[Complex64], Vec<Complex64>)> {
        let direct = self.direct.get(&k)?.as_deref()?;
        let zero = match self.zero.get(&k).and_then(Option::as_ref) {
            Some(column) => column.clone(),
            None if needs_zero_sequence(fault_type) => return None,
            None => vec![Complex64::default(); direct.len()],
        };
        Some((direct, zero))
    }

    fn solve(&mut self, fault: &Fault, diag: &mut Diagnostics) -> ScResult<ShortCircuitResult> {
        let k1 = self.index(fault, fault.bus())?;
        match (calculator(fault.fault_type()), fault.second_bus(), fault.correlation()) {
            (Some(calculate), None, _) => Ok(self.single(fault, k1, calculate)),
            (None, Some(second), Some(correlation)) => {
                let k2 = self.index(fault, second)?;
                let pair = fault.bus_pair().unwrap_or((fault.bus(), second));
                if !self.solved_pairs.insert(pair) {
                    return Ok(self.duplicate(fault, k1, k2, diag));
                }
                Ok(self.common(fault, (k1, k2), second, correlation))
            }
            _ => Err(ScError::config(format!(
                "fault {}: {} has inconsistent locations",
                fault.id(),
                fault.fault_type()
            ))),
        }
    }

    fn singular(&self, fault: &Fault, locations: &[(BusId, usize)]) -> ShortCircuitResult {
        debug!(fault = %fault.id(), "singular location");
        let locations = locations
            .iter()
            .map(|&(bus, k)| {
                location(
                    &self.networks.model,
                    bus,
                    k,
                    FortescueValue::default(),
                    FortescueValue::direct_only(self.voltage(k)),
                )
            })
            .collect();
        ShortCircuitResult::singular(fault.id().clone(), fault.fault_type(), locations)
    }

    fn finish(
        &self,
        mut result: ShortCircuitResult,
        current: &FortescueValue,
        deltas: impl FnOnce() -> Vec<FortescueValue>,
    ) -> ShortCircuitResult {
        let nominal = result
            .locations
            .first()
            .map(|l| l.nominal_kv)
            .unwrap_or_default();
        (result.ik_ka, result.icc_a, result.pcc_mva) =
            magnitudes(current.direct, nominal, self.norm.cmax(nominal));
        if self.voltage_update {
            attach_deltas(&mut result, &self.networks.model, deltas());
        }
        result
    }

    fn single(&self, fault: &Fault, k: usize, calculate: Calculator) -> ShortCircuitResult {
        let Some((direct, zero)) = self.columns(k, fault.fault_type()) else {
            return self.singular(fault, &[(fault.bus(), k)]);
        };
        let e = self.voltage(k);
        let z = FortescueValue::new(zero[k], direct[k], direct[k]);
        let current = calculate(e, &z, fault.impedance());
        let voltage = fault_voltages(e, &z, &current);
        debug!(
            fault = %fault.id(),
            fault_type = %fault.fault_type(),
            zd = %z.direct,
            zo = %z.zero,
            "single-location fault"
        );

        let mut result = ShortCircuitResult::new(
            fault.id().clone(),
            fault.fault_type(),
            vec![location(&self.networks.model, fault.bus(), k, current, voltage)],
        );
        result.thevenin = z;
        self.finish(result, &current, || {
            direct
                .iter()
                .zip(&zero)
                .map(|(zd, zo)| {
                    FortescueValue::new(
                        -(*zo) * current.zero,
                        -(*zd) * current.direct,
                        -(*zd) * current.inverse,
                    )
                })
                .collect()
        })
    }

    fn common(
        &self,
        fault: &Fault,
        (k1, k2): (usize, usize),
        second: BusId,
        correlation: CommonSupportType,
    ) -> ShortCircuitResult {
        let fault_type = fault.fault_type();
        let (Some((d1, o1)), Some((d2, o2))) = (self.columns(k1, fault_type), self.columns(k2, fault_type))
        else {
            return self.singular(fault, &[(fault.bus(), k1), (second, k2)]);
        };

        // column c holds Z[., c]; row r of it is the transfer impedance Z[r, c]
        let entry = |d: &[Complex64], o: &[Complex64], row: usize| {
            FortescueValue::new(o[row], d[row], d[row])
        };
        let mutual = MutualImpedances {
            z11: entry(d1, &o1, k1),
            z12: entry(d2, &o2, k1),
            z21: entry(d1, &o1, k2),
            z22: entry(d2, &o2, k2),
        };

        let (e1, e2) = (self.voltage(k1), self.voltage(k2));
        let (i1, i2) = common_support(e1, e2, &mutual, fault.impedance(), correlation);
        let (v1, v2) = common_support_voltages(e1, e2, &mutual, &i1, &i2);
        debug!(
            fault = %fault.id(),
            ?correlation,
            ic = %i1.to_phases()[2],
            "common-support fault"
        );

        let model = &self.networks.model;
        let mut result = ShortCircuitResult::new(
            fault.id().clone(),
            fault_type,
            vec![
                location(model, fault.bus(), k1, i1, v1),
                location(model, second, k2, i2, v2),
            ],
        );
        result.thevenin = mutual.z11;
        result.mutual = Some(mutual);
        self.finish(result, &i1, || {
            (0..model.bus_count())
                .map(|j| {
                    FortescueValue::new(
                        -(o1[j] * i1.zero + o2[j] * i2.zero),
                        -(d1[j] * i1.direct + d2[j] * i2.direct),
                        -(d1[j] * i1.inverse + d2[j] * i2.inverse),
                    )
                })
                .collect()
        })
    }

    fn duplicate(
        &self,
        fault: &Fault,
        k1: usize,
        k2: usize,
        diag: &mut Diagnostics,
    ) -> ShortCircuitResult {
        let (bus1, bus2) = (fault.bus(), fault.second_bus().unwrap_or(fault.bus()));
        warn!(
            fault = %fault.id(),
            bus1 = bus1.value(),
            bus2 = bus2.value(),
            "common-support bus pair already solved in this run, result set to zero"
        );
        diag.add_warning_with_entity(
            "duplicate-pair",
            &format!(
                "buses {} and {} already carry a common-support fault, result set to zero",
                bus1.value(),
                bus2.value()
            ),
            fault.id().as_str(),
        );
        let model = &self.networks.model;
        let zero = FortescueValue::default();
        let mut result = ShortCircuitResult::new(
            fault.id().clone(),
            fault.fault_type(),
            vec![
                location(model, bus1, k1, zero, zero),
                location(model, bus2, k2, zero, zero),
            ],
        );
        result.status = ResultStatus::DuplicatePair;
        result
    }
}
