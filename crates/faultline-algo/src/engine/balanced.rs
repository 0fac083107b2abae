use faultline_core::{Diagnostics, Network, ScResult};
use num_complex::Complex64;
use tracing::{debug, info};

use super::{
    attach_deltas, check_inputs, location, location_indices, solve_columns, FaultResults,
    SequenceNetworkCache, SequenceNetworks, ShortCircuitEngine,
};
use crate::calculators::{fault_voltages, three_phase};
use crate::fault::{systematic_faults, Fault, FaultError};
use crate::fortescue::FortescueValue;
use crate::parameters::{AnalysisType, ShortCircuitParameters};
use crate::results::{magnitudes, ShortCircuitResult};

/// Three-phase short circuits on the direct-sequence network.
///
/// Under [`AnalysisType::Systematic`] the supplied fault list is ignored and
/// one bolted fault per bus is generated instead.
///
/// ```ignore
/// let mut engine = BalancedEngine::new(&network, params, faults);
/// engine.run()?;
/// let ik = engine.results_per_fault().get("F1").map(|r| r.ik_ka);
/// ```
#[derive(Debug)]
pub struct BalancedEngine<'a> {
    network: &'a Network,
    params: ShortCircuitParameters,
    faults: Vec<Fault>,
    cache: SequenceNetworkCache,
    results: FaultResults,
    diagnostics: Diagnostics,
}

impl<'a> BalancedEngine<'a> {
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

    /// Reuse factorizations from an earlier run on the same network.
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

    /// Faults the next run computes.
    pub fn faults(&self) -> Vec<Fault> {
        match self.params.analysis_type {
            AnalysisType::Selective => self.faults.clone(),
            AnalysisType::Systematic => systematic_faults(self.network),
        }
    }
}

impl ShortCircuitEngine for BalancedEngine<'_> {
    fn run(&mut self) -> ScResult<()> {
        self.results.clear();
        self.diagnostics = Diagnostics::new();

        let faults = self.faults();
        if let Some(fault) = faults.iter().find(|f| !f.fault_type().is_balanced()) {
            return Err(FaultError::UnsupportedType {
                fault: fault.id().clone(),
                fault_type: fault.fault_type(),
                engine: "balanced",
            }
            .into());
        }
        check_inputs(self.network, &faults, &mut self.diagnostics)?;

        let networks = self
            .cache
            .networks(self.network, &self.params, false, &mut self.diagnostics)?;
        info!(
            faults = faults.len(),
            buses = networks.model.bus_count(),
            norm = %self.params.norm,
            period = %self.params.period,
            "balanced short-circuit run"
        );

        for result in solve(networks, &self.params, &faults)? {
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

fn solve(
    networks: &SequenceNetworks,
    params: &ShortCircuitParameters,
    faults: &[Fault],
) -> ScResult<Vec<ShortCircuitResult>> {
    let model = &networks.model;
    let norm = params.norm.strategy();
    let indices = location_indices(faults, model)?;
    let columns = solve_columns(&networks.direct, &indices);

    let mut results = Vec::with_capacity(faults.len());
    for (fault, locations) in faults.iter().zip(&indices) {
        let k = locations[0];
        let e = model.bus(k).map(|b| b.voltage).unwrap_or_default();
        let column = columns.get(&k).and_then(Option::as_ref);

        let Some(column) = column else {
            debug!(fault = %fault.id(), "singular location");
            results.push(ShortCircuitResult::singular(
                fault.id().clone(),
                fault.fault_type(),
                vec![location(
                    model,
                    fault.bus(),
                    k,
                    FortescueValue::default(),
                    FortescueValue::direct_only(e),
                )],
            ));
            continue;
        };

        let zth = column[k];
        let z = FortescueValue::new(Complex64::default(), zth, zth);
        let current = three_phase(e, &z, fault.impedance());
        let voltage = fault_voltages(e, &z, &current);

        let fault_location = location(model, fault.bus(), k, current, voltage);
        let nominal = fault_location.nominal_kv;
        let mut result =
            ShortCircuitResult::new(fault.id().clone(), fault.fault_type(), vec![fault_location]);
        result.thevenin = z;
        (result.ik_ka, result.icc_a, result.pcc_mva) =
            magnitudes(current.direct, nominal, norm.cmax(nominal));
        debug!(fault = %fault.id(), zth = %zth, ik_ka = result.ik_ka, "three-phase fault");

        if params.voltage_update {
            let deltas = column
                .iter()
                .map(|z_jk| FortescueValue::direct_only(-(*z_jk) * current.direct))
                .collect();
            attach_deltas(&mut result, model, deltas);
        }
        results.push(result);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_core::{Bus, BusId, GenId, Generator, GeneratorShortCircuit, Kilovolts, Line, LineId};

    fn network() -> Network {
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
        network
    }

    /// An unbalanced fault type aborts the run with a configuration error
    #[test]
    fn test_rejects_unbalanced_fault() {
        let network = network();
        let faults = vec![Fault::monophase("F1", BusId::new(1), 0.0, 0.0)];
        let mut engine = BalancedEngine::new(&network, ShortCircuitParameters::new(), faults);
        let err = engine.run().unwrap_err();
        assert!(err.is_config(), "expected a configuration error, got {err}");
        assert!(err.to_string().contains("F1"), "error should name the fault: {err}");
    }

    /// Systematic analysis creates one fault per bus
    #[test]
    fn test_systematic_generates_one_fault_per_bus() {
        let network = network();
        let params = ShortCircuitParameters::new().with_analysis_type(AnalysisType::Systematic);
        let mut engine = BalancedEngine::new(&network, params, Vec::new());
        engine.run().unwrap();
        let results = engine.results_per_fault();
        assert_eq!(results.len(), 2);
        assert!(results.get("SC_B1").is_some());
        assert!(results.get("SC_B2").is_some());
    }

    /// Bolted fault on a radial feeder: If = 1 / (Zg + Zl) with pu impedances
    #[test]
    fn test_radial_fault_current() {
        let network = network();
        let faults = vec![Fault::three_phase("F2", BusId::new(2), 0.0, 0.0)];
        let mut engine = BalancedEngine::new(&network, ShortCircuitParameters::new(), faults);
        engine.run().unwrap();

        let result = engine.results_per_fault().get("F2").unwrap();
        assert!(result.is_ok());
        let zb = 10.0 * 10.0 / 100.0;
        let z = Complex64::new(0.15, 1.5) / zb;
        let expected = Complex64::new(1.0, 0.0) / z;
        assert!(
            (result.direct_current() - expected).norm() < 1e-9,
            "current {} != {}",
            result.direct_current(),
            expected
        );
        // the faulted bus collapses to zero
        let delta = result.voltage_delta("B2").unwrap();
        assert!((delta.direct + Complex64::new(1.0, 0.0)).norm() < 1e-9);
        let feeder = result.feeder("G1").unwrap();
        assert!((feeder.current.direct - expected).norm() < 1e-9);
    }
}
