//! Per-unit sequence-network model.
//!
//! [`ScNetwork::build`] turns a [`Network`] into the buses, branches and bus
//! injections of the direct and zero-sequence networks, in per-unit on a
//! 100 MVA base. The inverse-sequence network is the direct one. Norm
//! coefficients are read from a [`NormCoefficients`] table; the network
//! itself is never modified.
//!
//! Three-winding transformers are expanded into a star bus (nominal voltage
//! = rated U0, pre-fault voltage 1 pu) and one branch per leg.

mod branch;
mod feeder;

use std::collections::HashMap;

use faultline_core::{
    BusId, Diagnostics, Kilovolts, MegavoltAmperes, Network, ScError, ScResult, ThreeWindingTransformer,
    ThreeWindingTransformerId, WindingConnection,
};
use num_complex::Complex64;
use serde::Serialize;
use tracing::{debug, warn};

pub use branch::{BranchBlock, BranchKind, ScBranch};
pub use feeder::{FeederKind, ScFeeder};

use crate::homopolar::{HomopolarData, WindingData};
use crate::norm::NormCoefficients;
use crate::parameters::{ShortCircuitParameters, VoltageProfile};

/// System base power in MVA.
pub const BASE_MVA: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScBusKind {
    Network(BusId),
    /// Star point of a three-winding transformer
    Star(ThreeWindingTransformerId),
}

#[derive(Debug, Clone, Serialize)]
pub struct ScBus {
    pub kind: ScBusKind,
    pub name: String,
    pub nominal_kv: Kilovolts,
    /// Pre-fault voltage in pu
    pub voltage: Complex64,
}

/// The sequence networks of one study.
#[derive(Debug, Clone)]
pub struct ScNetwork {
    buses: Vec<ScBus>,
    branches: Vec<ScBranch>,
    feeders: Vec<ScFeeder>,
    bus_map: HashMap<BusId, usize>,
}

fn base_impedance(nominal: Kilovolts) -> f64 {
    nominal.base_impedance(MegavoltAmperes(BASE_MVA)).value()
}

/// `g / coeff_ro + j b / coeff_xo`, a zero coefficient dropping its part.
fn scale_shunt(y: Complex64, coeff_ro: f64, coeff_xo: f64) -> Complex64 {
    let g = if coeff_ro != 0.0 { y.re / coeff_ro } else { 0.0 };
    let b = if coeff_xo != 0.0 { y.im / coeff_xo } else { 0.0 };
    Complex64::new(g, b)
}

struct BranchSpec {
    name: String,
    kind: BranchKind,
    bus1: usize,
    bus2: usize,
    z: Complex64,
    y1: Complex64,
    y2: Complex64,
    rho: f64,
    alpha: f64,
    homopolar: HomopolarData,
}

impl ScNetwork {
    /// Assemble the per-unit model for one (period, norm, profile) choice.
    pub fn build(
        network: &Network,
        params: &ShortCircuitParameters,
        coefficients: &NormCoefficients,
        diag: &mut Diagnostics,
    ) -> ScResult<Self> {
        let mut model = ScNetwork {
            buses: Vec::new(),
            branches: Vec::new(),
            feeders: Vec::new(),
            bus_map: HashMap::new(),
        };

        for bus in network.buses() {
            let voltage = match params.voltage_profile {
                VoltageProfile::Nominal => Complex64::new(1.0, 0.0),
                VoltageProfile::Calculated => {
                    Complex64::from_polar(bus.voltage_pu.value(), bus.angle_rad.value())
                }
            };
            model.bus_map.insert(bus.id, model.buses.len());
            model.buses.push(ScBus {
                kind: ScBusKind::Network(bus.id),
                name: bus.name.clone(),
                nominal_kv: bus.nominal_kv,
                voltage,
            });
        }

        let ratio = params.homopolar_default_ratio;

        for line in network.lines() {
            if !line.in_service {
                continue;
            }
            let bus1 = model.index_of(line.bus1, &line.name)?;
            let bus2 = model.index_of(line.bus2, &line.name)?;
            let v1 = model.buses[bus1].nominal_kv.value();
            let v2 = model.buses[bus2].nominal_kv;
            let zb = base_impedance(v2);
            let z = Complex64::new(line.r, line.x) / zb;
            let y1 = Complex64::new(line.g1, line.b1) * zb;
            let y2 = Complex64::new(line.g2, line.b2) * zb;

            let homopolar = match line.short_circuit {
                Some(sc) => HomopolarData::Line {
                    zo: Complex64::new(line.r * sc.coeff_ro, line.x * sc.coeff_xo) / zb,
                    y1o: scale_shunt(y1, sc.coeff_ro, sc.coeff_xo),
                    y2o: scale_shunt(y2, sc.coeff_ro, sc.coeff_xo),
                },
                None => HomopolarData::Line {
                    zo: z / ratio,
                    y1o: y1 * ratio,
                    y2o: y2 * ratio,
                },
            };

            model.push_branch(
                BranchSpec {
                    name: line.name.clone(),
                    kind: BranchKind::Line(line.id),
                    bus1,
                    bus2,
                    z,
                    y1,
                    y2,
                    rho: v1 / v2.value(),
                    alpha: 0.0,
                    homopolar,
                },
                params,
                diag,
            )?;
        }

        for t2w in network.two_winding_transformers() {
            if !t2w.in_service {
                continue;
            }
            let bus1 = model.index_of(t2w.bus1, &t2w.name)?;
            let bus2 = model.index_of(t2w.bus2, &t2w.name)?;
            let v1 = model.buses[bus1].nominal_kv;
            let v2 = model.buses[bus2].nominal_kv;
            let zb = base_impedance(v2);
            let z = Complex64::new(t2w.r, t2w.x) / zb;
            let y1 = Complex64::new(t2w.g, t2w.b) * zb;
            let rho = t2w.rated_u2.value() / t2w.rated_u1.value() * v1.value() / v2.value();

            // kT does not scale the two-winding zero sequence
            let data = match t2w.short_circuit {
                Some(sc) => WindingData {
                    zo: Complex64::new(t2w.r * sc.coeff_ro, t2w.x * sc.coeff_xo) / zb,
                    yom: scale_shunt(y1, sc.coeff_ro, sc.coeff_xo),
                    connection1: sc.connection1,
                    connection2: sc.connection2,
                    zg1: Complex64::new(sc.grounding1.r, sc.grounding1.x) / base_impedance(v1),
                    zg2: Complex64::new(sc.grounding2.r, sc.grounding2.x) / zb,
                    free_fluxes: sc.free_fluxes,
                },
                None => WindingData {
                    zo: z / ratio,
                    yom: y1 * ratio,
                    connection1: WindingConnection::YGrounded,
                    connection2: WindingConnection::YGrounded,
                    zg1: Complex64::default(),
                    zg2: Complex64::default(),
                    free_fluxes: false,
                },
            };

            model.push_branch(
                BranchSpec {
                    name: t2w.name.clone(),
                    kind: BranchKind::Transformer(t2w.id),
                    bus1,
                    bus2,
                    z,
                    y1,
                    y2: Complex64::default(),
                    rho,
                    alpha: t2w.phase_shift.to_radians().value(),
                    homopolar: HomopolarData::Transformer(data),
                },
                params,
                diag,
            )?;
        }

        for t3w in &network.three_winding_transformers {
            if t3w.in_service {
                model.push_three_winding(t3w, params, coefficients, diag)?;
            }
        }

        model.push_feeders(network, params, coefficients)?;

        debug!(
            buses = model.buses.len(),
            branches = model.branches.len(),
            feeders = model.feeders.len(),
            "sequence networks assembled"
        );
        Ok(model)
    }

    fn index_of(&self, bus: BusId, owner: &str) -> ScResult<usize> {
        self.bus_map.get(&bus).copied().ok_or_else(|| {
            ScError::Network(format!("{} references unknown bus {}", owner, bus.value()))
        })
    }

    fn push_branch(
        &mut self,
        spec: BranchSpec,
        params: &ShortCircuitParameters,
        diag: &mut Diagnostics,
    ) -> ScResult<()> {
        if spec.z.im.abs() < params.low_impedance_threshold {
            warn!(branch = %spec.name, x = spec.z.im, "low impedance branch skipped");
            diag.add_warning_with_entity(
                "topology",
                "reactance below the low impedance threshold, branch skipped",
                &spec.name,
            );
            return Ok(());
        }
        let direct = BranchBlock::pi_model(spec.z, spec.y1, spec.y2, spec.rho, spec.alpha);
        let zero = spec.homopolar.block(
            &spec.name,
            spec.rho,
            spec.alpha,
            params.infinite_impedance_admittance,
        )?;
        self.branches.push(ScBranch {
            name: spec.name,
            kind: spec.kind,
            bus1: spec.bus1,
            bus2: spec.bus2,
            z: spec.z,
            y1: spec.y1,
            y2: spec.y2,
            rho: spec.rho,
            alpha: spec.alpha,
            homopolar: spec.homopolar,
            direct,
            zero,
        });
        Ok(())
    }

    fn push_three_winding(
        &mut self,
        t3w: &ThreeWindingTransformer,
        params: &ShortCircuitParameters,
        coefficients: &NormCoefficients,
        diag: &mut Diagnostics,
    ) -> ScResult<()> {
        let star = self.buses.len();
        self.buses.push(ScBus {
            kind: ScBusKind::Star(t3w.id),
            name: format!("{}_STAR", t3w.name),
            nominal_kv: t3w.rated_u0,
            voltage: Complex64::new(1.0, 0.0),
        });

        let zb = base_impedance(t3w.rated_u0);
        let legs = coefficients.legs(t3w.id);
        for (i, (leg, k)) in t3w.legs.iter().zip(legs).enumerate() {
            let name = format!("{}_LEG_{}", t3w.name, i + 1);
            let bus1 = self.index_of(leg.bus, &name)?;
            let z = Complex64::new(leg.r, leg.x) / zb;
            let y1 = Complex64::new(leg.g, leg.b) * zb;
            let sc = leg.short_circuit;
            let data = WindingData {
                zo: Complex64::new(leg.r * sc.coeff_ro * k.k_ro, leg.x * sc.coeff_xo * k.k_xo) / zb,
                yom: scale_shunt(y1, sc.coeff_ro * k.k_ro, sc.coeff_xo * k.k_xo),
                connection1: sc.connection,
                connection2: WindingConnection::YGrounded,
                zg1: Complex64::default(),
                zg2: Complex64::default(),
                free_fluxes: sc.free_fluxes,
            };
            let rho = self.buses[bus1].nominal_kv.value() / leg.rated_u.value();
            self.push_branch(
                BranchSpec {
                    name,
                    kind: BranchKind::Leg {
                        transformer: t3w.id,
                        leg: i,
                    },
                    bus1,
                    bus2: star,
                    z,
                    y1,
                    y2: Complex64::default(),
                    rho,
                    alpha: 0.0,
                    homopolar: HomopolarData::Transformer(data),
                },
                params,
                diag,
            )?;
        }
        Ok(())
    }

    fn push_feeders(
        &mut self,
        network: &Network,
        params: &ShortCircuitParameters,
        coefficients: &NormCoefficients,
    ) -> ScResult<()> {
        for gen in network.generators() {
            if !gen.in_service {
                continue;
            }
            let bus = self.index_of(gen.bus, &gen.name)?;
            let k = coefficients.generator(gen.id);
            if let Some(feeder) =
                feeder::generator_feeder(gen, bus, self.buses[bus].nominal_kv, params.period, k)
            {
                self.feeders.push(feeder);
            }
        }

        for idx in 0..self.buses.len() {
            let ScBusKind::Network(bus_id) = self.buses[idx].kind else {
                continue;
            };
            let magnitude = self.buses[idx].voltage.norm();
            for load in network.loads_at_bus(bus_id) {
                if let Some(feeder) =
                    feeder::load_feeder(load, idx, self.buses[idx].nominal_kv, magnitude)
                {
                    self.feeders.push(feeder);
                }
            }
            if !params.ignore_shunts {
                for shunt in network.shunts_at_bus(bus_id) {
                    if let Some(feeder) = feeder::shunt_feeder(shunt, idx) {
                        self.feeders.push(feeder);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn buses(&self) -> &[ScBus] {
        &self.buses
    }

    pub fn bus(&self, index: usize) -> Option<&ScBus> {
        self.buses.get(index)
    }

    pub fn bus_count(&self) -> usize {
        self.buses.len()
    }

    pub fn bus_index(&self, id: BusId) -> Option<usize> {
        self.bus_map.get(&id).copied()
    }

    pub fn branches(&self) -> &[ScBranch] {
        &self.branches
    }

    pub fn feeders(&self) -> &[ScFeeder] {
        &self.feeders
    }

    pub fn feeders_at(&self, bus: usize) -> impl Iterator<Item = &ScFeeder> + '_ {
        self.feeders.iter().filter(move |f| f.bus == bus)
    }
}
