//! IEC 60909 correction factors.
//!
//! - kT for two-winding transformers (§6.3.3)
//! - kG for synchronous generators (§6.6.1)
//! - Ks for power station units with or without on-load tap changer (§6.7)
//! - pairwise kTAB/kTAC/kTBC for three-winding transformers, split per leg

use std::collections::HashSet;

use faultline_core::{
    BusId, Diagnostics, Generator, Kilovolts, Network, ThreeWindingTransformer, TransformerLeg,
    TwoWindingTransformer,
};
use tracing::{debug, warn};

use super::{
    checked_coefficient, LegCoefficients, Norm, NormCoefficients, ShortCircuitNorm,
};

const LOW_VOLTAGE_KV: f64 = 1.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct IecNorm;

impl ShortCircuitNorm for IecNorm {
    fn kind(&self) -> Norm {
        Norm::Iec
    }

    fn cmax(&self, nominal: Kilovolts) -> f64 {
        if nominal.value() <= LOW_VOLTAGE_KV {
            1.05
        } else {
            1.10
        }
    }

    fn cmin(&self, nominal: Kilovolts) -> f64 {
        if nominal.value() <= LOW_VOLTAGE_KV {
            0.95
        } else {
            1.0
        }
    }

    fn compute(&self, network: &Network, diag: &mut Diagnostics) -> NormCoefficients {
        let mut coefficients = NormCoefficients::new();
        let mut unit_generators = HashSet::new();

        for t2w in network.two_winding_transformers() {
            let unit = t2w
                .short_circuit
                .filter(|sc| sc.part_of_generating_unit)
                .and_then(|_| self.unit_generator(network, t2w, diag));

            let k = match unit {
                Some(gen) => {
                    let ks = self.ks(network, t2w, gen);
                    debug!(transformer = %t2w.name, generator = %gen.name, ks, "power station unit");
                    coefficients.set_generator(gen.id, ks);
                    unit_generators.insert(gen.id);
                    ks
                }
                None => self.kt(network, t2w, diag),
            };
            coefficients.set_transformer(t2w.id, k);
        }

        for gen in network.generators() {
            if unit_generators.contains(&gen.id) {
                continue;
            }
            coefficients.set_generator(gen.id, self.kg(network, gen));
        }

        for t3w in &network.three_winding_transformers {
            coefficients.set_legs(t3w.id, self.three_winding_legs(network, t3w, diag));
        }

        coefficients
    }
}

fn nominal_of(network: &Network, bus: BusId) -> Kilovolts {
    network.bus(bus).map(|b| b.nominal_kv).unwrap_or_default()
}

fn sin_phi(cos_phi: f64) -> f64 {
    (1.0 - cos_phi * cos_phi).max(0.0).sqrt()
}

/// Sub-transient reactance in pu of the machine rating.
fn subtransient_pu(gen: &Generator, rated_u: Kilovolts) -> f64 {
    let sc = &gen.short_circuit;
    match sc.rated_s {
        Some(rated_s) if rated_u.value() > 0.0 => {
            sc.sub_transient_x * rated_s.value() / (rated_u.value() * rated_u.value())
        }
        _ => 0.0,
    }
}

impl IecNorm {
    /// kT = 0.95 cmax / (1 + 0.6 xT), cmax at the side-1 nominal voltage.
    pub fn kt(&self, network: &Network, t2w: &TwoWindingTransformer, diag: &mut Diagnostics) -> f64 {
        let Some(rated_s) = t2w.rated_s else {
            warn!(transformer = %t2w.name, "no rated power, kT set to 1");
            diag.add_warning_with_entity("norm", "no rated power, kT set to 1", &t2w.name);
            return 1.0;
        };
        let cmax = self.cmax(nominal_of(network, t2w.bus1));
        let u2 = t2w.rated_u2.value();
        let xt = t2w.x * rated_s.value() / (u2 * u2);
        0.95 * cmax / (1.0 + 0.6 * xt)
    }

    /// kG = (Un / UrG) cmax / (1 + x"d sin phi); 1 without rated data.
    pub fn kg(&self, network: &Network, gen: &Generator) -> f64 {
        let sc = &gen.short_circuit;
        if sc.is_feeder() {
            return 1.0;
        }
        let (Some(rated_u), Some(_)) = (sc.rated_u, sc.rated_s) else {
            return 1.0;
        };
        if rated_u.value() <= 0.0 {
            return 1.0;
        }
        let un = nominal_of(network, gen.bus);
        let xd = subtransient_pu(gen, rated_u);
        un.value() / rated_u.value() * self.cmax(un) / (1.0 + xd * sin_phi(sc.cos_phi))
    }

    /// First in-service rotating generator on the bus of the lower rated
    /// voltage side of a unit transformer.
    fn unit_generator<'a>(
        &self,
        network: &'a Network,
        t2w: &TwoWindingTransformer,
        diag: &mut Diagnostics,
    ) -> Option<&'a Generator> {
        let lv_bus = if t2w.rated_u1 < t2w.rated_u2 {
            t2w.bus1
        } else {
            t2w.bus2
        };
        let gen = network
            .generators_at_bus(lv_bus)
            .into_iter()
            .find(|g| g.in_service && !g.short_circuit.is_feeder());
        if gen.is_none() {
            warn!(transformer = %t2w.name, "unit transformer without generator on its low-voltage bus");
            diag.add_warning_with_entity(
                "norm",
                "unit transformer without generator on its low-voltage bus, kT used",
                &t2w.name,
            );
        }
        gen
    }

    /// Ks of a power station unit.
    pub fn ks(&self, network: &Network, t2w: &TwoWindingTransformer, gen: &Generator) -> f64 {
        let unq = nominal_of(network, t2w.bus1).max(nominal_of(network, t2w.bus2));
        let ur_hv = t2w.rated_u1.max(t2w.rated_u2).value();
        let ur_lv = t2w.rated_u1.min(t2w.rated_u2).value();
        let sc = &gen.short_circuit;
        let urg = sc.rated_u.unwrap_or_else(|| nominal_of(network, gen.bus));
        let cmax = self.cmax(unq);
        let xd = subtransient_pu(gen, urg);
        let sin = sin_phi(sc.cos_phi);
        let ratio = unq.value() * ur_lv / urg.value() / ur_hv;

        let on_load_tap_changer = t2w
            .short_circuit
            .map(|s| s.on_load_tap_changer)
            .unwrap_or(false);
        if on_load_tap_changer {
            let u2 = t2w.rated_u2.value();
            let xt = t2w
                .rated_s
                .map(|s| t2w.x * s.value() / (u2 * u2))
                .unwrap_or(0.0);
            ratio * ratio * cmax / (1.0 + (xd - xt).abs() * sin)
        } else {
            ratio / (1.0 + sc.voltage_regulation_range / 100.0) * cmax / (1.0 + xd * sin)
        }
    }

    /// Per-leg zero-sequence coefficients from the pairwise kT factors.
    fn three_winding_legs(
        &self,
        network: &Network,
        t3w: &ThreeWindingTransformer,
        diag: &mut Diagnostics,
    ) -> [LegCoefficients; 3] {
        let [a, b, c] = &t3w.legs;
        let pair = |i: &TransformerLeg, j: &TransformerLeg| -> Option<f64> {
            let (si, sj) = (i.rated_s?, j.rated_s?);
            let nominal = nominal_of(network, i.bus).max(nominal_of(network, j.bus));
            let u0 = t3w.rated_u0.value();
            let y_base = si.min(sj).value() / (u0 * u0);
            Some(0.95 * self.cmax(nominal) / (1.0 + 0.6 * (i.x + j.x) * y_base))
        };
        let (Some(kab), Some(kac), Some(kbc)) = (pair(a, b), pair(a, c), pair(b, c)) else {
            warn!(transformer = %t3w.name, "leg without rated power, kT set to 1");
            diag.add_warning_with_entity("norm", "leg without rated power, kT set to 1", &t3w.name);
            return [LegCoefficients::default(); 3];
        };

        // zero-sequence leg values before correction
        let ro = t3w.legs.clone().map(|l| l.r * l.short_circuit.coeff_ro);
        let xo = t3w.legs.clone().map(|l| l.x * l.short_circuit.coeff_xo);

        let split = |z: [f64; 3]| -> [f64; 3] {
            let (za, zb, zc) = (z[0], z[1], z[2]);
            [
                0.5 * (kab * (za + zb) + kac * (za + zc) - kbc * (zb + zc)),
                0.5 * (kab * (za + zb) - kac * (za + zc) + kbc * (zb + zc)),
                0.5 * (-kab * (za + zb) + kac * (za + zc) + kbc * (zb + zc)),
            ]
        };
        let ro_k = split(ro);
        let xo_k = split(xo);

        let mut legs = [LegCoefficients::default(); 3];
        for i in 0..3 {
            legs[i] = LegCoefficients {
                k_ro: checked_coefficient(&t3w.name, ro_k[i], ro[i], diag),
                k_xo: checked_coefficient(&t3w.name, xo_k[i], xo[i], diag),
            };
        }
        legs
    }
}
