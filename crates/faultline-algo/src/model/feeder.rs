//! Bus shunt injections: generators, loads and shunts seen from the
//! sequence networks.

use faultline_core::{Generator, GeneratorKind, Kilovolts, Load, MegavoltAmperes, Shunt};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::norm::feeder_impedance;
use crate::parameters::PeriodType;

/// Below this magnitude (pu) a machine impedance component is treated as zero.
const MIN_MACHINE_IMPEDANCE: f64 = 1e-7;

/// Below this magnitude (pu) a shunt is ignored.
const MIN_SHUNT_ADMITTANCE: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeederKind {
    Generator,
    Load,
    Shunt,
}

/// A shunt element connected at a bus, with its admittance in the direct
/// (and inverse) and zero sequence networks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScFeeder {
    pub name: String,
    pub kind: FeederKind,
    pub bus: usize,
    pub direct: Complex64,
    pub zero: Complex64,
}

fn base_impedance(nominal: Kilovolts) -> f64 {
    nominal.base_impedance(MegavoltAmperes(super::BASE_MVA)).value()
}

/// Direct and zero-sequence admittances of a generator, `None` when its
/// impedance is zero.
pub(crate) fn generator_feeder(
    gen: &Generator,
    bus: usize,
    nominal: Kilovolts,
    period: PeriodType,
    k: f64,
) -> Option<ScFeeder> {
    let sc = &gen.short_circuit;
    let (r, x) = match sc.kind {
        GeneratorKind::Feeder(infeed) => feeder_impedance(&infeed, nominal),
        GeneratorKind::Rotating => {
            let (r, x) = match period {
                PeriodType::SubTransient => (sc.sub_transient_r, sc.sub_transient_x),
                PeriodType::Transient => (sc.transient_r, sc.transient_x),
            };
            ((r + sc.step_up_r) * k, (x + sc.step_up_x) * k)
        }
    };
    let zb = base_impedance(nominal);
    if (r / zb).abs() < MIN_MACHINE_IMPEDANCE && (x / zb).abs() < MIN_MACHINE_IMPEDANCE {
        debug!(generator = %gen.name, "zero machine impedance, generator ignored");
        return None;
    }
    let direct = Complex64::new(zb, 0.0) / Complex64::new(r, x);

    let zero = if sc.grounded {
        let z0 = Complex64::new(r * sc.coeff_ro, x * sc.coeff_xo)
            + Complex64::new(sc.grounding.r, sc.grounding.x) * 3.0;
        if z0.norm() / zb < MIN_MACHINE_IMPEDANCE {
            Complex64::default()
        } else {
            Complex64::new(zb, 0.0) / z0
        }
    } else {
        Complex64::default()
    };

    Some(ScFeeder {
        name: gen.name.clone(),
        kind: FeederKind::Generator,
        bus,
        direct,
        zero,
    })
}

/// Constant-impedance load at the pre-fault voltage magnitude, or the
/// locked-rotor impedance of an asynchronous motor.
pub(crate) fn load_feeder(
    load: &Load,
    bus: usize,
    nominal: Kilovolts,
    voltage_magnitude: f64,
) -> Option<ScFeeder> {
    let direct = match &load.motor {
        Some(motor) => {
            let (r, x) = motor.locked_rotor_impedance();
            let z = Complex64::new(r, x);
            if z.norm() == 0.0 {
                return None;
            }
            Complex64::new(base_impedance(nominal), 0.0) / z
        }
        None => {
            let s = Complex64::new(load.active_power.value(), -load.reactive_power.value());
            s / super::BASE_MVA / (voltage_magnitude * voltage_magnitude)
        }
    };
    if direct == Complex64::default() {
        return None;
    }
    Some(ScFeeder {
        name: load.name.clone(),
        kind: FeederKind::Load,
        bus,
        direct,
        zero: Complex64::default(),
    })
}

pub(crate) fn shunt_feeder(shunt: &Shunt, bus: usize) -> Option<ScFeeder> {
    if !shunt.in_service
        || (shunt.g_pu.abs() <= MIN_SHUNT_ADMITTANCE && shunt.b_pu.abs() <= MIN_SHUNT_ADMITTANCE)
    {
        return None;
    }
    Some(ScFeeder {
        name: shunt.name.clone(),
        kind: FeederKind::Shunt,
        bus,
        direct: Complex64::new(shunt.g_pu, shunt.b_pu),
        zero: Complex64::default(),
    })
}
