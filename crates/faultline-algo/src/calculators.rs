//! Fault boundary equations in symmetrical components.
//!
//! Every calculator takes the pre-fault direct-sequence voltage `E` at the
//! fault location, the Thevenin impedances there (as a [`FortescueValue`] of
//! impedances) and the fault impedance `Zf`, and returns the sequence
//! currents flowing from the network into the fault.
//!
//! Unbalanced faults use phase c as the faulted phase (MONOPHASE) and phases
//! b and c (BIPHASE, BIPHASE_GROUND).

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::fault::CommonSupportType;
use crate::fortescue::{a, a2, FortescueValue};

/// Three-phase fault: `If = E / (Zd + Zf)`.
pub fn three_phase(e: Complex64, z: &FortescueValue, zf: Complex64) -> FortescueValue {
    FortescueValue::direct_only(e / (z.direct + zf))
}

/// Phase c to ground.
///
/// ```text
/// Io = a E / (Zo + Zd + Zi + 3Zf),   Id = a² Io,   Ii = a Io
/// ```
pub fn monophase(e: Complex64, z: &FortescueValue, zf: Complex64) -> FortescueValue {
    let io = a() * e / (z.zero + z.direct + z.inverse + zf * 3.0);
    FortescueValue::new(io, a2() * io, a() * io)
}

/// Phase b to phase c: `Id = E / (Zd + Zi + Zf)`, `Ii = -Id`.
pub fn biphase(e: Complex64, z: &FortescueValue, zf: Complex64) -> FortescueValue {
    let id = e / (z.direct + z.inverse + zf);
    FortescueValue::new(Complex64::default(), id, -id)
}

/// Phases b and c to ground through `Zf`.
///
/// ```text
/// Z' = Zo + 3Zf
/// Id = E (Zi + Z') / (Zd Zi + (Zd + Zi) Z')
/// Ii = -Id Z' / (Zi + Z')
/// Io = -Id Zi / (Zi + Z')
/// ```
pub fn biphase_ground(e: Complex64, z: &FortescueValue, zf: Complex64) -> FortescueValue {
    let zo3 = z.zero + zf * 3.0;
    let id = e * (z.inverse + zo3) / (z.direct * z.inverse + (z.direct + z.inverse) * zo3);
    let ii = -id * zo3 / (z.inverse + zo3);
    let io = -id * z.inverse / (z.inverse + zo3);
    FortescueValue::new(io, id, ii)
}

/// Self and mutual Thevenin impedances of two fault locations, per sequence.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MutualImpedances {
    pub z11: FortescueValue,
    pub z12: FortescueValue,
    pub z21: FortescueValue,
    pub z22: FortescueValue,
}

/// Sequence weights `[zero, direct, inverse]`.
type Weights = [Complex64; 3];

fn one() -> Complex64 {
    Complex64::new(1.0, 0.0)
}

/// Sequence content of a unit current on phase c: `[1, a², a]`.
fn phase_c_current() -> Weights {
    [one(), a2(), a()]
}

/// Phase c voltage in terms of sequence voltages: `[1, a, a²]`.
fn phase_c_voltage() -> Weights {
    [one(), a(), a2()]
}

/// `(current, voltage)` weights of the phase of location 2 involved in the
/// fault.
fn second_phase(correlation: CommonSupportType) -> (Weights, Weights) {
    match correlation {
        CommonSupportType::C1A2 => ([one(); 3], [one(); 3]),
        CommonSupportType::C1B2 => ([one(), a(), a2()], [one(), a2(), a()]),
        CommonSupportType::C1C2 => (phase_c_current(), phase_c_voltage()),
    }
}

/// Phase c of location 1 shorted through `Zf` to a phase of location 2.
///
/// With `u`/`p` the current/voltage weights of phase c and `w`/`q` those of
/// the correlated phase of location 2, the fault current is
///
/// ```text
///              p_d E1 - q_d E2
/// Ic = ------------------------------------------------
///      Zf + 1/3 Σ_s (Z11 - p w Z12 - q u Z21 + Z22)_s
/// ```
///
/// and `I1 = Ic u / 3`, `I2 = -Ic w / 3`.
pub fn common_support(
    e1: Complex64,
    e2: Complex64,
    z: &MutualImpedances,
    zf: Complex64,
    correlation: CommonSupportType,
) -> (FortescueValue, FortescueValue) {
    let u = phase_c_current();
    let p = phase_c_voltage();
    let (w, q) = second_phase(correlation);

    let mut denominator = Complex64::default();
    for s in 0..3 {
        denominator += z.z11.component(s) - p[s] * w[s] * z.z12.component(s)
            - q[s] * u[s] * z.z21.component(s)
            + z.z22.component(s);
    }
    let ic = (p[1] * e1 - q[1] * e2) / (zf + denominator / 3.0);

    let i1 = FortescueValue::new(u[0], u[1], u[2]) * (ic / 3.0);
    let i2 = FortescueValue::new(w[0], w[1], w[2]) * (-ic / 3.0);
    (i1, i2)
}

/// `V = E - Z I` per sequence, with the source on the direct sequence only.
pub fn fault_voltages(e: Complex64, z: &FortescueValue, i: &FortescueValue) -> FortescueValue {
    FortescueValue::new(
        -z.zero * i.zero,
        e - z.direct * i.direct,
        -z.inverse * i.inverse,
    )
}

fn product(z: &FortescueValue, i: &FortescueValue) -> FortescueValue {
    FortescueValue::new(z.zero * i.zero, z.direct * i.direct, z.inverse * i.inverse)
}

/// Voltages at both locations of a common-support fault.
pub fn common_support_voltages(
    e1: Complex64,
    e2: Complex64,
    z: &MutualImpedances,
    i1: &FortescueValue,
    i2: &FortescueValue,
) -> (FortescueValue, FortescueValue) {
    let v1 = FortescueValue::direct_only(e1) - product(&z.z11, i1) - product(&z.z12, i2);
    let v2 = FortescueValue::direct_only(e2) - product(&z.z21, i1) - product(&z.z22, i2);
    (v1, v2)
}
