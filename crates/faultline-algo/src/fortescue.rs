//! Symmetrical components.
//!
//! ```text
//! [A]   [1  1   1 ] [o]
//! [B] = [1  a²  a ] [d]      a = e^{j 2π/3}
//! [C]   [1  a   a²] [i]
//! ```

use std::f64::consts::PI;
use std::ops::{Add, Mul, Neg, Sub};

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// The Fortescue operator `a = e^{j 2π/3}`.
pub fn a() -> Complex64 {
    Complex64::from_polar(1.0, 2.0 * PI / 3.0)
}

/// `a²`
pub fn a2() -> Complex64 {
    Complex64::from_polar(1.0, 4.0 * PI / 3.0)
}

/// Zero, direct and inverse components of a three-phase quantity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FortescueValue {
    pub zero: Complex64,
    pub direct: Complex64,
    pub inverse: Complex64,
}

impl FortescueValue {
    pub fn new(zero: Complex64, direct: Complex64, inverse: Complex64) -> Self {
        Self {
            zero,
            direct,
            inverse,
        }
    }

    /// Positive-sequence only value.
    pub fn direct_only(direct: Complex64) -> Self {
        Self {
            direct,
            ..Self::default()
        }
    }

    /// Phase quantities `[A, B, C]`.
    pub fn to_phases(&self) -> [Complex64; 3] {
        let (a, a2) = (a(), a2());
        [
            self.zero + self.direct + self.inverse,
            self.zero + a2 * self.direct + a * self.inverse,
            self.zero + a * self.direct + a2 * self.inverse,
        ]
    }

    /// Inverse transform of `[A, B, C]`.
    pub fn from_phases(phases: [Complex64; 3]) -> Self {
        let (a, a2) = (a(), a2());
        let [pa, pb, pc] = phases;
        Self {
            zero: (pa + pb + pc) / 3.0,
            direct: (pa + a * pb + a2 * pc) / 3.0,
            inverse: (pa + a2 * pb + a * pc) / 3.0,
        }
    }

    /// Component by index in `[zero, direct, inverse]` order.
    pub fn component(&self, index: usize) -> Complex64 {
        match index {
            0 => self.zero,
            1 => self.direct,
            _ => self.inverse,
        }
    }

    pub fn is_finite(&self) -> bool {
        [self.zero, self.direct, self.inverse]
            .iter()
            .all(|c| c.re.is_finite() && c.im.is_finite())
    }
}

impl Add for FortescueValue {
    type Output = FortescueValue;

    fn add(self, rhs: FortescueValue) -> FortescueValue {
        FortescueValue::new(
            self.zero + rhs.zero,
            self.direct + rhs.direct,
            self.inverse + rhs.inverse,
        )
    }
}

impl Sub for FortescueValue {
    type Output = FortescueValue;

    fn sub(self, rhs: FortescueValue) -> FortescueValue {
        FortescueValue::new(
            self.zero - rhs.zero,
            self.direct - rhs.direct,
            self.inverse - rhs.inverse,
        )
    }
}

impl Neg for FortescueValue {
    type Output = FortescueValue;

    fn neg(self) -> FortescueValue {
        FortescueValue::new(-self.zero, -self.direct, -self.inverse)
    }
}

impl Mul<Complex64> for FortescueValue {
    type Output = FortescueValue;

    fn mul(self, rhs: Complex64) -> FortescueValue {
        FortescueValue::new(self.zero * rhs, self.direct * rhs, self.inverse * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-12
    }

    #[test]
    fn test_operator_identities() {
        let one = Complex64::new(1.0, 0.0);
        assert!(close(a() * a(), a2()));
        assert!(close(a() * a2(), one));
        assert!(close(one + a() + a2(), Complex64::new(0.0, 0.0)));
    }

    #[test]
    fn test_balanced_direct_system() {
        let v = FortescueValue::direct_only(Complex64::new(1.0, 0.0));
        let [pa, pb, pc] = v.to_phases();
        assert!(close(pa, Complex64::new(1.0, 0.0)));
        assert!(close(pb, a2()));
        assert!(close(pc, a()));
    }

    #[test]
    fn test_single_phase_current_splits_evenly() {
        // 3 pu on phase c only: each component is a third of it, rotated
        let zero = Complex64::new(0.0, 0.0);
        let v = FortescueValue::from_phases([zero, zero, Complex64::new(3.0, 0.0)]);
        assert!(close(v.zero, Complex64::new(1.0, 0.0)));
        assert!(close(v.direct, a2()));
        assert!(close(v.inverse, a()));
    }

    #[test]
    fn test_phases_recovered() {
        let phases = [
            Complex64::new(0.3, -1.2),
            Complex64::new(-2.0, 0.5),
            Complex64::new(0.1, 0.9),
        ];
        let back = FortescueValue::from_phases(phases).to_phases();
        for (p, q) in phases.iter().zip(back.iter()) {
            assert!(close(*p, *q));
        }
    }
}
